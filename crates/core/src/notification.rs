//! Notification kinds created by project lifecycle transitions.

use serde::{Deserialize, Serialize};

use crate::lifecycle::ProjectAction;

/// Visual category of an inbox notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Kind of the notification sent for a lifecycle action.
    pub fn for_action(action: ProjectAction) -> Self {
        match action {
            ProjectAction::Submit | ProjectAction::StartReview => Self::Info,
            ProjectAction::Approve => Self::Success,
            ProjectAction::ReturnForAdjustment => Self::Warning,
            ProjectAction::Reject => Self::Error,
        }
    }
}

/// Title and message for a lifecycle notification about `project_title`.
///
/// `reason` is the opinion or reason text for review decisions.
pub fn lifecycle_message(
    action: ProjectAction,
    project_title: &str,
    reason: Option<&str>,
) -> (String, String) {
    let (title, mut message) = match action {
        ProjectAction::Submit => (
            "Project submitted for review",
            format!("\"{project_title}\" was submitted and is waiting for review."),
        ),
        ProjectAction::StartReview => (
            "Project under review",
            format!("\"{project_title}\" is now being reviewed."),
        ),
        ProjectAction::Approve => (
            "Project approved",
            format!("\"{project_title}\" was approved."),
        ),
        ProjectAction::Reject => (
            "Project rejected",
            format!("\"{project_title}\" was rejected."),
        ),
        ProjectAction::ReturnForAdjustment => (
            "Project returned for adjustment",
            format!("\"{project_title}\" was returned and needs adjustments before resubmission."),
        ),
    };
    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        message.push_str("\n\n");
        message.push_str(reason);
    }
    (title.to_string(), message)
}

/// In-app deep link to a project page.
pub fn project_link(slug: &str) -> String {
    format!("/projects/{slug}")
}
