//! Project lifecycle transitions.
//!
//! Each [`ProjectAction`] has a fixed set of allowed predecessor statuses and
//! a single target status. Dependency and decision-text preconditions are
//! checked here so the API layer only has to load data and persist results.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::legal_instrument::FillStatus;
use crate::project_status::ProjectStatus;

/// Longest accepted opinion / reason text.
pub const MAX_DECISION_TEXT_LEN: usize = 10_000;

/// A lifecycle operation on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAction {
    Submit,
    StartReview,
    Approve,
    Reject,
    ReturnForAdjustment,
}

impl ProjectAction {
    /// Statuses a project must be in for this action to apply.
    pub fn allowed_predecessors(self) -> &'static [ProjectStatus] {
        match self {
            Self::Submit => &[ProjectStatus::Draft, ProjectStatus::Returned],
            Self::StartReview => &[ProjectStatus::PendingReview],
            Self::Approve | Self::Reject | Self::ReturnForAdjustment => {
                &[ProjectStatus::UnderReview]
            }
        }
    }

    /// Status the project ends up in.
    pub fn target(self) -> ProjectStatus {
        match self {
            Self::Submit => ProjectStatus::PendingReview,
            Self::StartReview => ProjectStatus::UnderReview,
            Self::Approve => ProjectStatus::Approved,
            Self::Reject => ProjectStatus::Rejected,
            Self::ReturnForAdjustment => ProjectStatus::Returned,
        }
    }

    /// Action name recorded in the audit log.
    pub fn audit_action(self) -> &'static str {
        match self {
            Self::Submit => "project.submitted",
            Self::StartReview => "project.review_started",
            Self::Approve => "project.approved",
            Self::Reject => "project.rejected",
            Self::ReturnForAdjustment => "project.returned",
        }
    }

    /// Whether the action needs an opinion / reason text.
    pub fn requires_decision_text(self) -> bool {
        matches!(
            self,
            Self::Approve | Self::Reject | Self::ReturnForAdjustment
        )
    }

    fn wrong_status_message(self) -> &'static str {
        match self {
            Self::Submit => "Only draft or returned projects can be submitted",
            Self::StartReview => "Only projects pending review can be taken for review",
            Self::Approve => "Only projects under review can be approved",
            Self::Reject => "Only projects under review can be rejected",
            Self::ReturnForAdjustment => "Only projects under review can be returned for adjustment",
        }
    }

    fn missing_text_message(self) -> &'static str {
        match self {
            Self::Approve => "An opinion is required to approve the project",
            Self::Reject => "A reason is required to reject the project",
            _ => "A reason is required to return the project for adjustment",
        }
    }
}

/// Check that `action` may be applied to a project in `current` status and
/// return the resulting status.
pub fn validate_transition(
    action: ProjectAction,
    current: ProjectStatus,
) -> Result<ProjectStatus, CoreError> {
    if action.allowed_predecessors().contains(&current) {
        Ok(action.target())
    } else {
        Err(CoreError::Precondition(
            action.wrong_status_message().to_string(),
        ))
    }
}

/// Normalize and check the opinion / reason text for a review decision.
///
/// Returns the trimmed text. Actions that take no text accept `None` and
/// return an empty string.
pub fn validate_decision_text(
    action: ProjectAction,
    text: Option<&str>,
) -> Result<String, CoreError> {
    if !action.requires_decision_text() {
        return Ok(String::new());
    }
    let trimmed = text.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(CoreError::Precondition(
            action.missing_text_message().to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DECISION_TEXT_LEN {
        return Err(CoreError::Validation(format!(
            "Text must be at most {MAX_DECISION_TEXT_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// What a project has attached when it is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionDependencies {
    /// Fill status of the legal instrument instance, `None` when none is attached.
    pub legal_instrument: Option<FillStatus>,
    pub has_work_plan: bool,
}

/// Check the dependency gate for [`ProjectAction::Submit`].
pub fn check_submission_dependencies(deps: SubmissionDependencies) -> Result<(), CoreError> {
    match deps.legal_instrument {
        None => {
            return Err(CoreError::Precondition(
                "A legal instrument must be attached before submitting".to_string(),
            ))
        }
        Some(FillStatus::Filled) => {}
        Some(_) => {
            return Err(CoreError::Precondition(
                "The legal instrument must be completely filled before submitting".to_string(),
            ))
        }
    }
    if !deps.has_work_plan {
        return Err(CoreError::Precondition(
            "A work plan is required before submitting".to_string(),
        ));
    }
    Ok(())
}
