//! Project status enumeration.
//!
//! Statuses are stored as upper-case text in the `projects.status` column
//! (see the `ck_projects_status` check constraint).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a research project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,
    PendingReview,
    UnderReview,
    Approved,
    Rejected,
    Returned,
}

impl ProjectStatus {
    /// Every status, in declaration order.
    pub const ALL: [ProjectStatus; 6] = [
        Self::Draft,
        Self::PendingReview,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Returned,
    ];

    /// Statuses in which the proponent may edit the project and its dependencies.
    pub const EDITABLE: [ProjectStatus; 2] = [Self::Draft, Self::Returned];

    /// Order used by the `status` sort of the approval list.
    pub const SORT_PRIORITY: [ProjectStatus; 6] = [
        Self::Approved,
        Self::UnderReview,
        Self::PendingReview,
        Self::Returned,
        Self::Draft,
        Self::Rejected,
    ];

    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PENDING_REVIEW" => Ok(Self::PendingReview),
            "UNDER_REVIEW" => Ok(Self::UnderReview),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "RETURNED" => Ok(Self::Returned),
            _ => Err(CoreError::Validation(format!(
                "Invalid project status '{s}'. Must be one of: {}",
                Self::ALL.map(Self::as_str).join(", ")
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingReview => "PENDING_REVIEW",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Returned => "RETURNED",
        }
    }

    /// Human-readable label, used in notifications and emails.
    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingReview => "Pending review",
            Self::UnderReview => "Under review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Returned => "Returned for adjustment",
        }
    }

    /// Whether the proponent may still edit the project and its dependencies.
    pub fn is_editable(self) -> bool {
        Self::EDITABLE.contains(&self)
    }

    /// Zero-based rank of this status in [`Self::SORT_PRIORITY`].
    pub fn sort_rank(self) -> usize {
        Self::SORT_PRIORITY
            .iter()
            .position(|s| *s == self)
            .unwrap_or(Self::SORT_PRIORITY.len())
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
