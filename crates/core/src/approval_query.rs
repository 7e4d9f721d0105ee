//! Approval list sorting, filtering and pagination primitives.
//!
//! The SQL itself lives in the repository layer; this module owns the sort
//! vocabulary, the custom status ordering and the pagination arithmetic so
//! they can be tested without a database.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project_status::ProjectStatus;
use crate::types::Timestamp;

/// Default page size for the approval list.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Longest accepted free-text search term.
pub const MAX_SEARCH_LEN: usize = 200;

/// Sort orders supported by the approval list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalSort {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
    RecentlySubmitted,
    /// Custom priority order, see [`ProjectStatus::SORT_PRIORITY`].
    Status,
}

impl ApprovalSort {
    /// SQL `ORDER BY` body for this sort, using `p` as the projects alias.
    ///
    /// Every order ends with `p.id` so pages are stable.
    pub fn order_by_sql(self) -> String {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC".to_string(),
            Self::Oldest => "p.created_at ASC, p.id ASC".to_string(),
            Self::TitleAsc => "LOWER(p.title) ASC, p.id ASC".to_string(),
            Self::TitleDesc => "LOWER(p.title) DESC, p.id DESC".to_string(),
            Self::RecentlySubmitted => "p.submitted_at DESC NULLS LAST, p.id DESC".to_string(),
            Self::Status => format!("{} ASC, p.created_at DESC, p.id DESC", status_rank_case_sql("p.status")),
        }
    }
}

/// Build a `CASE` expression ranking `column` by the approval-list priority.
pub fn status_rank_case_sql(column: &str) -> String {
    let mut sql = String::from("CASE ");
    sql.push_str(column);
    for status in ProjectStatus::ALL {
        sql.push_str(&format!(" WHEN '{}' THEN {}", status.as_str(), status.sort_rank()));
    }
    sql.push_str(&format!(" ELSE {} END", ProjectStatus::SORT_PRIORITY.len()));
    sql
}

/// Validated filter criteria for the approval list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalFilter {
    /// Case-insensitive substring matched against title, owner name and email.
    pub search: Option<String>,
    /// Empty means any status.
    pub statuses: Vec<ProjectStatus>,
    /// Restrict to projects whose reviewer is this user.
    pub assigned_to: Option<crate::types::DbId>,
    pub has_work_plan: Option<bool>,
    pub has_legal_instrument: Option<bool>,
    pub submitted_from: Option<Timestamp>,
    pub submitted_to: Option<Timestamp>,
}

impl ApprovalFilter {
    /// Check cross-field constraints and normalize the search term.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(ref s) = self.search {
            if s.chars().count() > MAX_SEARCH_LEN {
                return Err(CoreError::Validation(format!(
                    "Search term must be at most {MAX_SEARCH_LEN} characters"
                )));
            }
        }
        if let (Some(from), Some(to)) = (self.submitted_from, self.submitted_to) {
            if from > to {
                return Err(CoreError::Validation(
                    "submitted_from must not be after submitted_to".to_string(),
                ));
            }
        }
        self.statuses.sort_by_key(|s| s.as_str());
        self.statuses.dedup();
        Ok(self)
    }
}

/// Parse a comma-separated status list (`"PENDING_REVIEW,UNDER_REVIEW"`).
pub fn parse_status_list(raw: &str) -> Result<Vec<ProjectStatus>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ProjectStatus::from_str_db)
        .collect()
}

/// Escape `%`, `_` and `\` so a search term matches literally inside `ILIKE`.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Clamp client values: page >= 1, 1 <= page_size <= [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(self) -> i64 {
        self.page_size
    }
}

/// Number of pages needed for `total` rows: `ceil(total / page_size)`.
pub fn page_count(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub page_count: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            page_count: page_count(total, request.page_size),
        }
    }
}
