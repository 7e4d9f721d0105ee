//! Handler for the approval list (`GET /approvals`).

use axum::extract::{Query, State};
use axum::Json;
use portal_core::approval_query::{parse_status_list, ApprovalFilter, ApprovalSort, Page, PageRequest};
use portal_core::types::Timestamp;
use portal_db::models::project::ApprovalListItem;
use portal_db::repositories::ApprovalRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::{RequirePermission, ViewAllProjects};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /approvals`.
#[derive(Debug, Default, Deserialize)]
pub struct ApprovalListParams {
    /// Substring of title, owner name or owner email.
    pub search: Option<String>,
    /// Comma-separated statuses, e.g. `PENDING_REVIEW,UNDER_REVIEW`.
    pub status: Option<String>,
    /// Only projects the caller is reviewing.
    #[serde(default)]
    pub assigned_to_me: bool,
    pub has_work_plan: Option<bool>,
    pub has_legal_instrument: Option<bool>,
    pub submitted_from: Option<Timestamp>,
    pub submitted_to: Option<Timestamp>,
    #[serde(default)]
    pub sort: ApprovalSort,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/v1/approvals
///
/// Filtered, sorted, paginated list of every project. Requires
/// `project.view_all`.
pub async fn list(
    perm: RequirePermission<ViewAllProjects>,
    State(state): State<AppState>,
    Query(params): Query<ApprovalListParams>,
) -> AppResult<Json<DataResponse<Page<ApprovalListItem>>>> {
    let statuses = match params.status.as_deref() {
        Some(raw) => parse_status_list(raw)?,
        None => Vec::new(),
    };
    let filter = ApprovalFilter {
        search: params.search,
        statuses,
        assigned_to: params.assigned_to_me.then_some(perm.user.user_id),
        has_work_plan: params.has_work_plan,
        has_legal_instrument: params.has_legal_instrument,
        submitted_from: params.submitted_from,
        submitted_to: params.submitted_to,
    }
    .normalized()?;
    let request = PageRequest::new(params.page, params.page_size);

    let items = ApprovalRepo::list(&state.pool, &filter, params.sort, request).await?;
    let total = ApprovalRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: Page::new(items, total, request),
    }))
}
