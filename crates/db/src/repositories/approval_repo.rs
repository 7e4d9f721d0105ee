//! Approval list query over `projects` with dynamic filtering, sorting and
//! pagination.

use sqlx::PgPool;
use portal_core::approval_query::{escape_like, ApprovalFilter, ApprovalSort, PageRequest};
use portal_core::types::{DbId, Timestamp};

use super::status_texts;
use crate::models::project::ApprovalListItem;

/// Select list for approval rows. Aliases: `p` projects, `u` owner,
/// `wp` work plan, `lii` legal instrument instance.
const SELECT_COLUMNS: &str = "\
    p.id, p.slug, p.title, p.status, p.owner_id, \
    u.name AS owner_name, u.email AS owner_email, \
    p.reviewer_id, p.submitted_at, p.created_at, p.updated_at, \
    (wp.id IS NOT NULL) AS has_work_plan, \
    (lii.id IS NOT NULL) AS has_legal_instrument, \
    lii.fill_status";

const FROM_CLAUSE: &str = "\
    FROM projects p \
    JOIN users u ON u.id = p.owner_id \
    LEFT JOIN work_plans wp ON wp.project_id = p.id \
    LEFT JOIN legal_instrument_instances lii ON lii.project_id = p.id";

/// Runs the approval list query.
pub struct ApprovalRepo;

impl ApprovalRepo {
    /// Fetch one page of projects matching `filter`, ordered by `sort`.
    pub async fn list(
        pool: &PgPool,
        filter: &ApprovalFilter,
        sort: ApprovalSort,
        page: PageRequest,
    ) -> Result<Vec<ApprovalListItem>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_approval_filter(filter);

        let query = format!(
            "SELECT {SELECT_COLUMNS} {FROM_CLAUSE} {where_clause} \
             ORDER BY {} \
             LIMIT ${bind_idx} OFFSET ${}",
            sort.order_by_sql(),
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, ApprovalListItem>(&query);
        for value in bind_values {
            q = match value {
                BindValue::BigInt(v) => q.bind(v),
                BindValue::Text(v) => q.bind(v),
                BindValue::TextArray(v) => q.bind(v),
                BindValue::Timestamp(v) => q.bind(v),
            };
        }
        q.bind(page.limit()).bind(page.offset()).fetch_all(pool).await
    }

    /// Count projects matching `filter` (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &ApprovalFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_approval_filter(filter);

        let query = format!("SELECT COUNT(*)::BIGINT {FROM_CLAUSE} {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for value in bind_values {
            q = match value {
                BindValue::BigInt(v) => q.bind(v),
                BindValue::Text(v) => q.bind(v),
                BindValue::TextArray(v) => q.bind(v),
                BindValue::Timestamp(v) => q.bind(v),
            };
        }
        q.fetch_one(pool).await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for the dynamically-built approval query.
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    BigInt(DbId),
    Text(String),
    TextArray(Vec<String>),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from the filter.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if no filters are active, or starts with `WHERE `.
fn build_approval_filter(filter: &ApprovalFilter) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref search) = filter.search {
        conditions.push(format!(
            "(p.title ILIKE ${bind_idx} OR u.name ILIKE ${bind_idx} OR u.email ILIKE ${bind_idx})"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{}%", escape_like(search))));
    }

    if !filter.statuses.is_empty() {
        conditions.push(format!("p.status = ANY(${bind_idx})"));
        bind_idx += 1;
        bind_values.push(BindValue::TextArray(status_texts(&filter.statuses)));
    }

    if let Some(reviewer_id) = filter.assigned_to {
        conditions.push(format!("p.reviewer_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(reviewer_id));
    }

    match filter.has_work_plan {
        Some(true) => conditions.push("wp.id IS NOT NULL".to_string()),
        Some(false) => conditions.push("wp.id IS NULL".to_string()),
        None => {}
    }

    match filter.has_legal_instrument {
        Some(true) => conditions.push("lii.id IS NOT NULL".to_string()),
        Some(false) => conditions.push("lii.id IS NULL".to_string()),
        None => {}
    }

    if let Some(from) = filter.submitted_from {
        conditions.push(format!("p.submitted_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = filter.submitted_to {
        conditions.push(format!("p.submitted_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}
