use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, InboxPage, Notification};

const COLUMNS: &str = "id, user_id, title, message, kind, link, is_read, read_at, created_at";

const MARK_READ: &str = "SET is_read = TRUE, read_at = NOW()";

pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, title, message, kind, link) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.kind.as_str())
            .bind(input.link.as_deref())
            .fetch_one(pool)
            .await
    }

    /// Newest first. `$2` switches the unread filter on.
    pub async fn inbox(
        pool: &PgPool,
        user_id: DbId,
        page: InboxPage,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR NOT is_read) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(page.unread_only)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// `false` when the notification does not exist, belongs to another
    /// user or was already read.
    pub async fn mark_read(
        pool: &PgPool,
        user_id: DbId,
        notification_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE notifications {MARK_READ} \
             WHERE id = $1 AND user_id = $2 AND NOT is_read"
        );
        let done = sqlx::query(&query)
            .bind(notification_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let query = format!("UPDATE notifications {MARK_READ} WHERE user_id = $1 AND NOT is_read");
        let done = sqlx::query(&query).bind(user_id).execute(pool).await?;
        Ok(done.rows_affected())
    }
}
