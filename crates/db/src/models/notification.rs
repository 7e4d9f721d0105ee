//! In-app notifications.

use portal_core::notification::NotificationKind;
use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    /// Recipient.
    pub user_id: DbId,
    pub title: String,
    pub message: String,
    /// One of `info`, `success`, `warning`, `error`.
    pub kind: String,
    /// In-app path, e.g. `/projects/{slug}`.
    pub link: Option<String>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}

/// One page of a user's inbox.
#[derive(Debug, Clone, Copy)]
pub struct InboxPage {
    pub unread_only: bool,
    pub limit: i64,
    pub offset: i64,
}
