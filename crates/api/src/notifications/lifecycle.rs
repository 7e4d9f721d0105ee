use portal_core::lifecycle::ProjectAction;
use portal_core::notification::{lifecycle_message, project_link, NotificationKind};
use portal_core::permissions::PROJECT_APPROVE;
use portal_core::project_status::ProjectStatus;
use portal_core::types::DbId;
use portal_db::models::audit::CreateAuditLog;
use portal_db::models::notification::CreateNotification;
use portal_db::models::project::Project;
use portal_db::repositories::{AuditLogRepo, NotificationRepo, PermissionRepo, UserRepo};
use portal_events::messages::lifecycle_email;

use crate::state::AppState;

/// A committed lifecycle transition.
#[derive(Debug)]
pub struct LifecycleEvent<'a> {
    pub action: ProjectAction,
    /// The project as it is after the transition.
    pub project: &'a Project,
    pub actor_id: DbId,
    pub from: ProjectStatus,
    /// Opinion or reason text for review decisions.
    pub decision_text: Option<&'a str>,
}

/// Audit, notify and email for a committed transition.
///
/// A submission notifies every user who can approve projects; every other
/// transition notifies the project owner. The actor is never notified about
/// their own action.
pub async fn dispatch_lifecycle(state: &AppState, event: &LifecycleEvent<'_>) {
    let project = event.project;

    record_audit(
        state,
        CreateAuditLog {
            project_id: Some(project.id),
            actor_id: Some(event.actor_id),
            action: event.action.audit_action().to_string(),
            status_before: Some(event.from.as_str().to_string()),
            status_after: Some(event.action.target().as_str().to_string()),
            details: match event.decision_text {
                Some(text) => serde_json::json!({ "text": text }),
                None => serde_json::json!({}),
            },
        },
    )
    .await;

    let recipients = match event.action {
        ProjectAction::Submit => {
            match PermissionRepo::user_ids_with_permission(&state.pool, PROJECT_APPROVE).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        project_id = project.id,
                        "Failed to resolve approvers for notification"
                    );
                    Vec::new()
                }
            }
        }
        _ => vec![project.owner_id],
    };

    let (title, message) = lifecycle_message(event.action, &project.title, event.decision_text);
    let link = project_link(&project.slug);
    let kind = NotificationKind::for_action(event.action);

    for user_id in recipients.into_iter().filter(|id| *id != event.actor_id) {
        let input = CreateNotification {
            user_id,
            title: title.clone(),
            message: message.clone(),
            kind,
            link: Some(link.clone()),
        };
        if let Err(e) = NotificationRepo::create(&state.pool, &input).await {
            tracing::warn!(error = %e, user_id, project_id = project.id, "Failed to create notification");
        }

        send_lifecycle_email(state, event, user_id, &link).await;
    }
}

async fn send_lifecycle_email(state: &AppState, event: &LifecycleEvent<'_>, user_id: DbId, link: &str) {
    let user = match UserRepo::find_by_id(&state.pool, user_id).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => return,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "Failed to load email recipient");
            return;
        }
    };

    let email = lifecycle_email(
        &user.email,
        event.action,
        &event.project.title,
        event.decision_text,
        &state.config.public_url(link),
    );
    if let Err(e) = state.mailer.send(&email).await {
        tracing::warn!(
            error = %e,
            user_id,
            project_id = event.project.id,
            "Failed to send lifecycle email"
        );
    }
}

/// Append an audit entry, logging instead of failing.
pub async fn record_audit(state: &AppState, entry: CreateAuditLog) {
    if let Err(e) = AuditLogRepo::create(&state.pool, &entry).await {
        tracing::warn!(
            error = %e,
            action = %entry.action,
            project_id = ?entry.project_id,
            "Failed to write audit log"
        );
    }
}
