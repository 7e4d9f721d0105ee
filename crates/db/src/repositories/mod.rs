//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod approval_repo;
pub mod audit_repo;
pub mod legal_instrument_repo;
pub mod notification_repo;
pub mod otp_repo;
pub mod permission_repo;
pub mod project_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;
pub mod work_plan_repo;

use portal_core::project_status::ProjectStatus;

pub use approval_repo::ApprovalRepo;
pub use audit_repo::AuditLogRepo;
pub use legal_instrument_repo::{
    AttachOutcome, LegalInstrumentInstanceRepo, LegalInstrumentRepo, LegalInstrumentVersionRepo,
};
pub use notification_repo::NotificationRepo;
pub use otp_repo::OtpRepo;
pub use permission_repo::PermissionRepo;
pub use project_repo::ProjectRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
pub use work_plan_repo::WorkPlanRepo;

/// Status text values for `status = ANY($n)` guards.
pub(crate) fn status_texts(statuses: &[ProjectStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}
