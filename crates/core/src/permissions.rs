//! Permission slugs and resource scopes.
//!
//! Roles grant slugs globally through `role_permissions`; a
//! `resource_memberships` row grants one slug for a single resource instance.
//! Slugs must match the seed data in `20260301000002_roles_and_permissions.sql`.

use crate::types::DbId;

/// Create new projects.
pub const PROJECT_CREATE: &str = "project.create";
/// Submit a project the caller does not own.
pub const PROJECT_SUBMIT: &str = "project.submit";
/// Start review, approve, reject or return projects.
pub const PROJECT_APPROVE: &str = "project.approve";
/// See every project and the approval list.
pub const PROJECT_VIEW_ALL: &str = "project.view_all";
/// Create and edit legal instrument templates.
pub const LEGAL_INSTRUMENT_MANAGE: &str = "legal_instrument.manage";
/// Read the audit trail of any project.
pub const AUDIT_VIEW: &str = "audit.view";

/// All known permission slugs.
pub const ALL_PERMISSIONS: &[&str] = &[
    PROJECT_CREATE,
    PROJECT_SUBMIT,
    PROJECT_APPROVE,
    PROJECT_VIEW_ALL,
    LEGAL_INSTRUMENT_MANAGE,
    AUDIT_VIEW,
];

/// Resource type name used in `resource_memberships` for projects.
pub const RESOURCE_PROJECT: &str = "project";

/// A single resource instance a permission check can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceScope {
    pub resource_type: &'static str,
    pub resource_id: DbId,
}

impl ResourceScope {
    pub fn project(id: DbId) -> Self {
        Self {
            resource_type: RESOURCE_PROJECT,
            resource_id: id,
        }
    }
}

/// Whether a slug is one of [`ALL_PERMISSIONS`].
pub fn is_known_permission(slug: &str) -> bool {
    ALL_PERMISSIONS.contains(&slug)
}
