//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequirePermission`] -- Requires a global permission slug.
//! - [`rbac::ensure_permission`] -- Checks a permission, optionally scoped to a resource.

pub mod auth;
pub mod rbac;
