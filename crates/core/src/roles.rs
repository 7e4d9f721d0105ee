//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000002_roles_and_permissions.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PROPONENT: &str = "proponent";

/// Role assigned to users created on their first OTP login.
pub const DEFAULT_ROLE: &str = ROLE_PROPONENT;
