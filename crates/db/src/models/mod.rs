//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches, where rows are mutable

pub mod audit;
pub mod legal_instrument;
pub mod notification;
pub mod otp;
pub mod project;
pub mod role;
pub mod session;
pub mod user;
pub mod work_plan;
