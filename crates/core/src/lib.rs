//! Domain logic for the research project portal.
//!
//! Pure functions and types with no I/O: the project status machine, the
//! legal instrument classification graph and fill-status derivation, the
//! approval-list vocabulary, and credential rules. Used by both the
//! repository and HTTP layers.

pub mod approval_query;
pub mod classification;
pub mod error;
pub mod legal_instrument;
pub mod lifecycle;
pub mod notification;
pub mod otp;
pub mod permissions;
pub mod project_status;
pub mod roles;
pub mod slug;
pub mod types;
