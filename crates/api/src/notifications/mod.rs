//! Side effects of project lifecycle transitions.
//!
//! After a transition commits, [`dispatch_lifecycle`] writes the audit
//! entry, creates in-app notifications and sends emails. Every step is
//! best-effort: failures are logged and never undo the transition.

pub mod lifecycle;

pub use lifecycle::{dispatch_lifecycle, record_audit, LifecycleEvent};
