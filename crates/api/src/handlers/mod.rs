pub mod approval;
pub mod audit;
pub mod auth;
pub mod classification;
pub mod legal_instrument;
pub mod lifecycle;
pub mod me;
pub mod notification;
pub mod project;
pub mod work_plan;
