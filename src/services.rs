pub mod approval_gate;
pub mod auth;
pub mod hierarchy;
pub mod notification;
pub mod org_service;
pub mod outlet_lifecycle;
pub mod outlet_service;
pub mod scope_service;
pub mod scope_set;
pub mod scope_validator;
pub mod user_service;
pub mod visit_service;
