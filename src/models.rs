pub mod auth;
pub mod org;
pub mod outlet;
pub mod rbac;
pub mod scope;
pub mod visit;
