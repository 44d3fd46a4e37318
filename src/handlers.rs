pub mod org;
pub mod outlets;
pub mod scopes;
pub mod users;
pub mod visits;
