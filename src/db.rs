pub mod org_repo;
pub use org_repo::OrgRepository;
pub mod outlet_repo;
pub use outlet_repo::OutletRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod scope_repo;
pub use scope_repo::ScopeRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod visit_repo;
pub use visit_repo::VisitRepository;
