// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Scopes ---
        handlers::scopes::get_my_scope,
        handlers::scopes::list_user_scopes,
        handlers::scopes::replace_user_scopes,

        // --- Outlets ---
        handlers::outlets::list_outlets,
        handlers::outlets::get_outlet,
        handlers::outlets::list_histories,
        handlers::outlets::create_outlet,
        handlers::outlets::request_transition,
        handlers::outlets::approve,
        handlers::outlets::reject,

        // --- Users / Visits ---
        handlers::users::list_users,
        handlers::visits::list_visits,

        // --- Organization ---
        handlers::org::get_tree,
        handlers::org::create_badan_usaha,
        handlers::org::create_division,
        handlers::org::create_region,
        handlers::org::create_cluster,
    ),
    components(
        schemas(
            // --- Organization ---
            models::org::HierarchyLevel,
            models::org::BadanUsaha,
            models::org::Division,
            models::org::Region,
            models::org::Cluster,
            models::org::OrgTree,

            // --- Users & scopes ---
            models::auth::User,
            models::rbac::Role,
            models::scope::ScopeRow,
            models::scope::ScopeAssignment,
            models::scope::ReplaceScopesPayload,
            models::scope::MyScope,

            // --- Outlets ---
            models::outlet::OutletLevel,
            models::outlet::OutletStatus,
            models::outlet::ApprovalStatus,
            models::outlet::Outlet,
            models::outlet::OutletHistory,
            models::outlet::TransitionResult,
            models::visit::Visit,

            // --- Payloads ---
            handlers::outlets::CreateOutletPayload,
            handlers::outlets::TransitionPayload,
            handlers::outlets::ApprovePayload,
            handlers::outlets::RejectPayload,
            handlers::org::CreateBadanUsahaPayload,
            handlers::org::CreateDivisionPayload,
            handlers::org::CreateRegionPayload,
            handlers::org::CreateClusterPayload,
        )
    ),
    tags(
        (name = "Scopes", description = "Hierarchical access scopes of users"),
        (name = "Outlets", description = "Outlets and the level approval workflow"),
        (name = "Users", description = "Users visible to the caller"),
        (name = "Visits", description = "Sales visits visible to the caller"),
        (name = "Organization", description = "Badan usaha, divisions, regions and clusters")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
