// src/handlers/org.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermOrgWrite, RequirePermission},
        scope::UserScope,
    },
    models::org::{BadanUsaha, Cluster, Division, OrgTree, Region},
};

// GET /api/org/tree
#[utoipa::path(
    get,
    path = "/api/org/tree",
    tag = "Organization",
    responses(
        (status = 200, description = "Nodes the caller's scope permits, per level", body = OrgTree)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_tree(
    State(app_state): State<AppState>,
    locale: Locale,
    UserScope(scope): UserScope,
) -> Result<impl IntoResponse, ApiError> {
    let tree = app_state
        .org_service
        .visible_tree(&scope)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(tree))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBadanUsahaPayload {
    #[validate(length(min = 1, max = 255, message = "required"))]
    #[schema(example = "PT Sumber Makmur")]
    pub name: String,
}

// POST /api/org/badan-usaha
#[utoipa::path(
    post,
    path = "/api/org/badan-usaha",
    tag = "Organization",
    request_body = CreateBadanUsahaPayload,
    responses((status = 201, body = BadanUsaha)),
    security(("api_jwt" = []))
)]
pub async fn create_badan_usaha(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOrgWrite>,
    Json(payload): Json<CreateBadanUsahaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let node = app_state
        .org_service
        .create_badan_usaha(&payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(node)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDivisionPayload {
    #[validate(length(min = 1, max = 255, message = "required"))]
    #[schema(example = "Consumer Goods")]
    pub name: String,
    pub badan_usaha_id: i64,
}

// POST /api/org/divisions
#[utoipa::path(
    post,
    path = "/api/org/divisions",
    tag = "Organization",
    request_body = CreateDivisionPayload,
    responses(
        (status = 201, body = Division),
        (status = 422, description = "Unknown badan usaha")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_division(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOrgWrite>,
    Json(payload): Json<CreateDivisionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let node = app_state
        .org_service
        .create_division(payload.badan_usaha_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(node)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegionPayload {
    #[validate(length(min = 1, max = 255, message = "required"))]
    #[schema(example = "Jawa Timur")]
    pub name: String,
    pub badan_usaha_id: i64,
    pub division_id: i64,
}

// POST /api/org/regions
#[utoipa::path(
    post,
    path = "/api/org/regions",
    tag = "Organization",
    request_body = CreateRegionPayload,
    responses(
        (status = 201, body = Region),
        (status = 422, description = "Division does not belong to the badan usaha")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_region(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOrgWrite>,
    Json(payload): Json<CreateRegionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let node = app_state
        .org_service
        .create_region(payload.badan_usaha_id, payload.division_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(node)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterPayload {
    #[validate(length(min = 1, max = 255, message = "required"))]
    #[schema(example = "Surabaya Barat")]
    pub name: String,
    pub badan_usaha_id: i64,
    pub division_id: i64,
    pub region_id: i64,
}

// POST /api/org/clusters
#[utoipa::path(
    post,
    path = "/api/org/clusters",
    tag = "Organization",
    request_body = CreateClusterPayload,
    responses(
        (status = 201, body = Cluster),
        (status = 422, description = "Parent chain is inconsistent")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cluster(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOrgWrite>,
    Json(payload): Json<CreateClusterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let node = app_state
        .org_service
        .create_cluster(payload.badan_usaha_id, payload.division_id, payload.region_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(node)))
}
