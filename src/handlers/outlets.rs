// src/handlers/outlets.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::Pagination,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermOutletApprove, PermOutletRead, PermOutletWrite, RequirePermission},
        scope::UserScope,
    },
    models::outlet::{ApprovalStatus, NewOutlet, Outlet, OutletHistory, OutletLevel, TransitionResult},
};

// =============================================================================
//  READ
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OutletFilter {
    /// Only outlets at this level
    pub level: Option<OutletLevel>,
}

// GET /api/outlets
#[utoipa::path(
    get,
    path = "/api/outlets",
    tag = "Outlets",
    params(OutletFilter, Pagination),
    responses(
        (status = 200, description = "Outlets inside the caller's scope", body = [Outlet])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_outlets(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletRead>,
    UserScope(scope): UserScope,
    Query(filter): Query<OutletFilter>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    page.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;
    let (limit, offset) = page.limit_offset();

    let outlets = app_state
        .outlet_service
        .list_outlets(&scope, filter.level, limit, offset)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(outlets))
}

// GET /api/outlets/{id}
#[utoipa::path(
    get,
    path = "/api/outlets/{id}",
    tag = "Outlets",
    params(("id" = i64, Path, description = "Outlet id")),
    responses(
        (status = 200, body = Outlet),
        (status = 403, description = "Outlet outside the caller's scope"),
        (status = 404, description = "Outlet not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_outlet(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletRead>,
    UserScope(scope): UserScope,
    Path(outlet_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outlet = app_state
        .outlet_service
        .get_outlet(&scope, outlet_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(outlet))
}

// GET /api/outlets/{id}/histories
#[utoipa::path(
    get,
    path = "/api/outlets/{id}/histories",
    tag = "Outlets",
    params(("id" = i64, Path, description = "Outlet id")),
    responses(
        (status = 200, description = "History chain, oldest first", body = [OutletHistory])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_histories(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletRead>,
    UserScope(scope): UserScope,
    Path(outlet_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let histories = app_state
        .outlet_service
        .list_histories(&scope, outlet_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(histories))
}

// =============================================================================
//  CREATE
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutletPayload {
    #[validate(length(min = 1, max = 255, message = "required"))]
    #[schema(example = "Toko Berkah Jaya")]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,

    pub address: Option<String>,

    /// LEAD or NOO; MEMBER is only reached through approval.
    #[validate(custom(function = "validate_initial_level"))]
    #[schema(example = "LEAD")]
    pub level: OutletLevel,

    pub badan_usaha_id: i64,
    pub division_id: i64,
    pub region_id: Option<i64>,
    pub cluster_id: Option<i64>,
}

fn validate_initial_level(level: &OutletLevel) -> Result<(), ValidationError> {
    if *level == OutletLevel::Member {
        return Err(ValidationError::new("initial_level")
            .with_message("an outlet cannot be created as MEMBER".into()));
    }
    Ok(())
}

// POST /api/outlets
#[utoipa::path(
    post,
    path = "/api/outlets",
    tag = "Outlets",
    request_body = CreateOutletPayload,
    responses(
        (status = 201, description = "Outlet and its creation history row", body = TransitionResult),
        (status = 409, description = "Code already used in the division"),
        (status = 422, description = "Inconsistent hierarchy ids")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_outlet(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletWrite>,
    AuthenticatedUser(user): AuthenticatedUser,
    UserScope(scope): UserScope,
    Json(payload): Json<CreateOutletPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let new = NewOutlet {
        name: payload.name,
        code: payload.code,
        address: payload.address,
        level: payload.level,
        badan_usaha_id: payload.badan_usaha_id,
        division_id: payload.division_id,
        region_id: payload.region_id,
        cluster_id: payload.cluster_id,
    };

    let created = app_state
        .outlet_service
        .create_outlet(&scope, user.id, new)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
//  LIFECYCLE
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    #[schema(example = "MEMBER")]
    pub to_level: OutletLevel,
}

// POST /api/outlets/{id}/transitions
#[utoipa::path(
    post,
    path = "/api/outlets/{id}/transitions",
    tag = "Outlets",
    request_body = TransitionPayload,
    params(("id" = i64, Path, description = "Outlet id")),
    responses(
        (status = 200, description = "Transition applied immediately", body = TransitionResult),
        (status = 202, description = "Transition waiting for approval", body = TransitionResult),
        (status = 409, description = "Illegal transition or a request is already pending")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_transition(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletWrite>,
    AuthenticatedUser(user): AuthenticatedUser,
    UserScope(scope): UserScope,
    Path(outlet_id): Path<i64>,
    Json(payload): Json<TransitionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .outlet_service
        .request_transition(&scope, outlet_id, payload.to_level, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let status = if result.history.approval_status == ApprovalStatus::Pending {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayload {
    #[validate(length(min = 1, max = 50, message = "required"))]
    #[schema(example = "X1")]
    pub code: String,

    #[validate(custom(function = "validate_limit"))]
    #[schema(example = 500000)]
    pub limit: Decimal,
}

fn validate_limit(limit: &Decimal) -> Result<(), ValidationError> {
    if limit.is_sign_negative() {
        return Err(ValidationError::new("limit").with_message("limit cannot be negative".into()));
    }
    Ok(())
}

// POST /api/outlet-histories/{id}/approve
#[utoipa::path(
    post,
    path = "/api/outlet-histories/{id}/approve",
    tag = "Outlets",
    request_body = ApprovePayload,
    params(("id" = i64, Path, description = "Id of the open history row")),
    responses(
        (status = 200, description = "Outlet promoted to MEMBER", body = TransitionResult),
        (status = 409, description = "No open request, or outlet not at NOO")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletApprove>,
    AuthenticatedUser(user): AuthenticatedUser,
    UserScope(scope): UserScope,
    Path(history_id): Path<i64>,
    Json(payload): Json<ApprovePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let result = app_state
        .outlet_service
        .approve(&scope, history_id, user.id, payload.code, payload.limit)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[validate(length(min = 1, max = 1000, message = "required"))]
    #[schema(example = "Lokasi tidak sesuai")]
    pub reason: String,
}

// POST /api/outlet-histories/{id}/reject
#[utoipa::path(
    post,
    path = "/api/outlet-histories/{id}/reject",
    tag = "Outlets",
    request_body = RejectPayload,
    params(("id" = i64, Path, description = "Id of the open history row")),
    responses(
        (status = 200, description = "Request rejected, outlet marked UNPRODUCTIVE", body = TransitionResult),
        (status = 409, description = "No open request, or outlet not at NOO")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermOutletApprove>,
    AuthenticatedUser(user): AuthenticatedUser,
    UserScope(scope): UserScope,
    Path(history_id): Path<i64>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let result = app_state
        .outlet_service
        .reject(&scope, history_id, user.id, payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(result))
}
