// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;
use crate::models::outlet::OutletLevel;
use crate::services::hierarchy::HierarchyMismatch;
use crate::services::scope_validator::ScopeValidationError;

// Single error type of the application. Handlers turn it into an `ApiError`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("invalid token")]
    InvalidToken,

    #[error("{0} not found")]
    NotFound(&'static str),

    // --- Authorization ---
    #[error("permission '{0}' required")]
    PermissionDenied(&'static str),

    #[error("{entity} {id} is outside the user's scope")]
    ScopeDenied { entity: &'static str, id: i64 },

    // --- Hierarchy / scope writes ---
    #[error(transparent)]
    HierarchyMismatch(#[from] HierarchyMismatch),

    #[error("scope assignment rejected ({} problem(s))", .0.len())]
    ScopeValidation(Vec<ScopeValidationError>),

    // --- Outlet lifecycle ---
    #[error("transition {from} -> {to} is not allowed")]
    InvalidTransition { from: OutletLevel, to: OutletLevel },

    #[error("outlet {0} already has a pending approval request")]
    ApprovalAlreadyPending(i64),

    #[error("history {0} is not an open approval request")]
    NoOpenApprovalRequest(i64),

    #[error("outlet {outlet_id} is at {level}, approval requires NOO")]
    InvalidApprovalState { outlet_id: i64, level: OutletLevel },

    #[error("outlet {0} was modified concurrently")]
    ConcurrentModification(i64),

    #[error("outlet code '{0}' is already used in this division")]
    OutletCodeTaken(String),

    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

// Error body sent to the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) | AppError::ScopeDenied { .. } => StatusCode::FORBIDDEN,
            AppError::HierarchyMismatch(_) | AppError::ScopeValidation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidTransition { .. }
            | AppError::ApprovalAlreadyPending(_)
            | AppError::NoOpenApprovalRequest(_)
            | AppError::InvalidApprovalState { .. }
            | AppError::ConcurrentModification(_)
            | AppError::OutletCodeTaken(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the client-facing error in the caller's language.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let id = locale.is_indonesian();
        let status = self.status();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                let msg = if id { "Satu atau lebih field tidak valid." } else { "One or more fields are invalid." };
                (msg.to_string(), Some(Value::Object(details)))
            }
            AppError::InvalidToken => {
                let msg = if id { "Token autentikasi tidak valid atau tidak ada." } else { "Missing or invalid authentication token." };
                (msg.to_string(), None)
            }
            AppError::NotFound(entity) => {
                let msg = if id { format!("{entity} tidak ditemukan.") } else { format!("{entity} not found.") };
                (msg, None)
            }
            AppError::PermissionDenied(slug) => {
                let msg = if id {
                    format!("Anda memerlukan izin '{slug}' untuk melakukan aksi ini.")
                } else {
                    format!("You need the '{slug}' permission to perform this action.")
                };
                (msg, None)
            }
            AppError::ScopeDenied { entity, id: entity_id } => {
                let msg = if id {
                    format!("{entity} {entity_id} berada di luar cakupan akses Anda.")
                } else {
                    format!("{entity} {entity_id} is outside your access scope.")
                };
                (msg, None)
            }
            AppError::HierarchyMismatch(mismatch) => {
                let msg = if id { "Data hierarki organisasi tidak konsisten." } else { "Organization hierarchy data is inconsistent." };
                (msg.to_string(), Some(json!([mismatch.to_string()])))
            }
            AppError::ScopeValidation(problems) => {
                let msg = if id { "Scope tidak konsisten dengan hierarki organisasi atau role." } else { "Scope is inconsistent with the organization hierarchy or role." };
                let details: Vec<String> = problems.iter().map(ToString::to_string).collect();
                (msg.to_string(), Some(json!(details)))
            }
            AppError::InvalidTransition { from, to } => {
                let msg = if id {
                    format!("Perubahan level {from} ke {to} tidak diperbolehkan.")
                } else {
                    format!("Changing level from {from} to {to} is not allowed.")
                };
                (msg, None)
            }
            AppError::ApprovalAlreadyPending(_) => {
                let msg = if id { "Outlet ini masih memiliki pengajuan yang menunggu persetujuan." } else { "This outlet already has a request awaiting approval." };
                (msg.to_string(), None)
            }
            AppError::NoOpenApprovalRequest(_) => {
                let msg = if id { "Tidak ada pengajuan terbuka untuk disetujui atau ditolak." } else { "There is no open request to approve or reject." };
                (msg.to_string(), None)
            }
            AppError::InvalidApprovalState { level, .. } => {
                let msg = if id {
                    format!("Outlet berada di level {level}; persetujuan hanya untuk level NOO.")
                } else {
                    format!("Outlet is at level {level}; approval only applies to NOO outlets.")
                };
                (msg, None)
            }
            AppError::ConcurrentModification(_) => {
                let msg = if id { "Outlet sedang diubah oleh pengguna lain, silakan coba lagi." } else { "The outlet was changed by someone else, please retry." };
                (msg.to_string(), None)
            }
            AppError::OutletCodeTaken(code) => {
                let msg = if id {
                    format!("Kode outlet '{code}' sudah digunakan di divisi ini.")
                } else {
                    format!("Outlet code '{code}' is already used in this division.")
                };
                (msg, None)
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                tracing::error!("internal server error: {}", self);
                let msg = if id { "Terjadi kesalahan yang tidak terduga." } else { "An unexpected error occurred." };
                (msg.to_string(), None)
            }
        };

        ApiError { status, error, details }
    }

    /// Unique-index violations on outlet codes become a domain error.
    pub fn from_outlet_write(e: sqlx::Error, code: Option<&str>) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::OutletCodeTaken(code.unwrap_or_default().to_string());
            }
        }
        e.into()
    }
}

// Used where no locale is available (middleware rejections)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}
