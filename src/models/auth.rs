// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::org::{HierarchyLevel, HierarchyScoped};

// A user as stored in the database
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = "budi@example.co.id")]
    pub email: String,
    pub role_id: i64,
    pub badan_usaha_id: Option<i64>,
    pub division_id: Option<i64>,
    pub region_id: Option<i64>,
    pub cluster_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HierarchyScoped for User {
    fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64> {
        match level {
            HierarchyLevel::BadanUsaha => self.badan_usaha_id,
            HierarchyLevel::Division => self.division_id,
            HierarchyLevel::Region => self.region_id,
            HierarchyLevel::Cluster => self.cluster_id,
        }
    }
}

// Claims inside the JWT issued by the identity provider
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // user id
    pub exp: usize,
    pub iat: usize,
}
