// src/models/scope.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{auth::User, org::HierarchyLevel, rbac::Role};

/// One stored row of the `scopes` table.
///
/// A `None` column means "no restriction at this level", `Some(vec![])`
/// means "no access at this level".
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRow {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = json!([1]))]
    pub badan_usaha_ids: Option<Vec<i64>>,
    #[schema(example = json!([3]))]
    pub division_ids: Option<Vec<i64>>,
    #[schema(example = json!([10, 11]))]
    pub region_ids: Option<Vec<i64>>,
    pub cluster_ids: Option<Vec<i64>>,
    pub created_at: DateTime<Utc>,
}

/// Payload of PUT /api/users/{id}/scopes, one entry per scope row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeAssignment {
    #[serde(default)]
    pub badan_usaha_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub division_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub region_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub cluster_ids: Option<Vec<i64>>,
}

impl ScopeAssignment {
    pub fn ids(&self, level: HierarchyLevel) -> Option<&[i64]> {
        match level {
            HierarchyLevel::BadanUsaha => self.badan_usaha_ids.as_deref(),
            HierarchyLevel::Division => self.division_ids.as_deref(),
            HierarchyLevel::Region => self.region_ids.as_deref(),
            HierarchyLevel::Cluster => self.cluster_ids.as_deref(),
        }
    }
}

impl From<&ScopeRow> for ScopeAssignment {
    fn from(row: &ScopeRow) -> Self {
        Self {
            badan_usaha_ids: row.badan_usaha_ids.clone(),
            division_ids: row.division_ids.clone(),
            region_ids: row.region_ids.clone(),
            cluster_ids: row.cluster_ids.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceScopesPayload {
    #[validate(length(max = 50, message = "too many scope rows"))]
    pub scopes: Vec<ScopeAssignment>,
}

/// Response of GET /api/me/scope.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyScope {
    pub user: User,
    pub role: Role,
    /// True when no hierarchy filter applies to the caller.
    pub unrestricted: bool,
    /// Effective entries after de-duplication; empty and restricted means no access.
    pub entries: Vec<ScopeAssignment>,
    pub permissions: Vec<String>,
}
