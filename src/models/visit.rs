// src/models/visit.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::org::{HierarchyLevel, HierarchyScoped};

/// A sales visit, joined with the hierarchy of the visited outlet.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub user_id: i64,
    pub outlet_id: i64,
    #[schema(example = "Toko Berkah Jaya")]
    pub outlet_name: String,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub badan_usaha_id: i64,
    pub division_id: i64,
    pub region_id: Option<i64>,
    pub cluster_id: Option<i64>,
}

impl HierarchyScoped for Visit {
    fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64> {
        match level {
            HierarchyLevel::BadanUsaha => Some(self.badan_usaha_id),
            HierarchyLevel::Division => Some(self.division_id),
            HierarchyLevel::Region => self.region_id,
            HierarchyLevel::Cluster => self.cluster_id,
        }
    }
}
