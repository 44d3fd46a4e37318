// src/models/org.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

// --- Levels ---

/// The four levels of the organizational tree, broadest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyLevel {
    BadanUsaha,
    Division,
    Region,
    Cluster,
}

impl HierarchyLevel {
    pub const ALL: [HierarchyLevel; 4] = [
        HierarchyLevel::BadanUsaha,
        HierarchyLevel::Division,
        HierarchyLevel::Region,
        HierarchyLevel::Cluster,
    ];

    /// Foreign key column carried by scoped entities (outlets, users).
    pub fn column(self) -> &'static str {
        match self {
            HierarchyLevel::BadanUsaha => "badan_usaha_id",
            HierarchyLevel::Division => "division_id",
            HierarchyLevel::Region => "region_id",
            HierarchyLevel::Cluster => "cluster_id",
        }
    }

    /// Inverse of [`HierarchyLevel::column`]; also the vocabulary of
    /// `roles.scope_required_fields` / `roles.scope_multiple_fields`.
    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.column() == field)
    }

    /// Levels strictly above this one, nearest first.
    pub fn ancestors(self) -> &'static [HierarchyLevel] {
        match self {
            HierarchyLevel::BadanUsaha => &[],
            HierarchyLevel::Division => &[HierarchyLevel::BadanUsaha],
            HierarchyLevel::Region => &[HierarchyLevel::Division, HierarchyLevel::BadanUsaha],
            HierarchyLevel::Cluster => &[
                HierarchyLevel::Region,
                HierarchyLevel::Division,
                HierarchyLevel::BadanUsaha,
            ],
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Anything that sits somewhere in the tree: outlets, users, visits.
pub trait HierarchyScoped {
    fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64>;
}

// --- Nodes ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadanUsaha {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "PT Sumber Makmur")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i64,
    pub badan_usaha_id: i64,
    #[schema(example = "Consumer Goods")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i64,
    pub badan_usaha_id: i64,
    pub division_id: i64,
    #[schema(example = "Jawa Timur")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: i64,
    pub badan_usaha_id: i64,
    pub division_id: i64,
    pub region_id: i64,
    #[schema(example = "Surabaya Barat")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A candidate position in the tree. Deeper levels are optional; when one
/// is given every level above it must be given too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyPath {
    pub badan_usaha_id: i64,
    pub division_id: Option<i64>,
    pub region_id: Option<i64>,
    pub cluster_id: Option<i64>,
}

impl HierarchyScoped for HierarchyPath {
    fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64> {
        match level {
            HierarchyLevel::BadanUsaha => Some(self.badan_usaha_id),
            HierarchyLevel::Division => self.division_id,
            HierarchyLevel::Region => self.region_id,
            HierarchyLevel::Cluster => self.cluster_id,
        }
    }
}

/// Whole tree, flattened per level (GET /api/org/tree).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrgTree {
    pub badan_usaha: Vec<BadanUsaha>,
    pub divisions: Vec<Division>,
    pub regions: Vec<Region>,
    pub clusters: Vec<Cluster>,
}
