// src/models/outlet.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

use crate::models::org::{HierarchyLevel, HierarchyScoped};

// --- Enums ---

/// Lifecycle maturity of an outlet. Declaration order is the maturity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "outlet_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutletLevel {
    Lead,
    Noo,
    Member,
}

impl fmt::Display for OutletLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutletLevel::Lead => "LEAD",
            OutletLevel::Noo => "NOO",
            OutletLevel::Member => "MEMBER",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "outlet_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutletStatus {
    Maintain,
    Unmaintain,
    Unproductive,
}

/// Outcome recorded on a history row.
///
/// `NotRequired` marks a row that never needed a decision (outlet creation);
/// it is not the same thing as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    NotRequired,
    Pending,
    Approved,
    Rejected,
    AutoApproved,
}

// --- Entities ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Outlet {
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "Toko Berkah Jaya")]
    pub name: String,
    #[schema(example = "SBY-0042")]
    pub code: Option<String>,
    pub address: Option<String>,
    pub level: OutletLevel,
    pub status: OutletStatus,
    #[schema(example = "500000")]
    pub limit: Option<Decimal>,
    pub badan_usaha_id: i64,
    pub division_id: i64,
    pub region_id: Option<i64>,
    pub cluster_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl HierarchyScoped for Outlet {
    fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64> {
        match level {
            HierarchyLevel::BadanUsaha => Some(self.badan_usaha_id),
            HierarchyLevel::Division => Some(self.division_id),
            HierarchyLevel::Region => self.region_id,
            HierarchyLevel::Cluster => self.cluster_id,
        }
    }
}

/// Append-only audit row of `outlet_histories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutletHistory {
    pub id: i64,
    pub outlet_id: i64,
    /// `None` for the row written when the outlet was created.
    pub from_level: Option<OutletLevel>,
    pub to_level: OutletLevel,
    pub requested_by: Option<i64>,
    pub approved_by: Option<i64>,
    pub approval_status: ApprovalStatus,
    pub approval_notes: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl OutletHistory {
    /// Whether this row, being the latest one of an outlet currently at
    /// `outlet_level`, still waits for an approve/reject decision.
    pub fn awaits_decision(&self, outlet_level: OutletLevel) -> bool {
        match self.approval_status {
            ApprovalStatus::Pending => true,
            // registered straight into NOO and never reviewed
            ApprovalStatus::NotRequired => {
                self.to_level == OutletLevel::Noo && outlet_level == OutletLevel::Noo
            }
            _ => false,
        }
    }
}

/// A history row that has been planned but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutletHistory {
    pub outlet_id: i64,
    pub from_level: Option<OutletLevel>,
    pub to_level: OutletLevel,
    pub requested_by: Option<i64>,
    pub approved_by: Option<i64>,
    pub approval_status: ApprovalStatus,
    pub approval_notes: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Values needed to insert an outlet.
#[derive(Debug, Clone)]
pub struct NewOutlet {
    pub name: String,
    pub code: Option<String>,
    pub address: Option<String>,
    pub level: OutletLevel,
    pub badan_usaha_id: i64,
    pub division_id: i64,
    pub region_id: Option<i64>,
    pub cluster_id: Option<i64>,
}

impl HierarchyScoped for NewOutlet {
    fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64> {
        match level {
            HierarchyLevel::BadanUsaha => Some(self.badan_usaha_id),
            HierarchyLevel::Division => Some(self.division_id),
            HierarchyLevel::Region => self.region_id,
            HierarchyLevel::Cluster => self.cluster_id,
        }
    }
}

/// Decision passed to the notification dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// Outlet together with the history row a lifecycle operation produced.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub outlet: Outlet,
    pub history: OutletHistory,
}
