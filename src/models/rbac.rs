// src/models/rbac.rs

use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use utoipa::ToSchema;

use crate::models::org::HierarchyLevel;

// Row of the `roles` table
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = 2)]
    pub id: i64,

    #[schema(example = "ASM")]
    pub name: String,

    /// Hierarchy fields a scope for this role must fill.
    #[schema(example = json!(["badan_usaha_id", "division_id", "region_id"]))]
    pub scope_required_fields: Vec<String>,

    /// Hierarchy fields that may hold more than one id.
    #[schema(example = json!(["region_id"]))]
    pub scope_multiple_fields: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Required fields as levels. Unknown field names are ignored.
    pub fn required_levels(&self) -> Vec<HierarchyLevel> {
        Self::levels(&self.scope_required_fields)
    }

    pub fn allows_multiple(&self, level: HierarchyLevel) -> bool {
        Self::levels(&self.scope_multiple_fields).contains(&level)
    }

    pub fn requires_scope(&self) -> bool {
        !self.required_levels().is_empty()
    }

    fn levels(fields: &[String]) -> Vec<HierarchyLevel> {
        fields
            .iter()
            .filter_map(|f| HierarchyLevel::from_field(f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(required: &[&str], multiple: &[&str]) -> Role {
        Role {
            id: 1,
            name: "TEST".into(),
            scope_required_fields: required.iter().map(|s| s.to_string()).collect(),
            scope_multiple_fields: multiple.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let r = role(&["cluster_id", "warehouse_id"], &[]);
        assert_eq!(r.required_levels(), vec![HierarchyLevel::Cluster]);
        assert!(r.requires_scope());
    }

    #[test]
    fn empty_required_means_unscoped_role() {
        let r = role(&[], &["region_id"]);
        assert!(!r.requires_scope());
        assert!(r.allows_multiple(HierarchyLevel::Region));
        assert!(!r.allows_multiple(HierarchyLevel::Cluster));
    }
}
