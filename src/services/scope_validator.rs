// src/services/scope_validator.rs

use thiserror::Error;

use crate::models::org::HierarchyLevel;
use crate::models::rbac::Role;
use crate::models::scope::ScopeAssignment;
use crate::services::hierarchy::OrgHierarchy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeValidationError {
    #[error("{0} is required for this role")]
    MissingRequiredField(HierarchyLevel),

    #[error("{level} accepts a single id for this role, got {count}")]
    TooManyValues { level: HierarchyLevel, count: usize },

    #[error("{level} {id} does not exist")]
    UnknownNode { level: HierarchyLevel, id: i64 },

    #[error("{level} {id} belongs to {parent_level} {actual}, which is not part of this scope")]
    ParentNotInScope {
        level: HierarchyLevel,
        id: i64,
        parent_level: HierarchyLevel,
        actual: i64,
    },
}

/// Checks one scope row against the role's metadata and the org tree.
///
/// Every id at a restricted level must exist, and its stored parents must be
/// among the ids assigned at each restricted ancestor level. Problems are
/// collected (one per offending entity) instead of stopping at the first.
pub fn validate_scope_assignment(
    assignment: &ScopeAssignment,
    role: &Role,
    hierarchy: &OrgHierarchy,
) -> Result<(), Vec<ScopeValidationError>> {
    let mut errors = Vec::new();

    for level in role.required_levels() {
        if assignment.ids(level).is_none_or(<[i64]>::is_empty) {
            errors.push(ScopeValidationError::MissingRequiredField(level));
        }
    }

    for level in HierarchyLevel::ALL {
        let Some(ids) = assignment.ids(level) else { continue };

        if ids.len() > 1 && !role.allows_multiple(level) {
            errors.push(ScopeValidationError::TooManyValues { level, count: ids.len() });
        }

        for &id in ids {
            let Some(parents) = hierarchy.parents(level, id) else {
                errors.push(ScopeValidationError::UnknownNode { level, id });
                continue;
            };

            let offending = level.ancestors().iter().find_map(|&parent_level| {
                let allowed = assignment.ids(parent_level)?;
                let actual = parents.at(parent_level)?;
                (!allowed.contains(&actual)).then_some(ScopeValidationError::ParentNotInScope {
                    level,
                    id,
                    parent_level,
                    actual,
                })
            });
            if let Some(e) = offending {
                errors.push(e);
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
