// src/services/hierarchy.rs

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::models::org::{BadanUsaha, Cluster, Division, HierarchyLevel, HierarchyPath, Region};

/// Why a node failed the consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    UnknownNode,
    /// A deeper level was given without the level above it.
    MissingParent(HierarchyLevel),
    ParentMismatch {
        parent_level: HierarchyLevel,
        expected: i64,
        actual: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct HierarchyMismatch {
    pub level: HierarchyLevel,
    pub id: i64,
    pub reason: MismatchReason,
}

impl fmt::Display for HierarchyMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MismatchReason::UnknownNode => write!(f, "{} {} does not exist", self.level, self.id),
            MismatchReason::MissingParent(parent) => {
                write!(f, "{} {} given without {}", self.level, self.id, parent)
            }
            MismatchReason::ParentMismatch { parent_level, expected, actual } => write!(
                f,
                "{} {} belongs to {} {}, not {}",
                self.level, self.id, parent_level, actual, expected
            ),
        }
    }
}

/// Parent pointers of one node, as stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parents {
    pub badan_usaha_id: Option<i64>,
    pub division_id: Option<i64>,
    pub region_id: Option<i64>,
}

impl Parents {
    pub fn at(&self, level: HierarchyLevel) -> Option<i64> {
        match level {
            HierarchyLevel::BadanUsaha => self.badan_usaha_id,
            HierarchyLevel::Division => self.division_id,
            HierarchyLevel::Region => self.region_id,
            HierarchyLevel::Cluster => None,
        }
    }
}

/// In-memory snapshot of the organizational tree.
#[derive(Debug, Clone, Default)]
pub struct OrgHierarchy {
    nodes: HashMap<(HierarchyLevel, i64), Parents>,
}

impl OrgHierarchy {
    pub fn from_nodes(
        badan_usaha: &[BadanUsaha],
        divisions: &[Division],
        regions: &[Region],
        clusters: &[Cluster],
    ) -> Self {
        let mut hierarchy = Self::default();
        for bu in badan_usaha {
            hierarchy.insert(HierarchyLevel::BadanUsaha, bu.id, Parents::default());
        }
        for d in divisions {
            hierarchy.insert(
                HierarchyLevel::Division,
                d.id,
                Parents { badan_usaha_id: Some(d.badan_usaha_id), ..Parents::default() },
            );
        }
        for r in regions {
            hierarchy.insert(
                HierarchyLevel::Region,
                r.id,
                Parents {
                    badan_usaha_id: Some(r.badan_usaha_id),
                    division_id: Some(r.division_id),
                    region_id: None,
                },
            );
        }
        for c in clusters {
            hierarchy.insert(
                HierarchyLevel::Cluster,
                c.id,
                Parents {
                    badan_usaha_id: Some(c.badan_usaha_id),
                    division_id: Some(c.division_id),
                    region_id: Some(c.region_id),
                },
            );
        }
        hierarchy
    }

    pub fn insert(&mut self, level: HierarchyLevel, id: i64, parents: Parents) {
        self.nodes.insert((level, id), parents);
    }

    pub fn parents(&self, level: HierarchyLevel, id: i64) -> Option<&Parents> {
        self.nodes.get(&(level, id))
    }

    /// Checks that every node named by `path` exists and that each one's
    /// stored parents agree with the ids given at the levels above it.
    /// The first offending level, broadest first, is reported.
    pub fn validate_consistency(&self, path: &HierarchyPath) -> Result<(), HierarchyMismatch> {
        let given = [
            (HierarchyLevel::BadanUsaha, Some(path.badan_usaha_id)),
            (HierarchyLevel::Division, path.division_id),
            (HierarchyLevel::Region, path.region_id),
            (HierarchyLevel::Cluster, path.cluster_id),
        ];
        let at = |level: HierarchyLevel| given.iter().find(|(l, _)| *l == level).and_then(|(_, id)| *id);

        for (level, id) in given {
            let Some(id) = id else { continue };

            let Some(parents) = self.parents(level, id) else {
                return Err(HierarchyMismatch { level, id, reason: MismatchReason::UnknownNode });
            };

            for &parent_level in level.ancestors() {
                let Some(expected) = at(parent_level) else {
                    return Err(HierarchyMismatch {
                        level,
                        id,
                        reason: MismatchReason::MissingParent(parent_level),
                    });
                };
                match parents.at(parent_level) {
                    Some(actual) if actual == expected => {}
                    actual => {
                        return Err(HierarchyMismatch {
                            level,
                            id,
                            reason: MismatchReason::ParentMismatch {
                                parent_level,
                                expected,
                                actual: actual.unwrap_or_default(),
                            },
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
