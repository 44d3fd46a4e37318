// src/services/scope_set.rs

use std::collections::BTreeSet;

use sqlx::{Postgres, QueryBuilder};

use crate::models::org::{HierarchyLevel, HierarchyPath, HierarchyScoped};
use crate::models::rbac::Role;
use crate::models::scope::{ScopeAssignment, ScopeRow};

// =============================================================================
//  PREDICATE TREE
// =============================================================================

/// Backend-neutral filter built once from a [`ScopeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    True,
    False,
    /// `alias.column = ANY(ids)`; `level` says which hierarchy id is compared.
    In {
        column: String,
        level: HierarchyLevel,
        ids: BTreeSet<i64>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// In-memory evaluation; same semantics as the rendered SQL.
    #[cfg(test)]
    pub fn evaluate<E: HierarchyScoped + ?Sized>(&self, entity: &E) -> bool {
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::In { level, ids, .. } => {
                entity.hierarchy_id(*level).is_some_and(|id| ids.contains(&id))
            }
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(entity)),
            Predicate::Or(parts) => parts.iter().any(|p| p.evaluate(entity)),
        }
    }

    /// Appends the predicate as SQL. Id sets are bound as `BIGINT[]`.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::True => {
                qb.push("TRUE");
            }
            Predicate::False => {
                qb.push("FALSE");
            }
            Predicate::In { ids, .. } if ids.is_empty() => {
                qb.push("FALSE");
            }
            Predicate::In { column, ids, .. } => {
                qb.push(column.as_str())
                    .push(" = ANY(")
                    .push_bind(ids.iter().copied().collect::<Vec<i64>>())
                    .push(")");
            }
            Predicate::And(parts) => Self::push_joined(qb, parts, " AND ", "TRUE"),
            Predicate::Or(parts) => Self::push_joined(qb, parts, " OR ", "FALSE"),
        }
    }

    fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, parts: &[Predicate], sep: &str, empty: &str) {
        if parts.is_empty() {
            qb.push(empty);
            return;
        }
        qb.push("(");
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                qb.push(sep);
            }
            part.push_sql(qb);
        }
        qb.push(")");
    }
}

// =============================================================================
//  SCOPE SET
// =============================================================================

/// Restrictions of a single scope row. `None` means unrestricted at that level.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopeEntry {
    pub badan_usaha_ids: Option<BTreeSet<i64>>,
    pub division_ids: Option<BTreeSet<i64>>,
    pub region_ids: Option<BTreeSet<i64>>,
    pub cluster_ids: Option<BTreeSet<i64>>,
}

impl ScopeEntry {
    pub fn restriction(&self, level: HierarchyLevel) -> Option<&BTreeSet<i64>> {
        match level {
            HierarchyLevel::BadanUsaha => self.badan_usaha_ids.as_ref(),
            HierarchyLevel::Division => self.division_ids.as_ref(),
            HierarchyLevel::Region => self.region_ids.as_ref(),
            HierarchyLevel::Cluster => self.cluster_ids.as_ref(),
        }
    }

    pub fn matches<E: HierarchyScoped + ?Sized>(&self, entity: &E) -> bool {
        HierarchyLevel::ALL.into_iter().all(|level| match self.restriction(level) {
            None => true,
            Some(ids) => entity.hierarchy_id(level).is_some_and(|id| ids.contains(&id)),
        })
    }

    /// Like [`ScopeEntry::matches`], but levels the entity does not reach
    /// (an org node above cluster) are skipped instead of failing.
    pub fn permits_path<E: HierarchyScoped + ?Sized>(&self, entity: &E) -> bool {
        HierarchyLevel::ALL.into_iter().all(|level| {
            match (self.restriction(level), entity.hierarchy_id(level)) {
                (Some(ids), Some(id)) => ids.contains(&id),
                _ => true,
            }
        })
    }

    /// True when everything `self` allows is also allowed by `outer`: at each
    /// level `outer` restricts, `self` is restricted to a subset.
    pub fn is_within(&self, outer: &ScopeEntry) -> bool {
        HierarchyLevel::ALL.into_iter().all(|level| match (outer.restriction(level), self.restriction(level)) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(allowed), Some(ids)) => ids.is_subset(allowed),
        })
    }

    fn to_predicate(&self, alias: &str) -> Predicate {
        let parts: Vec<Predicate> = HierarchyLevel::ALL
            .into_iter()
            .filter_map(|level| {
                self.restriction(level).map(|ids| Predicate::In {
                    column: format!("{alias}.{}", level.column()),
                    level,
                    ids: ids.clone(),
                })
            })
            .collect();

        match parts.len() {
            0 => Predicate::True,
            1 => parts.into_iter().next().unwrap_or(Predicate::True),
            _ => Predicate::And(parts),
        }
    }
}

impl From<&ScopeRow> for ScopeEntry {
    fn from(row: &ScopeRow) -> Self {
        let set = |ids: &Option<Vec<i64>>| ids.as_ref().map(|v| v.iter().copied().collect());
        Self {
            badan_usaha_ids: set(&row.badan_usaha_ids),
            division_ids: set(&row.division_ids),
            region_ids: set(&row.region_ids),
            cluster_ids: set(&row.cluster_ids),
        }
    }
}

impl From<&ScopeAssignment> for ScopeEntry {
    fn from(assignment: &ScopeAssignment) -> Self {
        let set = |ids: &Option<Vec<i64>>| ids.as_ref().map(|v| v.iter().copied().collect());
        Self {
            badan_usaha_ids: set(&assignment.badan_usaha_ids),
            division_ids: set(&assignment.division_ids),
            region_ids: set(&assignment.region_ids),
            cluster_ids: set(&assignment.cluster_ids),
        }
    }
}

impl From<&ScopeEntry> for ScopeAssignment {
    fn from(entry: &ScopeEntry) -> Self {
        let ids = |set: Option<&BTreeSet<i64>>| set.map(|s| s.iter().copied().collect());
        Self {
            badan_usaha_ids: ids(entry.restriction(HierarchyLevel::BadanUsaha)),
            division_ids: ids(entry.restriction(HierarchyLevel::Division)),
            region_ids: ids(entry.restriction(HierarchyLevel::Region)),
            cluster_ids: ids(entry.restriction(HierarchyLevel::Cluster)),
        }
    }
}

/// Kinds of records that are filtered by scope, with the alias their
/// hierarchy columns are read from in the list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Outlet,
    User,
    /// Visits are scoped through the visited outlet.
    Visit,
}

impl EntityKind {
    pub fn alias(self) -> &'static str {
        match self {
            EntityKind::Outlet | EntityKind::Visit => "o",
            EntityKind::User => "u",
        }
    }
}

/// Everything a user may see, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSet {
    Unrestricted,
    /// Union of entries; an empty list denies everything.
    Restricted(Vec<ScopeEntry>),
}

impl ScopeSet {
    /// Builds the scope of a user from their role and stored scope rows.
    ///
    /// Stored rows always apply. Without rows, a role that requires no
    /// scope fields sees everything and any other role sees nothing.
    pub fn resolve(role: &Role, rows: &[ScopeRow]) -> Self {
        if rows.is_empty() {
            return if role.requires_scope() {
                ScopeSet::deny_all()
            } else {
                ScopeSet::Unrestricted
            };
        }

        let entries: BTreeSet<ScopeEntry> = rows.iter().map(ScopeEntry::from).collect();
        ScopeSet::Restricted(entries.into_iter().collect())
    }

    pub fn deny_all() -> Self {
        ScopeSet::Restricted(Vec::new())
    }

    pub fn matches<E: HierarchyScoped + ?Sized>(&self, entity: &E) -> bool {
        match self {
            ScopeSet::Unrestricted => true,
            ScopeSet::Restricted(entries) => entries.iter().any(|e| e.matches(entity)),
        }
    }

    /// Disjunction over entries, each a conjunction of `IN` leaves for its
    /// restricted levels.
    pub fn to_query_filter(&self, alias: &str) -> Predicate {
        match self {
            ScopeSet::Unrestricted => Predicate::True,
            ScopeSet::Restricted(entries) if entries.is_empty() => Predicate::False,
            ScopeSet::Restricted(entries) => {
                let mut parts: Vec<Predicate> = entries.iter().map(|e| e.to_predicate(alias)).collect();
                if parts.contains(&Predicate::True) {
                    return Predicate::True;
                }
                if parts.len() == 1 {
                    return parts.remove(0);
                }
                Predicate::Or(parts)
            }
        }
    }

    pub fn filter_for(&self, kind: EntityKind) -> Predicate {
        self.to_query_filter(kind.alias())
    }

    /// Whether an org node (given by its own id and its ancestors' ids) is
    /// visible. A single entry has to allow the whole chain.
    pub fn permits_node(&self, path: &HierarchyPath) -> bool {
        match self {
            ScopeSet::Unrestricted => true,
            ScopeSet::Restricted(entries) => entries.iter().any(|e| e.permits_path(path)),
        }
    }

    /// Whether granting `entry` stays inside this scope.
    pub fn covers(&self, entry: &ScopeEntry) -> bool {
        match self {
            ScopeSet::Unrestricted => true,
            ScopeSet::Restricted(entries) => entries.iter().any(|outer| entry.is_within(outer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[derive(Debug, Clone, Copy)]
    struct Probe {
        bu: Option<i64>,
        div: Option<i64>,
        reg: Option<i64>,
        cl: Option<i64>,
    }

    impl HierarchyScoped for Probe {
        fn hierarchy_id(&self, level: HierarchyLevel) -> Option<i64> {
            match level {
                HierarchyLevel::BadanUsaha => self.bu,
                HierarchyLevel::Division => self.div,
                HierarchyLevel::Region => self.reg,
                HierarchyLevel::Cluster => self.cl,
            }
        }
    }

    fn probe(bu: i64, div: i64, reg: i64, cl: i64) -> Probe {
        Probe { bu: Some(bu), div: Some(div), reg: Some(reg), cl: Some(cl) }
    }

    fn role(required: &[&str]) -> Role {
        Role {
            id: 1,
            name: "TEST".into(),
            scope_required_fields: required.iter().map(|s| s.to_string()).collect(),
            scope_multiple_fields: vec![],
            created_at: Utc::now(),
        }
    }

    fn row(
        bu: Option<Vec<i64>>,
        div: Option<Vec<i64>>,
        reg: Option<Vec<i64>>,
        cl: Option<Vec<i64>>,
    ) -> ScopeRow {
        ScopeRow {
            id: 1,
            user_id: 7,
            badan_usaha_ids: bu,
            division_ids: div,
            region_ids: reg,
            cluster_ids: cl,
            created_at: Utc::now(),
        }
    }

    fn render(p: &Predicate) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        p.push_sql(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn unscoped_role_without_rows_sees_everything() {
        let scope = ScopeSet::resolve(&role(&[]), &[]);
        assert_eq!(scope, ScopeSet::Unrestricted);
        assert!(scope.matches(&probe(1, 2, 3, 4)));
        assert!(scope.matches(&Probe { bu: None, div: None, reg: None, cl: None }));
        assert_eq!(scope.to_query_filter("o"), Predicate::True);
    }

    #[test]
    fn scoped_role_without_rows_sees_nothing() {
        let scope = ScopeSet::resolve(&role(&["cluster_id"]), &[]);
        assert!(!scope.matches(&probe(1, 2, 3, 4)));
        assert_eq!(scope.to_query_filter("o"), Predicate::False);
        assert_eq!(render(&scope.to_query_filter("o")), "FALSE");
    }

    #[test]
    fn each_level_restricts_independently() {
        let inside = probe(1, 10, 100, 1000);
        for level in HierarchyLevel::ALL {
            let mut entry = ScopeEntry::default();
            let allowed: BTreeSet<i64> = [inside.hierarchy_id(level).unwrap_or_default()].into();
            match level {
                HierarchyLevel::BadanUsaha => entry.badan_usaha_ids = Some(allowed),
                HierarchyLevel::Division => entry.division_ids = Some(allowed),
                HierarchyLevel::Region => entry.region_ids = Some(allowed),
                HierarchyLevel::Cluster => entry.cluster_ids = Some(allowed),
            }
            let scope = ScopeSet::Restricted(vec![entry]);
            assert!(scope.matches(&inside), "{level}");

            let mut outside = inside;
            match level {
                HierarchyLevel::BadanUsaha => outside.bu = Some(9),
                HierarchyLevel::Division => outside.div = Some(99),
                HierarchyLevel::Region => outside.reg = Some(999),
                HierarchyLevel::Cluster => outside.cl = Some(9999),
            }
            assert!(!scope.matches(&outside), "{level}");
            assert!(!scope.to_query_filter("o").evaluate(&outside), "{level}");
        }
    }

    #[test]
    fn missing_value_never_satisfies_a_restriction() {
        let scope = ScopeSet::resolve(&role(&["cluster_id"]), &[row(None, None, None, Some(vec![1000]))]);
        let no_cluster = Probe { bu: Some(1), div: Some(10), reg: Some(100), cl: None };
        assert!(!scope.matches(&no_cluster));
    }

    #[test]
    fn rows_combine_with_or_levels_with_and() {
        let scope = ScopeSet::resolve(
            &role(&["region_id"]),
            &[
                row(Some(vec![1]), Some(vec![10]), Some(vec![100]), None),
                row(Some(vec![2]), Some(vec![20]), None, None),
            ],
        );
        assert!(scope.matches(&probe(1, 10, 100, 1000)));
        assert!(scope.matches(&probe(2, 20, 200, 2000)));
        // right region, wrong division for the first row, and not under row two
        assert!(!scope.matches(&probe(1, 11, 100, 1000)));

        let filter = scope.to_query_filter("o");
        assert_eq!(
            render(&filter),
            "((o.badan_usaha_id = ANY($1) AND o.division_id = ANY($2) AND o.region_id = ANY($3)) \
             OR (o.badan_usaha_id = ANY($4) AND o.division_id = ANY($5)))"
        );
    }

    #[test]
    fn cluster_only_row_ignores_other_levels() {
        let scope = ScopeSet::resolve(&role(&["cluster_id"]), &[row(None, None, None, Some(vec![1000, 1100]))]);
        assert!(scope.matches(&probe(7, 77, 777, 1100)));
        assert_eq!(render(&scope.filter_for(EntityKind::User)), "u.cluster_id = ANY($1)");
    }

    #[test]
    fn empty_set_at_a_level_denies() {
        let scope = ScopeSet::resolve(&role(&[]), &[row(Some(vec![]), None, None, None)]);
        assert!(!scope.matches(&probe(1, 10, 100, 1000)));
        assert_eq!(render(&scope.to_query_filter("o")), "FALSE");
    }

    #[test]
    fn open_row_makes_filter_true() {
        let scope = ScopeSet::resolve(
            &role(&[]),
            &[row(None, None, None, None), row(Some(vec![1]), None, None, None)],
        );
        assert_eq!(scope.to_query_filter("o"), Predicate::True);
        assert!(scope.permits_node(&HierarchyPath { badan_usaha_id: 5, ..HierarchyPath::default() }));
    }

    #[test]
    fn duplicate_rows_collapse() {
        let r = row(Some(vec![1]), Some(vec![10]), None, None);
        let scope = ScopeSet::resolve(&role(&["division_id"]), &[r.clone(), r]);
        assert_eq!(render(&scope.to_query_filter("o")), "(o.badan_usaha_id = ANY($1) AND o.division_id = ANY($2))");
    }

    #[test]
    fn node_needs_one_row_allowing_its_whole_chain() {
        let scope = ScopeSet::resolve(
            &role(&[]),
            &[
                row(Some(vec![1]), None, None, None),
                row(Some(vec![2]), Some(vec![20]), None, None),
            ],
        );
        let division = |bu, div| HierarchyPath { badan_usaha_id: bu, division_id: Some(div), ..HierarchyPath::default() };

        assert!(scope.permits_node(&division(1, 11)));
        assert!(scope.permits_node(&division(2, 20)));
        assert!(!scope.permits_node(&division(2, 21)));
        assert!(scope.permits_node(&HierarchyPath { badan_usaha_id: 2, ..HierarchyPath::default() }));
    }

    #[test]
    fn cluster_row_does_not_hide_upper_nodes() {
        let scope = ScopeSet::resolve(&role(&["cluster_id"]), &[row(None, None, None, Some(vec![1000]))]);
        let region = HierarchyPath { badan_usaha_id: 1, division_id: Some(10), region_id: Some(100), cluster_id: None };
        assert!(scope.permits_node(&region));
        assert!(!scope.permits_node(&HierarchyPath { cluster_id: Some(1100), ..region }));
    }

    #[test]
    fn grant_must_stay_inside_callers_rows() {
        let caller = ScopeSet::resolve(
            &role(&["division_id"]),
            &[row(Some(vec![1]), Some(vec![10, 11]), None, None)],
        );
        let entry = |r: ScopeRow| ScopeEntry::from(&r);

        assert!(caller.covers(&entry(row(Some(vec![1]), Some(vec![10]), Some(vec![100]), None))));
        assert!(caller.covers(&entry(row(Some(vec![1]), Some(vec![10, 11]), None, None))));
        // all-null row would widen the grant to everything
        assert!(!caller.covers(&entry(row(None, None, None, None))));
        assert!(!caller.covers(&entry(row(Some(vec![2]), Some(vec![10]), None, None))));
        assert!(!caller.covers(&entry(row(Some(vec![1]), None, Some(vec![100]), None))));
        assert!(!caller.covers(&entry(row(Some(vec![1]), Some(vec![10, 12]), None, None))));

        assert!(ScopeSet::Unrestricted.covers(&entry(row(None, None, None, None))));
        assert!(!ScopeSet::deny_all().covers(&entry(row(Some(vec![1]), Some(vec![10]), None, None))));
    }

    #[test]
    fn predicate_and_matches_agree() {
        let scope = ScopeSet::resolve(
            &role(&["cluster_id"]),
            &[
                row(Some(vec![1]), Some(vec![10, 11]), None, Some(vec![1000])),
                row(None, None, Some(vec![200]), None),
            ],
        );
        let filter = scope.to_query_filter("o");
        for bu in [1, 2] {
            for div in [10, 11, 20] {
                for reg in [100, 110, 200] {
                    for cl in [1000, 1100, 2000] {
                        let p = probe(bu, div, reg, cl);
                        assert_eq!(scope.matches(&p), filter.evaluate(&p), "{p:?}");
                    }
                }
            }
        }
    }
}
