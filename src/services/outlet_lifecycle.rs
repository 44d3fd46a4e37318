// src/services/outlet_lifecycle.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::common::error::AppError;
use crate::models::outlet::{
    ApprovalDecision, ApprovalStatus, NewOutletHistory, Outlet, OutletHistory, OutletLevel,
};
use crate::services::approval_gate;

/// What a lifecycle step does to the outlet row.
#[derive(Debug, Clone, PartialEq)]
pub enum OutletChange {
    Unchanged,
    Level(OutletLevel),
    /// Approval: level MEMBER with the approver's code and credit limit;
    /// status back to MAINTAIN.
    Promote { code: String, limit: Decimal },
    /// Rejection: level kept, status UNPRODUCTIVE.
    MarkUnproductive,
}

/// Outlet mutation plus the history row to append, computed from a locked
/// snapshot of the outlet and its latest history row.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecyclePlan {
    pub change: OutletChange,
    pub history: NewOutletHistory,
    /// Set for approve/reject: who gets told about the decision.
    pub notify: Option<(ApprovalDecision, Option<i64>)>,
}

/// LEAD -> NOO and NOO -> MEMBER are the only forward steps.
pub fn is_legal_transition(from: OutletLevel, to: OutletLevel) -> bool {
    matches!(
        (from, to),
        (OutletLevel::Lead, OutletLevel::Noo) | (OutletLevel::Noo, OutletLevel::Member)
    )
}

/// History row written together with a new outlet.
pub fn plan_creation(outlet: &Outlet, created_by: i64, now: DateTime<Utc>) -> NewOutletHistory {
    NewOutletHistory {
        outlet_id: outlet.id,
        from_level: None,
        to_level: outlet.level,
        requested_by: Some(created_by),
        approved_by: None,
        approval_status: ApprovalStatus::NotRequired,
        approval_notes: None,
        requested_at: now,
        approved_at: None,
    }
}

pub fn plan_transition(
    outlet: &Outlet,
    latest: Option<&OutletHistory>,
    to: OutletLevel,
    requested_by: i64,
    now: DateTime<Utc>,
) -> Result<LifecyclePlan, AppError> {
    let from = outlet.level;
    if !is_legal_transition(from, to) {
        return Err(AppError::InvalidTransition { from, to });
    }
    approval_gate::ensure_no_pending_request(outlet, latest)?;

    let plan = if approval_gate::requires_approval(from, to) {
        LifecyclePlan {
            change: OutletChange::Unchanged,
            history: NewOutletHistory {
                outlet_id: outlet.id,
                from_level: Some(from),
                to_level: to,
                requested_by: Some(requested_by),
                approved_by: None,
                approval_status: ApprovalStatus::Pending,
                approval_notes: None,
                requested_at: now,
                approved_at: None,
            },
            notify: None,
        }
    } else {
        LifecyclePlan {
            change: OutletChange::Level(to),
            history: NewOutletHistory {
                outlet_id: outlet.id,
                from_level: Some(from),
                to_level: to,
                requested_by: Some(requested_by),
                approved_by: Some(requested_by),
                approval_status: ApprovalStatus::AutoApproved,
                approval_notes: None,
                requested_at: now,
                approved_at: Some(now),
            },
            notify: None,
        }
    };
    Ok(plan)
}

pub fn plan_approval(
    outlet: &Outlet,
    latest: Option<&OutletHistory>,
    history_id: i64,
    approver_id: i64,
    code: String,
    limit: Decimal,
    now: DateTime<Utc>,
) -> Result<LifecyclePlan, AppError> {
    let open = open_request(outlet, latest, history_id)?;
    let requested_by = open.requested_by.or(Some(approver_id));

    Ok(LifecyclePlan {
        change: OutletChange::Promote { code, limit },
        history: NewOutletHistory {
            outlet_id: outlet.id,
            from_level: Some(outlet.level),
            to_level: OutletLevel::Member,
            requested_by,
            approved_by: Some(approver_id),
            approval_status: ApprovalStatus::Approved,
            approval_notes: None,
            requested_at: open.requested_at,
            approved_at: Some(now),
        },
        notify: Some((ApprovalDecision::Approved, requested_by)),
    })
}

pub fn plan_rejection(
    outlet: &Outlet,
    latest: Option<&OutletHistory>,
    history_id: i64,
    approver_id: i64,
    reason: String,
    now: DateTime<Utc>,
) -> Result<LifecyclePlan, AppError> {
    let open = open_request(outlet, latest, history_id)?;
    let requested_by = open.requested_by.or(Some(approver_id));

    Ok(LifecyclePlan {
        change: OutletChange::MarkUnproductive,
        history: NewOutletHistory {
            outlet_id: outlet.id,
            from_level: Some(outlet.level),
            to_level: outlet.level,
            requested_by,
            approved_by: Some(approver_id),
            approval_status: ApprovalStatus::Rejected,
            approval_notes: Some(reason),
            requested_at: open.requested_at,
            approved_at: Some(now),
        },
        notify: Some((ApprovalDecision::Rejected, requested_by)),
    })
}

/// The row an approve/reject targets must be the outlet's latest row, still
/// awaiting a decision, on an outlet sitting at NOO.
fn open_request<'a>(
    outlet: &Outlet,
    latest: Option<&'a OutletHistory>,
    history_id: i64,
) -> Result<&'a OutletHistory, AppError> {
    if outlet.level != OutletLevel::Noo {
        return Err(AppError::InvalidApprovalState { outlet_id: outlet.id, level: outlet.level });
    }
    match latest {
        Some(h) if h.id == history_id && h.awaits_decision(outlet.level) => Ok(h),
        _ => Err(AppError::NoOpenApprovalRequest(history_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outlet::OutletStatus;

    /// Plays plans against an outlet and its history the way the repository
    /// does inside the locked transaction.
    struct Ledger {
        outlet: Outlet,
        rows: Vec<OutletHistory>,
    }

    impl Ledger {
        fn create(level: OutletLevel, created_by: i64) -> Self {
            let now = Utc::now();
            let outlet = Outlet {
                id: 42,
                name: "Toko Berkah".into(),
                code: None,
                address: None,
                level,
                status: OutletStatus::Maintain,
                limit: None,
                badan_usaha_id: 1,
                division_id: 10,
                region_id: Some(100),
                cluster_id: Some(1000),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            let mut ledger = Self { outlet, rows: vec![] };
            let first = plan_creation(&ledger.outlet, created_by, now);
            ledger.append(first);
            ledger
        }

        /// LEAD created by `by`, then moved to NOO through the auto-approved step.
        fn at_noo(by: i64) -> Self {
            let mut ledger = Self::create(OutletLevel::Lead, by);
            ledger.request(OutletLevel::Noo, by).unwrap();
            ledger
        }

        fn latest(&self) -> Option<&OutletHistory> {
            self.rows.last()
        }

        fn append(&mut self, new: NewOutletHistory) -> OutletHistory {
            let row = OutletHistory {
                id: self.rows.len() as i64 + 1,
                outlet_id: new.outlet_id,
                from_level: new.from_level,
                to_level: new.to_level,
                requested_by: new.requested_by,
                approved_by: new.approved_by,
                approval_status: new.approval_status,
                approval_notes: new.approval_notes,
                requested_at: new.requested_at,
                approved_at: new.approved_at,
            };
            self.rows.push(row.clone());
            row
        }

        fn apply(&mut self, plan: LifecyclePlan) -> OutletHistory {
            match plan.change {
                OutletChange::Unchanged => {}
                OutletChange::Level(level) => self.outlet.level = level,
                OutletChange::Promote { code, limit } => {
                    self.outlet.level = OutletLevel::Member;
                    self.outlet.status = OutletStatus::Maintain;
                    self.outlet.code = Some(code);
                    self.outlet.limit = Some(limit);
                }
                OutletChange::MarkUnproductive => self.outlet.status = OutletStatus::Unproductive,
            }
            self.append(plan.history)
        }

        fn request(&mut self, to: OutletLevel, by: i64) -> Result<OutletHistory, AppError> {
            let plan = plan_transition(&self.outlet, self.latest(), to, by, Utc::now())?;
            Ok(self.apply(plan))
        }

        fn approve(&mut self, history_id: i64, by: i64, code: &str, limit: i64) -> Result<OutletHistory, AppError> {
            let plan = plan_approval(
                &self.outlet,
                self.latest(),
                history_id,
                by,
                code.to_string(),
                Decimal::from(limit),
                Utc::now(),
            )?;
            Ok(self.apply(plan))
        }

        fn reject(&mut self, history_id: i64, by: i64, reason: &str) -> Result<OutletHistory, AppError> {
            let plan = plan_rejection(&self.outlet, self.latest(), history_id, by, reason.to_string(), Utc::now())?;
            Ok(self.apply(plan))
        }
    }

    #[test]
    fn creation_writes_one_row_without_from_level() {
        let ledger = Ledger::create(OutletLevel::Lead, 3);
        assert_eq!(ledger.rows.len(), 1);
        let row = &ledger.rows[0];
        assert_eq!(row.from_level, None);
        assert_eq!(row.to_level, OutletLevel::Lead);
        assert_eq!(row.approval_status, ApprovalStatus::NotRequired);
        assert_eq!(row.requested_by, Some(3));
    }

    #[test]
    fn lead_to_noo_is_auto_approved() {
        let mut ledger = Ledger::create(OutletLevel::Lead, 3);
        let row = ledger.request(OutletLevel::Noo, 3).unwrap();
        assert_eq!(ledger.outlet.level, OutletLevel::Noo);
        assert_eq!(row.approval_status, ApprovalStatus::AutoApproved);
        assert_ne!(row.approval_status, ApprovalStatus::Pending);
        assert_eq!(row.approved_by, Some(3));
        assert!(row.approved_at.is_some());
    }

    #[test]
    fn noo_to_member_waits_then_approve_promotes() {
        let mut ledger = Ledger::create(OutletLevel::Lead, 3);
        ledger.request(OutletLevel::Noo, 3).unwrap();

        let pending = ledger.request(OutletLevel::Member, 3).unwrap();
        assert_eq!(pending.approval_status, ApprovalStatus::Pending);
        assert_eq!(pending.approved_by, None);
        assert_eq!(ledger.outlet.level, OutletLevel::Noo);

        let approved = ledger.approve(pending.id, 8, "X1", 500_000).unwrap();
        assert_eq!(ledger.outlet.level, OutletLevel::Member);
        assert_eq!(ledger.outlet.code.as_deref(), Some("X1"));
        assert_eq!(ledger.outlet.limit, Some(Decimal::from(500_000)));
        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert_eq!(approved.from_level, Some(OutletLevel::Noo));
        assert_eq!(approved.to_level, OutletLevel::Member);
        assert_eq!(approved.approved_by, Some(8));
        assert_eq!(approved.requested_by, Some(3));
        // the pending row itself is untouched
        assert_eq!(ledger.rows[pending.id as usize - 1].approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn reject_keeps_level_and_marks_unproductive() {
        let mut ledger = Ledger::at_noo(3);
        let pending = ledger.request(OutletLevel::Member, 3).unwrap();

        let rejected = ledger.reject(pending.id, 8, "alamat tidak valid").unwrap();
        assert_eq!(ledger.outlet.level, OutletLevel::Noo);
        assert_eq!(ledger.outlet.status, OutletStatus::Unproductive);
        assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
        assert_eq!(rejected.from_level, Some(OutletLevel::Noo));
        assert_eq!(rejected.to_level, OutletLevel::Noo);
        assert_eq!(rejected.approval_notes.as_deref(), Some("alamat tidak valid"));

        // a fresh request is possible after the rejection
        assert!(ledger.request(OutletLevel::Member, 3).is_ok());
    }

    #[test]
    fn second_approve_on_same_request_fails() {
        let mut ledger = Ledger::at_noo(3);
        let pending = ledger.request(OutletLevel::Member, 3).unwrap();
        ledger.approve(pending.id, 8, "X1", 500_000).unwrap();
        let rows_before = ledger.rows.len();

        let err = ledger.approve(pending.id, 9, "X2", 1).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidApprovalState { .. } | AppError::NoOpenApprovalRequest(_)
        ));
        assert_eq!(ledger.rows.len(), rows_before);
        assert_eq!(ledger.outlet.code.as_deref(), Some("X1"));
        assert_eq!(
            ledger.rows.iter().filter(|r| r.approval_status == ApprovalStatus::Approved).count(),
            1
        );
    }

    #[test]
    fn reject_after_approve_fails_without_mutation() {
        let mut ledger = Ledger::at_noo(3);
        let pending = ledger.request(OutletLevel::Member, 3).unwrap();
        ledger.approve(pending.id, 8, "X1", 10).unwrap();
        let before = ledger.outlet.clone();

        assert!(ledger.reject(pending.id, 8, "late").is_err());
        assert_eq!(ledger.outlet, before);
    }

    #[test]
    fn pending_request_blocks_another() {
        let mut ledger = Ledger::at_noo(3);
        ledger.request(OutletLevel::Member, 3).unwrap();
        let err = ledger.request(OutletLevel::Member, 4).unwrap_err();
        assert!(matches!(err, AppError::ApprovalAlreadyPending(42)));
    }

    #[test]
    fn illegal_transitions_are_refused() {
        let mut lead = Ledger::create(OutletLevel::Lead, 3);
        assert!(matches!(
            lead.request(OutletLevel::Member, 3),
            Err(AppError::InvalidTransition { from: OutletLevel::Lead, to: OutletLevel::Member })
        ));
        assert!(lead.request(OutletLevel::Lead, 3).is_err());

        let mut member = Ledger::create(OutletLevel::Member, 3);
        assert!(member.request(OutletLevel::Noo, 3).is_err());
        assert_eq!(member.rows.len(), 1);
    }

    #[test]
    fn approve_requires_noo_outlet() {
        let mut ledger = Ledger::create(OutletLevel::Lead, 3);
        let err = ledger.approve(1, 8, "X1", 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidApprovalState { level: OutletLevel::Lead, .. }));
    }

    #[test]
    fn approve_needs_the_latest_open_row() {
        let mut ledger = Ledger::create(OutletLevel::Lead, 3);
        ledger.request(OutletLevel::Noo, 3).unwrap();
        // latest row is AUTO_APPROVED, nothing to decide
        let err = ledger.approve(2, 8, "X1", 1).unwrap_err();
        assert!(matches!(err, AppError::NoOpenApprovalRequest(2)));

        let pending = ledger.request(OutletLevel::Member, 3).unwrap();
        let err = ledger.approve(pending.id - 1, 8, "X1", 1).unwrap_err();
        assert!(matches!(err, AppError::NoOpenApprovalRequest(_)));
    }

    #[test]
    fn outlet_registered_as_noo_can_be_approved_directly() {
        let mut ledger = Ledger::create(OutletLevel::Noo, 5);
        let approved = ledger.approve(1, 8, "SBY-01", 250_000).unwrap();
        assert_eq!(ledger.outlet.level, OutletLevel::Member);
        assert_eq!(approved.requested_by, Some(5));
    }

    #[test]
    fn decisions_carry_notification_target() {
        let ledger = Ledger::create(OutletLevel::Noo, 5);
        let plan = plan_rejection(&ledger.outlet, ledger.latest(), 1, 8, "duplikat".into(), Utc::now()).unwrap();
        assert_eq!(plan.notify, Some((ApprovalDecision::Rejected, Some(5))));

        let ledger = Ledger::at_noo(5);
        let plan = plan_transition(&ledger.outlet, ledger.latest(), OutletLevel::Member, 5, Utc::now()).unwrap();
        assert_eq!(plan.notify, None);
    }

    #[test]
    fn noo_registration_is_already_the_open_request() {
        let mut ledger = Ledger::create(OutletLevel::Noo, 5);
        let err = ledger.request(OutletLevel::Member, 5).unwrap_err();
        assert!(matches!(err, AppError::ApprovalAlreadyPending(42)));
        assert_eq!(ledger.rows.len(), 1);

        let open: Vec<_> = ledger.rows.iter().filter(|r| r.awaits_decision(ledger.outlet.level)).collect();
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn rejected_noo_registration_can_be_requested_again() {
        let mut ledger = Ledger::create(OutletLevel::Noo, 5);
        ledger.reject(1, 8, "foto buram").unwrap();
        let pending = ledger.request(OutletLevel::Member, 5).unwrap();
        assert_eq!(pending.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn approval_after_rejection_restores_maintain_status() {
        let mut ledger = Ledger::at_noo(3);
        let first = ledger.request(OutletLevel::Member, 3).unwrap();
        ledger.reject(first.id, 8, "data kurang").unwrap();
        assert_eq!(ledger.outlet.status, OutletStatus::Unproductive);

        let second = ledger.request(OutletLevel::Member, 3).unwrap();
        ledger.approve(second.id, 8, "X9", 100).unwrap();
        assert_eq!(ledger.outlet.level, OutletLevel::Member);
        assert_eq!(ledger.outlet.status, OutletStatus::Maintain);
    }
}
