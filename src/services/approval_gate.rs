// src/services/approval_gate.rs

use crate::common::error::AppError;
use crate::models::outlet::{Outlet, OutletHistory, OutletLevel};

/// Gating policy: which level changes wait for a human decision.
/// Only promotion to MEMBER does; everything else is resolved on the spot.
pub fn requires_approval(from: OutletLevel, to: OutletLevel) -> bool {
    matches!((from, to), (OutletLevel::Noo, OutletLevel::Member))
}

/// An outlet may have a single open request at a time. "Open" is whatever
/// [`OutletHistory::awaits_decision`] says about the latest row.
pub fn ensure_no_pending_request(outlet: &Outlet, latest: Option<&OutletHistory>) -> Result<(), AppError> {
    match latest {
        Some(h) if h.awaits_decision(outlet.level) => Err(AppError::ApprovalAlreadyPending(outlet.id)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outlet::{ApprovalStatus, OutletStatus};
    use chrono::Utc;

    #[test]
    fn only_member_promotion_is_gated() {
        use OutletLevel::*;
        assert!(requires_approval(Noo, Member));
        for (from, to) in [(Lead, Noo), (Lead, Member), (Noo, Lead), (Member, Noo), (Lead, Lead)] {
            assert!(!requires_approval(from, to), "{from} -> {to}");
        }
    }

    fn outlet(level: OutletLevel) -> Outlet {
        let now = Utc::now();
        Outlet {
            id: 9,
            name: "Toko Sinar".into(),
            code: None,
            address: None,
            level,
            status: OutletStatus::Maintain,
            limit: None,
            badan_usaha_id: 1,
            division_id: 10,
            region_id: None,
            cluster_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn history(from: Option<OutletLevel>, to: OutletLevel, status: ApprovalStatus) -> OutletHistory {
        OutletHistory {
            id: 1,
            outlet_id: 9,
            from_level: from,
            to_level: to,
            requested_by: Some(3),
            approved_by: None,
            approval_status: status,
            approval_notes: None,
            requested_at: Utc::now(),
            approved_at: None,
        }
    }

    #[test]
    fn pending_latest_row_blocks_new_requests() {
        let noo = outlet(OutletLevel::Noo);
        let mut h = history(Some(OutletLevel::Noo), OutletLevel::Member, ApprovalStatus::Pending);
        assert!(matches!(
            ensure_no_pending_request(&noo, Some(&h)),
            Err(AppError::ApprovalAlreadyPending(9))
        ));

        h.approval_status = ApprovalStatus::Rejected;
        assert!(ensure_no_pending_request(&noo, Some(&h)).is_ok());
        assert!(ensure_no_pending_request(&noo, None).is_ok());
    }

    #[test]
    fn undecided_noo_registration_counts_as_open() {
        let creation = history(None, OutletLevel::Noo, ApprovalStatus::NotRequired);
        assert!(matches!(
            ensure_no_pending_request(&outlet(OutletLevel::Noo), Some(&creation)),
            Err(AppError::ApprovalAlreadyPending(9))
        ));

        let lead_creation = history(None, OutletLevel::Lead, ApprovalStatus::NotRequired);
        assert!(ensure_no_pending_request(&outlet(OutletLevel::Lead), Some(&lead_creation)).is_ok());
    }
}
