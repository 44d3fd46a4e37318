// src/services/notification.rs

use async_trait::async_trait;

use crate::models::outlet::{ApprovalDecision, Outlet};

/// Delivery of approval decisions (push, WhatsApp, ...). Retries and
/// channels belong to the implementation; the outlet service only hands
/// over what happened and to whom.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        outlet: &Outlet,
        decision: ApprovalDecision,
        recipient: i64,
    ) -> anyhow::Result<()>;
}

/// Default dispatcher: records the decision in the application log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        outlet: &Outlet,
        decision: ApprovalDecision,
        recipient: i64,
    ) -> anyhow::Result<()> {
        tracing::info!(
            outlet_id = outlet.id,
            outlet_code = outlet.code.as_deref().unwrap_or("-"),
            ?decision,
            recipient,
            "📨 outlet approval decision dispatched"
        );
        Ok(())
    }
}
