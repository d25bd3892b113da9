use super::engine::PaymentEngine;
use super::queries::OrderView;
use crate::domain::order::{PaymentOrder, SubjectType};
use crate::domain::outbox::OutboxEntry;
use crate::domain::ports::{CaptureOutcome, FailOutcome};
use crate::domain::subject::SideEffect;
use crate::error::{PaymentError, Result};
use chrono::Utc;
use serde::Serialize;

/// Result of a verified provider callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub success: bool,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub record: OrderView,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub dispatched: usize,
    pub failed: usize,
}

impl PaymentEngine {
    /// Verifies a provider callback and captures the order it names.
    ///
    /// The signature is checked before anything is read. A repeated
    /// callback for an order already captured with the same payment is a
    /// success that changes nothing, except that a side effect still queued
    /// from an earlier failed dispatch is tried again.
    #[tracing::instrument(name = "verify_payment", skip(self, signature))]
    pub async fn verify(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<Verification> {
        if let Err(e) = self.secret.verify(order_id, payment_id, signature) {
            tracing::warn!("Rejected payment callback with invalid signature");
            return Err(e);
        }

        let outcome = match self.store.capture(order_id, payment_id, Utc::now()).await {
            Ok(outcome) => outcome,
            Err(e @ PaymentError::OrderNotFound(_)) => {
                tracing::warn!("Signed callback for unknown order");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        match outcome {
            CaptureOutcome::Captured(order, entry) => {
                tracing::info!(subject = %order.subject, "Captured payment order");
                self.dispatch(&entry).await;
                Ok(Verification::of(&order))
            }
            CaptureOutcome::AlreadyCaptured(order) => {
                tracing::info!("Ignoring repeated callback for captured order");
                if let Some(entry) = self.store.pending_effect(order_id).await? {
                    self.dispatch(&entry).await;
                }
                Ok(Verification::of(&order))
            }
            CaptureOutcome::Rejected(order, reason) => {
                tracing::error!(
                    status = ?order.status,
                    recorded_payment = ?order.payment_id,
                    reason = %reason,
                    "Signed capture conflicts with order state; needs manual reconciliation"
                );
                Err(PaymentError::CaptureConflict {
                    order_id: order.order_id,
                    reason,
                })
            }
        }
    }

    /// Records a checkout the client reports as failed.
    #[tracing::instrument(name = "report_failure", skip(self))]
    pub async fn report_failure(
        &self,
        order_id: &str,
        reason: Option<String>,
    ) -> Result<OrderView> {
        match self.store.fail(order_id, reason, Utc::now()).await? {
            FailOutcome::Failed(order) => {
                tracing::info!("Marked payment order failed");
                Ok(OrderView::from(&order))
            }
            FailOutcome::AlreadyFailed(order) => Ok(OrderView::from(&order)),
            FailOutcome::Rejected(order) => Err(PaymentError::CaptureConflict {
                order_id: order.order_id,
                reason: "order is already captured".to_string(),
            }),
        }
    }

    /// Replays every queued side effect, oldest first.
    ///
    /// Entries that fail again stay queued with their attempt count raised.
    #[tracing::instrument(name = "reconcile", skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        for entry in self.store.pending_effects().await? {
            if self.dispatch(&entry).await {
                report.dispatched += 1;
            } else {
                report.failed += 1;
            }
        }
        if report.dispatched + report.failed > 0 {
            tracing::info!(
                dispatched = report.dispatched,
                failed = report.failed,
                "Reconciled outbox"
            );
        }
        Ok(report)
    }

    /// Applies one queued side effect and clears it. Faults are logged and
    /// leave the entry queued; they never fail the caller.
    async fn dispatch(&self, entry: &OutboxEntry) -> bool {
        let applied = match &entry.effect {
            SideEffect::MarkAdopted { pet_id } => self.registry.mark_adopted(*pet_id).await,
            SideEffect::AttributeDonation(donation) => {
                self.registry.attribute_donation(donation.clone()).await
            }
        };

        if let Err(e) = applied {
            tracing::error!(
                order_id = %entry.order_id,
                attempts = entry.attempts + 1,
                error = %e,
                "Captured order's side effect failed; left in outbox for reconciliation"
            );
            if let Err(e) = self
                .store
                .record_effect_failure(&entry.order_id, e.to_string())
                .await
            {
                tracing::error!(
                    order_id = %entry.order_id,
                    error = %e,
                    "Could not record outbox failure"
                );
            }
            return false;
        }

        if let Err(e) = self.store.complete_effect(&entry.order_id).await {
            // Applied but still queued; replays are idempotent.
            tracing::warn!(order_id = %entry.order_id, error = %e, "Could not clear outbox entry");
        }
        true
    }
}

impl Verification {
    fn of(order: &PaymentOrder) -> Self {
        Self {
            success: true,
            subject_type: order.subject.subject_type(),
            record: OrderView::from(order),
        }
    }
}
