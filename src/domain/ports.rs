use super::money::Currency;
use super::order::{CaptureDecision, FailDecision, PaymentOrder, Subject};
use super::outbox::OutboxEntry;
use super::subject::{DonationAttribution, Pet, Shelter, SideEffect};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Persistence for payment orders and their capture outbox.
///
/// `capture` and `fail` are the only mutations of an existing order; each
/// must read, decide and write one record without interleaving with another
/// mutation of the same record.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order. Fails if the order id is already taken.
    async fn insert(&self, order: PaymentOrder) -> Result<()>;
    async fn get(&self, order_id: &str) -> Result<Option<PaymentOrder>>;
    async fn find_by_subject(&self, subject: Subject) -> Result<Vec<PaymentOrder>>;
    /// Captures the order and enqueues its side effect in one write.
    async fn capture(
        &self,
        order_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome>;
    async fn fail(
        &self,
        order_id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<FailOutcome>;
    /// Queued side effects, oldest first.
    async fn pending_effects(&self) -> Result<Vec<OutboxEntry>>;
    async fn pending_effect(&self, order_id: &str) -> Result<Option<OutboxEntry>>;
    async fn complete_effect(&self, order_id: &str) -> Result<()>;
    async fn record_effect_failure(&self, order_id: &str, error: String) -> Result<()>;
}

/// The pets and shelters side of the marketplace, owned elsewhere.
#[async_trait]
pub trait SubjectRegistry: Send + Sync {
    async fn exists(&self, subject: Subject) -> Result<bool>;
    /// Idempotent: marking an adopted pet again changes nothing.
    async fn mark_adopted(&self, pet_id: u32) -> Result<()>;
    /// Append-only, keyed by order id: a second attribution of the same order is ignored.
    async fn attribute_donation(&self, donation: DonationAttribution) -> Result<()>;
    async fn pet(&self, pet_id: u32) -> Result<Option<Pet>>;
    async fn donations(&self, shelter_id: u32) -> Result<Vec<DonationAttribution>>;
    async fn add_pet(&self, pet: Pet) -> Result<()>;
    async fn add_shelter(&self, shelter: Shelter) -> Result<()>;
}

/// What we ask the provider to open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayOrderRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: Currency,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// The provider's confirmation of an opened order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: Currency,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder>;
    /// Public key id handed to the client-side checkout widget.
    fn key_id(&self) -> &str;
}

pub type SharedOrderStore = Arc<dyn OrderStore>;
pub type SharedSubjectRegistry = Arc<dyn SubjectRegistry>;
pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

#[derive(Debug, PartialEq)]
pub enum CaptureOutcome {
    /// The order moved to captured; the entry is now queued.
    Captured(PaymentOrder, OutboxEntry),
    /// Same payment seen before; nothing was written.
    AlreadyCaptured(PaymentOrder),
    /// The order cannot take this capture; nothing was written.
    Rejected(PaymentOrder, String),
}

impl CaptureOutcome {
    /// Applies a capture to a loaded record. Stores call this while holding
    /// whatever guard makes their read-modify-write atomic.
    pub fn decide(mut order: PaymentOrder, payment_id: &str, now: DateTime<Utc>) -> Self {
        match order.capture(payment_id, now) {
            CaptureDecision::Apply => {
                let entry =
                    OutboxEntry::new(order.order_id.clone(), SideEffect::for_order(&order), now);
                CaptureOutcome::Captured(order, entry)
            }
            CaptureDecision::Duplicate => CaptureOutcome::AlreadyCaptured(order),
            CaptureDecision::Reject(reason) => CaptureOutcome::Rejected(order, reason),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum FailOutcome {
    Failed(PaymentOrder),
    AlreadyFailed(PaymentOrder),
    Rejected(PaymentOrder),
}

impl FailOutcome {
    pub fn decide(mut order: PaymentOrder, reason: Option<String>, now: DateTime<Utc>) -> Self {
        match order.fail(reason, now) {
            FailDecision::Apply => FailOutcome::Failed(order),
            FailDecision::Duplicate => FailOutcome::AlreadyFailed(order),
            FailDecision::Reject => FailOutcome::Rejected(order),
        }
    }
}
