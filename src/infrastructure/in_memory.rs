use crate::domain::order::{PaymentOrder, Subject};
use crate::domain::outbox::OutboxEntry;
use crate::domain::ports::{CaptureOutcome, FailOutcome, OrderStore, SubjectRegistry};
use crate::domain::subject::{DonationAttribution, Pet, PetStatus, Shelter};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct OrderState {
    orders: HashMap<String, PaymentOrder>,
    outbox: HashMap<String, OutboxEntry>,
}

/// A thread-safe in-memory store for payment orders and their outbox.
///
/// Orders and outbox share one lock, so a capture and its queued side
/// effect land together. Suited to tests and sandbox runs.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: PaymentOrder) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.contains_key(&order.order_id) {
            return Err(PaymentError::internal(format!(
                "order {} already exists",
                order.order_id
            )));
        }
        state.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    async fn get(&self, order_id: &str) -> Result<Option<PaymentOrder>> {
        let state = self.state.read().await;
        Ok(state.orders.get(order_id).cloned())
    }

    async fn find_by_subject(&self, subject: Subject) -> Result<Vec<PaymentOrder>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.subject == subject)
            .cloned()
            .collect())
    }

    async fn capture(
        &self,
        order_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| PaymentError::OrderNotFound(order_id.to_string()))?;

        let outcome = CaptureOutcome::decide(order, payment_id, now);
        if let CaptureOutcome::Captured(order, entry) = &outcome {
            state.orders.insert(order.order_id.clone(), order.clone());
            state.outbox.insert(entry.order_id.clone(), entry.clone());
        }
        Ok(outcome)
    }

    async fn fail(
        &self,
        order_id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<FailOutcome> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| PaymentError::OrderNotFound(order_id.to_string()))?;

        let outcome = FailOutcome::decide(order, reason, now);
        if let FailOutcome::Failed(order) = &outcome {
            state.orders.insert(order.order_id.clone(), order.clone());
        }
        Ok(outcome)
    }

    async fn pending_effects(&self) -> Result<Vec<OutboxEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<OutboxEntry> = state.outbox.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.enqueued_at
                .cmp(&b.enqueued_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(entries)
    }

    async fn pending_effect(&self, order_id: &str) -> Result<Option<OutboxEntry>> {
        let state = self.state.read().await;
        Ok(state.outbox.get(order_id).cloned())
    }

    async fn complete_effect(&self, order_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.outbox.remove(order_id);
        Ok(())
    }

    async fn record_effect_failure(&self, order_id: &str, error: String) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(entry) = state.outbox.get_mut(order_id) {
            entry.record_failure(error);
        }
        Ok(())
    }
}

#[derive(Default)]
struct RegistryState {
    pets: HashMap<u32, Pet>,
    shelters: HashMap<u32, Shelter>,
    donations: HashMap<String, DonationAttribution>,
}

/// In-memory pets, shelters and donation ledger.
#[derive(Default, Clone)]
pub struct InMemorySubjectRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemorySubjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubjectRegistry for InMemorySubjectRegistry {
    async fn exists(&self, subject: Subject) -> Result<bool> {
        let state = self.state.read().await;
        Ok(match subject {
            Subject::Adoption { pet_id } => state.pets.contains_key(&pet_id),
            Subject::Donation { shelter_id } => state.shelters.contains_key(&shelter_id),
        })
    }

    async fn mark_adopted(&self, pet_id: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let pet = state
            .pets
            .get_mut(&pet_id)
            .ok_or_else(|| PaymentError::internal(format!("pet {pet_id} not found")))?;
        pet.status = PetStatus::Adopted;
        Ok(())
    }

    async fn attribute_donation(&self, donation: DonationAttribution) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.shelters.contains_key(&donation.shelter_id) {
            return Err(PaymentError::internal(format!(
                "shelter {} not found",
                donation.shelter_id
            )));
        }
        state
            .donations
            .entry(donation.order_id.clone())
            .or_insert(donation);
        Ok(())
    }

    async fn pet(&self, pet_id: u32) -> Result<Option<Pet>> {
        let state = self.state.read().await;
        Ok(state.pets.get(&pet_id).cloned())
    }

    async fn donations(&self, shelter_id: u32) -> Result<Vec<DonationAttribution>> {
        let state = self.state.read().await;
        Ok(state
            .donations
            .values()
            .filter(|d| d.shelter_id == shelter_id)
            .cloned()
            .collect())
    }

    async fn add_pet(&self, pet: Pet) -> Result<()> {
        let mut state = self.state.write().await;
        state.pets.insert(pet.id, pet);
        Ok(())
    }

    async fn add_shelter(&self, shelter: Shelter) -> Result<()> {
        let mut state = self.state.write().await;
        state.shelters.insert(shelter.id, shelter);
        Ok(())
    }
}
