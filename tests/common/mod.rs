#![allow(dead_code)]

use petpay::application::engine::PaymentEngine;
use petpay::domain::money::Currency;
use petpay::domain::ports::{
    GatewayOrder, GatewayOrderRequest, PaymentGateway, SharedPaymentGateway, SubjectRegistry,
};
use petpay::domain::signature::SigningSecret;
use petpay::domain::subject::{Pet, Shelter};
use petpay::error::{PaymentError, Result};
use petpay::infrastructure::gateway::SandboxGateway;
use petpay::infrastructure::in_memory::{InMemoryOrderStore, InMemorySubjectRegistry};
use petpay::interfaces::http::AppState;
use std::sync::Arc;

pub const SECRET: &str = "integration_secret";
pub const PET_ID: u32 = 7;
pub const SHELTER_ID: u32 = 3;

pub async fn seeded_registry() -> Arc<InMemorySubjectRegistry> {
    let registry = Arc::new(InMemorySubjectRegistry::new());
    registry
        .add_pet(Pet {
            id: PET_ID,
            name: "Biscuit".into(),
            status: Default::default(),
        })
        .await
        .unwrap();
    registry
        .add_shelter(Shelter {
            id: SHELTER_ID,
            name: "Paws".into(),
        })
        .await
        .unwrap();
    registry
}

/// Provider that refuses every connection.
pub struct UnavailableGateway;

#[async_trait::async_trait]
impl PaymentGateway for UnavailableGateway {
    async fn create_order(&self, _request: &GatewayOrderRequest) -> Result<GatewayOrder> {
        Err(PaymentError::ProviderUnavailable("connection refused".into()))
    }

    fn key_id(&self) -> &str {
        "rzp_test_down"
    }
}

pub async fn engine_with(
    gateway: SharedPaymentGateway,
) -> (PaymentEngine, Arc<InMemorySubjectRegistry>) {
    let registry = seeded_registry().await;
    let engine = PaymentEngine::new(
        Arc::new(InMemoryOrderStore::new()),
        registry.clone(),
        gateway,
        SigningSecret::new(SECRET),
    );
    (engine, registry)
}

pub async fn engine() -> (PaymentEngine, Arc<InMemorySubjectRegistry>) {
    engine_with(Arc::new(SandboxGateway::default())).await
}

pub async fn app_state() -> (AppState, Arc<InMemorySubjectRegistry>) {
    app_state_with(Arc::new(SandboxGateway::default())).await
}

pub async fn app_state_with(
    gateway: SharedPaymentGateway,
) -> (AppState, Arc<InMemorySubjectRegistry>) {
    let (engine, registry) = engine_with(gateway).await;
    (
        AppState {
            engine,
            currency: Currency::inr(),
        },
        registry,
    )
}

pub fn sign(order_id: &str, payment_id: &str) -> String {
    SigningSecret::new(SECRET).sign(order_id, payment_id)
}
