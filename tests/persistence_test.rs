#![cfg(feature = "storage-rocksdb")]

mod common;

use petpay::application::engine::PaymentEngine;
use petpay::domain::money::{Amount, Currency};
use petpay::domain::order::{OrderRequest, OrderStatus, Subject};
use petpay::domain::ports::{OrderStore, SubjectRegistry};
use petpay::domain::signature::SigningSecret;
use petpay::domain::subject::PetStatus;
use petpay::infrastructure::gateway::SandboxGateway;
use petpay::infrastructure::in_memory::InMemorySubjectRegistry;
use petpay::infrastructure::rocksdb::RocksDBStore;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::tempdir;

fn engine(store: &RocksDBStore, registry: Arc<InMemorySubjectRegistry>) -> PaymentEngine {
    PaymentEngine::new(
        Arc::new(store.clone()),
        registry,
        Arc::new(SandboxGateway::default()),
        SigningSecret::new(common::SECRET),
    )
}

#[tokio::test]
async fn test_queued_effect_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let seeded = common::seeded_registry().await;

    // 1. First run: capture while the registry cannot apply the adoption
    let order_id = {
        let store = RocksDBStore::open(&db_path).unwrap();
        let issued = engine(&store, seeded.clone())
            .create_order(OrderRequest {
                subject: Subject::Adoption {
                    pet_id: common::PET_ID,
                },
                amount: Amount::new(dec!(500)).unwrap(),
                currency: Currency::inr(),
                user_id: Some(42),
                donation: None,
            })
            .await
            .unwrap();

        let empty = Arc::new(InMemorySubjectRegistry::new());
        let signature = common::sign(&issued.id, "pay_1");
        let verified = engine(&store, empty)
            .verify(&issued.id, "pay_1", &signature)
            .await
            .unwrap();
        assert!(verified.success);
        assert_eq!(store.pending_effects().await.unwrap().len(), 1);
        issued.id
    };

    // 2. Second run: the capture and its queued effect are both still there
    let store = RocksDBStore::open(&db_path).unwrap();
    let order = store.get(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Captured);
    assert_eq!(order.payment_id.as_deref(), Some("pay_1"));

    let pending = store.pending_effects().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 1);

    let engine = engine(&store, seeded.clone());
    let report = engine.reconcile().await.unwrap();
    assert_eq!((report.dispatched, report.failed), (1, 0));
    assert_eq!(
        seeded.pet(common::PET_ID).await.unwrap().unwrap().status,
        PetStatus::Adopted
    );

    let again = engine.reconcile().await.unwrap();
    assert_eq!((again.dispatched, again.failed), (0, 0));
}
