use crate::domain::order::{PaymentOrder, Subject};
use crate::domain::outbox::OutboxEntry;
use crate::domain::ports::{CaptureOutcome, FailOutcome, OrderStore, SubjectRegistry};
use crate::domain::subject::{DonationAttribution, Pet, PetStatus, Shelter};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for payment orders, keyed by provider order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family for queued capture side effects, keyed by order id.
pub const CF_OUTBOX: &str = "outbox";
pub const CF_PETS: &str = "pets";
pub const CF_SHELTERS: &str = "shelters";
/// Column Family for donation attributions, keyed by order id.
pub const CF_DONATIONS: &str = "donations";
/// Column Family for store bookkeeping such as the schema version.
pub const CF_META: &str = "meta";

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
/// Layout version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

const COLUMN_FAMILIES: [&str; 6] = [
    CF_ORDERS,
    CF_OUTBOX,
    CF_PETS,
    CF_SHELTERS,
    CF_DONATIONS,
    CF_META,
];

/// A persistent store implementation using RocksDB.
///
/// Serves as both the order store and the subject registry, each entity in
/// its own Column Family. Captures write the order and its outbox entry in
/// a single `WriteBatch`, and a mutation lock serializes read-modify-write
/// cycles on orders.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    mutations: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path and runs
    /// [`RocksDBStore::migrate`] before returning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        let store = Self {
            db: Arc::new(db),
            mutations: Arc::new(Mutex::new(())),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Brings the on-disk layout up to [`SCHEMA_VERSION`].
    ///
    /// A fresh database is stamped with the current version. A database
    /// written by a newer build is refused rather than guessed at.
    pub fn migrate(&self) -> Result<u32> {
        let meta = self.cf(CF_META)?;
        let found = match self.db.get_cf(meta, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    PaymentError::internal("schema version record is corrupt")
                })?;
                Some(u32::from_be_bytes(raw))
            }
            None => None,
        };

        match found {
            Some(version) if version > SCHEMA_VERSION => Err(PaymentError::internal(format!(
                "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
            ))),
            Some(version) if version == SCHEMA_VERSION => Ok(version),
            _ => {
                self.db
                    .put_cf(meta, SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_be_bytes())?;
                tracing::info!(version = SCHEMA_VERSION, "Applied storage schema");
                Ok(SCHEMA_VERSION)
            }
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::internal(format!("{name} column family not found")))
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn load_order(&self, order_id: &str) -> Result<PaymentOrder> {
        self.get_json(CF_ORDERS, order_id.as_bytes())?
            .ok_or_else(|| PaymentError::OrderNotFound(order_id.to_string()))
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn insert(&self, order: PaymentOrder) -> Result<()> {
        let _guard = self.mutations.lock().await;
        let cf = self.cf(CF_ORDERS)?;
        if self.db.get_pinned_cf(cf, order.order_id.as_bytes())?.is_some() {
            return Err(PaymentError::internal(format!(
                "order {} already exists",
                order.order_id
            )));
        }
        self.put_json(CF_ORDERS, order.order_id.as_bytes(), &order)
    }

    async fn get(&self, order_id: &str) -> Result<Option<PaymentOrder>> {
        self.get_json(CF_ORDERS, order_id.as_bytes())
    }

    async fn find_by_subject(&self, subject: Subject) -> Result<Vec<PaymentOrder>> {
        let orders: Vec<PaymentOrder> = self.scan_json(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|order| order.subject == subject)
            .collect())
    }

    async fn capture(
        &self,
        order_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome> {
        let _guard = self.mutations.lock().await;
        let order = self.load_order(order_id)?;

        let outcome = CaptureOutcome::decide(order, payment_id, now);
        if let CaptureOutcome::Captured(order, entry) = &outcome {
            let mut batch = WriteBatch::default();
            batch.put_cf(
                self.cf(CF_ORDERS)?,
                order.order_id.as_bytes(),
                serde_json::to_vec(order)?,
            );
            batch.put_cf(
                self.cf(CF_OUTBOX)?,
                entry.order_id.as_bytes(),
                serde_json::to_vec(entry)?,
            );
            self.db.write(batch)?;
        }
        Ok(outcome)
    }

    async fn fail(
        &self,
        order_id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<FailOutcome> {
        let _guard = self.mutations.lock().await;
        let order = self.load_order(order_id)?;

        let outcome = FailOutcome::decide(order, reason, now);
        if let FailOutcome::Failed(order) = &outcome {
            self.put_json(CF_ORDERS, order.order_id.as_bytes(), order)?;
        }
        Ok(outcome)
    }

    async fn pending_effects(&self) -> Result<Vec<OutboxEntry>> {
        let mut entries: Vec<OutboxEntry> = self.scan_json(CF_OUTBOX)?;
        entries.sort_by(|a, b| {
            a.enqueued_at
                .cmp(&b.enqueued_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(entries)
    }

    async fn pending_effect(&self, order_id: &str) -> Result<Option<OutboxEntry>> {
        self.get_json(CF_OUTBOX, order_id.as_bytes())
    }

    async fn complete_effect(&self, order_id: &str) -> Result<()> {
        let _guard = self.mutations.lock().await;
        self.db.delete_cf(self.cf(CF_OUTBOX)?, order_id.as_bytes())?;
        Ok(())
    }

    async fn record_effect_failure(&self, order_id: &str, error: String) -> Result<()> {
        let _guard = self.mutations.lock().await;
        let entry: Option<OutboxEntry> = self.get_json(CF_OUTBOX, order_id.as_bytes())?;
        if let Some(mut entry) = entry {
            entry.record_failure(error);
            self.put_json(CF_OUTBOX, order_id.as_bytes(), &entry)?;
        }
        Ok(())
    }
}

#[async_trait]
impl SubjectRegistry for RocksDBStore {
    async fn exists(&self, subject: Subject) -> Result<bool> {
        let (cf_name, id) = match subject {
            Subject::Adoption { pet_id } => (CF_PETS, pet_id),
            Subject::Donation { shelter_id } => (CF_SHELTERS, shelter_id),
        };
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_pinned_cf(cf, id.to_be_bytes())?.is_some())
    }

    async fn mark_adopted(&self, pet_id: u32) -> Result<()> {
        let _guard = self.mutations.lock().await;
        let mut pet: Pet = self
            .get_json(CF_PETS, &pet_id.to_be_bytes())?
            .ok_or_else(|| PaymentError::internal(format!("pet {pet_id} not found")))?;
        if pet.status != PetStatus::Adopted {
            pet.status = PetStatus::Adopted;
            self.put_json(CF_PETS, &pet_id.to_be_bytes(), &pet)?;
        }
        Ok(())
    }

    async fn attribute_donation(&self, donation: DonationAttribution) -> Result<()> {
        let _guard = self.mutations.lock().await;
        let shelters = self.cf(CF_SHELTERS)?;
        if self
            .db
            .get_pinned_cf(shelters, donation.shelter_id.to_be_bytes())?
            .is_none()
        {
            return Err(PaymentError::internal(format!(
                "shelter {} not found",
                donation.shelter_id
            )));
        }
        let donations = self.cf(CF_DONATIONS)?;
        if self
            .db
            .get_pinned_cf(donations, donation.order_id.as_bytes())?
            .is_none()
        {
            self.put_json(CF_DONATIONS, donation.order_id.as_bytes(), &donation)?;
        }
        Ok(())
    }

    async fn pet(&self, pet_id: u32) -> Result<Option<Pet>> {
        self.get_json(CF_PETS, &pet_id.to_be_bytes())
    }

    async fn donations(&self, shelter_id: u32) -> Result<Vec<DonationAttribution>> {
        let donations: Vec<DonationAttribution> = self.scan_json(CF_DONATIONS)?;
        Ok(donations
            .into_iter()
            .filter(|d| d.shelter_id == shelter_id)
            .collect())
    }

    async fn add_pet(&self, pet: Pet) -> Result<()> {
        self.put_json(CF_PETS, &pet.id.to_be_bytes(), &pet)
    }

    async fn add_shelter(&self, shelter: Shelter) -> Result<()> {
        self.put_json(CF_SHELTERS, &shelter.id.to_be_bytes(), &shelter)
    }
}
