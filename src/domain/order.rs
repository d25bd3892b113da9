use super::money::{Amount, Currency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest receipt the provider accepts.
pub const MAX_RECEIPT_LEN: usize = 40;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Adoption,
    Donation,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Adoption => "adoption",
            SubjectType::Donation => "donation",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a payment is for: adopting a pet or donating to a shelter.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Subject {
    Adoption {
        #[serde(rename = "petId")]
        pet_id: u32,
    },
    Donation {
        #[serde(rename = "shelterId")]
        shelter_id: u32,
    },
}

impl Subject {
    pub fn subject_type(&self) -> SubjectType {
        match self {
            Subject::Adoption { .. } => SubjectType::Adoption,
            Subject::Donation { .. } => SubjectType::Donation,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Subject::Adoption { pet_id } => *pet_id,
            Subject::Donation { shelter_id } => *shelter_id,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.subject_type(), self.id())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Captured,
    Failed,
}

/// Extra fields a donor may attach to a donation order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct DonationDetails {
    pub message: Option<String>,
    pub anonymous: bool,
}

/// The local record of a provider order.
///
/// Created in `Created` state once the provider confirms the order, then
/// moved exactly once to `Captured` or `Failed`. Never deleted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentOrder {
    /// Provider-issued order id; the idempotency key for capture.
    pub order_id: String,
    pub subject: Subject,
    pub amount: Amount,
    pub currency: Currency,
    pub status: OrderStatus,
    pub receipt: String,
    pub payment_id: Option<String>,
    /// Account that placed the order, when the caller was signed in.
    pub user_id: Option<u32>,
    pub donation: Option<DonationDetails>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated request to open a payment order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub subject: Subject,
    pub amount: Amount,
    pub currency: Currency,
    pub user_id: Option<u32>,
    pub donation: Option<DonationDetails>,
}

impl PaymentOrder {
    pub fn new(
        order_id: String,
        receipt: String,
        request: OrderRequest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            subject: request.subject,
            amount: request.amount,
            currency: request.currency,
            status: OrderStatus::Created,
            receipt,
            payment_id: None,
            user_id: request.user_id,
            donation: request.donation,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.donation.as_ref().is_some_and(|d| d.anonymous)
    }

    /// Decides what a verified callback does to this record, applying it when allowed.
    pub fn capture(&mut self, payment_id: &str, now: DateTime<Utc>) -> CaptureDecision {
        match self.status {
            OrderStatus::Created => {
                self.status = OrderStatus::Captured;
                self.payment_id = Some(payment_id.to_string());
                self.updated_at = now;
                CaptureDecision::Apply
            }
            OrderStatus::Captured if self.payment_id.as_deref() == Some(payment_id) => {
                CaptureDecision::Duplicate
            }
            OrderStatus::Captured => CaptureDecision::Reject(format!(
                "already captured by payment {}",
                self.payment_id.as_deref().unwrap_or("<unknown>")
            )),
            OrderStatus::Failed => CaptureDecision::Reject("order was marked failed".to_string()),
        }
    }

    /// Marks a still-open order as failed; a failed order stays failed.
    pub fn fail(&mut self, reason: Option<String>, now: DateTime<Utc>) -> FailDecision {
        match self.status {
            OrderStatus::Created => {
                self.status = OrderStatus::Failed;
                self.failure_reason = reason;
                self.updated_at = now;
                FailDecision::Apply
            }
            OrderStatus::Failed => FailDecision::Duplicate,
            OrderStatus::Captured => FailDecision::Reject,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CaptureDecision {
    Apply,
    Duplicate,
    Reject(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum FailDecision {
    Apply,
    Duplicate,
    Reject,
}

/// Builds a receipt of the form `{type}_{id}_{millis}_{nonce}`.
///
/// The nonce keeps two orders for the same subject in the same millisecond
/// apart; the provider caps receipts at [`MAX_RECEIPT_LEN`] characters.
pub fn receipt_for(subject: &Subject, now: DateTime<Utc>, nonce: &str) -> String {
    let mut receipt = format!("{}_{}_{}", subject, now.timestamp_millis(), nonce);
    receipt.truncate(MAX_RECEIPT_LEN);
    receipt
}
