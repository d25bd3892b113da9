//! Request bodies, validated at the edge into domain requests.
//!
//! Every field is optional on the wire so that a missing field becomes a
//! named entry in the validation list rather than an opaque parse error.

use crate::domain::money::{Amount, Currency};
use crate::domain::order::{DonationDetails, OrderRequest, Subject};
use crate::error::{PaymentError, Result, ValidationErrors};
use rust_decimal::Decimal;
use serde::Deserialize;

const MAX_MESSAGE_LEN: usize = 500;
const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdoptionOrder {
    pub pet_id: Option<u32>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationOrder {
    pub shelter_id: Option<u32>,
    pub amount: Option<Decimal>,
    pub message: Option<String>,
    pub anonymous: Option<bool>,
}

/// Accepts both our field names and the provider's checkout handler names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayment {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: Option<String>,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: Option<String>,
    #[serde(alias = "razorpay_signature")]
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFailure {
    pub order_id: Option<String>,
    pub reason: Option<String>,
}

/// A verify request with every field present.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidVerify {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

fn require_amount(amount: Option<Decimal>, errors: &mut ValidationErrors) -> Option<Amount> {
    match amount {
        None => {
            errors.push("amount", "is required");
            None
        }
        Some(value) => match Amount::new(value) {
            Ok(amount) => Some(amount),
            Err(PaymentError::ValidationError(found)) => {
                for error in found.fields() {
                    errors.push(error.field, error.message.clone());
                }
                None
            }
            Err(_) => {
                errors.push("amount", "is invalid");
                None
            }
        },
    }
}

fn require_text(
    value: Option<String>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(field, "is required");
            None
        }
    }
}

impl CreateAdoptionOrder {
    pub fn validate(self, user_id: Option<u32>, currency: Currency) -> Result<OrderRequest> {
        let mut errors = ValidationErrors::new();
        if self.pet_id.is_none() {
            errors.push("petId", "is required");
        }
        let amount = require_amount(self.amount, &mut errors);

        match (self.pet_id, amount) {
            (Some(pet_id), Some(amount)) if errors.is_empty() => Ok(OrderRequest {
                subject: Subject::Adoption { pet_id },
                amount,
                currency,
                user_id,
                donation: None,
            }),
            _ => Err(PaymentError::ValidationError(errors)),
        }
    }
}

impl CreateDonationOrder {
    pub fn validate(self, user_id: Option<u32>, currency: Currency) -> Result<OrderRequest> {
        let mut errors = ValidationErrors::new();
        if self.shelter_id.is_none() {
            errors.push("shelterId", "is required");
        }
        let amount = require_amount(self.amount, &mut errors);

        let message = self
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN)
        {
            errors.push(
                "message",
                format!("must be at most {MAX_MESSAGE_LEN} characters"),
            );
        }

        match (self.shelter_id, amount) {
            (Some(shelter_id), Some(amount)) if errors.is_empty() => Ok(OrderRequest {
                subject: Subject::Donation { shelter_id },
                amount,
                currency,
                user_id,
                donation: Some(DonationDetails {
                    message,
                    anonymous: self.anonymous.unwrap_or(false),
                }),
            }),
            _ => Err(PaymentError::ValidationError(errors)),
        }
    }
}

impl VerifyPayment {
    pub fn validate(self) -> Result<ValidVerify> {
        let mut errors = ValidationErrors::new();
        let order_id = require_text(self.order_id, "orderId", &mut errors);
        let payment_id = require_text(self.payment_id, "paymentId", &mut errors);
        let signature = require_text(self.signature, "signature", &mut errors);

        match (order_id, payment_id, signature) {
            (Some(order_id), Some(payment_id), Some(signature)) => Ok(ValidVerify {
                order_id,
                payment_id,
                signature,
            }),
            _ => Err(PaymentError::ValidationError(errors)),
        }
    }
}

impl ReportFailure {
    pub fn validate(self) -> Result<(String, Option<String>)> {
        let mut errors = ValidationErrors::new();
        let order_id = require_text(self.order_id, "orderId", &mut errors);
        let reason = self
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if reason
            .as_ref()
            .is_some_and(|r| r.chars().count() > MAX_REASON_LEN)
        {
            errors.push("reason", format!("must be at most {MAX_REASON_LEN} characters"));
        }

        match order_id {
            Some(order_id) if errors.is_empty() => Ok((order_id, reason)),
            _ => Err(PaymentError::ValidationError(errors)),
        }
    }
}
