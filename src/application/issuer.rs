use super::engine::PaymentEngine;
use crate::domain::money::Currency;
use crate::domain::order::{OrderRequest, PaymentOrder, Subject, receipt_for};
use crate::domain::ports::GatewayOrderRequest;
use crate::error::{PaymentError, Result, ValidationErrors};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;

const RECEIPT_NONCE_LEN: usize = 6;

/// What the client needs to open the provider's checkout widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedOrder {
    /// Provider order id.
    pub id: String,
    /// Minor currency units, as confirmed by the provider.
    pub amount: i64,
    pub currency: Currency,
    pub receipt: String,
    /// Public checkout key.
    pub key: String,
}

impl PaymentEngine {
    /// Opens a provider order and records it locally in `created` state.
    ///
    /// The local record is written only after the provider confirms the
    /// order, so a provider fault never leaves a local-only order behind.
    #[tracing::instrument(
        name = "create_order",
        skip(self, request),
        fields(subject = %request.subject)
    )]
    pub async fn create_order(&self, request: OrderRequest) -> Result<IssuedOrder> {
        if !self.registry.exists(request.subject).await? {
            let (field, what) = match request.subject {
                Subject::Adoption { .. } => ("petId", "pet"),
                Subject::Donation { .. } => ("shelterId", "shelter"),
            };
            return Err(PaymentError::ValidationError(ValidationErrors::single(
                field,
                format!("does not refer to an existing {what}"),
            )));
        }

        let now = Utc::now();
        let mut nonce = uuid::Uuid::new_v4().simple().to_string();
        nonce.truncate(RECEIPT_NONCE_LEN);
        let receipt = receipt_for(&request.subject, now, &nonce);

        let gateway_request = GatewayOrderRequest {
            amount: request.amount.minor_units()?,
            currency: request.currency.clone(),
            receipt: receipt.clone(),
            notes: order_notes(&request),
        };

        let provider_order = match self.gateway.create_order(&gateway_request).await {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    receipt = %receipt,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Provider order creation failed"
                );
                return Err(e);
            }
        };

        let order = PaymentOrder::new(provider_order.id.clone(), receipt, request, now);
        self.store.insert(order).await?;

        tracing::info!(
            order_id = %provider_order.id,
            receipt = %provider_order.receipt,
            amount = provider_order.amount,
            "Created payment order"
        );

        Ok(IssuedOrder {
            id: provider_order.id,
            amount: provider_order.amount,
            currency: provider_order.currency,
            receipt: provider_order.receipt,
            key: self.gateway.key_id().to_string(),
        })
    }
}

/// Free-form notes stored with the provider order.
fn order_notes(request: &OrderRequest) -> BTreeMap<String, String> {
    let mut notes = BTreeMap::new();
    notes.insert(
        "type".to_string(),
        request.subject.subject_type().to_string(),
    );
    match request.subject {
        Subject::Adoption { pet_id } => {
            notes.insert("petId".to_string(), pet_id.to_string());
        }
        Subject::Donation { shelter_id } => {
            notes.insert("shelterId".to_string(), shelter_id.to_string());
        }
    }
    let anonymous = request.donation.as_ref().is_some_and(|d| d.anonymous);
    if request.donation.is_some() {
        notes.insert("anonymous".to_string(), anonymous.to_string());
    }
    let user = match request.user_id {
        Some(id) if !anonymous => id.to_string(),
        _ => "guest".to_string(),
    };
    notes.insert("userId".to_string(), user);
    notes
}
