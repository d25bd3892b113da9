use super::engine::PaymentEngine;
use crate::domain::money::{Amount, Currency};
use crate::domain::order::{OrderStatus, PaymentOrder, Subject, SubjectType};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The read shape of a payment order.
///
/// Every read path goes through this view. For an anonymous donation the
/// donor's account id is never copied in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: String,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub subject_id: u32,
    pub amount: Amount,
    pub currency: Currency,
    pub status: OrderStatus,
    pub receipt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentOrder> for OrderView {
    fn from(order: &PaymentOrder) -> Self {
        let anonymous = order.is_anonymous();
        Self {
            order_id: order.order_id.clone(),
            subject_type: order.subject.subject_type(),
            subject_id: order.subject.id(),
            amount: order.amount,
            currency: order.currency.clone(),
            status: order.status,
            receipt: order.receipt.clone(),
            payment_id: order.payment_id.clone(),
            user_id: if anonymous { None } else { order.user_id },
            message: order.donation.as_ref().and_then(|d| d.message.clone()),
            anonymous: order.donation.as_ref().map(|d| d.anonymous),
            failure_reason: order.failure_reason.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// A payment looked up by order id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDetails {
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub data: OrderView,
}

impl PaymentEngine {
    pub async fn payment_details(&self, order_id: &str) -> Result<Option<PaymentDetails>> {
        Ok(self.store.get(order_id).await?.map(|order| PaymentDetails {
            subject_type: order.subject.subject_type(),
            data: OrderView::from(&order),
        }))
    }

    /// Captured adoption payments for a pet, newest first.
    pub async fn adoption_payments(&self, pet_id: u32) -> Result<Vec<OrderView>> {
        self.captured_for(Subject::Adoption { pet_id }).await
    }

    /// Captured donations to a shelter, newest first.
    pub async fn shelter_donations(&self, shelter_id: u32) -> Result<Vec<OrderView>> {
        self.captured_for(Subject::Donation { shelter_id }).await
    }

    async fn captured_for(&self, subject: Subject) -> Result<Vec<OrderView>> {
        let mut orders: Vec<PaymentOrder> = self
            .store
            .find_by_subject(subject)
            .await?
            .into_iter()
            .filter(|order| order.status == OrderStatus::Captured)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders.iter().map(OrderView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{DonationDetails, OrderRequest};
    use rust_decimal_macros::dec;

    fn donation(anonymous: bool) -> PaymentOrder {
        PaymentOrder::new(
            "order_d1".to_string(),
            "donation_3_1_abcdef".to_string(),
            OrderRequest {
                subject: Subject::Donation { shelter_id: 3 },
                amount: Amount::new(dec!(250)).unwrap(),
                currency: Currency::inr(),
                user_id: Some(42),
                donation: Some(DonationDetails {
                    message: Some("good luck".to_string()),
                    anonymous,
                }),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_anonymous_view_has_no_user() {
        let view = OrderView::from(&donation(true));
        assert_eq!(view.user_id, None);
        assert_eq!(view.anonymous, Some(true));

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("userId").is_none());
        assert_eq!(json["type"], "donation");
        assert_eq!(json["subjectId"], 3);
    }

    #[test]
    fn test_named_view_keeps_user() {
        let view = OrderView::from(&donation(false));
        assert_eq!(view.user_id, Some(42));
        assert_eq!(view.message.as_deref(), Some("good luck"));
    }
}
