use super::money::{Amount, Currency};
use super::order::{PaymentOrder, Subject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum PetStatus {
    #[default]
    Available,
    Pending,
    Adopted,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Pet {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub status: PetStatus,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Shelter {
    pub id: u32,
    pub name: String,
}

/// A captured donation credited to a shelter. One per order, never amended.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DonationAttribution {
    pub order_id: String,
    pub shelter_id: u32,
    pub amount: Amount,
    pub currency: Currency,
    pub message: Option<String>,
    pub anonymous: bool,
    /// Always `None` for anonymous donations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u32>,
}

/// The single domain change owed once an order is captured.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SideEffect {
    MarkAdopted { pet_id: u32 },
    AttributeDonation(DonationAttribution),
}

impl SideEffect {
    /// The effect a captured order triggers on its subject.
    pub fn for_order(order: &PaymentOrder) -> Self {
        match order.subject {
            Subject::Adoption { pet_id } => SideEffect::MarkAdopted { pet_id },
            Subject::Donation { shelter_id } => {
                let details = order.donation.clone().unwrap_or_default();
                SideEffect::AttributeDonation(DonationAttribution {
                    order_id: order.order_id.clone(),
                    shelter_id,
                    amount: order.amount,
                    currency: order.currency.clone(),
                    message: details.message,
                    anonymous: details.anonymous,
                    user_id: if details.anonymous { None } else { order.user_id },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{DonationDetails, OrderRequest};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn donation_order(anonymous: bool) -> PaymentOrder {
        PaymentOrder::new(
            "order_d1".to_string(),
            "donation_3_1_aaaaaa".to_string(),
            OrderRequest {
                subject: Subject::Donation { shelter_id: 3 },
                amount: Amount::new(dec!(250)).unwrap(),
                currency: Currency::inr(),
                user_id: Some(42),
                donation: Some(DonationDetails {
                    message: Some("for the kittens".to_string()),
                    anonymous,
                }),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_adoption_effect() {
        let order = PaymentOrder::new(
            "order_a1".to_string(),
            "adoption_7_1_aaaaaa".to_string(),
            OrderRequest {
                subject: Subject::Adoption { pet_id: 7 },
                amount: Amount::new(dec!(500)).unwrap(),
                currency: Currency::inr(),
                user_id: None,
                donation: None,
            },
            Utc::now(),
        );
        assert_eq!(
            SideEffect::for_order(&order),
            SideEffect::MarkAdopted { pet_id: 7 }
        );
    }

    #[test]
    fn test_anonymous_donation_drops_user() {
        let effect = SideEffect::for_order(&donation_order(true));
        let SideEffect::AttributeDonation(attribution) = effect else {
            panic!("expected a donation effect");
        };
        assert!(attribution.anonymous);
        assert_eq!(attribution.user_id, None);
        assert_eq!(attribution.shelter_id, 3);
    }

    #[test]
    fn test_named_donation_keeps_user() {
        let SideEffect::AttributeDonation(attribution) =
            SideEffect::for_order(&donation_order(false))
        else {
            panic!("expected a donation effect");
        };
        assert_eq!(attribution.user_id, Some(42));
        assert_eq!(attribution.message.as_deref(), Some("for the kittens"));
    }
}
