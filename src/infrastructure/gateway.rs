use crate::domain::ports::{GatewayOrder, GatewayOrderRequest, PaymentGateway};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Default Razorpay REST endpoint.
pub const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Provider order ids are `order_` followed by 14 alphanumerics.
const ORDER_ID_SUFFIX_LEN: usize = 14;

/// Creates orders against the Razorpay REST API.
pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self::with_base_url(RAZORPAY_API_BASE.to_string(), key_id, key_secret)
    }

    pub fn with_base_url(base_url: String, key_id: String, key_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[tracing::instrument(
        name = "gateway_create_order",
        skip(self, request),
        fields(receipt = %request.receipt)
    )]
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder> {
        let url = format!("{}/orders", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::ProviderUnavailable(format!("order request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<GatewayOrder>().await.map_err(|e| {
                PaymentError::ProviderUnavailable(format!("unreadable order response: {e}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(PaymentError::ProviderUnavailable(format!(
                "provider returned {status}: {body}"
            )))
        } else {
            Err(PaymentError::ProviderRejected(format!(
                "provider returned {status}: {body}"
            )))
        }
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// An in-process stand-in for the provider.
///
/// Issues order ids locally and echoes the request back, so the whole
/// create, sign and verify cycle can run without network access.
pub struct SandboxGateway {
    key_id: String,
}

impl SandboxGateway {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
        }
    }
}

impl Default for SandboxGateway {
    fn default() -> Self {
        Self::new("rzp_test_sandbox")
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder> {
        let mut suffix = uuid::Uuid::new_v4().simple().to_string();
        suffix.truncate(ORDER_ID_SUFFIX_LEN);
        Ok(GatewayOrder {
            id: format!("order_{suffix}"),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: request.receipt.clone(),
        })
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}
