use crate::error::{FieldError, PaymentError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// A `PaymentError` on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PaymentError);

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        Self(e)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
    retryable: bool,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            PaymentError::ValidationError(_) | PaymentError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::CaptureConflict { .. } => StatusCode::CONFLICT,
            PaymentError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PaymentError::ProviderRejected(_) => StatusCode::BAD_GATEWAY,
            PaymentError::IoError(_) | PaymentError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match &self.0 {
            PaymentError::ValidationError(_) => "Invalid request".to_string(),
            PaymentError::IoError(_) | PaymentError::InternalError(_) => {
                tracing::error!(error = %self.0, "Request failed");
                "Internal server error".to_string()
            }
            PaymentError::ProviderUnavailable(_) => {
                "Payment provider is unavailable, please retry".to_string()
            }
            PaymentError::ProviderRejected(_) => "Payment provider rejected the order".to_string(),
            other => other.to_string(),
        };
        let errors = match &self.0 {
            PaymentError::ValidationError(errors) => Some(errors.fields()),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorBody {
            message,
            errors,
            retryable: self.0.is_retryable(),
        })
    }
}
