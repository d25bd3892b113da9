use super::AppState;
use super::dto::{CreateAdoptionOrder, CreateDonationOrder, ReportFailure, VerifyPayment};
use super::error::ApiError;
use crate::error::{PaymentError, ValidationErrors};
use actix_web::{HttpRequest, HttpResponse, web};

/// Header the upstream session layer uses to pass the signed-in account id.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id(req: &HttpRequest) -> Result<Option<u32>, ApiError> {
    let Some(value) = req.headers().get(USER_ID_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or_else(|| {
            ApiError(PaymentError::ValidationError(ValidationErrors::single(
                "userId",
                "must be a positive integer",
            )))
        })
}

pub async fn create_adoption_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateAdoptionOrder>,
) -> Result<HttpResponse, ApiError> {
    let request = body
        .into_inner()
        .validate(user_id(&req)?, state.currency.clone())?;
    let issued = state.engine.create_order(request).await?;
    Ok(HttpResponse::Ok().json(issued))
}

pub async fn create_donation_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateDonationOrder>,
) -> Result<HttpResponse, ApiError> {
    let request = body
        .into_inner()
        .validate(user_id(&req)?, state.currency.clone())?;
    let issued = state.engine.create_order(request).await?;
    Ok(HttpResponse::Ok().json(issued))
}

pub async fn verify_payment(
    state: web::Data<AppState>,
    body: web::Json<VerifyPayment>,
) -> Result<HttpResponse, ApiError> {
    let valid = body.into_inner().validate()?;
    let verification = state
        .engine
        .verify(&valid.order_id, &valid.payment_id, &valid.signature)
        .await?;
    Ok(HttpResponse::Ok().json(verification))
}

pub async fn report_failure(
    state: web::Data<AppState>,
    body: web::Json<ReportFailure>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, reason) = body.into_inner().validate()?;
    let record = state.engine.report_failure(&order_id, reason).await?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn payment_details(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    match state.engine.payment_details(&order_id).await? {
        Some(details) => Ok(HttpResponse::Ok().json(details)),
        None => Err(ApiError(PaymentError::OrderNotFound(order_id))),
    }
}

pub async fn pet_payments(
    state: web::Data<AppState>,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    let payments = state.engine.adoption_payments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

pub async fn shelter_donations(
    state: web::Data<AppState>,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    let donations = state.engine.shelter_donations(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(donations))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "petpay"
    }))
}
