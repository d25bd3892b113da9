//! JSON API over the payment engine.

pub mod dto;
pub mod error;
pub mod handlers;

use crate::application::engine::PaymentEngine;
use crate::domain::money::Currency;
use crate::error::{PaymentError, ValidationErrors};
use actix_web::{App, HttpServer, web};
use error::ApiError;
use std::net::SocketAddr;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: PaymentEngine,
    /// Currency for new orders.
    pub currency: Currency,
}

/// Turns body parse failures into the same error shape as validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            let errors = ValidationErrors::single("body", err.to_string());
            ApiError(PaymentError::ValidationError(errors)).into()
        })
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api")
            .route(
                "/payments/create-adoption-order",
                web::post().to(handlers::create_adoption_order),
            )
            .route(
                "/payments/create-donation-order",
                web::post().to(handlers::create_donation_order),
            )
            .route("/payments/verify", web::post().to(handlers::verify_payment))
            .route("/payments/fail", web::post().to(handlers::report_failure))
            .route(
                "/payments/details/{order_id}",
                web::get().to(handlers::payment_details),
            )
            .route("/payments/pet/{pet_id}", web::get().to(handlers::pet_payments))
            .route(
                "/donations/shelter/{shelter_id}",
                web::get().to(handlers::shelter_donations),
            ),
    );
}

/// Serves the API until the process is stopped.
pub async fn serve(state: AppState, bind: SocketAddr) -> std::io::Result<()> {
    tracing::info!(%bind, "Starting payment API");
    let data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(json_config())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
