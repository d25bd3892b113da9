mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use petpay::domain::ports::SubjectRegistry;
use petpay::domain::subject::PetStatus;
use petpay::interfaces::http::{configure, json_config};
use serde_json::{Value, json};
use std::sync::Arc;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(json_config())
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_adoption_checkout_flow() {
    let (state, registry) = common::app_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .insert_header(("X-User-Id", "42"))
        .set_json(json!({"petId": 7, "amount": 500}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let issued: Value = test::read_body_json(resp).await;
    assert_eq!(issued["amount"], 50000);
    assert_eq!(issued["currency"], "INR");
    assert_eq!(issued["key"], "rzp_test_sandbox");
    assert!(issued["receipt"].as_str().unwrap().starts_with("adoption_7_"));
    let order_id = issued["id"].as_str().unwrap().to_string();

    let verify = json!({
        "orderId": order_id,
        "paymentId": "pay_1",
        "signature": common::sign(&order_id, "pay_1"),
    });
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/payments/verify")
            .set_json(&verify)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["type"], "adoption");
        assert_eq!(body["record"]["status"], "captured");
        assert_eq!(body["record"]["paymentId"], "pay_1");
        assert_eq!(body["record"]["userId"], 42);
    }

    let pet = registry.pet(7).await.unwrap().unwrap();
    assert_eq!(pet.status, PetStatus::Adopted);

    let req = test::TestRequest::get()
        .uri(&format!("/api/payments/details/{order_id}"))
        .to_request();
    let details: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(details["type"], "adoption");
    assert_eq!(details["data"]["orderId"], order_id.as_str());

    let req = test::TestRequest::get().uri("/api/payments/pet/7").to_request();
    let payments: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_anonymous_donation_hides_donor() {
    let (state, registry) = common::app_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-donation-order")
        .insert_header(("X-User-Id", "9"))
        .set_json(json!({
            "shelterId": 3,
            "amount": "250.50",
            "message": "for the cats",
            "anonymous": true
        }))
        .to_request();
    let issued: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(issued["amount"], 25050);
    let order_id = issued["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/payments/verify")
        .set_json(json!({
            "razorpay_order_id": order_id,
            "razorpay_payment_id": "pay_9",
            "razorpay_signature": common::sign(&order_id, "pay_9"),
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["type"], "donation");
    assert_eq!(body["record"]["anonymous"], true);
    assert!(body["record"].get("userId").is_none());

    let donations = registry.donations(3).await.unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0].user_id, None);

    let req = test::TestRequest::get()
        .uri("/api/donations/shelter/3")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed[0]["message"], "for the cats");
    assert!(listed[0].get("userId").is_none());
}

#[actix_web::test]
async fn test_error_responses() {
    let (state, _) = common::app_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .set_json(json!({"amount": -1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["retryable"], false);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["petId", "amount"]);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .set_json(json!({"petId": 99, "amount": 10}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .set_json(json!({"petId": 7, "amount": "10000000000000000000000000000"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "amount");

    let req = test::TestRequest::post()
        .uri("/api/payments/verify")
        .set_json(json!({
            "orderId": "order_missing",
            "paymentId": "pay_1",
            "signature": common::sign("order_missing", "pay_1"),
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/payments/verify")
        .set_json(json!({"orderId": "order_missing", "paymentId": "pay_1", "signature": "00"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/payments/details/order_missing")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .insert_header(("X-User-Id", "someone"))
        .set_json(json!({"petId": 7, "amount": 10}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/payments/verify")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "body");
}

#[actix_web::test]
async fn test_failed_order_rejects_capture() {
    let (state, _) = common::app_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .set_json(json!({"petId": 7, "amount": 500}))
        .to_request();
    let issued: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = issued["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/payments/fail")
        .set_json(json!({"orderId": order_id, "reason": "card declined"}))
        .to_request();
    let record: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(record["status"], "failed");
    assert_eq!(record["failureReason"], "card declined");

    let req = test::TestRequest::post()
        .uri("/api/payments/verify")
        .set_json(json!({
            "orderId": order_id,
            "paymentId": "pay_1",
            "signature": common::sign(&order_id, "pay_1"),
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_provider_outage_is_retryable() {
    let (state, _) = common::app_state_with(Arc::new(common::UnavailableGateway)).await;
    let engine = state.engine.clone();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/payments/create-adoption-order")
        .set_json(json!({"petId": 7, "amount": 500}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["retryable"], true);

    assert!(engine.adoption_payments(7).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_health() {
    let (state, _) = common::app_state().await;
    let app = app!(state);
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}
