//! Application layer containing the payment-order lifecycle.
//!
//! `PaymentEngine` is the single entry point. Its operations are split by
//! concern: issuing orders, verifying and capturing callbacks (with the
//! outbox replay that backs them), and read-only queries.

pub mod capture;
pub mod engine;
pub mod issuer;
pub mod queries;
