use crate::domain::ports::{SharedOrderStore, SharedPaymentGateway, SharedSubjectRegistry};
use crate::domain::signature::SigningSecret;

/// The main entry point for the payment-order lifecycle.
///
/// `PaymentEngine` issues provider orders, verifies signed callbacks,
/// captures orders, and dispatches the one domain side effect each capture
/// owes. It holds no state of its own: every mutation goes through the
/// order store, which is the sole arbiter of ordering per record.
///
/// The operations live next to their concerns: issuing in
/// [`issuer`](super::issuer), capture and reconciliation in
/// [`capture`](super::capture), reads in [`queries`](super::queries).
#[derive(Clone)]
pub struct PaymentEngine {
    pub(super) store: SharedOrderStore,
    pub(super) registry: SharedSubjectRegistry,
    pub(super) gateway: SharedPaymentGateway,
    pub(super) secret: SigningSecret,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence for orders and the capture outbox.
    /// * `registry` - The pets and shelters the orders pay for.
    /// * `gateway` - The payment provider.
    /// * `secret` - Key shared with the provider for callback signatures.
    pub fn new(
        store: SharedOrderStore,
        registry: SharedSubjectRegistry,
        gateway: SharedPaymentGateway,
        secret: SigningSecret,
    ) -> Self {
        Self {
            store,
            registry,
            gateway,
            secret,
        }
    }

    /// Public key id for the client-side checkout widget.
    pub fn checkout_key(&self) -> &str {
        self.gateway.key_id()
    }

    pub fn registry(&self) -> &SharedSubjectRegistry {
        &self.registry
    }
}
