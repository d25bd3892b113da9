use crate::error::{PaymentError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 MAC.
const SIGNATURE_HEX_LEN: usize = 64;

/// Shared secret between this service and the payment provider.
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> HmacSha256 {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac = HmacSha256::new_from_slice(self.0.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC key of any length is valid"));
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// Lowercase hex `HMAC-SHA256(secret, order_id + "|" + payment_id)`.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        hex::encode(self.mac(order_id, payment_id).finalize().into_bytes())
    }

    /// Checks a provider signature in constant time.
    ///
    /// Anything that is not exactly 64 lowercase hex digits is rejected
    /// before the MAC is computed.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        if signature.len() != SIGNATURE_HEX_LEN
            || !signature
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(PaymentError::InvalidSignature);
        }
        let expected = hex::decode(signature).map_err(|_| PaymentError::InvalidSignature)?;
        self.mac(order_id, payment_id)
            .verify_slice(&expected)
            .map_err(|_| PaymentError::InvalidSignature)
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let secret = SigningSecret::new("secret");
        let signature = secret.sign("order_abc", "pay_xyz");
        assert_eq!(signature.len(), SIGNATURE_HEX_LEN);
        assert!(secret.verify("order_abc", "pay_xyz", &signature).is_ok());
    }

    #[test]
    fn test_signature_binds_both_ids() {
        let secret = SigningSecret::new("secret");
        let signature = secret.sign("order_abc", "pay_xyz");
        assert!(secret.verify("order_abd", "pay_xyz", &signature).is_err());
        assert!(secret.verify("order_abc", "pay_xyy", &signature).is_err());
        assert!(secret.verify("pay_xyz", "order_abc", &signature).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signature = SigningSecret::new("secret").sign("order_abc", "pay_xyz");
        assert!(matches!(
            SigningSecret::new("other").verify("order_abc", "pay_xyz", &signature),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        let secret = SigningSecret::new("secret");
        let signature = secret.sign("order_abc", "pay_xyz");
        for bad in [
            String::new(),
            "zz".repeat(32),
            signature.to_uppercase(),
            signature[..62].to_string(),
            format!("{signature}00"),
        ] {
            assert!(matches!(
                secret.verify("order_abc", "pay_xyz", &bad),
                Err(PaymentError::InvalidSignature)
            ));
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let secret = SigningSecret::new("super-secret");
        assert!(!format!("{secret:?}").contains("super-secret"));
    }
}
