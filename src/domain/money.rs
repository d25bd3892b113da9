use crate::error::{PaymentError, Result, ValidationErrors};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits the provider accepts; amounts travel as integer minor units.
const MINOR_UNIT_SCALE: u32 = 2;

/// A positive monetary amount in major currency units.
///
/// Wraps `rust_decimal::Decimal` so a zero, negative or sub-minor-unit value
/// can never reach the gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(PaymentError::ValidationError(ValidationErrors::single(
                "amount",
                "must be positive",
            )));
        }
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(PaymentError::ValidationError(ValidationErrors::single(
                "amount",
                format!("must have at most {MINOR_UNIT_SCALE} decimal places"),
            )));
        }
        Ok(Self(normalized))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount in minor units (paise for INR), as the provider expects it.
    pub fn minor_units(&self) -> Result<i64> {
        self.0
            .checked_mul(Decimal::from(10_i64.pow(MINOR_UNIT_SCALE)))
            .and_then(|minor| minor.to_i64())
            .ok_or_else(|| {
                PaymentError::ValidationError(ValidationErrors::single("amount", "is too large"))
            })
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ISO 4217 style code: three uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn inr() -> Self {
        Self("INR".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::inr()
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(s.to_string()))
        } else {
            Err(PaymentError::ValidationError(ValidationErrors::single(
                "currency",
                format!("'{s}' is not a three letter currency code"),
            )))
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
