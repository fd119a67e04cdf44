//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Serializes as `{"amount": "15.00", "currencyCode": "USD"}`, the shape
/// catalog documents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// This price multiplied by a quantity (a line total), saturating at
    /// the decimal range.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(
            self.amount.saturating_mul(Decimal::from(quantity)),
            self.currency_code,
        )
    }

    /// Format for display (e.g., "1500.00 EGP").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.amount.round_dp(2);
        write!(f, "{rounded:.2} {}", self.currency_code.code())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    EGP,
    AED,
    SAR,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::EGP => "EGP",
            Self::AED => "AED",
            Self::SAR => "SAR",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            "EGP" => Ok(Self::EGP),
            "AED" => Ok(Self::AED),
            "SAR" => Ok(Self::SAR),
            _ => Err(format!("unsupported currency code: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_is_exact() {
        let unit = Price::new(Decimal::new(3333, 2), CurrencyCode::EGP);
        assert_eq!(unit.times(3).amount, Decimal::new(9999, 2));
    }

    #[test]
    fn test_times_saturates() {
        let unit = Price::new(Decimal::MAX, CurrencyCode::EGP);
        assert_eq!(unit.times(u32::MAX).amount, Decimal::MAX);
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::from(1500), CurrencyCode::EGP);
        assert_eq!(price.display(), "1500.00 EGP");
    }

    #[test]
    fn test_currency_from_str_case_insensitive() {
        assert_eq!("egp".parse::<CurrencyCode>().unwrap(), CurrencyCode::EGP);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        let json = serde_json::to_value(price).unwrap();
        assert_eq!(json["amount"], "19.99");
        assert_eq!(json["currencyCode"], "USD");
    }
}
