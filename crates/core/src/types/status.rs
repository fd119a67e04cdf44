//! Checkout enums.

use serde::{Deserialize, Serialize};

/// Payment method chosen on the checkout form.
///
/// Exactly one is selected at a time. Serialized with the form's field
/// values (`creditCard`, `paypal`, `valU`, `cod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    /// Card details are entered on the form and validated.
    #[default]
    CreditCard,
    /// Handled by the external PayPal widget.
    Paypal,
    /// valU instalments.
    ValU,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    /// Whether card fields must be filled in and validated.
    #[must_use]
    pub const fn requires_card(&self) -> bool {
        matches!(self, Self::CreditCard)
    }

    /// Whether the main submit button hands off to the payment widget.
    #[must_use]
    pub const fn defers_to_widget(&self) -> bool {
        matches!(self, Self::Paypal)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreditCard => write!(f, "creditCard"),
            Self::Paypal => write!(f, "paypal"),
            Self::ValU => write!(f, "valU"),
            Self::Cod => write!(f, "cod"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creditCard" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            "valU" => Ok(Self::ValU),
            "cod" => Ok(Self::Cod),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Outcome reported by the external payment widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetOutcome {
    /// The payer approved and the capture completed.
    Approved,
    /// The widget failed.
    Failed,
    /// The payer closed the widget.
    Cancelled,
}
