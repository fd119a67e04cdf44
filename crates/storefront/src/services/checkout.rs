//! Checkout: form validation and order submission.
//!
//! Orders are not persisted. A submitted order is logged and answered with a
//! confirmation carrying a generated order reference. Card details are only
//! validated, never stored or logged.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use souq_core::{OrderId, PaymentMethod, Price, UserId, WidgetOutcome};

use super::cart::{CartError, CartService, CartSummary};
use crate::models::CartItem;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("Invalid regex"));
static CARD_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{16}$").expect("Invalid regex"));
static EXPIRATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("Invalid regex"));
static SECURITY_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("Invalid regex"));

/// Default governorate on the address form.
pub const DEFAULT_GOVERNORATE: &str = "Sohag";
/// Default (and only) shipping method.
pub const DEFAULT_SHIPPING_METHOD: &str = "Qibly";
/// Default country on the address form.
pub const DEFAULT_COUNTRY: &str = "Egypt";

/// Shown when the payment widget reports a failure.
pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed. Please try another payment method.";
/// Shown after an order is placed.
pub const ORDER_PLACED_MESSAGE: &str = "Order placed successfully!";

/// Field name to error message, keyed by the form's field names.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Errors that can occur when submitting an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The form failed validation.
    #[error("checkout form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),

    /// The selected payment method completes in the external widget.
    #[error("this payment method is completed in the payment window")]
    DeferredToPaymentWidget,

    /// Nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// The widget approved a payment without a transaction id.
    #[error("missing transaction id")]
    MissingTransactionId,

    /// Reading the cart failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// The checkout form.
///
/// Never persisted. Missing fields take the form's initial values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    // Contact
    pub email: String,
    pub email_news: bool,
    pub text_news: bool,

    // Delivery
    pub country: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub governorate: String,
    pub postal_code: String,
    pub phone: String,
    pub save_info: bool,

    pub shipping_method: String,

    // Payment
    pub payment_method: PaymentMethod,
    pub card_number: String,
    pub expiration_date: String,
    pub security_code: String,
    pub name_on_card: String,
    pub use_shipping_address: bool,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            email_news: true,
            text_news: false,
            country: DEFAULT_COUNTRY.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            apartment: String::new(),
            city: String::new(),
            governorate: DEFAULT_GOVERNORATE.to_owned(),
            postal_code: String::new(),
            phone: String::new(),
            save_info: false,
            shipping_method: DEFAULT_SHIPPING_METHOD.to_owned(),
            payment_method: PaymentMethod::default(),
            card_number: String::new(),
            expiration_date: String::new(),
            security_code: String::new(),
            name_on_card: String::new(),
            use_shipping_address: true,
        }
    }
}

impl CheckoutForm {
    /// Check every field, returning one message per invalid field.
    ///
    /// Card fields are only checked when paying by card.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if is_blank(&self.email) {
            errors.insert("email", "Email is required");
        } else if !EMAIL_PATTERN.is_match(&self.email) {
            errors.insert("email", "Email is invalid");
        }

        if is_blank(&self.first_name) {
            errors.insert("firstName", "First name is required");
        }
        if is_blank(&self.last_name) {
            errors.insert("lastName", "Last name is required");
        }
        if is_blank(&self.address) {
            errors.insert("address", "Address is required");
        }
        if is_blank(&self.city) {
            errors.insert("city", "City is required");
        }

        if is_blank(&self.phone) {
            errors.insert("phone", "Phone number is required");
        } else {
            let digits = self.phone.chars().filter(char::is_ascii_digit).count();
            if !(10..=12).contains(&digits) {
                errors.insert("phone", "Please enter a valid phone number");
            }
        }

        if self.payment_method.requires_card() {
            self.validate_card(&mut errors);
        }

        errors
    }

    fn validate_card(&self, errors: &mut FieldErrors) {
        if is_blank(&self.card_number) {
            errors.insert("cardNumber", "Card number is required");
        } else {
            let compact: String = self
                .card_number
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if !CARD_NUMBER_PATTERN.is_match(&compact) {
                errors.insert("cardNumber", "Please enter a valid 16-digit card number");
            }
        }

        if is_blank(&self.expiration_date) {
            errors.insert("expirationDate", "Expiration date is required");
        } else if !EXPIRATION_PATTERN.is_match(&self.expiration_date) {
            errors.insert("expirationDate", "Format: MM/YY");
        }

        if is_blank(&self.security_code) {
            errors.insert("securityCode", "Security code is required");
        } else if !SECURITY_CODE_PATTERN.is_match(&self.security_code) {
            errors.insert("securityCode", "Invalid security code");
        }

        if is_blank(&self.name_on_card) {
            errors.insert("nameOnCard", "Name is required");
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Input mask for the card number field.
///
/// Keeps the first 16 digits in groups of four. Input with fewer than four
/// digits is returned unchanged.
#[must_use]
pub fn format_card_number(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).take(16).collect();
    if digits.len() < 4 {
        return raw.to_owned();
    }
    digits
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A value/label pair for a select input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn option(value: &'static str, label: &'static str) -> SelectOption {
    SelectOption { value, label }
}

/// Countries offered on the address form.
pub const COUNTRIES: &[SelectOption] = &[
    option("Egypt", "Egypt"),
    option("UAE", "United Arab Emirates"),
    option("KSA", "Saudi Arabia"),
];

/// Governorates offered on the address form.
pub const GOVERNORATES: &[SelectOption] = &[
    option("Sohag", "Sohag"),
    option("Cairo", "Cairo"),
    option("Alexandria", "Alexandria"),
    option("Giza", "Giza"),
    option("Port Said", "Port Said"),
    option("Suez", "Suez"),
    option("Luxor", "Luxor"),
    option("El-Mahalla El-Kubra", "El-Mahalla El-Kubra"),
    option("Tanta", "Tanta"),
    option("Asyut", "Asyut"),
    option("Ismailia", "Ismailia"),
    option("Fayyum", "Fayyum"),
    option("Zagazig", "Zagazig"),
    option("Aswan", "Aswan"),
    option("Damietta", "Damietta"),
    option("Damanhur", "Damanhur"),
    option("al-Minya", "Minya"),
    option("Beni Suef", "Beni Suef"),
    option("Qena", "Qena"),
    option("Mallawi", "Mallawi"),
    option("Kafr El Sheikh", "Kafr El Sheikh"),
    option("Qalyubia", "Qalyubia"),
    option("Sharqia", "Sharqia"),
];

/// Everything the checkout page needs to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPage {
    pub cart: CartSummary,
    pub form: CheckoutForm,
    pub countries: &'static [SelectOption],
    pub governorates: &'static [SelectOption],
    pub shipping_methods: &'static [&'static str],
    pub payment_methods: &'static [PaymentMethod],
}

/// What was ordered and how it is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Price,
    pub item_count: u32,
    pub shipping_method: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Answer to a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub message: String,
    pub summary: OrderSummary,
}

/// Payment widget approval callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetApproval {
    pub transaction_id: String,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub form: CheckoutForm,
}

/// Payment widget failure or cancellation callback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WidgetNotice {
    /// Free-form detail from the widget, logged only.
    pub details: Option<serde_json::Value>,
}

/// Answer to a widget callback that did not place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetAck {
    pub outcome: WidgetOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Checkout operations. Reads the cart from the store on every call.
#[derive(Clone)]
pub struct CheckoutService {
    cart: CartService,
}

impl CheckoutService {
    /// Create a checkout service over the shopper carts in `cart`.
    #[must_use]
    pub const fn new(cart: CartService) -> Self {
        Self { cart }
    }

    /// The checkout page: current cart, form defaults and select options.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Cart` if the cart cannot be read.
    pub async fn page(&self, user: &UserId) -> Result<CheckoutPage, CheckoutError> {
        Ok(CheckoutPage {
            cart: self.cart.cart_summary(user).await?,
            form: CheckoutForm::default(),
            countries: COUNTRIES,
            governorates: GOVERNORATES,
            shipping_methods: &[DEFAULT_SHIPPING_METHOD],
            payment_methods: &[
                PaymentMethod::CreditCard,
                PaymentMethod::Paypal,
                PaymentMethod::ValU,
                PaymentMethod::Cod,
            ],
        })
    }

    /// Validate the form and place an order for the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::DeferredToPaymentWidget` if the payment method
    /// completes in the widget, `CheckoutError::Invalid` with per-field
    /// messages if validation fails, and `CheckoutError::EmptyCart` if there
    /// is nothing to order.
    #[instrument(skip(self, form), fields(user = %user, payment_method = %form.payment_method))]
    pub async fn submit_order(
        &self,
        user: &UserId,
        form: &CheckoutForm,
    ) -> Result<OrderConfirmation, CheckoutError> {
        if form.payment_method.defers_to_widget() {
            return Err(CheckoutError::DeferredToPaymentWidget);
        }

        let errors = form.validate();
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }

        self.place_order(user, form, form.payment_method, None).await
    }

    /// The payment widget approved and captured a payment.
    ///
    /// The form is not revalidated; the widget collected what it needed.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingTransactionId` if the approval carries no
    /// transaction id and `CheckoutError::EmptyCart` if there is nothing to order.
    #[instrument(skip(self, approval), fields(user = %user))]
    pub async fn widget_approved(
        &self,
        user: &UserId,
        approval: &WidgetApproval,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let transaction_id = approval.transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(CheckoutError::MissingTransactionId);
        }
        if let Some(payer) = &approval.payer_name {
            info!(payer = %payer, "Payment completed");
        }

        self.place_order(
            user,
            &approval.form,
            PaymentMethod::Paypal,
            Some(transaction_id.to_owned()),
        )
        .await
    }

    /// The payment widget failed.
    #[must_use]
    pub fn widget_failed(user: &UserId, notice: &WidgetNotice) -> WidgetAck {
        warn!(user = %user, details = ?notice.details, "Payment widget error");
        WidgetAck {
            outcome: WidgetOutcome::Failed,
            message: Some(PAYMENT_FAILED_MESSAGE),
        }
    }

    /// The payer closed the payment widget.
    #[must_use]
    pub fn widget_cancelled(user: &UserId, notice: &WidgetNotice) -> WidgetAck {
        info!(user = %user, details = ?notice.details, "Payment cancelled");
        WidgetAck {
            outcome: WidgetOutcome::Cancelled,
            message: None,
        }
    }

    async fn place_order(
        &self,
        user: &UserId,
        form: &CheckoutForm,
        payment_method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let cart = self.cart.cart_summary(user).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order_id = OrderId::generate();
        let summary = OrderSummary {
            items: cart.items,
            subtotal: cart.subtotal,
            item_count: cart.item_count,
            shipping_method: form.shipping_method.clone(),
            payment_method,
            transaction_id,
        };

        info!(
            order_id = %order_id,
            email = %form.email,
            city = %form.city,
            governorate = %form.governorate,
            shipping_method = %summary.shipping_method,
            payment_method = %summary.payment_method,
            transaction_id = ?summary.transaction_id,
            items = summary.item_count,
            subtotal = %summary.subtotal,
            "Order submitted"
        );

        Ok(OrderConfirmation {
            order_id,
            placed_at: Utc::now(),
            message: ORDER_PLACED_MESSAGE.to_owned(),
            summary,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;
    use souq_core::DocumentPath;

    use super::*;
    use crate::models::Product;
    use crate::store::{Document, MemoryStore};

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            email: "amira@example.com".to_owned(),
            first_name: "Amira".to_owned(),
            last_name: "Hassan".to_owned(),
            address: "12 Nile St".to_owned(),
            city: "Sohag".to_owned(),
            phone: "+20 100 123 4567".to_owned(),
            card_number: "4242 4242 4242 4242".to_owned(),
            expiration_date: "09/28".to_owned(),
            security_code: "123".to_owned(),
            name_on_card: "Amira Hassan".to_owned(),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_defaults() {
        let form: CheckoutForm = serde_json::from_value(json!({})).unwrap();
        assert_eq!(form, CheckoutForm::default());
        assert_eq!(form.governorate, "Sohag");
        assert_eq!(form.shipping_method, "Qibly");
        assert!(form.email_news);
        assert!(form.use_shipping_address);
        assert_eq!(form.payment_method, PaymentMethod::CreditCard);
    }

    #[test]
    fn test_valid_form_with_spaced_card_number() {
        assert!(valid_form().validate().is_empty());
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let errors = CheckoutForm::default().validate();
        assert_eq!(errors.get("email"), Some(&"Email is required"));
        assert_eq!(errors.get("firstName"), Some(&"First name is required"));
        assert_eq!(errors.get("lastName"), Some(&"Last name is required"));
        assert_eq!(errors.get("address"), Some(&"Address is required"));
        assert_eq!(errors.get("city"), Some(&"City is required"));
        assert_eq!(errors.get("phone"), Some(&"Phone number is required"));
        assert_eq!(errors.get("cardNumber"), Some(&"Card number is required"));
        assert_eq!(errors.get("expirationDate"), Some(&"Expiration date is required"));
        assert_eq!(errors.get("securityCode"), Some(&"Security code is required"));
        assert_eq!(errors.get("nameOnCard"), Some(&"Name is required"));
    }

    #[test]
    fn test_email_without_at_is_invalid() {
        let form = CheckoutForm {
            email: "amira.example.com".to_owned(),
            ..valid_form()
        };
        assert_eq!(form.validate().get("email"), Some(&"Email is invalid"));
    }

    #[test]
    fn test_email_pattern_is_loose() {
        for email in ["amira@example.com.", "Amira <amira@example.com>", " amira@mail.example.eg "] {
            let form = CheckoutForm {
                email: email.to_owned(),
                ..valid_form()
            };
            assert_eq!(form.validate().get("email"), None, "{email}");
        }
        for email in ["amira@example", "amira @example.com", "@.x"] {
            let form = CheckoutForm {
                email: email.to_owned(),
                ..valid_form()
            };
            assert_eq!(form.validate().get("email"), Some(&"Email is invalid"), "{email}");
        }
    }

    #[test]
    fn test_phone_digit_count() {
        for (phone, ok) in [
            ("0100123456", true),
            ("+20 (100) 123-4567", true),
            ("012345678", false),
            ("1234567890123", false),
        ] {
            let form = CheckoutForm {
                phone: phone.to_owned(),
                ..valid_form()
            };
            assert_eq!(form.validate().is_empty(), ok, "phone {phone}");
        }
    }

    #[test]
    fn test_card_field_formats() {
        let form = CheckoutForm {
            card_number: "4242 4242 4242".to_owned(),
            expiration_date: "13/28".to_owned(),
            security_code: "12a".to_owned(),
            ..valid_form()
        };
        let errors = form.validate();
        assert_eq!(
            errors.get("cardNumber"),
            Some(&"Please enter a valid 16-digit card number")
        );
        assert_eq!(errors.get("expirationDate"), Some(&"Format: MM/YY"));
        assert_eq!(errors.get("securityCode"), Some(&"Invalid security code"));
    }

    #[test]
    fn test_card_fields_ignored_for_other_methods() {
        let form = CheckoutForm {
            payment_method: PaymentMethod::Cod,
            card_number: String::new(),
            expiration_date: "garbage".to_owned(),
            security_code: String::new(),
            name_on_card: String::new(),
            ..valid_form()
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn test_format_card_number() {
        assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("4242-4242-42"), "4242 4242 42");
        assert_eq!(
            format_card_number("42424242424242429999"),
            "4242 4242 4242 4242"
        );
        assert_eq!(format_card_number("42a"), "42a");
        assert_eq!(format_card_number(""), "");
    }

    fn checkout() -> (CartService, CheckoutService) {
        let cart = CartService::new(Arc::new(MemoryStore::new()));
        (cart.clone(), CheckoutService::new(cart))
    }

    async fn fill_cart(cart: &CartService, user: &UserId) {
        let product = Product::from_document(&Document {
            path: DocumentPath::parse("kids/closes/Boys Pullovers/p1").unwrap(),
            data: json!({ "title": "Pullover", "price": { "amount": 450, "currencyCode": "EGP" } }),
        })
        .unwrap();
        cart.add_to_cart(user, &product, 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_order() {
        let (cart, checkout) = checkout();
        let user = UserId::parse("u1").unwrap();
        fill_cart(&cart, &user).await;

        let confirmation = checkout.submit_order(&user, &valid_form()).await.unwrap();
        assert!(confirmation.order_id.as_str().starts_with("ORD-"));
        assert_eq!(confirmation.message, ORDER_PLACED_MESSAGE);
        assert_eq!(confirmation.summary.item_count, 2);
        assert_eq!(confirmation.summary.subtotal.amount, Decimal::from(900));
        assert_eq!(confirmation.summary.transaction_id, None);
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_form() {
        let (cart, checkout) = checkout();
        let user = UserId::parse("u1").unwrap();
        fill_cart(&cart, &user).await;

        let form = CheckoutForm {
            city: String::new(),
            ..valid_form()
        };
        match checkout.submit_order(&user, &form).await {
            Err(CheckoutError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.get("city"), Some(&"City is required"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_with_paypal_is_deferred() {
        let (cart, checkout) = checkout();
        let user = UserId::parse("u1").unwrap();
        fill_cart(&cart, &user).await;

        let form = CheckoutForm {
            payment_method: PaymentMethod::Paypal,
            ..valid_form()
        };
        let result = checkout.submit_order(&user, &form).await;
        assert!(matches!(result, Err(CheckoutError::DeferredToPaymentWidget)));
    }

    #[tokio::test]
    async fn test_submit_empty_cart() {
        let (_, checkout) = checkout();
        let user = UserId::parse("u1").unwrap();
        let result = checkout.submit_order(&user, &valid_form()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(result.unwrap_err().to_string(), "Your cart is empty");
    }

    #[tokio::test]
    async fn test_widget_approval() {
        let (cart, checkout) = checkout();
        let user = UserId::parse("u1").unwrap();
        fill_cart(&cart, &user).await;

        let approval: WidgetApproval = serde_json::from_value(json!({
            "transactionId": "8XY12345",
            "payerName": "Amira"
        }))
        .unwrap();
        let confirmation = checkout.widget_approved(&user, &approval).await.unwrap();
        assert_eq!(confirmation.summary.payment_method, PaymentMethod::Paypal);
        assert_eq!(confirmation.summary.transaction_id.as_deref(), Some("8XY12345"));

        let blank = WidgetApproval {
            transaction_id: "  ".to_owned(),
            ..approval
        };
        assert!(matches!(
            checkout.widget_approved(&user, &blank).await,
            Err(CheckoutError::MissingTransactionId)
        ));
    }

    #[test]
    fn test_widget_failure_and_cancel() {
        let user = UserId::parse("u1").unwrap();
        let failed = CheckoutService::widget_failed(&user, &WidgetNotice::default());
        assert_eq!(failed.outcome, WidgetOutcome::Failed);
        assert_eq!(failed.message, Some(PAYMENT_FAILED_MESSAGE));

        let cancelled = CheckoutService::widget_cancelled(&user, &WidgetNotice::default());
        assert_eq!(cancelled.outcome, WidgetOutcome::Cancelled);
        assert_eq!(cancelled.message, None);
    }

    #[tokio::test]
    async fn test_page_lists_options() {
        let (_, checkout) = checkout();
        let page = checkout.page(&UserId::parse("u1").unwrap()).await.unwrap();
        assert!(page.cart.is_empty());
        assert_eq!(page.countries.len(), 3);
        assert!(page.governorates.iter().any(|g| g.value == "al-Minya" && g.label == "Minya"));
        assert_eq!(page.shipping_methods, &["Qibly"]);
    }
}
