//! Checkout through the HTTP API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use souq_integration_tests::{TestApp, seed_catalog};

fn card_form() -> Value {
    json!({
        "email": "amira@example.com",
        "firstName": "Amira",
        "lastName": "Hassan",
        "address": "12 Nile St",
        "city": "Sohag",
        "phone": "01001234567",
        "paymentMethod": "creditCard",
        "cardNumber": "4242 4242 4242 4242",
        "expirationDate": "09/28",
        "securityCode": "123",
        "nameOnCard": "Amira Hassan"
    })
}

async fn shop_with_cart() -> TestApp {
    let mut app = TestApp::new();
    seed_catalog(&app).await;
    let added = app
        .post("/cart/add", &json!({ "productId": "p1", "quantity": 2 }))
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    app
}

#[tokio::test]
async fn test_checkout_page() {
    let mut app = shop_with_cart().await;

    let page = app.get("/checkout").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["cart"]["itemCount"], 2);
    assert_eq!(page.body["form"]["country"], "Egypt");
    assert_eq!(page.body["form"]["governorate"], "Sohag");
    assert_eq!(page.body["form"]["shippingMethod"], "Qibly");
    assert_eq!(page.body["form"]["paymentMethod"], "creditCard");
    assert_eq!(page.body["countries"].as_array().unwrap().len(), 3);
    assert_eq!(page.body["governorates"].as_array().unwrap().len(), 23);
    assert_eq!(
        page.body["paymentMethods"],
        json!(["creditCard", "paypal", "valU", "cod"])
    );
}

#[tokio::test]
async fn test_invalid_form_lists_fields() {
    let mut app = shop_with_cart().await;

    let response = app.post("/checkout", &json!({})).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &response.body["fields"];
    assert_eq!(fields["email"], "Email is required");
    assert_eq!(fields["firstName"], "First name is required");
    assert_eq!(fields["phone"], "Phone number is required");
    assert_eq!(fields["cardNumber"], "Card number is required");

    let mut form = card_form();
    form["expirationDate"] = json!("13/28");
    form["email"] = json!("amira@example");
    let response = app.post("/checkout", &form).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["fields"]["expirationDate"], "Format: MM/YY");
    assert_eq!(response.body["fields"]["email"], "Email is invalid");
    assert!(response.body["fields"].get("cardNumber").is_none());
}

#[tokio::test]
async fn test_card_order_is_placed() {
    let mut app = shop_with_cart().await;

    let response = app.post("/checkout", &card_form()).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(response.body["message"], "Order placed successfully!");
    assert_eq!(response.body["summary"]["itemCount"], 2);
    assert_eq!(response.body["summary"]["paymentMethod"], "creditCard");
    assert_eq!(response.body["summary"]["shippingMethod"], "Qibly");
}

#[tokio::test]
async fn test_cash_on_delivery_skips_card_fields() {
    let mut app = shop_with_cart().await;

    let form = json!({
        "email": "amira@example.com",
        "firstName": "Amira",
        "lastName": "Hassan",
        "address": "12 Nile St",
        "city": "Sohag",
        "phone": "01001234567",
        "paymentMethod": "cod"
    });
    let response = app.post("/checkout", &form).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["summary"]["paymentMethod"], "cod");
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let mut app = TestApp::new();
    seed_catalog(&app).await;

    let response = app.post("/checkout", &card_form()).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "Your cart is empty");
}

#[tokio::test]
async fn test_paypal_goes_through_the_widget() {
    let mut app = shop_with_cart().await;

    let mut form = card_form();
    form["paymentMethod"] = json!("paypal");
    let deferred = app.post("/checkout", &form).await;
    assert_eq!(deferred.status, StatusCode::CONFLICT);

    let missing = app
        .post("/checkout/paypal/approve", &json!({ "transactionId": "  " }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let approved = app
        .post(
            "/checkout/paypal/approve",
            &json!({ "transactionId": "TX-1", "payerName": "Amira", "form": form }),
        )
        .await;
    assert_eq!(approved.status, StatusCode::CREATED);
    assert_eq!(approved.body["summary"]["paymentMethod"], "paypal");
    assert_eq!(approved.body["summary"]["transactionId"], "TX-1");
}

#[tokio::test]
async fn test_widget_failure_and_cancel() {
    let mut app = shop_with_cart().await;

    let failed = app.post_raw("/checkout/paypal/error", "").await;
    assert_eq!(failed.status, StatusCode::OK);
    assert_eq!(failed.body["outcome"], "failed");
    assert_eq!(
        failed.body["message"],
        "Payment failed. Please try another payment method."
    );

    let cancelled = app
        .post("/checkout/paypal/cancel", &json!({ "details": { "orderID": "X" } }))
        .await;
    assert_eq!(cancelled.body["outcome"], "cancelled");
    assert!(cancelled.body.get("message").is_none());

    // Neither touches the cart
    assert_eq!(app.get("/cart/count").await.body["count"], 2);
}

#[tokio::test]
async fn test_format_card() {
    let mut app = TestApp::new();

    let response = app
        .post("/checkout/format-card", &json!({ "cardNumber": "4242424242424242" }))
        .await;
    assert_eq!(response.body["formatted"], "4242 4242 4242 4242");

    let short = app
        .post("/checkout/format-card", &json!({ "cardNumber": "42" }))
        .await;
    assert_eq!(short.body["formatted"], "42");
}
