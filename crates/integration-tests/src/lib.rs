//! Integration tests for Souq.
//!
//! The storefront router is driven in-process over the in-memory document
//! store, so no database or running server is needed:
//!
//! ```bash
//! cargo test -p souq-integration-tests
//! ```
//!
//! [`TestApp`] plays one browser: it keeps the session cookie between
//! requests. Two `TestApp::shopper` handles on the same app are two
//! shoppers sharing one catalog.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use souq_core::UserId;
use souq_storefront::build_router;
use souq_storefront::config::StorefrontConfig;
use souq_storefront::services::IdentityVerifier;
use souq_storefront::state::AppState;
use souq_storefront::store::{DocumentStore, MemoryStore};

/// Secret the test storefront shares with its identity provider.
pub const IDENTITY_SECRET: &str = "integration-tests-identity-secret";

/// Largest response body read by the helpers.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A response with its body decoded as JSON (`Value::Null` when empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// An in-process storefront plus one shopper's cookie jar.
pub struct TestApp {
    router: Router,
    store: MemoryStore,
    config: StorefrontConfig,
    cookie: Option<String>,
}

impl TestApp {
    /// A storefront over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let config = StorefrontConfig {
            identity_secret: Some(SecretString::from(IDENTITY_SECRET.to_owned())),
            ..StorefrontConfig::default()
        };
        let store = MemoryStore::new();
        let state = AppState::in_memory(config.clone(), store.clone());
        Self {
            router: build_router(state),
            store,
            config,
            cookie: None,
        }
    }

    /// Another shopper on the same storefront, starting without a session.
    #[must_use]
    pub fn shopper(&self) -> Self {
        Self {
            router: self.router.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            cookie: None,
        }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// The identity provider's token for `user_id`.
    ///
    /// # Panics
    ///
    /// Panics if the id is not a valid key.
    #[must_use]
    pub fn identity_token(user_id: &str) -> String {
        IdentityVerifier::new(SecretString::from(IDENTITY_SECRET.to_owned()))
            .sign(&UserId::parse(user_id).expect("valid user id"))
            .expect("sign identity")
    }

    /// Write a product document into the configured catalog collection.
    ///
    /// # Panics
    ///
    /// Panics if the id is not a valid key or the write fails.
    pub async fn seed_product(&self, id: &str, data: Value) {
        let path = self
            .config
            .catalog_collection
            .doc(id)
            .expect("valid product id");
        self.store.set(&path, data).await.expect("seed product");
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body.to_string())).await
    }

    /// Send a POST request with a raw body.
    pub async fn post_raw(&mut self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(body.to_owned())).await
    }

    /// Send a request and return the raw response, keeping the cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn request(&mut self, request: Request<Body>) -> axum::response::Response {
        let mut request = request;
        if let Some(cookie) = &self.cookie {
            request.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("cookie header value"),
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let session_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|pair| pair.trim().to_owned());
        if session_cookie.is_some() {
            self.cookie = session_cookie;
        }
        response
    }

    /// The session cookie currently held, as `name=value`.
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<String>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self.request(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A small catalog: two in stock, one sold out.
pub async fn seed_catalog(app: &TestApp) {
    app.seed_product(
        "p1",
        serde_json::json!({
            "title": "Striped Pullover",
            "price": { "amount": 1500, "currencyCode": "EGP" },
            "category": "boys",
            "brand": ["Acme"],
            "sizes": ["\"4Y\"", "6Y"],
            "colors": ["Navy"],
            "in_stock": true,
            "quantity": 4
        }),
    )
    .await;
    app.seed_product(
        "p2",
        serde_json::json!({
            "title": "Wool Cardigan",
            "price": { "amount": "250", "currencyCode": "EGP" },
            "brand": "Nile Knits",
            "sizes": ["8Y"],
            "colors": ["Red", "Navy"],
            "quantity": 2
        }),
    )
    .await;
    app.seed_product(
        "p3",
        serde_json::json!({
            "title": "Hooded Sweater",
            "price": 900,
            "brand": ["Acme"],
            "sizes": ["6Y"],
            "in_stock": false,
            "quantity": 0
        }),
    )
    .await;
}
