//! Marketplace API client.
//!
//! # Architecture
//!
//! - Plain REST/JSON over `reqwest`; the marketplace API is the source of truth
//! - Every call goes through one request primitive ([`MarketplaceClient::send`])
//!   which normalizes error bodies into [`ApiError`]
//! - Read views are cached in memory via `moka` and revalidated after writes
//!
//! # Example
//!
//! ```rust,ignore
//! use easytrade_storefront::api::{MarketplaceClient, Revalidate};
//!
//! let client = MarketplaceClient::new(&config.api)?;
//!
//! let page = client.list_products("lamp", 1, 6).await;
//! let product = client.get_product(&id).await?;
//!
//! client.revalidate(&[Revalidate::Catalog, Revalidate::Product(id)]);
//! ```

mod auth;
mod cache;
mod products;
mod users;

pub use auth::{Authenticated, RegisterRequest};
pub use products::{DeleteResponse, ListingPayload};
pub use cache::Revalidate;

use std::collections::BTreeMap;
use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;
use cache::{CacheKey, CacheValue, Generations};

/// Errors that can occur when talking to the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout).
    #[error("could not reach the marketplace: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{message}")]
    Status {
        status: StatusCode,
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    /// The response body was not the JSON we expected.
    #[error("unexpected response from the marketplace: {0}")]
    Decode(String),

    /// The response decoded but is missing data the caller needs.
    #[error("{0}")]
    Incomplete(&'static str),

    /// The request body could not be encoded.
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The endpoint could not be turned into a URL.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Status {
                status, message, ..
            } => *status == StatusCode::NOT_FOUND || message.to_lowercase().contains("not found"),
            _ => false,
        }
    }

    /// Message suitable for showing to a visitor.
    ///
    /// Transport failures get a generic retry hint; API messages are shown
    /// as-is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => {
                "Could not reach the marketplace. Please try again in a moment.".to_string()
            }
            Self::Status { message, .. } => message.clone(),
            Self::Incomplete(message) => (*message).to_string(),
            Self::Decode(_) | Self::Encode(_) | Self::Endpoint(_) => {
                "The marketplace returned an unexpected response.".to_string()
            }
        }
    }

    /// Build an error from a non-success response body.
    ///
    /// The message is taken from `message`, then `error`, then the raw body,
    /// then a generic status line.
    fn from_response(status: StatusCode, body: &str) -> Self {
        let json = serde_json::from_str::<Value>(body).ok();

        let message = json
            .as_ref()
            .and_then(|v| text_field(v, "message").or_else(|| text_field(v, "error")))
            .or_else(|| {
                let trimmed = body.trim();
                (json.is_none() && !trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

        let field_errors = json
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(Value::as_object)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|(field, value)| {
                        flatten_message(value).map(|message| (field.clone(), message))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self::Status {
            status,
            message,
            field_errors,
        }
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}

fn flatten_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        _ => None,
    }
}

/// A single call to the marketplace API.
#[derive(Debug)]
pub struct ApiRequest<'a> {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
    token: Option<&'a SecretString>,
}

impl<'a> ApiRequest<'a> {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter (values are URL-encoded).
    #[must_use]
    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send a bearer token, if there is one.
    #[must_use]
    pub const fn bearer(mut self, token: Option<&'a SecretString>) -> Self {
        self.token = token;
        self
    }
}

// =============================================================================
// MarketplaceClient
// =============================================================================

/// Client for the marketplace REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the read cache.
#[derive(Clone)]
pub struct MarketplaceClient {
    inner: Arc<MarketplaceClientInner>,
}

struct MarketplaceClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
    generations: Generations,
}

impl MarketplaceClient {
    /// Create a new marketplace API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("easytrade-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .support_invalidation_closures()
            .build();

        Ok(Self {
            inner: Arc::new(MarketplaceClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
                generations: Generations::default(),
            }),
        })
    }

    fn url_for(&self, request: &ApiRequest<'_>) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.inner.base_url, request.path))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issue a request and decode the JSON response.
    ///
    /// Returns `Ok(None)` for `204 No Content` (and empty success bodies).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response arrives,
    /// [`ApiError::Status`] for non-success statuses, and
    /// [`ApiError::Decode`] when the body does not match `T`.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest<'_>,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url_for(&request)?;
        debug!(%url, "Marketplace API request");

        let mut builder = self
            .inner
            .client
            .request(request.method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = request.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_response(status, &text);
            warn!(status = %status, error = %error, "Marketplace API returned non-success status");
            return Err(error);
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|e| {
            warn!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse marketplace API response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    /// Like [`send`](Self::send), but an empty response is an error.
    async fn send_expecting<T: DeserializeOwned>(
        &self,
        request: ApiRequest<'_>,
    ) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .ok_or_else(|| ApiError::Decode("empty response body".to_string()))
    }

    /// Cache a fetched value unless `key` was revalidated since `stamp`.
    async fn store_fresh(&self, key: CacheKey, value: CacheValue, stamp: u64) {
        let generations = &self.inner.generations;
        if generations.stamp(&key) != stamp {
            debug!(?key, "Revalidated during fetch, not caching");
            return;
        }
        self.inner.cache.insert(key.clone(), value).await;
        // A revalidation between the check and the insert may predate it.
        if generations.stamp(&key) != stamp {
            self.inner.cache.invalidate(&key).await;
        }
    }

    /// Drop cached reads so the next render refetches them.
    pub fn revalidate(&self, targets: &[Revalidate]) {
        for target in targets {
            self.inner.generations.bump(target);
            let target = target.clone();
            debug!(?target, "Revalidating cached reads");
            if let Err(e) = self
                .inner
                .cache
                .invalidate_entries_if(move |key, _| target.matches(key))
            {
                warn!(error = %e, "Failed to register cache invalidation");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    pub(super) fn client_for(server: &MockServer) -> MarketplaceClient {
        MarketplaceClient::new(&ApiConfig::new(Url::parse(&server.uri()).unwrap())).unwrap()
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Name taken","error":"Bad Request"}"#,
        );
        assert_eq!(err.to_string(), "Name taken");
    }

    #[test]
    fn test_error_message_falls_back_to_error_field() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid credentials"}"#);
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_text() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.to_string(), "request failed with status 500");

        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "{}");
        assert_eq!(err.to_string(), "request failed with status 500");
    }

    #[test]
    fn test_field_errors_are_collected() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Invalid","errors":{"price":"must be positive","name":["too","short"]}}"#,
        );
        let ApiError::Status { field_errors, .. } = err else {
            panic!("expected status error");
        };
        assert_eq!(field_errors["price"], "must be positive");
        assert_eq!(field_errors["name"], "too short");
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ApiError::from_response(StatusCode::NOT_FOUND, "").is_not_found());
        assert!(
            ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"message":"Product Not Found"}"#)
                .is_not_found()
        );
        assert!(!ApiError::from_response(StatusCode::FORBIDDEN, "").is_not_found());
    }

    #[tokio::test]
    async fn test_send_sets_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(json!({"hello": "world"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let token = SecretString::from("tok-123");
        let value: Option<Value> = client_for(&server)
            .send(
                ApiRequest::post("/api/echo")
                    .json(json!({"hello": "world"}))
                    .bearer(Some(&token)),
            )
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_send_encodes_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("search", "desk lamp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let value: Option<Value> = client_for(&server)
            .send(ApiRequest::get("/api/products").query("search", "desk lamp"))
            .await
            .unwrap();
        assert_eq!(value, Some(json!([])));
    }

    #[tokio::test]
    async fn test_no_content_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let value: Option<Value> = client_for(&server)
            .send(ApiRequest::delete("/api/products/1"))
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_status_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"message": "You do not own this listing"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send::<Value>(ApiRequest::delete("/api/products/1"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "You do not own this listing");
        assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct() {
        // Nothing listens on the discard port.
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let err = MarketplaceClient::new(&config)
            .unwrap()
            .send::<Value>(ApiRequest::get("/api/products"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.user_message().contains("try again"));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send::<Value>(ApiRequest::get("/api/products"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
