//! Integration tests for EasyTrade.
//!
//! Each test starts an in-process fake of the marketplace REST API and a
//! storefront pointed at it, both on ephemeral ports, and drives the
//! storefront with a cookie-keeping HTTP client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p easytrade-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use easytrade_storefront::config::StorefrontConfig;
use easytrade_storefront::state::AppState;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A listing held by the fake marketplace.
#[derive(Debug, Clone)]
pub struct FakeProduct {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub seller: String,
}

impl FakeProduct {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "price": self.price,
            "sellerUsername": self.seller,
            "createdAt": format!("2024-05-{:02}T10:00:00Z", (self.id % 28) + 1),
        })
    }
}

#[derive(Debug, Clone)]
struct FakeUser {
    id: u64,
    username: String,
    password: String,
    email: String,
}

#[derive(Debug, Default)]
struct MarketplaceData {
    products: Vec<FakeProduct>,
    users: Vec<FakeUser>,
    next_id: u64,
}

/// In-memory stand-in for the marketplace REST API.
#[derive(Debug, Clone, Default)]
pub struct FakeMarketplace {
    data: Arc<Mutex<MarketplaceData>>,
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn token_for(username: &str) -> String {
    format!("token-{username}")
}

impl FakeMarketplace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MarketplaceData> {
        // A panicking handler only poisons test data; keep serving it.
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a user who can log in with `password`.
    pub fn add_user(&self, username: &str, password: &str) -> u64 {
        let mut data = self.lock();
        data.next_id += 1;
        let id = data.next_id;
        data.users.push(FakeUser {
            id,
            username: username.to_string(),
            password: password.to_string(),
            email: format!("{username}@example.com"),
        });
        id
    }

    /// List a product for `seller` and return its id.
    pub fn add_product(&self, seller: &str, name: &str, price: f64) -> u64 {
        let mut data = self.lock();
        data.next_id += 1;
        let id = data.next_id;
        data.products.push(FakeProduct {
            id,
            name: name.to_string(),
            description: None,
            price,
            seller: seller.to_string(),
        });
        id
    }

    /// Snapshot of the stored products.
    #[must_use]
    pub fn products(&self) -> Vec<FakeProduct> {
        self.lock().products.clone()
    }

    fn username_for(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?
            .to_string();
        self.lock()
            .users
            .iter()
            .find(|u| token_for(&u.username) == token)
            .map(|u| u.username.clone())
    }

    fn router(self) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/products", get(list_products).post(create_product))
            .route(
                "/api/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/api/users/{id}", get(get_user))
            .with_state(self)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    search: Option<String>,
    seller_username: Option<String>,
    #[serde(default)]
    page: usize,
    size: Option<usize>,
}

async fn list_products(
    State(fake): State<FakeMarketplace>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let data = fake.lock();
    let mut matches: Vec<&FakeProduct> = data
        .products
        .iter()
        .filter(|p| {
            params
                .search
                .as_deref()
                .is_none_or(|s| p.name.to_lowercase().contains(&s.to_lowercase()))
        })
        .filter(|p| params.seller_username.as_deref().is_none_or(|s| p.seller == s))
        .collect();
    matches.sort_by(|a, b| b.id.cmp(&a.id));

    let size = params.size.unwrap_or(10).max(1);
    let total = matches.len();
    let content: Vec<Value> = matches
        .into_iter()
        .skip(params.page * size)
        .take(size)
        .map(FakeProduct::to_json)
        .collect();

    Json(json!({
        "content": content,
        "totalPages": total.div_ceil(size),
        "totalElements": total,
    }))
}

async fn get_product(State(fake): State<FakeMarketplace>, Path(id): Path<u64>) -> Response {
    fake.lock()
        .products
        .iter()
        .find(|p| p.id == id)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Product not found"),
            |p| Json(p.to_json()).into_response(),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingBody {
    name: String,
    description: Option<String>,
    price: Option<f64>,
}

async fn create_product(
    State(fake): State<FakeMarketplace>,
    headers: HeaderMap,
    Json(body): Json<ListingBody>,
) -> Response {
    let Some(seller) = fake.username_for(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let id = fake.add_product(&seller, &body.name, body.price.unwrap_or_default());
    let mut data = fake.lock();
    let Some(product) = data.products.iter_mut().find(|p| p.id == id) else {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Product vanished");
    };
    product.description = body.description;
    (StatusCode::CREATED, Json(product.to_json())).into_response()
}

async fn update_product(
    State(fake): State<FakeMarketplace>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<ListingBody>,
) -> Response {
    let caller = fake.username_for(&headers);
    let mut data = fake.lock();
    let Some(product) = data.products.iter_mut().find(|p| p.id == id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    if caller.as_deref() != Some(product.seller.as_str()) {
        return error(StatusCode::FORBIDDEN, "You can only edit your own products.");
    }
    product.name = body.name;
    product.description = body.description;
    if let Some(price) = body.price {
        product.price = price;
    }
    Json(product.to_json()).into_response()
}

async fn delete_product(
    State(fake): State<FakeMarketplace>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let caller = fake.username_for(&headers);
    let mut data = fake.lock();
    let Some(index) = data.products.iter().position(|p| p.id == id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    if data
        .products
        .get(index)
        .is_none_or(|p| caller.as_deref() != Some(p.seller.as_str()))
    {
        return error(StatusCode::FORBIDDEN, "You can only delete your own products.");
    }
    data.products.remove(index);
    Json(json!({ "message": format!("Product {id} deleted.") })).into_response()
}

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(State(fake): State<FakeMarketplace>, Json(body): Json<Credentials>) -> Response {
    fake.lock()
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .map_or_else(
            || error(StatusCode::UNAUTHORIZED, "Invalid username or password"),
            |u| {
                Json(json!({
                    "userId": u.id,
                    "username": u.username,
                    "token": token_for(&u.username),
                }))
                .into_response()
            },
        )
}

#[derive(Debug, Deserialize)]
struct Registration {
    username: String,
    password: String,
}

async fn register(
    State(fake): State<FakeMarketplace>,
    Json(body): Json<Registration>,
) -> Response {
    if fake.lock().users.iter().any(|u| u.username == body.username) {
        return error(StatusCode::CONFLICT, "Username is already taken");
    }
    fake.add_user(&body.username, &body.password);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully!" })),
    )
        .into_response()
}

async fn get_user(
    State(fake): State<FakeMarketplace>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if fake.username_for(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    fake.lock()
        .users
        .iter()
        .find(|u| u.id == id)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "User not found"),
            |u| {
                Json(json!({
                    "id": u.id,
                    "name": "Test",
                    "surname": "Seller",
                    "username": u.username,
                    "email": u.email,
                    "verified": true,
                    "createdAt": "2024-03-01T10:00:00Z",
                }))
                .into_response()
            },
        )
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server error");
    });
    addr
}

/// A running storefront wired to a fake marketplace.
pub struct TestContext {
    pub marketplace: FakeMarketplace,
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Start both servers with an empty marketplace.
    pub async fn new() -> Self {
        let marketplace = FakeMarketplace::new();
        let api_addr = serve(marketplace.clone().router()).await;

        let vars: HashMap<&str, String> = HashMap::from([
            ("EASYTRADE_API_BASE_URL", format!("http://{api_addr}")),
            ("EASYTRADE_CACHE_TTL_SECS", "60".to_string()),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("Invalid test configuration");
        let state = AppState::new(config).expect("Failed to build storefront state");
        let storefront_addr = serve(easytrade_storefront::app(state)).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            marketplace,
            client,
            base_url: format!("http://{storefront_addr}"),
        }
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Submit a form and return the final response after redirects.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Request to storefront failed")
    }

    /// Fetch a page and return the final response after redirects.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request to storefront failed")
    }

    /// Log in through the storefront's login form.
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }
}
