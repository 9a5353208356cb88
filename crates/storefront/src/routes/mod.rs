//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (latest products)
//! GET  /health                        - Health check
//!
//! # Products
//! GET  /products?query&page           - Product grid
//! GET  /products/{id}                 - Product detail
//!
//! # Cart
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add to cart (signed-in visitors)
//! POST /cart/update                   - Set quantity
//! POST /cart/remove                   - Remove item
//! POST /cart/clear                    - Empty the cart
//! GET  /cart/count                    - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                      - Order summary
//! POST /checkout                      - Placeholder order submission
//!
//! # Auth
//! GET  /login?callbackUrl             - Login page
//! POST /login                         - Login action
//! GET  /register                      - Register page
//! POST /register                      - Register action
//! POST /logout                        - Logout action
//!
//! # Seller dashboard (requires auth)
//! GET  /dashboard                     - Overview
//! GET  /dashboard/listings            - Listings table
//! GET  /dashboard/listings/create     - Create form
//! POST /dashboard/listings/create     - Create action
//! POST /dashboard/listings/validate   - Inline field validation (fragment)
//! GET  /dashboard/listings/{id}/edit  - Edit form
//! POST /dashboard/listings/{id}/edit  - Update action
//! POST /dashboard/listings/{id}/delete - Delete action
//! GET  /dashboard/customers           - Profile page
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// Search and page parameters shared by paginated views.
///
/// `page` is taken as text so a malformed value falls back to page 1
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl ListQuery {
    /// Trimmed search text, empty when absent.
    #[must_use]
    pub fn search(&self) -> &str {
        self.query.as_deref().map_or("", str::trim)
    }

    /// Requested 1-indexed page.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the seller dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::overview))
        .route("/listings", get(dashboard::listings::index))
        .route(
            "/listings/create",
            get(dashboard::listings::create_page).post(dashboard::listings::create),
        )
        .route("/listings/validate", post(dashboard::listings::validate))
        .route(
            "/listings/{id}/edit",
            get(dashboard::listings::edit_page).post(dashboard::listings::update),
        )
        .route("/listings/{id}/delete", post(dashboard::listings::delete))
        .route("/customers", get(dashboard::profile::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .route("/checkout", get(checkout::show).post(checkout::submit))
        // Auth routes
        .merge(auth_routes())
        // Seller dashboard
        .nest("/dashboard", dashboard_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.search(), "");
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_list_query_tolerates_bad_page() {
        let query = ListQuery {
            query: Some("  lamp ".to_string()),
            page: Some("two".to_string()),
        };
        assert_eq!(query.search(), "lamp");
        assert_eq!(query.page(), 1);

        let query = ListQuery {
            query: None,
            page: Some("0".to_string()),
        };
        assert_eq!(query.page(), 1);
    }
}
