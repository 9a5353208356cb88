//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::middleware::{ShoppingCart, Visitor};
use crate::state::AppState;
use crate::views::{Chrome, ProductView, product_views};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub latest: Vec<ProductView>,
}

/// Display the home page with the newest listings.
#[instrument(skip(state, cart, session))]
pub async fn home(
    State(state): State<AppState>,
    ShoppingCart(cart): ShoppingCart,
    Visitor(session): Visitor,
) -> HomeTemplate {
    let latest = state
        .marketplace()
        .latest_products(state.config().catalog.latest_limit)
        .await;

    HomeTemplate {
        chrome: Chrome::new(&cart, &session, "/"),
        latest: product_views(&latest),
    }
}
