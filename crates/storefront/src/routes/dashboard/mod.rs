//! Seller dashboard route handlers.
//!
//! Every handler here requires a signed-in seller (see [`RequireAuth`]).

pub mod listings;
pub mod profile;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use easytrade_core::DashboardSummary;
use tracing::instrument;

use crate::filters;
use crate::middleware::{RequireAuth, ShoppingCart};
use crate::state::AppState;
use crate::views::{Chrome, ProductView, product_views};

/// Dashboard overview template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/overview.html")]
pub struct OverviewTemplate {
    pub chrome: Chrome,
    pub summary: DashboardSummary,
    pub latest: Vec<ProductView>,
    pub my_latest: Vec<ProductView>,
}

/// Display the seller overview.
#[instrument(skip_all, fields(username = %auth.user.username))]
pub async fn overview(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
) -> OverviewTemplate {
    let client = state.marketplace();
    let limit = state.config().catalog.latest_limit;
    let username = auth.user.username.as_str();

    let (summary, latest, my_latest) = tokio::join!(
        client.dashboard_summary(Some(username)),
        client.latest_products(limit),
        client.seller_latest_listings(username, limit),
    );

    OverviewTemplate {
        chrome: Chrome::new(&cart, &auth.session, "/dashboard"),
        summary,
        latest: product_views(&latest),
        my_latest: product_views(&my_latest),
    }
}
