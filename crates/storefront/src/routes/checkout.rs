//! Checkout route handlers.
//!
//! Orders are never submitted: the marketplace API has no order endpoint, so
//! placing an order only reports what would have been sent. The cart is left
//! untouched.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::{IntoResponse, Redirect, Response};
use easytrade_core::CurrencyCode;
use tracing::{info, instrument};

use crate::filters;
use crate::middleware::{RequireAuth, ShoppingCart};
use crate::views::{CartLineView, Chrome};

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub chrome: Chrome,
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    pub total: String,
    pub notice: Option<String>,
}

fn render(auth: &RequireAuth, cart: &ShoppingCart, notice: Option<String>) -> Response {
    let ShoppingCart(cart) = cart;
    CheckoutTemplate {
        chrome: Chrome::new(cart, &auth.session, "/checkout"),
        lines: cart.items().iter().map(CartLineView::from).collect(),
        item_count: cart.item_count(),
        total: CurrencyCode::default().format(cart.cart_total()),
        notice,
    }
    .into_response()
}

/// Display the order summary. An empty cart goes back to the cart page.
#[instrument(skip_all, fields(username = %auth.user.username))]
pub async fn show(auth: RequireAuth, cart: ShoppingCart) -> Response {
    if cart.0.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }
    render(&auth, &cart, None)
}

/// Pretend to place the order.
#[instrument(skip_all, fields(username = %auth.user.username))]
pub async fn submit(auth: RequireAuth, cart: ShoppingCart) -> Response {
    if cart.0.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let notice = format!(
        "Placeholder: Placing order for {} items, total {}. Backend integration needed!",
        cart.0.item_count(),
        CurrencyCode::default().format(cart.0.cart_total()),
    );
    info!(items = cart.0.item_count(), "Checkout submitted (not sent)");

    render(&auth, &cart, Some(notice))
}
