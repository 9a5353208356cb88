//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Form posts redirect back to the
//! cart page; requests sent by HTMX get the cart count badge instead, with an
//! `HX-Trigger` so other elements can refresh.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use easytrade_core::{CurrencyCode, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{ShoppingCart, Visitor, login_redirect};
use crate::state::AppState;
use crate::stores::{CartStore, SessionStorage};
use crate::views::{CartLineView, Chrome, product_path};

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    /// Missing, blank or zero quantities count as one.
    #[serde(default)]
    pub quantity: Option<String>,
}

impl AddToCartForm {
    fn quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: Chrome,
    pub lines: Vec<CartLineView>,
    pub total: String,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Response after a cart mutation.
fn after_change(headers: &HeaderMap, cart: &CartStore<SessionStorage>) -> Response {
    if is_htmx(headers) {
        return (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response();
    }
    Redirect::to("/cart").into_response()
}

/// Display cart page.
#[instrument(skip(cart, session))]
pub async fn show(ShoppingCart(cart): ShoppingCart, Visitor(session): Visitor) -> CartShowTemplate {
    CartShowTemplate {
        chrome: Chrome::new(&cart, &session, "/cart"),
        lines: cart.items().iter().map(CartLineView::from).collect(),
        total: CurrencyCode::default().format(cart.cart_total()),
    }
}

/// Add a product to the cart.
///
/// Signed-out visitors are sent to log in first, and brought back to the
/// product afterwards. The product is fetched so the cart holds the
/// marketplace's copy rather than anything posted by the browser.
#[instrument(skip(state, cart, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    ShoppingCart(mut cart): ShoppingCart,
    Visitor(session): Visitor,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id.trim());
    let detail_path = product_path(&id);

    if !session.is_authenticated() {
        session.remember_destination(&detail_path).await?;
        return Ok(Redirect::to(&login_redirect(&detail_path)).into_response());
    }

    let product = state
        .marketplace()
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    cart.add_to_cart(product, form.quantity()).await?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));

    Ok(after_change(&headers, &cart))
}

/// Set an item's quantity; zero or less removes it.
#[instrument(skip(cart, headers))]
pub async fn update(
    ShoppingCart(mut cart): ShoppingCart,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let quantity = form
        .quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest("Quantity must be a whole number.".to_string()))?;

    cart.update_quantity(&ProductId::new(form.product_id), quantity)
        .await?;
    Ok(after_change(&headers, &cart))
}

/// Remove an item.
#[instrument(skip(cart, headers))]
pub async fn remove(
    ShoppingCart(mut cart): ShoppingCart,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    cart.remove_from_cart(&ProductId::new(form.product_id))
        .await?;
    Ok(after_change(&headers, &cart))
}

/// Empty the cart.
#[instrument(skip(cart, headers))]
pub async fn clear(ShoppingCart(mut cart): ShoppingCart, headers: HeaderMap) -> Result<Response> {
    cart.clear_cart().await?;
    Ok(after_change(&headers, &cart))
}

/// Get cart count badge (HTMX).
#[instrument(skip(cart))]
pub async fn count(ShoppingCart(cart): ShoppingCart) -> CartCountTemplate {
    CartCountTemplate {
        count: cart.item_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(quantity: Option<&str>) -> AddToCartForm {
        AddToCartForm {
            product_id: "1".to_string(),
            quantity: quantity.map(String::from),
        }
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        assert_eq!(form(None).quantity(), 1);
        assert_eq!(form(Some("")).quantity(), 1);
        assert_eq!(form(Some("0")).quantity(), 1);
        assert_eq!(form(Some("-2")).quantity(), 1);
        assert_eq!(form(Some("3")).quantity(), 3);
    }
}
