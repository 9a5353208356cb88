//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use easytrade_core::{Pagination, ProductId};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{ShoppingCart, Visitor};
use crate::routes::ListQuery;
use crate::state::AppState;
use crate::views::{Chrome, PaginationView, ProductView, product_path, product_views};

/// Product grid template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub query: String,
    pub products: Vec<ProductView>,
    pub pagination: PaginationView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: Chrome,
    pub product: ProductView,
    pub in_cart: u32,
}

/// Shown when a product id does not resolve.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub chrome: Chrome,
    pub id: String,
}

/// Display the product grid.
#[instrument(skip(state, cart, session))]
pub async fn index(
    State(state): State<AppState>,
    ShoppingCart(cart): ShoppingCart,
    Visitor(session): Visitor,
    Query(query): Query<ListQuery>,
) -> ProductsIndexTemplate {
    let page = query.page();
    let results = state
        .marketplace()
        .list_products(query.search(), page, state.config().catalog.page_size)
        .await;

    ProductsIndexTemplate {
        chrome: Chrome::new(&cart, &session, "/products"),
        query: query.search().to_string(),
        products: product_views(&results.items),
        pagination: PaginationView::new(
            Pagination::new(page, results.total_pages),
            "/products",
            query.search(),
        ),
    }
}

/// Display a product.
#[instrument(skip(state, cart, session))]
pub async fn show(
    State(state): State<AppState>,
    ShoppingCart(cart): ShoppingCart,
    Visitor(session): Visitor,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let chrome = Chrome::new(&cart, &session, product_path(&id));

    let Some(product) = state.marketplace().get_product(&id).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            ProductNotFoundTemplate {
                chrome,
                id: id.to_string(),
            },
        )
            .into_response());
    };

    add_breadcrumb("navigation", "Viewed product", Some(&[("product_id", id.as_str())]));

    Ok(ProductShowTemplate {
        chrome,
        in_cart: cart.cart().quantity_of(&product.id),
        product: ProductView::from(&product),
    }
    .into_response())
}
