//! Display data shared by templates.
//!
//! Handlers turn domain types into these flat structs so templates only deal
//! with strings, numbers and options.

use easytrade_core::{CartItem, PageMarker, Pagination, Product};

use crate::stores::{CartStore, SessionStore, Storage};

/// Header data present on every page.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub cart_count: u64,
    pub username: Option<String>,
    /// Path of the page being rendered, sent back on logout.
    pub current_path: String,
}

impl Chrome {
    #[must_use]
    pub fn new<S: Storage>(
        cart: &CartStore<S>,
        session: &SessionStore<S>,
        current_path: impl Into<String>,
    ) -> Self {
        Self {
            cart_count: cart.item_count(),
            username: session.user().map(|u| u.username.clone()),
            current_path: current_path.into(),
        }
    }
}

/// Detail page path for a product, with the id encoded as one path segment.
#[must_use]
pub fn product_path(id: &impl std::fmt::Display) -> String {
    format!("/products/{}", urlencoding::encode(&id.to_string()))
}

/// Dashboard path of a listing; append `/edit` or `/delete`.
#[must_use]
pub fn listing_path(id: &impl std::fmt::Display) -> String {
    format!("/dashboard/listings/{}", urlencoding::encode(&id.to_string()))
}

/// Product as shown in grids, tables and detail pages.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub href: String,
    pub listing_href: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    /// Raw amount for form inputs (e.g. `249.50`).
    pub price_input: String,
    pub image_url: Option<String>,
    pub seller: Option<String>,
    pub listed_on: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            href: product_path(&product.id),
            listing_href: listing_path(&product.id),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            price_input: product.price.to_string(),
            image_url: product.display_image().map(String::from),
            seller: product.seller_username.clone(),
            listed_on: product
                .created_at
                .map(|at| at.format("%-d %b %Y").to_string()),
        }
    }
}

/// Convert a list of products for display.
#[must_use]
pub fn product_views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(ProductView::from).collect()
}

/// One cart line.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product: ProductView,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            product: ProductView::from(&item.product),
            quantity: item.quantity,
            line_total: easytrade_core::CurrencyCode::default().format(item.line_total()),
        }
    }
}

/// A page link or gap in the pagination control.
#[derive(Debug, Clone)]
pub struct PageLink {
    /// `None` renders as an ellipsis.
    pub page: Option<u32>,
    pub href: String,
    pub current: bool,
}

/// Pagination control data.
#[derive(Debug, Clone)]
pub struct PaginationView {
    pub visible: bool,
    pub links: Vec<PageLink>,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl PaginationView {
    /// Build links for `path`, keeping `query` when it is not empty.
    #[must_use]
    pub fn new(pagination: Pagination, path: &str, query: &str) -> Self {
        let href = |page: u32| {
            if query.is_empty() {
                format!("{path}?page={page}")
            } else {
                format!("{path}?query={}&page={page}", urlencoding::encode(query))
            }
        };

        let links = pagination
            .markers()
            .into_iter()
            .map(|marker| match marker {
                PageMarker::Page(page) => PageLink {
                    page: Some(page),
                    href: href(page),
                    current: page == pagination.current,
                },
                PageMarker::Ellipsis => PageLink {
                    page: None,
                    href: String::new(),
                    current: false,
                },
            })
            .collect();

        Self {
            visible: pagination.is_visible(),
            links,
            previous_href: pagination
                .has_previous()
                .then(|| href(pagination.previous())),
            next_href: pagination.has_next().then(|| href(pagination.next())),
        }
    }
}
