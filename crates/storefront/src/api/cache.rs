//! Cache types for marketplace API reads.

use std::sync::atomic::{AtomicU64, Ordering};

use easytrade_core::{Product, ProductId, ProductPage};

/// Cache key for read views.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products {
        search: Option<String>,
        page: u32,
        size: u32,
        seller: Option<String>,
    },
    Product(ProductId),
    SellerListingCount(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(ProductPage),
    Product(Box<Product>),
    Count(u64),
}

/// Groups of views to refetch after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revalidate {
    /// Every product list (storefront grid, home page, listings table).
    Catalog,
    /// One product's detail view.
    Product(ProductId),
    /// Seller-scoped lists and listing counts shown on the dashboard.
    Dashboard,
}

impl Revalidate {
    pub(super) fn matches(&self, key: &CacheKey) -> bool {
        match (self, key) {
            (Self::Catalog, CacheKey::Products { .. })
            | (
                Self::Dashboard,
                CacheKey::Products {
                    seller: Some(_), ..
                }
                | CacheKey::SellerListingCount(_),
            ) => true,
            (Self::Product(id), CacheKey::Product(cached)) => id == cached,
            _ => false,
        }
    }
}

/// Revalidation counters, one per [`Revalidate`] group.
///
/// A read stamps its key before fetching and only caches the result if the
/// stamp is unchanged afterwards, so a revalidation that lands while the
/// fetch is in flight is never overwritten by the older response.
#[derive(Debug, Default)]
pub(super) struct Generations {
    catalog: AtomicU64,
    product: AtomicU64,
    dashboard: AtomicU64,
}

impl Generations {
    pub(super) fn bump(&self, target: &Revalidate) {
        let counter = match target {
            Revalidate::Catalog => &self.catalog,
            Revalidate::Product(_) => &self.product,
            Revalidate::Dashboard => &self.dashboard,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Combined generation of every group that can invalidate `key`.
    pub(super) fn stamp(&self, key: &CacheKey) -> u64 {
        let load = |counter: &AtomicU64| counter.load(Ordering::SeqCst);
        match key {
            CacheKey::Products { seller: None, .. } => load(&self.catalog),
            CacheKey::Products { seller: Some(_), .. } => {
                load(&self.catalog).wrapping_add(load(&self.dashboard))
            }
            CacheKey::Product(_) => load(&self.product),
            CacheKey::SellerListingCount(_) => load(&self.dashboard),
        }
    }
}
