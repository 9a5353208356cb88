//! Product endpoints.
//!
//! List reads degrade to an empty result on failure so a page can still
//! render; single-product reads distinguish "not found" from other failures.

use easytrade_core::{DashboardSummary, ListingDraft, Price, Product, ProductId, ProductPage};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, ApiRequest, MarketplaceClient};

const PRODUCTS_PATH: &str = "/api/products";
const NEWEST_FIRST: &str = "createdAt,desc";

/// Spring-style page envelope returned by the product list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageEnvelope {
    #[serde(default)]
    content: Vec<Product>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_elements: u64,
}

/// Body of a create or update request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seller_username: Option<&'a str>,
}

impl<'a> ListingPayload<'a> {
    /// Payload for a new listing owned by `seller`.
    #[must_use]
    pub fn create(draft: &'a ListingDraft, seller: &'a str) -> Self {
        Self {
            seller_username: Some(seller),
            ..Self::update(draft)
        }
    }

    /// Payload for an edit; the price is only sent when it was supplied.
    #[must_use]
    pub fn update(draft: &'a ListingDraft) -> Self {
        Self {
            name: &draft.name,
            description: draft.description.as_deref(),
            price: draft.price,
            seller_username: None,
        }
    }
}

/// Response of a delete request, when the API sends one.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Query for one page of the product list.
struct PageQuery<'a> {
    search: Option<&'a str>,
    /// 0-indexed, as the API expects.
    page: u32,
    size: u32,
    seller: Option<&'a str>,
}

impl PageQuery<'_> {
    fn cache_key(&self) -> CacheKey {
        CacheKey::Products {
            search: self.search.map(ToString::to_string),
            page: self.page,
            size: self.size,
            seller: self.seller.map(ToString::to_string),
        }
    }

    fn request(&self) -> ApiRequest<'static> {
        let mut request = ApiRequest::get(PRODUCTS_PATH);
        if let Some(seller) = self.seller {
            request = request.query("sellerUsername", seller);
        }
        if let Some(search) = self.search {
            request = request.query("search", search);
        }
        request
            .query("page", self.page)
            .query("size", self.size)
            .query("sort", NEWEST_FIRST)
    }
}

impl MarketplaceClient {
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<PageEnvelope, ApiError> {
        self.send::<PageEnvelope>(query.request())
            .await
            .map(Option::unwrap_or_default)
    }

    /// Fetch a page of products, serving from cache when possible.
    async fn cached_page(&self, query: &PageQuery<'_>) -> Result<ProductPage, ApiError> {
        let key = query.cache_key();
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let stamp = self.inner.generations.stamp(&key);
        let envelope = self.fetch_page(query).await?;
        let page = ProductPage {
            items: envelope.content,
            total_pages: envelope.total_pages,
        };
        self.store_fresh(key, CacheValue::Products(page.clone()), stamp)
            .await;
        Ok(page)
    }

    /// List products matching `search`, newest first.
    ///
    /// `page` is 1-indexed. Failures are logged and yield an empty page.
    #[instrument(skip(self))]
    pub async fn list_products(&self, search: &str, page: u32, page_size: u32) -> ProductPage {
        let query = PageQuery {
            search: Some(search),
            page: page.max(1) - 1,
            size: page_size,
            seller: None,
        };
        self.cached_page(&query).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list products");
            ProductPage::empty()
        })
    }

    /// The newest products across the marketplace.
    #[instrument(skip(self))]
    pub async fn latest_products(&self, limit: u32) -> Vec<Product> {
        let query = PageQuery {
            search: None,
            page: 0,
            size: limit,
            seller: None,
        };
        match self.cached_page(&query).await {
            Ok(page) => page.items,
            Err(e) => {
                warn!(error = %e, "Failed to fetch latest products");
                Vec::new()
            }
        }
    }

    /// The newest listings of one seller.
    #[instrument(skip(self))]
    pub async fn seller_latest_listings(&self, username: &str, limit: u32) -> Vec<Product> {
        let query = PageQuery {
            search: None,
            page: 0,
            size: limit,
            seller: Some(username),
        };
        match self.cached_page(&query).await {
            Ok(page) => page.items,
            Err(e) => {
                warn!(error = %e, "Failed to fetch seller listings");
                Vec::new()
            }
        }
    }

    /// Overview numbers for a seller's dashboard.
    ///
    /// Without a username the guest summary is returned. The listing count
    /// falls back to zero when the API cannot be reached.
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self, username: Option<&str>) -> DashboardSummary {
        let Some(username) = username.filter(|u| !u.is_empty()) else {
            return DashboardSummary::guest();
        };

        let key = CacheKey::SellerListingCount(username.to_string());
        let cached = match self.inner.cache.get(&key).await {
            Some(CacheValue::Count(count)) => Some(count),
            _ => None,
        };

        let active_listings_count = if let Some(count) = cached {
            count
        } else {
            let stamp = self.inner.generations.stamp(&key);
            let query = PageQuery {
                search: None,
                page: 0,
                size: 1,
                seller: Some(username),
            };
            match self.fetch_page(&query).await {
                Ok(envelope) => {
                    self.store_fresh(key, CacheValue::Count(envelope.total_elements), stamp)
                        .await;
                    envelope.total_elements
                }
                Err(e) => {
                    warn!(error = %e, "Failed to count seller listings");
                    0
                }
            }
        };

        DashboardSummary {
            username: username.to_string(),
            active_listings_count,
        }
    }

    /// Fetch a single product.
    ///
    /// Returns `Ok(None)` when the API reports it as not found.
    ///
    /// # Errors
    ///
    /// Returns any other API failure.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let stamp = self.inner.generations.stamp(&key);
        match self
            .send::<Product>(ApiRequest::get(product_path(id)))
            .await
        {
            Ok(Some(product)) => {
                self.store_fresh(key, CacheValue::Product(Box::new(product.clone())), stamp)
                    .await;
                Ok(Some(product))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a listing and return the stored product.
    ///
    /// # Errors
    ///
    /// Returns the API failure, e.g. a rejected payload.
    #[instrument(skip(self, payload, token))]
    pub async fn create_product(
        &self,
        payload: &ListingPayload<'_>,
        token: Option<&SecretString>,
    ) -> Result<Product, ApiError> {
        let request = ApiRequest::post(PRODUCTS_PATH)
            .json(serde_json::to_value(payload)?)
            .bearer(token);
        self.send_expecting(request).await
    }

    /// Update a listing and return the stored product.
    ///
    /// # Errors
    ///
    /// Returns the API failure, e.g. the listing is missing or not owned.
    #[instrument(skip(self, payload, token), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        payload: &ListingPayload<'_>,
        token: Option<&SecretString>,
    ) -> Result<Product, ApiError> {
        let request = ApiRequest::put(product_path(id))
            .json(serde_json::to_value(payload)?)
            .bearer(token);
        self.send_expecting(request).await
    }

    /// Delete a listing.
    ///
    /// # Errors
    ///
    /// Returns the API failure, e.g. the listing is not owned by the caller.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        id: &ProductId,
        token: Option<&SecretString>,
    ) -> Result<DeleteResponse, ApiError> {
        let response = self
            .send::<DeleteResponse>(ApiRequest::delete(product_path(id)).bearer(token))
            .await?;
        Ok(response.unwrap_or_default())
    }
}

fn product_path(id: &ProductId) -> String {
    format!("{PRODUCTS_PATH}/{}", urlencoding::encode(id.as_str()))
}
