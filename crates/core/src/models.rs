//! Marketplace domain models.
//!
//! These mirror the JSON shapes of the marketplace API (camelCase on the
//! wire). The storefront never mutates a fetched [`Product`]; after a write it
//! replaces its copy with whatever the API returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, UserId, timestamp};

/// A product listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_username: Option<String>,
    #[serde(
        default,
        with = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Image URL suitable for rendering, if it is an absolute URL.
    ///
    /// Relative or empty references are treated as missing so views can fall
    /// back to a placeholder.
    #[must_use]
    pub fn display_image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
    }
}

/// One page of products as shown by a paginated view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total_pages: u32,
}

impl ProductPage {
    /// An empty page (used when a list request fails).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_pages: 0,
        }
    }
}

/// A marketplace user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(
        default,
        with = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Full display name ("Name Surname").
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

/// Identity of the signed-in user, as kept in the visitor's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user_id: UserId,
    pub username: String,
}

/// Seller overview shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub username: String,
    pub active_listings_count: u64,
}

impl DashboardSummary {
    /// Summary shown when no seller identity is available.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            username: "Guest".to_string(),
            active_listings_count: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_from_api_json() {
        let product: Product = serde_json::from_value(json!({
            "id": 3,
            "name": "Desk Lamp",
            "description": "Warm light",
            "price": 249.5,
            "sellerUsername": "thabo",
            "createdAt": "2025-03-14T09:26:53.589"
        }))
        .unwrap();

        assert_eq!(product.id, ProductId::from(3));
        assert_eq!(product.price, Price::parse("249.50").unwrap());
        assert_eq!(product.seller_username.as_deref(), Some("thabo"));
        assert!(product.created_at.is_some());
        assert!(product.image_url.is_none());
    }

    #[test]
    fn test_display_image_requires_absolute_url() {
        let mut product: Product = serde_json::from_value(json!({
            "id": "a1",
            "name": "Mug",
            "price": 20,
            "imageUrl": "uploads/mug.png"
        }))
        .unwrap();
        assert!(product.display_image().is_none());

        product.image_url = Some("https://cdn.example.com/mug.png".to_string());
        assert_eq!(
            product.display_image(),
            Some("https://cdn.example.com/mug.png")
        );
    }

    #[test]
    fn test_user_session_wire_shape() {
        let session = UserSession {
            user_id: UserId::from(9),
            username: "lerato".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({"userId": 9, "username": "lerato"})
        );
    }

    #[test]
    fn test_user_full_name() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "name": "Lerato",
            "surname": "Mokoena",
            "username": "lerato",
            "email": "lerato@example.com"
        }))
        .unwrap();
        assert_eq!(user.full_name(), "Lerato Mokoena");
        assert!(!user.verified);
    }
}
