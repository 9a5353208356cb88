//! Shopping cart contents.
//!
//! A [`Cart`] holds at most one [`CartItem`] per product, every item with a
//! quantity of at least [`Cart::MIN_QUANTITY`]. Totals are derived on read and
//! never stored. The cart serializes as a plain JSON array of product fields
//! plus `quantity`, which is the snapshot kept in the visitor's storage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Product;
use crate::types::ProductId;

/// Errors returned by cart mutations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least {min}")]
    QuantityTooLow { min: u32 },
}

/// A product together with the quantity selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.amount() * Decimal::from(self.quantity)
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub const MIN_QUANTITY: u32 = 1;

    /// Build a cart from a stored snapshot.
    ///
    /// Items with a zero quantity are dropped and duplicate products are
    /// merged, so a hand-edited or stale snapshot still yields a valid cart.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::default();
        for item in items {
            if item.quantity >= Self::MIN_QUANTITY {
                cart.merge(item.product, item.quantity);
            }
        }
        cart
    }

    /// Add `quantity` units of `product`.
    ///
    /// When the product is already present its quantity grows and the stored
    /// product data is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityTooLow`] when `quantity` is zero.
    pub fn add(&mut self, product: Product, quantity: u32) -> Result<(), CartError> {
        if quantity < Self::MIN_QUANTITY {
            return Err(CartError::QuantityTooLow {
                min: Self::MIN_QUANTITY,
            });
        }
        self.merge(product, quantity);
        Ok(())
    }

    fn merge(&mut self, product: Product, quantity: u32) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem { product, quantity });
        }
    }

    /// Remove a product. Returns whether anything changed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product.id != id);
        self.items.len() != before
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// Negative values are treated as zero and zero removes the item. Unknown
    /// products are ignored. Returns whether anything changed.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if quantity == 0 {
            return self.remove(id);
        }
        match self.items.iter_mut().find(|i| &i.product.id == id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of price times quantity across all items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Quantity of a product, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|i| &i.product.id == id)
            .map_or(0, |i| i.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: i64, cents: i64) -> Product {
        Product {
            id: ProductId::from(id),
            name: format!("Item {id}"),
            description: None,
            price: Price::from_cents(cents).unwrap(),
            image_url: None,
            seller_username: Some("seller".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_repeated_add_merges_into_one_entry() {
        let mut cart = Cart::default();
        cart.add(product(1, 1000), 1).unwrap();
        cart.add(product(1, 1000), 2).unwrap();
        cart.add(product(1, 1000), 4).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::from(1)), 7);
    }

    #[test]
    fn test_merge_keeps_existing_product_data() {
        let mut cart = Cart::default();
        cart.add(product(1, 1000), 1).unwrap();
        let mut renamed = product(1, 5000);
        renamed.name = "Renamed".to_string();
        cart.add(renamed, 1).unwrap();

        assert_eq!(cart.items()[0].product.name, "Item 1");
        assert_eq!(cart.total(), Decimal::new(2000, 2));
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.add(product(1, 100), 0),
            Err(CartError::QuantityTooLow { min: 1 })
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_saturates() {
        let mut cart = Cart::default();
        cart.add(product(1, 100), u32::MAX).unwrap();
        cart.add(product(1, 100), 5).unwrap();
        assert_eq!(cart.quantity_of(&ProductId::from(1)), u32::MAX);
    }

    #[test]
    fn test_update_to_zero_or_negative_removes() {
        let mut cart = Cart::default();
        cart.add(product(1, 100), 3).unwrap();
        cart.add(product(2, 100), 3).unwrap();

        assert!(cart.update_quantity(&ProductId::from(1), 0));
        assert!(cart.update_quantity(&ProductId::from(2), -5));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut cart = Cart::default();
        cart.add(product(1, 100), 3).unwrap();
        assert!(!cart.update_quantity(&ProductId::from(99), 4));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::default();
        cart.add(product(1, 100), 1).unwrap();
        assert!(cart.remove(&ProductId::from(1)));
        assert!(!cart.remove(&ProductId::from(1)));
    }

    #[test]
    fn test_totals_follow_every_mutation() {
        let mut cart = Cart::default();
        cart.add(product(1, 1999), 2).unwrap();
        cart.add(product(2, 500), 1).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), Decimal::new(4498, 2));

        cart.update_quantity(&ProductId::from(1), 1);
        assert_eq!(cart.total(), Decimal::new(2499, 2));

        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut cart = Cart::default();
        cart.add(product(1, 1999), 2).unwrap();
        cart.add(product(2, 24950), 1).unwrap();

        let snapshot = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_snapshot_is_flat_array() {
        let mut cart = Cart::default();
        cart.add(product(1, 1999), 2).unwrap();
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["quantity"], 2);
        assert_eq!(value[0]["sellerUsername"], "seller");
    }

    #[test]
    fn test_from_items_normalizes() {
        let items = vec![
            CartItem {
                product: product(1, 100),
                quantity: 2,
            },
            CartItem {
                product: product(2, 100),
                quantity: 0,
            },
            CartItem {
                product: product(1, 100),
                quantity: 3,
            },
        ];
        let cart = Cart::from_items(items);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::from(1)), 5);
    }
}
