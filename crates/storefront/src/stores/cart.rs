//! Cart store backed by visitor storage.

use easytrade_core::{Cart, CartItem, Product, ProductId};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::storage::{Storage, keys};
use super::StoreError;

/// The visitor's cart, mirrored into [`Storage`] under [`keys::CART`].
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

impl<S: Storage> CartStore<S> {
    /// Rehydrate the cart from storage.
    ///
    /// A missing or unreadable snapshot yields an empty cart.
    pub async fn load(storage: S) -> Self {
        let cart = match storage.get(keys::CART).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => Cart::from_items(items),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart snapshot");
                    Cart::default()
                }
            },
            Ok(None) => Cart::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot");
                Cart::default()
            }
        };

        Self { storage, cart }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.cart.total()
    }

    /// Add `quantity` units of `product`, merging with an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cart`] for a zero quantity, or the storage
    /// failure if the snapshot could not be written.
    pub async fn add_to_cart(&mut self, product: Product, quantity: u32) -> Result<(), StoreError> {
        let mut next = self.cart.clone();
        next.add(product, quantity)?;
        self.commit(next).await
    }

    /// Remove a product. Absent products are ignored.
    ///
    /// # Errors
    ///
    /// Returns the storage failure if the snapshot could not be written.
    pub async fn remove_from_cart(&mut self, id: &ProductId) -> Result<(), StoreError> {
        let mut next = self.cart.clone();
        if next.remove(id) {
            self.commit(next).await?;
        }
        Ok(())
    }

    /// Set a product's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns the storage failure if the snapshot could not be written.
    pub async fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> Result<(), StoreError> {
        let mut next = self.cart.clone();
        if next.update_quantity(id, quantity) {
            self.commit(next).await?;
        }
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the storage failure if the snapshot could not be written.
    pub async fn clear_cart(&mut self) -> Result<(), StoreError> {
        self.commit(Cart::default()).await
    }

    /// Persist `next`, then make it current.
    async fn commit(&mut self, next: Cart) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(&next)?;
        self.storage.set(keys::CART, snapshot).await?;
        debug!(items = next.items().len(), "Cart saved");
        self.cart = next;
        Ok(())
    }
}
