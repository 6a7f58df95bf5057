use std::time::Duration;

use log::*;
use moka::future::Cache;

use crate::{
    order_objects::Cart,
    traits::{CartStore, CartStoreError},
};

/// Carts left untouched for this long are dropped.
pub const DEFAULT_CART_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// An in-process [`CartStore`]. Each save restarts the cart's time to live.
#[derive(Clone)]
pub struct MemoryCartStore {
    carts: Cache<String, Cart>,
    ttl: Duration,
}

impl Default for MemoryCartStore {
    fn default() -> Self {
        Self::new(DEFAULT_CART_TTL)
    }
}

impl std::fmt::Debug for MemoryCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryCartStore(ttl: {:?}, carts: {})", self.ttl, self.carts.entry_count())
    }
}

impl MemoryCartStore {
    pub fn new(ttl: Duration) -> Self {
        let carts = Cache::builder().time_to_live(ttl).build();
        Self { carts, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl CartStore for MemoryCartStore {
    async fn fetch_cart(&self, user_id: &str) -> Result<Cart, CartStoreError> {
        self.carts.get(user_id).await.ok_or_else(|| CartStoreError::CartNotFound(user_id.to_string()))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), CartStoreError> {
        self.carts.insert(cart.user_id.clone(), cart.clone()).await;
        trace!("🛒️ Cart for {} saved with {} lines", cart.user_id, cart.items.len());
        Ok(())
    }

    async fn delete_cart(&self, user_id: &str) -> Result<(), CartStoreError> {
        self.carts.invalidate(user_id).await;
        trace!("🛒️ Cart for {user_id} deleted");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::order_objects::CartItem;

    fn cart(user: &str) -> Cart {
        let mut cart = Cart::empty(user);
        cart.upsert(CartItem::new("A", 2)).unwrap();
        cart
    }

    #[tokio::test]
    async fn save_fetch_delete() {
        let store = MemoryCartStore::default();
        assert_eq!(store.ttl(), DEFAULT_CART_TTL);
        assert!(matches!(store.fetch_cart("alice").await, Err(CartStoreError::CartNotFound(u)) if u == "alice"));
        store.save_cart(&cart("alice")).await.unwrap();
        assert_eq!(store.fetch_cart("alice").await.unwrap(), cart("alice"));
        store.delete_cart("alice").await.unwrap();
        assert!(store.fetch_cart("alice").await.is_err());
        // Deleting twice is fine
        store.delete_cart("alice").await.unwrap();
    }

    #[tokio::test]
    async fn carts_are_per_user() {
        let store = MemoryCartStore::default();
        store.save_cart(&cart("alice")).await.unwrap();
        assert!(store.fetch_cart("bob").await.is_err());
    }

    #[tokio::test]
    async fn expired_carts_are_not_found() {
        let store = MemoryCartStore::new(Duration::from_millis(50));
        store.save_cart(&cart("alice")).await.unwrap();
        assert!(store.fetch_cart("alice").await.is_ok());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(matches!(store.fetch_cart("alice").await, Err(CartStoreError::CartNotFound(_))));
    }
}
