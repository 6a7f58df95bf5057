use std::future::Future;

use thiserror::Error;

use crate::order_objects::Cart;

#[derive(Debug, Clone, Error)]
pub enum CartStoreError {
    #[error("No cart exists for user {0}")]
    CartNotFound(String),
    #[error("Cart store error: {0}")]
    BackendError(String),
}

/// Ephemeral per-user carts. Expiry policy belongs to the store; an expired cart is indistinguishable from a missing
/// one. There is no locking across calls, so concurrent writers for the same user see last-write-wins.
pub trait CartStore: Clone + Send + Sync + 'static {
    /// Fetches the cart for `user_id`, or [`CartStoreError::CartNotFound`] if there is none.
    fn fetch_cart(&self, user_id: &str) -> impl Future<Output = Result<Cart, CartStoreError>> + Send;

    /// Replaces the stored cart for `cart.user_id`.
    fn save_cart(&self, cart: &Cart) -> impl Future<Output = Result<(), CartStoreError>> + Send;

    /// Removes the cart for `user_id`. Removing a cart that does not exist is not an error.
    fn delete_cart(&self, user_id: &str) -> impl Future<Output = Result<(), CartStoreError>> + Send;
}
