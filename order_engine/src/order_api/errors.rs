use std::fmt::Display;

use thiserror::Error;

use crate::{
    db_types::{OrderId, ValidationError},
    traits::{CartStoreError, CatalogError, ChainQueryError, OrderManagementError},
    wallet::WalletError,
};

/// The broad class of an [`OrderFlowError`]. Callers branch on this rather than on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is wrong: an empty cart, a blank user id, a bad quantity.
    Validation,
    /// The cart, order or product does not exist.
    NotFound,
    /// A payment address could not be derived, or does not match the stored one.
    Derivation,
    /// A backend failed to read or write.
    Persistence,
    /// The chain could not be queried. Transient; the next watcher tick retries.
    ChainQuery,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not found",
            ErrorKind::Derivation => "derivation",
            ErrorKind::Persistence => "persistence",
            ErrorKind::ChainQuery => "chain query",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid request. {0}")]
    Validation(#[from] ValidationError),
    #[error("The cart for user {0} is empty")]
    EmptyCart(String),
    #[error("No cart exists for user {0}")]
    CartNotFound(String),
    #[error("Product {0} is not in the catalog")]
    ProductNotFound(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is not paid with crypto and has no payment address")]
    NoPaymentAddress(OrderId),
    #[error("Could not derive a payment address. {0}")]
    Derivation(#[from] WalletError),
    #[error("Order {id} has payment address {stored}, but its derivation index gives {derived}")]
    AddressMismatch { id: OrderId, stored: String, derived: String },
    #[error("Order storage error. {0}")]
    Persistence(OrderManagementError),
    #[error("Cart store error. {0}")]
    CartStoreError(String),
    #[error("Catalog error. {0}")]
    CatalogError(String),
    #[error("Chain query failed. {0}")]
    ChainQuery(#[from] ChainQueryError),
}

impl OrderFlowError {
    pub fn kind(&self) -> ErrorKind {
        use OrderFlowError::*;
        match self {
            Validation(_) | EmptyCart(_) | NoPaymentAddress(_) => ErrorKind::Validation,
            CartNotFound(_) | ProductNotFound(_) | OrderNotFound(_) => ErrorKind::NotFound,
            Derivation(_) | AddressMismatch { .. } => ErrorKind::Derivation,
            Persistence(_) | CartStoreError(_) | CatalogError(_) => ErrorKind::Persistence,
            ChainQuery(_) => ErrorKind::ChainQuery,
        }
    }
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::Persistence(e),
        }
    }
}

impl From<CartStoreError> for OrderFlowError {
    fn from(e: CartStoreError) -> Self {
        match e {
            CartStoreError::CartNotFound(user_id) => Self::CartNotFound(user_id),
            CartStoreError::BackendError(s) => Self::CartStoreError(s),
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(product_id) => Self::ProductNotFound(product_id),
            CatalogError::BackendError(s) => Self::CatalogError(s),
        }
    }
}
