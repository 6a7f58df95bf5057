use std::future::Future;

use bs_common::Cents;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Product {0} is not in the catalog")]
    ProductNotFound(String),
    #[error("Catalog error: {0}")]
    BackendError(String),
}

pub trait PriceCatalog: Clone + Send + Sync + 'static {
    /// The current unit price of `product_id`.
    fn price_of(&self, product_id: &str) -> impl Future<Output = Result<Cents, CatalogError>> + Send;
}
