use std::{collections::HashMap, sync::Arc};

use bs_common::Cents;

use crate::traits::{CatalogError, PriceCatalog};

/// Every product costs $10.00 unless it has been given its own price.
pub const DEFAULT_UNIT_PRICE: Cents = Cents::from_dollars(10);

/// A [`PriceCatalog`] with a flat price for every product, plus optional per-product overrides. Overrides are fixed
/// once the catalog is built.
#[derive(Debug, Clone)]
pub struct FixedPriceCatalog {
    default_price: Cents,
    overrides: Arc<HashMap<String, Cents>>,
}

impl Default for FixedPriceCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_PRICE)
    }
}

impl FixedPriceCatalog {
    pub fn new(default_price: Cents) -> Self {
        Self { default_price, overrides: Arc::new(HashMap::new()) }
    }

    pub fn with_price<S: Into<String>>(mut self, product_id: S, price: Cents) -> Self {
        Arc::make_mut(&mut self.overrides).insert(product_id.into(), price);
        self
    }

    pub fn default_price(&self) -> Cents {
        self.default_price
    }
}

impl PriceCatalog for FixedPriceCatalog {
    async fn price_of(&self, product_id: &str) -> Result<Cents, CatalogError> {
        if product_id.trim().is_empty() {
            return Err(CatalogError::ProductNotFound(product_id.to_string()));
        }
        Ok(self.overrides.get(product_id).copied().unwrap_or(self.default_price))
    }
}
