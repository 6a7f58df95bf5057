use serde::{Deserialize, Serialize};

use crate::db_types::ValidationError;

/// A line in a shopping cart. Carts carry no prices; those are looked up when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

impl CartItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::EmptyProductId);
        }
        if self.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(self.product_id.clone(), self.quantity));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn empty<S: Into<String>>(user_id: S) -> Self {
        Self { user_id: user_id.into(), items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `item` to the cart. If there is already a line for the same product, the quantities are merged,
    /// otherwise the item is appended, preserving the order in which products were first added.
    ///
    /// A merge that would overflow the quantity leaves the cart unchanged.
    pub fn upsert(&mut self, item: CartItem) -> Result<(), ValidationError> {
        match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| ValidationError::QuantityOverflow(item.product_id.clone()))?;
            },
            None => self.items.push(item),
        }
        Ok(())
    }
}
