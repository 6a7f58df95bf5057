use std::{fmt::Debug, sync::Arc};

use log::*;

use super::OrderFlowError;
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, PaymentMethod, ValidationError},
    order_objects::{Cart, CartItem},
    traits::{CartStore, CartStoreError, OrderManagement, PriceCatalog},
    wallet::WalletService,
};

/// `OrderService` handles the request-driven side of the shop: filling carts and turning them into orders.
///
/// The service holds no locks of its own. Two concurrent requests for the same user's cart see last-write-wins
/// semantics from the cart store; requests for different users never interact, apart from drawing on the shared
/// derivation counter.
pub struct OrderService<B, C, P> {
    db: B,
    carts: C,
    catalog: P,
    wallet: Arc<WalletService>,
}

impl<B, C, P> Debug for OrderService<B, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderService")
    }
}

impl<B: Clone, C: Clone, P: Clone> Clone for OrderService<B, C, P> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            carts: self.carts.clone(),
            catalog: self.catalog.clone(),
            wallet: Arc::clone(&self.wallet),
        }
    }
}

impl<B, C, P> OrderService<B, C, P> {
    pub fn new(db: B, carts: C, catalog: P, wallet: Arc<WalletService>) -> Self {
        Self { db, carts, catalog, wallet }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn wallet(&self) -> &WalletService {
        &self.wallet
    }
}

impl<B, C, P> OrderService<B, C, P>
where
    B: OrderManagement,
    C: CartStore,
    P: PriceCatalog,
{
    /// Adds `item` to the user's cart, creating the cart if necessary. Adding a product that is already in the cart
    /// increases its quantity.
    ///
    /// Returns the cart as it was saved.
    pub async fn add_item_to_cart(&self, user_id: &str, item: CartItem) -> Result<Cart, OrderFlowError> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }
        item.validate()?;
        let mut cart = match self.carts.fetch_cart(user_id).await {
            Ok(cart) => cart,
            Err(CartStoreError::CartNotFound(_)) => Cart::empty(user_id),
            Err(e) => return Err(e.into()),
        };
        trace!("🛒️ Adding {} x {} to the cart for {user_id}", item.quantity, item.product_id);
        cart.upsert(item)?;
        self.carts.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn get_cart(&self, user_id: &str) -> Result<Cart, OrderFlowError> {
        let cart = self.carts.fetch_cart(user_id).await?;
        Ok(cart)
    }

    /// Converts the user's cart into an order.
    ///
    /// Unit prices are looked up now and fixed in the order. Crypto orders are given a fresh derivation index and the
    /// payment address derived from it, and start out `AwaitingPayment`; every other order starts out `Pending`.
    ///
    /// Nothing is persisted unless every step up to and including address derivation succeeds. A derivation index
    /// that was allocated for an order that then failed to save is simply skipped. Once the order is stored the cart
    /// is deleted; if that fails, the error is logged and the order is still returned.
    pub async fn create_order_from_cart(
        &self,
        user_id: &str,
        payment_method: PaymentMethod,
    ) -> Result<Order, OrderFlowError> {
        let cart = self.carts.fetch_cart(user_id).await?;
        if cart.is_empty() {
            debug!("📦️ Cannot create an order for {user_id}: the cart is empty");
            return Err(OrderFlowError::EmptyCart(user_id.to_string()));
        }
        let mut items = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            item.validate()?;
            let price = self.catalog.price_of(&item.product_id).await?;
            items.push(OrderItem::new(item.product_id.clone(), item.quantity, price));
        }
        let mut order = NewOrder::new(user_id, payment_method, items)?;
        if payment_method == PaymentMethod::Crypto {
            let index = self.db.next_derivation_index().await?;
            let address = self.wallet.address_for_index(index)?;
            debug!("📦️ Payment address {address} (index {index}) assigned to new order for {user_id}");
            order.assign_payment_address(index, address);
        }
        let order = self.db.insert_order(order).await?;
        info!(
            "📦️ Order {} created for {user_id}. {} {} order for {}",
            order.id,
            order.status,
            order.payment_method,
            order.total_price
        );
        if let Err(e) = self.carts.delete_cart(user_id).await {
            warn!("📦️ Order {} was saved, but the cart for {user_id} could not be deleted. {e}", order.id);
        }
        Ok(order)
    }

    pub async fn order_by_id(&self, id: OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_id(id).await?.ok_or(OrderFlowError::OrderNotFound(id))
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    /// Recomputes the payment address of a crypto order from its stored derivation index and checks that it matches
    /// the stored address.
    pub async fn payment_address_for(&self, id: OrderId) -> Result<String, OrderFlowError> {
        let order = self.order_by_id(id).await?;
        let (index, stored) = match (order.derivation_index, order.payment_address) {
            (Some(index), Some(address)) => (index, address),
            _ => return Err(OrderFlowError::NoPaymentAddress(id)),
        };
        let derived = self.wallet.address_for_index(index)?;
        if derived != stored {
            error!("📦️ Order {id} has payment address {stored}, but index {index} derives {derived}");
            return Err(OrderFlowError::AddressMismatch { id, stored, derived });
        }
        Ok(derived)
    }
}
