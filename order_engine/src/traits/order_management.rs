use std::future::Future;

use thiserror::Error;

use crate::db_types::{DerivationIndex, NewOrder, Order, OrderCursor, OrderId, OrderStatusType, OrderUpdate};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} cannot move from {from} to {to}")]
    ForbiddenStatusTransition { id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Derivation index {0} has already been assigned to another order")]
    DuplicateDerivationIndex(DerivationIndex),
    #[error("The derivation counter is missing or corrupt: {0}")]
    CounterError(String),
}

/// This trait defines the persistence behaviour the order flow relies on.
///
/// Implementations must guarantee:
/// * An order header and all of its items are written in one all-or-nothing transaction.
/// * [`Self::next_derivation_index`] hands out strictly increasing values from a persisted counter. An index that has
///   been handed out is never handed out again, even if the order it was meant for is never stored.
/// * [`Self::update_order`] only touches the status and transaction id, and applying the same update twice is harmless.
pub trait OrderManagement: Clone + Send + Sync + 'static {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Atomically claims the next value of the derivation counter.
    fn next_derivation_index(&self) -> impl Future<Output = Result<DerivationIndex, OrderManagementError>> + Send;

    /// Stores the order header and its items in a single transaction. The returned order carries the identifier
    /// assigned by the database.
    fn insert_order(&self, order: NewOrder) -> impl Future<Output = Result<Order, OrderManagementError>> + Send;

    /// Applies `update` to the order. Status changes must move forward (see
    /// [`OrderStatusType::can_transition_to`]); re-applying the status the order already has is a no-op that succeeds.
    ///
    /// Returns the order as it is stored after the update.
    fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> impl Future<Output = Result<Order, OrderManagementError>> + Send;

    /// Fetches a page of orders in `AwaitingPayment` status, oldest first. With a cursor, the page starts at the first
    /// such order after it; without one, at the oldest.
    fn fetch_awaiting_payment(
        &self,
        limit: u32,
        after: Option<OrderCursor>,
    ) -> impl Future<Output = Result<Vec<Order>, OrderManagementError>> + Send;

    fn fetch_order_by_id(&self, id: OrderId) -> impl Future<Output = Result<Option<Order>, OrderManagementError>> + Send;

    /// All orders for the given user, oldest first.
    fn fetch_orders_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Order>, OrderManagementError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
