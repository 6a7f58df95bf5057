use std::{fmt::Display, str::FromStr};

use bs_common::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------    DerivationIndex    ---------------------------------------------------------
/// The leaf index of an order's payment address in the HD tree. Allocated once from a persisted counter and never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct DerivationIndex(pub i64);

impl From<i64> for DerivationIndex {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for DerivationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DerivationIndex {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created. Fiat orders stay here until settled out of band.
    Pending,
    /// A payment address has been assigned and the chain is being watched for funds.
    AwaitingPayment,
    /// Funds have been observed on the payment address.
    Paid,
    /// The order has been handed over for delivery.
    Shipped,
    /// The order was cancelled before it was paid.
    Cancelled,
}

impl OrderStatusType {
    /// The statuses from which an order may move into `self`.
    pub fn allowed_predecessors(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Pending => &[],
            AwaitingPayment => &[Pending],
            Paid => &[Pending, AwaitingPayment],
            Shipped => &[Paid],
            Cancelled => &[Pending, AwaitingPayment],
        }
    }

    /// Status only ever moves forward. Moving to the current status is not a transition.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        next.allowed_predecessors().contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Shipped | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::AwaitingPayment => write!(f, "AWAITING_PAYMENT"),
            OrderStatusType::Paid => write!(f, "PAID"),
            OrderStatusType::Shipped => write!(f, "SHIPPED"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "AWAITING_PAYMENT" => Ok(Self::AwaitingPayment),
            "PAID" => Ok(Self::Paid),
            "SHIPPED" => Ok(Self::Shipped),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Fiat,
    Crypto,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Fiat => write!(f, "FIAT"),
            PaymentMethod::Crypto => write!(f, "CRYPTO"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIAT" => Ok(Self::Fiat),
            "CRYPTO" => Ok(Self::Crypto),
            _ => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------   ValidationError     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("User ID cannot be empty")]
    EmptyUserId,
    #[error("Product ID cannot be empty")]
    EmptyProductId,
    #[error("Quantity for product {0} must be positive, but was {1}")]
    NonPositiveQuantity(String, i64),
    #[error("The order total does not fit in the price range")]
    PriceOverflow,
    #[error("The quantity of product {0} in the cart is too large")]
    QuantityOverflow(String),
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
/// A line in an order. `price` is the unit price at the moment the order was created, and is never looked up again.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: Cents,
}

impl OrderItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64, price: Cents) -> Self {
        Self { product_id: product_id.into(), quantity, price }
    }

    pub fn line_total(&self) -> Option<Cents> {
        self.price.checked_mul(self.quantity)
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// An order aggregate that has been built from a cart, but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_price: Cents,
    pub payment_method: PaymentMethod,
    pub payment_address: Option<String>,
    pub derivation_index: Option<DerivationIndex>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Builds a `Pending` order, fixing the total price from the snapshotted unit prices.
    pub fn new<S: Into<String>>(
        user_id: S,
        payment_method: PaymentMethod,
        items: Vec<OrderItem>,
    ) -> Result<Self, ValidationError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        let mut total_price = Cents::default();
        for item in &items {
            if item.quantity <= 0 {
                return Err(ValidationError::NonPositiveQuantity(item.product_id.clone(), item.quantity));
            }
            let line = item.line_total().ok_or(ValidationError::PriceOverflow)?;
            total_price = total_price.checked_add(line).ok_or(ValidationError::PriceOverflow)?;
        }
        Ok(Self {
            user_id,
            items,
            total_price,
            payment_method,
            payment_address: None,
            derivation_index: None,
            status: OrderStatusType::Pending,
            created_at: Utc::now(),
        })
    }

    /// Attaches the derived payment address and moves the order to `AwaitingPayment`.
    pub fn assign_payment_address(&mut self, index: DerivationIndex, address: String) {
        self.derivation_index = Some(index);
        self.payment_address = Some(address);
        self.status = OrderStatusType::AwaitingPayment;
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_price: Cents,
    pub payment_method: PaymentMethod,
    pub payment_address: Option<String>,
    pub transaction_id: Option<String>,
    pub derivation_index: Option<DerivationIndex>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_new_order(id: OrderId, order: NewOrder) -> Self {
        Self {
            id,
            user_id: order.user_id,
            items: order.items,
            total_price: order.total_price,
            payment_method: order.payment_method,
            payment_address: order.payment_address,
            transaction_id: None,
            derivation_index: order.derivation_index,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.created_at,
        }
    }
}

//--------------------------------------      OrderCursor      ---------------------------------------------------------
/// A position in the oldest-first order scan, `(created_at, id)`. A page fetched after a cursor starts at the first
/// order that sorts after it, however many of the earlier orders have changed status in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCursor {
    pub created_at: DateTime<Utc>,
    pub id: OrderId,
}

impl From<&Order> for OrderCursor {
    fn from(order: &Order) -> Self {
        Self { created_at: order.created_at, id: order.id }
    }
}

//--------------------------------------      OrderUpdate      ---------------------------------------------------------
/// The fields of an order that may change after it has been persisted. Everything else is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
    pub transaction_id: Option<String>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, transaction_id: S) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.transaction_id.is_none()
    }
}
