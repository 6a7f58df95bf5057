//! # Order flow API
//!
//! [`OrderService`] is the entry point for request-driven work: building carts, creating orders from them and
//! answering questions about existing orders. It is generic over its backends, so an instance is created by supplying
//! implementations of [`OrderManagement`](crate::traits::OrderManagement), [`CartStore`](crate::traits::CartStore) and
//! [`PriceCatalog`](crate::traits::PriceCatalog), along with the shared [`WalletService`](crate::WalletService).
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use order_engine::{FixedPriceCatalog, MemoryCartStore, OrderService, SqliteDatabase, WalletService};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let wallet = Arc::new(WalletService::new(&master_secret));
//! let api = OrderService::new(db, MemoryCartStore::default(), FixedPriceCatalog::default(), wallet);
//! let order = api.create_order_from_cart("alice", PaymentMethod::Crypto).await?;
//! ```
//!
//! Every error returned by the service carries an [`ErrorKind`].
mod errors;
mod order_service;

pub use errors::{ErrorKind, OrderFlowError};
pub use order_service::OrderService;
