//! # Backend and collaborator contracts
//!
//! The order engine does not own its storage, its carts, its prices or the chain. Each of these is reached through a
//! trait defined here, so that the [`OrderService`](crate::OrderService) and the
//! [`PaymentWatcher`](crate::PaymentWatcher) can run against SQLite and a JSON-RPC node in production, and against
//! in-memory doubles in tests.
//!
//! * [`OrderManagement`] persists orders and their items, allocates derivation indices and answers status queries.
//! * [`CartStore`] holds the ephemeral per-user carts.
//! * [`PriceCatalog`] resolves unit prices for products.
//! * [`ChainClient`] reads address balances from the chain.
mod cart_store;
mod chain_client;
mod data_objects;
mod order_management;
mod price_catalog;

pub use cart_store::{CartStore, CartStoreError};
pub use chain_client::{ChainClient, ChainQueryError};
pub use data_objects::{CheckOutcome, TickSummary};
pub use order_management::{OrderManagement, OrderManagementError};
pub use price_catalog::{CatalogError, PriceCatalog};
