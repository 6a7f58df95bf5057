//! Black Shop order engine
//!
//! The order engine turns shopping carts into orders and, for orders paid in crypto, watches the chain until the
//! payment arrives. It is backend-agnostic: storage, carts, prices and the chain are all reached through the traits in
//! [`mod@traits`].
//!
//! The library is divided into these main sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. You should never need to access the database
//!    directly. Use the public API instead. The data types stored in the database are defined in [`mod@db_types`] and
//!    are public.
//! 2. The HD wallet ([`mod@wallet`]). Every crypto order gets its own payment address, derived from the shop's master
//!    secret and the order's derivation index.
//! 3. The order flow API ([`OrderService`]). Carts, order creation and order queries.
//! 4. The [`PaymentWatcher`], a background loop that promotes orders to `Paid` when funds are seen on chain.
//!
//! Ready-made collaborators for carts, prices and the Ethereum JSON-RPC chain live in [`mod@integrations`].
mod db;
mod order_api;

pub mod db_types;
pub mod integrations;
pub mod order_objects;
pub mod payment_watcher;
pub mod traits;
pub mod wallet;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use integrations::{EthereumChainClient, FixedPriceCatalog, MemoryCartStore};
pub use order_api::{ErrorKind, OrderFlowError, OrderService};
pub use payment_watcher::{PaymentWatcher, WatcherConfig};
pub use traits::{CartStore, ChainClient, OrderManagement, PriceCatalog};
pub use wallet::{MasterSecret, WalletService};
