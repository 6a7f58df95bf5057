//! Implementations of the collaborator traits used by the order server.
//!
//! The cart store and the catalog are in-process stand-ins for what would normally be external services.
mod ethereum;
mod fixed_catalog;
mod memory_cart;

pub use ethereum::EthereumChainClient;
pub use fixed_catalog::{FixedPriceCatalog, DEFAULT_UNIT_PRICE};
pub use memory_cart::{MemoryCartStore, DEFAULT_CART_TTL};
