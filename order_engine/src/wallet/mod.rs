//! # HD wallet
//!
//! Every crypto order is paid to its own address. The addresses are derived from a single master secret along
//! BIP-44 paths, `m/44'/60'/0'/0/{index}`, where `index` is the order's [`DerivationIndex`](crate::db_types::DerivationIndex).
//! Since derivation is deterministic, the address of any order can be recomputed from the stored index alone, and the
//! private key for it can be recovered by any standard wallet holding the same mnemonic.
mod derivation_path;
mod errors;
mod master_secret;
mod service;

pub use derivation_path::{ChildNumber, DerivationPath, HARDENED_OFFSET};
pub use errors::WalletError;
pub use master_secret::MasterSecret;
pub use service::{WalletService, ETHEREUM_COIN_TYPE};
