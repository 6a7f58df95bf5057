use std::fmt::Debug;

use alloy::signers::local::PrivateKeySigner;
use coins_bip32::xkeys::{Parent, XPriv};
use log::*;
use zeroize::Zeroize;

use super::{DerivationPath, MasterSecret, WalletError};
use crate::db_types::DerivationIndex;

/// SLIP-44 coin type for Ether.
pub const ETHEREUM_COIN_TYPE: u32 = 60;

/// Derives payment addresses from the shop's master secret.
///
/// Derivation is a pure function of the master secret and the path. The service holds no mutable state, so it is
/// shared freely across tasks behind an `Arc`.
#[derive(Clone)]
pub struct WalletService {
    master_key: XPriv,
    coin_type: u32,
    account: u32,
}

impl Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletService(coin_type: {}, account: {}, master_key: ****)", self.coin_type, self.account)
    }
}

impl WalletService {
    pub fn new(secret: &MasterSecret) -> Self {
        Self { master_key: secret.master_key().clone(), coin_type: ETHEREUM_COIN_TYPE, account: 0 }
    }

    pub fn with_coin_type(mut self, coin_type: u32) -> Self {
        self.coin_type = coin_type;
        self
    }

    pub fn with_account(mut self, account: u32) -> Self {
        self.account = account;
        self
    }

    pub fn coin_type(&self) -> u32 {
        self.coin_type
    }

    pub fn account(&self) -> u32 {
        self.account
    }

    /// The canonical payment path for an order, `m/44'/{coin}'/{account}'/0/{index}`.
    pub fn payment_path(&self, index: DerivationIndex) -> Result<DerivationPath, WalletError> {
        let address_index = u32::try_from(index.value())
            .map_err(|_| WalletError::InvalidPath(format!("Derivation index {index} is out of range")))?;
        DerivationPath::bip44(self.coin_type, self.account, 0, address_index)
    }

    /// Parses `path` and returns the EIP-55 checksummed address of the key at that path.
    pub fn derive_address(&self, path: &str) -> Result<String, WalletError> {
        let path = path.parse::<DerivationPath>()?;
        self.derive_address_at(&path)
    }

    /// The payment address for the order that was allocated `index`.
    pub fn address_for_index(&self, index: DerivationIndex) -> Result<String, WalletError> {
        let path = self.payment_path(index)?;
        self.derive_address_at(&path)
    }

    pub fn derive_address_at(&self, path: &DerivationPath) -> Result<String, WalletError> {
        let mut key = self.master_key.clone();
        for segment in path.segments() {
            key = key
                .derive_child(segment.to_bip32_index())
                .map_err(|e| WalletError::DerivationFailed(format!("At {path}: {e}")))?;
        }
        let signing_key: &coins_bip32::prelude::SigningKey = key.as_ref();
        let mut bytes = signing_key.to_bytes();
        let signer = PrivateKeySigner::from_slice(&bytes);
        bytes.as_mut_slice().zeroize();
        let signer = signer.map_err(|e| WalletError::DerivationFailed(format!("At {path}: {e}")))?;
        let address = signer.address().to_checksum(None);
        trace!("🔑️ Derived {address} at {path}");
        Ok(address)
    }
}
