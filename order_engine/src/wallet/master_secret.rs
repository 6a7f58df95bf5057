use std::fmt::Debug;

use bs_common::Secret;
use coins_bip32::xkeys::XPriv;
use coins_bip39::{English, Mnemonic};
use log::*;
use zeroize::Zeroize;

use super::WalletError;

/// The root of the shop's HD wallet.
///
/// Built once at startup from the mnemonic phrase and never modified. The phrase itself is not kept: only the BIP-32
/// master key derived from its seed (with an empty passphrase) survives construction.
#[derive(Clone)]
pub struct MasterSecret {
    master_key: XPriv,
}

impl Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterSecret(****)")
    }
}

impl MasterSecret {
    /// Validates the phrase against the BIP-39 English word list and checksum, then derives the master key.
    ///
    /// Runs of whitespace between words are collapsed and case is ignored.
    pub fn from_phrase(phrase: &Secret<String>) -> Result<Self, WalletError> {
        let mut normalized =
            phrase.reveal().split_whitespace().map(str::to_lowercase).collect::<Vec<String>>().join(" ");
        let result = Self::from_normalized(&normalized);
        normalized.zeroize();
        if result.is_ok() {
            debug!("🔑️ Master secret loaded");
        }
        result
    }

    fn from_normalized(phrase: &str) -> Result<Self, WalletError> {
        let mnemonic = Mnemonic::<English>::new_from_phrase(phrase)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        let master_key = mnemonic.master_key(None).map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
        Ok(Self { master_key })
    }

    pub(crate) fn master_key(&self) -> &XPriv {
        &self.master_key
    }
}
