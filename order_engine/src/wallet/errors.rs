use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("The mnemonic phrase is invalid. {0}")]
    InvalidMnemonic(String),
    #[error("Invalid derivation path. {0}")]
    InvalidPath(String),
    #[error("Key derivation failed. {0}")]
    DerivationFailed(String),
}
