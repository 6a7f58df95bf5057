use std::future::Future;

use alloy::primitives::U256;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainQueryError {
    #[error("{0} is not a valid chain address")]
    InvalidAddress(String),
    #[error("Balance query for {0} timed out")]
    Timeout(String),
    #[error("Chain RPC error: {0}")]
    RpcError(String),
}

/// Read-only access to the chain. Nothing in the order engine ever writes to it.
pub trait ChainClient: Send + Sync + 'static {
    /// The current balance held by `address`, in the chain's smallest unit.
    fn balance_at(&self, address: &str) -> impl Future<Output = Result<U256, ChainQueryError>> + Send;

    /// Releases any connection held by the client.
    fn close(self) -> impl Future<Output = ()> + Send
    where Self: Sized {
        async {}
    }
}
