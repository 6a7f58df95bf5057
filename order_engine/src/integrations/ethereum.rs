use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::http::reqwest::Url,
};
use log::*;

use crate::traits::{ChainClient, ChainQueryError};

/// Reads balances from an Ethereum JSON-RPC node over HTTP with `eth_getBalance`.
#[derive(Clone)]
pub struct EthereumChainClient {
    url: Url,
    provider: DynProvider,
}

impl std::fmt::Debug for EthereumChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EthereumChainClient({})", self.url)
    }
}

impl EthereumChainClient {
    /// No connection is made until the first query.
    pub fn new(rpc_url: &str) -> Result<Self, ChainQueryError> {
        let url = rpc_url
            .parse::<Url>()
            .map_err(|e| ChainQueryError::RpcError(format!("Invalid RPC URL {rpc_url}: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
        info!("⛓️ Chain client configured for {url}");
        Ok(Self { url, provider })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl ChainClient for EthereumChainClient {
    async fn balance_at(&self, address: &str) -> Result<U256, ChainQueryError> {
        let account = address.parse::<Address>().map_err(|_| ChainQueryError::InvalidAddress(address.to_string()))?;
        let balance = self
            .provider
            .get_balance(account)
            .await
            .map_err(|e| ChainQueryError::RpcError(format!("eth_getBalance({address}) failed: {e}")))?;
        trace!("⛓️ Balance of {address} is {balance}");
        Ok(balance)
    }

    async fn close(self) {
        debug!("⛓️ Chain client for {} released", self.url);
    }
}
