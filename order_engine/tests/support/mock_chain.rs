use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use alloy::primitives::U256;
use order_engine::traits::{ChainClient, ChainQueryError};

/// A chain whose balances are set by the test. Clones share state, so a test can keep a handle after giving the
/// client to a watcher.
#[derive(Clone, Default)]
pub struct MockChainClient {
    balances: Arc<Mutex<HashMap<String, U256>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl MockChainClient {
    pub fn set_balance(&self, address: &str, balance: u64) {
        self.balances.lock().unwrap().insert(address.to_string(), U256::from(balance));
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ChainClient for MockChainClient {
    async fn balance_at(&self, address: &str) -> Result<U256, ChainQueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(address) {
            return Err(ChainQueryError::RpcError(format!("node refused to answer for {address}")));
        }
        let balance = self.balances.lock().unwrap().get(address).copied().unwrap_or_default();
        Ok(balance)
    }

    async fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
