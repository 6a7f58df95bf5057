//! # Payment watcher
//!
//! The watcher is the only background actor in the engine. On a fixed interval it walks every order in
//! `AwaitingPayment` status, oldest first, asks the chain for the balance of the order's payment address, and marks the
//! order as `Paid` once that balance reaches the configured minimum.
//!
//! Failures are contained. An error checking one order is logged and the order is retried on the next tick. An error
//! scanning the order table ends the current tick early. Nothing the watcher encounters stops the loop; only the
//! shutdown signal does, and it is only observed between ticks.
use std::{sync::Arc, time::Duration};

use alloy::primitives::U256;
use futures_util::{stream::FuturesUnordered, StreamExt};
use log::*;
use tokio::{sync::watch, time::MissedTickBehavior};

use crate::{
    db_types::{Order, OrderCursor, OrderStatusType, OrderUpdate},
    order_api::OrderFlowError,
    traits::{ChainClient, ChainQueryError, CheckOutcome, OrderManagement, TickSummary},
};

pub const DEFAULT_WATCHER_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Time between the start of consecutive ticks.
    pub interval: Duration,
    /// Number of orders fetched from the repository at a time.
    pub page_size: u32,
    /// Upper bound on a single balance query.
    pub chain_timeout: Duration,
    /// The smallest balance, in wei, that counts as payment.
    pub min_balance: U256,
    /// How many orders in a page are checked at the same time. 1 checks them one after the other.
    pub max_concurrent_checks: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WATCHER_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            chain_timeout: DEFAULT_CHAIN_TIMEOUT,
            min_balance: U256::from(1),
            max_concurrent_checks: 1,
        }
    }
}

pub struct PaymentWatcher<B, C> {
    db: B,
    chain: Arc<C>,
    config: WatcherConfig,
}

impl<B, C> std::fmt::Debug for PaymentWatcher<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentWatcher({:?})", self.config)
    }
}

impl<B, C> PaymentWatcher<B, C>
where
    B: OrderManagement,
    C: ChainClient,
{
    pub fn new(db: B, chain: C, config: WatcherConfig) -> Self {
        Self { db, chain: Arc::new(chain), config }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Runs ticks on the configured interval until `shutdown` changes to `true` or its sender is dropped. The first
    /// tick runs immediately.
    ///
    /// A tick that is in progress when shutdown is requested runs to completion. Ticks that overrun the interval push
    /// the schedule back rather than bunching up. The chain client is released before returning. The repository is
    /// left open; it is usually shared with the order service, and its owner closes it.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = tokio::time::interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("👀️ Payment watcher started. Checking for payments every {:?}", self.config.interval);
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("👀️ Shutdown channel closed");
                        break;
                    }
                },
                _ = timer.tick() => {
                    let summary = self.run_tick().await;
                    if summary.checked > 0 || summary.aborted {
                        info!("👀️ Tick complete. {summary}");
                    } else {
                        debug!("👀️ Tick complete. {summary}");
                    }
                },
            }
        }
        info!("👀️ Payment watcher is shutting down");
        match Arc::try_unwrap(self.chain) {
            Ok(chain) => chain.close().await,
            Err(_) => warn!("👀️ The chain client is still in use elsewhere and was not closed"),
        }
        info!("👀️ Payment watcher stopped");
    }

    /// Performs one scan over every order awaiting payment.
    ///
    /// Pages are fetched until one comes back empty. Each page starts after the last order of the previous one, so
    /// orders that leave `AwaitingPayment` during the scan, by being paid here or by any other route, never shift the
    /// pages that follow. Orders created during the scan sort after the older ones, so at worst they are picked up at
    /// the end of the scan or on the next tick.
    pub async fn run_tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut after = None;
        loop {
            let page = match self.db.fetch_awaiting_payment(self.config.page_size, after).await {
                Ok(page) => page,
                Err(e) => {
                    error!("👀️ Could not fetch orders awaiting payment (after {after:?}). Abandoning this tick. {e}");
                    summary.aborted = true;
                    break;
                },
            };
            let Some(last) = page.last() else {
                break;
            };
            after = Some(OrderCursor::from(last));
            summary.pages += 1;
            trace!("👀️ Checking page {} ({} orders)", summary.pages, page.len());
            for outcome in self.check_page(page).await {
                summary.record(outcome);
            }
        }
        summary
    }

    /// Checks every order in the page. Checks start in page order, oldest first, with at most
    /// `max_concurrent_checks` in flight.
    async fn check_page(&self, page: Vec<Order>) -> Vec<CheckOutcome> {
        let limit = self.config.max_concurrent_checks.max(1);
        let mut outcomes = Vec::with_capacity(page.len());
        let mut in_flight = FuturesUnordered::new();
        for order in page {
            if in_flight.len() >= limit {
                if let Some(outcome) = in_flight.next().await {
                    outcomes.push(outcome);
                }
            }
            in_flight.push(self.check_order_isolated(order));
        }
        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn check_order_isolated(&self, order: Order) -> CheckOutcome {
        let id = order.id;
        match self.check_order(&order).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("👀️ Could not check order {id} ({} error). It will be retried on the next tick. {e}", e.kind());
                CheckOutcome::Failed(id)
            },
        }
    }

    /// Checks a single order, marking it as paid if its address holds at least the minimum balance.
    pub async fn check_order(&self, order: &Order) -> Result<CheckOutcome, OrderFlowError> {
        let Some(address) = order.payment_address.as_deref() else {
            debug!("👀️ Order {} has no payment address. Skipping", order.id);
            return Ok(CheckOutcome::Skipped(order.id));
        };
        let balance = tokio::time::timeout(self.config.chain_timeout, self.chain.balance_at(address))
            .await
            .map_err(|_| ChainQueryError::Timeout(address.to_string()))??;
        if balance < self.config.min_balance {
            trace!("👀️ Order {} at {address} is unpaid (balance {balance})", order.id);
            return Ok(CheckOutcome::Unpaid(order.id));
        }
        let update = OrderUpdate::default().with_status(OrderStatusType::Paid);
        let updated = self.db.update_order(order.id, update).await?;
        info!("👀️💰️ Order {} is paid. {address} holds {balance} wei. Status is now {}", order.id, updated.status);
        Ok(CheckOutcome::Paid(order.id))
    }
}
