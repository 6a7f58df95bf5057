use std::time::Duration;

use alloy::primitives::U256;
use order_engine::{
    db_types::{DerivationIndex, NewOrder, Order, OrderCursor, OrderId, OrderStatusType, OrderUpdate, PaymentMethod},
    order_objects::CartItem,
    traits::{ChainClient, ChainQueryError, OrderManagementError},
    OrderManagement,
    PaymentWatcher,
    SqliteDatabase,
    WatcherConfig,
};
use tokio::sync::watch;

use crate::support::{
    mock_chain::MockChainClient,
    prepare_env::{new_order_service, tear_down, TestOrderService},
};

mod support;

async fn crypto_orders(api: &TestOrderService, count: usize) -> Vec<Order> {
    let mut orders = Vec::with_capacity(count);
    for i in 0..count {
        let user = format!("watcher-user-{i}");
        api.add_item_to_cart(&user, CartItem::new("A", 1)).await.unwrap();
        orders.push(api.create_order_from_cart(&user, PaymentMethod::Crypto).await.unwrap());
    }
    orders
}

fn address(order: &Order) -> &str {
    order.payment_address.as_deref().unwrap()
}

async fn status(db: &SqliteDatabase, id: OrderId) -> OrderStatusType {
    db.fetch_order_by_id(id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn funded_orders_become_paid() {
    let api = new_order_service().await;
    let db = api.db().clone();
    let orders = crypto_orders(&api, 1).await;
    let chain = MockChainClient::default();
    let watcher = PaymentWatcher::new(db.clone(), chain.clone(), WatcherConfig::default());

    let summary = watcher.run_tick().await;
    assert_eq!((summary.checked, summary.unpaid, summary.paid), (1, 1, 0));
    assert_eq!(status(&db, orders[0].id).await, OrderStatusType::AwaitingPayment);

    chain.set_balance(address(&orders[0]), 1);
    let summary = watcher.run_tick().await;
    assert_eq!((summary.checked, summary.paid), (1, 1));
    assert_eq!(status(&db, orders[0].id).await, OrderStatusType::Paid);

    let summary = watcher.run_tick().await;
    assert_eq!(summary.checked, 0);
    assert_eq!(status(&db, orders[0].id).await, OrderStatusType::Paid);
    assert_eq!(chain.calls(), 2);
    tear_down(db).await;
}

#[tokio::test]
async fn fiat_orders_are_not_watched() {
    let api = new_order_service().await;
    api.add_item_to_cart("fiat-user", CartItem::new("A", 1)).await.unwrap();
    let order = api.create_order_from_cart("fiat-user", PaymentMethod::Fiat).await.unwrap();
    let chain = MockChainClient::default();
    let watcher = PaymentWatcher::new(api.db().clone(), chain.clone(), WatcherConfig::default());
    let summary = watcher.run_tick().await;
    assert_eq!(summary.checked, 0);
    assert_eq!(chain.calls(), 0);
    assert_eq!(status(api.db(), order.id).await, OrderStatusType::Pending);
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn minimum_balance_is_respected() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 2).await;
    let chain = MockChainClient::default();
    chain.set_balance(address(&orders[0]), 999);
    chain.set_balance(address(&orders[1]), 1000);
    let config = WatcherConfig { min_balance: U256::from(1000), ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), chain, config);
    let summary = watcher.run_tick().await;
    assert_eq!((summary.paid, summary.unpaid), (1, 1));
    assert_eq!(status(api.db(), orders[0].id).await, OrderStatusType::AwaitingPayment);
    assert_eq!(status(api.db(), orders[1].id).await, OrderStatusType::Paid);
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn one_failing_order_does_not_stop_the_others() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 3).await;
    let chain = MockChainClient::default();
    for order in &orders {
        chain.set_balance(address(order), 5);
    }
    chain.fail_for(address(&orders[1]));
    let watcher = PaymentWatcher::new(api.db().clone(), chain, WatcherConfig::default());
    let summary = watcher.run_tick().await;
    assert_eq!((summary.checked, summary.paid, summary.failed), (3, 2, 1));
    assert!(!summary.aborted);
    assert_eq!(status(api.db(), orders[0].id).await, OrderStatusType::Paid);
    assert_eq!(status(api.db(), orders[1].id).await, OrderStatusType::AwaitingPayment);
    assert_eq!(status(api.db(), orders[2].id).await, OrderStatusType::Paid);
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn slow_chain_times_out() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 1).await;
    let chain = MockChainClient::default();
    chain.set_balance(address(&orders[0]), 5);
    chain.set_delay(Duration::from_millis(500));
    let config = WatcherConfig { chain_timeout: Duration::from_millis(20), ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), chain, config);
    let summary = watcher.run_tick().await;
    assert_eq!(summary.failed, 1);
    assert_eq!(status(api.db(), orders[0].id).await, OrderStatusType::AwaitingPayment);
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn every_page_is_scanned() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 7).await;
    let chain = MockChainClient::default();
    // Fund every other order, so that each page has a mix of paid and unpaid orders
    for order in orders.iter().step_by(2) {
        chain.set_balance(address(order), 1);
    }
    let config = WatcherConfig { page_size: 2, ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), chain.clone(), config);
    let summary = watcher.run_tick().await;
    assert_eq!(summary.checked, 7);
    assert_eq!(summary.paid, 4);
    assert_eq!(summary.unpaid, 3);
    assert_eq!(chain.calls(), 7);
    for (i, order) in orders.iter().enumerate() {
        let expected = if i % 2 == 0 { OrderStatusType::Paid } else { OrderStatusType::AwaitingPayment };
        assert_eq!(status(api.db(), order.id).await, expected);
    }
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn concurrent_checks() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 10).await;
    let chain = MockChainClient::default();
    for order in &orders {
        chain.set_balance(address(order), 1);
    }
    chain.set_delay(Duration::from_millis(10));
    let config = WatcherConfig { max_concurrent_checks: 4, page_size: 3, ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), chain, config);
    let summary = watcher.run_tick().await;
    assert_eq!((summary.checked, summary.paid), (10, 10));
    assert!(api.db().fetch_awaiting_payment(100, None).await.unwrap().is_empty());
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn shutdown_stops_the_loop_and_closes_the_chain() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 1).await;
    let chain = MockChainClient::default();
    chain.set_balance(address(&orders[0]), 1);
    let config = WatcherConfig { interval: Duration::from_millis(20), ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), chain.clone(), config);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(watcher.run(rx));

    let mut waited = Duration::ZERO;
    while status(api.db(), orders[0].id).await != OrderStatusType::Paid {
        assert!(waited < Duration::from_secs(5), "Order was never marked as paid");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(chain.is_closed());
    tear_down(api.db().clone()).await;
}

#[tokio::test]
async fn repository_stays_open_after_shutdown() {
    let api = new_order_service().await;
    crypto_orders(&api, 1).await;
    let config = WatcherConfig { interval: Duration::from_millis(10), ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), MockChainClient::default(), config);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(watcher.run(rx));
    tokio::time::sleep(Duration::from_millis(30)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();

    api.add_item_to_cart("after-shutdown", CartItem::new("A", 1)).await.unwrap();
    let order = api.create_order_from_cart("after-shutdown", PaymentMethod::Crypto).await.unwrap();
    assert_eq!(order.status, OrderStatusType::AwaitingPayment);
    assert_eq!(api.orders_for_user("after-shutdown").await.unwrap().len(), 1);
    tear_down(api.db().clone()).await;
}

/// Funds every address, but cancels one order the moment its balance is asked for, as if a customer had cancelled
/// it while the scan was running.
#[derive(Clone)]
struct CancellingChain {
    db: SqliteDatabase,
    cancel: (String, OrderId),
}

impl ChainClient for CancellingChain {
    async fn balance_at(&self, address: &str) -> Result<U256, ChainQueryError> {
        let (cancel_address, id) = &self.cancel;
        if address == cancel_address {
            let update = OrderUpdate::default().with_status(OrderStatusType::Cancelled);
            self.db.update_order(*id, update).await.map_err(|e| ChainQueryError::RpcError(e.to_string()))?;
            return Ok(U256::ZERO);
        }
        Ok(U256::from(1))
    }
}

#[tokio::test]
async fn orders_leaving_the_queue_mid_scan_do_not_hide_others() {
    let api = new_order_service().await;
    let orders = crypto_orders(&api, 5).await;
    let chain = CancellingChain { db: api.db().clone(), cancel: (address(&orders[0]).to_string(), orders[0].id) };
    let config = WatcherConfig { page_size: 2, ..Default::default() };
    let watcher = PaymentWatcher::new(api.db().clone(), chain, config);
    let summary = watcher.run_tick().await;
    assert_eq!(summary.checked, 5);
    assert_eq!(summary.paid, 4);
    assert_eq!(status(api.db(), orders[0].id).await, OrderStatusType::Cancelled);
    for order in &orders[1..] {
        assert_eq!(status(api.db(), order.id).await, OrderStatusType::Paid);
    }
    tear_down(api.db().clone()).await;
}

/// A repository that cannot be read from.
#[derive(Clone)]
struct BrokenRepository;

impl OrderManagement for BrokenRepository {
    fn url(&self) -> &str {
        "broken://"
    }

    async fn next_derivation_index(&self) -> Result<DerivationIndex, OrderManagementError> {
        Err(OrderManagementError::CounterError("unavailable".into()))
    }

    async fn insert_order(&self, _order: NewOrder) -> Result<Order, OrderManagementError> {
        Err(OrderManagementError::DatabaseError("unavailable".into()))
    }

    async fn update_order(&self, id: OrderId, _update: OrderUpdate) -> Result<Order, OrderManagementError> {
        Err(OrderManagementError::OrderNotFound(id))
    }

    async fn fetch_awaiting_payment(
        &self,
        _limit: u32,
        _after: Option<OrderCursor>,
    ) -> Result<Vec<Order>, OrderManagementError> {
        Err(OrderManagementError::DatabaseError("unavailable".into()))
    }

    async fn fetch_order_by_id(&self, _id: OrderId) -> Result<Option<Order>, OrderManagementError> {
        Err(OrderManagementError::DatabaseError("unavailable".into()))
    }

    async fn fetch_orders_for_user(&self, _user_id: &str) -> Result<Vec<Order>, OrderManagementError> {
        Err(OrderManagementError::DatabaseError("unavailable".into()))
    }
}

#[tokio::test]
async fn scan_errors_abort_the_tick_but_not_the_loop() {
    let chain = MockChainClient::default();
    let config = WatcherConfig { interval: Duration::from_millis(10), ..Default::default() };
    let watcher = PaymentWatcher::new(BrokenRepository, chain.clone(), config);
    let summary = watcher.run_tick().await;
    assert!(summary.aborted);
    assert_eq!(summary.checked, 0);

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(watcher.run(rx));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());
    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(chain.is_closed());
    assert_eq!(chain.calls(), 0);
}
