use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy::primitives::U256;
use bs_common::Secret;
use order_engine::{
    db_types::{OrderStatusType, PaymentMethod},
    order_objects::CartItem,
    traits::{ChainClient, ChainQueryError},
    FixedPriceCatalog,
    MasterSecret,
    MemoryCartStore,
    OrderManagement,
    OrderService,
    WalletService,
    WatcherConfig,
};
use order_server::{
    config::ServerConfig,
    errors::ServerError,
    payment_worker::start_payment_worker,
    server::{create_server_context, preflight_checks},
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
const OTHER_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn test_config() -> ServerConfig {
    let _ = env_logger::try_init();
    let path = std::env::temp_dir().join(format!("bs_server_test_{}.db", rand::random::<u64>()));
    ServerConfig {
        database_url: format!("sqlite://{}", path.display()),
        max_connections: 5,
        mnemonic: Secret::new(TEST_MNEMONIC.to_string()),
        ..Default::default()
    }
}

async fn drop_db(config: &ServerConfig) {
    let _ = Sqlite::drop_database(&config.database_url).await;
}

#[tokio::test]
async fn bad_mnemonic_stops_startup() {
    let mut config = test_config();
    config.mnemonic = Secret::new(vec!["abandon"; 12].join(" "));
    let err = create_server_context(&config).await.err().unwrap();
    assert!(matches!(err, ServerError::WalletError(_)));
    assert!(!Sqlite::database_exists(&config.database_url).await.unwrap_or(false));

    config.mnemonic = Secret::default();
    let err = create_server_context(&config).await.err().unwrap();
    assert!(matches!(err, ServerError::WalletError(_)));
}

#[tokio::test]
async fn preflight_accepts_our_own_orders() {
    let config = test_config();
    let context = create_server_context(&config).await.unwrap();
    for user in ["alice", "bob"] {
        context.orders.add_item_to_cart(user, CartItem::new("A", 1)).await.unwrap();
        context.orders.create_order_from_cart(user, PaymentMethod::Crypto).await.unwrap();
    }
    assert_eq!(preflight_checks(&context, 25).await.unwrap(), 2);
    assert_eq!(preflight_checks(&context, 1).await.unwrap(), 1);
    drop_db(&config).await;
}

#[tokio::test]
async fn preflight_rejects_orders_from_another_wallet() {
    let config = test_config();
    let context = create_server_context(&config).await.unwrap();
    let other = MasterSecret::from_phrase(&Secret::new(OTHER_MNEMONIC.to_string())).unwrap();
    let other = Arc::new(WalletService::new(&other));
    let api = OrderService::new(context.db.clone(), MemoryCartStore::default(), FixedPriceCatalog::default(), other);
    api.add_item_to_cart("carol", CartItem::new("A", 1)).await.unwrap();
    api.create_order_from_cart("carol", PaymentMethod::Crypto).await.unwrap();
    let err = preflight_checks(&context, 25).await.unwrap_err();
    assert!(matches!(err, ServerError::PreflightError(_)));
    drop_db(&config).await;
}

#[derive(Clone, Default)]
struct RichChain {
    closed: Arc<AtomicBool>,
}

impl ChainClient for RichChain {
    async fn balance_at(&self, _address: &str) -> Result<U256, ChainQueryError> {
        Ok(U256::from(1_000_000u64))
    }

    async fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn payment_worker_runs_until_stopped() {
    let config = test_config();
    let context = create_server_context(&config).await.unwrap();
    context.orders.add_item_to_cart("dan", CartItem::new("A", 3)).await.unwrap();
    let order = context.orders.create_order_from_cart("dan", PaymentMethod::Crypto).await.unwrap();

    let chain = RichChain::default();
    let watcher_config = WatcherConfig { interval: Duration::from_millis(20), ..Default::default() };
    let worker = start_payment_worker(context.db.clone(), chain.clone(), watcher_config);
    let mut paid = false;
    for _ in 0..250 {
        let status = context.db.fetch_order_by_id(order.id).await.unwrap().map(|o| o.status);
        if status == Some(OrderStatusType::Paid) {
            paid = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(paid, "The watcher never marked the order as paid");
    assert!(!worker.is_finished());
    tokio::time::timeout(Duration::from_secs(5), worker.stop()).await.unwrap().unwrap();
    assert!(chain.closed.load(Ordering::SeqCst));
    drop_db(&config).await;
}
