use std::sync::Arc;

use bs_common::Secret;
use log::*;
use order_engine::{
    FixedPriceCatalog,
    MasterSecret,
    MemoryCartStore,
    OrderManagement,
    OrderService,
    SqliteDatabase,
    WalletService,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use super::TEST_MNEMONIC;

pub type TestOrderService = OrderService<SqliteDatabase, MemoryCartStore, FixedPriceCatalog>;

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("bs_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub fn test_wallet() -> Arc<WalletService> {
    let secret = MasterSecret::from_phrase(&Secret::new(TEST_MNEMONIC.to_string())).expect("Test mnemonic is valid");
    Arc::new(WalletService::new(&secret))
}

/// A fresh database with an order service on top of it, using the in-memory cart store and the $10 catalog.
pub async fn new_order_service() -> TestOrderService {
    let db = prepare_test_env(&random_db_path()).await;
    OrderService::new(db, MemoryCartStore::default(), FixedPriceCatalog::default(), test_wallet())
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        error!("🚀️ Failed to drop database {url}: {e}");
    }
}
