use std::sync::Arc;

use log::*;
use order_engine::{
    EthereumChainClient,
    FixedPriceCatalog,
    MasterSecret,
    MemoryCartStore,
    OrderManagement,
    OrderService,
    SqliteDatabase,
    WalletService,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    payment_worker::{start_payment_worker, PaymentWorker},
};

pub type ShopOrderService = OrderService<SqliteDatabase, MemoryCartStore, FixedPriceCatalog>;

/// Everything the server needs at runtime, built from the configuration.
pub struct ServerContext {
    pub db: SqliteDatabase,
    pub wallet: Arc<WalletService>,
    pub orders: ShopOrderService,
}

/// Builds the wallet first, so that a bad mnemonic stops the server before anything else is touched.
pub async fn create_server_context(config: &ServerConfig) -> Result<ServerContext, ServerError> {
    let secret = MasterSecret::from_phrase(&config.mnemonic)?;
    let wallet = WalletService::new(&secret).with_coin_type(config.coin_type).with_account(config.wallet_account);
    let wallet = Arc::new(wallet);
    info!("🚀️ Payment wallet loaded. {wallet:?}");
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections).await?;
    if config.run_migrations {
        db.run_migrations().await?;
    } else {
        info!("🚀️ Skipping database migrations");
    }
    let orders =
        OrderService::new(db.clone(), MemoryCartStore::default(), FixedPriceCatalog::default(), Arc::clone(&wallet));
    Ok(ServerContext { db, wallet, orders })
}

/// Re-derives the payment address of a sample of the orders awaiting payment and checks that it matches the stored
/// one. A mismatch means the server has been started with a different wallet from the one the orders were created
/// with, and the watcher would be looking after funds it cannot spend.
pub async fn preflight_checks(context: &ServerContext, sample: u32) -> Result<usize, ServerError> {
    let orders = context.db.fetch_awaiting_payment(sample, None).await.map_err(|e| {
        ServerError::InitializeError(format!("Could not read orders awaiting payment for the preflight check. {e}"))
    })?;
    for order in &orders {
        context.orders.payment_address_for(order.id).await?;
    }
    info!("🚀️ Preflight check passed. {} payment addresses verified", orders.len());
    Ok(orders.len())
}

/// Starts the payment watcher and runs until Ctrl-C is received.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let context = create_server_context(&config).await?;
    if config.skip_preflight {
        warn!("🚨️ Preflight checks are disabled. Stored payment addresses have not been checked against the wallet.");
    } else {
        preflight_checks(&context, config.preflight_sample).await?;
    }
    let chain = EthereumChainClient::new(&config.chain_rpc_url)?;
    let worker = start_payment_worker(context.db.clone(), chain, config.watcher.clone());
    wait_for_shutdown(&worker).await?;
    worker.stop().await?;
    let mut db = context.db;
    db.close().await;
    Ok(())
}

async fn wait_for_shutdown(worker: &PaymentWorker) -> Result<(), ServerError> {
    tokio::signal::ctrl_c().await?;
    info!("🚀️ Ctrl-C received. Shutting down");
    if worker.is_finished() {
        warn!("🚀️ The payment watcher had already stopped");
    }
    Ok(())
}
