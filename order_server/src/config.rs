use std::{env, fmt::Display, str::FromStr, time::Duration};

use alloy::primitives::U256;
use bs_common::{helpers::parse_boolean_flag, Secret};
use log::*;
use order_engine::{
    payment_watcher::{DEFAULT_CHAIN_TIMEOUT, DEFAULT_PAGE_SIZE, DEFAULT_WATCHER_INTERVAL},
    wallet::ETHEREUM_COIN_TYPE,
    WatcherConfig,
};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/black_shop_orders.db";
const DEFAULT_CHAIN_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_PREFLIGHT_SAMPLE: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// If true, pending schema migrations are applied at startup.
    pub run_migrations: bool,
    /// The JSON-RPC endpoint used for balance queries.
    pub chain_rpc_url: String,
    /// The BIP-39 phrase all payment addresses are derived from. Never logged.
    pub mnemonic: Secret<String>,
    pub coin_type: u32,
    pub wallet_account: u32,
    /// If true, the startup check that stored payment addresses match the configured wallet is skipped.
    pub skip_preflight: bool,
    /// The number of orders awaiting payment that the startup check re-derives.
    pub preflight_sample: u32,
    pub watcher: WatcherConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            chain_rpc_url: DEFAULT_CHAIN_RPC_URL.to_string(),
            mnemonic: Secret::default(),
            coin_type: ETHEREUM_COIN_TYPE,
            wallet_account: 0,
            skip_preflight: false,
            preflight_sample: DEFAULT_PREFLIGHT_SAMPLE,
            watcher: WatcherConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("BS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env_or_default("BS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("BS_RUN_MIGRATIONS").ok(), true);
        let chain_rpc_url = env::var("BS_CHAIN_RPC_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BS_CHAIN_RPC_URL is not set. Using the default, {DEFAULT_CHAIN_RPC_URL}.");
            DEFAULT_CHAIN_RPC_URL.to_string()
        });
        let mnemonic = env::var("BS_MNEMONIC").ok().unwrap_or_else(|| {
            error!("🪛️ BS_MNEMONIC is not set. Please set it to the seed phrase of the shop's payment wallet.");
            String::default()
        });
        let mnemonic = Secret::new(mnemonic);
        let coin_type = env_or_default("BS_COIN_TYPE", ETHEREUM_COIN_TYPE);
        let wallet_account = env_or_default("BS_WALLET_ACCOUNT", 0u32);
        let skip_preflight = parse_boolean_flag(env::var("BS_SKIP_PREFLIGHT").ok(), false);
        let preflight_sample = env_or_default("BS_PREFLIGHT_SAMPLE", DEFAULT_PREFLIGHT_SAMPLE);
        let watcher = watcher_config_from_env();
        Self {
            database_url,
            max_connections,
            run_migrations,
            chain_rpc_url,
            mnemonic,
            coin_type,
            wallet_account,
            skip_preflight,
            preflight_sample,
            watcher,
        }
    }
}

fn watcher_config_from_env() -> WatcherConfig {
    let interval = Duration::from_secs(env_or_default("BS_WATCHER_INTERVAL", DEFAULT_WATCHER_INTERVAL.as_secs()));
    let page_size = env_or_default("BS_WATCHER_PAGE_SIZE", DEFAULT_PAGE_SIZE);
    let chain_timeout = Duration::from_secs(env_or_default("BS_CHAIN_TIMEOUT", DEFAULT_CHAIN_TIMEOUT.as_secs()));
    let max_concurrent_checks = env_or_default("BS_WATCHER_CONCURRENCY", 1usize);
    let min_balance = env_or_default("BS_MIN_PAYMENT_WEI", U256::from(1));
    let mut config = WatcherConfig { interval, page_size, chain_timeout, min_balance, max_concurrent_checks };
    if config.interval.is_zero() {
        warn!("🪛️ BS_WATCHER_INTERVAL cannot be zero. Using the default, {DEFAULT_WATCHER_INTERVAL:?}.");
        config.interval = DEFAULT_WATCHER_INTERVAL;
    }
    if config.page_size == 0 {
        warn!("🪛️ BS_WATCHER_PAGE_SIZE cannot be zero. Using the default, {DEFAULT_PAGE_SIZE}.");
        config.page_size = DEFAULT_PAGE_SIZE;
    }
    if config.chain_timeout.is_zero() {
        warn!("🪛️ BS_CHAIN_TIMEOUT cannot be zero. Using the default, {DEFAULT_CHAIN_TIMEOUT:?}.");
        config.chain_timeout = DEFAULT_CHAIN_TIMEOUT;
    }
    if config.max_concurrent_checks == 0 {
        warn!("🪛️ BS_WATCHER_CONCURRENCY cannot be zero. Checking orders one at a time.");
        config.max_concurrent_checks = 1;
    }
    config
}

/// Reads and parses `name`, falling back to `default` if it is unset or invalid.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {default}."))
        .and_then(|s| {
            s.trim().parse::<T>().map_err(|e| {
                warn!("🪛️ Invalid configuration value for {name} ({s}). {e} Using the default value of {default}.")
            })
        })
        .ok()
        .unwrap_or(default)
}
