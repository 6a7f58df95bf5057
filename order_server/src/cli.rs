use std::{env, env::VarError};

/// The server takes no arguments, so any argument prints the help.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // BS_MNEMONIC is deliberately absent
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "BS_DATABASE_URL",
        "BS_DB_MAX_CONNECTIONS",
        "BS_RUN_MIGRATIONS",
        "BS_CHAIN_RPC_URL",
        "BS_COIN_TYPE",
        "BS_WALLET_ACCOUNT",
        "BS_WATCHER_INTERVAL",
        "BS_WATCHER_PAGE_SIZE",
        "BS_WATCHER_CONCURRENCY",
        "BS_CHAIN_TIMEOUT",
        "BS_MIN_PAYMENT_WEI",
        "BS_SKIP_PREFLIGHT",
        "BS_PREFLIGHT_SAMPLE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
