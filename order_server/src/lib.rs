//! # Black Shop order server
//! This crate hosts the long-running process for the order engine. It is responsible for:
//! Loading the payment wallet from the configured mnemonic, and refusing to start if it is invalid.
//! Connecting to the order database and bringing its schema up to date.
//! Checking that the stored payment addresses belong to the configured wallet.
//! Running the payment watcher until the process is asked to stop.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod payment_worker;
pub mod server;
