#![allow(dead_code)]
pub mod mock_chain;
pub mod prepare_env;

pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
