use order_engine::{traits::ChainQueryError, wallet::WalletError, OrderFlowError, SqliteDatabaseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Database error. {0}")]
    DatabaseError(#[from] SqliteDatabaseError),
    #[error("The payment wallet could not be loaded. {0}")]
    WalletError(#[from] WalletError),
    #[error("Could not set up the chain client. {0}")]
    ChainError(#[from] ChainQueryError),
    #[error("Startup check failed. {0}")]
    PreflightError(#[from] OrderFlowError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("A background task failed. {0}")]
    TaskError(String),
}
