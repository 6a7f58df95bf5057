use thiserror::Error;

use crate::{
    db_types::{DerivationIndex, OrderId, OrderStatusType},
    traits::OrderManagementError,
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} cannot move from {from} to {to}")]
    ForbiddenStatusTransition { id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Derivation index {0} has already been assigned to another order")]
    DuplicateDerivationIndex(DerivationIndex),
    #[error("The derivation counter row is missing. Have the migrations been run?")]
    MissingDerivationCounter,
}

impl From<SqliteDatabaseError> for OrderManagementError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::OrderNotFound(id) => Self::OrderNotFound(id),
            SqliteDatabaseError::ForbiddenStatusTransition { id, from, to } => {
                Self::ForbiddenStatusTransition { id, from, to }
            },
            SqliteDatabaseError::DuplicateDerivationIndex(idx) => Self::DuplicateDerivationIndex(idx),
            SqliteDatabaseError::MissingDerivationCounter => Self::CounterError(e.to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
