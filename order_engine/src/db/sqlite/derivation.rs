use log::trace;
use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::DerivationIndex};

/// Claims the next derivation index.
///
/// The increment and the read happen in one statement, so SQLite's writer lock makes the allocation atomic across
/// every connection and every process sharing the database file. Run this on its own connection, outside the order
/// insert transaction: once it returns, the index is spent whether or not the order is ever stored.
pub async fn allocate_index(conn: &mut SqliteConnection) -> Result<DerivationIndex, SqliteDatabaseError> {
    let allocated: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE derivation_counter
            SET next_index = next_index + 1
            WHERE id = 1
            RETURNING next_index - 1;
        "#,
    )
    .fetch_optional(conn)
    .await?;
    let index = allocated.map(DerivationIndex::from).ok_or(SqliteDatabaseError::MissingDerivationCounter)?;
    trace!("🗃️ Derivation index {index} allocated");
    Ok(index)
}

/// The index that the next call to [`allocate_index`] will return.
pub async fn peek_next_index(conn: &mut SqliteConnection) -> Result<DerivationIndex, SqliteDatabaseError> {
    let next: Option<i64> = sqlx::query_scalar("SELECT next_index FROM derivation_counter WHERE id = 1")
        .fetch_optional(conn)
        .await?;
    next.map(DerivationIndex::from).ok_or(SqliteDatabaseError::MissingDerivationCounter)
}
