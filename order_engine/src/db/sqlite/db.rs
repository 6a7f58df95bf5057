//! `SqliteDatabase` is the concrete order repository backend.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{db_url, derivation, new_pool, orders, SqliteDatabaseError, MIGRATOR};
use crate::{
    db_types::{DerivationIndex, NewOrder, Order, OrderCursor, OrderId, OrderUpdate},
    traits::{OrderManagement, OrderManagementError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn next_derivation_index(&self) -> Result<DerivationIndex, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let index = derivation::allocate_index(&mut conn).await?;
        Ok(index)
    }

    /// Stores the order header and all of its items in one transaction. If any statement fails, the transaction is
    /// rolled back when `tx` is dropped and nothing is stored.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await.map_err(SqliteDatabaseError::from)?;
        let user_id = order.user_id.clone();
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await.map_err(SqliteDatabaseError::from)?;
        debug!("🗃️ Order {} for user {user_id} has been saved in the DB ({})", order.id, order.total_price);
        Ok(order)
    }

    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        trace!("🗃️ Order {id} updating with new values: {update:?}");
        let order = orders::update_order(id, update, &mut conn).await?;
        trace!("🗃️ Order {id} has been updated.");
        Ok(order)
    }

    async fn fetch_awaiting_payment(
        &self,
        limit: u32,
        after: Option<OrderCursor>,
    ) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let orders = orders::fetch_awaiting_payment(limit, after, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `BS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in the binary.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        MIGRATOR.run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// The derivation index that the next crypto order will receive.
    pub async fn peek_next_derivation_index(&self) -> Result<DerivationIndex, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        derivation::peek_next_index(&mut conn).await
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
