use std::collections::HashMap;

use bs_common::Cents;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{
        DerivationIndex,
        NewOrder,
        Order,
        OrderCursor,
        OrderId,
        OrderItem,
        OrderStatusType,
        OrderUpdate,
        PaymentMethod,
    },
};

const ORDER_COLUMNS: &str = "id, user_id, total_price, status, payment_method, payment_address, transaction_id, \
                             derivation_index, created_at, updated_at";

/// The `orders` table row. Items live in their own table and are attached afterwards.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: String,
    total_price: Cents,
    status: OrderStatusType,
    payment_method: PaymentMethod,
    payment_address: Option<String>,
    transaction_id: Option<String>,
    derivation_index: Option<DerivationIndex>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total_price: self.total_price,
            payment_method: self.payment_method,
            payment_address: self.payment_address,
            transaction_id: self.transaction_id,
            derivation_index: self.derivation_index,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: String,
    quantity: i64,
    price: Cents,
}

/// Inserts the order header and all of its items using the given connection. This is not atomic on its own. Call it
/// inside a transaction, passing `&mut *tx` as the connection argument, so that a failure on any item leaves nothing
/// behind.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let result = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO orders (
                user_id,
                total_price,
                status,
                payment_method,
                payment_address,
                derivation_index,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id;
        "#,
    )
    .bind(&order.user_id)
    .bind(order.total_price)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(&order.payment_address)
    .bind(order.derivation_index)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await;
    let id = match result {
        Ok(id) => OrderId::from(id),
        // The payment address is derived from the index, so a clash on either column is a reused index
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => match order.derivation_index {
            Some(index) => return Err(SqliteDatabaseError::DuplicateDerivationIndex(index)),
            None => return Err(sqlx::Error::Database(e).into()),
        },
        Err(e) => return Err(e.into()),
    };
    for item in &order.items {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *conn)
            .await?;
    }
    trace!("🗃️ Order {id} stored with {} items", order.items.len());
    Ok(Order::from_new_order(id, order))
}

pub async fn fetch_order_by_id(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => {
            let mut orders = attach_items(vec![row], conn).await?;
            Ok(orders.pop())
        },
        None => Ok(None),
    }
}

/// Fetches a page of `AWAITING_PAYMENT` orders, oldest first, starting after `after` when it is given. Ties on
/// `created_at` are broken by id, so the key is unique and paging is stable.
pub async fn fetch_awaiting_payment(
    limit: u32,
    after: Option<OrderCursor>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status = "));
    builder.push_bind(OrderStatusType::AwaitingPayment);
    if let Some(cursor) = after {
        builder.push(" AND (created_at > ");
        builder.push_bind(cursor.created_at);
        builder.push(" OR (created_at = ");
        builder.push_bind(cursor.created_at);
        builder.push(" AND id > ");
        builder.push_bind(cursor.id);
        builder.push("))");
    }
    builder.push(" ORDER BY created_at ASC, id ASC LIMIT ");
    builder.push_bind(i64::from(limit));
    let rows = builder.build_query_as::<OrderRow>().fetch_all(&mut *conn).await?;
    trace!("🗃️ Fetched {} awaiting-payment orders (limit {limit}, after {after:?})", rows.len());
    attach_items(rows, conn).await
}

pub async fn fetch_orders_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    attach_items(rows, conn).await
}

async fn attach_items(rows: Vec<OrderRow>, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder =
        QueryBuilder::<Sqlite>::new("SELECT order_id, product_id, quantity, price FROM order_items WHERE order_id IN (");
    let mut ids = builder.separated(", ");
    for row in &rows {
        ids.push_bind(row.id);
    }
    builder.push(") ORDER BY id ASC");
    let items = builder.build_query_as::<OrderItemRow>().fetch_all(conn).await?;
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::with_capacity(rows.len());
    for item in items {
        by_order.entry(item.order_id).or_default().push(OrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        });
    }
    let orders = rows
        .into_iter()
        .map(|row| {
            let items = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect();
    Ok(orders)
}

/// Applies `update` to the order with the given id.
///
/// The status guard is part of the `UPDATE` itself, so the check and the write are one atomic step: two watchers that
/// both try to mark the same order as paid cannot interleave badly. When nothing is written, the stored order decides
/// the result: it is gone, it already has the requested status (success, nothing to do), or the move is not allowed.
pub async fn update_order(
    id: OrderId,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for order {id}. Update request skipped.");
        return fetch_order_by_id(id, conn).await?.ok_or(SqliteDatabaseError::OrderNotFound(id));
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(status) = update.status {
        builder.push(", status = ");
        builder.push_bind(status);
    }
    if let Some(txid) = &update.transaction_id {
        builder.push(", transaction_id = ");
        builder.push_bind(txid.clone());
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    if let Some(status) = update.status {
        let allowed = status.allowed_predecessors();
        if allowed.is_empty() {
            builder.push(" AND 0");
        } else {
            builder.push(" AND status IN (");
            let mut statuses = builder.separated(", ");
            for s in allowed {
                statuses.push_bind(*s);
            }
            builder.push(")");
        }
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder.build().execute(&mut *conn).await?;
    let order = fetch_order_by_id(id, conn).await?.ok_or(SqliteDatabaseError::OrderNotFound(id))?;
    if res.rows_affected() > 0 {
        trace!("🗃️ Order {id} updated. Status is now {}", order.status);
        return Ok(order);
    }
    match update.status {
        Some(status) if status == order.status => {
            debug!("🗃️ Order {id} already has status {status}. No action to take");
            Ok(order)
        },
        Some(status) => Err(SqliteDatabaseError::ForbiddenStatusTransition { id, from: order.status, to: status }),
        None => Ok(order),
    }
}
