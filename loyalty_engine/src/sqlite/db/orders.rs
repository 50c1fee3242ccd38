use log::{debug, trace};
use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, OwnerId},
    traits::InsertOrderResult,
};

/// Inserts the order unless an order with the same number already exists, in which case the existing order is
/// returned instead.
///
/// The insert relies on the unique constraint on `order_number`, so two concurrent calls for the same number can
/// never both insert.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, sqlx::Error> {
    let inserted: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_number, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(order.owner_id.as_str())
    .bind(order.created_at)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(order) => {
            debug!("🗃️ Order {} inserted with id {}", order.order_number, order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        None => {
            let existing = fetch_order_by_number(&order.order_number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            trace!("🗃️ Order {} already exists (owner {})", existing.order_number, existing.owner_id);
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches all the orders for the given owner, newest first.
pub async fn fetch_orders_for_owner(owner_id: &OwnerId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE owner_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(owner_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches up to `limit` orders in `New` or `Processing` status, oldest first.
pub async fn fetch_unresolved_orders(limit: usize, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY created_at ASC, id ASC
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Sets the status and accrual of an order that has not been finalised yet. Orders that are already `Processed` or
/// `Invalid` are left untouched, and `None` is returned.
pub async fn update_order_accrual(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = $1, accrual = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $3 AND status IN ('NEW', 'PROCESSING')
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(accrual.value())
    .bind(number.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Marks every order that has been processed, but not yet credited, as credited, and returns those orders.
///
/// Selecting and marking happen in one statement, so the returned rows are exactly the rows that changed. This is not
/// atomic with respect to the balance updates. Call it inside the same transaction that credits the balances.
pub async fn mark_processed_orders_credited(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET credited = 1, updated_at = CURRENT_TIMESTAMP
            WHERE status = 'PROCESSED' AND credited = 0
            RETURNING *;
        "#,
    )
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} processed orders marked as credited", orders.len());
    Ok(orders)
}
