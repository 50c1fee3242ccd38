use log::trace;
use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::{Balance, OwnerId};

/// Creates a zero balance for the owner if one does not exist yet. Returns the (possibly pre-existing) balance.
pub async fn open_account(owner_id: &OwnerId, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let result = sqlx::query("INSERT INTO balances (owner_id) VALUES ($1) ON CONFLICT (owner_id) DO NOTHING")
        .bind(owner_id.as_str())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() > 0 {
        trace!("🗃️ Opened a new balance for {owner_id}");
    }
    fetch_balance(owner_id, conn).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_balance(owner_id: &OwnerId, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as("SELECT * FROM balances WHERE owner_id = $1")
        .bind(owner_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Adds `amount` to the owner's current balance in a single statement, creating the balance if it does not exist.
/// The withdrawn total is left unchanged.
///
/// Returns `None` if the sum would not fit in the balance column, in which case nothing changes.
pub async fn credit_balance(
    owner_id: &OwnerId,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<Balance>, sqlx::Error> {
    // SQLite silently turns an overflowing integer sum into a float, so the guard has to be explicit.
    let balance = sqlx::query_as(
        r#"
            INSERT INTO balances (owner_id, "current") VALUES ($1, $2)
            ON CONFLICT (owner_id) DO UPDATE SET
                "current" = "current" + excluded."current",
                updated_at = CURRENT_TIMESTAMP
            WHERE "current" <= 9223372036854775807 - excluded."current"
            RETURNING *;
        "#,
    )
    .bind(owner_id.as_str())
    .bind(amount.value())
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}

/// Moves `amount` from the owner's current balance to the withdrawn total, but only if the current balance covers it.
///
/// Returns `None` if the balance is missing or too small, in which case nothing changes.
pub async fn debit_balance(
    owner_id: &OwnerId,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            UPDATE balances
            SET "current" = "current" - $1, withdrawn = withdrawn + $1, updated_at = CURRENT_TIMESTAMP
            WHERE owner_id = $2 AND "current" >= $1
            RETURNING *;
        "#,
    )
    .bind(amount.value())
    .bind(owner_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}
