use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewWithdrawal, OwnerId, Withdrawal};

/// Records a withdrawal. This does not touch the balance. Use it in the same transaction as
/// [`super::balances::debit_balance`].
pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (owner_id, order_number, sum, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.owner_id.as_str())
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.sum.value())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(withdrawal)
}

/// Fetches all withdrawals for the owner, newest first.
pub async fn fetch_withdrawals_for_owner(
    owner_id: &OwnerId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE owner_id = $1 ORDER BY processed_at DESC, id DESC")
        .bind(owner_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
