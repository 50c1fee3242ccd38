use loyalty_common::Points;
use thiserror::Error;

use crate::{
    db_types::{Balance, NewWithdrawal, OwnerId, Withdrawal},
    traits::ReconciliationResult,
};

#[derive(Debug, Clone, Error)]
pub enum LedgerManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No balance exists for user {0}")]
    AccountNotFound(OwnerId),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { available: Points, requested: Points },
    #[error("Crediting user {0} would overflow their balance")]
    BalanceOverflow(OwnerId),
}

impl From<sqlx::Error> for LedgerManagementError {
    fn from(e: sqlx::Error) -> Self {
        LedgerManagementError::DatabaseError(e.to_string())
    }
}

/// The `LedgerManagement` trait defines behaviour for the balance ledger.
///
/// Implementations must guarantee that
/// * the current balance of an account never becomes negative,
/// * each processed order is credited exactly once, and
/// * a withdrawal record is written if, and only if, the balance is debited.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Creates a zero balance for the owner if one does not exist yet, and returns the balance.
    async fn open_account(&self, owner_id: &OwnerId) -> Result<Balance, LedgerManagementError>;

    async fn fetch_balance(&self, owner_id: &OwnerId) -> Result<Option<Balance>, LedgerManagementError>;

    /// In a single atomic transaction,
    /// * selects every `Processed` order that has not been credited yet,
    /// * marks those orders as credited, and
    /// * adds the sum of their accruals to each owner's current balance, creating the balance if necessary.
    ///
    /// If the transaction fails, nothing is credited and the same orders are picked up on the next call.
    async fn credit_processed_orders(&self) -> Result<ReconciliationResult, LedgerManagementError>;

    /// In a single atomic transaction, debits `withdrawal.sum` from the owner's current balance, adds it to the
    /// withdrawn total and records the withdrawal.
    ///
    /// Fails with `AccountNotFound` if the owner has no balance, and with `InsufficientFunds` if the debit would make
    /// the balance negative. In both cases nothing is written.
    async fn apply_withdrawal(
        &self,
        withdrawal: NewWithdrawal,
    ) -> Result<(Balance, Withdrawal), LedgerManagementError>;

    /// Fetches all withdrawals made by the owner, newest first.
    async fn fetch_withdrawals(&self, owner_id: &OwnerId) -> Result<Vec<Withdrawal>, LedgerManagementError>;
}
