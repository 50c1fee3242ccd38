//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the storage traits defined in the [`crate::traits`]
//! module.
use std::{collections::BTreeMap, fmt::Debug};

use log::*;
use loyalty_common::Points;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{balances, new_pool, orders, withdrawals, MIGRATIONS};
use crate::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatusType, OwnerId, Withdrawal},
    traits::{
        AccountCredit,
        InsertOrderResult,
        LedgerManagement,
        LedgerManagementError,
        OrderManagement,
        OrderManagementError,
        ReconciliationResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_owner(owner_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_unresolved_orders(&self, limit: usize) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_unresolved_orders(limit, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_accrual(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_accrual(number, status, accrual, &mut conn).await?;
        match &order {
            Some(o) => trace!("🗃️ Order {} is now {} with accrual {}", o.order_number, o.status, o.accrual),
            None => debug!("🗃️ Order {number} was already final. Ignoring the update to {status}"),
        }
        Ok(order)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn open_account(&self, owner_id: &OwnerId) -> Result<Balance, LedgerManagementError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::open_account(owner_id, &mut conn).await?;
        Ok(balance)
    }

    async fn fetch_balance(&self, owner_id: &OwnerId) -> Result<Option<Balance>, LedgerManagementError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(owner_id, &mut conn).await?;
        Ok(balance)
    }

    /// In a single atomic transaction,
    /// * marks every processed, uncredited order as credited,
    /// * sums the accruals of exactly those orders per owner, and
    /// * adds each sum to the owner's current balance, creating the balance if necessary.
    ///
    /// If anything fails, the transaction is rolled back and the orders stay uncredited.
    async fn credit_processed_orders(&self) -> Result<ReconciliationResult, LedgerManagementError> {
        let mut tx = self.pool.begin().await?;
        let marked = orders::mark_processed_orders_credited(&mut tx).await?;
        if marked.is_empty() {
            tx.commit().await?;
            return Ok(ReconciliationResult::default());
        }
        // Returning early drops the transaction, which rolls back the credited flags.
        let credits = credits_per_owner(marked)?;
        for credit in &credits {
            let balance = balances::credit_balance(&credit.owner_id, credit.amount, &mut tx)
                .await?
                .ok_or_else(|| LedgerManagementError::BalanceOverflow(credit.owner_id.clone()))?;
            trace!(
                "🗃️ Credited {} to {} for {} orders. Current balance is {}",
                credit.amount,
                credit.owner_id,
                credit.orders.len(),
                balance.current
            );
        }
        tx.commit().await?;
        Ok(ReconciliationResult { credits })
    }

    async fn apply_withdrawal(
        &self,
        withdrawal: NewWithdrawal,
    ) -> Result<(Balance, Withdrawal), LedgerManagementError> {
        let mut tx = self.pool.begin().await?;
        let owner_id = withdrawal.owner_id.clone();
        let requested = withdrawal.sum;
        // The conditional debit is the first statement so that the transaction takes the write lock immediately.
        let Some(balance) = balances::debit_balance(&owner_id, requested, &mut tx).await? else {
            let existing = balances::fetch_balance(&owner_id, &mut tx).await?;
            return match existing {
                None => Err(LedgerManagementError::AccountNotFound(owner_id)),
                Some(b) => Err(LedgerManagementError::InsufficientFunds { available: b.current, requested }),
            };
        };
        let withdrawal = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Withdrawal #{} of {requested} recorded for {owner_id}", withdrawal.id);
        Ok((balance, withdrawal))
    }

    async fn fetch_withdrawals(&self, owner_id: &OwnerId) -> Result<Vec<Withdrawal>, LedgerManagementError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_owner(owner_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

/// Groups credited orders by owner, in owner order. Fails if an owner's total does not fit in [`Points`].
fn credits_per_owner(orders: Vec<Order>) -> Result<Vec<AccountCredit>, LedgerManagementError> {
    let mut credits = BTreeMap::<OwnerId, AccountCredit>::new();
    for order in orders {
        let credit = credits.entry(order.owner_id.clone()).or_insert_with(|| AccountCredit {
            owner_id: order.owner_id.clone(),
            amount: Points::default(),
            orders: vec![],
        });
        credit.amount = credit
            .amount
            .checked_add(order.accrual)
            .ok_or_else(|| LedgerManagementError::BalanceOverflow(order.owner_id.clone()))?;
        credit.orders.push(order.order_number);
    }
    Ok(credits.into_values().collect())
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        MIGRATIONS.run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
