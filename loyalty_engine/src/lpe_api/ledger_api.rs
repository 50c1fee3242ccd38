use std::fmt::Debug;

use log::*;
use loyalty_common::Points;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, OwnerId, Withdrawal},
    helpers::is_valid_order_number,
    lpe_api::errors::LedgerApiError,
    traits::{LedgerManagement, ReconciliationResult},
};

/// A user's spendable and withdrawn totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<Balance> for BalanceSummary {
    fn from(balance: Balance) -> Self {
        Self { current: balance.current, withdrawn: balance.withdrawn }
    }
}

/// `LedgerApi` moves accrued points onto user balances, and spends them again.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    /// Credits the accrual of every processed, uncredited order to its owner.
    ///
    /// Running this repeatedly, or concurrently, never credits an order twice. A cycle with nothing to do is a no-op.
    pub async fn reconcile(&self) -> Result<ReconciliationResult, LedgerApiError> {
        let result = self.db.credit_processed_orders().await?;
        for credit in &result.credits {
            debug!("💰️ {} credited to {} for orders {:?}", credit.amount, credit.owner_id, credit.orders);
        }
        Ok(result)
    }

    /// Spends `sum` points from the owner's balance, recording the spend against `order_number`.
    ///
    /// The tag must pass the Luhn check, but need not be a registered order. The balance and the withdrawal record
    /// are written together or not at all.
    pub async fn withdraw(
        &self,
        owner_id: &OwnerId,
        order_number: &str,
        sum: Points,
    ) -> Result<Withdrawal, LedgerApiError> {
        let order_number = order_number.trim();
        if !is_valid_order_number(order_number) {
            return Err(LedgerApiError::InvalidOrderNumber(order_number.to_string()));
        }
        if !sum.is_positive() {
            return Err(LedgerApiError::InvalidAmount(sum));
        }
        let withdrawal = NewWithdrawal::new(owner_id.clone(), OrderNumber::from(order_number), sum);
        match self.db.apply_withdrawal(withdrawal).await {
            Ok((balance, withdrawal)) => {
                info!("💰️ {owner_id} spent {sum} on order {}. {} remaining", withdrawal.order_number, balance.current);
                Ok(withdrawal)
            },
            Err(e) => {
                let e = LedgerApiError::from(e);
                match &e {
                    LedgerApiError::AccountNotFound(_) => {
                        error!("💰️ {owner_id} has no balance. Every user should have one from sign-up")
                    },
                    LedgerApiError::InsufficientFunds { .. } => debug!("💰️ Withdrawal by {owner_id} refused. {e}"),
                    _ => warn!("💰️ Withdrawal by {owner_id} failed. {e}"),
                }
                Err(e)
            },
        }
    }

    /// The owner's balance. Users who have no balance yet have nothing to spend, so zeros are returned for them.
    pub async fn balance(&self, owner_id: &OwnerId) -> Result<BalanceSummary, LedgerApiError> {
        let balance = self.db.fetch_balance(owner_id).await?;
        Ok(balance.map(BalanceSummary::from).unwrap_or_default())
    }

    /// Lists the owner's withdrawals, newest first.
    pub async fn withdrawals(&self, owner_id: &OwnerId) -> Result<Vec<Withdrawal>, LedgerApiError> {
        let withdrawals = self.db.fetch_withdrawals(owner_id).await?;
        Ok(withdrawals)
    }

    /// Creates a zero balance for the owner. Calling this for an owner who already has a balance changes nothing.
    pub async fn open_account(&self, owner_id: &OwnerId) -> Result<BalanceSummary, LedgerApiError> {
        let balance = self.db.open_account(owner_id).await?;
        Ok(balance.into())
    }
}
