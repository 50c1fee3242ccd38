use std::time::Duration;

use loyalty_common::Points;

use crate::db_types::{Order, OrderNumber, OwnerId};

#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(Order),
}

/// The amount credited to a single account in one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredit {
    pub owner_id: OwnerId,
    pub amount: Points,
    pub orders: Vec<OrderNumber>,
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationResult {
    pub credits: Vec<AccountCredit>,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.credits.iter().map(|c| c.orders.len()).sum()
    }

    pub fn total_credited(&self) -> Points {
        self.credits.iter().map(|c| c.amount).sum()
    }

    pub fn credit_for(&self, owner_id: &OwnerId) -> Option<&AccountCredit> {
        self.credits.iter().find(|c| &c.owner_id == owner_id)
    }
}

/// A summary of a single accrual polling cycle.
#[derive(Debug, Clone, Default)]
pub struct PollCycleResult {
    /// Orders that reached `Processed` in this cycle.
    pub resolved: Vec<Order>,
    /// Orders that reached `Invalid` in this cycle.
    pub invalidated: Vec<OrderNumber>,
    /// Orders the accrual system is still working on.
    pub pending: usize,
    /// Orders that could not be resolved because of a transport or storage failure. They are retried next cycle.
    pub failed: usize,
    /// Orders that were not queried because the accrual system asked us to back off.
    pub deferred: usize,
    /// Set when the accrual system asked us to back off.
    pub rate_limited: Option<Duration>,
}

impl PollCycleResult {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.invalidated.len() + self.pending + self.failed + self.deferred
    }
}
