use loyalty_common::Points;
use thiserror::Error;

use crate::{
    db_types::{OrderNumber, OwnerId},
    traits::{LedgerManagementError, OrderManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderIntakeError {
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order {0} has already been submitted by another user")]
    OrderBelongsToAnotherUser(OrderNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<OrderManagementError> for OrderIntakeError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::DatabaseError(s) => OrderIntakeError::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Withdrawal amounts must be positive. {0} is not")]
    InvalidAmount(Points),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { available: Points, requested: Points },
    #[error("No balance exists for user {0}")]
    AccountNotFound(OwnerId),
    #[error("Crediting user {0} would overflow their balance")]
    BalanceOverflow(OwnerId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerManagementError> for LedgerApiError {
    fn from(e: LedgerManagementError) -> Self {
        match e {
            LedgerManagementError::DatabaseError(s) => LedgerApiError::DatabaseError(s),
            LedgerManagementError::AccountNotFound(id) => LedgerApiError::AccountNotFound(id),
            LedgerManagementError::BalanceOverflow(id) => LedgerApiError::BalanceOverflow(id),
            LedgerManagementError::InsufficientFunds { available, requested } => {
                LedgerApiError::InsufficientFunds { available, requested }
            },
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AccrualPollerError {
    #[error("Could not fetch unresolved orders: {0}")]
    DatabaseError(String),
}

impl From<OrderManagementError> for AccrualPollerError {
    fn from(e: OrderManagementError) -> Self {
        AccrualPollerError::DatabaseError(e.to_string())
    }
}
