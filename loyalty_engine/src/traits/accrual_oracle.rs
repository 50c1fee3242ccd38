use std::time::Duration;

use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderNumber, OrderStatusType};

/// The largest accrual accepted for a single order: one trillion points. Anything larger is treated as a malformed
/// reply, so that ledger totals stay far from the limits of [`Points`].
pub const MAX_ACCRUAL: Points = Points::from_points(1_000_000_000_000);

/// Failures talking to the accrual system. None of these say anything about the order itself, so an order is never
/// invalidated because of one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("Could not reach the accrual system: {0}")]
    Transport(String),
    #[error("The accrual system did not respond within {0:?}")]
    Timeout(Duration),
    #[error("The accrual system returned a response that could not be understood: {0}")]
    MalformedResponse(String),
    #[error("The accrual system returned an unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),
    #[error("The accrual system is rate limiting us. Retry after {0:?}")]
    RateLimited(Duration),
}

/// The accrual system's view of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    Registered,
    Invalid,
    Processing,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualRecord {
    pub order: OrderNumber,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl AccrualRecord {
    /// The local order status that corresponds to the accrual system's status.
    pub fn local_status(&self) -> OrderStatusType {
        match self.status {
            AccrualStatus::Registered | AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Processed => OrderStatusType::Processed,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
        }
    }

    /// The accrual to store alongside [`Self::local_status`]. Only processed orders earn anything, and a negative
    /// amount from the accrual system is treated as zero.
    pub fn local_accrual(&self) -> Points {
        match (self.status, self.accrual) {
            (AccrualStatus::Processed, Some(p)) if p.is_positive() => p,
            _ => Points::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleResponse {
    /// The accrual system knows about the order.
    Registered(AccrualRecord),
    /// The accrual system has no record of the order.
    NotRegistered,
}

/// Looks up a single order in the external accrual system.
#[allow(async_fn_in_trait)]
pub trait AccrualOracle {
    async fn fetch_accrual(&self, order_number: &OrderNumber) -> Result<OracleResponse, OracleError>;
}
