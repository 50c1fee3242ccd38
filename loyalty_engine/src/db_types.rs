use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       OwnerId        ---------------------------------------------------------
/// The opaque, stable identifier of a user, as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl<S: Into<String>> From<S> for OwnerId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderNumber      ---------------------------------------------------------
/// A purchase order number. These are also used to tag withdrawals.
///
/// Constructing an `OrderNumber` does not validate it. Use [`crate::helpers::is_valid_order_number`] before accepting
/// one from a user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been registered, but the accrual system has not been consulted yet.
    New,
    /// The accrual system knows about the order, but has not finished calculating the accrual.
    Processing,
    /// The accrual has been calculated. This is a final status.
    Processed,
    /// The accrual system rejected the order, or does not know about it. This is a final status.
    Invalid,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "PROCESSED" => Ok(Self::Processed),
            "INVALID" => Ok(Self::Invalid),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub owner_id: OwnerId,
    pub status: OrderStatusType,
    /// Only meaningful once the status is `Processed`. Zero otherwise.
    pub accrual: Points,
    /// True once the accrual has been applied to the owner's balance.
    pub credited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub owner_id: OwnerId,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, owner_id: OwnerId) -> Self {
        Self { order_number, owner_id, created_at: Utc::now() }
    }
}

//--------------------------------------       Balance        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Balance {
    pub owner_id: OwnerId,
    /// Spendable credit. Never negative.
    pub current: Points,
    /// The cumulative total ever withdrawn.
    pub withdrawn: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Withdrawal      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub owner_id: OwnerId,
    /// The order number the spend is recorded under. It need not be a registered purchase order.
    pub order_number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub owner_id: OwnerId,
    pub order_number: OrderNumber,
    pub sum: Points,
}

impl NewWithdrawal {
    pub fn new(owner_id: OwnerId, order_number: OrderNumber, sum: Points) -> Self {
        Self { owner_id, order_number, sum }
    }
}
