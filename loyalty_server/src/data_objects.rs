use chrono::{DateTime, Utc};
use loyalty_common::Points;
use loyalty_engine::db_types::{Order, OrderStatusType, Withdrawal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatusType,
    /// Omitted until the order has been processed with a positive accrual.
    #[serde(default, skip_serializing_if = "Points::is_zero")]
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            number: order.order_number.0,
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number.0, sum: w.sum, processed_at: w.processed_at }
    }
}
