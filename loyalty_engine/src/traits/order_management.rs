use loyalty_common::Points;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, OwnerId},
    traits::InsertOrderResult,
};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines behaviour for storing purchase orders and tracking their accrual status.
///
/// Orders are never deleted. Their number and owner are immutable once inserted.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Inserts the order if no order with the same number exists. This call is idempotent, and safe against
    /// concurrent inserts of the same order number: exactly one caller will see `Inserted`.
    ///
    /// If the order already exists, the stored order is returned in `AlreadyExists`, whoever its owner is.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderManagementError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError>;

    /// Fetches all orders belonging to the owner, newest first.
    async fn fetch_orders_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Order>, OrderManagementError>;

    /// Fetches at most `limit` orders that still need to be resolved against the accrual system (i.e. `New` or
    /// `Processing`), oldest first.
    async fn fetch_unresolved_orders(&self, limit: usize) -> Result<Vec<Order>, OrderManagementError>;

    /// Sets the status and accrual for an order, provided it has not reached a final status yet.
    ///
    /// Returns the updated order, or `None` if the order was already final, in which case nothing changes.
    async fn update_order_accrual(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<Option<Order>, OrderManagementError>;
}
