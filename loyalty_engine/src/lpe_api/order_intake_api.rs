use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OwnerId},
    helpers::is_valid_order_number,
    lpe_api::errors::OrderIntakeError,
    traits::{InsertOrderResult, OrderManagement},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// The order is new, and has been registered for accrual.
    Accepted(Order),
    /// The caller has already submitted this order. Nothing changed.
    AlreadyOwned(Order),
}

impl SubmitOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Accepted(o) | Self::AlreadyOwned(o) => o,
        }
    }
}

/// `OrderIntakeApi` accepts purchase orders from users and registers them for accrual.
pub struct OrderIntakeApi<B> {
    db: B,
}

impl<B> Debug for OrderIntakeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderIntakeApi")
    }
}

impl<B> OrderIntakeApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderIntakeApi<B>
where B: OrderManagement
{
    /// Submits an order number on behalf of `owner_id`.
    ///
    /// Surrounding whitespace is ignored. The number must pass the Luhn check. Resubmitting an order the caller already
    /// owns is harmless and returns [`SubmitOrderResult::AlreadyOwned`]. Submitting an order that another user owns
    /// fails with [`OrderIntakeError::OrderBelongsToAnotherUser`], and the stored order is not changed.
    pub async fn submit_order(&self, owner_id: &OwnerId, number: &str) -> Result<SubmitOrderResult, OrderIntakeError> {
        let number = number.trim();
        if !is_valid_order_number(number) {
            debug!("🔄️📦️ Rejected order submission from {owner_id}: '{number}' fails the Luhn check");
            return Err(OrderIntakeError::InvalidOrderNumber(number.to_string()));
        }
        let order = NewOrder::new(OrderNumber::from(number), owner_id.clone());
        match self.db.insert_order(order).await? {
            InsertOrderResult::Inserted(order) => {
                info!("🔄️📦️ Order {} registered for {owner_id}", order.order_number);
                Ok(SubmitOrderResult::Accepted(order))
            },
            InsertOrderResult::AlreadyExists(order) if &order.owner_id == owner_id => {
                debug!("🔄️📦️ Order {} was already submitted by {owner_id}", order.order_number);
                Ok(SubmitOrderResult::AlreadyOwned(order))
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!(
                    "🔄️📦️ {owner_id} tried to submit order {}, which belongs to {}",
                    order.order_number, order.owner_id
                );
                Err(OrderIntakeError::OrderBelongsToAnotherUser(order.order_number))
            },
        }
    }

    /// Lists the owner's orders, newest first.
    pub async fn orders_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Order>, OrderIntakeError> {
        let orders = self.db.fetch_orders_for_owner(owner_id).await?;
        trace!("🔄️📦️ Fetched {} orders for {owner_id}", orders.len());
        Ok(orders)
    }
}
