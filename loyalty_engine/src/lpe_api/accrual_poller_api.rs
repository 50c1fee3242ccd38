use std::{
    fmt::Debug,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use futures_util::{stream, StreamExt};
use log::*;
use loyalty_common::Points;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType},
    lpe_api::errors::AccrualPollerError,
    traits::{AccrualOracle, OracleError, OracleResponse, OrderManagement, PollCycleResult},
};

#[derive(Debug, Clone)]
pub struct AccrualPollerConfig {
    /// The maximum number of orders queried per cycle.
    pub batch_size: usize,
    /// The maximum number of queries in flight at once.
    pub concurrency: usize,
    /// The time allowed for a single query.
    pub request_timeout: Duration,
}

impl Default for AccrualPollerConfig {
    fn default() -> Self {
        Self { batch_size: 100, concurrency: 4, request_timeout: Duration::from_secs(5) }
    }
}

/// What happened to a single order in a polling cycle.
#[derive(Debug)]
enum PollOutcome {
    Resolved(Order),
    Invalidated(OrderNumber),
    Pending,
    Failed,
    RateLimited(Duration),
    /// The order was not queried, because the accrual system asked us to back off.
    Deferred,
    /// The order was finalised by someone else in the meantime.
    Stale,
}

/// `AccrualPollerApi` drives orders from `New` to a final status by asking the accrual system about them.
pub struct AccrualPollerApi<B, O> {
    db: B,
    oracle: O,
    config: AccrualPollerConfig,
}

impl<B, O> Debug for AccrualPollerApi<B, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualPollerApi ({:?})", self.config)
    }
}

impl<B, O> AccrualPollerApi<B, O> {
    pub fn new(db: B, oracle: O, config: AccrualPollerConfig) -> Self {
        Self { db, oracle, config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> &AccrualPollerConfig {
        &self.config
    }
}

impl<B, O> AccrualPollerApi<B, O>
where
    B: OrderManagement,
    O: AccrualOracle,
{
    /// Runs a single polling cycle.
    ///
    /// Up to `batch_size` unresolved orders are fetched, oldest first, and the accrual system is queried for each of
    /// them with at most `concurrency` queries in flight. Failures for individual orders are logged and the order is
    /// retried next cycle. Only a failure to fetch the batch itself is returned as an error.
    ///
    /// If the accrual system rate limits us, no further queries are sent this cycle and the requested back-off is
    /// reported in [`PollCycleResult::rate_limited`].
    pub async fn run_cycle(&self) -> Result<PollCycleResult, AccrualPollerError> {
        let orders = self.db.fetch_unresolved_orders(self.config.batch_size).await?;
        let mut result = PollCycleResult::default();
        if orders.is_empty() {
            trace!("🔄️ No orders are awaiting accrual");
            return Ok(result);
        }
        debug!("🔄️ Querying the accrual system for {} orders", orders.len());
        let halted = AtomicBool::new(false);
        let concurrency = self.config.concurrency.max(1);
        let mut outcomes =
            stream::iter(orders).map(|order| self.poll_order(order, &halted)).buffer_unordered(concurrency);
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                PollOutcome::Resolved(order) => result.resolved.push(order),
                PollOutcome::Invalidated(number) => result.invalidated.push(number),
                PollOutcome::Pending => result.pending += 1,
                PollOutcome::Failed => result.failed += 1,
                PollOutcome::RateLimited(delay) => {
                    result.failed += 1;
                    let longest = result.rate_limited.map_or(delay, |d| d.max(delay));
                    result.rate_limited = Some(longest);
                },
                PollOutcome::Deferred => result.deferred += 1,
                PollOutcome::Stale => {},
            }
        }
        Ok(result)
    }

    async fn poll_order(&self, order: Order, halted: &AtomicBool) -> PollOutcome {
        if halted.load(Ordering::Acquire) {
            return PollOutcome::Deferred;
        }
        let number = &order.order_number;
        let timeout = self.config.request_timeout;
        let response = match tokio::time::timeout(timeout, self.oracle.fetch_accrual(number)).await {
            Ok(response) => response,
            Err(_) => Err(OracleError::Timeout(timeout)),
        };
        match response {
            Ok(OracleResponse::NotRegistered) => {
                debug!("🔄️ The accrual system does not know about order {number}. Marking it invalid");
                self.finalise(&order, OrderStatusType::Invalid, Points::default()).await
            },
            Ok(OracleResponse::Registered(record)) if &record.order != number => {
                warn!("🔄️ Asked the accrual system about order {number}, but it replied about {}", record.order);
                PollOutcome::Failed
            },
            Ok(OracleResponse::Registered(record)) => match record.local_status() {
                OrderStatusType::Processing if order.status == OrderStatusType::Processing => {
                    trace!("🔄️ Order {number} is still being processed");
                    PollOutcome::Pending
                },
                OrderStatusType::Processing | OrderStatusType::New => {
                    match self.db.update_order_accrual(number, OrderStatusType::Processing, Points::default()).await {
                        Ok(Some(_)) => {
                            debug!("🔄️ Order {number} is now being processed by the accrual system");
                            PollOutcome::Pending
                        },
                        Ok(None) => PollOutcome::Stale,
                        Err(e) => {
                            error!("🔄️ Could not update order {number}: {e}");
                            PollOutcome::Failed
                        },
                    }
                },
                status => self.finalise(&order, status, record.local_accrual()).await,
            },
            Err(OracleError::RateLimited(delay)) => {
                halted.store(true, Ordering::Release);
                warn!("🔄️ The accrual system is rate limiting us. Backing off for {delay:?}");
                PollOutcome::RateLimited(delay)
            },
            Err(e) => {
                warn!("🔄️ Could not fetch the accrual for order {number}. Will retry. {e}");
                PollOutcome::Failed
            },
        }
    }

    async fn finalise(&self, order: &Order, status: OrderStatusType, accrual: Points) -> PollOutcome {
        let number = &order.order_number;
        match self.db.update_order_accrual(number, status, accrual).await {
            Ok(Some(order)) if order.status == OrderStatusType::Invalid => {
                info!("🔄️ Order {number} is invalid");
                PollOutcome::Invalidated(order.order_number)
            },
            Ok(Some(order)) => {
                info!("🔄️ Order {number} has been processed. Accrual: {}", order.accrual);
                PollOutcome::Resolved(order)
            },
            Ok(None) => PollOutcome::Stale,
            Err(e) => {
                error!("🔄️ Could not save the final status of order {number}: {e}");
                PollOutcome::Failed
            },
        }
    }
}
