use std::time::Duration;

use log::*;
use loyalty_engine::{
    traits::{PollCycleResult, ReconciliationResult},
    AccrualClient,
    AccrualPollerApi,
    AccrualPollerConfig,
    LedgerApi,
    SqliteDatabase,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Starts the accrual worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, a batch of unresolved orders is sent to the accrual system. If the accrual system asks us to back
/// off, the worker sleeps for the requested period before the next cycle.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    oracle: AccrualClient,
    config: AccrualPollerConfig,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let api = AccrualPollerApi::new(db, oracle, config);
        info!("🕰️ Accrual worker started. Polling every {}ms", interval.as_millis());
        loop {
            timer.tick().await;
            trace!("🕰️ Running accrual poll cycle");
            match api.run_cycle().await {
                Ok(result) => {
                    log_poll_result(&result);
                    if let Some(delay) = result.rate_limited {
                        warn!("🕰️ The accrual system is rate limiting us. Backing off for {}s", delay.as_secs());
                        tokio::time::sleep(delay).await;
                        timer.reset();
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running accrual poll cycle: {e}");
                },
            }
        }
    })
}

/// Starts the reconciliation worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_reconciliation_worker(db: SqliteDatabase, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let api = LedgerApi::new(db);
        info!("🕰️ Reconciliation worker started. Crediting balances every {}ms", interval.as_millis());
        loop {
            timer.tick().await;
            trace!("🕰️ Running reconciliation cycle");
            match api.reconcile().await {
                Ok(result) => log_reconciliation_result(&result),
                Err(e) => {
                    error!("🕰️ Error running reconciliation cycle: {e}. Nothing was credited; retrying next cycle");
                },
            }
        }
    })
}

fn log_poll_result(result: &PollCycleResult) {
    if result.total() == 0 {
        return;
    }
    info!(
        "🕰️ Accrual cycle: {} processed, {} invalid, {} pending, {} failed, {} deferred",
        result.resolved.len(),
        result.invalidated.len(),
        result.pending,
        result.failed,
        result.deferred
    );
}

fn log_reconciliation_result(result: &ReconciliationResult) {
    if result.is_empty() {
        return;
    }
    info!(
        "🕰️ Credited {} to {} accounts for {} orders",
        result.total_credited(),
        result.credits.len(),
        result.order_count()
    );
}
