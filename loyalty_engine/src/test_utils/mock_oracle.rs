//! A scriptable stand-in for the accrual system.
use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use loyalty_common::Points;

use crate::{
    db_types::OrderNumber,
    traits::{AccrualOracle, AccrualRecord, AccrualStatus, OracleError, OracleResponse},
};

type Reply = Result<OracleResponse, OracleError>;

#[derive(Default)]
struct Script {
    replies: HashMap<OrderNumber, VecDeque<Reply>>,
    last: HashMap<OrderNumber, Reply>,
    delays: HashMap<OrderNumber, Duration>,
}

/// Replies to each order with the responses queued for it, in order. Once the queue runs dry, the last reply given
/// for the order is repeated. Orders with nothing queued get a transport error.
///
/// Clones share the same script, so a test can keep a handle after moving the oracle into an API.
#[derive(Clone, Default)]
pub struct MockAccrualOracle {
    script: Arc<Mutex<Script>>,
    calls: Arc<AtomicUsize>,
}

impl MockAccrualOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, number: &str, reply: Reply) -> &Self {
        let mut script = self.script.lock().expect("Poisoned mock oracle");
        script.replies.entry(OrderNumber::from(number)).or_default().push_back(reply);
        self
    }

    pub fn reply_status(&self, number: &str, status: AccrualStatus, accrual: Option<Points>) -> &Self {
        let record = AccrualRecord { order: OrderNumber::from(number), status, accrual };
        self.reply(number, Ok(OracleResponse::Registered(record)))
    }

    pub fn reply_processed(&self, number: &str, accrual: Points) -> &Self {
        self.reply_status(number, AccrualStatus::Processed, Some(accrual))
    }

    /// Makes every query for `number` take `delay` before replying.
    pub fn delay(&self, number: &str, delay: Duration) -> &Self {
        let mut script = self.script.lock().expect("Poisoned mock oracle");
        script.delays.insert(OrderNumber::from(number), delay);
        self
    }

    /// The number of queries received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Debug for MockAccrualOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockAccrualOracle ({} calls)", self.call_count())
    }
}

impl AccrualOracle for MockAccrualOracle {
    async fn fetch_accrual(&self, order_number: &OrderNumber) -> Result<OracleResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (reply, delay) = {
            let mut script = self.script.lock().expect("Poisoned mock oracle");
            let delay = script.delays.get(order_number).copied();
            let next = script.replies.get_mut(order_number).and_then(VecDeque::pop_front);
            let reply = match next {
                Some(reply) => {
                    script.last.insert(order_number.clone(), reply.clone());
                    Some(reply)
                },
                None => script.last.get(order_number).cloned(),
            };
            (reply, delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or_else(|| Err(OracleError::Transport(format!("No reply scripted for {order_number}"))))
    }
}
