use std::time::Duration;

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::Withdrawal,
    test_utils::{
        mock_oracle::MockAccrualOracle,
        prepare_env::{prepare_test_env, random_db_path},
    },
    AccrualPollerApi,
    AccrualPollerConfig,
    LedgerApi,
    LedgerApiError,
    OrderIntakeApi,
    OrderIntakeError,
    SqliteDatabase,
    SubmitOrderResult,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub last_submission: Option<Result<SubmitOrderResult, OrderIntakeError>>,
    pub last_withdrawal: Option<Result<Withdrawal, LedgerApiError>>,
}

#[derive(Debug)]
pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub oracle: MockAccrualOracle,
    pub intake: OrderIntakeApi<SqliteDatabase>,
    pub poller: AccrualPollerApi<SqliteDatabase, MockAccrualOracle>,
    pub ledger: LedgerApi<SqliteDatabase>,
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("Loyalty system not initialised")
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("Created database: {db_path}");
        let oracle = MockAccrualOracle::new();
        let config =
            AccrualPollerConfig { batch_size: 50, concurrency: 4, request_timeout: Duration::from_millis(500) };
        let intake = OrderIntakeApi::new(db.clone());
        let poller = AccrualPollerApi::new(db.clone(), oracle.clone(), config);
        let ledger = LedgerApi::new(db.clone());
        Self { db_path, db, oracle, intake, poller, ledger }
    }
}
