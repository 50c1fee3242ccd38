//! Loyalty Points Engine
//!
//! The loyalty engine tracks purchase orders submitted by users, resolves how many points each order earns by asking
//! an external accrual system, and keeps a ledger of spendable balances and withdrawals.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`mod@traits`] and [`mod@sqlite`]). The engine APIs only know about the storage traits. SQLite is the
//!    supported backend. The data types used in storage are defined in [`mod@db_types`] and are public.
//! 2. The accrual system client ([`mod@oracle`]), which implements [`traits::AccrualOracle`] over HTTP.
//! 3. The engine public API ([`mod@lpe_api`]): order intake, accrual polling, ledger reconciliation and withdrawals.
//!
//! No balance is ever credited twice for the same order, and no balance ever goes negative.
pub mod db_types;
pub mod helpers;
pub mod lpe_api;
pub mod oracle;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use lpe_api::{
    accrual_poller_api::{AccrualPollerApi, AccrualPollerConfig},
    errors::{AccrualPollerError, LedgerApiError, OrderIntakeError},
    ledger_api::{BalanceSummary, LedgerApi},
    order_intake_api::{OrderIntakeApi, SubmitOrderResult},
};
pub use oracle::AccrualClient;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AccrualOracle, LedgerManagement, OrderManagement};
