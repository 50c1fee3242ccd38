//! # Loyalty points engine public API
//!
//! The `lpe_api` module exposes the programmatic API for the loyalty engine. Each API is a thin struct over a backend
//! that implements the storage traits it needs, so that clients can pick and choose the functionality they want.
//!
//! * [`order_intake_api`] validates and registers purchase orders submitted by users.
//! * [`accrual_poller_api`] resolves pending orders against the external accrual system.
//! * [`ledger_api`] credits earned accruals to balances, and processes withdrawals.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the specific backend traits required
//! by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/loyalty_store.db", 5).await?;
//! // SqliteDatabase implements LedgerManagement
//! let api = LedgerApi::new(db);
//! let balance = api.balance(&owner_id).await?;
//! ```
pub mod accrual_poller_api;
pub mod errors;
pub mod ledger_api;
pub mod order_intake_api;
