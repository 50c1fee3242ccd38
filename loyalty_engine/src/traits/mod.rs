//! #  Storage and oracle contracts.
//!
//! This module defines the interfaces the loyalty engine needs from its collaborators. The engine APIs in
//! [`crate::lpe_api`] are generic over these traits, so that a backend (SQLite being the one provided) or an accrual
//! system client can be swapped out, or mocked in tests.
//!
//! * [`OrderManagement`] stores purchase orders and their accrual state.
//! * [`LedgerManagement`] stores per-user balances and withdrawals. Every mutation it exposes is atomic: balances are
//!   never read, modified in application code, and written back.
//! * [`AccrualOracle`] queries the external accrual system for the status of a single order.
mod accrual_oracle;
mod data_objects;
mod ledger_management;
mod order_management;

pub use accrual_oracle::{AccrualOracle, AccrualRecord, AccrualStatus, OracleError, OracleResponse, MAX_ACCRUAL};
pub use data_objects::{AccountCredit, InsertOrderResult, PollCycleResult, ReconciliationResult};
pub use ledger_management::{LedgerManagement, LedgerManagementError};
pub use order_management::{OrderManagement, OrderManagementError};
