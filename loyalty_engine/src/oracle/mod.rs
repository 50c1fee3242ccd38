//! HTTP client for the external accrual system.
mod accrual_client;

pub use accrual_client::{classify_response, AccrualClient, DEFAULT_RETRY_AFTER};
