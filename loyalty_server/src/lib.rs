//! # Loyalty points gateway server
//! This crate hosts the HTTP surface and the background workers of the loyalty points gateway. It is responsible for:
//! * Accepting purchase order numbers from authenticated users.
//! * Reporting order status, balances and withdrawals back to them.
//! * Spending points on request.
//! * Periodically resolving orders against the accrual system, and crediting earned points to balances.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/orders`: Submit (POST) or list (GET) the caller's purchase orders.
//! * `/api/user/balance`: The caller's current and withdrawn points.
//! * `/api/user/balance/withdraw`: Spend points against an order number.
//! * `/api/user/withdrawals`: The caller's withdrawal history.
//! * `/api/user/account`: Opens a zero balance for the caller.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
