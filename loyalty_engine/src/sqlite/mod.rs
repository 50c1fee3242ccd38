//! SQLite backend for the loyalty engine.
//!
//! [`SqliteDatabase`] implements [`crate::traits::OrderManagement`] and [`crate::traits::LedgerManagement`] on top of
//! the low-level functions in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
