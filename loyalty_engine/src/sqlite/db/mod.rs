//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All of these are simple functions that accept a `&mut SqliteConnection` argument. Callers can obtain a connection
//! from a pool, or open a transaction when several statements must commit together, and pass `&mut *tx` through
//! without any other changes.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod balances;
pub mod orders;
pub mod withdrawals;

const SQLITE_DB_URL: &str = "sqlite://data/loyalty_store.db";

/// The schema migrations for the loyalty store.
pub static MIGRATIONS: Migrator = sqlx::migrate!("./src/sqlite/migrations");

pub fn db_url() -> String {
    let result = env::var("LPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("LPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Creates a connection pool. The database file is created if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
