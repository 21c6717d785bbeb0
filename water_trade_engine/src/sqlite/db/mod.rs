//! Low-level SQLite interactions.
//!
//! Everything in here is a simple function (rather than a stateful struct) that accepts a `&mut SqliteConnection`.
//! Callers can obtain a connection from a pool, or open a transaction and pass `&mut *tx` when several calls must
//! commit or fail together.
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod listings;
pub mod trade_events;
pub mod trades;
pub mod users;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
