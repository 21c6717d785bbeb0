//! SQLite backend for the water trade engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
