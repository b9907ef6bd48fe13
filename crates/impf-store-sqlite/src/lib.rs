//! SQLite backend for the call coordinator.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Capacity-sensitive operations run in
//! `BEGIN IMMEDIATE` transactions, so they stay correct even when several
//! connections write to the same file.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
