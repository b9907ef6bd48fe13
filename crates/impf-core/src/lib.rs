//! Domain model of the vaccination call coordinator.
//!
//! Persons, calls and the invitation ledger, their validation rules, and the
//! two seams the rest of the workspace plugs into: [`store::CallStore`] for
//! persistence and [`notify::Notifier`] for outbound SMS. Nothing here
//! touches HTTP or SQL.

// Trait methods return `impl Future + Send` explicitly; implementors may
// still write `async fn`.
#![allow(async_fn_in_trait)]

pub mod call;
pub mod code;
pub mod error;
pub mod invitation;
pub mod notify;
pub mod person;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
