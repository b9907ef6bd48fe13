//! SMS delivery for the call coordinator.
//!
//! [`HttpNotifier`] implements [`impf_core::notify::Notifier`] against a
//! Twilio-style gateway: one form-encoded `POST` per message, authenticated
//! with HTTP basic auth.

mod config;
mod error;
mod http;

pub use config::SmsConfig;
pub use error::{Error, Result};
pub use http::HttpNotifier;

#[cfg(test)]
mod tests;
