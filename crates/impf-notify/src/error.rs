use thiserror::Error;

/// Errors raised while constructing a notifier. Delivery failures are
/// reported as [`impf_core::notify::NotifyError`] instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("SMS gateway endpoint is not configured")]
  MissingEndpoint,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
