//! Error types for `impf-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{notify::NotifyError, validation::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(#[from] ValidationErrors),

  /// A phone or call id with no matching record.
  #[error("no such registration: {0}")]
  NotFound(String),

  /// The call has no free seat left. Handled as a decision branch by the
  /// reconciler, never returned to the web layer.
  #[error("call {0} is already full")]
  CapacityExceeded(Uuid),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("notify error: {0}")]
  Notify(#[from] NotifyError),
}

impl Error {
  /// Wrap any backend error as [`Error::Storage`].
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
