//! Error type for `impf-store-sqlite`.

use impf_core::validation::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain (e.g. an unknown status).
  #[error("decode error: {0}")]
  Decode(String),

  #[error("phone {0} is already registered")]
  DuplicatePhone(String),
}

impl From<Error> for impf_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::DuplicatePhone(phone) => impf_core::Error::Validation(ValidationErrors::single(
        "phone",
        format!("Rufnummer {phone} ist bereits vorhanden"),
      )),
      other => impf_core::Error::storage(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
