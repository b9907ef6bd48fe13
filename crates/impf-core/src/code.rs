//! One-time confirmation codes shown to the person on acceptance.
//!
//! The code is the first [`CODE_LEN`] hex characters of
//! `SHA-256(phone ‖ call_id ‖ secret)`. It is deterministic, so staff on site
//! can recompute it from the phone number and call without a lookup table.

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const CODE_LEN: usize = 5;

pub fn confirmation_code(phone: &str, call_id: Uuid, secret: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(phone.as_bytes());
  hasher.update(call_id.hyphenated().to_string().as_bytes());
  hasher.update(secret.as_bytes());
  let mut code = hex::encode(hasher.finalize());
  code.truncate(CODE_LEN);
  code
}
