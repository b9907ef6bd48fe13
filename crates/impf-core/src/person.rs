//! Person: a registered candidate, identified by phone number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

/// Oldest age accepted on import; anything above is a data-entry error.
pub const MAX_AGE: i64 = 150;

/// A registered candidate. Never mutated after import; only deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  /// Unique identity of the person.
  pub phone:         String,
  pub center_id:     i64,
  /// Priority group; lower numbers are invited first.
  pub group:         i64,
  pub age:           i64,
  pub vaccinated:    bool,
  /// Server-assigned; breaks ties inside a priority group.
  pub registered_at: DateTime<Utc>,
}

/// Input to [`crate::store::CallStore::add_person`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
  pub phone:      String,
  #[serde(default)]
  pub center_id:  i64,
  pub group:      i64,
  pub age:        i64,
  #[serde(default)]
  pub vaccinated: bool,
}

impl NewPerson {
  pub fn new(phone: impl Into<String>, group: i64, age: i64) -> Self {
    Self {
      phone: phone.into(),
      center_id: 0,
      group,
      age,
      vaccinated: false,
    }
  }

  /// Trim the phone number and check every field.
  pub fn validate(mut self) -> Result<Self, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    self.phone = self.phone.trim().to_owned();
    if self.phone.is_empty() {
      errors.push("phone", "Fehlende Rufnummer");
    } else if !is_phone_number(&self.phone) {
      errors.push("phone", format!("Ungültige Rufnummer: {}", self.phone));
    }

    if self.group < 1 {
      errors.push("group", format!("Ungültige Gruppe: {}", self.group));
    }

    if !(0..=MAX_AGE).contains(&self.age) {
      errors.push("age", format!("Ungültiges Alter: {}", self.age));
    }

    errors.into_result().map(|()| self)
  }
}

/// Digits with an optional leading `+`; spaces are not accepted because the
/// gateway echoes numbers back in canonical form.
fn is_phone_number(s: &str) -> bool {
  let digits = s.strip_prefix('+').unwrap_or(s);
  !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn valid_person_is_trimmed() {
    let p = NewPerson::new("  +491701234567 ", 2, 40).validate().unwrap();
    assert_eq!(p.phone, "+491701234567");
  }

  #[test]
  fn empty_phone_and_zero_group_rejected() {
    let errors = NewPerson::new("", 0, 40).validate().unwrap_err();
    let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["phone", "group"]);
  }

  #[test]
  fn letters_in_phone_rejected() {
    let errors = NewPerson::new("0170-abc", 1, 40).validate().unwrap_err();
    assert_eq!(errors.errors()[0].field, "phone");
  }

  #[test]
  fn negative_age_rejected() {
    let errors = NewPerson::new("0170", 1, -1).validate().unwrap_err();
    assert_eq!(errors.errors()[0].field, "age");
  }
}
