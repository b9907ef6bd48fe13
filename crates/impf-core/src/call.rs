//! Call: a capacity-bounded appointment slot with eligibility filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{person::MAX_AGE, validation::ValidationErrors};

/// Where the appointment takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  /// Name of the site, e.g. "Impfzentrum Duisburg am TAM".
  pub name:         String,
  pub street:       String,
  pub house_number: String,
  pub postcode:     String,
  pub city:         String,
  /// Free-text directions ("Eingang B", "2. OG").
  #[serde(default)]
  pub extra:        Option<String>,
}

impl Location {
  /// Single-line rendering used in SMS texts.
  pub fn one_line(&self) -> String {
    let mut line = format!(
      "{}, {} {}, {} {}",
      self.name, self.street, self.house_number, self.postcode, self.city
    );
    if let Some(extra) = self.extra.as_deref().filter(|s| !s.is_empty()) {
      line.push_str(" (");
      line.push_str(extra);
      line.push(')');
    }
    line
  }
}

/// An appointment slot. Immutable once created; deleted after `time_end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
  pub call_id:    Uuid,
  pub title:      String,
  pub center_id:  i64,
  /// Maximum number of accepted invitations; always > 0.
  pub capacity:   i64,
  pub time_start: DateTime<Utc>,
  pub time_end:   DateTime<Utc>,
  /// Inclusive lower bound on candidate age.
  pub age_min:    i64,
  /// Inclusive upper bound on candidate age.
  pub age_max:    i64,
  pub location:   Location,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::CallStore::add_call`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCall {
  pub title:      String,
  #[serde(default)]
  pub center_id:  i64,
  pub capacity:   i64,
  pub time_start: DateTime<Utc>,
  pub time_end:   DateTime<Utc>,
  #[serde(default)]
  pub age_min:    i64,
  #[serde(default = "default_age_max")]
  pub age_max:    i64,
  pub location:   Location,
}

fn default_age_max() -> i64 { MAX_AGE }

impl NewCall {
  /// Trim text fields and check every constraint, collecting all failures.
  pub fn validate(mut self) -> Result<Self, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if self.capacity < 1 {
      errors.push("capacity", "Kapazität muss mindestens 1 sein");
    }

    if self.time_start >= self.time_end {
      errors.push(
        "time_end",
        format!(
          "Startzeit {} liegt nicht vor Endzeit {}",
          self.time_start.format("%H:%M"),
          self.time_end.format("%H:%M")
        ),
      );
    }

    if self.age_min < 0 || self.age_max < self.age_min {
      errors.push(
        "age_max",
        format!("Ungültige Altersspanne: {}-{}", self.age_min, self.age_max),
      );
    }

    trim_required(&mut self.title, "title", "Titel fehlt", &mut errors);
    let loc = &mut self.location;
    trim_required(&mut loc.name, "location.name", "Ort fehlt", &mut errors);
    trim_required(&mut loc.street, "location.street", "Straße fehlt", &mut errors);
    trim_required(
      &mut loc.house_number,
      "location.house_number",
      "Hausnummer fehlt",
      &mut errors,
    );
    trim_required(&mut loc.postcode, "location.postcode", "PLZ fehlt", &mut errors);
    trim_required(&mut loc.city, "location.city", "Stadt fehlt", &mut errors);
    loc.extra = loc
      .extra
      .take()
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty());

    errors.into_result().map(|()| self)
  }
}

fn trim_required(
  value: &mut String,
  field: &str,
  message: &str,
  errors: &mut ValidationErrors,
) {
  *value = value.trim().to_owned();
  if value.is_empty() {
    errors.push(field, message);
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn location() -> Location {
    Location {
      name:         "Impfzentrum".into(),
      street:       "Plessingstraße".into(),
      house_number: "20".into(),
      postcode:     "47051".into(),
      city:         "Duisburg".into(),
      extra:        None,
    }
  }

  fn new_call() -> NewCall {
    let start = Utc.with_ymd_and_hms(2021, 2, 10, 16, 30, 0).unwrap();
    NewCall {
      title:      "IZ Duisburg".into(),
      center_id:  0,
      capacity:   10,
      time_start: start,
      time_end:   start + Duration::hours(2),
      age_min:    0,
      age_max:    100,
      location:   location(),
    }
  }

  #[test]
  fn valid_call_passes() {
    assert!(new_call().validate().is_ok());
  }

  #[test]
  fn collects_every_failure() {
    let mut call = new_call();
    call.capacity = 0;
    call.time_end = call.time_start;
    call.title = "  ".into();
    call.location.city = String::new();

    let errors = call.validate().unwrap_err();
    let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["capacity", "time_end", "title", "location.city"]);
  }

  #[test]
  fn inverted_age_range_rejected() {
    let mut call = new_call();
    call.age_min = 60;
    call.age_max = 18;
    let errors = call.validate().unwrap_err();
    assert_eq!(errors.errors()[0].field, "age_max");
  }

  #[test]
  fn blank_extra_is_dropped() {
    let mut call = new_call();
    call.location.extra = Some("   ".into());
    assert_eq!(call.validate().unwrap().location.extra, None);
  }

  #[test]
  fn one_line_location() {
    let mut loc = location();
    assert_eq!(loc.one_line(), "Impfzentrum, Plessingstraße 20, 47051 Duisburg");
    loc.extra = Some("Eingang B".into());
    assert!(loc.one_line().ends_with("Duisburg (Eingang B)"));
  }
}
