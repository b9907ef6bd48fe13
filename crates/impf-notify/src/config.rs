use serde::Deserialize;

/// Gateway settings, read from the `[sms]` table of the server config.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
  /// Full URL the form is posted to.
  #[serde(default)]
  pub endpoint:     String,
  /// Basic-auth user (the gateway account id).
  #[serde(default)]
  pub user:         String,
  /// Basic-auth password (the gateway API token).
  #[serde(default)]
  pub token:        String,
  /// Sender number shown to recipients.
  #[serde(default)]
  pub from:         String,
  /// Log messages instead of sending them.
  #[serde(default)]
  pub disabled:     bool,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

impl Default for SmsConfig {
  fn default() -> Self {
    Self {
      endpoint:     String::new(),
      user:         String::new(),
      token:        String::new(),
      from:         String::new(),
      disabled:     false,
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl SmsConfig {
  /// A config that never touches the network.
  pub fn disabled() -> Self {
    Self {
      disabled: true,
      ..Self::default()
    }
  }
}
