//! Server configuration: optional TOML file, then `IMPF_*` environment
//! variables (nested keys use `__`, e.g. `IMPF_SMS__TOKEN`).

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use chrono::{FixedOffset, Local};
use impf_notify::SmsConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default = "default_tick_interval_secs")]
  pub tick_interval_secs: u64,
  pub token_secret:       String,
  /// Offset for SMS time rendering; the host's current offset if unset.
  #[serde(default)]
  pub utc_offset_minutes: Option<i32>,
  #[serde(default)]
  pub sms:                SmsConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 12000 }

fn default_store_path() -> PathBuf { PathBuf::from("impf.db") }

fn default_tick_interval_secs() -> u64 { 15 * 60 }

impl ServerConfig {
  /// Layer `path` (if it exists) under the environment and validate.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(
        config::Environment::with_prefix("IMPF")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;
    Self::from_config(settings)
  }

  fn from_config(settings: config::Config) -> anyhow::Result<Self> {
    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    if self.token_secret.trim().is_empty() {
      bail!("token_secret must not be empty");
    }
    if self.tick_interval_secs == 0 {
      bail!("tick_interval_secs must be positive");
    }
    if !self.sms.disabled && self.sms.endpoint.is_empty() {
      bail!("sms.endpoint is required unless sms.disabled is set");
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
    match self.utc_offset_minutes {
      Some(minutes) => FixedOffset::east_opt(minutes * 60)
        .with_context(|| format!("utc_offset_minutes out of range: {minutes}")),
      None => Ok(*Local::now().offset()),
    }
  }
}

/// Expand a leading `~/` using `$HOME`.
pub fn expand_tilde(path: &Path) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~") {
    if let Some(home) = std::env::var_os("HOME") {
      return PathBuf::from(home).join(rest);
    }
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> anyhow::Result<ServerConfig> {
    let settings = Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()?;
    ServerConfig::from_config(settings)
  }

  #[test]
  fn defaults_fill_everything_but_the_secret() {
    let cfg = parse(
      r#"
      token_secret = "s3cret"
      [sms]
      disabled = true
      "#,
    )
    .unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:12000");
    assert_eq!(cfg.store_path, PathBuf::from("impf.db"));
    assert_eq!(cfg.tick_interval_secs, 900);
    assert_eq!(cfg.sms.timeout_secs, 30);
  }

  #[test]
  fn missing_secret_is_an_error() {
    assert!(parse("[sms]\ndisabled = true").is_err());
    assert!(parse("token_secret = \"  \"\n[sms]\ndisabled = true").is_err());
  }

  #[test]
  fn enabled_sms_needs_an_endpoint() {
    assert!(parse("token_secret = \"x\"").is_err());
    let cfg = parse(
      r#"
      token_secret = "x"
      [sms]
      endpoint = "https://gateway.example/messages"
      user = "AC1"
      token = "t"
      from = "+49203"
      "#,
    )
    .unwrap();
    assert!(!cfg.sms.disabled);
  }

  #[test]
  fn explicit_offset_is_used() {
    let cfg = parse("token_secret = \"x\"\nutc_offset_minutes = 120\n[sms]\ndisabled = true").unwrap();
    assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), 7200);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Some(home) = std::env::var_os("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/impf.db")), PathBuf::from(home).join("impf.db"));
    assert_eq!(expand_tilde(Path::new("/var/impf.db")), PathBuf::from("/var/impf.db"));
  }
}
