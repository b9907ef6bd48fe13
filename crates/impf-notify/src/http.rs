//! [`HttpNotifier`]: the gateway-backed [`Notifier`].

use std::time::Duration;

use impf_core::notify::{Message, Notifier, NotifyError};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::{Error, Result, SmsConfig};

/// Value of the gateway's `type` parameter for plain text messages.
const MESSAGE_TYPE: &str = "nachricht";

#[derive(Serialize)]
struct Parameters<'a> {
  #[serde(rename = "type")]
  kind:    &'static str,
  message: &'a str,
}

#[derive(Serialize)]
struct Form<'a> {
  #[serde(rename = "To")]
  to:         &'a str,
  #[serde(rename = "From")]
  from:       &'a str,
  #[serde(rename = "Parameters")]
  parameters: String,
}

/// Sends each message as one bounded HTTP request.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpNotifier {
  client: Client,
  config: SmsConfig,
}

impl HttpNotifier {
  pub fn new(config: SmsConfig) -> Result<Self> {
    if !config.disabled && config.endpoint.is_empty() {
      return Err(Error::MissingEndpoint);
    }
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn is_disabled(&self) -> bool { self.config.disabled }

  async fn post(&self, to: &str, body: &str) -> Result<(), NotifyError> {
    let parameters = serde_json::to_string(&Parameters {
      kind:    MESSAGE_TYPE,
      message: body,
    })
    .map_err(|e| NotifyError::Transport(e.to_string()))?;

    let resp = self
      .client
      .post(&self.config.endpoint)
      .basic_auth(&self.config.user, Some(&self.config.token))
      .form(&Form {
        to,
        from: &self.config.from,
        parameters,
      })
      .send()
      .await
      .map_err(|e| NotifyError::Transport(e.to_string()))?;

    let status = resp.status();
    let text = match resp.text().await {
      Ok(text) => text,
      Err(e) => {
        debug!(%status, error = %e, "could not read gateway response body");
        String::new()
      }
    };
    if !status.is_success() {
      return Err(NotifyError::Rejected {
        status: status.as_u16(),
        body:   text,
      });
    }

    debug!(%status, response = %text, "gateway accepted message");
    Ok(())
  }
}

impl Notifier for HttpNotifier {
  async fn send(&self, to: &str, message: &Message) -> Result<(), NotifyError> {
    let kind = message.kind();
    let body = message.render();

    if self.config.disabled {
      info!(%kind, "SMS sending disabled, message not sent");
      debug!(%to, %body, "suppressed message");
      return Ok(());
    }

    self.post(to, &body).await?;
    debug!(%to, %kind, "message sent");
    Ok(())
  }
}
