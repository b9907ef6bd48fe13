//! Tests for `HttpNotifier` against a throwaway local gateway.

use std::{
  collections::HashMap,
  io,
  sync::{Arc, Mutex},
};

use axum::{
  Form, Router,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  routing::post,
};
use impf_core::notify::{Message, Notifier, NotifyError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::{Error, HttpNotifier, SmsConfig};

#[derive(Debug, Clone)]
struct Captured {
  auth: Option<String>,
  form: HashMap<String, String>,
}

type Inbox = Arc<Mutex<Vec<Captured>>>;

/// Start a gateway on an ephemeral port that records every request and
/// answers with `status`. Returns the endpoint URL and the inbox.
async fn gateway(status: StatusCode) -> (String, Inbox) {
  let inbox: Inbox = Arc::default();

  async fn receive(
    State((inbox, status)): State<(Inbox, StatusCode)>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
  ) -> (StatusCode, &'static str) {
    let auth = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    inbox.lock().unwrap().push(Captured { auth, form });
    (status, "queued")
  }

  let app = Router::new()
    .route("/messages", post(receive))
    .with_state((inbox.clone(), status));
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  (format!("http://{addr}/messages"), inbox)
}

fn config(endpoint: String) -> SmsConfig {
  SmsConfig {
    endpoint,
    user: "AC123".into(),
    token: "secret".into(),
    from: "+4920300000".into(),
    disabled: false,
    timeout_secs: 5,
  }
}

#[tokio::test]
async fn posts_form_with_basic_auth() {
  let (endpoint, inbox) = gateway(StatusCode::CREATED).await;
  let notifier = HttpNotifier::new(config(endpoint)).unwrap();

  notifier.send("+491701234567", &Message::Reject).await.unwrap();

  let received = inbox.lock().unwrap().clone();
  assert_eq!(received.len(), 1);
  let req = &received[0];
  assert_eq!(req.form["To"], "+491701234567");
  assert_eq!(req.form["From"], "+4920300000");

  let params: serde_json::Value = serde_json::from_str(&req.form["Parameters"]).unwrap();
  assert_eq!(params["type"], "nachricht");
  assert_eq!(params["message"], Message::Reject.render());

  // "AC123:secret"
  assert_eq!(req.auth.as_deref(), Some("Basic QUMxMjM6c2VjcmV0"));
}

#[tokio::test]
async fn non_success_status_is_rejected() {
  let (endpoint, _inbox) = gateway(StatusCode::UNAUTHORIZED).await;
  let notifier = HttpNotifier::new(config(endpoint)).unwrap();

  let err = notifier.send("0170", &Message::Onboarding).await.unwrap_err();
  assert!(matches!(err, NotifyError::Rejected { status: 401, ref body } if body == "queued"));
}

#[tokio::test]
async fn unreachable_gateway_is_transport_error() {
  // Bind then drop to get a port nobody listens on.
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let notifier = HttpNotifier::new(config(format!("http://{addr}/messages"))).unwrap();
  let err = notifier.send("0170", &Message::Onboarding).await.unwrap_err();
  assert!(matches!(err, NotifyError::Transport(_)));
}

#[tokio::test]
async fn disabled_notifier_sends_nothing() {
  let (endpoint, inbox) = gateway(StatusCode::OK).await;
  let mut cfg = config(endpoint);
  cfg.disabled = true;
  let notifier = HttpNotifier::new(cfg).unwrap();
  assert!(notifier.is_disabled());

  notifier.send("0170", &Message::DeleteConfirmation).await.unwrap();
  assert!(inbox.lock().unwrap().is_empty());
}

/// Log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
struct LogBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuf {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl LogBuf {
  fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
  }
}

#[tokio::test]
async fn disabled_notifier_keeps_phone_out_of_info_logs() {
  let logs = LogBuf::default();
  let writer = logs.clone();
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .with_ansi(false)
    .without_time()
    .with_writer(move || writer.clone())
    .finish();
  let _guard = tracing::subscriber::set_default(subscriber);

  let notifier = HttpNotifier::new(SmsConfig::disabled()).unwrap();
  notifier
    .send("01761234567", &Message::DeleteConfirmation)
    .await
    .unwrap();

  let out = logs.contents();
  assert!(out.contains("SMS sending disabled"), "{out}");
  assert!(!out.contains("01761234567"), "{out}");
  assert!(!out.contains(&Message::DeleteConfirmation.render()), "{out}");
}

/// A gateway that answers 500 with a body shorter than its declared
/// length, then hangs up.
async fn truncating_gateway() -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();

  tokio::spawn(async move {
    let (mut sock, _) = listener.accept().await.unwrap();

    // Drain the request so the client is not reset mid-send.
    let mut req = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
      let n = sock.read(&mut chunk).await.unwrap();
      if n == 0 {
        break;
      }
      req.extend_from_slice(&chunk[..n]);
      let text = String::from_utf8_lossy(&req).to_ascii_lowercase();
      if let Some(end) = text.find("\r\n\r\n") {
        let len = text[..end]
          .lines()
          .find_map(|l| l.strip_prefix("content-length:"))
          .and_then(|v| v.trim().parse::<usize>().ok())
          .unwrap_or(0);
        if req.len() >= end + 4 + len {
          break;
        }
      }
    }

    sock
      .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nshort")
      .await
      .unwrap();
    sock.shutdown().await.unwrap();
  });

  format!("http://{addr}/messages")
}

#[tokio::test]
async fn unreadable_error_body_still_reports_status() {
  let endpoint = truncating_gateway().await;
  let notifier = HttpNotifier::new(config(endpoint)).unwrap();

  let err = notifier.send("0170", &Message::Onboarding).await.unwrap_err();
  assert!(matches!(err, NotifyError::Rejected { status: 500, ref body } if body.is_empty()));
}

#[test]
fn enabled_notifier_needs_an_endpoint() {
  assert!(matches!(
    HttpNotifier::new(SmsConfig::default()),
    Err(Error::MissingEndpoint)
  ));
  assert!(HttpNotifier::new(SmsConfig::disabled()).is_ok());
}
