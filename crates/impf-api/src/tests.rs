//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Duration, FixedOffset, Utc};
use impf_coordinator::{Coordinator, Settings};
use impf_notify::{HttpNotifier, SmsConfig};
use impf_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiError, api_router};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let notifier = HttpNotifier::new(SmsConfig::disabled()).unwrap();
  let settings = Settings {
    token_secret: "s3cret".into(),
    utc_offset:   FixedOffset::east_opt(0).unwrap(),
  };
  api_router(Arc::new(Coordinator::new(store, notifier, settings)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

fn call_body(capacity: i64) -> Value {
  let start = Utc::now() + Duration::hours(1);
  json!({
    "title": "IZ Duisburg",
    "capacity": capacity,
    "time_start": start,
    "time_end": start + Duration::hours(2),
    "location": {
      "name": "Impfzentrum",
      "street": "Plessingstraße",
      "house_number": "20",
      "postcode": "47051",
      "city": "Duisburg"
    }
  })
}

fn phone(p: &str) -> Option<Value> { Some(json!({ "phone": p })) }

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_list_persons() {
  let app = app().await;
  let (status, person) = send(
    &app,
    "POST",
    "/persons",
    Some(json!({ "phone": "0170", "group": 2, "age": 40 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(person["phone"], "0170");
  assert_eq!(person["vaccinated"], false);

  let (status, list) = send(&app, "GET", "/persons", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_person_is_unprocessable() {
  let app = app().await;
  let body = json!({ "phone": "0170", "group": 1, "age": 40 });
  send(&app, "POST", "/persons", Some(body.clone())).await;
  let (status, err) = send(&app, "POST", "/persons", Some(body)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(err["fields"][0]["field"], "phone");
}

#[tokio::test]
async fn batch_import_is_all_or_nothing() {
  let app = app().await;
  let (status, err) = send(
    &app,
    "POST",
    "/persons/batch",
    Some(json!({ "persons": [
      { "phone": "0170", "group": 1, "age": 40 },
      { "phone": "0171", "group": 0, "age": 40 }
    ]})),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(err["fields"][0]["field"], "persons[1].group");

  let (_, list) = send(&app, "GET", "/persons", None).await;
  assert!(list.as_array().unwrap().is_empty());
}

// ─── Calls ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_call_lists_every_field() {
  let app = app().await;
  let mut body = call_body(0);
  body["title"] = json!("");
  let (status, err) = send(&app, "POST", "/calls", Some(body)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  let fields: Vec<_> = err["fields"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["field"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(fields, ["capacity", "title"]);
}

#[tokio::test]
async fn create_list_and_inspect_call() {
  let app = app().await;
  let (status, call) = send(&app, "POST", "/calls", Some(call_body(2))).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = call["call_id"].as_str().unwrap().to_owned();

  let (_, active) = send(&app, "GET", "/calls", None).await;
  assert_eq!(active[0]["call_id"], id.as_str());
  let (_, all) = send(&app, "GET", "/calls?all=true", None).await;
  assert_eq!(all.as_array().unwrap().len(), 1);

  let (status, detail) = send(&app, "GET", &format!("/calls/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(detail["call"]["capacity"], 2);
  assert!(detail["accepted"].as_array().unwrap().is_empty());

  let (status, err) = send(&app, "GET", &format!("/calls/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["error"], "no such call");
}

// ─── Webhooks ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tick_then_accept_then_cancel() {
  let app = app().await;
  send(&app, "POST", "/persons", Some(json!({ "phone": "0170", "group": 1, "age": 40 }))).await;
  let (_, call) = send(&app, "POST", "/calls", Some(call_body(1))).await;

  let (status, report) = send(&app, "POST", "/tick", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["dispatch"]["invited"], 1);

  let (status, reply) = send(&app, "POST", "/webhook/accept", phone("0170")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reply["result"], "accepted");
  assert_eq!(reply["status"], "accepted");
  assert_eq!(reply["call_id"], call["call_id"]);

  let (_, reply) = send(&app, "POST", "/webhook/accept", phone("0170")).await;
  assert_eq!(reply["result"], "already_handled");

  let (_, cancelled) = send(&app, "POST", "/webhook/cancel", phone("0170")).await;
  assert_eq!(cancelled["cancelled"], 1);
  let (_, cancelled) = send(&app, "POST", "/webhook/cancel", phone("0170")).await;
  assert_eq!(cancelled["cancelled"], 0);

  let (_, ledger) = send(&app, "GET", "/invitations", None).await;
  assert_eq!(ledger[0]["status"], "cancelled");
}

#[tokio::test]
async fn unknown_phone_is_reported_generically() {
  let app = app().await;
  let (status, err) = send(&app, "POST", "/webhook/accept", phone("0999")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err, json!({ "error": "no such registration" }));

  let (status, err) = send(&app, "POST", "/webhook/delete", phone("0999")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err, json!({ "error": "no such registration" }));
}

#[tokio::test]
async fn delete_keeps_the_ledger() {
  let app = app().await;
  send(&app, "POST", "/persons", Some(json!({ "phone": "0170", "group": 1, "age": 40 }))).await;
  send(&app, "POST", "/calls", Some(call_body(1))).await;
  send(&app, "POST", "/tick", None).await;

  let (status, _) = send(&app, "POST", "/webhook/delete", phone("0170")).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, persons) = send(&app, "GET", "/persons", None).await;
  assert!(persons.as_array().unwrap().is_empty());
  let (_, ledger) = send(&app, "GET", "/invitations", None).await;
  assert_eq!(ledger.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_or_missing_phone_is_rejected() {
  let app = app().await;
  let (status, err) = send(&app, "POST", "/webhook/cancel", phone("  ")).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(err["fields"][0]["field"], "phone");

  let (status, _) = send(&app, "POST", "/webhook/cancel", Some(json!({ "from": "0170" }))).await;
  assert!(status.is_client_error());
}

#[tokio::test]
async fn capacity_error_is_an_internal_failure() {
  use axum::response::IntoResponse as _;

  let err = ApiError::from(impf_core::Error::CapacityExceeded(Uuid::new_v4()));
  assert!(matches!(err, ApiError::Internal(_)));

  let resp = err.into_response();
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["error"], "internal error");
}
