//! JSON REST API for the call coordinator.
//!
//! Exposes an axum [`Router`] backed by a [`Coordinator`] over any
//! [`CallStore`] and [`Notifier`]. Authentication and TLS are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", impf_api::api_router(coordinator.clone()))
//! ```

pub mod calls;
pub mod error;
pub mod invitations;
pub mod persons;
pub mod webhook;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::State,
  routing::{get, post},
};
use impf_coordinator::{Coordinator, TickReport};
use impf_core::{notify::Notifier, store::CallStore};

pub use error::ApiError;

/// Shared handler state.
pub type AppState<S, N> = Arc<Coordinator<S, N>>;

/// Build the API router for `coordinator`.
pub fn api_router<S, N>(coordinator: AppState<S, N>) -> Router<()>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Call registry
    .route("/calls", get(calls::list::<S, N>).post(calls::create::<S, N>))
    .route("/calls/{id}", get(calls::status::<S, N>))
    // Person directory
    .route("/persons", get(persons::list::<S, N>).post(persons::create::<S, N>))
    .route("/persons/batch", post(persons::import::<S, N>))
    // Ledger
    .route("/invitations", get(invitations::list::<S, N>))
    // Inbound SMS replies
    .route("/webhook/accept", post(webhook::accept::<S, N>))
    .route("/webhook/cancel", post(webhook::cancel::<S, N>))
    .route("/webhook/delete", post(webhook::delete::<S, N>))
    // Manual trigger of the periodic tick
    .route("/tick", post(tick::<S, N>))
    .with_state(coordinator)
}

/// `POST /tick`: run the dispatcher and sweeper once, now.
async fn tick<S, N>(State(coord): State<AppState<S, N>>) -> Json<TickReport>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  Json(coord.run_tick(coord.now()).await)
}

#[cfg(test)]
mod tests;
