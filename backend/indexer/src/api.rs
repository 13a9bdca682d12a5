//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::errors::Result;
use crate::events::EventRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/proposals/:id/events", get(get_proposal_events))
        .route("/accounts/:address/events", get(get_account_events))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Stored event type, e.g. `vote_cast`.
    pub event_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ProposalEventsResponse {
    pub proposal_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AccountEventsResponse {
    pub address: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /proposals/:id/events`
///
/// Returns all indexed events for the given proposal, oldest first.
pub async fn get_proposal_events(
    State(state): State<Arc<ApiState>>,
    Path(proposal_id): Path<String>,
) -> Response {
    let result = db::get_events_for_proposal(&state.pool, &proposal_id)
        .await
        .map(|events| ProposalEventsResponse {
            proposal_id,
            count: events.len(),
            events,
        });
    respond(result)
}

/// `GET /accounts/:address/events`
///
/// Votes, stakes, delegations and pool payouts involving the account.
pub async fn get_account_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    let result = db::get_events_for_account(&state.pool, &address)
        .await
        .map(|events| AccountEventsResponse {
            address,
            count: events.len(),
            events,
        });
    respond(result)
}

/// `GET /events?event_type=..&limit=..`
pub async fn get_all_events(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let result = db::get_all_events(&state.pool, query.event_type.as_deref(), query.limit)
        .await
        .map(|events| AllEventsResponse {
            count: events.len(),
            events,
        });
    respond(result)
}
