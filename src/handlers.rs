// handlers.rs
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::debug;

use crate::error::{PollError, Result};
use crate::models::{CreatePollRequest, MessageResponse, Poll, VoteRequest};
use crate::routes::AppState;
use crate::validation::{INVALID_CREATE_PAYLOAD, INVALID_VOTE_PARAMS};

/// Create a poll
pub async fn create_poll(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("rejected create payload: {}", rejection);
        PollError::validation(INVALID_CREATE_PAYLOAD)
    })?;

    let poll = state.store.create(&request.question, &request.options).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Vote for one option of a poll
pub async fn vote(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    payload: std::result::Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("rejected vote payload: {}", rejection);
        PollError::validation(INVALID_VOTE_PARAMS)
    })?;

    let message = state.store.vote(&poll_id, &request.option_text).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Current state of a poll, including vote counts
pub async fn get_poll_results(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Poll>> {
    Ok(Json(state.store.get(&poll_id).await?))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let message = state.store.delete(&poll_id).await?;
    Ok(Json(MessageResponse::new(message)))
}

pub async fn list_active_polls(State(state): State<AppState>) -> Result<Json<Vec<Poll>>> {
    Ok(Json(state.store.list_active().await?))
}

/// Close a poll to further voting
pub async fn close_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Poll>> {
    Ok(Json(state.store.close(&poll_id).await?))
}

/// Liveness check that also proves the store is readable
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let polls = state.store.count().await?;
    Ok(Json(json!({ "status": "ok", "polls": polls })))
}
