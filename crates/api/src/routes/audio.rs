//! Audiobook endpoints. Writes keep the linked book's `hasAudiobook` flag
//! in sync before responding.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{Audiobook, AudiobookInput};
use document_store::DocumentStore;
use serde::Serialize;

use super::index::MessageResponse;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiobookCreatedResponse {
    pub message: &'static str,
    pub audio_id: String,
}

/// GET /audio
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Audiobook>>, ApiError> {
    let audiobooks = state
        .catalog
        .audiobooks
        .list()
        .await
        .map_err(ApiError::or_internal("Failed to fetch audiobooks"))?;
    Ok(Json(audiobooks))
}

/// GET /audio/{audioId}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Audiobook>, ApiError> {
    let audiobook = state
        .catalog
        .audiobooks
        .get(&id)
        .await
        .map_err(ApiError::or_internal("Failed to fetch audiobook"))?;
    Ok(Json(audiobook))
}

/// POST /audio
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<AudiobookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AudiobookCreatedResponse>), ApiError> {
    let Json(input) = payload?;
    let id = state
        .catalog
        .audiobooks
        .create(input)
        .await
        .map_err(ApiError::or_internal("Failed to create audiobook"))?;

    Ok((
        StatusCode::CREATED,
        Json(AudiobookCreatedResponse {
            message: "Audiobook created successfully",
            audio_id: id.to_string(),
        }),
    ))
}

/// PUT /audio/{audioId}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<AudiobookInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state
        .catalog
        .audiobooks
        .update(&id, input)
        .await
        .map_err(ApiError::or_internal("Failed to update audiobook"))?;

    Ok(Json(MessageResponse {
        message: "Audiobook updated successfully",
    }))
}

/// DELETE /audio/{audioId}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .audiobooks
        .delete(&id)
        .await
        .map_err(ApiError::or_internal("Failed to delete audiobook"))?;

    Ok(Json(MessageResponse {
        message: "Audiobook deleted successfully",
    }))
}
