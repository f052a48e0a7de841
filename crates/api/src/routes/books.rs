//! Book endpoints. Reads return the joined audiobook view.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{BookInput, BookView};
use document_store::DocumentStore;
use serde::Serialize;

use super::index::MessageResponse;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCreatedResponse {
    pub message: &'static str,
    pub book_id: String,
}

/// GET /books — every book with its audiobooks.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<BookView>>, ApiError> {
    let books = state
        .catalog
        .books
        .list_with_audiobooks()
        .await
        .map_err(ApiError::or_internal("Failed to fetch books"))?;
    Ok(Json(books))
}

/// GET /books/{bookId} — a single-element array holding the joined view.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BookView>>, ApiError> {
    let book = state
        .catalog
        .books
        .get_with_audiobooks(&id)
        .await
        .map_err(ApiError::or_internal("Failed to fetch book"))?;
    Ok(Json(book))
}

/// POST /books
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BookCreatedResponse>), ApiError> {
    let Json(input) = payload?;
    let id = state
        .catalog
        .books
        .create(input)
        .await
        .map_err(ApiError::or_internal("Failed to create book"))?;

    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: "Book created successfully",
            book_id: id.to_string(),
        }),
    ))
}

/// PUT /books/{bookId}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state
        .catalog
        .books
        .update(&id, input)
        .await
        .map_err(ApiError::or_internal("Failed to update book"))?;

    Ok(Json(MessageResponse {
        message: "Book updated successfully",
    }))
}

/// DELETE /books/{bookId} — also clears `bookId` on linked audiobooks.
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .books
        .delete(&id)
        .await
        .map_err(ApiError::or_internal("Failed to delete book"))?;

    Ok(Json(MessageResponse {
        message: "Book deleted successfully",
    }))
}
