//! User endpoints. Passwords are accepted but never returned.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{UserInput, UserView};
use document_store::DocumentStore;
use serde::Serialize;

use super::index::MessageResponse;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    pub message: &'static str,
    pub user_id: String,
}

/// GET /users
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state
        .catalog
        .users
        .list()
        .await
        .map_err(ApiError::or_internal("Failed to fetch all users"))?;
    Ok(Json(users))
}

/// GET /users/{userId}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let user = state
        .catalog
        .users
        .get(&id)
        .await
        .map_err(ApiError::or_internal("Failed to fetch user by Id"))?;
    Ok(Json(user))
}

/// POST /users
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let Json(input) = payload?;
    let id = state
        .catalog
        .users
        .create(input)
        .await
        .map_err(ApiError::or_internal("Failed to create a new user"))?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "New user created successfully",
            user_id: id.to_string(),
        }),
    ))
}

/// PUT /users/{userId}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state
        .catalog
        .users
        .update(&id, input)
        .await
        .map_err(ApiError::or_internal("Failed to update user"))?;

    Ok(Json(MessageResponse {
        message: "User updated successfully",
    }))
}

/// DELETE /users/{userId}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .users
        .delete(&id)
        .await
        .map_err(ApiError::or_internal("Failed to delete user"))?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
