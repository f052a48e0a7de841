//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{Order, OrderInput};
use document_store::DocumentStore;
use serde::Serialize;

use super::index::MessageResponse;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub message: &'static str,
    pub order_id: String,
}

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .catalog
        .orders
        .list()
        .await
        .map_err(ApiError::or_internal("Server error getting orders"))?;
    Ok(Json(orders))
}

/// GET /users/{userId}/orders
#[tracing::instrument(skip(state))]
pub async fn by_user<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .catalog
        .orders
        .list_by_user(&user_id)
        .await
        .map_err(ApiError::or_internal("Server error getting orders by user"))?;
    Ok(Json(orders))
}

/// GET /orders/{orderId}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .catalog
        .orders
        .get(&id)
        .await
        .map_err(ApiError::or_internal(
            "Internal server error getting order by Id",
        ))?;
    Ok(Json(order))
}

/// POST /orders
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let Json(input) = payload?;
    let id = state
        .catalog
        .orders
        .create(input)
        .await
        .map_err(ApiError::or_internal(
            "Internal server error while creating order",
        ))?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: "Order created successfully",
            order_id: id.to_string(),
        }),
    ))
}

/// PUT /orders/{orderId}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state
        .catalog
        .orders
        .update(&id, input)
        .await
        .map_err(ApiError::or_internal(
            "Internal server error while updating order",
        ))?;

    Ok(Json(MessageResponse {
        message: "Order updated successfully",
    }))
}

/// DELETE /orders/{orderId}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .orders
        .delete(&id)
        .await
        .map_err(ApiError::or_internal(
            "Internal server error while deleting order",
        ))?;

    Ok(Json(MessageResponse {
        message: "Order deleted successfully",
    }))
}
