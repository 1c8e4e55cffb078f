//! Stream administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use streamgate_core::models::{CreateStreamRequest, Stream, UpdateStreamRequest};

use crate::http::{AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListStreamsQuery {
    pub marathon: Option<String>,
}

pub fn create_stream_router() -> Router<AppState> {
    Router::new()
        .route("/streams", get(list_streams).post(create_stream))
        .route(
            "/streams/{name}",
            get(get_stream).patch(update_stream).delete(delete_stream),
        )
        .route("/streams/{name}/key", put(rotate_key))
}

/// GET /streams?marathon=
pub async fn list_streams(
    State(state): State<AppState>,
    Query(query): Query<ListStreamsQuery>,
) -> AppResult<Json<Vec<Stream>>> {
    let streams = state
        .registry
        .list_streams(query.marathon.as_deref())
        .await?;
    Ok(Json(streams))
}

/// POST /streams
pub async fn create_stream(
    State(state): State<AppState>,
    Json(request): Json<CreateStreamRequest>,
) -> AppResult<(StatusCode, Json<Stream>)> {
    let stream = state.registry.create_stream(request).await?;
    Ok((StatusCode::CREATED, Json(stream)))
}

pub async fn get_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Stream>> {
    Ok(Json(state.registry.get_stream(&name).await?))
}

/// PATCH /streams/{name}
///
/// Closing the gate does not end a running session; drop it for that.
pub async fn update_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<UpdateStreamRequest>,
) -> AppResult<Json<Stream>> {
    let stream = state
        .registry
        .set_allow_live(&name, request.allow_live)
        .await?;
    Ok(Json(stream))
}

pub async fn delete_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    state.registry.delete_stream(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /streams/{name}/key
pub async fn rotate_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Stream>> {
    Ok(Json(state.key_rotation.rotate_key(&name).await?))
}
