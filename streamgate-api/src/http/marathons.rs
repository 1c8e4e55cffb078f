//! Marathon endpoints, including the marathon-scoped stream routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, put},
    Router,
};
use serde::Deserialize;
use streamgate_core::models::{
    CreateMarathonRequest, CreateStreamRequest, LiveStreamView, Marathon, Stream,
};

use crate::http::{AppResult, AppState};

/// Body of POST /marathons/{name}/streams; the marathon comes from the path
#[derive(Debug, Deserialize)]
pub struct CreateMarathonStreamRequest {
    pub name: String,
    #[serde(default)]
    pub allow_live: bool,
}

pub fn create_marathon_router() -> Router<AppState> {
    Router::new()
        .route("/marathons", get(list_marathons).post(create_marathon))
        .route("/marathons/{name}", delete(delete_marathon))
        .route(
            "/marathons/{name}/streams",
            get(list_marathon_streams).post(create_marathon_stream),
        )
        .route("/marathons/{name}/streams/{stream}", put(rotate_marathon_stream_key))
        .route("/marathons/{name}/live", get(list_live_streams))
}

pub async fn list_marathons(State(state): State<AppState>) -> AppResult<Json<Vec<Marathon>>> {
    Ok(Json(state.registry.list_marathons().await?))
}

pub async fn create_marathon(
    State(state): State<AppState>,
    Json(request): Json<CreateMarathonRequest>,
) -> AppResult<(StatusCode, Json<Marathon>)> {
    let marathon = state.registry.create_marathon(&request.name).await?;
    Ok((StatusCode::CREATED, Json(marathon)))
}

/// DELETE /marathons/{name}
///
/// 409 while any stream still belongs to the marathon.
pub async fn delete_marathon(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    state.registry.delete_marathon(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_marathon_streams(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<Stream>>> {
    Ok(Json(state.registry.list_streams(Some(&name)).await?))
}

pub async fn create_marathon_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<CreateMarathonStreamRequest>,
) -> AppResult<(StatusCode, Json<Stream>)> {
    let stream = state
        .registry
        .create_stream(CreateStreamRequest {
            name: request.name,
            allow_live: request.allow_live,
            marathon_name: Some(name),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(stream)))
}

/// PUT /marathons/{name}/streams/{stream}
///
/// Rotates the key; 404 when the stream belongs to another marathon.
pub async fn rotate_marathon_stream_key(
    State(state): State<AppState>,
    Path((name, stream)): Path<(String, String)>,
) -> AppResult<Json<Stream>> {
    let stream = state
        .key_rotation
        .rotate_key_in_marathon(&name, &stream)
        .await?;
    Ok(Json(stream))
}

/// GET /marathons/{name}/live
pub async fn list_live_streams(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<LiveStreamView>>> {
    Ok(Json(state.registry.list_live_streams(&name).await?))
}
