//! Administrative drop of a live publisher

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::put,
    Router,
};
use serde::Deserialize;
use streamgate_core::models::Stream;

use crate::http::{AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct DropQuery {
    /// Rotate the stream key once the publisher is gone
    #[serde(default)]
    pub change_key: bool,
}

pub fn create_drop_router() -> Router<AppState> {
    Router::new().route("/drop/{name}", put(drop_stream))
}

/// PUT /drop/{name}?change_key=bool
///
/// 404 when the stream is unknown or not live, 502 when the ingest server
/// cannot be reached or refuses. A 500 after the ingest server acted means
/// the publisher is gone but local state (session or key) was not updated.
pub async fn drop_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DropQuery>,
) -> AppResult<Json<Stream>> {
    let stream = state
        .ingest_control
        .drop_live_stream(&name, query.change_key)
        .await?;
    Ok(Json(stream))
}
