//! Notification hooks called by the media server
//!
//! nginx-rtmp style `on_publish` / `on_publish_done` callbacks. Any 2xx
//! answer to `/publish` lets the publisher in; anything else refuses it.

use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
use serde::Deserialize;
use streamgate_core::service::PublishRequest;

use crate::http::{AppResult, AppState};

/// `on_publish` form; extra fields sent by the media server are ignored
#[derive(Debug, Deserialize)]
pub struct PublishForm {
    pub name: String,
    pub clientid: String,
    pub tcurl: String,
    #[serde(default)]
    pub streamkey: Option<String>,
}

/// `on_publish_done` form
#[derive(Debug, Deserialize)]
pub struct DoneForm {
    pub clientid: String,
}

pub fn create_hook_router() -> Router<AppState> {
    Router::new()
        .route("/publish", post(on_publish))
        .route("/done", post(on_done))
}

/// POST /publish
pub async fn on_publish(
    State(state): State<AppState>,
    Form(form): Form<PublishForm>,
) -> AppResult<StatusCode> {
    let request = PublishRequest {
        name: form.name,
        client_id: form.clientid,
        connection_url: form.tcurl,
        supplied_key: form.streamkey.unwrap_or_default(),
    };

    state.authorizer.authorize_publish(&request).await?;
    Ok(StatusCode::OK)
}

/// POST /done
///
/// Unknown client ids are accepted silently.
pub async fn on_done(
    State(state): State<AppState>,
    Form(form): Form<DoneForm>,
) -> AppResult<StatusCode> {
    state.authorizer.release_publish(&form.clientid).await?;
    Ok(StatusCode::OK)
}
