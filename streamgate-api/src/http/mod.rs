// HTTP routes and shared handler state

pub mod drop;
pub mod error;
pub mod health;
pub mod hooks;
pub mod marathons;
pub mod streams;

use axum::{http::HeaderValue, Router};
use streamgate_core::{
    bootstrap::Services,
    service::{IngestControlService, KeyRotationService, SessionAuthorizer, StreamRegistry},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

pub use error::{AppError, AppResult};

/// Largest accepted request body; every payload here is a handful of fields
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: StreamRegistry,
    pub authorizer: SessionAuthorizer,
    pub key_rotation: KeyRotationService,
    pub ingest_control: IngestControlService,
}

impl From<Services> for AppState {
    fn from(services: Services) -> Self {
        Self {
            registry: services.registry,
            authorizer: services.authorizer,
            key_rotation: services.key_rotation,
            ingest_control: services.ingest_control,
        }
    }
}

/// Build the CORS layer for the admin UI; `*` allows any origin
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Create the HTTP router with all routes
///
/// `cors_origins` lists the browser origins allowed to call the API.
pub fn create_router(services: Services, cors_origins: &[String]) -> Router {
    let state = AppState::from(services);

    Router::new()
        // Health check endpoint
        .merge(health::create_health_router())
        // Administrative API
        .merge(marathons::create_marathon_router())
        .merge(streams::create_stream_router())
        .merge(drop::create_drop_router())
        // Media server notifications
        .merge(hooks::create_hook_router())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        // Apply state to all routes (must be last)
        .with_state(state)
}
