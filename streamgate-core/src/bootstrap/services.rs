//! Service initialization and dependency injection

use std::sync::Arc;

use tracing::info;

use crate::{
    control::{HttpIngestControl, IngestControl},
    repository::StreamStore,
    service::{IngestControlService, KeyRotationService, SessionAuthorizer, StreamRegistry},
    Config,
};

/// Container for all initialized services
#[derive(Clone)]
pub struct Services {
    /// Stream and marathon CRUD
    pub registry: StreamRegistry,
    /// Publish / done notifications from the media server
    pub authorizer: SessionAuthorizer,
    pub key_rotation: KeyRotationService,
    /// Administrative drops through the regional ingest servers
    pub ingest_control: IngestControlService,
}

impl Services {
    /// Wire every service around one store and one control transport
    #[must_use]
    pub fn new(store: Arc<dyn StreamStore>, control: Arc<dyn IngestControl>) -> Self {
        let key_rotation = KeyRotationService::new(store.clone());
        Self {
            registry: StreamRegistry::new(store.clone()),
            authorizer: SessionAuthorizer::new(store.clone()),
            ingest_control: IngestControlService::new(store, control, key_rotation.clone()),
            key_rotation,
        }
    }
}

/// Initialize all services on top of `store`, talking to the ingest servers
/// over HTTP as configured
pub fn init_services(store: Arc<dyn StreamStore>, config: &Config) -> anyhow::Result<Services> {
    let control = HttpIngestControl::new(config.control.clone())?;

    match &config.control.endpoint_override {
        Some(endpoint) => info!(endpoint = %endpoint, "Ingest control uses a single endpoint"),
        None => info!(
            base_domain = %config.control.base_domain,
            scheme = %config.control.scheme,
            "Ingest control addresses regional servers"
        ),
    }

    Ok(Services::new(store, Arc::new(control)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::models::CreateStreamRequest;
    use crate::repository::MemoryStreamStore;

    #[tokio::test]
    async fn test_services_share_one_store() {
        let config = Config {
            control: ControlConfig {
                base_domain: "ingest.example.com".to_string(),
                ..ControlConfig::default()
            },
            ..Config::default()
        };
        let services = init_services(Arc::new(MemoryStreamStore::new()), &config).unwrap();

        let created = services
            .registry
            .create_stream(CreateStreamRequest {
                name: "alice".to_string(),
                allow_live: true,
                marathon_name: None,
            })
            .await
            .unwrap();
        let rotated = services.key_rotation.rotate_key("alice").await.unwrap();

        assert_ne!(created.stream_key, rotated.stream_key);
        assert_eq!(
            services.registry.get_stream("alice").await.unwrap().stream_key,
            rotated.stream_key
        );
    }
}
