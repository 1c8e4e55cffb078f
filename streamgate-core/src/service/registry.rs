//! Stream and marathon registry

use std::sync::Arc;

use tracing::info;

use crate::{
    models::{validate_name, CreateStreamRequest, LiveStreamView, Marathon, NewStream, Stream},
    repository::StreamStore,
    service::key_rotation::generate_stream_key,
    Error, Result,
};

/// CRUD over streams and marathons
#[derive(Clone)]
pub struct StreamRegistry {
    store: Arc<dyn StreamStore>,
}

impl std::fmt::Debug for StreamRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRegistry").finish()
    }
}

impl StreamRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self { store }
    }

    /// Register a stream with a freshly generated key
    pub async fn create_stream(&self, request: CreateStreamRequest) -> Result<Stream> {
        validate_name("Stream", &request.name)?;
        if let Some(marathon) = &request.marathon_name {
            validate_name("Marathon", marathon)?;
        }

        let stream = self
            .store
            .create_stream(&NewStream {
                name: request.name,
                stream_key: generate_stream_key(),
                allow_live: request.allow_live,
                marathon_name: request.marathon_name,
            })
            .await?;

        info!(
            stream = %stream.name,
            marathon = ?stream.marathon_name,
            allow_live = stream.allow_live,
            "Stream created"
        );
        Ok(stream)
    }

    pub async fn get_stream(&self, name: &str) -> Result<Stream> {
        self.store
            .get_stream(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Stream {name} not found")))
    }

    /// All streams, or only those of one marathon (`NotFound` if it does not exist)
    pub async fn list_streams(&self, marathon_name: Option<&str>) -> Result<Vec<Stream>> {
        if let Some(marathon) = marathon_name {
            self.get_marathon(marathon).await?;
        }
        self.store.list_streams(marathon_name).await
    }

    /// Open or close the publish gate. A running session is left alone.
    pub async fn set_allow_live(&self, name: &str, allow_live: bool) -> Result<Stream> {
        let stream = self.store.set_allow_live(name, allow_live).await?;
        info!(stream = %name, allow_live, "Stream publish gate changed");
        Ok(stream)
    }

    /// Remove an idle stream; `Conflict` while it is live
    pub async fn delete_stream(&self, name: &str) -> Result<()> {
        self.store.delete_stream(name).await?;
        info!(stream = %name, "Stream deleted");
        Ok(())
    }

    pub async fn create_marathon(&self, name: &str) -> Result<Marathon> {
        validate_name("Marathon", name)?;
        let marathon = self.store.create_marathon(name).await?;
        info!(marathon = %name, "Marathon created");
        Ok(marathon)
    }

    pub async fn get_marathon(&self, name: &str) -> Result<Marathon> {
        self.store
            .get_marathon(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Marathon {name} not found")))
    }

    pub async fn list_marathons(&self) -> Result<Vec<Marathon>> {
        self.store.list_marathons().await
    }

    /// Remove a marathon that no stream references any more
    pub async fn delete_marathon(&self, name: &str) -> Result<()> {
        self.store.delete_marathon(name).await?;
        info!(marathon = %name, "Marathon deleted");
        Ok(())
    }

    /// Live sessions of the streams in a marathon
    pub async fn list_live_streams(&self, marathon_name: &str) -> Result<Vec<LiveStreamView>> {
        let streams = self.list_streams(Some(marathon_name)).await?;

        Ok(streams
            .into_iter()
            .filter_map(|stream| {
                stream.live_stream.map(|session| LiveStreamView {
                    stream: stream.name,
                    client_id: session.client_id,
                    region: session.region,
                    started_at: session.started_at,
                })
            })
            .collect())
    }
}
