//! Administrative drop of live publishers
//!
//! Ordering is observable from outside: the ingest server drops the
//! publisher first, then the local session is removed, then (optionally) the
//! key is rotated. A failure after the remote drop is always reported, and a
//! failed rotation leaves the stream idle with its old key.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    control::IngestControl,
    models::Stream,
    repository::StreamStore,
    service::key_rotation::KeyRotationService,
    Error, Result,
};

#[derive(Clone)]
pub struct IngestControlService {
    store: Arc<dyn StreamStore>,
    control: Arc<dyn IngestControl>,
    key_rotation: KeyRotationService,
}

impl std::fmt::Debug for IngestControlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestControlService").finish()
    }
}

impl IngestControlService {
    #[must_use]
    pub fn new(
        store: Arc<dyn StreamStore>,
        control: Arc<dyn IngestControl>,
        key_rotation: KeyRotationService,
    ) -> Self {
        Self {
            store,
            control,
            key_rotation,
        }
    }

    /// Have the regional ingest server drop the publisher of `stream`, then
    /// remove its live session and return the stream as it is now stored.
    ///
    /// `NoActiveSession` is returned before any network I/O when the stream
    /// is idle. If the session cannot be removed after the remote drop the
    /// error is `Persistence`. The drop command addresses the stream by name,
    /// so when another publisher took over before it ran the registry may no
    /// longer match the ingest server and `Conflict` is returned.
    pub async fn drop_publisher(&self, stream: &Stream) -> Result<Stream> {
        let session = stream.live_stream.as_ref().ok_or_else(|| {
            Error::NoActiveSession(format!("Stream {} is not live", stream.name))
        })?;

        self.control
            .drop_publisher(&session.region, &stream.name)
            .await?;

        let closed = match self.store.close_session(&stream.id, &session.client_id).await {
            Ok(closed) => closed,
            Err(e) => {
                error!(
                    stream = %stream.name,
                    client_id = %session.client_id,
                    "Publisher dropped but live session could not be removed: {}",
                    e
                );
                return Err(Error::Persistence(format!(
                    "Publisher of stream {} was dropped but its live session is still recorded: {e}",
                    stream.name
                )));
            }
        };

        let current = self
            .store
            .get_stream(&stream.name)
            .await
            .map_err(|e| {
                Error::Persistence(format!(
                    "Publisher of stream {} was dropped but the stream could not be re-read: {e}",
                    stream.name
                ))
            })?
            .ok_or_else(|| Error::NotFound(format!("Stream {} not found", stream.name)))?;

        if closed {
            info!(
                stream = %stream.name,
                client_id = %session.client_id,
                region = %session.region,
                "Publisher dropped"
            );
            return Ok(current);
        }

        match &current.live_stream {
            Some(live) if live.client_id != session.client_id => {
                error!(
                    stream = %stream.name,
                    dropped_client_id = %session.client_id,
                    recorded_client_id = %live.client_id,
                    "Ingest server dropped a publisher but a newer session is recorded"
                );
                Err(Error::Conflict(format!(
                    "Ingest server dropped the publisher of stream {} but client {} went live after client {} and is still recorded as live",
                    stream.name, live.client_id, session.client_id
                )))
            }
            _ => {
                // The done notification raced us and already closed it
                debug!(stream = %stream.name, client_id = %session.client_id, "Live session already closed");
                Ok(current)
            }
        }
    }

    /// Drop the live publisher of `name`, optionally rotating its key
    /// afterwards so the dropped publisher cannot reconnect.
    pub async fn drop_live_stream(&self, name: &str, rotate_after: bool) -> Result<Stream> {
        let stream = self
            .store
            .get_stream(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Stream {name} not found")))?;

        let stream = self.drop_publisher(&stream).await?;

        if !rotate_after {
            return Ok(stream);
        }

        match self.key_rotation.rotate_key(name).await {
            Ok(rotated) => Ok(rotated),
            Err(Error::Conflict(_)) => {
                error!(stream = %name, "Stream went live again before its key was rotated");
                Err(Error::Conflict(format!(
                    "Stream {name} was dropped but went live again before its key could be rotated; the previous key is still active"
                )))
            }
            Err(e) => {
                error!(stream = %name, "Stream dropped but key rotation failed: {}", e);
                Err(Error::Persistence(format!(
                    "Stream {name} was dropped but its key could not be rotated; the previous key is still active: {e}"
                )))
            }
        }
    }
}
