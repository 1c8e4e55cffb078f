//! Publish authorization and the live-session lifecycle
//!
//! A stream is `Idle` until the media server reports a publish that passes
//! `authorize_publish`, and `Live` until the matching "done" notification or
//! an administrative drop removes its session.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    models::{LiveSession, Region},
    repository::StreamStore,
    Error, Result,
};

/// A publish attempt as reported by the media server
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub name: String,
    pub client_id: String,
    /// Connection URL of the publisher (`tcurl`), carries the region
    pub connection_url: String,
    pub supplied_key: String,
}

#[derive(Clone)]
pub struct SessionAuthorizer {
    store: Arc<dyn StreamStore>,
}

impl std::fmt::Debug for SessionAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthorizer").finish()
    }
}

impl SessionAuthorizer {
    #[must_use]
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self { store }
    }

    /// Admit a publisher and open the stream's live session.
    ///
    /// Fails with `Unauthorized` for an unknown stream, a closed gate or a
    /// wrong key, with `InvalidInput` when the connection URL carries no
    /// region, and with `Conflict` when the stream is already live.
    pub async fn authorize_publish(&self, request: &PublishRequest) -> Result<LiveSession> {
        let Some(stream) = self.store.get_stream(&request.name).await? else {
            warn!(stream = %request.name, client_id = %request.client_id, "Publish rejected: unknown stream");
            return Err(Error::Unauthorized(format!(
                "Publishing to {} is not allowed",
                request.name
            )));
        };

        if !stream.allow_live {
            warn!(stream = %stream.name, client_id = %request.client_id, "Publish rejected: stream is not allowed to go live");
            return Err(Error::Unauthorized(format!(
                "Stream {} is not allowed to go live",
                stream.name
            )));
        }

        if !stream.stream_key.matches(&request.supplied_key) {
            warn!(stream = %stream.name, client_id = %request.client_id, "Publish rejected: invalid stream key");
            return Err(Error::Unauthorized(format!(
                "Invalid stream key for {}",
                stream.name
            )));
        }

        let region = Region::from_connection_url(&request.connection_url).inspect_err(|e| {
            warn!(stream = %stream.name, client_id = %request.client_id, "Publish rejected: {}", e);
        })?;

        let session = self
            .store
            .open_session(&stream, &request.client_id, &region)
            .await
            .inspect_err(|e| {
                warn!(stream = %stream.name, client_id = %request.client_id, "Failed to open live session: {}", e);
            })?;

        info!(
            stream = %stream.name,
            client_id = %session.client_id,
            region = %session.region,
            "Stream went live"
        );
        Ok(session)
    }

    /// End the session published by `client_id`.
    ///
    /// An unmatched client id is a no-op; returns whether a session was closed.
    pub async fn release_publish(&self, client_id: &str) -> Result<bool> {
        let closed = self.store.close_session_by_client(client_id).await?;
        if closed == 0 {
            debug!(client_id = %client_id, "Done notification matched no live session");
            return Ok(false);
        }

        info!(client_id = %client_id, "Live session ended");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewStream, StreamKey};
    use crate::repository::MemoryStreamStore;

    async fn authorizer_with(name: &str, allow_live: bool) -> (SessionAuthorizer, MemoryStreamStore) {
        let store = MemoryStreamStore::new();
        store
            .create_stream(&NewStream {
                name: name.to_string(),
                stream_key: StreamKey::from_string("K1".to_string()),
                allow_live,
                marathon_name: None,
            })
            .await
            .unwrap();
        (SessionAuthorizer::new(Arc::new(store.clone())), store)
    }

    fn publish(name: &str, client_id: &str, url: &str, key: &str) -> PublishRequest {
        PublishRequest {
            name: name.to_string(),
            client_id: client_id.to_string(),
            connection_url: url.to_string(),
            supplied_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_gate_and_key_must_both_pass() {
        for (allow_live, key, admitted) in [
            (true, "K1", true),
            (true, "K2", false),
            (false, "K1", false),
            (false, "K2", false),
        ] {
            let (authorizer, store) = authorizer_with("alice", allow_live).await;
            let result = authorizer
                .authorize_publish(&publish("alice", "42", "rtmp://us/live", key))
                .await;

            assert_eq!(result.is_ok(), admitted, "allow_live={allow_live} key={key}");
            if !admitted {
                assert!(matches!(result.unwrap_err(), Error::Unauthorized(_)));
            }
            assert_eq!(store.live_session_count().await, usize::from(admitted));
        }
    }

    #[tokio::test]
    async fn test_key_comparison_is_case_sensitive() {
        let (authorizer, _) = authorizer_with("alice", true).await;
        let err = authorizer
            .authorize_publish(&publish("alice", "42", "rtmp://us/live", "k1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unknown_stream_is_unauthorized() {
        let (authorizer, _) = authorizer_with("alice", true).await;
        let err = authorizer
            .authorize_publish(&publish("ghost", "42", "rtmp://us/live", "K1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_region_is_taken_from_connection_url() {
        let (authorizer, _) = authorizer_with("alice", true).await;
        let session = authorizer
            .authorize_publish(&publish("alice", "42", "RTMP://EU.ingest.example.com/live", "K1"))
            .await
            .unwrap();
        assert_eq!(session.region.as_str(), "eu");
        assert_eq!(session.client_id, "42");
    }

    #[tokio::test]
    async fn test_malformed_url_is_invalid_after_credentials() {
        let (authorizer, store) = authorizer_with("alice", true).await;

        let err = authorizer
            .authorize_publish(&publish("alice", "42", "http://us/live", "K1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = authorizer
            .authorize_publish(&publish("alice", "42", "http://us/live", "bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(store.live_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_publish_is_conflict() {
        let (authorizer, store) = authorizer_with("alice", true).await;
        authorizer
            .authorize_publish(&publish("alice", "42", "rtmp://us/live", "K1"))
            .await
            .unwrap();

        let err = authorizer
            .authorize_publish(&publish("alice", "43", "rtmp://eu/live", "K1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let stream = store.get_stream("alice").await.unwrap().unwrap();
        assert_eq!(stream.live_stream.unwrap().client_id, "42");
    }

    #[tokio::test]
    async fn test_release_unmatched_client_is_noop() {
        let (authorizer, store) = authorizer_with("alice", true).await;
        authorizer
            .authorize_publish(&publish("alice", "42", "rtmp://us/live", "K1"))
            .await
            .unwrap();

        assert!(!authorizer.release_publish("7").await.unwrap());
        assert_eq!(store.live_session_count().await, 1);

        assert!(authorizer.release_publish("42").await.unwrap());
        assert!(!authorizer.release_publish("42").await.unwrap());
        assert_eq!(store.live_session_count().await, 0);
    }
}
