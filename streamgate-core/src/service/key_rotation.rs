//! Stream key generation and rotation

use std::sync::Arc;

use rand::{rngs::OsRng, Rng};
use tracing::{error, info};

use crate::{
    models::{Stream, StreamKey},
    repository::StreamStore,
    Error, Result,
};

/// Length of a generated stream key
pub const STREAM_KEY_LEN: usize = 25;

const STREAM_KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a new stream key: 25 letters drawn uniformly from `[A-Za-z]` by
/// the operating system CSPRNG
#[must_use]
pub fn generate_stream_key() -> StreamKey {
    let mut rng = OsRng;
    let key: String = (0..STREAM_KEY_LEN)
        .map(|_| char::from(STREAM_KEY_ALPHABET[rng.gen_range(0..STREAM_KEY_ALPHABET.len())]))
        .collect();
    StreamKey::from_string(key)
}

/// Replaces the key of idle streams
#[derive(Clone)]
pub struct KeyRotationService {
    store: Arc<dyn StreamStore>,
}

impl std::fmt::Debug for KeyRotationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRotationService").finish()
    }
}

impl KeyRotationService {
    #[must_use]
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self { store }
    }

    /// Give an idle stream a fresh key.
    ///
    /// `Conflict` while the stream is live. On a storage failure the old key
    /// stays in place and `Persistence` is returned.
    pub async fn rotate_key(&self, name: &str) -> Result<Stream> {
        let key = generate_stream_key();

        match self.store.replace_key_if_idle(name, &key).await {
            Ok(stream) => {
                info!(stream = %name, "Stream key rotated");
                Ok(stream)
            }
            Err(e) if e.is_persistence() => {
                error!(stream = %name, "Failed to store new stream key: {}", e);
                Err(Error::Persistence(format!(
                    "Failed to store new key for stream {name}: {e}"
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Rotate the key of a stream addressed through its marathon.
    ///
    /// `NotFound` when the stream exists but belongs to another marathon.
    pub async fn rotate_key_in_marathon(&self, marathon_name: &str, name: &str) -> Result<Stream> {
        let belongs = self
            .store
            .get_stream(name)
            .await?
            .is_some_and(|stream| stream.in_marathon(marathon_name));
        if !belongs {
            return Err(Error::NotFound(format!(
                "Stream {name} not found in marathon {marathon_name}"
            )));
        }

        self.rotate_key(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewStream, Region};
    use crate::repository::{MemoryStreamStore, StoreOp};

    async fn store_with(name: &str, marathon: Option<&str>) -> MemoryStreamStore {
        let store = MemoryStreamStore::new();
        if let Some(m) = marathon {
            store.create_marathon(m).await.unwrap();
        }
        store
            .create_stream(&NewStream {
                name: name.to_string(),
                stream_key: StreamKey::from_string("K1".to_string()),
                allow_live: true,
                marathon_name: marathon.map(str::to_string),
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_stream_key();
        assert_eq!(key.as_str().len(), STREAM_KEY_LEN);
        assert!(key.as_str().bytes().all(|b| b.is_ascii_alphabetic()));
        assert_ne!(generate_stream_key(), key);
    }

    #[tokio::test]
    async fn test_rotate_idle_stream() {
        let store = store_with("alice", None).await;
        let service = KeyRotationService::new(Arc::new(store.clone()));

        let rotated = service.rotate_key("alice").await.unwrap();
        assert!(!rotated.stream_key.matches("K1"));
        assert_eq!(rotated.stream_key.as_str().len(), STREAM_KEY_LEN);

        let stored = store.get_stream("alice").await.unwrap().unwrap();
        assert_eq!(stored.stream_key, rotated.stream_key);
    }

    #[tokio::test]
    async fn test_rotate_live_stream_is_conflict() {
        let store = store_with("alice", None).await;
        let stream = store.get_stream("alice").await.unwrap().unwrap();
        store
            .open_session(&stream, "42", &Region::from_string("us".to_string()))
            .await
            .unwrap();
        let service = KeyRotationService::new(Arc::new(store.clone()));

        let err = service.rotate_key("alice").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let stored = store.get_stream("alice").await.unwrap().unwrap();
        assert!(stored.stream_key.matches("K1"));
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_old_key() {
        let store = store_with("alice", None).await;
        store.inject_failure(StoreOp::ReplaceKey).await;
        let service = KeyRotationService::new(Arc::new(store.clone()));

        let err = service.rotate_key("alice").await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        let stored = store.get_stream("alice").await.unwrap().unwrap();
        assert!(stored.stream_key.matches("K1"));
    }

    #[tokio::test]
    async fn test_rotate_unknown_stream_is_not_found() {
        let service = KeyRotationService::new(Arc::new(MemoryStreamStore::new()));
        let err = service.rotate_key("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rotate_in_other_marathon_is_not_found() {
        let store = store_with("alice", Some("spring")).await;
        store.create_marathon("autumn").await.unwrap();
        let service = KeyRotationService::new(Arc::new(store.clone()));

        let err = service
            .rotate_key_in_marathon("autumn", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert!(service.rotate_key_in_marathon("spring", "alice").await.is_ok());
    }
}
