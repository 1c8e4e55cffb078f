// In-memory StreamStore for development runs and tests without Postgres

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::StreamStore;
use crate::{
    models::{LiveSession, Marathon, NewStream, Region, Stream, StreamId, StreamKey},
    Error, Result,
};

/// Store operations that can be made to fail on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateMarathon,
    DeleteMarathon,
    CreateStream,
    SetAllowLive,
    DeleteStream,
    ReplaceKey,
    OpenSession,
    CloseSession,
}

#[derive(Debug, Default)]
struct State {
    marathons: BTreeMap<String, Marathon>,
    streams: BTreeMap<String, Stream>,
    failures: HashSet<StoreOp>,
}

impl State {
    fn check(&self, op: StoreOp) -> Result<()> {
        if self.failures.contains(&op) {
            return Err(Error::Persistence(format!("injected failure in {op:?}")));
        }
        Ok(())
    }
}

/// Stream store held in process memory
///
/// One lock guards all state, so every operation is atomic and operations
/// on the same stream are serialized.
#[derive(Debug, Clone, Default)]
pub struct MemoryStreamStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStreamStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `op` fail with `Error::Persistence`
    pub async fn inject_failure(&self, op: StoreOp) {
        self.state.lock().await.failures.insert(op);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Number of live sessions across all streams
    pub async fn live_session_count(&self) -> usize {
        let state = self.state.lock().await;
        state.streams.values().filter(|s| s.is_live()).count()
    }
}

#[async_trait]
impl StreamStore for MemoryStreamStore {
    async fn create_marathon(&self, name: &str) -> Result<Marathon> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::CreateMarathon)?;

        if state.marathons.contains_key(name) {
            return Err(Error::Conflict(format!("Marathon {name} already exists")));
        }
        let marathon = Marathon {
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.marathons.insert(name.to_string(), marathon.clone());
        Ok(marathon)
    }

    async fn get_marathon(&self, name: &str) -> Result<Option<Marathon>> {
        let state = self.state.lock().await;
        Ok(state.marathons.get(name).cloned())
    }

    async fn list_marathons(&self) -> Result<Vec<Marathon>> {
        let state = self.state.lock().await;
        Ok(state.marathons.values().cloned().collect())
    }

    async fn delete_marathon(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::DeleteMarathon)?;

        if !state.marathons.contains_key(name) {
            return Err(Error::NotFound(format!("Marathon {name} not found")));
        }
        let streams = state.streams.values().filter(|s| s.in_marathon(name)).count();
        if streams > 0 {
            return Err(Error::Conflict(format!(
                "Marathon {name} still has {streams} stream(s)"
            )));
        }
        state.marathons.remove(name);
        Ok(())
    }

    async fn create_stream(&self, stream: &NewStream) -> Result<Stream> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::CreateStream)?;

        if state.streams.contains_key(&stream.name) {
            return Err(Error::Conflict(format!("Stream {} already exists", stream.name)));
        }
        if let Some(marathon) = &stream.marathon_name {
            if !state.marathons.contains_key(marathon) {
                return Err(Error::NotFound(format!("Marathon {marathon} not found")));
            }
        }

        let now = Utc::now();
        let created = Stream {
            id: StreamId::new(),
            name: stream.name.clone(),
            stream_key: stream.stream_key.clone(),
            allow_live: stream.allow_live,
            marathon_name: stream.marathon_name.clone(),
            live_stream: None,
            created_at: now,
            updated_at: now,
        };
        state.streams.insert(created.name.clone(), created.clone());
        Ok(created)
    }

    async fn get_stream(&self, name: &str) -> Result<Option<Stream>> {
        let state = self.state.lock().await;
        Ok(state.streams.get(name).cloned())
    }

    async fn list_streams(&self, marathon_name: Option<&str>) -> Result<Vec<Stream>> {
        let state = self.state.lock().await;
        Ok(state
            .streams
            .values()
            .filter(|s| marathon_name.is_none_or(|m| s.in_marathon(m)))
            .cloned()
            .collect())
    }

    async fn set_allow_live(&self, name: &str, allow_live: bool) -> Result<Stream> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::SetAllowLive)?;

        let stream = state
            .streams
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Stream {name} not found")))?;
        stream.allow_live = allow_live;
        stream.updated_at = Utc::now();
        Ok(stream.clone())
    }

    async fn delete_stream(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::DeleteStream)?;

        let stream = state
            .streams
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Stream {name} not found")))?;
        if stream.is_live() {
            return Err(Error::Conflict(format!(
                "Can't delete stream {name} while it is live"
            )));
        }
        state.streams.remove(name);
        Ok(())
    }

    async fn replace_key_if_idle(&self, name: &str, key: &StreamKey) -> Result<Stream> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::ReplaceKey)?;

        let stream = state
            .streams
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Stream {name} not found")))?;
        if stream.is_live() {
            return Err(Error::Conflict(format!(
                "Can't change the stream key of {name} while it is live"
            )));
        }
        stream.stream_key = key.clone();
        stream.updated_at = Utc::now();
        Ok(stream.clone())
    }

    async fn open_session(
        &self,
        admitted: &Stream,
        client_id: &str,
        region: &Region,
    ) -> Result<LiveSession> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::OpenSession)?;

        let stream = state
            .streams
            .get_mut(&admitted.name)
            .filter(|s| s.id == admitted.id)
            .ok_or_else(|| Error::Unauthorized(format!("Stream {} was removed", admitted.name)))?;
        if !stream.allow_live || stream.stream_key != admitted.stream_key {
            return Err(Error::Unauthorized(format!(
                "Credentials of stream {} changed during authorization",
                admitted.name
            )));
        }
        if stream.is_live() {
            return Err(Error::Conflict(format!("Stream {} is already live", admitted.name)));
        }

        let session = LiveSession {
            stream_id: stream.id.clone(),
            client_id: client_id.to_string(),
            region: region.clone(),
            started_at: Utc::now(),
        };
        stream.live_stream = Some(session.clone());
        Ok(session)
    }

    async fn close_session_by_client(&self, client_id: &str) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::CloseSession)?;

        let mut closed = 0;
        for stream in state.streams.values_mut() {
            if stream
                .live_stream
                .as_ref()
                .is_some_and(|session| session.client_id == client_id)
            {
                stream.live_stream = None;
                closed += 1;
            }
        }
        Ok(closed)
    }

    async fn close_session(&self, stream_id: &StreamId, client_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.check(StoreOp::CloseSession)?;

        let Some(stream) = state.streams.values_mut().find(|s| &s.id == stream_id) else {
            return Ok(false);
        };
        if stream
            .live_stream
            .as_ref()
            .is_some_and(|session| session.client_id == client_id)
        {
            stream.live_stream = None;
            return Ok(true);
        }
        Ok(false)
    }
}
