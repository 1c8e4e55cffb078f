//! Persistence for streams, marathons and live sessions
//!
//! `StreamStore` is the single source of truth for live state. Every method
//! is atomic with respect to concurrent callers, and every check-then-mutate
//! sequence on one stream is serialized by the implementation (row locks in
//! Postgres, one state lock in memory).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    models::{LiveSession, Marathon, NewStream, Region, Stream, StreamId, StreamKey},
    Result,
};

pub use memory::{MemoryStreamStore, StoreOp};
pub use postgres::PgStreamStore;

#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Insert a marathon. `Conflict` if the name is taken.
    async fn create_marathon(&self, name: &str) -> Result<Marathon>;

    async fn get_marathon(&self, name: &str) -> Result<Option<Marathon>>;

    /// All marathons ordered by name
    async fn list_marathons(&self) -> Result<Vec<Marathon>>;

    /// Remove a marathon. `NotFound` if absent, `Conflict` while any stream
    /// still references it.
    async fn delete_marathon(&self, name: &str) -> Result<()>;

    /// Insert a stream. `Conflict` if the name is taken, `NotFound` if the
    /// referenced marathon does not exist.
    async fn create_stream(&self, stream: &NewStream) -> Result<Stream>;

    /// Stream by exact name, with its live session if any
    async fn get_stream(&self, name: &str) -> Result<Option<Stream>>;

    /// Streams ordered by name, optionally restricted to one marathon
    async fn list_streams(&self, marathon_name: Option<&str>) -> Result<Vec<Stream>>;

    /// Flip the publish gate. Does not touch an existing live session.
    async fn set_allow_live(&self, name: &str, allow_live: bool) -> Result<Stream>;

    /// Remove an idle stream. `NotFound` if absent, `Conflict` if live.
    async fn delete_stream(&self, name: &str) -> Result<()>;

    /// Store a new key for an idle stream. `NotFound` if absent, `Conflict`
    /// if live; the stored key is untouched on any error.
    async fn replace_key_if_idle(&self, name: &str, key: &StreamKey) -> Result<Stream>;

    /// Create the live session of a stream that was admitted from the given
    /// snapshot.
    ///
    /// Fails with `Conflict` if the stream already has a session, and with
    /// `Unauthorized` if the stream was removed, gated off or re-keyed since
    /// the snapshot was read.
    async fn open_session(
        &self,
        admitted: &Stream,
        client_id: &str,
        region: &Region,
    ) -> Result<LiveSession>;

    /// Remove the session published by `client_id`; returns how many were removed
    async fn close_session_by_client(&self, client_id: &str) -> Result<u64>;

    /// Remove the session of a stream if it is still the one published by
    /// `client_id`; returns whether it was removed
    async fn close_session(&self, stream_id: &StreamId, client_id: &str) -> Result<bool>;
}
