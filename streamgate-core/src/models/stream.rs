use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::id::StreamId;
use super::live_session::LiveSession;

/// Opaque publish credential of a stream
///
/// Serialized as a plain string so the administrative API can hand it to the
/// streamer, but never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamKey(String);

impl StreamKey {
    #[must_use]
    pub const fn from_string(key: String) -> Self {
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive comparison that does not short-circuit on the
    /// first differing byte.
    #[must_use]
    pub fn matches(&self, supplied: &str) -> bool {
        self.0.as_bytes().ct_eq(supplied.as_bytes()).into()
    }
}

impl std::fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StreamKey(***)")
    }
}

/// Position of a stream in the publish lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Idle,
    Live,
}

impl StreamState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Live => "live",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    #[serde(skip)]
    pub id: StreamId,
    pub name: String,
    pub stream_key: StreamKey,
    pub allow_live: bool,
    pub marathon_name: Option<String>,
    pub live_stream: Option<LiveSession>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stream {
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live_stream.is_some()
    }

    #[must_use]
    pub const fn state(&self) -> StreamState {
        if self.is_live() {
            StreamState::Live
        } else {
            StreamState::Idle
        }
    }

    /// Whether this stream belongs to the given marathon
    #[must_use]
    pub fn in_marathon(&self, marathon_name: &str) -> bool {
        self.marathon_name.as_deref() == Some(marathon_name)
    }
}

/// Fully resolved stream row handed to the store for insertion
#[derive(Debug, Clone)]
pub struct NewStream {
    pub name: String,
    pub stream_key: StreamKey,
    pub allow_live: bool,
    pub marathon_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStreamRequest {
    pub name: String,
    #[serde(default)]
    pub allow_live: bool,
    #[serde(default)]
    pub marathon_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStreamRequest {
    pub allow_live: bool,
}
