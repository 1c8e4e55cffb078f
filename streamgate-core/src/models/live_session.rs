use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::StreamId;
use crate::{Error, Result};

/// Scheme prefix the region code follows in a media-server connection URL
const CONNECTION_SCHEME: &str = "rtmp://";

/// Number of characters in a region code
const REGION_LEN: usize = 2;

/// Region code routing control commands to a regional ingest server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Extract the region from the connection URL the media server reports
    /// for a publisher (`tcurl`).
    ///
    /// The URL must start with `rtmp://` (any case); the region is the two
    /// characters that follow, which must be ASCII alphanumeric. They are
    /// lower-cased. `rtmp://us.ingest.example.com/live` yields `us`.
    pub fn from_connection_url(url: &str) -> Result<Self> {
        let scheme = url.get(..CONNECTION_SCHEME.len()).ok_or_else(|| {
            Error::InvalidInput(format!("Connection URL too short: {url:?}"))
        })?;
        if !scheme.eq_ignore_ascii_case(CONNECTION_SCHEME) {
            return Err(Error::InvalidInput(format!(
                "Connection URL must start with {CONNECTION_SCHEME}: {url:?}"
            )));
        }

        let code = url
            .get(CONNECTION_SCHEME.len()..CONNECTION_SCHEME.len() + REGION_LEN)
            .filter(|code| code.bytes().all(|b| b.is_ascii_alphanumeric()))
            .ok_or_else(|| {
                Error::InvalidInput(format!("Connection URL carries no region code: {url:?}"))
            })?;

        Ok(Self(code.to_ascii_lowercase()))
    }

    /// Wrap a region already validated on the way into storage
    #[must_use]
    pub const fn from_string(region: String) -> Self {
        Self(region)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An active publish connection; a stream has at most one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSession {
    #[serde(skip)]
    pub stream_id: StreamId,
    pub client_id: String,
    pub region: Region,
    pub started_at: DateTime<Utc>,
}

/// A live session together with the name of the stream it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStreamView {
    pub stream: String,
    pub client_id: String,
    pub region: Region,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_short_host() {
        let region = Region::from_connection_url("rtmp://us/live").unwrap();
        assert_eq!(region.as_str(), "us");
    }

    #[test]
    fn test_region_from_regional_hostname() {
        let region = Region::from_connection_url("rtmp://eu.ingest.example.com:1935/live").unwrap();
        assert_eq!(region.as_str(), "eu");
    }

    #[test]
    fn test_region_is_lowercased() {
        let region = Region::from_connection_url("RTMP://AP.example.com/live").unwrap();
        assert_eq!(region.as_str(), "ap");
    }

    #[test]
    fn test_region_rejects_other_schemes() {
        assert!(matches!(
            Region::from_connection_url("rtmps://us.example.com/live"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Region::from_connection_url("http://us.example.com/live"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_region_rejects_truncated_or_garbage() {
        for url in ["", "rtmp", "rtmp://", "rtmp://u", "rtmp:///live", "rtmp://u/live", "rtmp://ü/x"] {
            assert!(
                matches!(Region::from_connection_url(url), Err(Error::InvalidInput(_))),
                "accepted {url:?}"
            );
        }
    }
}
