//! Commands sent to the regional ingest (media) servers
//!
//! The only command is "drop publisher": the ingest server of the region a
//! stream is published to closes the publishing connection.

pub mod client;
pub mod mock;

use async_trait::async_trait;

use crate::{models::Region, Result};

pub use client::HttpIngestControl;
pub use mock::{ControlCall, RecordingIngestControl};

#[async_trait]
pub trait IngestControl: Send + Sync {
    /// Ask the ingest server of `region` to drop the publisher of `stream_name`.
    ///
    /// Fails with `ControlUnreachable` when the server cannot be reached in
    /// time and `ControlRejected` when it answers with a status of 400 or above.
    async fn drop_publisher(&self, region: &Region, stream_name: &str) -> Result<()>;
}
