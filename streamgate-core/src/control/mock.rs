// Recording IngestControl for testing without an ingest server

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::IngestControl;
use crate::{models::Region, Error, Result};

/// A drop command as the ingest server would have received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCall {
    pub region: Region,
    pub stream_name: String,
}

#[derive(Debug, Clone)]
enum Outcome {
    Accept,
    Unreachable,
    Reject(u16),
}

/// Records every drop command and answers with a configurable outcome
#[derive(Debug, Clone)]
pub struct RecordingIngestControl {
    calls: Arc<Mutex<Vec<ControlCall>>>,
    outcome: Arc<Mutex<Outcome>>,
}

impl RecordingIngestControl {
    /// A control server that accepts every command
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            outcome: Arc::new(Mutex::new(Outcome::Accept)),
        }
    }

    pub fn accept(&self) {
        *self.outcome.lock() = Outcome::Accept;
    }

    pub fn fail_unreachable(&self) {
        *self.outcome.lock() = Outcome::Unreachable;
    }

    pub fn reject_with(&self, status: u16) {
        *self.outcome.lock() = Outcome::Reject(status);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().clone()
    }
}

impl Default for RecordingIngestControl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestControl for RecordingIngestControl {
    async fn drop_publisher(&self, region: &Region, stream_name: &str) -> Result<()> {
        self.calls.lock().push(ControlCall {
            region: region.clone(),
            stream_name: stream_name.to_string(),
        });

        let outcome = self.outcome.lock().clone();
        match outcome {
            Outcome::Accept => Ok(()),
            Outcome::Unreachable => Err(Error::ControlUnreachable(format!(
                "ingest server for region {region} is down"
            ))),
            Outcome::Reject(status) => Err(Error::ControlRejected {
                status,
                body: String::new(),
            }),
        }
    }
}
