//! Ingest control HTTP client
//!
//! Talks to the control endpoint of nginx-rtmp style media servers:
//! `GET {scheme}://{region}.{base_domain}/control/drop/publisher?app=live&name=...`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};
use url::Url;

use super::IngestControl;
use crate::{config::ControlConfig, models::Region, Error, Result};

/// Longest response body kept in a `ControlRejected` error
const MAX_ERROR_BODY: usize = 512;

/// Ingest control client backed by `reqwest`
///
/// Redirects are not followed: a 3xx answer already counts as success.
#[derive(Debug, Clone)]
pub struct HttpIngestControl {
    config: ControlConfig,
    client: Client,
}

impl HttpIngestControl {
    pub fn new(config: ControlConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build control HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Drop endpoint of the ingest server serving `region`
    pub fn endpoint(&self, region: &Region) -> Result<Url> {
        let raw = match &self.config.endpoint_override {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), self.config.drop_path),
            None => format!(
                "{}://{}.{}{}",
                self.config.scheme, region, self.config.base_domain, self.config.drop_path
            ),
        };

        Url::parse(&raw)
            .map_err(|e| Error::Internal(format!("Invalid control endpoint {raw:?}: {e}")))
    }
}

#[async_trait]
impl IngestControl for HttpIngestControl {
    async fn drop_publisher(&self, region: &Region, stream_name: &str) -> Result<()> {
        let url = self.endpoint(region)?;
        debug!(region = %region, stream = %stream_name, url = %url, "Sending drop command");

        let response = self
            .client
            .get(url.clone())
            .query(&[("app", self.config.app.as_str()), ("name", stream_name)])
            .send()
            .await
            .map_err(|e| {
                error!(region = %region, stream = %stream_name, "Control request failed: {}", e);
                if e.is_timeout() {
                    Error::ControlUnreachable(format!(
                        "{url} did not answer within {}s",
                        self.config.timeout_seconds
                    ))
                } else {
                    Error::ControlUnreachable(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            error!(
                region = %region,
                stream = %stream_name,
                status = status.as_u16(),
                "Ingest server rejected drop command"
            );
            return Err(Error::ControlRejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            region = %region,
            stream = %stream_name,
            status = status.as_u16(),
            "Ingest server dropped publisher"
        );
        Ok(())
    }
}
