use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use url::Url;

use crate::app::{EstuaryError, Result};
use crate::fetcher::{ChunkStream, PageFetcher};

/// Request timeout when the caller does not supply one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a fetcher with a caller-supplied request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("estuary/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn open(&self, url: &str) -> Result<ChunkStream> {
        // Reject malformed URLs with a typed error before going on the wire.
        Url::parse(url)?;

        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;

        let stream = response
            .bytes_stream()
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(bytes.to_vec()),
                Err(e) => Err(EstuaryError::from(e)),
            })
            .boxed();

        Ok(stream)
    }
}
