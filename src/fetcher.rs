//! Conditional retrieval of declaration files from the upstream repository

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;
use crate::typings::TrackedFile;

/// Outcome of one conditional fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server confirmed the cached copy is current
    Unchanged,
    /// Fresh content, with the validator to send next time if the server gave one
    Updated {
        content: String,
        etag: Option<String>,
    },
    Failed(FetchError),
}

/// Source of remote typings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, file: TrackedFile, etag: Option<String>) -> FetchOutcome;
}

/// Fetches typings over HTTP, using `If-None-Match` when a validator is known
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sciter-typings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, file: TrackedFile, etag: Option<String>) -> FetchOutcome {
        let url = file.url(&self.base_url);

        let mut request = self.client.get(&url);
        if let Some(etag) = &etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return FetchOutcome::Failed(FetchError::Request { url, source }),
        };

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            debug!("{} not modified", file);
            return FetchOutcome::Unchanged;
        }

        if !status.is_success() {
            return FetchOutcome::Failed(FetchError::Status { url, status });
        }

        let new_etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match response.text().await {
            Ok(content) => {
                debug!("Fetched {} ({} bytes)", file, content.len());
                FetchOutcome::Updated {
                    content,
                    etag: new_etag,
                }
            }
            Err(source) => FetchOutcome::Failed(FetchError::Body { url, source }),
        }
    }
}
