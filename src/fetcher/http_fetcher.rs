use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::app::{PartyError, Result};
use crate::fetcher::{FetchResult, Fetcher};

pub const DEFAULT_USER_AGENT: &str = concat!("party-dl/", env!("CARGO_PKG_VERSION"));

/// Page fetches see redirects; file downloads follow them to the CDN node.
pub struct HttpFetcher {
    client: Client,
    files: Client,
}

impl HttpFetcher {
    /// Build a fetcher with no request deadline.
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_USER_AGENT, None)
    }

    /// `timeout` of `None` lets a stalled request block its worker indefinitely.
    pub fn with_options(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent, timeout, redirect::Policy::none())?,
            files: build_client(user_agent, timeout, redirect::Policy::limited(10))?,
        })
    }
}

fn build_client(user_agent: &str, timeout: Option<Duration>, policy: redirect::Policy) -> Result<Client> {
    let mut builder = Client::builder()
        .redirect(policy)
        .gzip(true)
        .brotli(true)
        .user_agent(user_agent);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            return Ok(FetchResult::Redirect {
                status: status.as_u16(),
                location,
            });
        }

        if !status.is_success() {
            return Err(PartyError::UnsupportedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(FetchResult::Content { body })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.files.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(PartyError::UnsupportedStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}
