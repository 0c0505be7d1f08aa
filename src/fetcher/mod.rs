pub mod http_fetcher;

use std::path::Path;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[derive(Debug)]
pub enum FetchResult {
    /// Page served successfully
    Content { body: String },
    /// Site answered with a 3xx instead of the page
    Redirect { status: u16, location: Option<String> },
}

#[async_trait]
pub trait Fetcher {
    /// Fetch a page without following redirects.
    ///
    /// Statuses other than 2xx and 3xx are returned as
    /// [`PartyError::UnsupportedStatus`](crate::app::PartyError::UnsupportedStatus).
    async fn fetch(&self, url: &str) -> Result<FetchResult>;

    /// Stream the resource at `url` into `dest`, returning the number of bytes written.
    ///
    /// On error `dest` may hold a partial body; cleaning it up is the caller's job.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}
