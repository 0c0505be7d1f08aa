//! Creator, listing and post fetches against a supported site.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::app::{PartyError, Result};
use crate::domain::{CreatorInfo, ListingPage, PostContent, PostReference};
use crate::fetcher::{FetchResult, Fetcher};
use crate::parser::PageParser;

/// Number of posts the site serves per listing page
pub const PAGE_SIZE: usize = 50;

pub const DEFAULT_SUPPORTED_URLS: &[&str] = &["https://coomer.su"];

/// Prefix match of `url` against the allowlist
pub fn is_supported_url<S: AsRef<str>>(url: &str, supported: &[S]) -> bool {
    supported.iter().any(|prefix| url.starts_with(prefix.as_ref()))
}

/// Listing URL for `page_index`, offset by whole pages
pub fn listing_url(profile_url: &str, page_index: usize) -> String {
    format!("{}?o={}", profile_url, page_index * PAGE_SIZE)
}

#[derive(Clone)]
pub struct SiteClient {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    parser: Arc<dyn PageParser>,
}

impl SiteClient {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, parser: Arc<dyn PageParser>) -> Self {
        Self { fetcher, parser }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        match self.fetcher.fetch(url).await? {
            FetchResult::Content { body } => Ok(body),
            FetchResult::Redirect { status, location } => {
                debug!("{} redirected to {:?}", url, location);
                Err(PartyError::UnsupportedStatus {
                    url: url.to_string(),
                    status,
                })
            }
        }
    }

    pub async fn creator_info(&self, profile_url: &str) -> Result<CreatorInfo> {
        let body = self.fetch_page(profile_url).await?;
        self.parser.parse_creator(&body)
    }

    /// Fetch one listing page.
    ///
    /// A redirect means the page is past the end of the listing and is reported
    /// as [`ListingPage::last`], not as an error.
    pub async fn listing_page(&self, profile_url: &str, page_index: usize) -> Result<ListingPage> {
        let url = listing_url(profile_url, page_index);

        match self.fetcher.fetch(&url).await? {
            FetchResult::Redirect { .. } => Ok(ListingPage::last()),
            FetchResult::Content { body } => Ok(ListingPage {
                posts: self.parser.parse_listing(&body)?,
                is_last: false,
            }),
        }
    }

    /// Fetch a post by its listing link, resolved against the site's origin.
    pub async fn post_content(&self, profile_url: &str, post: &PostReference) -> Result<PostContent> {
        let url = post_url(profile_url, &post.url)?;
        let body = self.fetch_page(url.as_str()).await?;
        self.parser.parse_post(&body)
    }
}

/// Resolve a site-relative post link against the profile URL's origin.
pub fn post_url(profile_url: &str, post: &str) -> Result<Url> {
    let base = Url::parse(profile_url)?;
    Ok(base.join(post)?)
}
