use chrono::{DateTime, Utc};

/// A post link as it appears on a listing page (site-relative)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub url: String,
}

impl PostReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone)]
pub struct PostContent {
    pub download_urls: Vec<String>,
    pub description: String,
    pub published: DateTime<Utc>,
}

/// One page of a creator's post listing
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub posts: Vec<PostReference>,
    /// The site redirected instead of serving the page
    pub is_last: bool,
}

impl ListingPage {
    pub fn last() -> Self {
        Self {
            posts: Vec::new(),
            is_last: true,
        }
    }
}
