//! Page parsing for creator, listing and post pages.
//!
//! Parsers are pure: they take an already fetched HTML body and return
//! structured records. Network access lives in [`crate::site`].
//!
//! ```text
//! Fetcher → body → PageParser → CreatorInfo / Vec<PostReference> / PostContent
//! ```

mod config;
mod html;

pub use config::ParserConfig;
pub use html::HtmlParser;

use crate::app::Result;
use crate::domain::{CreatorInfo, PostContent, PostReference};

pub trait PageParser: Send + Sync {
    /// Creator identity and total post count from a profile page
    fn parse_creator(&self, body: &str) -> Result<CreatorInfo>;

    /// Post links from one listing page, in page order
    fn parse_listing(&self, body: &str) -> Result<Vec<PostReference>>;

    /// Description, publish time and download links of a single post
    fn parse_post(&self, body: &str) -> Result<PostContent>;
}
