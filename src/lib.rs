//! # party-dl
//!
//! Downloads every post of a creator from a coomer-style site and keeps a
//! per-creator JSON ledger so repeated runs only fetch what is new.
//!
//! ## Architecture
//!
//! ```text
//! SiteClient → BatchDownloader → DownloadEngine → JsonStore
//! ```
//!
//! - [`site`]: profile, listing and post pages
//! - [`downloader`]: bounded worker pool, retry pass, atomic file promotion
//! - [`store`]: `metadata.json` ledger
//! - [`stash`]: optional publishing of ledgers into a Stash catalog
//!
//! ## Quick Start
//!
//! ```bash
//! # Download a creator into ./alice/
//! party-dl download https://coomer.su/onlyfans/user/alice
//!
//! # Eight posts at a time, into another directory
//! party-dl d https://coomer.su/onlyfans/user/alice -b /data -t 8
//!
//! # Publish every ledger under /data to Stash
//! party-dl stash --stash-host http://localhost:9999 -c /data
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, fetcher and
/// site client.
pub mod app;

/// Command-line interface using clap.
///
/// - `download <url>` (alias `d`) - Download a creator
/// - `stash -c <dir>` (alias `s`) - Publish ledgers to Stash
pub mod cli;

/// Configuration loaded from `~/.config/party-dl/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`CreatorInfo`](domain::CreatorInfo): Creator identity
/// - [`FileRecord`](domain::FileRecord): One downloaded file
/// - [`Ledger`](domain::Ledger): Per-creator download history
pub mod domain;

/// Post and file downloading.
pub mod downloader;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page and file fetches
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// HTML extraction with configurable CSS selectors.
pub mod parser;

pub mod site;

/// Stash GraphQL publisher.
pub mod stash;

/// Ledger persistence.
pub mod store;
