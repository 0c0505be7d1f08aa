use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartyError {
    #[error("Unsupported status {status} for {url}")]
    UnsupportedStatus { url: String, status: u16 },

    #[error("Page parsing error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata file {path} is corrupt: {source}")]
    LedgerCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0} is not a supported url")]
    UnsupportedSite(String),

    #[error("Stash error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PartyError>;
