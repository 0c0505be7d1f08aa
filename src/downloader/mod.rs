pub mod batch;
pub mod engine;

use std::path::PathBuf;

use crate::app::PartyError;

pub use batch::{BatchDownloader, BatchReport, Failure, RunSummary, DEFAULT_WORKERS};
pub use engine::DownloadEngine;

#[derive(Debug)]
pub enum DownloadOutcome {
    /// Fetched and recorded at this path
    Downloaded(PathBuf),
    /// The ledger already has this URL
    AlreadyExists,
    Failed(PartyError),
}
