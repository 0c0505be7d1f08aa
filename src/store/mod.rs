pub mod json;

use crate::app::Result;
use crate::domain::{CreatorInfo, FileRecord, Ledger};

pub use json::{append_record, read_ledger, url_exists, JsonStore, METADATA_FILE};

pub trait MetadataStore {
    fn exists(&self, url: &str) -> Result<bool>;
    fn append(&self, record: &FileRecord, creator: &CreatorInfo) -> Result<()>;
    /// Check and append as one critical section; returns false if the URL was
    /// already recorded and nothing was written.
    fn append_if_absent(&self, record: &FileRecord, creator: &CreatorInfo) -> Result<bool>;
    fn read(&self) -> Result<Option<Ledger>>;
}
