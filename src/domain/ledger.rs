use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CreatorInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub size: u64,
    pub description: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    pub published: DateTime<Utc>,
}

/// Contents of a creator's `metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub creator: CreatorInfo,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

impl Ledger {
    pub fn new(creator: CreatorInfo) -> Self {
        Self {
            creator,
            files: Vec::new(),
        }
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.files.iter().any(|f| f.download_url == url)
    }
}
