use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorInfo {
    pub name: String,
    pub service: String,
    #[serde(rename = "pageLink")]
    pub page_link: String,
    /// Total post count reported by the paginator at scrape time
    #[serde(default)]
    pub posts: u32,
}

impl CreatorInfo {
    pub fn new(name: &str, service: impl Into<String>, page_link: impl Into<String>, posts: u32) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            service: service.into(),
            page_link: page_link.into(),
            posts,
        }
    }

    /// Directory segment the creator's files are stored under.
    ///
    /// Always a single normal path component: separators and control characters
    /// become `_`; empty or all-dot names are replaced so they cannot climb out.
    pub fn dir_name(&self) -> String {
        let segment: String = self
            .name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        if segment.is_empty() {
            "_".to_string()
        } else if segment.chars().all(|c| c == '.') {
            segment.replace('.', "_")
        } else {
            segment
        }
    }
}

/// Service identifier for a creator's canonical profile link
pub fn service_from_link(link: &str) -> &'static str {
    if link.starts_with("https://onlyfans.com") {
        "onlyfans"
    } else if link.starts_with("https://fansly.com") {
        "fansly"
    } else {
        "unknown"
    }
}
