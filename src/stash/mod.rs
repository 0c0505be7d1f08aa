//! Publishes downloaded ledgers into a Stash catalog.
//!
//! Stash indexes the files itself; this only attaches titles, dates, studios and
//! performers to the scenes and images whose files match a ledger record.

pub mod client;
pub mod models;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::{CreatorInfo, FileRecord, Ledger};
use crate::store::METADATA_FILE;

pub use client::StashClient;
pub use models::{CatalogMatch, UpdateInput};

/// Studio name and homepage for a creator's service
pub fn studio_for_service(service: &str) -> Option<(&'static str, &'static str)> {
    match service {
        "onlyfans" => Some(("OnlyFans", "https://onlyfans.com")),
        "fansly" => Some(("Fansly", "https://fansly.com")),
        _ => None,
    }
}

/// `metadata.json` files exactly one directory below `content_dir`, sorted
pub fn find_ledgers(content_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut ledgers = Vec::new();
    for entry in fs::read_dir(content_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let candidate = entry.path().join(METADATA_FILE);
        if candidate.is_file() {
            ledgers.push(candidate);
        }
    }
    ledgers.sort();
    Ok(ledgers)
}

pub fn update_input(
    id: String,
    creator: &CreatorInfo,
    record: &FileRecord,
    studio_id: Option<&str>,
    performer_id: &str,
) -> UpdateInput {
    let date = record.published.format("%Y-%m-%d").to_string();
    UpdateInput {
        id,
        title: format!("{} - {}", creator.name, date),
        date,
        studio_id: studio_id.map(str::to_string),
        details: record.description.clone(),
        performer_ids: vec![performer_id.to_string()],
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub scenes: usize,
    pub images: usize,
    pub errors: usize,
}

/// Attach ledger metadata to every matching scene and image.
///
/// Studio and performer lookups abort the ledger; per-record failures are logged and
/// counted.
pub async fn publish_ledger(client: &StashClient, ledger: &Ledger) -> Result<PublishReport> {
    let creator = &ledger.creator;

    let studio_id = match studio_for_service(&creator.service) {
        Some((name, url)) => Some(client.find_or_create_studio(name, url).await?),
        None => {
            debug!("No studio for service {}", creator.service);
            None
        }
    };
    let performer_id = client
        .find_or_create_performer(&creator.name, &creator.page_link)
        .await?;

    let mut report = PublishReport::default();
    for record in &ledger.files {
        match publish_scene(client, creator, record, studio_id.as_deref(), &performer_id).await {
            Ok(updated) => report.scenes += updated as usize,
            Err(e) => {
                warn!("Failed to publish scene for {}: {}", record.file_name, e);
                report.errors += 1;
            }
        }
        match publish_image(client, creator, record, studio_id.as_deref(), &performer_id).await {
            Ok(updated) => report.images += updated as usize,
            Err(e) => {
                warn!("Failed to publish image for {}: {}", record.file_name, e);
                report.errors += 1;
            }
        }
    }

    info!(
        "Published {}: {} scenes, {} images",
        creator.name, report.scenes, report.images
    );
    Ok(report)
}

async fn publish_scene(
    client: &StashClient,
    creator: &CreatorInfo,
    record: &FileRecord,
    studio_id: Option<&str>,
    performer_id: &str,
) -> Result<bool> {
    let Some(scene) = client.find_scene(&record.file_name, record.size).await? else {
        return Ok(false);
    };
    let input = update_input(scene.id, creator, record, studio_id, performer_id);
    client.update_scene(&input).await?;
    debug!("Updated scene {} for {}", input.id, record.file_name);
    Ok(true)
}

async fn publish_image(
    client: &StashClient,
    creator: &CreatorInfo,
    record: &FileRecord,
    studio_id: Option<&str>,
    performer_id: &str,
) -> Result<bool> {
    let Some(image) = client.find_image(&record.file_name, record.size).await? else {
        return Ok(false);
    };
    let input = update_input(image.id, creator, record, studio_id, performer_id);
    client.update_image(&input).await?;
    debug!("Updated image {} for {}", input.id, record.file_name);
    Ok(true)
}
