use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::{AppContext, PartyError, Result};
use crate::downloader::{BatchDownloader, DownloadEngine};
use crate::site::is_supported_url;
use crate::stash::{find_ledgers, publish_ledger, StashClient};
use crate::store::{read_ledger, JsonStore};

pub async fn download(
    ctx: &AppContext,
    url: &str,
    base_location: Option<PathBuf>,
    threads: Option<usize>,
) -> Result<()> {
    if !is_supported_url(url, &ctx.config.site.supported_urls) {
        error!("{}", PartyError::UnsupportedSite(url.to_string()));
        return Ok(());
    }

    let creator = ctx.site.creator_info(url).await?;
    info!(
        "Creator: {} ({}), {} posts, {}",
        creator.name, creator.service, creator.posts, creator.page_link
    );

    let base_location = base_location.unwrap_or_else(|| ctx.config.download.base_location.clone());
    let workers = threads.unwrap_or(ctx.config.download.workers);
    let creator_dir = base_location.join(creator.dir_name());

    let store = Arc::new(JsonStore::in_dir(&creator_dir));
    let engine = Arc::new(DownloadEngine::new(
        creator_dir,
        creator,
        ctx.fetcher.clone(),
        store,
    ));
    let downloader = BatchDownloader::with_workers(ctx.site.clone(), engine, workers);

    let summary = downloader.run(url).await?;

    info!(
        "{} posts: {} downloaded, {} already present, {} failed after retry",
        summary.posts,
        summary.downloaded(),
        summary.already_present(),
        summary.unrecovered().len()
    );
    for failure in summary.unrecovered() {
        warn!("Gave up on {}", failure.url());
    }
    info!("Done.");

    Ok(())
}

pub async fn stash(ctx: &AppContext, stash_host: Option<String>, content: &Path) -> Result<()> {
    let host = stash_host
        .or_else(|| ctx.config.stash.host.clone())
        .ok_or_else(|| PartyError::Config("no Stash host given; pass --stash-host or set [stash] host".into()))?;

    let client = StashClient::new(&host)?;
    let ledgers = find_ledgers(content)?;

    if ledgers.is_empty() {
        info!("No ledgers found under {}", content.display());
        return Ok(());
    }

    for path in ledgers {
        info!("Publishing {}", path.display());
        let ledger = match read_ledger(&path) {
            Ok(ledger) => ledger,
            Err(e) => {
                error!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if let Err(e) = publish_ledger(&client, &ledger).await {
            error!("Failed to publish {}: {}", ledger.creator.name, e);
        }
    }

    info!("Done.");
    Ok(())
}
