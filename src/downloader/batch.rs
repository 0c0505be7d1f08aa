use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::app::Result;
use crate::domain::PostReference;
use crate::downloader::{DownloadEngine, DownloadOutcome};
use crate::site::SiteClient;
use crate::store::MetadataStore;

pub const DEFAULT_WORKERS: usize = 3;

/// Work that failed during a pass and is eligible for one retry
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The post page itself could not be fetched or parsed
    Post { post: PostReference },
    /// A single file of an otherwise fetched post
    File {
        url: String,
        description: String,
        published: DateTime<Utc>,
    },
}

impl Failure {
    pub fn url(&self) -> &str {
        match self {
            Failure::Post { post } => &post.url,
            Failure::File { url, .. } => url,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub downloaded: usize,
    pub already_present: usize,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    fn merge(&mut self, other: BatchReport) {
        self.downloaded += other.downloaded;
        self.already_present += other.already_present;
        self.failures.extend(other.failures);
    }

    /// Count and log one outcome; returns true if it failed.
    fn record(&mut self, url: &str, outcome: DownloadOutcome) -> bool {
        match outcome {
            DownloadOutcome::Downloaded(path) => {
                info!("Downloaded {} to {}", url, path.display());
                self.downloaded += 1;
                false
            }
            DownloadOutcome::AlreadyExists => {
                info!("{} has already been downloaded", url);
                self.already_present += 1;
                false
            }
            DownloadOutcome::Failed(e) => {
                error!("Failed to download {}: {}", url, e);
                true
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub posts: usize,
    pub first_pass: BatchReport,
    pub retry: BatchReport,
}

impl RunSummary {
    pub fn downloaded(&self) -> usize {
        self.first_pass.downloaded + self.retry.downloaded
    }

    pub fn already_present(&self) -> usize {
        self.first_pass.already_present + self.retry.already_present
    }

    /// Items still failing after the retry pass
    pub fn unrecovered(&self) -> &[Failure] {
        &self.retry.failures
    }
}

/// Discovers every post of a creator and downloads them on a bounded pool.
pub struct BatchDownloader<S> {
    site: SiteClient,
    engine: Arc<DownloadEngine<S>>,
    semaphore: Arc<Semaphore>,
}

impl<S: MetadataStore + Send + Sync + 'static> BatchDownloader<S> {
    pub fn new(site: SiteClient, engine: Arc<DownloadEngine<S>>) -> Self {
        Self::with_workers(site, engine, DEFAULT_WORKERS)
    }

    pub fn with_workers(site: SiteClient, engine: Arc<DownloadEngine<S>>, workers: usize) -> Self {
        Self {
            site,
            engine,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn run(&self, profile_url: &str) -> Result<RunSummary> {
        let posts = self.discover(profile_url).await?;
        let total = posts.len();

        let first_pass = self.download_posts(profile_url, posts).await;
        let retry = self.retry_failed(profile_url, first_pass.failures.clone()).await;

        Ok(RunSummary {
            posts: total,
            first_pass,
            retry,
        })
    }

    /// Walk the listing page by page until the site signals the end.
    ///
    /// Any error aborts discovery; no partial listing is returned.
    pub async fn discover(&self, profile_url: &str) -> Result<Vec<PostReference>> {
        let mut posts = Vec::new();
        let mut page_index = 0;

        loop {
            info!("Scraping page {}", page_index + 1);
            let page = self.site.listing_page(profile_url, page_index).await?;
            if page.is_last {
                info!("Page {} doesn't exist. Finished scraping.", page_index + 1);
                break;
            }
            posts.extend(page.posts);
            page_index += 1;
        }

        info!("Total scraped posts: {}", posts.len());
        Ok(posts)
    }

    /// Download every post concurrently, at most `workers` at a time.
    ///
    /// Failures never abort sibling posts; they are collected once the pool drains.
    pub async fn download_posts(&self, profile_url: &str, posts: Vec<PostReference>) -> BatchReport {
        let mut handles = Vec::with_capacity(posts.len());

        for post in posts {
            let queued = post.clone();
            let site = self.site.clone();
            let engine = self.engine.clone();
            let semaphore = self.semaphore.clone();
            let profile_url = profile_url.to_string();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    error!("Worker pool closed before {} was processed", post.url);
                    return BatchReport {
                        failures: vec![Failure::Post { post }],
                        ..BatchReport::default()
                    };
                };

                download_post(&site, &engine, &profile_url, post).await
            });

            handles.push((queued, handle));
        }

        let mut report = BatchReport::default();
        for (post, handle) in handles {
            match handle.await {
                Ok(post_report) => report.merge(post_report),
                Err(e) => {
                    error!("Task for {} failed to complete: {}", post.url, e);
                    report.failures.push(Failure::Post { post });
                }
            }
        }

        report
    }

    /// Re-attempt each failure once, sequentially. What fails again is only reported.
    pub async fn retry_failed(&self, profile_url: &str, failures: Vec<Failure>) -> BatchReport {
        info!("Retrying {} failed downloads", failures.len());

        let mut report = BatchReport::default();
        for failure in failures {
            match failure {
                Failure::Post { post } => {
                    report.merge(download_post(&self.site, &self.engine, profile_url, post).await);
                }
                Failure::File {
                    url,
                    description,
                    published,
                } => {
                    let outcome = self.engine.download(&url, &description, published).await;
                    if report.record(&url, outcome) {
                        report.failures.push(Failure::File {
                            url,
                            description,
                            published,
                        });
                    }
                }
            }
        }

        report
    }
}

/// Fetch one post and download its files in order.
async fn download_post<S: MetadataStore + Send + Sync>(
    site: &SiteClient,
    engine: &DownloadEngine<S>,
    profile_url: &str,
    post: PostReference,
) -> BatchReport {
    let mut report = BatchReport::default();

    let content = match site.post_content(profile_url, &post).await {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to fetch post {}: {}", post.url, e);
            report.failures.push(Failure::Post { post });
            return report;
        }
    };

    for url in content.download_urls {
        let outcome = engine
            .download(&url, &content.description, content.published)
            .await;
        if report.record(&url, outcome) {
            report.failures.push(Failure::File {
                url,
                description: content.description.clone(),
                published: content.published,
            });
        }
    }

    report
}
