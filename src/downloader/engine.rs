use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::app::Result;
use crate::domain::{CreatorInfo, FileRecord};
use crate::downloader::DownloadOutcome;
use crate::fetcher::Fetcher;
use crate::store::MetadataStore;

pub const IMAGES_DIR: &str = "images";
pub const VIDEOS_DIR: &str = "videos";
pub const OTHER_DIR: &str = "other";

const PART_SUFFIX: &str = ".part";

/// Lowercased extension of the URL's path, including the dot, or "" if none.
pub fn extension_of(url: &str) -> String {
    let file = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };

    match file.rfind('.') {
        Some(idx) if idx + 1 < file.len() => file[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Subdirectory a file with `extension` is stored in
pub fn bucket_for(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" | ".png" | ".gif" => IMAGES_DIR,
        ".mp4" | ".mov" | ".avi" | ".mkv" => VIDEOS_DIR,
        _ => OTHER_DIR,
    }
}

/// Random name that keeps the original extension
pub fn unique_file_name(extension: &str) -> String {
    format!("{}{}", Uuid::new_v4().simple(), extension)
}

/// Downloads files for one creator into `<base_dir>/<bucket>/` and records
/// each one in the creator's ledger.
pub struct DownloadEngine<S> {
    base_dir: PathBuf,
    creator: CreatorInfo,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    store: Arc<S>,
}

impl<S: MetadataStore + Send + Sync> DownloadEngine<S> {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        creator: CreatorInfo,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<S>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            creator,
            fetcher,
            store,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn creator(&self) -> &CreatorInfo {
        &self.creator
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn ensure_dirs(&self, bucket: &str) -> Result<PathBuf> {
        for dir in [IMAGES_DIR, VIDEOS_DIR] {
            fs::create_dir_all(self.base_dir.join(dir)).await?;
        }
        let dir = self.base_dir.join(bucket);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Download `url` unless the ledger already has it.
    ///
    /// Returns the final path, or `None` when the URL was already recorded
    /// (in which case nothing is fetched).
    pub async fn download_url(
        &self,
        url: &str,
        description: &str,
        published: DateTime<Utc>,
    ) -> Result<Option<PathBuf>> {
        let extension = extension_of(url);
        let dir = self.ensure_dirs(bucket_for(&extension)).await?;

        if self.store.exists(url)? {
            return Ok(None);
        }

        let file_name = unique_file_name(&extension);
        let part_path = dir.join(format!("{}{}", file_name, PART_SUFFIX));

        if let Err(e) = self.fetcher.download(url, &part_path).await {
            let _ = fs::remove_file(&part_path).await;
            return Err(e);
        }

        let file_path = dir.join(&file_name);
        if let Err(e) = fs::rename(&part_path, &file_path).await {
            let _ = fs::remove_file(&part_path).await;
            return Err(e.into());
        }

        let size = fs::metadata(&file_path).await?.len();
        let record = FileRecord {
            file_name,
            size,
            description: description.to_string(),
            download_url: url.to_string(),
            published,
        };

        match self.store.append_if_absent(&record, &self.creator) {
            Ok(true) => Ok(Some(file_path)),
            Ok(false) => {
                debug!("{} was recorded by another worker, dropping duplicate", url);
                let _ = fs::remove_file(&file_path).await;
                Ok(None)
            }
            Err(e) => {
                let _ = fs::remove_file(&file_path).await;
                Err(e)
            }
        }
    }

    pub async fn download(&self, url: &str, description: &str, published: DateTime<Utc>) -> DownloadOutcome {
        match self.download_url(url, description, published).await {
            Ok(Some(path)) => DownloadOutcome::Downloaded(path),
            Ok(None) => DownloadOutcome::AlreadyExists,
            Err(e) => DownloadOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::io::AsyncWriteExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::app::PartyError;
    use crate::fetcher::{FetchResult, HttpFetcher};
    use crate::store::JsonStore;

    fn creator() -> CreatorInfo {
        CreatorInfo::new("alice", "onlyfans", "https://onlyfans.com/alice", 1)
    }

    fn published() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 6, 7, 8, 9).unwrap()
    }

    fn engine(dir: &Path, fetcher: Arc<dyn Fetcher + Send + Sync>) -> DownloadEngine<JsonStore> {
        DownloadEngine::new(dir, creator(), fetcher, Arc::new(JsonStore::in_dir(dir)))
    }

    fn files_in(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Writes some bytes, then fails as if the connection dropped
    struct BrokenTransfer;

    #[async_trait]
    impl Fetcher for BrokenTransfer {
        async fn fetch(&self, _url: &str) -> Result<FetchResult> {
            unreachable!("engine never fetches pages")
        }

        async fn download(&self, _url: &str, dest: &Path) -> Result<u64> {
            let mut file = fs::File::create(dest).await?;
            file.write_all(b"half a file").await?;
            Err(PartyError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )))
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("https://n1.example.com/data/aa/x.JPG"), ".jpg");
        assert_eq!(extension_of("https://n1.example.com/data/aa/x.mp4?f=clip.zip"), ".mp4");
        assert_eq!(extension_of("https://n1.example.com/data/aa/noext"), "");
        assert_eq!(extension_of("/data/aa/y.png?f=1"), ".png");
    }

    #[test]
    fn test_bucket_for() {
        assert_eq!(bucket_for(".jpeg"), IMAGES_DIR);
        assert_eq!(bucket_for(".gif"), IMAGES_DIR);
        assert_eq!(bucket_for(".mkv"), VIDEOS_DIR);
        assert_eq!(bucket_for(".zip"), OTHER_DIR);
        assert_eq!(bucket_for(""), OTHER_DIR);
    }

    #[test]
    fn test_unique_file_name() {
        let a = unique_file_name(".jpg");
        let b = unique_file_name(".jpg");
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert_eq!(a.len(), 32 + 4);
    }

    #[tokio::test]
    async fn test_download_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/aa/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 300]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Arc::new(HttpFetcher::new().unwrap()));
        let url = format!("{}/data/aa/photo.jpg", server.uri());

        let path = engine.download_url(&url, "first post", published()).await.unwrap().unwrap();

        assert_eq!(path.parent().unwrap(), dir.path().join(IMAGES_DIR));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 300);
        assert!(dir.path().join(VIDEOS_DIR).is_dir());
        assert!(files_in(&dir.path().join(IMAGES_DIR)).iter().all(|f| !f.ends_with(PART_SUFFIX)));

        let ledger = engine.store().read().unwrap().unwrap();
        assert_eq!(ledger.creator, creator());
        assert_eq!(ledger.files.len(), 1);
        let record = &ledger.files[0];
        assert_eq!(record.download_url, url);
        assert_eq!(record.size, 300);
        assert_eq!(record.description, "first post");
        assert_eq!(record.published, published());
        assert_eq!(path.file_name().unwrap().to_string_lossy(), record.file_name);
    }

    #[tokio::test]
    async fn test_redirected_file_is_recorded_under_its_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/a.jpg"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/cdn/n3/a.jpg"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdn/n3/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![5u8; 10]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Arc::new(HttpFetcher::new().unwrap()));
        let url = format!("{}/data/a.jpg", server.uri());

        let path = engine.download_url(&url, "", published()).await.unwrap().unwrap();

        assert_eq!(path.parent().unwrap(), dir.path().join(IMAGES_DIR));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 10);
        let ledger = engine.store().read().unwrap().unwrap();
        assert_eq!(ledger.files[0].download_url, url);
        assert_eq!(ledger.files[0].size, 10);
    }

    #[tokio::test]
    async fn test_unknown_extension_goes_to_other() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Arc::new(HttpFetcher::new().unwrap()));

        let path = engine
            .download_url(&format!("{}/data/pack.zip", server.uri()), "", published())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(path.parent().unwrap(), dir.path().join(OTHER_DIR));
    }

    #[tokio::test]
    async fn test_already_recorded_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10]))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/data/photo.jpg", server.uri());
        let store = JsonStore::in_dir(dir.path());
        store
            .append(
                &FileRecord {
                    file_name: "old.jpg".into(),
                    size: 10,
                    description: String::new(),
                    download_url: url.clone(),
                    published: published(),
                },
                &creator(),
            )
            .unwrap();

        let engine = engine(dir.path(), Arc::new(HttpFetcher::new().unwrap()));
        assert!(matches!(
            engine.download(&url, "", published()).await,
            DownloadOutcome::AlreadyExists
        ));
        assert!(files_in(&dir.path().join(IMAGES_DIR)).is_empty());
    }

    #[tokio::test]
    async fn test_failed_status_leaves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Arc::new(HttpFetcher::new().unwrap()));

        let outcome = engine
            .download(&format!("{}/data/clip.mp4", server.uri()), "", published())
            .await;

        assert!(matches!(
            outcome,
            DownloadOutcome::Failed(PartyError::UnsupportedStatus { status: 500, .. })
        ));
        assert!(files_in(&dir.path().join(VIDEOS_DIR)).is_empty());
        assert!(engine.store().read().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_broken_transfer_never_reaches_final_name() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Arc::new(BrokenTransfer));

        let err = engine
            .download_url("https://files.example.com/data/photo.jpg", "", published())
            .await
            .unwrap_err();

        assert!(matches!(err, PartyError::Io(_)));
        let leftovers = files_in(&dir.path().join(IMAGES_DIR));
        assert!(leftovers.iter().all(|f| f.ends_with(PART_SUFFIX)));
        assert!(engine.store().read().unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_downloads_of_one_url_record_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 64]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine(dir.path(), Arc::new(HttpFetcher::new().unwrap())));
        let url = format!("{}/data/same.png", server.uri());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                let url = url.clone();
                tokio::spawn(async move { engine.download(&url, "", published()).await })
            })
            .collect();

        let mut downloaded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                DownloadOutcome::Downloaded(_) => downloaded += 1,
                DownloadOutcome::AlreadyExists => {}
                DownloadOutcome::Failed(e) => panic!("download failed: {}", e),
            }
        }

        assert_eq!(downloaded, 1);
        let ledger = engine.store().read().unwrap().unwrap();
        assert_eq!(ledger.files.len(), 1);
        assert_eq!(files_in(&dir.path().join(IMAGES_DIR)).len(), 1);
    }
}
