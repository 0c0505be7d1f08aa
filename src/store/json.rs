use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::app::{PartyError, Result};
use crate::domain::{CreatorInfo, FileRecord, Ledger};
use crate::store::MetadataStore;

pub const METADATA_FILE: &str = "metadata.json";

/// Check whether `url` has a record in the ledger at `path`.
///
/// A missing ledger file is not an error: nothing has been downloaded yet.
pub fn url_exists(path: &Path, url: &str) -> Result<bool> {
    match read_ledger(path) {
        Ok(ledger) => Ok(ledger.contains_url(url)),
        Err(PartyError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn read_ledger(path: &Path) -> Result<Ledger> {
    let content = fs::read_to_string(path)?;
    decode(path, &content)
}

/// Append `record` with a whole-file read-modify-write.
///
/// Not safe against concurrent writers on its own; callers go through
/// [`JsonStore`] which serializes access.
pub fn append_record(path: &Path, record: &FileRecord, creator: &CreatorInfo) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let mut ledger = if content.trim().is_empty() {
        Ledger::new(creator.clone())
    } else {
        decode(path, &content)?
    };

    ledger.creator = creator.clone();
    ledger.files.push(record.clone());

    rewrite(&mut file, path, &ledger)
}

fn decode(path: &Path, content: &str) -> Result<Ledger> {
    serde_json::from_str(content).map_err(|source| PartyError::LedgerCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn rewrite(file: &mut File, path: &Path, ledger: &Ledger) -> Result<()> {
    let encoded = serde_json::to_vec_pretty(ledger).map_err(|source| PartyError::LedgerCorrupt {
        path: path.to_path_buf(),
        source,
    })?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&encoded)?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

/// Ledger file for one creator directory, guarded by a lock so that
/// read-modify-write cycles never interleave.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<dir>/metadata.json`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(METADATA_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is (), so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetadataStore for JsonStore {
    fn exists(&self, url: &str) -> Result<bool> {
        let _guard = self.guard();
        url_exists(&self.path, url)
    }

    fn append(&self, record: &FileRecord, creator: &CreatorInfo) -> Result<()> {
        let _guard = self.guard();
        append_record(&self.path, record, creator)
    }

    fn append_if_absent(&self, record: &FileRecord, creator: &CreatorInfo) -> Result<bool> {
        let _guard = self.guard();
        if url_exists(&self.path, &record.download_url)? {
            return Ok(false);
        }
        append_record(&self.path, record, creator)?;
        Ok(true)
    }

    fn read(&self) -> Result<Option<Ledger>> {
        let _guard = self.guard();
        match read_ledger(&self.path) {
            Ok(ledger) => Ok(Some(ledger)),
            Err(PartyError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn creator() -> CreatorInfo {
        CreatorInfo::new("alice", "onlyfans", "https://onlyfans.com/alice", 2)
    }

    fn record(url: &str) -> FileRecord {
        FileRecord {
            file_name: "3f2a.jpg".into(),
            size: 42,
            description: "a post".into(),
            download_url: url.into(),
            published: Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_exists_without_ledger_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);
        assert!(!url_exists(&path, "https://example.com/a.jpg").unwrap());
    }

    #[test]
    fn test_append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);

        append_record(&path, &record("https://example.com/a.jpg"), &creator()).unwrap();
        append_record(&path, &record("https://example.com/b.jpg"), &creator()).unwrap();

        let ledger = read_ledger(&path).unwrap();
        assert_eq!(ledger.creator, creator());
        assert_eq!(ledger.files.len(), 2);
        assert_eq!(ledger.files[0].download_url, "https://example.com/a.jpg");
        assert_eq!(ledger.files[1].download_url, "https://example.com/b.jpg");
        assert!(url_exists(&path, "https://example.com/b.jpg").unwrap());
    }

    #[test]
    fn test_append_overwrites_creator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);

        append_record(&path, &record("https://example.com/a.jpg"), &creator()).unwrap();
        let renamed = CreatorInfo::new("alice", "fansly", "https://fansly.com/alice", 9);
        append_record(&path, &record("https://example.com/b.jpg"), &renamed).unwrap();

        let ledger = read_ledger(&path).unwrap();
        assert_eq!(ledger.creator, renamed);
    }

    #[test]
    fn test_shrinking_rewrite_leaves_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);

        let mut long = record("https://example.com/a.jpg");
        long.description = "x".repeat(500);
        append_record(&path, &long, &creator()).unwrap();

        let short_creator = CreatorInfo::new("al", "x", "y", 0);
        append_record(&path, &record("https://example.com/b.jpg"), &short_creator).unwrap();

        assert_eq!(read_ledger(&path).unwrap().files.len(), 2);
    }

    #[test]
    fn test_corrupt_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);
        fs::write(&path, "{not json").unwrap();

        let err = url_exists(&path, "https://example.com/a.jpg").unwrap_err();
        assert!(matches!(err, PartyError::LedgerCorrupt { .. }));

        let err = append_record(&path, &record("https://example.com/a.jpg"), &creator()).unwrap_err();
        assert!(matches!(err, PartyError::LedgerCorrupt { .. }));
    }

    #[test]
    fn test_store_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(dir.path());
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_append_if_absent_skips_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(dir.path());

        assert!(store.append_if_absent(&record("https://example.com/a.jpg"), &creator()).unwrap());
        assert!(!store.append_if_absent(&record("https://example.com/a.jpg"), &creator()).unwrap());

        assert_eq!(store.read().unwrap().unwrap().files.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_keep_one_record_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::in_dir(dir.path()));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let url = format!("https://example.com/{}.jpg", i % 4);
                    store.append_if_absent(&record(&url), &creator()).unwrap()
                })
            })
            .collect();

        let written = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|w| *w)
            .count();
        assert_eq!(written, 4);

        let ledger = store.read().unwrap().unwrap();
        assert_eq!(ledger.files.len(), 4);
        for i in 0..4 {
            let url = format!("https://example.com/{}.jpg", i);
            assert_eq!(ledger.files.iter().filter(|f| f.download_url == url).count(), 1);
        }
    }
}
