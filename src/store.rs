use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::domain::{NewRecord, Record, RecordId};
use crate::error::LensError;

/// Persistence seam for metadata records.
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: NewRecord) -> Result<Record, LensError>;
    /// All records, newest `created_at` first.
    fn list_recent(&self) -> Result<Vec<Record>, LensError>;
    /// Removes every record whose id is in `ids`; returns how many went away.
    fn delete(&self, ids: &[RecordId]) -> Result<usize, LensError>;
}

pub fn data_dir() -> Result<Utf8PathBuf, LensError> {
    BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.data_dir().join("company-lens")).ok())
        .ok_or_else(|| LensError::Filesystem("unable to resolve data directory".to_string()))
}

pub fn default_store_path() -> Result<Utf8PathBuf, LensError> {
    Ok(data_dir()?.join("records.json"))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    records: Vec<Record>,
}

/// Single JSON document holding every record in insertion order.
#[derive(Debug)]
pub struct FileStore {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFile, LensError> {
        if !self.path.as_std_path().exists() {
            return Ok(StoreFile::default());
        }
        let content = fs::read_to_string(self.path.as_std_path())
            .map_err(|err| LensError::Filesystem(err.to_string()))?;
        if content.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        serde_json::from_str(&content)
            .map_err(|err| LensError::StoreCorrupt(format!("{}: {err}", self.path)))
    }

    fn write(&self, file: &StoreFile) -> Result<(), LensError> {
        let content = serde_json::to_vec_pretty(file)
            .map_err(|err| LensError::Filesystem(err.to_string()))?;
        write_bytes_atomic(&self.path, &content)
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T, LensError>) -> Result<T, LensError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| LensError::Filesystem("record store lock poisoned".to_string()))?;
        f()
    }
}

impl RecordStore for FileStore {
    fn insert(&self, record: NewRecord) -> Result<Record, LensError> {
        self.with_lock(|| {
            let mut file = self.read()?;
            let record = Record::from_new(RecordId::generate(), record, Utc::now());
            file.records.push(record.clone());
            self.write(&file)?;
            tracing::info!(id = %record.id, url = %record.url, "record inserted");
            Ok(record)
        })
    }

    fn list_recent(&self) -> Result<Vec<Record>, LensError> {
        self.with_lock(|| {
            let mut records = self.read()?.records;
            // Reverse first so equal timestamps keep newest-inserted on top.
            records.reverse();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(records)
        })
    }

    fn delete(&self, ids: &[RecordId]) -> Result<usize, LensError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_lock(|| {
            let mut file = self.read()?;
            let doomed = ids.iter().collect::<HashSet<_>>();
            let before = file.records.len();
            file.records.retain(|record| !doomed.contains(&record.id));
            let removed = before - file.records.len();
            if removed > 0 {
                self.write(&file)?;
            }
            tracing::info!(requested = ids.len(), removed, "records deleted");
            Ok(removed)
        })
    }
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), LensError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| LensError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix("company-lens")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| LensError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| LensError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| LensError::Filesystem(err.to_string()))?;
    Ok(())
}
