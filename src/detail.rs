use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::Record;
use crate::error::LensError;
use crate::store::{data_dir, write_bytes_atomic};

pub const DEFAULT_ADDRESS: &str = "San Francisco, United States";
pub const MISSING_VALUE: &str = "-";
pub const PENDING_MESSAGE: &str = "Company not found or loading...";

/// The record last opened from the table, handed to the detail view.
#[derive(Debug, Clone, Default)]
pub struct SelectedRecord {
    record: Option<Record>,
}

impl SelectedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, record: Record) {
        self.record = Some(record);
    }

    pub fn current(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn clear(&mut self) {
        self.record = None;
    }

    pub fn default_path() -> Result<Utf8PathBuf, LensError> {
        Ok(data_dir()?.join("selected.json"))
    }

    pub fn persist(&self, path: &Utf8Path) -> Result<(), LensError> {
        let content = serde_json::to_vec_pretty(&self.record)
            .map_err(|err| LensError::Filesystem(err.to_string()))?;
        write_bytes_atomic(path, &content)
    }

    /// A missing or unreadable file is an empty context, not an error.
    pub fn restore(path: &Utf8Path) -> Self {
        let record = fs::read_to_string(path.as_std_path())
            .ok()
            .and_then(|content| serde_json::from_str::<Option<Record>>(&content).ok())
            .flatten();
        Self { record }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detail<'a> {
    Found(&'a Record),
    /// Nothing resolved yet; usually the list has not loaded.
    Pending,
}

/// Selected record first, then a linear lookup in the loaded list.
/// Ids compare case-insensitively.
pub fn resolve<'a>(id: &str, selected: &'a SelectedRecord, records: &'a [Record]) -> Detail<'a> {
    if let Some(record) = selected.current().filter(|record| record.id.matches(id)) {
        return Detail::Found(record);
    }
    records
        .iter()
        .find(|record| record.id.matches(id))
        .map_or(Detail::Pending, Detail::Found)
}

pub fn address(record: &Record) -> &str {
    record.address.as_deref().unwrap_or(DEFAULT_ADDRESS)
}

pub fn phone(record: &Record) -> &str {
    record.phone_number.as_deref().unwrap_or(MISSING_VALUE)
}

pub fn email(record: &Record) -> &str {
    record.email.as_deref().unwrap_or(MISSING_VALUE)
}

/// `(label, url)` for each social profile the record carries.
pub fn social_links(record: &Record) -> Vec<(&'static str, &str)> {
    [
        ("Facebook", record.social_facebook.as_deref()),
        ("Twitter", record.social_twitter.as_deref()),
        ("LinkedIn", record.social_linkedin.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, url)| url.map(|url| (label, url)))
    .collect()
}
