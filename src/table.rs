use std::time::{Duration, Instant};

use camino::Utf8Path;

use crate::api::MetadataApi;
use crate::csv::to_csv;
use crate::domain::{Record, RecordId, SiteUrl};
use crate::error::LensError;
use crate::selection::SelectionSet;
use crate::store::write_bytes_atomic;

pub const NOTICE_TTL: Duration = Duration::from_secs(3);
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid domain URL.";
pub const ADDED_MESSAGE: &str = "Company metadata successfully added.";
pub const ADD_FAILED_MESSAGE: &str = "Could not fetch company metadata.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete records.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-facing message that disappears after [`NOTICE_TTL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    fn new(kind: NoticeKind, message: &str, now: Instant) -> Self {
        Self {
            kind,
            message: message.to_string(),
            expires_at: now + NOTICE_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Client-side record table: full list in memory, a page window over it,
/// a selection set for bulk deletes, and the URL input box.
pub struct TableView<A: MetadataApi> {
    api: A,
    records: Vec<Record>,
    offset: usize,
    page_size: usize,
    selection: SelectionSet,
    input: String,
    error: Option<Notice>,
    success: Option<Notice>,
}

impl<A: MetadataApi> TableView<A> {
    pub fn new(api: A, page_size: usize) -> Self {
        Self {
            api,
            records: Vec::new(),
            offset: 0,
            page_size: page_size.max(1),
            selection: SelectionSet::new(),
            input: String::new(),
            error: None,
            success: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replaces the in-memory list. Offset is kept; the window clamps.
    /// On failure the previous list stays and the error is logged.
    pub fn load_all(&mut self) -> Result<usize, LensError> {
        match self.api.list() {
            Ok(records) => {
                self.records = records;
                self.selection
                    .retain_known(self.records.iter().map(|record| &record.id));
                tracing::debug!(count = self.records.len(), "records loaded");
                Ok(self.records.len())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load records");
                Err(err)
            }
        }
    }

    /// Offsets past the end wrap modulo the record count.
    pub fn set_offset(&mut self, offset: usize) {
        let total = self.records.len();
        self.offset = if total == 0 {
            0
        } else if offset >= total {
            offset % total
        } else {
            offset
        };
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.set_offset(page.saturating_mul(self.page_size));
    }

    pub fn next_page(&mut self) {
        let next = self.current_page() + 1;
        if next < self.page_count() {
            self.go_to_page(next);
        }
    }

    pub fn prev_page(&mut self) {
        let current = self.current_page();
        if current > 0 {
            self.go_to_page(current - 1);
        }
    }

    pub fn current_page(&self) -> usize {
        self.offset / self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.records.len().div_ceil(self.page_size)
    }

    pub fn page_window(&self) -> &[Record] {
        let total = self.records.len();
        let start = self.offset.min(total);
        let end = self.offset.saturating_add(self.page_size).min(total);
        &self.records[start..end]
    }

    pub fn range_label(&self) -> String {
        let total = self.records.len();
        if total == 0 {
            return "Showing 0-0 of 0".to_string();
        }
        let end = self.offset.saturating_add(self.page_size).min(total);
        format!("Showing {}-{} of {}", self.offset + 1, end, total)
    }

    pub fn toggle_select(&mut self, id: &RecordId) -> bool {
        self.selection.toggle(id)
    }

    /// Header checkbox: select or clear every id on the current page.
    pub fn toggle_select_page(&mut self, checked: bool) {
        let window = self.page_window();
        let ids = window.iter().map(|record| record.id.clone()).collect::<Vec<_>>();
        if checked {
            self.selection.union(&ids);
        } else {
            self.selection.difference(&ids);
        }
    }

    pub fn page_fully_selected(&self) -> bool {
        let window = self.page_window();
        !window.is_empty()
            && self
                .selection
                .contains_all(window.iter().map(|record| &record.id))
    }

    /// Deletes the selected ids. Returns how many ids were sent (0 when the
    /// selection is empty and nothing was requested). On failure the
    /// selection is left as it was.
    pub fn delete_selected(&mut self, now: Instant) -> Result<usize, LensError> {
        if self.selection.is_empty() {
            return Ok(0);
        }
        let ids = self.selection.to_vec();
        match self.api.delete(&ids) {
            Ok(message) => {
                tracing::info!(count = ids.len(), message = %message, "selection deleted");
                self.selection.clear();
                self.reload_after("delete");
                Ok(ids.len())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to delete records");
                self.error = Some(Notice::new(NoticeKind::Error, DELETE_FAILED_MESSAGE, now));
                Err(err)
            }
        }
    }

    /// CSV of the full list, not just the visible page.
    pub fn export_csv(&self) -> Result<String, LensError> {
        to_csv(&self.records)
    }

    pub fn export_to(&self, path: &Utf8Path) -> Result<usize, LensError> {
        let csv = self.export_csv()?;
        write_bytes_atomic(path, csv.as_bytes())?;
        tracing::info!(path = %path, rows = self.records.len(), "csv exported");
        Ok(self.records.len())
    }

    /// Validates locally first; an invalid URL never reaches the network.
    /// Blocks until the backend answers, so submissions cannot overlap.
    pub fn add_by_url(&mut self, url: &str, now: Instant) -> Result<Record, LensError> {
        self.error = None;
        let site = match url.parse::<SiteUrl>() {
            Ok(site) => site,
            Err(err) => {
                self.error = Some(Notice::new(NoticeKind::Error, INVALID_URL_MESSAGE, now));
                return Err(err);
            }
        };

        self.success = None;
        match self.api.fetch(&site) {
            Ok(record) => {
                self.input.clear();
                self.success = Some(Notice::new(NoticeKind::Success, ADDED_MESSAGE, now));
                self.reload_after("add");
                Ok(record)
            }
            Err(err) => {
                tracing::error!(url = %site, error = %err, "failed to add company");
                self.error = Some(Notice::new(NoticeKind::Error, ADD_FAILED_MESSAGE, now));
                Err(err)
            }
        }
    }

    /// The write already went through; a failed refresh keeps the old list.
    fn reload_after(&mut self, action: &'static str) {
        if let Err(err) = self.load_all() {
            tracing::warn!(action, error = %err, "reload after write failed; list may be stale");
        }
    }

    pub fn submit_input(&mut self, now: Instant) -> Result<Record, LensError> {
        let url = self.input.clone();
        self.add_by_url(&url, now)
    }

    pub fn notices(&self, now: Instant) -> Vec<&Notice> {
        [self.error.as_ref(), self.success.as_ref()]
            .into_iter()
            .flatten()
            .filter(|notice| !notice.is_expired(now))
            .collect()
    }

    pub fn expire_notices(&mut self, now: Instant) {
        if self.error.as_ref().is_some_and(|notice| notice.is_expired(now)) {
            self.error = None;
        }
        if self.success.as_ref().is_some_and(|notice| notice.is_expired(now)) {
            self.success = None;
        }
    }
}
