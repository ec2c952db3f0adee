use serde::Serialize;

use crate::domain::{NewRecord, Record, RecordId};
use crate::error::LensError;
use crate::providers::MetadataProvider;
use crate::store::RecordStore;

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub requested: usize,
    pub removed: usize,
}

/// Backend operations behind the HTTP endpoints.
pub struct App<S: RecordStore, P: MetadataProvider> {
    store: S,
    provider: P,
}

impl<S: RecordStore, P: MetadataProvider> App<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Provider call then insert. There is no compensation when the insert
    /// fails after a successful provider call.
    pub fn fetch_and_store(&self, url: &str) -> Result<Record, LensError> {
        let metadata = self.provider.fetch(url).inspect_err(|err| {
            tracing::error!(url, error = %err, "metadata provider failed");
        })?;
        let record = NewRecord::from_metadata(url, metadata);
        self.store.insert(record).inspect_err(|err| {
            tracing::error!(url, error = %err, "record insert failed");
        })
    }

    pub fn list(&self) -> Result<Vec<Record>, LensError> {
        self.store.list_recent().inspect_err(|err| {
            tracing::error!(error = %err, "record listing failed");
        })
    }

    pub fn delete(&self, ids: &[RecordId]) -> Result<DeleteResult, LensError> {
        let removed = self.store.delete(ids).inspect_err(|err| {
            tracing::error!(requested = ids.len(), error = %err, "record delete failed");
        })?;
        Ok(DeleteResult {
            requested: ids.len(),
            removed,
        })
    }
}
