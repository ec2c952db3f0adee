use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{NewRecord, Record, RecordId};
use crate::error::LensError;
use crate::store::RecordStore;

/// Record store backed by a hosted PostgREST table (Supabase).
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    table_url: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, key: &str, table: &str) -> Result<Self, LensError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("company-lens/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LensError::InvalidConfig(err.to_string()))?,
        );
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|err| LensError::InvalidConfig(err.to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|err| LensError::InvalidConfig(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| LensError::StoreHttp(err.to_string()))?;
        Ok(Self {
            client,
            table_url: table_url(base_url, table),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn handle_status(response: Response) -> Result<Response, LensError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "record store request failed".to_string());
        Err(LensError::StoreStatus { status, message })
    }
}

impl RecordStore for PostgrestStore {
    fn insert(&self, record: NewRecord) -> Result<Record, LensError> {
        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&[&record])
            .send()
            .map_err(|err| LensError::StoreHttp(err.to_string()))?;
        let inserted: Vec<Record> = Self::handle_status(response)?
            .json()
            .map_err(|err| LensError::StoreHttp(err.to_string()))?;
        let record = inserted
            .into_iter()
            .next()
            .ok_or_else(|| LensError::StoreCorrupt("insert returned no rows".to_string()))?;
        tracing::info!(id = %record.id, url = %record.url, "record inserted");
        Ok(record)
    }

    fn list_recent(&self) -> Result<Vec<Record>, LensError> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .map_err(|err| LensError::StoreHttp(err.to_string()))?;
        Self::handle_status(response)?
            .json()
            .map_err(|err| LensError::StoreHttp(err.to_string()))
    }

    fn delete(&self, ids: &[RecordId]) -> Result<usize, LensError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let filter = in_filter(ids);
        let response = self
            .client
            .delete(&self.table_url)
            .header("Prefer", "return=representation")
            .query(&[("id", filter.as_str())])
            .send()
            .map_err(|err| LensError::StoreHttp(err.to_string()))?;
        let removed: Vec<serde_json::Value> = Self::handle_status(response)?
            .json()
            .map_err(|err| LensError::StoreHttp(err.to_string()))?;
        tracing::info!(requested = ids.len(), removed = removed.len(), "records deleted");
        Ok(removed.len())
    }
}

pub fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

/// `in.("a","b")`. Values are double-quoted so ids containing commas or
/// parentheses stay intact.
pub fn in_filter(ids: &[RecordId]) -> String {
    let values = ids
        .iter()
        .map(|id| format!("\"{}\"", id.as_str().replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>();
    format!("in.({})", values.join(","))
}
