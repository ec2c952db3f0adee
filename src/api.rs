use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{Record, RecordId, SiteUrl};
use crate::error::LensError;
use crate::server::{DeleteRequest, ErrorResponse, FetchRequest, FetchResponse, MessageResponse};

/// Client view of the three HTTP endpoints.
pub trait MetadataApi: Send + Sync {
    fn list(&self) -> Result<Vec<Record>, LensError>;
    fn fetch(&self, url: &SiteUrl) -> Result<Record, LensError>;
    fn delete(&self, ids: &[RecordId]) -> Result<String, LensError>;
}

#[derive(Clone)]
pub struct HttpMetadataApi {
    client: Client,
    base_url: String,
}

impl HttpMetadataApi {
    /// `base_url` must end with `/`; paths are appended verbatim.
    pub fn new(base_url: &str) -> Result<Self, LensError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("company-lens/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LensError::InvalidConfig(err.to_string()))?,
        );
        // Longer than the backend's provider timeout.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| LensError::ApiHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn handle_status(response: Response) -> Result<Response, LensError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorResponse>()
            .map(|body| body.error)
            .unwrap_or_else(|_| "API request failed".to_string());
        Err(LensError::ApiStatus { status, message })
    }
}

impl MetadataApi for HttpMetadataApi {
    fn list(&self) -> Result<Vec<Record>, LensError> {
        let response = self
            .client
            .get(self.endpoint("metadata-list"))
            .send()
            .map_err(|err| LensError::ApiHttp(err.to_string()))?;
        Self::handle_status(response)?
            .json()
            .map_err(|err| LensError::ApiHttp(err.to_string()))
    }

    fn fetch(&self, url: &SiteUrl) -> Result<Record, LensError> {
        let response = self
            .client
            .post(self.endpoint("fetch-metadata"))
            .json(&FetchRequest {
                url: Some(url.to_string()),
            })
            .send()
            .map_err(|err| LensError::ApiHttp(err.to_string()))?;
        let body: FetchResponse = Self::handle_status(response)?
            .json()
            .map_err(|err| LensError::ApiHttp(err.to_string()))?;
        Ok(body.data)
    }

    fn delete(&self, ids: &[RecordId]) -> Result<String, LensError> {
        let response = self
            .client
            .delete(self.endpoint("delete"))
            .json(&DeleteRequest {
                ids: Some(ids.to_vec()),
            })
            .send()
            .map_err(|err| LensError::ApiHttp(err.to_string()))?;
        let body: MessageResponse = Self::handle_status(response)?
            .json()
            .map_err(|err| LensError::ApiHttp(err.to_string()))?;
        Ok(body.message)
    }
}
