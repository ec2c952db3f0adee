use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::domain::SiteMetadata;
use crate::error::LensError;
use crate::providers::MetadataProvider;

#[derive(Debug, Clone)]
pub struct MicrolinkClient {
    client: Client,
    endpoint: String,
}

impl MicrolinkClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, LensError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("company-lens/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LensError::InvalidConfig(err.to_string()))?,
        );
        if let Some(key) = &config.api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(key)
                    .map_err(|err| LensError::InvalidConfig(err.to_string()))?,
            );
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| LensError::ProviderHttp(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl MetadataProvider for MicrolinkClient {
    fn fetch(&self, url: &str) -> Result<SiteMetadata, LensError> {
        tracing::debug!(url, endpoint = %self.endpoint, "microlink.request");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url), ("meta", "true"), ("screenshot", "true")])
            .send()
            .map_err(|err| LensError::ProviderHttp(err.to_string()))?;

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .map_err(|err| LensError::ProviderHttp(err.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(LensError::ProviderStatus {
                status,
                message: failure_message(&body),
            });
        }
        extract_metadata(&body)
    }
}

/// Pulls the four fields out of a Microlink response body. Anything but
/// `"status": "success"` is a provider failure.
pub fn extract_metadata(body: &Value) -> Result<SiteMetadata, LensError> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("");
    if status != "success" {
        return Err(LensError::ProviderResponse(failure_message(body)));
    }
    let data = body
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| LensError::ProviderResponse("response has no data".to_string()))?;

    Ok(SiteMetadata {
        title: text_field(data, "title"),
        description: text_field(data, "description"),
        logo: asset_url(data, "logo"),
        screenshot: asset_url(data, "screenshot"),
    })
}

fn text_field(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn asset_url(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(|asset| asset.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn failure_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("code").and_then(Value::as_str))
        .unwrap_or("metadata extraction failed")
        .to_string()
}
