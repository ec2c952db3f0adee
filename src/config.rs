use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::LensError;
use crate::store::default_store_path;

pub const DEFAULT_CONFIG_FILE: &str = "company-lens.json";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MICROLINK_ENDPOINT: &str = "https://api.microlink.io";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TABLE: &str = "website_metadata";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub store: Option<StoreEntry>,
    #[serde(default)]
    pub provider: Option<ProviderEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreEntry {
    File {
        #[serde(default)]
        path: Option<String>,
    },
    Postgrest {
        url: String,
        key: String,
        #[serde(default)]
        table: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    File(Utf8PathBuf),
    Postgrest {
        url: String,
        key: String,
        table: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub bind: SocketAddr,
    pub api_base_url: String,
    pub page_size: usize,
    pub store: StoreBackend,
    pub provider: ProviderConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads the config file (optional unless named explicitly) and applies
    /// environment overrides from the process environment.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, LensError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| LensError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| LensError::ConfigParse(err.to_string()))?
        } else if path.is_some() {
            return Err(LensError::MissingConfig(config_path));
        } else {
            Config::default()
        };

        let mut resolved = Self::resolve_config(config)?;
        Self::apply_env(&mut resolved, |name| std::env::var(name).ok())?;
        Ok(resolved)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, LensError> {
        let bind = config
            .bind
            .as_deref()
            .unwrap_or(DEFAULT_BIND)
            .parse::<SocketAddr>()
            .map_err(|err| LensError::InvalidConfig(format!("bind: {err}")))?;

        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(LensError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }

        let store = match config.store {
            None | Some(StoreEntry::File { path: None }) => StoreBackend::File(default_store_path()?),
            Some(StoreEntry::File { path: Some(path) }) => StoreBackend::File(Utf8PathBuf::from(path)),
            Some(StoreEntry::Postgrest { url, key, table }) => StoreBackend::Postgrest {
                url,
                key,
                table: table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            },
        };

        let provider = config.provider.unwrap_or_default();
        let provider = ProviderConfig {
            endpoint: provider
                .endpoint
                .unwrap_or_else(|| DEFAULT_MICROLINK_ENDPOINT.to_string()),
            api_key: provider.api_key,
            timeout_secs: provider.timeout_secs.unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
        };

        Ok(ResolvedConfig {
            bind,
            api_base_url: normalize_base_url(
                config.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL),
            ),
            page_size,
            store,
            provider,
        })
    }

    /// Environment wins over the file: `PORT`, `API_BASE_URL`, `SUPABASE_URL`
    /// with `SUPABASE_KEY`, `MICROLINK_API_KEY`, `COMPANY_LENS_STORE`.
    pub fn apply_env<F>(resolved: &mut ResolvedConfig, lookup: F) -> Result<(), LensError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|err| LensError::InvalidConfig(format!("PORT: {err}")))?;
            resolved.bind.set_port(port);
        }
        if let Some(base) = lookup("API_BASE_URL") {
            resolved.api_base_url = normalize_base_url(&base);
        }
        if let Some(path) = lookup("COMPANY_LENS_STORE") {
            resolved.store = StoreBackend::File(Utf8PathBuf::from(path));
        }
        match (lookup("SUPABASE_URL"), lookup("SUPABASE_KEY")) {
            (Some(url), Some(key)) => {
                let table = match &resolved.store {
                    StoreBackend::Postgrest { table, .. } => table.clone(),
                    StoreBackend::File(_) => DEFAULT_TABLE.to_string(),
                };
                resolved.store = StoreBackend::Postgrest { url, key, table };
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(LensError::InvalidConfig(
                    "SUPABASE_URL and SUPABASE_KEY must be set together".to_string(),
                ));
            }
            (None, None) => {}
        }
        if let Some(key) = lookup("MICROLINK_API_KEY") {
            resolved.provider.api_key = Some(key);
        }
        Ok(())
    }
}

/// Endpoint paths are appended directly, so the base always ends with `/`.
pub fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.bind.port(), 5000);
        assert_eq!(resolved.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(resolved.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(resolved.provider.endpoint, DEFAULT_MICROLINK_ENDPOINT);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(normalize_base_url("http://host:5000"), "http://host:5000/");
        assert_eq!(normalize_base_url("http://host/api/"), "http://host/api/");
    }
}
