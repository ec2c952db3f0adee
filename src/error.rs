use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LensError {
    #[error("invalid URL: {0}")]
    #[diagnostic(help("expected http(s)://domain.tld with an optional /path"))]
    InvalidUrl(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("config file not found: {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("metadata provider request failed: {0}")]
    ProviderHttp(String),

    #[error("metadata provider returned status {status}: {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("metadata provider response rejected: {0}")]
    ProviderResponse(String),

    #[error("record store request failed: {0}")]
    StoreHttp(String),

    #[error("record store returned status {status}: {message}")]
    StoreStatus { status: u16, message: String },

    #[error("record store is corrupt: {0}")]
    StoreCorrupt(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("API request failed: {0}")]
    ApiHttp(String),

    #[error("API returned status {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("export failed: {0}")]
    Export(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("server error: {0}")]
    Server(String),
}
