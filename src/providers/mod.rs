pub mod microlink;

use crate::domain::SiteMetadata;
use crate::error::LensError;

/// Metadata-extraction seam: one URL in, title/description/logo/screenshot out.
pub trait MetadataProvider: Send + Sync {
    fn fetch(&self, url: &str) -> Result<SiteMetadata, LensError>;
}
