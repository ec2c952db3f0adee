use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LensError;

static SITE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]{2,}(/.*)?$")
        .expect("site URL pattern compiles")
});

/// A submitted website address: `http(s)://(sub.)*domain.tld(/path)?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteUrl(String);

impl SiteUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SiteUrl {
    type Err = LensError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !SITE_URL_RE.is_match(trimmed) {
            return Err(LensError::InvalidUrl(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for SiteUrl {
    type Error = LensError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiteUrl> for String {
    fn from(value: SiteUrl) -> Self {
        value.0
    }
}

/// Store-assigned record identifier. Hosted tables may hand out integers,
/// so numeric ids are accepted on input and kept in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(value) => Self(value),
            Raw::Number(value) => Self(value.to_string()),
        })
    }
}

/// One stored metadata entry. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company_logo: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub social_facebook: Option<String>,
    #[serde(default)]
    pub social_twitter: Option<String>,
    #[serde(default)]
    pub social_linkedin: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn from_new(id: RecordId, new: NewRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            url: new.url,
            name: new.name,
            description: new.description,
            company_logo: new.company_logo,
            screenshot: new.screenshot,
            phone_number: None,
            email: None,
            social_facebook: None,
            social_twitter: None,
            social_linkedin: None,
            address: None,
            created_at,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

    pub fn has_social_profiles(&self) -> bool {
        self.social_facebook.is_some()
            || self.social_twitter.is_some()
            || self.social_linkedin.is_some()
    }
}

/// Insert payload: what the provider reported plus the submitted URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub company_logo: Option<String>,
    pub screenshot: Option<String>,
}

impl NewRecord {
    pub fn from_metadata(url: &str, metadata: SiteMetadata) -> Self {
        Self {
            url: url.to_string(),
            name: metadata.title,
            description: metadata.description,
            company_logo: metadata.logo,
            screenshot: metadata.screenshot,
        }
    }
}

/// Metadata reported by the extraction provider for one URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub screenshot: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_site_url_valid() {
        let url: SiteUrl = "  https://www.example.com/about ".parse().unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/about");
    }

    #[test]
    fn parse_site_url_requires_scheme() {
        let err = "example.com".parse::<SiteUrl>().unwrap_err();
        assert_matches!(err, LensError::InvalidUrl(_));
    }

    #[test]
    fn record_id_from_number() {
        let id: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn record_id_matches_case_insensitively() {
        let id = RecordId::new("AbC-1");
        assert!(id.matches("abc-1"));
        assert!(!id.matches("abc-2"));
    }
}
