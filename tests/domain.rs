use assert_matches::assert_matches;

use company_lens::domain::{NewRecord, Record, RecordId, SiteMetadata, SiteUrl};
use company_lens::error::LensError;

#[test]
fn parse_site_url_accepts_common_forms() {
    for input in [
        "https://example.com",
        "http://www.example.com",
        "https://docs.rs/axum/latest",
        "https://my-site.co.uk/",
        "https://a.b.example.io/path?query=1",
    ] {
        let url: SiteUrl = input.parse().unwrap();
        assert_eq!(url.as_str(), input);
    }
}

#[test]
fn parse_site_url_rejects_malformed() {
    for input in [
        "",
        "   ",
        "example.com",
        "ftp://example.com",
        "https://localhost",
        "https://example.c",
        "https://exa mple.com",
        "https://.com",
    ] {
        let err = input.parse::<SiteUrl>().unwrap_err();
        assert_matches!(err, LensError::InvalidUrl(_), "accepted {input:?}");
    }
}

#[test]
fn site_url_trims_whitespace() {
    let url: SiteUrl = "\thttps://example.com/about\n".parse().unwrap();
    assert_eq!(url.to_string(), "https://example.com/about");
}

#[test]
fn site_url_deserialize_validates() {
    let err = serde_json::from_str::<SiteUrl>("\"not a url\"");
    assert!(err.is_err());
    let url: SiteUrl = serde_json::from_str("\"https://example.com\"").unwrap();
    assert_eq!(url.as_str(), "https://example.com");
}

#[test]
fn record_id_accepts_text_and_numbers() {
    let text: RecordId = serde_json::from_str("\"a1b2\"").unwrap();
    let number: RecordId = serde_json::from_str("17").unwrap();
    assert_eq!(text.as_str(), "a1b2");
    assert_eq!(number.as_str(), "17");
    assert_eq!(serde_json::to_string(&number).unwrap(), "\"17\"");
}

#[test]
fn generated_ids_are_unique() {
    let a = RecordId::generate();
    let b = RecordId::generate();
    assert_ne!(a, b);
}

#[test]
fn record_from_metadata_keeps_optional_fields() {
    let metadata = SiteMetadata {
        title: Some("Example".to_string()),
        description: None,
        logo: Some("https://example.com/logo.png".to_string()),
        screenshot: None,
    };
    let new = NewRecord::from_metadata("https://example.com", metadata);
    let record = Record::from_new(RecordId::new("1"), new, chrono::Utc::now());

    assert_eq!(record.display_name(), "Example");
    assert_eq!(record.description, None);
    assert_eq!(
        record.company_logo.as_deref(),
        Some("https://example.com/logo.png")
    );
    assert!(!record.has_social_profiles());
}

#[test]
fn display_name_falls_back_to_url() {
    let new = NewRecord::from_metadata("https://example.com", SiteMetadata::default());
    let record = Record::from_new(RecordId::new("1"), new, chrono::Utc::now());
    assert_eq!(record.display_name(), "https://example.com");
}

#[test]
fn record_tolerates_missing_optional_columns() {
    let json = r#"{
        "id": 5,
        "url": "https://example.com",
        "name": "Example",
        "created_at": "2024-05-01T10:00:00Z"
    }"#;
    let record: Record = serde_json::from_str(json).unwrap();
    assert_eq!(record.id.as_str(), "5");
    assert_eq!(record.screenshot, None);
    assert_eq!(record.address, None);
}
