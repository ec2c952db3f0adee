use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use company_lens::app::App;
use company_lens::domain::{RecordId, SiteMetadata};
use company_lens::error::LensError;
use company_lens::providers::MetadataProvider;
use company_lens::store::{FileStore, RecordStore};

#[derive(Default)]
struct MockProvider {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl MetadataProvider for MockProvider {
    fn fetch(&self, url: &str) -> Result<SiteMetadata, LensError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(LensError::ProviderStatus {
                status: 502,
                message: "upstream down".to_string(),
            });
        }
        Ok(SiteMetadata {
            title: Some("Example".to_string()),
            description: Some("An example company".to_string()),
            logo: Some(format!("{url}/logo.png")),
            screenshot: Some(format!("{url}/shot.png")),
        })
    }
}

fn app(fail: bool) -> (tempfile::TempDir, App<FileStore, MockProvider>) {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("records.json")).unwrap();
    let provider = MockProvider {
        fail,
        ..MockProvider::default()
    };
    (temp, App::new(FileStore::new(path), provider))
}

#[test]
fn fetch_and_store_maps_provider_fields() {
    let (_temp, app) = app(false);
    let record = app.fetch_and_store("https://example.com").unwrap();

    assert_eq!(record.url, "https://example.com");
    assert_eq!(record.name.as_deref(), Some("Example"));
    assert_eq!(record.description.as_deref(), Some("An example company"));
    assert_eq!(
        record.company_logo.as_deref(),
        Some("https://example.com/logo.png")
    );
    assert_eq!(
        record.screenshot.as_deref(),
        Some("https://example.com/shot.png")
    );
    assert_eq!(app.list().unwrap(), vec![record]);
}

#[test]
fn provider_failure_inserts_nothing() {
    let (_temp, app) = app(true);
    let err = app.fetch_and_store("https://example.com").unwrap_err();
    assert_matches!(err, LensError::ProviderStatus { status: 502, .. });
    assert!(app.store().list_recent().unwrap().is_empty());
}

#[test]
fn delete_reports_requested_and_removed() {
    let (_temp, app) = app(false);
    let kept = app.fetch_and_store("https://a.example.com").unwrap();
    let gone = app.fetch_and_store("https://b.example.com").unwrap();

    let result = app
        .delete(&[gone.id.clone(), RecordId::new("unknown")])
        .unwrap();
    assert_eq!(result.requested, 2);
    assert_eq!(result.removed, 1);
    assert_eq!(app.list().unwrap(), vec![kept]);
}
