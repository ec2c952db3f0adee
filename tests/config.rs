use std::collections::HashMap;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use company_lens::config::{
    Config, ConfigLoader, DEFAULT_TABLE, ProviderEntry, StoreBackend, StoreEntry,
};
use company_lens::error::LensError;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    move |name| map.get(name).cloned()
}

#[test]
fn parse_config_file() {
    let json = r#"{
        "bind": "0.0.0.0:8080",
        "api_base_url": "http://lens.internal:8080",
        "page_size": 25,
        "store": { "kind": "file", "path": "/tmp/lens/records.json" },
        "provider": { "endpoint": "https://pro.microlink.io", "timeout_secs": 10 }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let resolved = ConfigLoader::resolve_config(config).unwrap();

    assert_eq!(resolved.bind.to_string(), "0.0.0.0:8080");
    assert_eq!(resolved.api_base_url, "http://lens.internal:8080/");
    assert_eq!(resolved.page_size, 25);
    assert_eq!(
        resolved.store,
        StoreBackend::File(Utf8PathBuf::from("/tmp/lens/records.json"))
    );
    assert_eq!(resolved.provider.endpoint, "https://pro.microlink.io");
    assert_eq!(resolved.provider.timeout_secs, 10);
    assert_eq!(resolved.provider.api_key, None);
}

#[test]
fn postgrest_store_defaults_table() {
    let config = Config {
        store: Some(StoreEntry::Postgrest {
            url: "https://project.supabase.co".to_string(),
            key: "anon".to_string(),
            table: None,
        }),
        ..Config::default()
    };
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_matches!(
        resolved.store,
        StoreBackend::Postgrest { ref table, .. } if table == DEFAULT_TABLE
    );
}

#[test]
fn zero_page_size_is_rejected() {
    let config = Config {
        page_size: Some(0),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, LensError::InvalidConfig(_));
}

#[test]
fn bad_bind_is_rejected() {
    let config = Config {
        bind: Some("not-an-address".to_string()),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, LensError::InvalidConfig(_));
}

#[test]
fn env_overrides_file_values() {
    let config = Config {
        provider: Some(ProviderEntry {
            api_key: Some("from-file".to_string()),
            ..ProviderEntry::default()
        }),
        ..Config::default()
    };
    let mut resolved = ConfigLoader::resolve_config(config).unwrap();
    ConfigLoader::apply_env(
        &mut resolved,
        env(&[
            ("PORT", "7000"),
            ("API_BASE_URL", "http://10.0.0.2:7000"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_KEY", "service"),
            ("MICROLINK_API_KEY", "from-env"),
        ]),
    )
    .unwrap();

    assert_eq!(resolved.bind.port(), 7000);
    assert_eq!(resolved.api_base_url, "http://10.0.0.2:7000/");
    assert_eq!(resolved.provider.api_key.as_deref(), Some("from-env"));
    assert_eq!(
        resolved.store,
        StoreBackend::Postgrest {
            url: "https://project.supabase.co".to_string(),
            key: "service".to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    );
}

#[test]
fn env_store_path_selects_file_store() {
    let mut resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    ConfigLoader::apply_env(&mut resolved, env(&[("COMPANY_LENS_STORE", "data/records.json")]))
        .unwrap();
    assert_eq!(
        resolved.store,
        StoreBackend::File(Utf8PathBuf::from("data/records.json"))
    );
}

#[test]
fn supabase_env_requires_both_values() {
    let mut resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    let err = ConfigLoader::apply_env(
        &mut resolved,
        env(&[("SUPABASE_URL", "https://project.supabase.co")]),
    )
    .unwrap_err();
    assert_matches!(err, LensError::InvalidConfig(_));
}

#[test]
fn bad_port_is_rejected() {
    let mut resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    let err = ConfigLoader::apply_env(&mut resolved, env(&[("PORT", "http")])).unwrap_err();
    assert_matches!(err, LensError::InvalidConfig(_));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, LensError::MissingConfig(_));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("company-lens.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, LensError::ConfigParse(_));
}

#[test]
fn unknown_top_level_keys_are_ignored() {
    let json = r#"{ "schema_version": 2, "page_size": 5 }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.page_size, 5);
}
