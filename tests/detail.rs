use camino::Utf8PathBuf;
use chrono::Utc;

use company_lens::detail::{
    self, DEFAULT_ADDRESS, Detail, MISSING_VALUE, SelectedRecord,
};
use company_lens::domain::{NewRecord, Record, RecordId, SiteMetadata};

fn record(id: &str, name: &str) -> Record {
    let metadata = SiteMetadata {
        title: Some(name.to_string()),
        ..SiteMetadata::default()
    };
    let new = NewRecord::from_metadata(&format!("https://{id}.example.com"), metadata);
    Record::from_new(RecordId::new(id), new, Utc::now())
}

#[test]
fn selected_record_wins_when_ids_match() {
    let mut selected = SelectedRecord::new();
    selected.select(record("abc", "From selection"));
    let list = vec![record("abc", "From list")];

    let Detail::Found(found) = detail::resolve("ABC", &selected, &list) else {
        panic!("record should resolve");
    };
    assert_eq!(found.display_name(), "From selection");
}

#[test]
fn stale_selection_falls_back_to_list() {
    let mut selected = SelectedRecord::new();
    selected.select(record("other", "Stale"));
    let list = vec![record("a1", "First"), record("B2", "Second")];

    let Detail::Found(found) = detail::resolve("b2", &selected, &list) else {
        panic!("record should resolve");
    };
    assert_eq!(found.display_name(), "Second");
}

#[test]
fn unknown_id_is_pending() {
    let selected = SelectedRecord::new();
    assert_eq!(detail::resolve("missing", &selected, &[]), Detail::Pending);
    let list = vec![record("a1", "First")];
    assert_eq!(detail::resolve("missing", &selected, &list), Detail::Pending);
}

#[test]
fn contact_fields_fall_back_to_placeholders() {
    let mut bare = record("a1", "Bare");
    assert_eq!(detail::address(&bare), DEFAULT_ADDRESS);
    assert_eq!(detail::phone(&bare), MISSING_VALUE);
    assert_eq!(detail::email(&bare), MISSING_VALUE);
    assert!(detail::social_links(&bare).is_empty());

    bare.phone_number = Some("+1 555 0100".to_string());
    bare.email = Some("hello@example.com".to_string());
    bare.address = Some("Berlin, Germany".to_string());
    bare.social_linkedin = Some("https://linkedin.com/company/example".to_string());
    assert_eq!(detail::phone(&bare), "+1 555 0100");
    assert_eq!(detail::email(&bare), "hello@example.com");
    assert_eq!(detail::address(&bare), "Berlin, Germany");
    assert_eq!(
        detail::social_links(&bare),
        vec![("LinkedIn", "https://linkedin.com/company/example")]
    );
}

#[test]
fn selection_survives_persist_and_restore() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("selected.json")).unwrap();

    let mut selected = SelectedRecord::new();
    let chosen = record("abc", "Chosen");
    selected.select(chosen.clone());
    selected.persist(&path).unwrap();

    let restored = SelectedRecord::restore(&path);
    assert_eq!(restored.current(), Some(&chosen));
}

#[test]
fn unreadable_selection_restores_empty() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("selected.json")).unwrap();
    assert!(SelectedRecord::restore(&path).current().is_none());

    std::fs::write(path.as_std_path(), "garbage").unwrap();
    assert!(SelectedRecord::restore(&path).current().is_none());
}
