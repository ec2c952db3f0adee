use chrono::{TimeZone, Utc};
use serde::Serialize;

use company_lens::csv::to_csv;
use company_lens::domain::{Record, RecordId};

/// Minimal reader for the quoting rules the writer uses.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match (quoted, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => quoted = false,
            (true, ch) => field.push(ch),
            (false, '"') => quoted = true,
            (false, ',') => row.push(std::mem::take(&mut field)),
            (false, '\n') => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            (false, ch) => field.push(ch),
        }
    }
    row.push(field);
    rows.push(row);
    rows
}

fn record(id: &str, name: Option<&str>, description: Option<&str>) -> Record {
    Record {
        id: RecordId::new(id),
        url: format!("https://{id}.example.com"),
        name: name.map(str::to_string),
        description: description.map(str::to_string),
        company_logo: None,
        screenshot: None,
        phone_number: None,
        email: None,
        social_facebook: None,
        social_twitter: None,
        social_linkedin: None,
        address: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    }
}

#[test]
fn header_follows_record_field_order() {
    let csv = to_csv(&[record("a", Some("Acme"), None)]).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "id,url,name,description,company_logo,screenshot,phone_number,email,\
         social_facebook,social_twitter,social_linkedin,address,created_at"
    );
}

#[test]
fn nulls_become_empty_fields() {
    let csv = to_csv(&[record("a", None, None)]).unwrap();
    let rows = parse_csv(&csv);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "a");
    assert_eq!(rows[1][2], "");
    assert_eq!(rows[1][3], "");
}

#[test]
fn special_characters_survive_a_read_back() {
    let tricky = "Builds \"fast\" tools, for teams\nworldwide";
    let records = vec![
        record("a", Some("Acme, Inc."), Some(tricky)),
        record("b", Some("Plain"), Some("simple")),
    ];
    let csv = to_csv(&records).unwrap();
    let rows = parse_csv(&csv);

    assert_eq!(rows.len(), records.len() + 1);
    assert_eq!(rows[1][2], "Acme, Inc.");
    assert_eq!(rows[1][3], tricky);
    assert_eq!(rows[2][3], "simple");
    assert!(rows.iter().all(|row| row.len() == rows[0].len()));
}

#[test]
fn later_rows_are_projected_onto_first_header() {
    #[derive(Serialize)]
    struct Loose {
        a: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        b: Option<bool>,
    }
    let csv = to_csv(&[
        Loose { a: 1, b: Some(true) },
        Loose { a: 2, b: None },
    ])
    .unwrap();
    assert_eq!(csv, "a,b\n1,true\n2,");
}

#[test]
fn plain_values_are_not_quoted() {
    let csv = to_csv(&[record("a", Some("Acme"), Some("Rockets"))]).unwrap();
    assert!(!csv.contains('"'));
}
