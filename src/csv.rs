use serde::Serialize;
use serde_json::Value;

use crate::error::LensError;

pub const EXPORT_FILE_NAME: &str = "companies.csv";

/// Serializes rows to CSV text. The header is the key list of the first row;
/// later rows are projected onto it (absent keys become empty fields).
/// Returns an empty string for no rows.
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<String, LensError> {
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| LensError::Export(err.to_string()))?;

    let Some(first) = values.first() else {
        return Ok(String::new());
    };
    let header = match first {
        Value::Object(map) => map.keys().cloned().collect::<Vec<_>>(),
        _ => {
            return Err(LensError::Export(
                "rows must serialize to objects".to_string(),
            ));
        }
    };

    let mut lines = Vec::with_capacity(values.len() + 1);
    lines.push(header.join(","));
    for value in &values {
        let cells = header
            .iter()
            .map(|key| render_cell(value.get(key)))
            .collect::<Vec<_>>();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => escape_field(text),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(nested) => escape_field(&nested.to_string()),
    }
}

/// Doubles embedded quotes; quotes the field when it holds `,` `"` or `\n`.
pub fn escape_field(text: &str) -> String {
    let escaped = text.replace('"', "\"\"");
    if escaped.contains([',', '"', '\n']) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}
