use std::io::{self, Write};

use serde::Serialize;

use crate::domain::Record;

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSummary {
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: String,
    pub rows: usize,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_records(records: &[Record]) -> io::Result<()> {
        Self::print_json(&records)
    }

    pub fn print_record(record: &Record) -> io::Result<()> {
        Self::print_json(record)
    }

    pub fn print_delete(summary: &DeleteSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_export(summary: &ExportSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
