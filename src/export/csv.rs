//! CSV export
//!
//! Columns are the keys of the first record; later records are laid out
//! against that header, with blanks for keys they lack.

use crate::error::WigleError;
use crate::wigle::NetworkRecord;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn export_csv<P: AsRef<Path>>(records: &[NetworkRecord], path: P) -> Result<(), WigleError> {
    if records.is_empty() {
        return Err(WigleError::NoDataToExport);
    }
    write_csv(records, BufWriter::new(File::create(path)?))
}

pub fn write_csv<W: Write>(records: &[NetworkRecord], writer: W) -> Result<(), WigleError> {
    let Some(first) = records.first() else {
        return Err(WigleError::NoDataToExport);
    };

    let header: Vec<String> = fields(first)?.keys().cloned().collect();
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(&header)?;

    for record in records {
        let row = fields(record)?;
        out.write_record(header.iter().map(|key| cell(row.get(key))))?;
    }

    out.flush()?;
    Ok(())
}

fn fields(record: &NetworkRecord) -> Result<Map<String, Value>, WigleError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
