//! JSON export and import

use crate::error::WigleError;
use crate::wigle::NetworkRecord;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// Pretty-printed JSON array of `records`, keys sorted
pub fn to_pretty_json(records: &[NetworkRecord]) -> Result<String, WigleError> {
    let mut buf = Vec::new();
    write_sorted(&mut buf, records)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write all records to `path` as pretty-printed JSON
pub fn export_json<P: AsRef<Path>>(records: &[NetworkRecord], path: P) -> Result<(), WigleError> {
    if records.is_empty() {
        return Err(WigleError::NoDataToExport);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    write_sorted(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read records previously written by [`export_json`]
pub fn import_json<P: AsRef<Path>>(path: P) -> Result<Vec<NetworkRecord>, WigleError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Serialize with four-space indentation and every object's keys in order
fn write_sorted<W: Write>(writer: W, records: &[NetworkRecord]) -> Result<(), WigleError> {
    let value = sort_keys(serde_json::to_value(records)?);
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    Ok(())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_export_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        assert!(matches!(
            export_json(&[], &path),
            Err(WigleError::NoDataToExport)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let records = [NetworkRecord::new("Cafe", "aa", 1.0, 2.0)];
        let json = to_pretty_json(&records).unwrap();
        assert!(json.starts_with("[\n    {\n        \"channel\": null,"));
        assert!(json.contains("\"ssid\": \"Cafe\""));
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut record = NetworkRecord::new("Cafe", "aa", 1.0, 2.0);
        record.extra.insert("qos".to_string(), serde_json::json!(2));
        record.extra.insert("country".to_string(), serde_json::json!("GB"));
        let json = to_pretty_json(&[record]).unwrap();

        let keys: Vec<&str> = json
            .lines()
            .filter_map(|line| line.trim().strip_prefix('"')?.split('"').next())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 11);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(import_json(&path), Err(WigleError::Json(_))));
    }
}
