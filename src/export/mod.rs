//! Export of accumulated records
//!
//! Every exporter makes a single pass over the records and refuses an
//! empty collection with [`WigleError::NoDataToExport`].

pub mod csv;
pub mod json;
pub mod kml;

pub use self::csv::{export_csv, write_csv};
pub use self::json::{export_json, import_json, to_pretty_json};
pub use self::kml::{export_kml, write_kml, MarkerStyle};

use crate::error::WigleError;
use crate::wigle::NetworkRecord;
use chrono::NaiveDate;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Kml,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Kml => write!(f, "KML"),
        }
    }
}

impl ExportFormat {
    /// Write `records` to `path` in this format
    pub fn export<P: AsRef<Path>>(
        self,
        records: &[NetworkRecord],
        path: P,
        today: NaiveDate,
    ) -> Result<(), WigleError> {
        match self {
            ExportFormat::Json => export_json(records, path),
            ExportFormat::Csv => export_csv(records, path),
            ExportFormat::Kml => export_kml(records, path, today),
        }
    }
}
