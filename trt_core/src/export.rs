//! CSV export of the entry log.

use crate::query::sort_by_date_desc;
use crate::types::{Entry, EventType};
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    event_type: String,
    date: String,
    regimen_id: Option<String>,
    product: Option<String>,
    dosage_mg: Option<f64>,
    level_ng_dl: Option<f64>,
    wellbeing_score: Option<u8>,
    notes: Option<String>,
}

impl From<&Entry> for CsvRow {
    fn from(entry: &Entry) -> Self {
        let event_type = match entry.event_type {
            EventType::Dose => "dose",
            EventType::Lab => "lab",
            EventType::Symptom => "symptom",
        };
        CsvRow {
            id: entry.id.clone(),
            event_type: event_type.into(),
            date: entry.date.to_rfc3339(),
            regimen_id: entry.regimen_id.clone(),
            product: entry.product.clone(),
            dosage_mg: entry.dosage_mg,
            level_ng_dl: entry.level_ng_dl,
            wellbeing_score: entry.wellbeing_score,
            notes: entry.notes.clone(),
        }
    }
}

/// Write all entries to a CSV file, newest first.
///
/// Creates parent directories as needed and overwrites any existing file.
/// Returns the number of rows written.
pub fn export_entries(path: &Path, entries: &[Entry]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);

    let sorted = sort_by_date_desc(entries);
    for entry in &sorted {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", sorted.len(), path);
    Ok(sorted.len())
}
