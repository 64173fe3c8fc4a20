//! CSV export of appointment listings.
//!
//! The export is written to a temp file next to the target and renamed into
//! place once it has been synced.

use crate::{Appointment, Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    start_time: String,
    end_time: String,
    frequency: &'static str,
    recurrence_end: Option<String>,
}

impl<'a> From<&'a Appointment> for CsvRow<'a> {
    fn from(apt: &'a Appointment) -> Self {
        CsvRow {
            id: &apt.id,
            title: &apt.title,
            description: apt.description.as_deref(),
            start_time: apt.start_time.to_rfc3339(),
            end_time: apt.end_time.to_rfc3339(),
            frequency: apt.recurrence.frequency.as_str(),
            recurrence_end: apt.recurrence.end_time.map(|t| t.to_rfc3339()),
        }
    }
}

/// Write `appointments` to `path` as CSV with a header row.
///
/// Returns the number of rows written. An existing file is replaced.
pub fn export_csv(appointments: &[Appointment], path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp.as_file());

    for apt in appointments {
        writer.serialize(CsvRow::from(apt))?;
    }

    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} appointments to {:?}", appointments.len(), path);
    Ok(appointments.len())
}
