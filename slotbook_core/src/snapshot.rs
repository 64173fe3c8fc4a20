//! Snapshot persistence with atomic replacement.
//!
//! The whole record set is written as one JSON document. Saves go to a temp
//! file in the target directory which is then renamed over the snapshot, so
//! a reader never observes a partially written file.

use crate::{Appointment, Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    appointments: Vec<Appointment>,
}

/// Backing file for the store. Without a path every operation is a no-op.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    path: Option<PathBuf>,
}

impl Snapshot {
    /// Snapshot at `path`; an empty path means memory-only
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() {
            Self::memory()
        } else {
            Self { path: Some(path) }
        }
    }

    pub fn memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load all records.
    ///
    /// A missing file is a first run and yields nothing. Unreadable or
    /// malformed content is an error.
    pub fn load(&self) -> Result<Vec<Appointment>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(Vec::new());
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No snapshot found at {:?}, starting empty", path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;

        let mut contents = String::new();
        let read = io::BufReader::new(&file).read_to_string(&mut contents);
        if let Err(e) = file.unlock() {
            tracing::warn!("Failed to unlock snapshot {:?}: {}", path, e);
        }
        read?;

        let snapshot: SnapshotFile = serde_json::from_str(&contents)?;
        tracing::debug!(
            count = snapshot.appointments.len(),
            "Loaded snapshot from {:?}",
            path
        );
        Ok(snapshot.appointments)
    }

    /// Replace the snapshot with `records`, ordered by start time.
    pub fn save(&self, records: &[Appointment]) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let mut appointments = records.to_vec();
        appointments.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        let contents = serde_json::to_string_pretty(&SnapshotFile { appointments })?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = io::BufWriter::new(temp.as_file());
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(count = records.len(), "Saved snapshot to {:?}", path);
        Ok(())
    }
}
