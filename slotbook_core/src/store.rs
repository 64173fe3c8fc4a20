//! The appointment store.
//!
//! Owns the record set behind a single mutex and keeps the invariant that no
//! two stored appointments overlap. Every operation, including the snapshot
//! write that follows a mutation, runs while the lock is held, so all store
//! activity is serialized.
//!
//! A snapshot failure after a mutation does not roll the mutation back: the
//! in-memory set stays authoritative and the error reports the durability gap.

use crate::conflict::find_conflicts;
use crate::recurrence::expand;
use crate::snapshot::Snapshot;
use crate::{Appointment, Error, Result, TimeRange};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// The operations callers depend on
pub trait AppointmentRepository {
    /// Commit a booking and all its occurrences, or nothing.
    fn create(&self, booking: Appointment) -> Result<Vec<Appointment>>;

    /// Records overlapping `range`, ascending by start time.
    fn list(&self, range: TimeRange) -> Vec<Appointment>;

    /// Remove one record by identifier.
    fn delete(&self, id: &str) -> Result<()>;
}

pub struct Store {
    records: Mutex<HashMap<String, Appointment>>,
    snapshot: Snapshot,
}

impl Store {
    /// Open a store backed by the snapshot at `path`.
    ///
    /// An empty path gives a memory-only store. An unreadable or malformed
    /// snapshot aborts construction.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let snapshot = Snapshot::new(path);
        let records: HashMap<_, _> = snapshot
            .load()?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        tracing::info!(
            count = records.len(),
            persistent = snapshot.path().is_some(),
            "Opened appointment store"
        );
        Ok(Self {
            records: Mutex::new(records),
            snapshot,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            snapshot: Snapshot::memory(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Appointment> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Appointment>> {
        // Mutations never panic halfway, so a poisoned set is still consistent.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save_locked(&self, records: &HashMap<String, Appointment>) -> Result<()> {
        let all: Vec<Appointment> = records.values().cloned().collect();
        self.snapshot.save(&all)
    }
}

impl AppointmentRepository for Store {
    fn create(&self, booking: Appointment) -> Result<Vec<Appointment>> {
        let mut occurrences = expand(&booking)?;
        assign_ids(&mut occurrences);

        let mut records = self.lock();

        if let Some(taken) = occurrences.iter().find(|o| records.contains_key(&o.id)) {
            return Err(Error::BadInput(format!(
                "appointment id already exists: {}",
                taken.id
            )));
        }

        let conflicts = find_conflicts(&occurrences, records.values());
        if !conflicts.is_empty() {
            tracing::info!(
                title = %booking.title,
                conflicts = conflicts.len(),
                "Rejected booking: time slot taken"
            );
            return Err(Error::Conflict { conflicts });
        }

        for occurrence in &occurrences {
            records.insert(occurrence.id.clone(), occurrence.clone());
        }
        tracing::info!(
            title = %booking.title,
            occurrences = occurrences.len(),
            "Committed booking"
        );

        if let Err(e) = self.save_locked(&records) {
            tracing::warn!("Booking committed but snapshot write failed: {}", e);
            return Err(Error::Unsaved {
                committed: occurrences,
                source: Box::new(e),
            });
        }
        Ok(occurrences)
    }

    fn list(&self, range: TimeRange) -> Vec<Appointment> {
        let records = self.lock();

        let mut out: Vec<Appointment> = records
            .values()
            .filter(|a| {
                range.is_unbounded()
                    || crate::interval::overlaps_range(
                        a.start_time,
                        a.end_time,
                        range.start,
                        range.end,
                    )
            })
            .cloned()
            .collect();
        drop(records);

        out.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        out
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.lock();
        if records.remove(id).is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        tracing::info!(id, "Deleted appointment");

        self.save_locked(&records).map_err(|e| {
            tracing::warn!("Deletion applied but snapshot write failed: {}", e);
            e
        })
    }
}

/// Give every occurrence an identifier.
///
/// Blank ids get a fresh one. A caller id on a multi-occurrence series is
/// kept as a prefix with a fresh suffix per occurrence.
fn assign_ids(occurrences: &mut [Appointment]) {
    let series = occurrences.len() > 1;
    for occurrence in occurrences.iter_mut() {
        let base = occurrence.id.trim();
        if base.is_empty() {
            occurrence.id = new_id();
        } else if series {
            occurrence.id = format!("{}-{}", base, new_id());
        } else {
            occurrence.id = base.to_string();
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
