//! Conflict detection between candidate occurrences and committed records.

use crate::interval::overlaps;
use crate::Appointment;
use std::collections::HashSet;

/// Collect every existing record that overlaps at least one candidate.
///
/// Candidates are not compared with each other. Each clashing record is
/// reported once, and the result is sorted ascending by start time.
pub fn find_conflicts<'a, I>(candidates: &[Appointment], existing: I) -> Vec<Appointment>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut seen = HashSet::new();
    let mut conflicts = Vec::new();

    for record in existing {
        let clashes = candidates.iter().any(|c| {
            overlaps(c.start_time, c.end_time, record.start_time, record.end_time)
        });
        if clashes && seen.insert(record.id.as_str()) {
            conflicts.push(record.clone());
        }
    }

    conflicts.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    conflicts
}
