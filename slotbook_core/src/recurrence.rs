//! Recurrence expansion.
//!
//! Turns one booking request into the concrete occurrences it describes.
//! Expansion is pure: no identifiers are assigned and no state is read.

use crate::{Appointment, Error, Frequency, Result};
use chrono::{DateTime, Days, Duration, Months, Utc};

/// Hard ceiling on occurrences produced by a single booking
pub const MAX_OCCURRENCES: usize = 366;

/// Check the structural preconditions every booking must satisfy
pub fn validate(booking: &Appointment) -> Result<()> {
    if booking.title.trim().is_empty() {
        return Err(Error::BadInput("title is required".into()));
    }
    if booking.start_time >= booking.end_time {
        return Err(Error::BadInput(
            "start time must be before end time".into(),
        ));
    }
    Ok(())
}

/// Expand a booking into its occurrences, in chronological order.
///
/// A non-recurring booking yields itself. A recurring one yields every
/// occurrence whose start is at or before the recurrence end time. Series
/// that reach [`MAX_OCCURRENCES`] are rejected rather than truncated.
pub fn expand(booking: &Appointment) -> Result<Vec<Appointment>> {
    validate(booking)?;

    if booking.recurrence.frequency == Frequency::None {
        return Ok(vec![booking.clone()]);
    }

    let mut out = Vec::with_capacity(16);
    for occurrence in Occurrences::new(booking)?.take(MAX_OCCURRENCES) {
        out.push(occurrence?);
    }

    if out.len() == MAX_OCCURRENCES {
        tracing::debug!(
            title = %booking.title,
            frequency = %booking.recurrence.frequency,
            "recurrence reached the occurrence cap"
        );
        return Err(Error::TooManyOccurrences {
            limit: MAX_OCCURRENCES,
        });
    }
    Ok(out)
}

/// Lazily generated occurrence series.
///
/// Occurrence `k` starts `k` periods after the booking's own start, using
/// calendar arithmetic (month ends clamp, so Jan 31 is followed by Feb 29 and
/// then Mar 31). Every occurrence keeps the booking's duration. The iterator
/// is uncapped; clone it to restart.
#[derive(Clone, Debug)]
pub struct Occurrences<'a> {
    booking: &'a Appointment,
    until: DateTime<Utc>,
    span: Duration,
    index: u32,
    done: bool,
}

impl<'a> Occurrences<'a> {
    pub fn new(booking: &'a Appointment) -> Result<Self> {
        let until = match booking.recurrence.frequency {
            Frequency::None => booking.start_time,
            _ => booking.recurrence.end_time.ok_or_else(|| {
                Error::BadInput("recurring appointment requires a recurrence end time".into())
            })?,
        };
        Ok(Self {
            booking,
            until,
            span: booking.end_time - booking.start_time,
            index: 0,
            done: false,
        })
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<Appointment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let frequency = self.booking.recurrence.frequency;
        if frequency == Frequency::None && self.index > 0 {
            self.done = true;
            return None;
        }

        // Clamping the end on its own could shorten or empty the slot.
        let shifted = shift(self.booking.start_time, frequency, self.index)
            .and_then(|start| Some((start, start.checked_add_signed(self.span)?)));
        let Some((start, end)) = shifted else {
            self.done = true;
            return Some(Err(Error::BadInput(
                "recurrence runs past the supported date range".into(),
            )));
        };

        if start > self.until {
            self.done = true;
            return None;
        }

        self.index += 1;
        let mut occurrence = self.booking.clone();
        occurrence.start_time = start;
        occurrence.end_time = end;
        Some(Ok(occurrence))
    }
}

fn shift(t: DateTime<Utc>, frequency: Frequency, periods: u32) -> Option<DateTime<Utc>> {
    match frequency {
        Frequency::None => Some(t),
        Frequency::Daily => t.checked_add_days(Days::new(u64::from(periods))),
        Frequency::Weekly => t.checked_add_days(Days::new(7 * u64::from(periods))),
        Frequency::Monthly => t.checked_add_months(Months::new(periods)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Recurrence;
    use chrono::TimeZone;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn booking(frequency: Frequency, until: Option<DateTime<Utc>>) -> Appointment {
        Appointment::new("Daily", dt(2025, 3, 1, 9, 0), dt(2025, 3, 1, 9, 30)).with_recurrence(
            Recurrence {
                frequency,
                end_time: until,
            },
        )
    }

    #[test]
    fn test_non_recurring_yields_input() {
        let b = booking(Frequency::None, None).with_id("keep-me");
        let out = expand(&b).unwrap();
        assert_eq!(out, vec![b]);
    }

    #[test]
    fn test_bad_input() {
        let mut b = booking(Frequency::None, None);
        b.title = "   ".into();
        assert!(matches!(expand(&b), Err(Error::BadInput(_))));

        let mut b = booking(Frequency::None, None);
        b.end_time = b.start_time;
        assert!(matches!(expand(&b), Err(Error::BadInput(_))));

        let b = booking(Frequency::Weekly, None);
        assert!(matches!(expand(&b), Err(Error::BadInput(_))));
    }

    #[test]
    fn test_daily_until_end_of_third_day() {
        let b = booking(Frequency::Daily, Some(dt(2025, 3, 3, 23, 59)));
        let out = expand(&b).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].start_time, dt(2025, 3, 3, 9, 0));
        assert_eq!(out[2].end_time, dt(2025, 3, 3, 9, 30));
    }

    #[test]
    fn test_end_boundary_is_inclusive() {
        let b = booking(Frequency::Daily, Some(dt(2025, 3, 5, 9, 0)));
        assert_eq!(expand(&b).unwrap().len(), 5);

        let b = booking(Frequency::Daily, Some(dt(2025, 3, 5, 8, 59)));
        assert_eq!(expand(&b).unwrap().len(), 4);
    }

    #[test]
    fn test_weekly_steps_seven_days() {
        let b = booking(Frequency::Weekly, Some(dt(2025, 3, 31, 0, 0)));
        let starts: Vec<_> = expand(&b).unwrap().iter().map(|o| o.start_time).collect();
        assert_eq!(
            starts,
            vec![
                dt(2025, 3, 1, 9, 0),
                dt(2025, 3, 8, 9, 0),
                dt(2025, 3, 15, 9, 0),
                dt(2025, 3, 22, 9, 0),
                dt(2025, 3, 29, 9, 0),
            ]
        );
    }

    #[test]
    fn test_monthly_clamps_to_month_end_without_drift() {
        let b = Appointment::new("Rent", dt(2024, 1, 31, 12, 0), dt(2024, 1, 31, 13, 0))
            .with_recurrence(Recurrence::repeating(Frequency::Monthly, dt(2024, 4, 30, 0, 0)));
        let starts: Vec<_> = expand(&b).unwrap().iter().map(|o| o.start_time).collect();
        assert_eq!(
            starts,
            vec![
                dt(2024, 1, 31, 12, 0),
                dt(2024, 2, 29, 12, 0),
                dt(2024, 3, 31, 12, 0),
            ]
        );
    }

    #[test]
    fn test_monthly_keeps_duration_across_month_end() {
        let b = Appointment::new("Overnight", dt(2024, 1, 30, 12, 0), dt(2024, 1, 31, 12, 0))
            .with_recurrence(Recurrence::repeating(Frequency::Monthly, dt(2024, 3, 31, 0, 0)));
        let out = expand(&b).unwrap();
        let slots: Vec<_> = out.iter().map(|o| (o.start_time, o.end_time)).collect();
        assert_eq!(
            slots,
            vec![
                (dt(2024, 1, 30, 12, 0), dt(2024, 1, 31, 12, 0)),
                (dt(2024, 2, 29, 12, 0), dt(2024, 3, 1, 12, 0)),
                (dt(2024, 3, 30, 12, 0), dt(2024, 3, 31, 12, 0)),
            ]
        );
        assert!(out.iter().all(|o| o.start_time < o.end_time));
    }

    #[test]
    fn test_exactly_cap_occurrences_is_rejected() {
        // 2025-03-01 through 2026-03-01 inclusive is 366 days
        let b = booking(Frequency::Daily, Some(dt(2026, 3, 1, 9, 0)));
        assert!(matches!(
            expand(&b),
            Err(Error::TooManyOccurrences { limit: MAX_OCCURRENCES })
        ));
        assert_eq!(Occurrences::new(&b).unwrap().count(), MAX_OCCURRENCES);
    }

    #[test]
    fn test_cap_rejects_instead_of_truncating() {
        let b = booking(Frequency::Daily, Some(dt(2027, 1, 1, 0, 0)));
        assert!(matches!(
            expand(&b),
            Err(Error::TooManyOccurrences { limit: 366 })
        ));

        // Exactly one under the cap is fine
        let b = booking(Frequency::Daily, Some(dt(2026, 2, 28, 9, 0)));
        assert_eq!(expand(&b).unwrap().len(), 365);
    }

    #[test]
    fn test_occurrences_iterator_is_restartable() {
        let b = booking(Frequency::Daily, Some(dt(2025, 3, 4, 9, 0)));
        let series = Occurrences::new(&b).unwrap();
        let first: Vec<_> = series.clone().map(|o| o.unwrap().start_time).collect();
        let second: Vec<_> = series.map(|o| o.unwrap().start_time).collect();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_occurrences_keep_caller_id() {
        let b = booking(Frequency::Daily, Some(dt(2025, 3, 2, 9, 0))).with_id("series");
        assert!(expand(&b).unwrap().iter().all(|o| o.id == "series"));
    }
}
