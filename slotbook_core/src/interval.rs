//! Half-open interval predicates.
//!
//! Every stored interval is `[start, end)`: an appointment ending exactly
//! when another begins does not overlap it.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

/// Stand-in for an unset upper range bound
pub static FAR_FUTURE: Lazy<DateTime<Utc>> = Lazy::new(|| {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
});

/// True iff `[a_start, a_end)` and `[b_start, b_end)` share any instant.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Range filter used by listings.
///
/// Missing bounds are open-ended. A record touching the range only at a
/// boundary instant is excluded.
pub fn overlaps_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
) -> bool {
    let range_start = range_start.unwrap_or(DateTime::<Utc>::MIN_UTC);
    let range_end = range_end.unwrap_or(*FAR_FUTURE);

    !(end < range_start || start > range_end || end == range_start || start == range_end)
}
