//! Calendar fields derived from `created_at`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};

use crate::TweetsError;

/// The time fields attached to an enriched post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostTime {
    /// Local wall-clock time, truncated to whole seconds.
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    /// Hour of day, 0-23.
    pub hour: u32,
}

/// Builds the fixed offset for `hours` east of UTC.
///
/// # Errors
///
/// Returns [`TweetsError::InvalidUtcOffset`] outside +/-23 hours.
pub fn utc_offset(hours: i32) -> Result<FixedOffset, TweetsError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or(TweetsError::InvalidUtcOffset { hours })
}

/// Converts milliseconds since the epoch to whole seconds (floor division)
/// and derives the wall-clock timestamp, date and hour at `offset`.
///
/// Returns `None` when the instant is outside chrono's range.
#[must_use]
pub fn post_time(created_at_ms: i64, offset: FixedOffset) -> Option<PostTime> {
    let seconds = created_at_ms.div_euclid(1000);
    let timestamp = DateTime::from_timestamp(seconds, 0)?
        .with_timezone(&offset)
        .naive_local();

    Some(PostTime {
        timestamp,
        date: timestamp.date(),
        hour: timestamp.hour(),
    })
}
