//! Resolving "today" in the user's IANA timezone.
//!
//! Month windows are anchored at a calendar date, so which day "today" is
//! depends on the user's timezone, not the server's.

use time::{Date, OffsetDateTime};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current calendar date in `canonical_timezone` (an IANA name such as
/// "Australia/Melbourne").
///
/// # Errors
///
/// Returns [Error::InvalidTimezone] if the name is not a known IANA timezone.
pub fn local_date_in(canonical_timezone: &str) -> Result<Date, Error> {
    let timezone = time_tz::timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))?;

    let now = OffsetDateTime::now_utc();
    let offset = timezone.get_offset_utc(&now).to_utc();

    Ok(now.to_offset(offset).date())
}
