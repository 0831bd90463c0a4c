//! Timestamps and the human-readable formats used in player-facing messages.

use std::fmt;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// `Mon Jan  2 15:04:05 2006`
const ANSI_C: &[FormatItem<'_>] = format_description!(
    "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
);

/// `2006-01-02 15:04:05`
const DATE_TIME: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// A UTC point in time.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    serde::Serialize,
    serde::Deserialize,
    sqlx::Type,
)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "utoipa", schema(value_type = String, format = DateTime))]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Formats this timestamp like C's `asctime(3)`, e.g. `Mon Jan  2 15:04:05 2006`.
    pub fn to_ansi_c(self) -> String {
        self.format(ANSI_C)
    }

    /// Formats this timestamp as `2006-01-02 15:04:05`.
    pub fn to_date_time(self) -> String {
        self.format(DATE_TIME)
    }

    /// Moves this timestamp `years` calendar years forward.
    ///
    /// February 29th becomes March 1st if the target year is not a leap year.
    pub fn add_years(self, years: i32) -> Self {
        let target = self.0.year().saturating_add(years);

        match self.0.replace_year(target) {
            Ok(moved) => Self(moved),
            Err(_) => Self(
                self.0
                    .saturating_sub(Duration::days(1))
                    .replace_year(target)
                    .map_or(self.0, |moved| moved.saturating_add(Duration::days(1))),
            ),
        }
    }

    fn format(self, description: &[FormatItem<'_>]) -> String {
        // The format descriptions above only contain components every `OffsetDateTime` has.
        self.0
            .to_offset(time::UtcOffset::UTC)
            .format(description)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, duration: Duration) -> Self::Output {
        Self(self.0.saturating_add(duration))
    }
}

impl std::ops::Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, duration: Duration) -> Self::Output {
        Self(self.0.saturating_sub(duration))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, fmt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&time::format_description::well_known::Rfc3339) {
            Ok(formatted) => fmt.write_str(&formatted),
            Err(_) => write!(fmt, "{}", self.0.unix_timestamp()),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn formats_ansi_c_with_padded_day() {
        let ts = Timestamp::from(datetime!(2006-01-02 15:04:05 UTC));

        assert_eq!(ts.to_ansi_c(), "Mon Jan  2 15:04:05 2006");
        assert_eq!(ts.to_date_time(), "2006-01-02 15:04:05");
    }

    #[test]
    fn adds_calendar_years() {
        let ts = Timestamp::from(datetime!(2024-06-01 12:00:00 UTC));
        assert_eq!(ts.add_years(5), Timestamp::from(datetime!(2029-06-01 12:00:00 UTC)));

        let leap_day = Timestamp::from(datetime!(2024-02-29 00:00:00 UTC));
        assert_eq!(leap_day.add_years(1), Timestamp::from(datetime!(2025-03-01 00:00:00 UTC)));
    }
}
