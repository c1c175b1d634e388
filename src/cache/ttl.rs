//! TTL Module
//!
//! Time-to-live expressions and their normalization to integer seconds.
//!
//! A TTL is either absent (stored as `0`, "never expires"), a plain second
//! count, or a calendar [`Interval`]. Intervals are normalized by adding them
//! to a reference instant, so "one month" means 28 to 31 days depending on
//! when the entry is written.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::key::json_type_name;
use crate::error::{CacheError, Result};

// == Clock ==
/// Source of the reference instant used to normalize intervals.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

// == Interval ==
/// A calendar-aware duration, parsed from ISO 8601 text such as `P1M` or `PT10S`.
///
/// Weeks are folded into days when parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Interval {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    /// Points into the past when set
    pub invert: bool,
}

impl Interval {
    pub fn years(years: u32) -> Self {
        Self {
            years,
            ..Self::default()
        }
    }

    pub fn months(months: u32) -> Self {
        Self {
            months,
            ..Self::default()
        }
    }

    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    pub fn hours(hours: u32) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    pub fn minutes(minutes: u32) -> Self {
        Self {
            minutes,
            ..Self::default()
        }
    }

    pub fn seconds(seconds: u32) -> Self {
        Self {
            seconds,
            ..Self::default()
        }
    }

    /// Returns the same interval pointing the other way in time.
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    // == Normalization ==
    /// Seconds between `reference` and `reference` shifted by this interval.
    ///
    /// Negative for inverted intervals. Fails with `InvalidArgument` when the
    /// shifted instant is outside the representable range.
    pub fn seconds_from(&self, reference: DateTime<Utc>) -> Result<i64> {
        let end = if self.invert {
            self.subtract_from(reference)
        } else {
            self.add_to(reference)
        };
        let end = end.ok_or_else(|| {
            CacheError::InvalidArgument(format!("interval {} is out of range", self))
        })?;
        Ok(end.timestamp() - reference.timestamp())
    }

    fn add_to(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (first, overflow) = split_day_of_month(instant)?;
        first
            .checked_add_months(Months::new(self.total_months()?))?
            .checked_add_days(overflow)?
            .checked_add_days(Days::new(u64::from(self.days)))?
            .checked_add_signed(self.clock_part()?)
    }

    fn subtract_from(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (first, overflow) = split_day_of_month(instant)?;
        first
            .checked_sub_months(Months::new(self.total_months()?))?
            .checked_add_days(overflow)?
            .checked_sub_days(Days::new(u64::from(self.days)))?
            .checked_sub_signed(self.clock_part()?)
    }

    fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    fn clock_part(&self) -> Option<TimeDelta> {
        let seconds = i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        TimeDelta::try_seconds(seconds)
    }
}

/// Splits an instant into the first of its month and the days past it.
///
/// Month steps move the first of the month and then add the days back, so a
/// day missing from the target month rolls over into the next one
/// (Jan 31 + 1 month is Mar 2 or Mar 3) instead of clamping.
fn split_day_of_month(instant: DateTime<Utc>) -> Option<(DateTime<Utc>, Days)> {
    let overflow = Days::new(u64::from(instant.day() - 1));
    Some((instant.with_day(1)?, overflow))
}

impl FromStr for Interval {
    type Err = CacheError;

    /// Parses `[-]P[nY][nM][nW][nD][T[nH][nM][nS]]`; a leading `-` inverts.
    fn from_str(text: &str) -> Result<Self> {
        let invalid =
            || CacheError::InvalidArgument(format!("{} is not a valid ISO 8601 interval", text));

        let (invert, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let body = unsigned.strip_prefix('P').ok_or_else(invalid)?;
        let (date, time) = match body.split_once('T') {
            Some((date, time)) => (date, time),
            None => (body, ""),
        };
        if body.ends_with('T') || (date.is_empty() && time.is_empty()) {
            return Err(invalid());
        }

        let mut interval = Interval {
            invert,
            ..Interval::default()
        };

        // Designators must appear at most once and in this order
        let mut rank = 0;
        for (value, designator) in components(date).ok_or_else(invalid)? {
            let next = match designator {
                'Y' => 1,
                'M' => 2,
                'W' => 3,
                'D' => 4,
                _ => return Err(invalid()),
            };
            if next <= rank {
                return Err(invalid());
            }
            rank = next;
            match designator {
                'Y' => interval.years = value,
                'M' => interval.months = value,
                'W' => interval.days = value.checked_mul(7).ok_or_else(invalid)?,
                _ => interval.days = interval.days.checked_add(value).ok_or_else(invalid)?,
            }
        }

        let mut rank = 0;
        for (value, designator) in components(time).ok_or_else(invalid)? {
            let next = match designator {
                'H' => 1,
                'M' => 2,
                'S' => 3,
                _ => return Err(invalid()),
            };
            if next <= rank {
                return Err(invalid());
            }
            rank = next;
            match designator {
                'H' => interval.hours = value,
                'M' => interval.minutes = value,
                _ => interval.seconds = value,
            }
        }

        Ok(interval)
    }
}

/// Splits `12Y3M` into `[(12, 'Y'), (3, 'M')]`.
fn components(text: &str) -> Option<Vec<(u32, char)>> {
    let mut parsed = Vec::new();
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        let digits = &text[start..index];
        if digits.is_empty() {
            return None;
        }
        parsed.push((digits.parse().ok()?, c));
        start = index + c.len_utf8();
    }
    // Trailing digits without a designator
    if start != text.len() {
        return None;
    }
    Some(parsed)
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invert {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        for (value, designator) in [(self.years, 'Y'), (self.months, 'M'), (self.days, 'D')] {
            if value > 0 {
                write!(f, "{}{}", value, designator)?;
            }
        }
        let time = [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')];
        if time.iter().any(|(value, _)| *value > 0) {
            write!(f, "T")?;
            for (value, designator) in time {
                if value > 0 {
                    write!(f, "{}{}", value, designator)?;
                }
            }
        } else if self.years == 0 && self.months == 0 && self.days == 0 {
            write!(f, "T0S")?;
        }
        Ok(())
    }
}

// == TTL ==
/// A time-to-live as accepted by the cache facade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ttl {
    /// No expiry; normalized to `0`
    #[default]
    Forever,
    /// Plain seconds, passed through unchanged
    Seconds(i64),
    /// Calendar interval, normalized against a reference instant
    Interval(Interval),
}

impl Ttl {
    /// Normalizes to the integer seconds handed to a driver.
    pub fn to_seconds(&self, reference: DateTime<Utc>) -> Result<i64> {
        match self {
            Ttl::Forever => Ok(0),
            Ttl::Seconds(seconds) => Ok(*seconds),
            Ttl::Interval(interval) => interval.seconds_from(reference),
        }
    }
}

impl From<Interval> for Ttl {
    fn from(interval: Interval) -> Self {
        Ttl::Interval(interval)
    }
}

// == TTL Argument ==
/// An argument that may be used as a TTL.
pub trait TtlArg {
    /// Converts into a [`Ttl`], or returns the name of the type actually given.
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str>;
}

impl TtlArg for Ttl {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        Ok(self)
    }
}

impl TtlArg for Interval {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        Ok(Ttl::Interval(self))
    }
}

impl TtlArg for TimeDelta {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        Ok(Ttl::Seconds(self.num_seconds()))
    }
}

impl TtlArg for i64 {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        Ok(Ttl::Seconds(self))
    }
}

impl TtlArg for i32 {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        Ok(Ttl::Seconds(i64::from(self)))
    }
}

impl TtlArg for u32 {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        Ok(Ttl::Seconds(i64::from(self)))
    }
}

impl<T: TtlArg> TtlArg for Option<T> {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        match self {
            Some(ttl) => ttl.into_ttl(),
            None => Ok(Ttl::Forever),
        }
    }
}

impl TtlArg for &Value {
    /// `null`, an integer, or an ISO 8601 interval string.
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        match self {
            Value::Null => Ok(Ttl::Forever),
            Value::Number(n) => n.as_i64().map(Ttl::Seconds).ok_or(json_type_name(self)),
            Value::String(text) => text
                .parse::<Interval>()
                .map(Ttl::Interval)
                .map_err(|_| "string"),
            other => Err(json_type_name(other)),
        }
    }
}

impl TtlArg for Value {
    fn into_ttl(self) -> std::result::Result<Ttl, &'static str> {
        (&self).into_ttl()
    }
}
