//! Fixed-interval slot grid for one calendar day.
//!
//! Slots are instants aligned to `slot_minutes` boundaries (half-hours by
//! default), starting at 00:00 UTC. Candidate slot strings are parsed with
//! [`parse_slot`], which rejects anything off the grid.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};

use crate::error::{ConfigError, ConfigResult};

/// Default grid spacing in minutes.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// The slot grid for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    date: NaiveDate,
    slot_minutes: u32,
}

impl SlotGrid {
    /// Build a grid, rejecting spacings that do not tile a day evenly.
    pub fn new(date: NaiveDate, slot_minutes: u32) -> ConfigResult<Self> {
        validate_slot_minutes(slot_minutes)?;
        Ok(Self { date, slot_minutes })
    }

    /// A grid with the default half-hour spacing.
    pub fn half_hourly(date: NaiveDate) -> Self {
        Self {
            date,
            slot_minutes: DEFAULT_SLOT_MINUTES,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// Number of slots in the day.
    pub fn len(&self) -> usize {
        (MINUTES_PER_DAY / self.slot_minutes) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First slot of the day (00:00 UTC).
    pub fn start(&self) -> DateTime<Utc> {
        self.date.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// All slot instants of the day, in order.
    pub fn slots(&self) -> Vec<DateTime<Utc>> {
        let step = TimeDelta::minutes(i64::from(self.slot_minutes));
        let start = self.start();
        (0..self.len())
            .map(|i| start + step * i as i32)
            .collect()
    }

    /// True when `at` falls on this day and on a slot boundary.
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        at.date_naive() == self.date && is_aligned(at, self.slot_minutes)
    }
}

/// Reject spacings of zero or ones that do not divide a day.
pub fn validate_slot_minutes(slot_minutes: u32) -> ConfigResult<()> {
    if slot_minutes == 0 || MINUTES_PER_DAY % slot_minutes != 0 {
        return Err(ConfigError::Invalid(format!(
            "slot_minutes must be a positive divisor of {MINUTES_PER_DAY}, got {slot_minutes}"
        )));
    }
    Ok(())
}

/// Whether `at` sits exactly on a `slot_minutes` boundary.
pub fn is_aligned(at: &DateTime<Utc>, slot_minutes: u32) -> bool {
    if slot_minutes == 0 {
        return false;
    }
    at.second() == 0
        && at.nanosecond() == 0
        && (at.hour() * 60 + at.minute()) % slot_minutes == 0
}

/// Parse a slot identifier string.
///
/// Accepts RFC 3339 and naive ISO timestamps. An RFC 3339 offset is
/// applied, so `09:00+02:00` is the instant `07:00Z`, not `09:00Z`; naive
/// timestamps are taken as UTC. Returns `None` when the string is
/// unparseable or the instant is not grid-aligned.
pub fn parse_slot(raw: &str, slot_minutes: u32) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let at = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })?;
    is_aligned(&at, slot_minutes).then_some(at)
}
