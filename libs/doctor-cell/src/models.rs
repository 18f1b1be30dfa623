use std::fmt;

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub type DoctorId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialty: String,
    pub qualification: String,
    pub location: String,
    pub phone: String,
    pub email: String,
    pub timing: TimingWindow,
    pub fee: u32,
    pub rating: f32,
    pub experience_years: u32,
}

impl Doctor {
    pub fn offers_slot(&self, time: NaiveTime) -> bool {
        self.timing.offers(time)
    }
}

/// Daily consulting hours, cut into fixed-width slots starting at `opens_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindow {
    #[serde(with = "clock_time")]
    pub opens_at: NaiveTime,
    #[serde(with = "clock_time")]
    pub closes_at: NaiveTime,
    pub slot_minutes: u32,
}

impl TimingWindow {
    pub fn new(opens_at: NaiveTime, closes_at: NaiveTime, slot_minutes: u32) -> Self {
        Self { opens_at, closes_at, slot_minutes }
    }

    /// Slot start times; a slot is offered only if it ends by closing time.
    pub fn offered_slots(&self) -> Vec<NaiveTime> {
        let mut slots = Vec::new();
        if self.slot_minutes == 0 || self.closes_at <= self.opens_at {
            return slots;
        }

        let width = Duration::minutes(self.slot_minutes as i64);
        let mut start = self.opens_at;
        // NaiveTime arithmetic wraps at midnight, so compare in seconds.
        while start.num_seconds_from_midnight() as i64 + width.num_seconds()
            <= self.closes_at.num_seconds_from_midnight() as i64
        {
            slots.push(start);
            start += width;
        }

        slots
    }

    pub fn offers(&self, time: NaiveTime) -> bool {
        self.offered_slots().contains(&time)
    }
}

impl fmt::Display for TimingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.opens_at.format("%-I:%M %p"),
            self.closes_at.format("%-I:%M %p")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorSortKey {
    Name,
    Rating,
    Experience,
    Fee,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialty: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<DoctorSortKey>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor {0} not found")]
    NotFound(DoctorId),

    #[error("Doctor catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// `HH:MM` wire format for times of day. Accepts `HH:MM:SS` on input.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(value: &str) -> Result<NaiveTime, chrono::ParseError> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| de::Error::custom(format!("invalid time {:?}: {}", raw, e)))
    }
}
