//! Dates that fit into the payload of a `ValueId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const YEAR_OFFSET: i32 = 10_000;
const SECOND_BITS: u32 = 6;
const MINUTE_BITS: u32 = 6;
const HOUR_BITS: u32 = 5;
const DAY_BITS: u32 = 5;
const MONTH_BITS: u32 = 4;
const YEAR_BITS: u32 = 15;

/// Number of payload bits a packed date occupies.
pub const DATE_BITS: u32 =
    SECOND_BITS + MINUTE_BITS + HOUR_BITS + DAY_BITS + MONTH_BITS + YEAR_BITS;

/// Errors raised when constructing a `Date` from out-of-range components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Year {0} is outside of the supported range -9999..=9999")]
    YearOutOfRange(i32),

    #[error("Invalid {component}: {value}")]
    InvalidComponent { component: &'static str, value: u8 },
}

/// A calendar date with a time of day, second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Date {
    /// Creates a date at midnight.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, DateError> {
        Self::with_time(year, month, day, 0, 0, 0)
    }

    /// Creates a date with a time of day.
    pub fn with_time(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateError> {
        if !(-9999..=9999).contains(&year) {
            return Err(DateError::YearOutOfRange(year));
        }
        let checks: [(&'static str, u8, u8, u8); 5] = [
            ("month", month, 1, 12),
            ("day", day, 1, 31),
            ("hour", hour, 0, 23),
            ("minute", minute, 0, 59),
            ("second", second, 0, 59),
        ];
        for (component, value, low, high) in checks {
            if value < low || value > high {
                return Err(DateError::InvalidComponent { component, value });
            }
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Packs the date into its low `DATE_BITS` bits. The packed values order
    /// the same way the dates do.
    pub fn to_bits(&self) -> u64 {
        let mut bits = (self.year + YEAR_OFFSET) as u64;
        bits = (bits << MONTH_BITS) | u64::from(self.month);
        bits = (bits << DAY_BITS) | u64::from(self.day);
        bits = (bits << HOUR_BITS) | u64::from(self.hour);
        bits = (bits << MINUTE_BITS) | u64::from(self.minute);
        (bits << SECOND_BITS) | u64::from(self.second)
    }

    /// Inverse of `to_bits`. Returns an error if the bits do not describe a
    /// valid date.
    pub fn from_bits(bits: u64) -> Result<Self, DateError> {
        let take = |bits: &mut u64, width: u32| -> u8 {
            let value = (*bits & ((1 << width) - 1)) as u8;
            *bits >>= width;
            value
        };
        let mut rest = bits;
        let second = take(&mut rest, SECOND_BITS);
        let minute = take(&mut rest, MINUTE_BITS);
        let hour = take(&mut rest, HOUR_BITS);
        let day = take(&mut rest, DAY_BITS);
        let month = take(&mut rest, MONTH_BITS);
        let year = (rest & ((1 << YEAR_BITS) - 1)) as i32 - YEAR_OFFSET;
        Self::with_time(year, month, day, hour, minute, second)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year < 0 {
            write!(f, "-{:04}", -self.year)?;
        } else {
            write!(f, "{:04}", self.year)?;
        }
        write!(
            f,
            "-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
