//! Simulation calendar and speed control.
//!
//! The calendar is pure: every date is derived from the absolute day
//! index, nothing else is stored. One tick = one in-game day.

use crate::types::Day;
use serde::{Deserialize, Serialize};

pub const DAYS_PER_YEAR: Day = 365;

const MONTH_LENGTHS: [Day; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Day index of March 1, year 1. New games start here.
pub const STARTING_DAY: Day = 59;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5  => Self::Spring,
            6..=8  => Self::Summer,
            9..=11 => Self::Fall,
            _      => Self::Winter,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall   => "Fall",
            Self::Winter => "Winter",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarDate {
    /// 1-based day of month.
    pub day_of_month: u32,
    /// 1..=12
    pub month: u32,
    pub season: Season,
    /// 1-based year.
    pub year: u32,
    /// 0-based day within the year.
    pub day_of_year: u32,
}

impl CalendarDate {
    pub fn from_day(day: Day) -> Self {
        let year = day / DAYS_PER_YEAR + 1;
        let day_of_year = day % DAYS_PER_YEAR;

        let mut remaining = day_of_year;
        let mut month = 1;
        for len in MONTH_LENGTHS {
            if remaining < len {
                break;
            }
            remaining -= len;
            month += 1;
        }

        Self {
            day_of_month: remaining + 1,
            month,
            season: Season::from_month(month),
            year,
            day_of_year,
        }
    }

    /// Inverse of `from_day`.
    pub fn to_day(&self) -> Day {
        let month_offset: Day = MONTH_LENGTHS[..(self.month - 1) as usize].iter().sum();
        (self.year - 1) * DAYS_PER_YEAR + month_offset + self.day_of_month - 1
    }
}

/// True when `month` falls inside [start, end]. Windows may wrap year-end
/// (e.g. start = 10, end = 1 covers Oct..Jan).
pub fn month_in_window(month: u32, start: u32, end: u32) -> bool {
    if start <= end {
        (start..=end).contains(&month)
    } else {
        month >= start || month <= end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    #[default]
    Paused,
    Normal,
    Fast,
    Fastest,
}

impl SimSpeed {
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Host pacing hint. The core never reads wall-clock time.
    pub fn ticks_per_real_second(&self) -> u32 {
        match self {
            Self::Paused  => 0,
            Self::Normal  => 1,
            Self::Fast    => 4,
            Self::Fastest => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_day_is_march_first() {
        let date = CalendarDate::from_day(STARTING_DAY);
        assert_eq!((date.month, date.day_of_month, date.year), (3, 1, 1));
        assert_eq!(date.season, Season::Spring);
    }

    #[test]
    fn year_rolls_over_after_december_31() {
        let dec31 = CalendarDate::from_day(364);
        assert_eq!((dec31.month, dec31.day_of_month, dec31.year), (12, 31, 1));
        let jan1 = CalendarDate::from_day(365);
        assert_eq!((jan1.month, jan1.day_of_month, jan1.year), (1, 1, 2));
        assert_eq!(jan1.season, Season::Winter);
    }

    #[test]
    fn to_day_inverts_from_day() {
        for day in [0, 31, 58, 59, 180, 364, 365, 4000, 10_949] {
            assert_eq!(CalendarDate::from_day(day).to_day(), day);
        }
    }

    #[test]
    fn wrapping_window() {
        assert!(month_in_window(11, 10, 1));
        assert!(month_in_window(1, 10, 1));
        assert!(!month_in_window(2, 10, 1));
        assert!(month_in_window(4, 3, 6));
        assert!(!month_in_window(7, 3, 6));
    }
}
