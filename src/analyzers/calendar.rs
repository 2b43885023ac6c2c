//! Calendar bucket keys derived from an order's local timestamp.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Weekday names indexed from Sunday = 0.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// `YYYY-MM`
pub fn month_key(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m").to_string()
}

/// `YYYY-Qn` with n = floor(month0 / 3) + 1
pub fn quarter_key(dt: &NaiveDateTime) -> String {
    format!("{}-Q{}", dt.year(), dt.month0() / 3 + 1)
}

/// `YYYY-MM-DD`
pub fn day_label(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

pub fn weekday_index(dt: &NaiveDateTime) -> usize {
    dt.weekday().num_days_from_sunday() as usize
}

pub fn weekday_name(dt: &NaiveDateTime) -> &'static str {
    WEEKDAY_NAMES[weekday_index(dt)]
}

pub fn hour(dt: &NaiveDateTime) -> usize {
    dt.hour() as usize
}

pub fn hour_label(hour: usize) -> String {
    format!("{:02}:00", hour)
}

/// `ceil((day_of_month + weekday index of the 1st) / 7)`, so the first
/// calendar row of the month is week 1. Ranges over 1..=6.
pub fn week_of_month(dt: &NaiveDateTime) -> usize {
    let day = dt.day() as usize;
    let weekday = weekday_index(dt);
    let first_weekday = (weekday + 7 - (day - 1) % 7) % 7;
    (day + first_weekday - 1) / 7 + 1
}

/// Fixed four-way split of the day used for time-of-day preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBand {
    LateNight,
    Morning,
    Afternoon,
    Night,
}

impl TimeBand {
    pub const ALL: [TimeBand; 4] = [
        TimeBand::LateNight,
        TimeBand::Morning,
        TimeBand::Afternoon,
        TimeBand::Night,
    ];

    pub fn from_hour(hour: usize) -> Self {
        match hour {
            0..=5 => TimeBand::LateNight,
            6..=11 => TimeBand::Morning,
            12..=17 => TimeBand::Afternoon,
            _ => TimeBand::Night,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeBand::LateNight => "Late Night (12AM-6AM)",
            TimeBand::Morning => "Morning (6AM-12PM)",
            TimeBand::Afternoon => "Afternoon (12PM-6PM)",
            TimeBand::Night => "Night (6PM-12AM)",
        }
    }

    pub fn index(self) -> usize {
        match self {
            TimeBand::LateNight => 0,
            TimeBand::Morning => 1,
            TimeBand::Afternoon => 2,
            TimeBand::Night => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_month_and_quarter_keys() {
        assert_eq!(month_key(&dt(2024, 1, 15, 9)), "2024-01");
        assert_eq!(quarter_key(&dt(2024, 1, 15, 9)), "2024-Q1");
        assert_eq!(quarter_key(&dt(2024, 3, 31, 9)), "2024-Q1");
        assert_eq!(quarter_key(&dt(2024, 4, 1, 9)), "2024-Q2");
        assert_eq!(quarter_key(&dt(2023, 12, 1, 9)), "2023-Q4");
    }

    #[test]
    fn test_weekday_counts_from_sunday() {
        // 2024-06-02 was a Sunday
        assert_eq!(weekday_index(&dt(2024, 6, 2, 0)), 0);
        assert_eq!(weekday_name(&dt(2024, 6, 2, 0)), "Sunday");
        assert_eq!(weekday_name(&dt(2024, 6, 8, 0)), "Saturday");
    }

    #[test]
    fn test_week_of_month() {
        // June 2024 starts on a Saturday (index 6)
        assert_eq!(week_of_month(&dt(2024, 6, 1, 0)), 1);
        assert_eq!(week_of_month(&dt(2024, 6, 2, 0)), 2);
        assert_eq!(week_of_month(&dt(2024, 6, 30, 0)), 6);
        // September 2024 starts on a Sunday (index 0)
        assert_eq!(week_of_month(&dt(2024, 9, 7, 0)), 1);
        assert_eq!(week_of_month(&dt(2024, 9, 8, 0)), 2);
        assert_eq!(week_of_month(&dt(2024, 9, 30, 0)), 5);
    }

    #[test]
    fn test_time_band_boundaries() {
        assert_eq!(TimeBand::from_hour(0), TimeBand::LateNight);
        assert_eq!(TimeBand::from_hour(5), TimeBand::LateNight);
        assert_eq!(TimeBand::from_hour(6), TimeBand::Morning);
        assert_eq!(TimeBand::from_hour(12), TimeBand::Afternoon);
        assert_eq!(TimeBand::from_hour(18), TimeBand::Night);
        assert_eq!(TimeBand::from_hour(23), TimeBand::Night);
    }
}
