use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar quarter label, `⌈month / 3⌉`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn of(date: Date) -> Self {
        match (u8::from(date.month()) + 2) / 3 {
            1 => Self::Q1,
            2 => Self::Q2,
            3 => Self::Q3,
            _ => Self::Q4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            _ => None,
        }
    }
}

impl Display for Quarter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `YYYY-MM-DD` date, the format used by SEC filings and settings.
pub fn parse_iso_date(value: &str) -> Result<Date, ValidationError> {
    Date::parse(value.trim(), ISO_DATE).map_err(|_| ValidationError::InvalidDate {
        value: value.to_owned(),
    })
}

pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| format!("{}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

/// Shifts `date` back by whole months, clamping the day to the target month's
/// length (2023-12-31 minus one month is 2023-11-30).
pub fn months_back(date: Date, months: u32) -> Date {
    let total = date.year() * 12 + i32::from(u8::from(date.month()) - 1) - months as i32;
    let year = total.div_euclid(12);
    let month = Month::try_from((total.rem_euclid(12) + 1) as u8).unwrap_or(Month::January);
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let first = date.replace_day(1).unwrap_or(date);
    let last_day = date.month().length(date.year());
    let last = date.replace_day(last_day).unwrap_or(date);
    (first, last)
}

/// Half-open `[start, end)` date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyDateRange {
                start: format_iso_date(start),
                end: format_iso_date(end),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn quarter_is_ceiling_of_month_over_three() {
        assert_eq!(Quarter::of(date!(2024 - 01 - 15)), Quarter::Q1);
        assert_eq!(Quarter::of(date!(2024 - 03 - 31)), Quarter::Q1);
        assert_eq!(Quarter::of(date!(2024 - 04 - 01)), Quarter::Q2);
        assert_eq!(Quarter::of(date!(2024 - 09 - 30)), Quarter::Q3);
        assert_eq!(Quarter::of(date!(2024 - 12 - 31)), Quarter::Q4);
    }

    #[test]
    fn months_back_clamps_day() {
        assert_eq!(months_back(date!(2023 - 12 - 31), 1), date!(2023 - 11 - 30));
        assert_eq!(months_back(date!(2023 - 12 - 31), 10), date!(2023 - 02 - 28));
        assert_eq!(months_back(date!(2023 - 01 - 31), 1), date!(2022 - 12 - 31));
        assert_eq!(months_back(date!(2023 - 12 - 31), 143), date!(2012 - 01 - 31));
    }

    #[test]
    fn month_bounds_follow_leap_years() {
        assert_eq!(
            month_bounds(date!(2024 - 02 - 10)),
            (date!(2024 - 02 - 01), date!(2024 - 02 - 29))
        );
        assert_eq!(month_bounds(date!(2023 - 02 - 28)).1, date!(2023 - 02 - 28));
        assert_eq!(months_back(date!(2024 - 03 - 31), 1), date!(2024 - 02 - 29));
    }

    #[test]
    fn round_trips_iso_dates() {
        let parsed = parse_iso_date("2020-04-20").expect("date");
        assert_eq!(format_iso_date(parsed), "2020-04-20");
        assert!(matches!(
            parse_iso_date("20/04/2020"),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn rejects_empty_range() {
        let err = DateRange::new(date!(2024 - 01 - 02), date!(2024 - 01 - 02)).expect_err("empty");
        assert!(matches!(err, ValidationError::EmptyDateRange { .. }));
    }
}
