//! The short month and weekday codes users type to filter trips, and the display names used
//! when reporting on derived `Month` and `Weekday` values.
//!
//! The city sources only cover January through June, so only those six months have codes.
//! Weekdays are numbered Monday-first, 0 through 6, matching
//! [chrono::Weekday::num_days_from_monday].

use serde::Serialize;
use std::fmt;

/// The token that means "don't filter" for both months and weekdays.
pub const ALL: &str = "all";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MonthCode {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
}

impl MonthCode {
    pub const ALL_CODES: [MonthCode; 6] = [
        MonthCode::Jan,
        MonthCode::Feb,
        MonthCode::Mar,
        MonthCode::Apr,
        MonthCode::May,
        MonthCode::Jun,
    ];

    /// Case-insensitive lookup of a short token like "jan". Anything else, including "all",
    /// is `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL_CODES.into_iter().find(|m| m.code() == code)
    }

    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL_CODES.into_iter().find(|m| m.number() == number)
    }

    pub fn code(&self) -> &'static str {
        match self {
            MonthCode::Jan => "jan",
            MonthCode::Feb => "feb",
            MonthCode::Mar => "mar",
            MonthCode::Apr => "apr",
            MonthCode::May => "may",
            MonthCode::Jun => "jun",
        }
    }

    /// Calendar month, 1 through 6.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn name(&self) -> &'static str {
        month_name(self.number()).unwrap_or_default()
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WeekdayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekdayCode {
    pub const ALL_CODES: [WeekdayCode; 7] = [
        WeekdayCode::Mon,
        WeekdayCode::Tue,
        WeekdayCode::Wed,
        WeekdayCode::Thu,
        WeekdayCode::Fri,
        WeekdayCode::Sat,
        WeekdayCode::Sun,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL_CODES.into_iter().find(|d| d.code() == code)
    }

    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL_CODES.into_iter().find(|d| d.number() == number)
    }

    pub fn code(&self) -> &'static str {
        match self {
            WeekdayCode::Mon => "mon",
            WeekdayCode::Tue => "tue",
            WeekdayCode::Wed => "wed",
            WeekdayCode::Thu => "thu",
            WeekdayCode::Fri => "fri",
            WeekdayCode::Sat => "sat",
            WeekdayCode::Sun => "sun",
        }
    }

    /// 0 = Monday ... 6 = Sunday
    pub fn number(&self) -> u32 {
        *self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeekdayCode::Mon => "Monday",
            WeekdayCode::Tue => "Tuesday",
            WeekdayCode::Wed => "Wednesday",
            WeekdayCode::Thu => "Thursday",
            WeekdayCode::Fri => "Friday",
            WeekdayCode::Sat => "Saturday",
            WeekdayCode::Sun => "Sunday",
        }
    }
}

impl fmt::Display for WeekdayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Full English name for any calendar month number. Derived `Month` values aren't limited to
/// the six coded months, so reporting goes through this rather than [MonthCode].
pub fn month_name(number: u32) -> Option<&'static str> {
    u8::try_from(number)
        .ok()
        .and_then(|n| chrono::Month::try_from(n).ok())
        .map(|m| m.name())
}

pub fn weekday_name(number: u32) -> Option<&'static str> {
    WeekdayCode::from_number(number).map(|d| d.name())
}

/// The optional month and weekday restriction applied while loading. `None` on either side
/// means that side isn't filtered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TripFilter {
    pub month: Option<MonthCode>,
    pub weekday: Option<WeekdayCode>,
}

impl TripFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(month: Option<MonthCode>, weekday: Option<WeekdayCode>) -> Self {
        Self { month, weekday }
    }

    /// Build a filter from user tokens. "all" and unrecognized tokens both leave that side
    /// unfiltered.
    pub fn from_codes(month: &str, weekday: &str) -> Self {
        Self {
            month: MonthCode::from_code(month),
            weekday: WeekdayCode::from_code(weekday),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.month.is_none() && self.weekday.is_none()
    }

    pub fn matches(&self, month: u32, weekday: u32) -> bool {
        let month_check = self.month.map_or(true, |m| m.number() == month);
        let weekday_check = self.weekday.map_or(true, |d| d.number() == weekday);
        month_check && weekday_check
    }
}

impl fmt::Display for TripFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = self.month.map_or(ALL, |m| m.code());
        let weekday = self.weekday.map_or(ALL, |d| d.code());
        write!(f, "month={month}, day={weekday}")
    }
}
