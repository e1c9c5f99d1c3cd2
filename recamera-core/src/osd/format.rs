//! Date and time rendering for the OSD clock

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Smallest automatic font size in pixels
pub const MIN_AUTO_FONT_SIZE: f64 = 16.0;
/// Largest automatic font size in pixels
pub const MAX_AUTO_FONT_SIZE: f64 = 64.0;
/// Automatic font size as a fraction of container width
pub const AUTO_FONT_SCALE: f64 = 0.03;

/// Date layout, named after the device's `sDateStyle` values
///
/// `CHR-*` styles separate fields with `-`, `NUM-*` styles with `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateStyle {
    /// `CHR-YYYY-MM-DD`
    #[default]
    ChrYearMonthDay,
    /// `CHR-DD-MM-YYYY`
    ChrDayMonthYear,
    /// `CHR-MM-DD-YYYY`
    ChrMonthDayYear,
    /// `NUM-YYYY-MM-DD`
    NumYearMonthDay,
    /// `NUM-DD-MM-YYYY`
    NumDayMonthYear,
    /// `NUM-MM-DD-YYYY`
    NumMonthDayYear,
}

impl DateStyle {
    /// Device name of the style
    pub fn as_str(&self) -> &'static str {
        match self {
            DateStyle::ChrYearMonthDay => "CHR-YYYY-MM-DD",
            DateStyle::ChrDayMonthYear => "CHR-DD-MM-YYYY",
            DateStyle::ChrMonthDayYear => "CHR-MM-DD-YYYY",
            DateStyle::NumYearMonthDay => "NUM-YYYY-MM-DD",
            DateStyle::NumDayMonthYear => "NUM-DD-MM-YYYY",
            DateStyle::NumMonthDayYear => "NUM-MM-DD-YYYY",
        }
    }

    fn separator(&self) -> char {
        match self {
            DateStyle::ChrYearMonthDay | DateStyle::ChrDayMonthYear | DateStyle::ChrMonthDayYear => '-',
            _ => '.',
        }
    }
}

impl From<String> for DateStyle {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CHR-DD-MM-YYYY" => DateStyle::ChrDayMonthYear,
            "CHR-MM-DD-YYYY" => DateStyle::ChrMonthDayYear,
            "NUM-YYYY-MM-DD" => DateStyle::NumYearMonthDay,
            "NUM-DD-MM-YYYY" => DateStyle::NumDayMonthYear,
            "NUM-MM-DD-YYYY" => DateStyle::NumMonthDayYear,
            // Unknown styles render like the default
            _ => DateStyle::ChrYearMonthDay,
        }
    }
}

impl From<DateStyle> for String {
    fn from(style: DateStyle) -> Self {
        style.as_str().to_string()
    }
}

/// Clock style, named after the device's `sTimeStyle` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeStyle {
    /// `24hour`
    #[default]
    TwentyFourHour,
    /// `12hour`
    TwelveHour,
}

impl From<String> for TimeStyle {
    fn from(value: String) -> Self {
        if value == "12hour" {
            TimeStyle::TwelveHour
        } else {
            TimeStyle::TwentyFourHour
        }
    }
}

impl From<TimeStyle> for String {
    fn from(style: TimeStyle) -> Self {
        match style {
            TimeStyle::TwentyFourHour => "24hour".to_string(),
            TimeStyle::TwelveHour => "12hour".to_string(),
        }
    }
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Format the date part, optionally followed by the weekday
pub fn format_date(now: &NaiveDateTime, style: DateStyle, show_weekday: bool) -> String {
    let sep = style.separator();
    let year = format!("{:04}", now.year());
    let month = format!("{:02}", now.month());
    let day = format!("{:02}", now.day());

    let fields = match style {
        DateStyle::ChrYearMonthDay | DateStyle::NumYearMonthDay => [year, month, day],
        DateStyle::ChrDayMonthYear | DateStyle::NumDayMonthYear => [day, month, year],
        DateStyle::ChrMonthDayYear | DateStyle::NumMonthDayYear => [month, day, year],
    };
    let mut out = fields.join(&sep.to_string());

    if show_weekday {
        out.push(' ');
        out.push_str(weekday_abbrev(now.weekday()));
    }
    out
}

/// Format the time part
pub fn format_time(now: &NaiveDateTime, style: TimeStyle) -> String {
    match style {
        TimeStyle::TwentyFourHour => format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second()),
        TimeStyle::TwelveHour => {
            let (pm, hour) = now.hour12();
            format!(
                "{}:{:02}:{:02} {}",
                hour,
                now.minute(),
                now.second(),
                if pm { "PM" } else { "AM" }
            )
        }
    }
}

/// Full overlay text: date, then time, separated by a space
pub fn format_date_time(now: &NaiveDateTime, date: DateStyle, time: TimeStyle, show_weekday: bool) -> String {
    format!("{} {}", format_date(now, date, show_weekday), format_time(now, time))
}

/// Pixel font size for a configured size and container width
pub fn resolve_font_size(configured: u32, container_width: f64) -> f64 {
    if configured == super::settings::AUTO_FONT_SIZE {
        (container_width * AUTO_FONT_SCALE).clamp(MIN_AUTO_FONT_SIZE, MAX_AUTO_FONT_SIZE)
    } else {
        f64::from(configured)
    }
}
