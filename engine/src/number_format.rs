//! FILENAME: engine/src/number_format.rs
//! PURPOSE: Renders cell values to their display strings.
//! CONTEXT: This module converts raw cell contents to formatted text based
//! on the cell's DataFormat and FormatStyle. Date, time and datetime
//! formats interpret the number as an Excel-style serial: the integer part
//! counts days since 1900-01-01 (serial 1), the fraction is the part of
//! the day elapsed. The phantom 1900 leap day is absorbed at serial 60.
//! All formatters return owned strings.

use crate::cell::{Cell, CellContent, CellError};
use crate::style::{DataFormat, FormatStyle};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Renders a cell to its display string.
pub fn format_cell_value(cell: &Cell) -> String {
    let value = match &cell.content {
        CellContent::Empty => return String::new(),
        CellContent::Text(s) => return s.clone(),
        CellContent::Number(n) => *n,
        CellContent::Formula { error: Some(e), .. } => return error_display(*e).to_string(),
        CellContent::Formula {
            is_text_result: true,
            cached_text: Some(text),
            ..
        } => return text.clone(),
        CellContent::Formula { cached_value, .. } => *cached_value,
    };

    match cell.format {
        DataFormat::Percentage => format_percentage(value, cell.precision),
        DataFormat::Currency => format_currency(value),
        DataFormat::Date => format_date(value, cell.format_style),
        DataFormat::Time => format_time(value, cell.format_style),
        DataFormat::DateTime => format_datetime(value, cell.format_style),
        DataFormat::General | DataFormat::Number => format_general(value, cell.precision),
    }
}

/// The display string for a formula error kind.
pub fn error_display(error: CellError) -> &'static str {
    match error {
        CellError::DivZero => "#DIV/0!",
        CellError::Ref => "#REF!",
        CellError::Value => "#VALUE!",
        CellError::Parse => "#PARSE!",
        CellError::Na => "#N/A!",
    }
}

/// General/number formatting: fixed precision with trailing zeros (and a
/// bare trailing decimal point) stripped.
pub fn format_general(value: f64, precision: usize) -> String {
    let mut formatted = format!("{:.*}", precision, value);
    if formatted.contains('.') {
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
    }
    formatted
}

/// Percentage formatting: value x 100 with the cell's precision and a % suffix.
pub fn format_percentage(value: f64, precision: usize) -> String {
    format!("{:.*}%", precision, value * 100.0)
}

/// Currency formatting: $ prefix, two decimal places, negatives as -$amount.
pub fn format_currency(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        format!("${:.2}", value)
    }
}

/// Date formatting from a serial number.
pub fn format_date(value: f64, style: FormatStyle) -> String {
    let (year, month, day) = match serial_to_ymd(value.floor() as i64) {
        Some(ymd) => ymd,
        None => return "#DATE!".to_string(),
    };
    let mon = MONTH_NAMES[(month - 1) as usize];

    match style {
        FormatStyle::MonthDayYear => format!("{:02}/{:02}/{:04}", month, day, year),
        FormatStyle::DayMonthYear => format!("{:02}/{:02}/{:04}", day, month, year),
        FormatStyle::YearMonthDay => format!("{:04}-{:02}-{:02}", year, month, day),
        FormatStyle::MonthNameDayYear => format!("{} {:02}, {:04}", mon, day, year),
        FormatStyle::DayMonthNameYear => format!("{:02} {} {:04}", day, mon, year),
        FormatStyle::YearMonthNameDay => format!("{:04} {} {:02}", year, mon, day),
        FormatStyle::ShortDate => format!("{:02}/{:02}/{:02}", month, day, year % 100),
        _ => format!("{:04}-{:02}-{:02}", year, month, day),
    }
}

/// Time formatting from the fractional part of a serial number.
pub fn format_time(value: f64, style: FormatStyle) -> String {
    let (hours, minutes, seconds) = serial_to_hms(value);

    match style {
        FormatStyle::Hour12 => {
            let (display_hours, am_pm) = to_12_hour(hours);
            format!("{}:{:02} {}", display_hours, minutes, am_pm)
        }
        FormatStyle::Hour12Seconds => {
            let (display_hours, am_pm) = to_12_hour(hours);
            format!("{}:{:02}:{:02} {}", display_hours, minutes, seconds, am_pm)
        }
        FormatStyle::Hour24Seconds => format!("{:02}:{:02}:{:02}", hours, minutes, seconds),
        _ => format!("{:02}:{:02}", hours, minutes),
    }
}

/// Combined datetime formatting.
pub fn format_datetime(value: f64, style: FormatStyle) -> String {
    let (year, month, day) = match serial_to_ymd(value.floor() as i64) {
        Some(ymd) => ymd,
        None => return "#DATE!".to_string(),
    };
    let (hours, minutes, seconds) = serial_to_hms(value);

    match style {
        FormatStyle::DateTimeShort => {
            let (display_hours, am_pm) = to_12_hour(hours);
            format!(
                "{}/{}/{:02} {}:{:02} {}",
                month,
                day,
                year % 100,
                display_hours,
                minutes,
                am_pm
            )
        }
        FormatStyle::DateTimeLong => {
            let (display_hours, am_pm) = to_12_hour(hours);
            format!(
                "{} {:02}, {:04} {}:{:02}:{:02} {}",
                MONTH_NAMES[(month - 1) as usize],
                day,
                year,
                display_hours,
                minutes,
                seconds,
                am_pm
            )
        }
        FormatStyle::DateTimeIso => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            year, month, day, hours, minutes, seconds
        ),
        // Any other style falls back to the default date + 12-hour time
        _ => {
            let (display_hours, am_pm) = to_12_hour(hours);
            format!(
                "{:02}/{:02}/{:04} {}:{:02} {}",
                month, day, year, display_hours, minutes, am_pm
            )
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Converts a serial day count to a (year, month, day) civil date.
///
/// Serial 1 is 1900-01-01. Serial 60 is the inherited phantom leap day
/// (Excel's 1900-02-29); serials at or past it are shifted down by one so
/// that serial 61 lands on 1900-03-01. Returns None for serials before 1
/// or dates past year 9999.
fn serial_to_ymd(serial: i64) -> Option<(i32, u32, u32)> {
    if serial < 1 {
        return None;
    }

    let mut remaining = if serial >= 60 { serial - 1 } else { serial };
    let mut year = 1900i32;

    loop {
        let days_in_year: i64 = if is_leap_year(year) { 366 } else { 365 };
        if remaining <= days_in_year {
            break;
        }
        remaining -= days_in_year;
        year += 1;
        if year > 9999 {
            return None;
        }
    }

    let month_lengths: [i64; 12] = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    for (index, &length) in month_lengths.iter().enumerate() {
        if remaining <= length {
            return Some((year, index as u32 + 1, remaining as u32));
        }
        remaining -= length;
    }

    None
}

/// Extracts (hours, minutes, seconds) from the fractional day part.
fn serial_to_hms(value: f64) -> (u32, u32, u32) {
    let fraction = value - value.floor();
    // Round to the nearest second so fractions that are not exactly
    // representable in binary do not land one second short.
    let total_seconds = (fraction * 86400.0).round() as u32 % 86400;
    (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
}

/// Converts a 24-hour value to (display hour, AM/PM suffix).
fn to_12_hour(hours: u32) -> (u32, &'static str) {
    match hours {
        0 => (12, "AM"),
        1..=11 => (hours, "AM"),
        12 => (12, "PM"),
        _ => (hours - 12, "PM"),
    }
}
