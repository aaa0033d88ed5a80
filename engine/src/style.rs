//! FILENAME: engine/src/style.rs
//! PURPOSE: Format descriptors, alignment, and the console colour palette.
//! CONTEXT: Cells carry a `DataFormat` kind plus a `FormatStyle` sub-selector
//! that picks the concrete rendering pattern for dates, times and datetimes.
//! Colours are indices into the 16-colour console palette (8 base colours
//! plus a bright bit); -1 means "inherit the default".

use serde::{Deserialize, Serialize};

/// Horizontal alignment of cell content.
/// Numbers default to Right, text to Left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Data formatting kinds for displaying cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DataFormat {
    #[default]
    General,
    Number,
    Percentage,
    Currency,
    Date,
    Time,
    DateTime,
}

/// Date/time formatting styles (the sub-selector within a DataFormat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FormatStyle {
    #[default]
    MonthDayYear, // 12/25/2023
    DayMonthYear,    // 25/12/2023
    YearMonthDay,    // 2023-12-25
    MonthNameDayYear, // Dec 25, 2023
    DayMonthNameYear, // 25 Dec 2023
    YearMonthNameDay, // 2023 Dec 25
    ShortDate,       // 12/25/23
    Hour12,          // 2:30 PM
    Hour24,          // 14:30
    Hour24Seconds,   // 14:30:45
    Hour12Seconds,   // 2:30:45 PM
    DateTimeShort,   // 12/25/23 2:30 PM
    DateTimeLong,    // Dec 25, 2023 2:30:45 PM
    DateTimeIso,     // 2023-12-25T14:30:45
}

// Console colour attribute indices
pub const COLOR_BLACK: i32 = 0;
pub const COLOR_BLUE: i32 = 1;
pub const COLOR_GREEN: i32 = 2;
pub const COLOR_CYAN: i32 = 3;
pub const COLOR_RED: i32 = 4;
pub const COLOR_MAGENTA: i32 = 5;
pub const COLOR_YELLOW: i32 = 6;
pub const COLOR_WHITE: i32 = 7;
pub const COLOR_BRIGHT: i32 = 8;

/// Parses a colour name or "#RRGGBB" hex value into a palette index.
/// Hex colours are mapped onto the nearest of the 16 console colours.
/// Returns -1 for anything unrecognised.
pub fn parse_color(color_str: &str) -> i32 {
    if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() != 6 {
            return -1;
        }
        let value = match u32::from_str_radix(hex, 16) {
            Ok(v) => v,
            Err(_) => return -1,
        };
        let r = ((value >> 16) & 0xFF) as i32;
        let g = ((value >> 8) & 0xFF) as i32;
        let b = (value & 0xFF) as i32;

        return if r < 128 && g < 128 && b < 128 {
            if r < 64 && g < 64 && b < 64 {
                COLOR_BLACK
            } else if b > r && b > g {
                COLOR_BLUE
            } else if g > r && g > b {
                COLOR_GREEN
            } else if r > g && r > b {
                COLOR_RED
            } else if r > g.min(b) && g > b {
                COLOR_YELLOW
            } else if r > g && b > g {
                COLOR_MAGENTA
            } else if g > r && b > r {
                COLOR_CYAN
            } else {
                COLOR_WHITE
            }
        } else {
            // Bright colours
            if b > r && b > g {
                COLOR_BLUE | COLOR_BRIGHT
            } else if g > r && g > b {
                COLOR_GREEN | COLOR_BRIGHT
            } else if r > g && r > b {
                COLOR_RED | COLOR_BRIGHT
            } else if r > 200 && g > 200 && b <= 200 {
                COLOR_YELLOW | COLOR_BRIGHT
            } else if r > 200 && b > 200 && g <= 200 {
                COLOR_MAGENTA | COLOR_BRIGHT
            } else if g > 200 && b > 200 && r <= 200 {
                COLOR_CYAN | COLOR_BRIGHT
            } else {
                COLOR_WHITE | COLOR_BRIGHT
            }
        };
    }

    match color_str {
        "black" => COLOR_BLACK,
        "blue" => COLOR_BLUE,
        "green" => COLOR_GREEN,
        "cyan" => COLOR_CYAN,
        "red" => COLOR_RED,
        "magenta" => COLOR_MAGENTA,
        "yellow" => COLOR_YELLOW,
        "white" => COLOR_WHITE,
        _ => -1,
    }
}
