//! Heuristic parser for loosely formatted finance text.
//!
//! Upstream pages render numbers with magnitude suffixes (`1.23B`),
//! percentages (`12.5%`), short dates (`Jan 5`) and clock times
//! (`3:45pm`), all as plain text. [`parse`] recognizes these forms with
//! a fixed rule order and falls back to returning the text verbatim.
//!
//! The rule order is load-bearing: a plain integer would also match the
//! date and time grammars' digit groups, so numeric forms are always
//! tried first, then percent, then the three date forms, then time.

use std::sync::LazyLock;

use regex::Regex;
use time::{Date, Month, OffsetDateTime, Time};

use crate::error::ParseError;
use crate::value::Value;

static MAGNITUDE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)\+?(-?\d*\.?\d*)([KMBT]?)$").expect("static pattern"));
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?(-?\d*\.?\d*)%$").expect("static pattern"));
static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)([A-Za-z]{3})\s([0-9]{1,2})$").expect("static pattern"));
static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([A-Za-z]{3})\s([0-9]{1,2}),\s([0-9]{4})$").expect("static pattern")
});
static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)/(\d+)/(\d+)$").expect("static pattern"));
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(\d+):(\d+)(am|pm)$").expect("static pattern"));

/// Parses a text token into a typed value.
///
/// `None`, `"-"`, `"N/A"` and `"NaN"` (case-insensitive) yield
/// [`Value::Missing`]. Text that matches none of the recognized forms is
/// returned verbatim as [`Value::Text`]. A token that matches a pattern
/// but fails secondary conversion (malformed decimal, impossible
/// calendar date) is a [`ParseError`].
pub fn parse(text: Option<&str>) -> Result<Value, ParseError> {
    let Some(text) = text else {
        return Ok(Value::Missing);
    };
    if text.eq_ignore_ascii_case("-")
        || text.eq_ignore_ascii_case("N/A")
        || text.eq_ignore_ascii_case("NaN")
    {
        return Ok(Value::Missing);
    }

    // Thousands separators are stripped before the numeric grammars run.
    let stripped = text.replace(',', "");
    if let Some(captures) = MAGNITUDE_NUMBER.captures(&stripped) {
        let number = parse_f64(&captures[1], text)?;
        let scale = match captures[2].to_ascii_uppercase().as_str() {
            "K" => 1e3,
            "M" => 1e6,
            "B" => 1e9,
            "T" => 1e12,
            _ => 1.0,
        };
        return Ok(Value::Number(number * scale));
    }
    if let Some(captures) = PERCENT.captures(&stripped) {
        let number = parse_f64(&captures[1], text)?;
        return Ok(Value::Number(number / 100.0));
    }
    if let Some(captures) = MONTH_DAY.captures(text) {
        let month = month_from_abbreviation(&captures[1], text)?;
        let day = parse_u8(&captures[2], text)?;
        let year = OffsetDateTime::now_utc().year();
        return calendar_date(year, month, day, text).map(Value::Date);
    }
    if let Some(captures) = MONTH_DAY_YEAR.captures(text) {
        let month = month_from_abbreviation(&captures[1], text)?;
        let day = parse_u8(&captures[2], text)?;
        let year = parse_i32(&captures[3], text)?;
        return calendar_date(year, month, day, text).map(Value::Date);
    }
    if let Some(captures) = SLASH_DATE.captures(text) {
        let month_number = parse_u8(&captures[1], text)?;
        let month = Month::try_from(month_number).map_err(|_| ParseError::InvalidCalendar {
            text: text.to_owned(),
        })?;
        let day = parse_u8(&captures[2], text)?;
        let year = parse_i32(&captures[3], text)?;
        return calendar_date(year, month, day, text).map(Value::Date);
    }
    if let Some(captures) = CLOCK_TIME.captures(text) {
        let hour = parse_u8(&captures[1], text)?;
        let minute = parse_u8(&captures[2], text)?;
        let is_am = captures[3].eq_ignore_ascii_case("am");
        // 12am maps to hour 0; pm adds 12 unless the hour is already 12.
        let hour24 = match (is_am, hour) {
            (true, 12) => 0,
            (true, hour) => hour,
            (false, 12) => 12,
            (false, hour) => hour.saturating_add(12),
        };
        let time = Time::from_hms(hour24, minute, 0).map_err(|_| ParseError::InvalidCalendar {
            text: text.to_owned(),
        })?;
        return Ok(Value::Time(time));
    }

    Ok(Value::Text(text.to_owned()))
}

/// Parses a text token into a floating-point number.
///
/// `None`, blank, `"N/A"` and `"-"` yield NaN without error. Any other
/// token goes through [`parse`]; a result that is not a number (a date,
/// a time, pass-through text, or the `"NaN"` null sentinel) is a hard
/// error rather than NaN.
pub fn parse_double(text: Option<&str>) -> Result<f64, ParseError> {
    let Some(text) = text else {
        return Ok(f64::NAN);
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("N/A") || trimmed == "-" {
        return Ok(f64::NAN);
    }
    match parse(Some(trimmed))? {
        Value::Number(value) => Ok(value),
        other => Err(ParseError::NotNumeric {
            text: trimmed.to_owned(),
            actual: other.type_name(),
        }),
    }
}

fn parse_f64(token: &str, original: &str) -> Result<f64, ParseError> {
    token.parse::<f64>().map_err(|_| ParseError::MalformedNumber {
        text: original.to_owned(),
    })
}

fn parse_u8(token: &str, original: &str) -> Result<u8, ParseError> {
    token.parse::<u8>().map_err(|_| ParseError::MalformedNumber {
        text: original.to_owned(),
    })
}

fn parse_i32(token: &str, original: &str) -> Result<i32, ParseError> {
    token.parse::<i32>().map_err(|_| ParseError::MalformedNumber {
        text: original.to_owned(),
    })
}

fn month_from_abbreviation(token: &str, original: &str) -> Result<Month, ParseError> {
    match token.to_ascii_lowercase().as_str() {
        "jan" => Ok(Month::January),
        "feb" => Ok(Month::February),
        "mar" => Ok(Month::March),
        "apr" => Ok(Month::April),
        "may" => Ok(Month::May),
        "jun" => Ok(Month::June),
        "jul" => Ok(Month::July),
        "aug" => Ok(Month::August),
        "sep" => Ok(Month::September),
        "oct" => Ok(Month::October),
        "nov" => Ok(Month::November),
        "dec" => Ok(Month::December),
        _ => Err(ParseError::UnsupportedMonth {
            month: token.to_owned(),
            text: original.to_owned(),
        }),
    }
}

fn calendar_date(year: i32, month: Month, day: u8, original: &str) -> Result<Date, ParseError> {
    Date::from_calendar_date(year, month, day).map_err(|_| ParseError::InvalidCalendar {
        text: original.to_owned(),
    })
}
