//! Spreadsheet cell normalization
//!
//! Spreadsheet exports hand dates over either as serial day numbers or as
//! strings, and money as plain numbers or currency-formatted text. Every
//! conversion here is total: bad input becomes `None` or `0.0`.
//!
//! Dates are naive wall-clock values. Serial numbers count days from the
//! 1899-12-30 epoch; strings are read as a calendar date at midnight.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Calendar formats accepted for the date part of a string cell
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a spreadsheet serial day number into a date-time
pub fn serial_to_date(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let ms = (serial * MS_PER_DAY).round();
    if ms.abs() > i64::MAX as f64 {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::try_milliseconds(ms as i64)?)
}

fn is_numeric_text(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next();
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a date string, discarding anything after the first space or `T`
pub fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if is_numeric_text(s) {
        return s.parse::<f64>().ok().and_then(serial_to_date);
    }
    let date_part = s.split(' ').next().unwrap_or(s);
    let date_part = date_part.split('T').next().unwrap_or(date_part);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert any cell value to a date
///
/// Numbers are serial dates, numeric-looking strings are coerced first.
/// Empty, null and unparseable values give `None`.
pub fn to_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Convert any cell value to a number, defaulting to `0.0`
///
/// `$` and `,` are stripped before parsing. Empty text is zero.
pub fn to_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_number_str(s),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

pub fn parse_number_str(s: &str) -> f64 {
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Cell rendered as trimmed text; null becomes empty
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serial_date() {
        let d = to_date(&json!(45239)).unwrap();
        assert_eq!(d.date(), ymd(2023, 11, 9));
        assert_eq!(d.time(), chrono::NaiveTime::MIN);
    }

    #[test]
    fn test_fractional_serial_keeps_time() {
        let d = to_date(&json!(45239.5)).unwrap();
        assert_eq!(d, ymd(2023, 11, 9).and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_numeric_string_is_serial() {
        assert_eq!(to_date(&json!("45239")).unwrap().date(), ymd(2023, 11, 9));
        assert_eq!(to_date(&json!("45239.25")).unwrap().date(), ymd(2023, 11, 9));
    }

    #[test]
    fn test_date_strings() {
        assert_eq!(to_date(&json!("2023-11-09")).unwrap().date(), ymd(2023, 11, 9));
        let with_time = to_date(&json!("2023-11-09 13:45")).unwrap();
        assert_eq!(with_time, ymd(2023, 11, 9).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(to_date(&json!("11/09/2023")).unwrap().date(), ymd(2023, 11, 9));
        assert_eq!(to_date(&json!("2023-11-09T08:00:00")).unwrap().date(), ymd(2023, 11, 9));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(to_date(&json!("")), None);
        assert_eq!(to_date(&Value::Null), None);
        assert_eq!(to_date(&json!("not-a-date")), None);
        assert_eq!(to_date(&json!(true)), None);
        assert_eq!(to_date(&json!("1.")), None);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&json!("$1,234.50")), 1234.5);
        assert_eq!(to_number(&json!(" 42 ")), 42.0);
        assert_eq!(to_number(&json!(7.25)), 7.25);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&json!("n/a")), 0.0);
        assert_eq!(to_number(&json!("inf")), 0.0);
        assert_eq!(to_number(&Value::Null), 0.0);
        assert_eq!(to_number(&json!("-15")), -15.0);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!("  T-101 ")), "T-101");
        assert_eq!(to_text(&json!(101)), "101");
        assert_eq!(to_text(&Value::Null), "");
    }
}
