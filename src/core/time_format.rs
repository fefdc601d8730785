//! Timestamp parsing and template formatting for time columns.
//!
//! Templates use the token set of the admin panel's front end
//! (`YYYY-MM-DD HH:mm:ss`), not `strftime`.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Rendered when a time column holds something that is not a timestamp.
pub const INVALID_DATE: &str = "Invalid Date";

pub const DEFAULT_TIME_TEMPLATE: &str = "YYYY-MM-DD HH:mm:ss";

/// China Standard Time, the zone the user service stamps `createTime` in.
const DEFAULT_OFFSET_SECONDS: i32 = 8 * 3600;

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)]|Y{1,4}|M{1,4}|D{1,2}|d{1,4}|H{1,2}|h{1,2}|a|A|m{1,2}|s{1,2}|Z{1,2}|SSS")
        .expect("valid time token regex")
});

// Zone-less wall-clock timestamp; everything after the year is optional.
static LOCAL_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]{4})[-/]?([0-9]{1,2})?[-/]?([0-9]{0,2})[Tt\s]*([0-9]{1,2})?:?([0-9]{1,2})?:?([0-9]{1,2})?[.:]?([0-9]+)?$",
    )
    .expect("valid local timestamp regex")
});

pub fn default_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS).expect("UTC+8 is a valid offset")
}

/// `null`, `""`, `0` and `false`: values a time column renders as empty.
pub fn is_falsy(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Formats `raw` with `template` in `offset`, or returns [`INVALID_DATE`].
pub fn format_timestamp(raw: &Value, template: &str, offset: FixedOffset) -> String {
    match parse_timestamp(raw, offset) {
        Some(dt) => format_datetime(&dt, template),
        None => {
            tracing::debug!(value = %raw, "unparseable timestamp");
            INVALID_DATE.to_string()
        }
    }
}

/// Interprets a raw value as a point in time.
///
/// Numbers are epoch milliseconds. Strings with a zone designator are RFC 3339;
/// zone-less strings are wall-clock time in `offset`.
pub fn parse_timestamp(raw: &Value, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    match raw {
        Value::Number(n) => {
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => {
                    let f = n.as_f64()?;
                    if !f.is_finite() || f.abs() > i64::MAX as f64 {
                        return None;
                    }
                    f.trunc() as i64
                }
            };
            DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&offset))
        }
        Value::String(text) => parse_text(text, offset),
        _ => None,
    }
}

fn parse_text(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    if !text.ends_with(['Z', 'z']) {
        if let Some(caps) = LOCAL_TIMESTAMP_REGEX.captures(text) {
            return local_from_captures(&caps, offset);
        }
    }

    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
        .map(|dt| dt.with_timezone(&offset))
}

fn local_from_captures(caps: &Captures, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let part = |i: usize| caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty());
    let number = |i: usize, default: u32| -> Option<u32> {
        match part(i) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = part(1)?.parse().ok()?;
    let month = number(2, 1)?;
    let day = number(3, 1)?;
    let hour = number(4, 0)?;
    let minute = number(5, 0)?;
    let second = number(6, 0)?;
    // Only the first three fraction digits count, read as whole milliseconds.
    let millis = match part(7) {
        Some(s) => s.chars().take(3).collect::<String>().parse().ok()?,
        None => 0,
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_milli_opt(hour, minute, second, millis)?;
    offset.from_local_datetime(&naive).single()
}

/// Renders `dt` with a token template. Text in `[brackets]` is copied literally
/// without the brackets; characters that are not tokens are copied as-is.
pub fn format_datetime(dt: &DateTime<FixedOffset>, template: &str) -> String {
    TOKEN_REGEX
        .replace_all(template, |caps: &Captures| match caps.get(1) {
            Some(escaped) => escaped.as_str().to_string(),
            None => render_token(&caps[0], dt),
        })
        .into_owned()
}

fn render_token(token: &str, dt: &DateTime<FixedOffset>) -> String {
    match token {
        "YY" => {
            let year = format!("{:04}", dt.year());
            year[year.len() - 2..].to_string()
        }
        "YYYY" => format!("{:04}", dt.year()),
        "M" => dt.month().to_string(),
        "MM" => format!("{:02}", dt.month()),
        "MMM" => dt.format("%b").to_string(),
        "MMMM" => dt.format("%B").to_string(),
        "D" => dt.day().to_string(),
        "DD" => format!("{:02}", dt.day()),
        "d" => dt.weekday().num_days_from_sunday().to_string(),
        "dd" => dt.format("%a").to_string().chars().take(2).collect(),
        "ddd" => dt.format("%a").to_string(),
        "dddd" => dt.format("%A").to_string(),
        "H" => dt.hour().to_string(),
        "HH" => format!("{:02}", dt.hour()),
        "h" => dt.hour12().1.to_string(),
        "hh" => format!("{:02}", dt.hour12().1),
        "a" => (if dt.hour() < 12 { "am" } else { "pm" }).to_string(),
        "A" => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "m" => dt.minute().to_string(),
        "mm" => format!("{:02}", dt.minute()),
        "s" => dt.second().to_string(),
        "ss" => format!("{:02}", dt.second()),
        "SSS" => format!("{:03}", dt.timestamp_subsec_millis()),
        "Z" => dt.format("%:z").to_string(),
        "ZZ" => dt.format("%z").to_string(),
        // `Y` and `YYY` have no meaning
        other => other.to_string(),
    }
}
