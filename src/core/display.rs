//! Explicit value-to-text coercion.
//!
//! Masking and percent annotation operate on text, so every raw value goes
//! through [`display_string`] first. Table output uses [`display_cell`].

use serde_json::{Number, Value};

/// Decimal exponents printed positionally; outside this range numbers use
/// exponent form (`1e-7`, `1e+21`).
const MIN_POSITIONAL_EXP: i32 = -6;
const MAX_POSITIONAL_EXP: i32 = 21;

/// Text form of a value, following the JavaScript `String(value)` conversion.
///
/// - strings are returned as-is
/// - integral floats drop the fraction (`1.0` becomes `"1"`)
/// - `null` becomes `"null"`
/// - arrays join their elements with `,`, rendering `null` elements as empty
/// - objects become `"[object Object]"`
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => display_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Text written into a CSV/TSV cell: `null` is an empty cell and nested
/// values are kept as JSON.
pub fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => display_string(other),
    }
}

fn display_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => display_float(f),
        None => n.to_string(),
    }
}

/// Shortest round-trip digits laid out the way JavaScript prints numbers:
/// positional for `1e-7 < |f| < 1e21`, exponent form otherwise.
fn display_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }

    let sign = if f < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let n = exponent + 1;

    let body = if k <= n && n <= MAX_POSITIONAL_EXP {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= MAX_POSITIONAL_EXP {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if MIN_POSITIONAL_EXP < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let exp_sign = if n - 1 < 0 { "-" } else { "+" };
        let exp = (n - 1).abs();
        if k == 1 {
            format!("{}e{}{}", digits, exp_sign, exp)
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], exp_sign, exp)
        }
    };

    format!("{}{}", sign, body)
}
