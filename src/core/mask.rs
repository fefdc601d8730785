use crate::core::display::display_string;
use crate::core::placeholder::{is_blank, PLACEHOLDER};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const MASK_CHAR: char = '*';

/// Values up to this many characters are masked completely.
const FULL_MASK_MAX_LEN: usize = 4;
const VISIBLE_PREFIX: usize = 2;
const VISIBLE_SUFFIX: usize = 2;

// ASCII digits only: `\d` would also accept other Unicode digits.
static MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[0-9]{10}$").expect("valid mobile number regex"));

/// Redacts a value for display.
///
/// Missing, `null` and empty values render as [`PLACEHOLDER`]. In mobile mode an
/// 11-digit number starting with `1` keeps its first 3 and last 4 digits
/// (`13812345678` becomes `138****5678`). Everything else, including a mobile-mode
/// value that is not such a number, uses [`mask_generic`].
pub fn mask_value(value: Option<&Value>, mobile: bool) -> String {
    let value = match value {
        Some(v) if !is_blank(v) => v,
        _ => return PLACEHOLDER.to_string(),
    };

    let text = display_string(value);

    if mobile {
        if let Some(masked) = mask_mobile(&text) {
            return masked;
        }
        tracing::trace!("value is not a mobile number, using generic mask");
    }

    mask_generic(&text)
}

/// Masks the middle four digits of a mainland mobile number, or returns `None`
/// when `text` is not one.
pub fn mask_mobile(text: &str) -> Option<String> {
    if !MOBILE_REGEX.is_match(text) {
        return None;
    }
    // The pattern guarantees 11 ASCII bytes.
    Some(format!("{}****{}", &text[..3], &text[7..]))
}

/// Keeps the first and last two characters and masks the rest, keeping the
/// original length. Values of four characters or fewer are masked entirely.
///
/// Length is counted in Unicode scalar values.
pub fn mask_generic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total <= FULL_MASK_MAX_LEN {
        return MASK_CHAR.to_string().repeat(total);
    }

    let mut masked = String::with_capacity(text.len());
    masked.extend(&chars[..VISIBLE_PREFIX]);
    masked.extend(std::iter::repeat(MASK_CHAR).take(total - VISIBLE_PREFIX - VISIBLE_SUFFIX));
    masked.extend(&chars[total - VISIBLE_SUFFIX..]);
    masked
}
