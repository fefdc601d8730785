use crate::core::display::display_string;
use crate::core::mask::mask_value;
use crate::core::placeholder::{is_placeholder, normalize_placeholder};
use crate::core::time_format::{default_utc_offset, format_timestamp, is_falsy};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// 11 位手機號, 中間 4 位脫敏
    pub mobile_keys: HashSet<String>,
    /// 一般脫敏欄位, 保留前 2 後 2
    pub mask_keys: HashSet<String>,
}

/// Per-view rules deciding how each field of a row is displayed.
///
/// Built once per table view and shared by every row of that view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub exclude_keys: HashSet<String>,
    pub time_keys: HashMap<String, String>,
    pub mask_options: Option<MaskOptions>,
    pub add_per_cent_keys: HashSet<String>,
    pub key_overrides: Map<String, Value>,
    #[serde(with = "utc_offset_format")]
    pub utc_offset: FixedOffset,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            exclude_keys: HashSet::new(),
            time_keys: HashMap::new(),
            mask_options: None,
            add_per_cent_keys: HashSet::new(),
            key_overrides: Map::new(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.exclude_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn time_key(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.time_keys.insert(key.into(), template.into());
        self
    }

    pub fn mobile_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.mask_options
            .get_or_insert_with(MaskOptions::default)
            .mobile_keys
            .extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn mask_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.mask_options
            .get_or_insert_with(MaskOptions::default)
            .mask_keys
            .extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn per_cent_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.add_per_cent_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn key_override(mut self, key: impl Into<String>, value: Value) -> Self {
        self.key_overrides.insert(key.into(), value);
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    fn is_mobile_key(&self, key: &str) -> bool {
        self.mask_options
            .as_ref()
            .map_or(false, |m| m.mobile_keys.contains(key))
    }

    fn is_mask_key(&self, key: &str) -> bool {
        self.mask_options
            .as_ref()
            .map_or(false, |m| m.mask_keys.contains(key))
    }

    /// Keys claimed by more than one rule. Legal, since rule order decides, but
    /// usually a configuration slip.
    pub fn overlapping_keys(&self) -> Vec<(String, FieldRule, FieldRule)> {
        let mut keys: Vec<&String> = self
            .time_keys
            .keys()
            .chain(self.exclude_keys.iter())
            .chain(self.add_per_cent_keys.iter())
            .collect();
        if let Some(mask) = &self.mask_options {
            keys.extend(mask.mobile_keys.iter().chain(mask.mask_keys.iter()));
        }
        keys.sort();
        keys.dedup();

        let mut overlaps = Vec::new();
        for key in keys {
            let matching: Vec<FieldRule> = FieldRule::ORDER
                .into_iter()
                .filter(|rule| *rule != FieldRule::Fallback && rule.matches(key, self))
                .collect();
            if let [winner, shadowed, ..] = matching.as_slice() {
                overlaps.push((key.clone(), *winner, *shadowed));
            }
        }
        overlaps
    }
}

/// The display rules a field can fall under, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    TimeFormat,
    MobileMask,
    GenericMask,
    Exclude,
    Fallback,
}

impl FieldRule {
    /// First match wins; [`FieldRule::Fallback`] matches every field.
    pub const ORDER: [FieldRule; 5] = [
        FieldRule::TimeFormat,
        FieldRule::MobileMask,
        FieldRule::GenericMask,
        FieldRule::Exclude,
        FieldRule::Fallback,
    ];

    pub fn resolve(key: &str, rules: &RuleSet) -> FieldRule {
        FieldRule::ORDER
            .into_iter()
            .find(|rule| rule.matches(key, rules))
            .unwrap_or(FieldRule::Fallback)
    }

    pub fn matches(&self, key: &str, rules: &RuleSet) -> bool {
        match self {
            FieldRule::TimeFormat => rules.time_keys.contains_key(key),
            FieldRule::MobileMask => rules.is_mobile_key(key),
            FieldRule::GenericMask => rules.is_mask_key(key),
            FieldRule::Exclude => rules.exclude_keys.contains(key),
            FieldRule::Fallback => true,
        }
    }

    /// Display value of `raw` under this rule. `raw` is `None` when the field
    /// was never set.
    pub fn apply(&self, key: &str, raw: Option<&Value>, rules: &RuleSet) -> Option<Value> {
        match self {
            FieldRule::TimeFormat => {
                let formatted = match (raw, rules.time_keys.get(key)) {
                    (Some(value), Some(template)) if !is_falsy(value) => {
                        format_timestamp(value, template, rules.utc_offset)
                    }
                    _ => String::new(),
                };
                normalize_placeholder(Some(&Value::String(formatted)))
            }
            FieldRule::MobileMask => Some(Value::String(mask_value(raw, true))),
            FieldRule::GenericMask => Some(Value::String(mask_value(raw, false))),
            FieldRule::Exclude => raw.cloned(),
            FieldRule::Fallback => {
                let normalized = normalize_placeholder(raw);
                if !rules.add_per_cent_keys.contains(key) {
                    return normalized;
                }
                match normalized {
                    Some(v) if is_placeholder(&v) => Some(v),
                    Some(v) => Some(Value::String(format!("{}%", display_string(&v)))),
                    None => Some(Value::String("undefined%".to_string())),
                }
            }
        }
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldRule::TimeFormat => "time_format",
            FieldRule::MobileMask => "mobile_mask",
            FieldRule::GenericMask => "generic_mask",
            FieldRule::Exclude => "exclude",
            FieldRule::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

mod utc_offset_format {
    use chrono::FixedOffset;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(offset: &FixedOffset, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(offset)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FixedOffset, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse::<FixedOffset>()
            .map_err(|e| serde::de::Error::custom(format!("invalid utc_offset '{}': {}", text, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view_rules() -> RuleSet {
        RuleSet::new()
            .exclude(["id"])
            .time_key("createTime", "YYYY-MM-DD HH:mm")
            .mobile_keys(["phone"])
            .mask_keys(["email", "createTime"])
            .per_cent_keys(["rate"])
    }

    #[test]
    fn test_resolve_follows_precedence() {
        let rules = view_rules();
        assert_eq!(FieldRule::resolve("createTime", &rules), FieldRule::TimeFormat);
        assert_eq!(FieldRule::resolve("phone", &rules), FieldRule::MobileMask);
        assert_eq!(FieldRule::resolve("email", &rules), FieldRule::GenericMask);
        assert_eq!(FieldRule::resolve("id", &rules), FieldRule::Exclude);
        assert_eq!(FieldRule::resolve("rate", &rules), FieldRule::Fallback);
        assert_eq!(FieldRule::resolve("anything", &rules), FieldRule::Fallback);
    }

    #[test]
    fn test_mask_beats_exclude() {
        let rules = RuleSet::new().exclude(["phone"]).mobile_keys(["phone"]);
        assert_eq!(FieldRule::resolve("phone", &rules), FieldRule::MobileMask);
    }

    #[test]
    fn test_mobile_beats_generic_mask() {
        let rules = RuleSet::new().mask_keys(["phone"]).mobile_keys(["phone"]);
        assert_eq!(FieldRule::resolve("phone", &rules), FieldRule::MobileMask);
    }

    #[test]
    fn test_mask_rules_need_mask_options() {
        let rules = RuleSet::new();
        assert!(rules.mask_options.is_none());
        assert!(!FieldRule::MobileMask.matches("phone", &rules));
        assert!(!FieldRule::GenericMask.matches("phone", &rules));
    }

    #[test]
    fn test_time_rule_empty_values() {
        let rules = view_rules();
        for raw in [json!(null), json!(""), json!(0), json!(false)] {
            assert_eq!(
                FieldRule::TimeFormat.apply("createTime", Some(&raw), &rules),
                Some(json!("/"))
            );
        }
        assert_eq!(
            FieldRule::TimeFormat.apply("createTime", None, &rules),
            Some(json!("/"))
        );
    }

    #[test]
    fn test_time_rule_invalid_date_is_kept() {
        let rules = view_rules();
        assert_eq!(
            FieldRule::TimeFormat.apply("createTime", Some(&json!("soon")), &rules),
            Some(json!("Invalid Date"))
        );
    }

    #[test]
    fn test_exclude_copies_raw_value() {
        let rules = view_rules();
        assert_eq!(FieldRule::Exclude.apply("id", Some(&json!("")), &rules), Some(json!("")));
        assert_eq!(FieldRule::Exclude.apply("id", Some(&json!(null)), &rules), Some(json!(null)));
        assert_eq!(FieldRule::Exclude.apply("id", None, &rules), None);
    }

    #[test]
    fn test_fallback_per_cent() {
        let rules = view_rules();
        assert_eq!(FieldRule::Fallback.apply("rate", Some(&json!(0.85)), &rules), Some(json!("0.85%")));
        assert_eq!(FieldRule::Fallback.apply("rate", Some(&json!("12")), &rules), Some(json!("12%")));
        assert_eq!(FieldRule::Fallback.apply("rate", Some(&json!(0)), &rules), Some(json!("0%")));
        assert_eq!(FieldRule::Fallback.apply("rate", Some(&json!("")), &rules), Some(json!("/")));
        assert_eq!(FieldRule::Fallback.apply("rate", Some(&json!(null)), &rules), Some(json!("/")));
    }

    #[test]
    fn test_per_cent_small_fraction() {
        let rules = view_rules();
        assert_eq!(
            FieldRule::Fallback.apply("rate", Some(&json!(0.000001)), &rules),
            Some(json!("0.000001%"))
        );
        assert_eq!(
            FieldRule::GenericMask.apply("email", Some(&json!(0.00005)), &rules),
            Some(json!("0.***05"))
        );
    }

    #[test]
    fn test_fallback_keeps_type() {
        let rules = view_rules();
        assert_eq!(FieldRule::Fallback.apply("age", Some(&json!(30)), &rules), Some(json!(30)));
        assert_eq!(FieldRule::Fallback.apply("age", None, &rules), None);
    }

    #[test]
    fn test_overlapping_keys() {
        let overlaps = view_rules().overlapping_keys();
        assert_eq!(
            overlaps,
            vec![(
                "createTime".to_string(),
                FieldRule::TimeFormat,
                FieldRule::GenericMask
            )]
        );
    }

    #[test]
    fn test_rule_set_from_json() {
        let rules: RuleSet = serde_json::from_value(json!({
            "time_keys": {"createTime": "YYYY-MM-DD"},
            "mask_options": {"mobile_keys": ["phone"]},
            "utc_offset": "+00:00"
        }))
        .unwrap();

        assert_eq!(rules.utc_offset, FixedOffset::east_opt(0).unwrap());
        assert!(rules.is_mobile_key("phone"));
        assert!(rules.exclude_keys.is_empty());
    }

    #[test]
    fn test_invalid_utc_offset_is_rejected() {
        let result: std::result::Result<RuleSet, _> =
            serde_json::from_value(json!({"utc_offset": "CST"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_set_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
    }
}
