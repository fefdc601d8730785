use crate::core::rules::{FieldRule, RuleSet};
use crate::domain::model::Record;
use crate::utils::error::{Result, TableError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Builds the display form of one row.
///
/// Each input field is handled by the first matching [`FieldRule`]; the rule set's
/// `key_overrides` are applied afterwards and always win, adding fields the row
/// does not have. The input and the rule set are never modified.
///
/// ```
/// use serde_json::json;
/// use table_trans::{transform, Record, RuleSet};
///
/// let row: Record = serde_json::from_value(json!({
///     "id": 1,
///     "name": "",
///     "rate": 0.85,
///     "createTime": "2025-04-08T06:09:00Z",
///     "phone": "13812345678"
/// }))
/// .unwrap();
///
/// let rules = RuleSet::new()
///     .time_key("createTime", "YYYY-MM-DD HH:mm")
///     .per_cent_keys(["rate"])
///     .mobile_keys(["phone"])
///     .key_override("id", json!("A001"));
///
/// let display = transform(&row, &rules);
/// assert_eq!(
///     serde_json::to_value(&display).unwrap(),
///     json!({
///         "id": "A001",
///         "name": "/",
///         "rate": "0.85%",
///         "createTime": "2025-04-08 14:09",
///         "phone": "138****5678"
///     })
/// );
/// ```
pub fn transform(item: &Record, rules: &RuleSet) -> Record {
    let mut output = Record::new();

    for (key, raw) in &item.data {
        let rule = FieldRule::resolve(key, rules);
        tracing::trace!(field = %key, %rule, "applying field rule");
        // Present fields always hold a value, so every rule yields one.
        if let Some(value) = rule.apply(key, Some(raw), rules) {
            output.insert(key.clone(), value);
        }
    }

    for (key, value) in &rules.key_overrides {
        output.insert(key.clone(), value.clone());
    }

    output
}

/// [`transform`] with an empty rule set: only placeholder normalization applies.
pub fn transform_with_default(item: &Record) -> Record {
    transform(item, &RuleSet::default())
}

/// Transforms every row, keeping the input order.
pub fn transform_all(items: &[Record], rules: &RuleSet) -> Vec<Record> {
    let rows: Vec<Record> = items.iter().map(|item| transform(item, rules)).collect();
    tracing::debug!("Transformed {} rows", rows.len());
    rows
}

/// Typed variant of [`transform`]: `I` is the row as the API returns it, `O` the
/// shape the table displays.
pub fn transform_typed<I, O>(item: &I, rules: &RuleSet) -> Result<O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    let record = match serde_json::to_value(item)? {
        Value::Object(data) => Record { data },
        other => {
            return Err(TableError::ProcessingError {
                message: format!("row must serialize to an object, got {}", other),
            })
        }
    };

    let display = transform(&record, rules);
    Ok(serde_json::from_value(Value::Object(display.data))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{User, UserRow};
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn sample_rules() -> RuleSet {
        RuleSet::new()
            .time_key("createTime", "YYYY-MM-DD HH:mm")
            .per_cent_keys(["rate"])
            .mobile_keys(["phone"])
            .key_override("id", json!("A001"))
    }

    #[test]
    fn test_end_to_end_example() {
        let item = record(json!({
            "id": 1,
            "name": "",
            "rate": 0.85,
            "createTime": "2025-04-08T06:09:00Z",
            "phone": "13812345678"
        }));

        let output = transform(&item, &sample_rules());

        assert_eq!(
            Value::from(output),
            json!({
                "id": "A001",
                "name": "/",
                "rate": "0.85%",
                "createTime": "2025-04-08 14:09",
                "phone": "138****5678"
            })
        );
    }

    #[test]
    fn test_input_is_not_modified() {
        let item = record(json!({"name": "", "phone": "13812345678"}));
        let before = item.clone();
        let rules = sample_rules();
        let rules_before = rules.clone();

        let _ = transform(&item, &rules);

        assert_eq!(item, before);
        assert_eq!(rules, rules_before);
    }

    #[test]
    fn test_time_rule_wins_over_mask() {
        let rules = RuleSet::new()
            .time_key("createTime", "YYYY-MM-DD")
            .mask_keys(["createTime"]);
        let item = record(json!({"createTime": "2025-04-08 10:00:00"}));

        let output = transform(&item, &rules);
        assert_eq!(output.get("createTime"), Some(&json!("2025-04-08")));
    }

    #[test]
    fn test_override_wins_over_every_rule() {
        let rules = RuleSet::new()
            .time_key("createTime", "YYYY-MM-DD")
            .mobile_keys(["phone"])
            .exclude(["name"])
            .per_cent_keys(["rate"])
            .key_override("createTime", json!("never"))
            .key_override("phone", json!(null))
            .key_override("name", json!(""))
            .key_override("rate", json!(99));
        let item = record(json!({
            "createTime": "2025-04-08 10:00:00",
            "phone": "13812345678",
            "name": "Alice",
            "rate": 0.5
        }));

        let output = transform(&item, &rules);

        assert_eq!(output.get("createTime"), Some(&json!("never")));
        assert_eq!(output.get("phone"), Some(&json!(null)));
        assert_eq!(output.get("name"), Some(&json!("")));
        assert_eq!(output.get("rate"), Some(&json!(99)));
    }

    #[test]
    fn test_excluded_empty_string_stays_empty() {
        let rules = RuleSet::new().exclude(["remark"]);
        let item = record(json!({"remark": "", "note": ""}));

        let output = transform(&item, &rules);

        assert_eq!(output.get("remark"), Some(&json!("")));
        assert_eq!(output.get("note"), Some(&json!("/")));
    }

    #[test]
    fn test_fields_are_not_invented() {
        let rules = RuleSet::new()
            .time_key("createTime", "YYYY-MM-DD")
            .mobile_keys(["phone"])
            .per_cent_keys(["rate"]);
        let item = record(json!({"name": "Bob"}));

        let output = transform(&item, &rules);
        assert_eq!(Value::from(output), json!({"name": "Bob"}));
    }

    #[test]
    fn test_field_order() {
        let rules = RuleSet::new()
            .key_override("extra", json!("x"))
            .key_override("b", json!("B"));
        let item = record(json!({"c": 1, "b": 2, "a": 3}));

        let output = transform(&item, &rules);
        let keys: Vec<&String> = output.keys().collect();
        assert_eq!(keys, vec!["c", "b", "a", "extra"]);
        assert_eq!(output.get("b"), Some(&json!("B")));
    }

    #[test]
    fn test_default_rules_only_normalize() {
        let item = record(json!({"a": "", "b": null, "c": 0, "d": "x"}));
        let output = transform_with_default(&item);
        assert_eq!(Value::from(output), json!({"a": "/", "b": "/", "c": 0, "d": "x"}));
    }

    #[test]
    fn test_transform_all_keeps_order() {
        let rows = vec![
            record(json!({"phone": "13800000001"})),
            record(json!({"phone": ""})),
            record(json!({"phone": "12"})),
        ];
        let rules = RuleSet::new().mobile_keys(["phone"]);

        let output = transform_all(&rows, &rules);

        let phones: Vec<&Value> = output.iter().filter_map(|r| r.get("phone")).collect();
        assert_eq!(phones, vec![&json!("138****0001"), &json!("/"), &json!("**")]);
    }

    #[test]
    fn test_transform_typed_user_row() {
        let user = User {
            id: 7,
            name: String::new(),
            age: None,
            email: Some("alice@example.com".to_string()),
            create_time: "2025-04-08 14:09:20".to_string(),
            role: "admin".to_string(),
            project: "crm".to_string(),
        };
        let rules = RuleSet::new()
            .time_key("createTime", "YYYY-MM-DD HH:mm")
            .mask_keys(["email"])
            .exclude(["id"]);

        let row: UserRow = transform_typed(&user, &rules).unwrap();

        assert_eq!(
            row,
            UserRow {
                id: json!(7),
                name: "/".to_string(),
                age: json!("/"),
                email: "al*************om".to_string(),
                create_time: "2025-04-08 14:09".to_string(),
                role: "admin".to_string(),
                project: "crm".to_string(),
            }
        );
    }

    #[test]
    fn test_transform_typed_rejects_non_objects() {
        let result: Result<Value> = transform_typed(&vec![1, 2, 3], &RuleSet::new());
        assert!(matches!(result, Err(TableError::ProcessingError { .. })));
    }

    #[test]
    fn test_transform_typed_reports_shape_mismatch() {
        #[derive(serde::Deserialize, Debug)]
        struct Strict {
            #[allow(dead_code)]
            age: u32,
        }

        let item = json!({"age": ""});
        let result: Result<Strict> = transform_typed(&item, &RuleSet::new());
        assert!(matches!(result, Err(TableError::SerializationError(_))));
    }

    #[test]
    fn test_rows_can_be_transformed_on_other_threads() {
        let rules = std::sync::Arc::new(RuleSet::new().mobile_keys(["phone"]));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let rules = rules.clone();
                std::thread::spawn(move || {
                    let item = record(json!({"phone": format!("1380000000{}", i)}));
                    transform(&item, &rules)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let output = handle.join().unwrap();
            assert_eq!(output.get("phone"), Some(&json!(format!("138****000{}", i))));
        }
    }
}
