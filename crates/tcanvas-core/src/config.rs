//! Canvas configuration merging.

use serde_json::Value;

/// Merge caller config over scenario defaults.
///
/// Top-level keys from `caller` win; nested objects are replaced, not merged.
/// A non-object `caller` (including `null`) yields the defaults unchanged.
pub fn merge_config(defaults: &Value, caller: &Value) -> Value {
    let Some(overrides) = caller.as_object() else {
        return defaults.clone();
    };
    let mut merged = match defaults.as_object() {
        Some(base) => base.clone(),
        None => serde_json::Map::new(),
    };
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn caller_keys_override_defaults() {
        let defaults = json!({"showRowNumbers": true, "emptyMessage": "No data"});
        let caller = json!({"showRowNumbers": false, "rows": []});
        let merged = merge_config(&defaults, &caller);
        assert_eq!(
            merged,
            json!({"showRowNumbers": false, "emptyMessage": "No data", "rows": []})
        );
    }

    #[test]
    fn nested_objects_are_replaced() {
        let defaults = json!({"location": {"name": "Jerusalem", "latitude": 31.7}});
        let caller = json!({"location": {"name": "Haifa"}});
        let merged = merge_config(&defaults, &caller);
        assert_eq!(merged["location"], json!({"name": "Haifa"}));
    }

    #[test]
    fn null_caller_keeps_defaults() {
        let defaults = json!({"showGrid": true});
        assert_eq!(merge_config(&defaults, &Value::Null), defaults);
    }

    #[test]
    fn non_object_defaults_are_ignored() {
        let merged = merge_config(&Value::Null, &json!({"title": "x"}));
        assert_eq!(merged, json!({"title": "x"}));
    }
}
