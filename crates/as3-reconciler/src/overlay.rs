//! Administrator override overlay

use as3_types::OverrideFragment;
use serde_json::Value;

use crate::error::OverrideError;

/// Check the override's shape and deep-merge it onto `document`.
pub fn apply(fragment: &OverrideFragment, document: &Value) -> Result<Value, OverrideError> {
    let source: Value = serde_json::from_str(fragment.as_str()).map_err(OverrideError::Parse)?;
    validate(&source)?;

    let mut merged = document.clone();
    deep_merge(&mut merged, &source);
    Ok(merged)
}

fn validate(source: &Value) -> Result<(), OverrideError> {
    let object = source.as_object().ok_or(OverrideError::NotAnObject)?;
    match object.get("declaration") {
        Some(Value::Object(_)) => Ok(()),
        _ => Err(OverrideError::MissingDeclaration),
    }
}

/// Objects merge key by key; anything else in `source` replaces `target`.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_objects_and_replace_arrays() {
        let mut target = json!({
            "declaration": {
                "app1": { "class": "Tenant", "pool": { "members": [1, 2], "monitor": "http" } }
            }
        });
        let source = json!({
            "declaration": {
                "app1": { "pool": { "members": [3] } },
                "app9": { "class": "Tenant" }
            }
        });

        deep_merge(&mut target, &source);

        let app1 = &target["declaration"]["app1"];
        assert_eq!(app1["class"], "Tenant");
        assert_eq!(app1["pool"]["members"], json!([3]));
        assert_eq!(app1["pool"]["monitor"], "http");
        assert_eq!(target["declaration"]["app9"]["class"], "Tenant");
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let doc = json!({ "declaration": {} });

        assert!(matches!(
            apply(&OverrideFragment::new("[1]"), &doc),
            Err(OverrideError::NotAnObject)
        ));
        assert!(matches!(
            apply(&OverrideFragment::new(r#"{ "class": "AS3" }"#), &doc),
            Err(OverrideError::MissingDeclaration)
        ));
        assert!(matches!(
            apply(&OverrideFragment::new("{"), &doc),
            Err(OverrideError::Parse(_))
        ));
    }
}
