//! Dotted key-path lookup into decoded JSON.
//!
//! `"group.items"` walks `root["group"]["items"]`. Every node visited along the
//! way, including the root, has to be an object; anything else yields `None`.

use serde_json::Value;

pub const SEPARATOR: char = '.';

/// Returns the value at `path` inside `root`, or `None` if the path is empty
/// or any segment doesn't resolve.
pub fn value_for_key_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    // Single key, no traversal needed
    if !path.contains(SEPARATOR) {
        return root.as_object()?.get(path);
    }

    path.split(SEPARATOR)
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_path_is_absent() {
        assert_eq!(value_for_key_path(&json!({"": 1}), ""), None);
        assert_eq!(value_for_key_path(&json!(null), ""), None);
        assert_eq!(value_for_key_path(&json!([1, 2]), ""), None);
    }

    #[test]
    fn test_single_key() {
        let root = json!({"testKey": "testValue"});
        assert_eq!(value_for_key_path(&root, "testKey"), Some(&json!("testValue")));
        assert_eq!(value_for_key_path(&root, "missing"), None);
    }

    #[test]
    fn test_single_key_on_non_object_is_absent() {
        assert_eq!(value_for_key_path(&json!(["testKey"]), "testKey"), None);
        assert_eq!(value_for_key_path(&json!("testKey"), "testKey"), None);
    }

    #[test]
    fn test_nested_path() {
        let root = json!({"a": {"b": 5}});
        assert_eq!(value_for_key_path(&root, "a.b"), Some(&json!(5)));
        assert_eq!(value_for_key_path(&root, "a.c"), None);
    }

    #[test]
    fn test_traversal_through_non_object_is_absent() {
        let root = json!({"a": 5});
        assert_eq!(value_for_key_path(&root, "a.b"), None);

        let root = json!({"a": [{"b": 1}]});
        assert_eq!(value_for_key_path(&root, "a.b"), None);
    }

    #[test]
    fn test_final_segment_may_be_any_value() {
        let root = json!({"data": {"groups": [{"group_id": 1}], "empty": null}});
        assert_eq!(
            value_for_key_path(&root, "data.groups"),
            Some(&json!([{"group_id": 1}]))
        );
        assert_eq!(value_for_key_path(&root, "data.empty"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_segment_is_looked_up_verbatim() {
        let root = json!({"a": {"": {"b": true}}});
        assert_eq!(value_for_key_path(&root, "a..b"), Some(&json!(true)));
        assert_eq!(value_for_key_path(&json!({"a": {}}), "a."), None);
    }
}
