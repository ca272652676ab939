//! Value materializer: collapse a tree subtree back into plain data,
//! ignoring spans and comments. Object keys come from each property's key
//! child; malformed properties (no value child) are skipped.

use serde_json::{Map, Value};

use crate::scanner::Literal;
use crate::tree::{Node, NodeKind};

pub fn materialize(node: &Node) -> Value {
    match node.kind {
        NodeKind::Object => {
            let mut map = Map::new();
            for child in &node.children {
                if child.kind != NodeKind::Property {
                    continue;
                }
                let (Some(key), Some(value)) = (child.key(), child.value_child()) else {
                    continue;
                };
                map.insert(key.to_string(), materialize(value));
            }
            Value::Object(map)
        }
        NodeKind::Array => Value::Array(node.children.iter().map(materialize).collect()),
        NodeKind::Property => node.value_child().map(materialize).unwrap_or(Value::Null),
        _ => match &node.value {
            Some(Literal::Bool(b)) => Value::Bool(*b),
            Some(Literal::Number(n)) => Value::Number(n.clone()),
            Some(Literal::Str(s)) => Value::String(s.clone()),
            Some(Literal::Null) | None => Value::Null,
        },
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_tree;

    #[test]
    fn round_trips_against_serde_json() {
        let src = r#"{"a": {"b": [1, true, "x", null], "c": -2.5e3}, "d": "é😀"}"#;
        let (root, issues) = parse_tree(src);
        assert!(issues.is_empty());
        let materialized = materialize(&root.children[0]);
        let parsed: Value = serde_json::from_str(src).unwrap();
        assert_eq!(materialized, parsed);
    }

    #[test]
    fn comments_do_not_change_the_value() {
        let commented = "{\n// the port\n\"port\": 8080, // eol\n\"on\": true\n}";
        let plain = r#"{"port": 8080, "on": true}"#;
        let (root, _) = parse_tree(commented);
        let parsed: Value = serde_json::from_str(plain).unwrap();
        assert_eq!(materialize(&root.children[0]), parsed);
    }

    #[test]
    fn object_key_order_is_preserved() {
        let (root, _) = parse_tree(r#"{"z": 1, "a": 2, "m": 3}"#);
        let value = materialize(&root.children[0]);
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn malformed_property_is_skipped() {
        let (root, issues) = parse_tree(r#"{"a":, "b": 2}"#);
        assert!(!issues.is_empty());
        let value = materialize(&root.children[0]);
        assert_eq!(value, serde_json::json!({"b": 2}));
    }
}
