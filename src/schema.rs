//! Schema inference: the option set, the fragment model, the walker over the
//! document tree, and final document assembly.
//!
//! The walker is a pure function of (node, options). Each visited node gets a
//! fresh fragment; array elements all fold into one shared `items` fragment,
//! where later elements overwrite scalar keys while `properties`/`items`
//! accumulate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tree::{Node, NodeKind};
use crate::value::materialize;

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

/// Everything independently toggleable about what the walker emits.
/// Defaults mirror the option set this generator has always shipped with:
/// titles, defaults and examples on, descriptions off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InferenceOptions {
    pub annotations: Annotations,
    pub assertions: Assertions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Annotations {
    pub infer_default: bool,
    pub infer_title: bool,
    pub infer_description: bool,
    pub infer_examples: bool,
    /// Copied verbatim into every property fragment when set.
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            infer_default: true,
            infer_title: true,
            infer_description: false,
            infer_examples: true,
            read_only: None,
            write_only: None,
        }
    }
}

/// Assertion keywords accepted in the option set but not emitted by the
/// walker: reserved extension points, see DESIGN.md.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Assertions {
    pub any: AnyAssertions,
    pub object: ObjectAssertions,
    pub array: ArrayAssertions,
    pub string: StringAssertions,
    pub number: NumberAssertions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnyAssertions {
    pub infer_enums: bool,
    pub include_null_as_type: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectAssertions {
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub additional_properties: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrayAssertions {
    pub unique_items: Option<bool>,
    pub additional_items: Option<bool>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringAssertions {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberAssertions {
    pub multiple_of: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub use_number_not_integer: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// FRAGMENTS
// ————————————————————————————————————————————————————————————————————————————

/// One inferred schema fragment. Field declaration order fixes the
/// serialized key order; unset keywords are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fragment {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Fragment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Fragment>>,
}

// ————————————————————————————————————————————————————————————————————————————
// WALKER
// ————————————————————————————————————————————————————————————————————————————

/// Infer the fragment for a value node (the document's top-level object or
/// array). Pure: same node and options, same fragment.
pub fn walk(node: &Node, options: &InferenceOptions) -> Fragment {
    let mut fragment = Fragment { ty: Some(node.kind.schema_type()), ..Fragment::default() };
    fill_container(&mut fragment, node, options);
    fragment
}

fn fill_container(fragment: &mut Fragment, node: &Node, options: &InferenceOptions) {
    match node.kind {
        NodeKind::Object => {
            fragment.ty = Some("object");
            let mut properties = IndexMap::new();
            for child in &node.children {
                if child.kind != NodeKind::Property {
                    continue;
                }
                // malformed properties (value never arrived) are skipped
                let (Some(key), Some(inferred)) = (child.key(), property_fragment(child, options))
                else {
                    continue;
                };
                properties.insert(key.to_string(), inferred);
            }
            fragment.properties = Some(properties);
        }
        NodeKind::Array => {
            fragment.ty = Some("array");
            let mut items = Fragment::default();
            for element in &node.children {
                merge(&mut items, element_fragment(element, options));
            }
            fragment.items = Some(Box::new(items));
        }
        _ => {}
    }
}

fn property_fragment(property: &Node, options: &InferenceOptions) -> Option<Fragment> {
    let value = property.value_child()?;
    let mut fragment = Fragment { ty: Some(value.kind.schema_type()), ..Fragment::default() };
    let annotations = &options.annotations;
    if !property.comment.is_empty() {
        let comment = property.comment.join(" ");
        if annotations.infer_title {
            fragment.title = Some(comment.clone());
        }
        if annotations.infer_description {
            fragment.description = Some(comment);
        }
    }
    if annotations.infer_default {
        fragment.default = Some(materialize(value));
    }
    if annotations.infer_examples {
        fragment.examples = Some(vec![materialize(value)]);
    }
    fragment.read_only = annotations.read_only;
    fragment.write_only = annotations.write_only;
    fill_container(&mut fragment, value, options);
    Some(fragment)
}

fn element_fragment(element: &Node, options: &InferenceOptions) -> Fragment {
    let mut fragment = Fragment { ty: Some(element.kind.schema_type()), ..Fragment::default() };
    if options.annotations.infer_default {
        fragment.default = Some(materialize(element));
    }
    if options.annotations.infer_examples {
        fragment.examples = Some(vec![materialize(element)]);
    }
    fill_container(&mut fragment, element, options);
    fragment
}

/// Fold `next` into `into`: scalar keywords from later elements win, while
/// `properties` entries union per-key and `items` merges recursively.
fn merge(into: &mut Fragment, next: Fragment) {
    if next.ty.is_some() {
        into.ty = next.ty;
    }
    if next.title.is_some() {
        into.title = next.title;
    }
    if next.description.is_some() {
        into.description = next.description;
    }
    if next.default.is_some() {
        into.default = next.default;
    }
    if next.examples.is_some() {
        into.examples = next.examples;
    }
    if next.read_only.is_some() {
        into.read_only = next.read_only;
    }
    if next.write_only.is_some() {
        into.write_only = next.write_only;
    }
    if let Some(properties) = next.properties {
        match &mut into.properties {
            Some(existing) => existing.extend(properties),
            None => into.properties = Some(properties),
        }
    }
    if let Some(items) = next.items {
        match &mut into.items {
            Some(existing) => merge(existing, *items),
            None => into.items = Some(items),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT ASSEMBLY
// ————————————————————————————————————————————————————————————————————————————

pub const META_SCHEMA_URI: &str = "http://json-schema.org/draft-07/schema";

/// Assemble the final schema document: fixed header fields, then the walked
/// top-level fragment merged over them (its `type` and `properties`/`items`
/// override or extend the header).
pub fn emit_document(top: &Node, name: &str, options: &InferenceOptions) -> Value {
    let mut doc = serde_json::Map::new();
    doc.insert("$schema".into(), Value::String(META_SCHEMA_URI.into()));
    doc.insert("$id".into(), Value::String(name.into()));
    doc.insert("title".into(), Value::String(name.into()));
    doc.insert("type".into(), Value::String("object".into()));
    let fragment = walk(top, options);
    if let Ok(Value::Object(map)) = serde_json::to_value(&fragment) {
        for (key, value) in map {
            doc.insert(key, value);
        }
    }
    Value::Object(doc)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_tree;
    use serde_json::json;

    fn infer(src: &str, options: &InferenceOptions) -> Value {
        let (root, _) = parse_tree(src);
        let top = root.children.first().expect("top-level value");
        serde_json::to_value(walk(top, options)).expect("fragment serializes")
    }

    fn infer_default(src: &str) -> Value {
        infer(src, &InferenceOptions::default())
    }

    #[test]
    fn commented_number_property() {
        let schema = infer_default("{\"port\": 8080 // server port\n}");
        assert_eq!(
            schema["properties"]["port"],
            json!({
                "type": "number",
                "title": "server port",
                "default": 8080,
                "examples": [8080]
            })
        );
    }

    #[test]
    fn string_array_items_last_element_wins() {
        let schema = infer_default(r#"{"tags": ["a","b"]}"#);
        assert_eq!(
            schema["properties"]["tags"],
            json!({
                "type": "array",
                "default": ["a", "b"],
                "examples": [["a", "b"]],
                "items": {
                    "type": "string",
                    "default": "b",
                    "examples": ["b"]
                }
            })
        );
    }

    #[test]
    fn empty_object_has_empty_properties() {
        let schema = infer_default("{}");
        assert_eq!(schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn empty_array_has_empty_items() {
        let schema = infer_default(r#"{"xs": []}"#);
        assert_eq!(schema["properties"]["xs"]["items"], json!({}));
    }

    #[test]
    fn heterogeneous_array_accumulates_structure() {
        let schema = infer_default(r#"{"xs": [1, {"a": true}]}"#);
        let items = &schema["properties"]["xs"]["items"];
        assert_eq!(items["type"], "object");
        assert_eq!(items["default"], json!({"a": true}));
        assert_eq!(items["properties"]["a"]["type"], "boolean");
    }

    #[test]
    fn multi_line_comment_joins_with_single_space() {
        let src = "{\n// one\n// two\n\"a\": 1\n}";
        let schema = infer_default(src);
        assert_eq!(schema["properties"]["a"]["title"], "one two");
    }

    #[test]
    fn title_and_description_are_independent_toggles() {
        let src = "{\n// note\n\"a\": 1\n}";
        let mut options = InferenceOptions::default();
        options.annotations.infer_description = true;
        let schema = infer(src, &options);
        assert_eq!(schema["properties"]["a"]["title"], "note");
        assert_eq!(schema["properties"]["a"]["description"], "note");

        options.annotations.infer_title = false;
        let schema = infer(src, &options);
        assert!(schema["properties"]["a"].get("title").is_none());
        assert_eq!(schema["properties"]["a"]["description"], "note");
    }

    #[test]
    fn defaults_and_examples_can_be_switched_off() {
        let mut options = InferenceOptions::default();
        options.annotations.infer_default = false;
        options.annotations.infer_examples = false;
        let schema = infer(r#"{"a": 1}"#, &options);
        assert_eq!(schema["properties"]["a"], json!({"type": "number"}));
    }

    #[test]
    fn read_only_and_write_only_copied_verbatim_when_set() {
        let mut options = InferenceOptions::default();
        options.annotations.read_only = Some(true);
        let schema = infer(r#"{"a": 1}"#, &options);
        assert_eq!(schema["properties"]["a"]["readOnly"], true);
        assert!(schema["properties"]["a"].get("writeOnly").is_none());

        options.annotations.write_only = Some(false);
        let schema = infer(r#"{"a": 1}"#, &options);
        assert_eq!(schema["properties"]["a"]["writeOnly"], false);
    }

    #[test]
    fn nested_objects_mirror_the_tree() {
        let schema = infer_default(r#"{"server": {"host": "localhost", "on": true}}"#);
        let server = &schema["properties"]["server"];
        assert_eq!(server["type"], "object");
        assert_eq!(server["default"], json!({"host": "localhost", "on": true}));
        assert_eq!(server["properties"]["host"]["type"], "string");
        assert_eq!(server["properties"]["on"]["type"], "boolean");
    }

    #[test]
    fn null_property_gets_null_type() {
        let schema = infer_default(r#"{"nothing": null}"#);
        assert_eq!(schema["properties"]["nothing"]["type"], "null");
        assert_eq!(schema["properties"]["nothing"]["default"], Value::Null);
    }

    #[test]
    fn malformed_property_is_skipped_without_panic() {
        let schema = infer_default(r#"{"a":}"#);
        assert_eq!(schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn document_header_fields_and_order() {
        let (root, _) = parse_tree(r#"{"a": 1}"#);
        let doc = emit_document(&root.children[0], "config", &InferenceOptions::default());
        let rendered = serde_json::to_string(&doc).unwrap();
        assert!(rendered.starts_with(
            r#"{"$schema":"http://json-schema.org/draft-07/schema","$id":"config","title":"config","type":"object","properties":"#
        ));
    }

    #[test]
    fn top_level_array_overrides_header_type() {
        let (root, _) = parse_tree(r#"[1, 2]"#);
        let doc = emit_document(&root.children[0], "list", &InferenceOptions::default());
        assert_eq!(doc["type"], "array");
        assert_eq!(doc["items"]["type"], "number");
    }

    #[test]
    fn inference_is_deterministic_and_idempotent() {
        let src = "{\n// p\n\"port\": 8080,\n\"tags\": [\"a\", \"b\"]\n}";
        let (root_a, _) = parse_tree(src);
        let (root_b, _) = parse_tree(src);
        let options = InferenceOptions::default();
        let a = serde_json::to_string(&emit_document(&root_a.children[0], "x", &options)).unwrap();
        let b = serde_json::to_string(&emit_document(&root_b.children[0], "x", &options)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn options_round_trip_through_serde() {
        let options: InferenceOptions = serde_json::from_value(json!({
            "annotations": {"inferDescription": true, "readOnly": true},
            "assertions": {"string": {"minLength": 1}}
        }))
        .unwrap();
        assert!(options.annotations.infer_description);
        assert_eq!(options.annotations.read_only, Some(true));
        // unspecified switches keep their defaults
        assert!(options.annotations.infer_title);
        assert_eq!(options.assertions.string.min_length, Some(1));
    }
}
