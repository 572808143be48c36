//! JSON output of built trees.

use axtree::{parse_dom, AccessibilityTree, AriaProperties, TreeConfig, TreeRoot};
use serde_json::Value;

const PASTA: &str = include_str!("fixtures/pasta.html");

fn omit_aria() -> TreeConfig {
    TreeConfig::new().with_aria_properties(AriaProperties::Omit)
}

/// Recursively check that no member is null, `[]`, `{}` or a blank string.
fn assert_collapsed(value: &Value, path: &str) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                let here = format!("{path}.{key}");
                match member {
                    Value::Null => panic!("null at {here}"),
                    Value::Array(items) if items.is_empty() => panic!("empty array at {here}"),
                    Value::Object(fields) if fields.is_empty() => panic!("empty object at {here}"),
                    Value::String(s) if s.trim().is_empty() => panic!("blank string at {here}"),
                    _ => assert_collapsed(member, &here),
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                assert_collapsed(item, &format!("{path}[{i}]"));
            }
        }
        _ => {}
    }
}

#[test]
fn test_small_tree_raw_json() {
    let document = parse_dom(r#"<div id="r"><button aria-disabled="true">Go</button></div>"#).unwrap();
    let root = document.get_element_by_id("r").unwrap();
    let mut tree = AccessibilityTree::with_config(
        TreeRoot::Element {
            document: &document,
            element: root,
        },
        omit_aria(),
    );
    tree.build().unwrap();

    let expected = r#"{
    "children": [
        {
            "children": [],
            "name": "Go",
            "role": "button",
            "properties": {},
            "source": {},
            "states": {
                "disabled": true
            },
            "description": ""
        }
    ],
    "name": "",
    "role": "RootWebArea",
    "properties": {},
    "source": {},
    "states": {}
}"#;
    assert_eq!(tree.to_json_string(false), expected);
}

#[test]
fn test_small_tree_collapsed_json() {
    let document = parse_dom(r#"<div id="r"><button aria-disabled="true">Go</button></div>"#).unwrap();
    let root = document.get_element_by_id("r").unwrap();
    let mut tree = AccessibilityTree::with_config(
        TreeRoot::Element {
            document: &document,
            element: root,
        },
        omit_aria(),
    );
    tree.build().unwrap();

    let expected = r##"{
    "children": [
        {
            "name": "Go",
            "role": "button",
            "source": "#r > button",
            "states": {
                "disabled": true
            }
        }
    ],
    "role": "RootWebArea",
    "source": "#r"
}"##;
    assert_eq!(tree.to_json_string(true), expected);
}

#[test]
fn test_raw_json_round_trips() {
    let document = parse_dom(PASTA).unwrap();
    let mut tree = AccessibilityTree::new(&document);
    tree.build().unwrap();

    for collapse in [false, true] {
        let text = tree.to_json_string(collapse);
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        let direct = tree.to_object().unwrap().to_json_value(collapse).unwrap();
        assert_eq!(reparsed, direct, "collapse = {collapse}");
    }
}

#[test]
fn test_raw_json_shape() {
    let document = parse_dom(PASTA).unwrap();
    let mut tree = AccessibilityTree::new(&document);
    tree.build().unwrap();

    let text = tree.to_json_string(false);
    assert!(text.starts_with("{\n    \"children\": [\n        {\n"));

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["role"], "RootWebArea");
    assert_eq!(value["name"], "Pasta Lovers");
    assert_eq!(value["source"], serde_json::json!({}));
    assert!(value.get("description").is_none());
    assert!(value.get("value").is_none());

    let page = &value["children"][0];
    assert_eq!(page["description"], "");
    assert_eq!(page["properties"], serde_json::json!({}));
}

#[test]
fn test_collapsed_pasta_obeys_collapse_law() {
    let document = parse_dom(PASTA).unwrap();
    for config in [TreeConfig::default(), omit_aria(), TreeConfig::new().with_false_states(true)] {
        let mut tree = AccessibilityTree::with_config(&document, config);
        tree.build().unwrap();
        let value: Value = serde_json::from_str(&tree.to_json_string(true)).unwrap();
        assert_collapsed(&value, "$");
    }
}

#[test]
fn test_collapsed_drops_blank_aria_values() {
    let document = parse_dom(r#"<div aria-label="  " aria-describedby="">x</div>"#).unwrap();
    let mut tree = AccessibilityTree::new(&document);
    tree.build().unwrap();

    let value = tree.to_object().unwrap().to_json_value(true).unwrap();
    assert_collapsed(&value, "$");
    assert!(value["children"][0].get("properties").is_none());
}

#[test]
fn test_collapsed_selectors() {
    let document = parse_dom(PASTA).unwrap();
    let mut tree = AccessibilityTree::new(&document);
    tree.build().unwrap();

    let selector_of = |role: &str, index: usize| tree.find_by_role(role)[index].unique_selector();

    assert_eq!(tree.to_object().unwrap().unique_selector(), "html");
    assert_eq!(selector_of("navigation", 0), "html > body > div.page > header > nav");
    assert_eq!(
        selector_of("link", 1),
        "html > body > div.page > header > nav > a:nth-of-type(2)"
    );
    assert_eq!(selector_of("region", 0), "#about");
    assert_eq!(selector_of("heading", 1), "#about-title");
    assert_eq!(selector_of("img", 0), "#about > img");
    assert_eq!(selector_of("listitem", 2), "#about > ul > li:nth-of-type(3)");
    assert_eq!(selector_of("button", 0), "#recipes > form > button");
    assert_eq!(
        selector_of("contentinfo", 0),
        "html > body > div.page > footer"
    );

    let value: Value = serde_json::from_str(&tree.to_json_string(true)).unwrap();
    assert_eq!(value["source"], "html");
    let footer_note = &value["children"][0]["children"][2]["children"][0];
    assert_eq!(
        footer_note["source"],
        "html > body > div.page > footer > p:nth-of-type(1)"
    );
}
