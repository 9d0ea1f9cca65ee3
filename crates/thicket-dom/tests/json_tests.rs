//! Tests for loading trees from JSON descriptions.

use thicket_dom::json::{LoadError, NodeDescription, describe, from_json_str};
use thicket_dom::{NodeId, NodeType};

#[test]
fn test_load_single_root() {
    let tree = from_json_str(
        r#"{"tag": "html", "children": [
            {"tag": "body", "attrs": {"class": "x y"}, "children": [{"text": "hi"}]}
        ]}"#,
    )
    .unwrap();

    let html = tree.document_element().unwrap();
    assert_eq!(tree.as_element(html).unwrap().tag_name, "html");

    let body = tree.children(html)[0];
    let data = tree.as_element(body).unwrap();
    assert!(data.has_class("y"));
    assert_eq!(tree.as_text(tree.children(body)[0]), Some("hi"));
}

#[test]
fn test_load_forest() {
    let tree = from_json_str(r#"[{"tag": "a"}, {"comment": "c"}, {"tag": "b"}]"#).unwrap();
    let top = tree.children(NodeId::ROOT);
    assert_eq!(top.len(), 3);
    assert!(matches!(
        tree.get(top[1]).map(|n| &n.node_type),
        Some(NodeType::Comment(c)) if c == "c"
    ));
    assert_eq!(tree.next_sibling(top[0]), Some(top[1]));
    assert_eq!(tree.prev_sibling(top[2]), Some(top[1]));
}

#[test]
fn test_empty_tag_is_rejected_with_path() {
    let err = from_json_str(r#"{"tag": "div", "children": [{"text": "x"}, {"tag": ""}]}"#)
        .unwrap_err();
    assert!(matches!(err, LoadError::EmptyTag { ref path } if path == "0/1"));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(from_json_str("{"), Err(LoadError::Json(_))));
}

#[test]
fn test_describe_round_trips_structure() {
    let input = r#"{"tag": "ul", "attrs": {"id": "list"}, "children": [{"tag": "li"}, {"text": "t"}]}"#;
    let tree = from_json_str(input).unwrap();
    let ul = tree.document_element().unwrap();

    let expected: NodeDescription = serde_json::from_str(input).unwrap();
    assert_eq!(describe(&tree, ul), Some(expected));
    assert_eq!(describe(&tree, NodeId::ROOT), None);
}
