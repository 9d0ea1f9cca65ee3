//! JSON tree descriptions.
//!
//! A lightweight interchange format so trees can be produced by any external
//! parser and handed to the selector engine:
//!
//! ```json
//! {"tag": "div", "attrs": {"class": "card"}, "children": [
//!     {"text": "hello"},
//!     {"comment": "ignored by selectors"}
//! ]}
//! ```
//!
//! A document is either a single node description or an array of them; each
//! top-level entry becomes a child of the Document node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DomTree, ElementData, NodeId, NodeType};

/// Errors produced while loading a tree description.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input was not valid JSON for a tree description.
    #[error("invalid tree description: {0}")]
    Json(#[from] serde_json::Error),

    /// An element was described with an empty tag name.
    #[error("element at {path} has an empty tag name")]
    EmptyTag {
        /// Slash-separated child indices leading to the offending node.
        path: String,
    },
}

/// One node of a tree description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeDescription {
    /// An element with optional attributes and children.
    Element {
        /// Local name of the element.
        tag: String,
        /// Attribute map; ordered so serialization is stable.
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        /// Child nodes in tree order.
        #[serde(default)]
        children: Vec<NodeDescription>,
    },
    /// A text node.
    Text {
        /// Character data.
        text: String,
    },
    /// A comment node.
    Comment {
        /// Comment data.
        comment: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<NodeDescription>),
    One(NodeDescription),
}

/// Parse a JSON document into a [`DomTree`].
///
/// # Errors
///
/// Returns [`LoadError::Json`] for malformed input and
/// [`LoadError::EmptyTag`] for elements without a tag name.
pub fn from_json_str(input: &str) -> Result<DomTree, LoadError> {
    let nodes = match serde_json::from_str::<Document>(input)? {
        Document::Many(nodes) => nodes,
        Document::One(node) => vec![node],
    };
    from_descriptions(&nodes)
}

/// Build a [`DomTree`] from already-deserialized descriptions.
///
/// # Errors
///
/// Returns [`LoadError::EmptyTag`] for elements without a tag name.
pub fn from_descriptions(nodes: &[NodeDescription]) -> Result<DomTree, LoadError> {
    let mut tree = DomTree::new();
    for (index, node) in nodes.iter().enumerate() {
        attach(&mut tree, NodeId::ROOT, node, &index.to_string())?;
    }
    Ok(tree)
}

fn attach(
    tree: &mut DomTree,
    parent: NodeId,
    node: &NodeDescription,
    path: &str,
) -> Result<(), LoadError> {
    match node {
        NodeDescription::Element {
            tag,
            attrs,
            children,
        } => {
            if tag.is_empty() {
                return Err(LoadError::EmptyTag {
                    path: path.to_string(),
                });
            }
            let data = ElementData {
                tag_name: tag.clone(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            };
            let id = tree.append_element(parent, data);
            for (index, child) in children.iter().enumerate() {
                attach(tree, id, child, &format!("{path}/{index}"))?;
            }
        }
        NodeDescription::Text { text } => {
            let _ = tree.append_text(parent, text.clone());
        }
        NodeDescription::Comment { comment } => {
            let id = tree.alloc(NodeType::Comment(comment.clone()));
            tree.append_child(parent, id);
        }
    }
    Ok(())
}

/// Describe the subtree rooted at `id` (the inverse of loading).
///
/// Returns `None` for the Document node, which has no description of its own.
#[must_use]
pub fn describe(tree: &DomTree, id: NodeId) -> Option<NodeDescription> {
    let node = tree.get(id)?;
    match &node.node_type {
        NodeType::Document => None,
        NodeType::Element(data) => Some(NodeDescription::Element {
            tag: data.tag_name.clone(),
            attrs: data
                .attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            children: node
                .children
                .iter()
                .filter_map(|&child| describe(tree, child))
                .collect(),
        }),
        NodeType::Text(text) => Some(NodeDescription::Text { text: text.clone() }),
        NodeType::Comment(comment) => Some(NodeDescription::Comment {
            comment: comment.clone(),
        }),
    }
}
