//! [`SelectorTree`] for the arena tree in `thicket-dom`.

use thicket_dom::{DomTree, NodeId, NodeType};

use crate::tree::SelectorTree;

impl SelectorTree for DomTree {
    type Node = NodeId;

    fn is_element(&self, node: NodeId) -> bool {
        self.as_element(node).is_some()
    }

    fn local_name(&self, node: NodeId) -> Option<&str> {
        self.as_element(node).map(|e| e.tag_name.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.as_element(node)?.attrs.get(name).map(String::as_str)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        Self::parent(self, node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        Self::first_child(self, node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        Self::next_sibling(self, node)
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        Self::prev_sibling(self, node)
    }

    fn attribute_ignore_ascii_case(&self, node: NodeId, lowercase_name: &str) -> Option<&str> {
        let attrs = &self.as_element(node)?.attrs;
        attrs.get(lowercase_name).map(String::as_str).or_else(|| {
            attrs
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(lowercase_name))
                .map(|(_, value)| value.as_str())
        })
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.as_text(node)
    }

    fn id(&self, node: NodeId) -> Option<&str> {
        self.as_element(node)?.id()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.as_element(node).is_some_and(|e| e.has_class(class))
    }

    // Comments never count as content.
    fn is_empty_element(&self, node: NodeId) -> bool {
        self.children(node)
            .iter()
            .all(|&c| match self.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.trim_ascii().is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            })
    }

    fn elements_with_id(&self, id: &str) -> Option<&[NodeId]> {
        Self::elements_with_id(self, id)
    }
}

#[cfg(test)]
mod tests {
    use thicket_dom::ElementData;

    use super::*;

    #[test]
    fn test_attribute_name_folding() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, ElementData::new("div").with_attr("Data-X", "1"));
        assert_eq!(tree.attribute(div, "data-x"), None);
        assert_eq!(tree.attribute_ignore_ascii_case(div, "data-x"), Some("1"));
    }

    #[test]
    fn test_root_element_and_empty() {
        let mut tree = DomTree::new();
        let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
        let body = tree.append_element(html, ElementData::new("body"));
        let _ = tree.append_text(body, "  \n");
        assert!(tree.is_root_element(html));
        assert!(!tree.is_root_element(body));
        assert!(!tree.is_root_element(NodeId::ROOT));
        assert!(tree.is_empty_element(body));
        assert!(!tree.is_empty_element(html));
    }
}
