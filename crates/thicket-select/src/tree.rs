//! The read-only view of a node tree that selector matching needs.
//!
//! [§ 3.2 Data Model](https://www.w3.org/TR/selectors-4/#data-model)
//!
//! "Selectors are evaluated against a document tree... each element may have
//! any of: a type, a namespace, an ID, classes, attributes, and pseudo-classes."
//!
//! Any tree can be queried by implementing [`SelectorTree`]. Only the
//! navigation, attribute and text primitives are required; everything else
//! has a default built on top of them that an implementation may override
//! with a faster lookup.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::hash::Hash;

/// Position of an element among its parent's element children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiblingPosition {
    /// 1-based index counted from the first element sibling.
    pub index: usize,
    /// Number of element siblings, the element itself included.
    pub count: usize,
}

impl SiblingPosition {
    /// 1-based index counted from the last element sibling.
    #[must_use]
    pub const fn index_from_end(&self) -> usize {
        self.count + 1 - self.index
    }
}

/// Capability contract between the selector engine and a node tree.
///
/// The engine never mutates the tree and assumes it does not change for the
/// duration of a single call.
pub trait SelectorTree {
    /// A cheap handle identifying one node of this tree.
    type Node: Copy + Eq + Hash + Debug;

    /// Whether `node` is an element. Only elements can match a selector.
    fn is_element(&self, node: Self::Node) -> bool;

    /// The element's local (tag) name; `None` for non-elements.
    fn local_name(&self, node: Self::Node) -> Option<&str>;

    /// The value of the attribute called exactly `name`.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// The node's parent, element or not.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The node's first child, element or not.
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    /// The node immediately after this one in its parent's children.
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// The node immediately before this one in its parent's children.
    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Text carried directly by a text node.
    ///
    /// `None` for elements and for nodes that never count as content, such
    /// as comments. `:empty` depends on this being accurate.
    fn text(&self, node: Self::Node) -> Option<&str>;

    /// Attribute lookup with ASCII case-insensitive name comparison.
    ///
    /// The default assumes attribute names are stored lowercase, as HTML
    /// parsers produce them.
    fn attribute_ignore_ascii_case(&self, node: Self::Node, lowercase_name: &str) -> Option<&str> {
        self.attribute(node, lowercase_name)
    }

    /// [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    ///
    /// An element whose parent is not an element.
    fn is_root_element(&self, node: Self::Node) -> bool {
        self.is_element(node) && self.parent(node).is_none_or(|p| !self.is_element(p))
    }

    /// The element's id.
    fn id(&self, node: Self::Node) -> Option<&str> {
        self.attribute(node, "id")
    }

    /// Whether the element's class list contains `class`.
    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    ///
    /// No element children and no text other than document white space.
    fn is_empty_element(&self, node: Self::Node) -> bool {
        let mut child = self.first_child(node);
        while let Some(c) = child {
            if self.is_element(c)
                || self
                    .text(c)
                    .is_some_and(|t| !t.trim_ascii().is_empty())
            {
                return false;
            }
            child = self.next_sibling(c);
        }
        true
    }

    /// Constant-time position among element siblings, if the tree tracks it.
    ///
    /// Returning `None` makes the engine compute positions itself, once per
    /// parent per call.
    fn element_index(&self, _node: Self::Node) -> Option<SiblingPosition> {
        None
    }

    /// Elements whose id is `id`, in document order.
    ///
    /// `None` means the tree has no id index; `Some(&[])` means it has one
    /// and nothing carries that id.
    fn elements_with_id(&self, _id: &str) -> Option<&[Self::Node]> {
        None
    }
}

/// The nearest preceding sibling that is an element.
pub fn prev_element_sibling<T: SelectorTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    let mut current = tree.prev_sibling(node);
    while let Some(n) = current {
        if tree.is_element(n) {
            return Some(n);
        }
        current = tree.prev_sibling(n);
    }
    None
}

/// The nearest following sibling that is an element.
pub fn next_element_sibling<T: SelectorTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    let mut current = tree.next_sibling(node);
    while let Some(n) = current {
        if tree.is_element(n) {
            return Some(n);
        }
        current = tree.next_sibling(n);
    }
    None
}

/// The parent, if it is an element.
pub fn parent_element<T: SelectorTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    tree.parent(node).filter(|&p| tree.is_element(p))
}

/// Pre-order iterator over the descendants of a node, the node excluded.
///
/// Walks sibling and parent links, so it needs no stack.
pub struct Descendants<'a, T: SelectorTree + ?Sized> {
    tree: &'a T,
    root: T::Node,
    next: Option<T::Node>,
}

impl<'a, T: SelectorTree + ?Sized> Descendants<'a, T> {
    /// Start iterating below `root`.
    pub fn new(tree: &'a T, root: T::Node) -> Self {
        Self {
            tree,
            root,
            next: tree.first_child(root),
        }
    }

    fn following_outside(&self, mut node: T::Node) -> Option<T::Node> {
        loop {
            if node == self.root {
                return None;
            }
            if let Some(sibling) = self.tree.next_sibling(node) {
                return Some(sibling);
            }
            node = self.tree.parent(node)?;
        }
    }
}

impl<T: SelectorTree + ?Sized> Iterator for Descendants<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = self
            .tree
            .first_child(node)
            .or_else(|| self.following_outside(node));
        Some(node)
    }
}

/// Compare two nodes by document (pre-order) position.
///
/// An ancestor sorts before its descendants. Nodes from disconnected trees
/// compare equal.
pub fn document_order<T: SelectorTree + ?Sized>(tree: &T, a: T::Node, b: T::Node) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let path_a = root_path(tree, a);
    let path_b = root_path(tree, b);

    let common = path_a
        .iter()
        .zip(&path_b)
        .take_while(|(x, y)| x == y)
        .count();

    match (path_a.get(common), path_b.get(common)) {
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        // Distinct top-level nodes are only comparable if they are siblings.
        (Some(&branch_a), Some(&branch_b)) => {
            sibling_order(tree, branch_a, branch_b).unwrap_or(Ordering::Equal)
        }
    }
}

/// Ancestors of `node` from the topmost down to `node` itself.
fn root_path<T: SelectorTree + ?Sized>(tree: &T, node: T::Node) -> Vec<T::Node> {
    let mut path = vec![node];
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

fn sibling_order<T: SelectorTree + ?Sized>(tree: &T, a: T::Node, b: T::Node) -> Option<Ordering> {
    let mut current = tree.next_sibling(a);
    while let Some(n) = current {
        if n == b {
            return Some(Ordering::Less);
        }
        current = tree.next_sibling(n);
    }
    let mut current = tree.prev_sibling(a);
    while let Some(n) = current {
        if n == b {
            return Some(Ordering::Greater);
        }
        current = tree.prev_sibling(n);
    }
    None
}
