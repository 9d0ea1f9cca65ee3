//! Per-call cache of element positions among siblings.

use std::collections::HashMap;
use std::hash::Hash;

use crate::tree::{SelectorTree, SiblingPosition};

/// Which siblings an index counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SiblingScope {
    /// Every element sibling.
    Child,
    /// Element siblings with the same local name.
    OfType,
}

/// Sibling positions computed during one traversal.
///
/// The first lookup for any child of a parent fills in the positions of all
/// of that parent's element children, so a scan over siblings is paid once
/// per parent rather than once per element.
#[derive(Debug)]
pub(crate) struct NthIndexCache<N> {
    positions: HashMap<(N, SiblingScope), SiblingPosition>,
}

impl<N: Copy + Eq + Hash> NthIndexCache<N> {
    pub(crate) fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Position of `element` within `scope`.
    ///
    /// Positions counted over every element sibling come from the tree when
    /// it tracks them.
    pub(crate) fn position<T>(
        &mut self,
        tree: &T,
        element: N,
        scope: SiblingScope,
        case_sensitive_names: bool,
    ) -> SiblingPosition
    where
        T: SelectorTree<Node = N> + ?Sized,
    {
        if scope == SiblingScope::Child
            && let Some(position) = tree.element_index(element)
        {
            return position;
        }
        if let Some(&position) = self.positions.get(&(element, scope)) {
            return position;
        }

        let siblings = element_siblings(tree, element);
        match scope {
            SiblingScope::Child => self.fill_child_positions(&siblings, element),
            SiblingScope::OfType => {
                self.fill_type_positions(tree, &siblings, element, case_sensitive_names)
            }
        }
    }

    fn fill_child_positions(&mut self, siblings: &[N], element: N) -> SiblingPosition {
        let count = siblings.len();
        let mut own = SiblingPosition { index: 1, count };
        for (i, &sibling) in siblings.iter().enumerate() {
            let position = SiblingPosition {
                index: i + 1,
                count,
            };
            if sibling == element {
                own = position;
            }
            let _ = self
                .positions
                .insert((sibling, SiblingScope::Child), position);
        }
        own
    }

    fn fill_type_positions<T>(
        &mut self,
        tree: &T,
        siblings: &[N],
        element: N,
        case_sensitive_names: bool,
    ) -> SiblingPosition
    where
        T: SelectorTree<Node = N> + ?Sized,
    {
        let type_key = |node: N| {
            let name = tree.local_name(node).unwrap_or_default();
            if case_sensitive_names {
                name.to_string()
            } else {
                name.to_ascii_lowercase()
            }
        };

        let keys: Vec<String> = siblings.iter().map(|&s| type_key(s)).collect();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for key in &keys {
            *counts.entry(key.as_str()).or_default() += 1;
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut own = SiblingPosition { index: 1, count: 1 };
        for (&sibling, key) in siblings.iter().zip(&keys) {
            let index = seen.entry(key.as_str()).or_default();
            *index += 1;
            let position = SiblingPosition {
                index: *index,
                count: counts.get(key.as_str()).copied().unwrap_or(1),
            };
            if sibling == element {
                own = position;
            }
            let _ = self
                .positions
                .insert((sibling, SiblingScope::OfType), position);
        }
        own
    }
}

/// All element children of `element`'s parent, in order, `element` included.
///
/// A parentless element is its own only sibling unless the tree links it to
/// other top-level nodes.
fn element_siblings<T: SelectorTree + ?Sized>(tree: &T, element: T::Node) -> Vec<T::Node> {
    let mut first = element;
    if let Some(first_child) = tree.parent(element).and_then(|p| tree.first_child(p)) {
        first = first_child;
    } else {
        while let Some(prev) = tree.prev_sibling(first) {
            first = prev;
        }
    }

    let mut siblings = Vec::new();
    let mut current = Some(first);
    while let Some(node) = current {
        if tree.is_element(node) {
            siblings.push(node);
        }
        current = tree.next_sibling(node);
    }
    siblings
}
