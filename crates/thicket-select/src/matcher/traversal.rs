//! Candidate enumeration: which elements are offered to the matcher, and in
//! what order.

use std::collections::HashSet;
use std::vec;

use tracing::trace;

use super::MatchContext;
use crate::compiler::CompiledQuery;
use crate::tree::{Descendants, SelectorTree, document_order};

/// How many matches a traversal should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectMode {
    /// Every match, in document order.
    #[default]
    All,
    /// Stop as soon as the first match in document order is found.
    First,
}

/// Lazy iterator over the elements matching a query, in document order.
///
/// Created by [`CompiledQuery::select_iter`]. Work is done only as items are
/// pulled, so taking one item costs no more than finding it.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Select<'q, 't, T: SelectorTree + ?Sized> {
    query: &'q CompiledQuery,
    context: MatchContext<'t, T>,
    candidates: Candidates<'t, T>,
}

enum Candidates<'t, T: SelectorTree + ?Sized> {
    /// Elements pulled from the tree's id index, already restricted to the
    /// roots and sorted.
    Seeded(vec::IntoIter<T::Node>),
    /// Pre-order walk under each root in turn.
    Walk {
        tree: &'t T,
        roots: vec::IntoIter<T::Node>,
        current: Option<Descendants<'t, T>>,
    },
}

impl<'q, 't, T: SelectorTree + ?Sized> Select<'q, 't, T> {
    /// Start a traversal of `roots`.
    ///
    /// # Panics
    ///
    /// Panics if `query` has no branches, which only a hand-built empty
    /// selector list can produce.
    pub(crate) fn new(query: &'q CompiledQuery, tree: &'t T, roots: &[T::Node]) -> Self {
        assert!(
            !query.branches.is_empty(),
            "compiled query {:?} has no selectors to match",
            query.source
        );

        let roots = normalize_roots(tree, roots);
        let candidates = seeded_candidates(query, tree, &roots).map_or_else(
            || Candidates::Walk {
                tree,
                roots: roots.into_iter(),
                current: None,
            },
            |seeded| Candidates::Seeded(seeded.into_iter()),
        );

        Self {
            query,
            context: MatchContext::new(tree, query.case_sensitive_names),
            candidates,
        }
    }
}

impl<T: SelectorTree + ?Sized> Iterator for Select<'_, '_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = self.candidates.next()?;
            if self.context.matches_any(&self.query.branches, candidate) {
                return Some(candidate);
            }
        }
    }
}

impl<T: SelectorTree + ?Sized> Candidates<'_, T> {
    fn next(&mut self) -> Option<T::Node> {
        match self {
            Self::Seeded(nodes) => nodes.next(),
            Self::Walk {
                tree,
                roots,
                current,
            } => loop {
                if let Some(walk) = current
                    && let Some(node) = walk.find(|&n| tree.is_element(n))
                {
                    return Some(node);
                }
                *current = Some(Descendants::new(*tree, roots.next()?));
            },
        }
    }
}

/// Run `query` over `roots` and collect the result.
pub(crate) fn select<T: SelectorTree + ?Sized>(
    query: &CompiledQuery,
    tree: &T,
    roots: &[T::Node],
    mode: SelectMode,
) -> Vec<T::Node> {
    let iter = Select::new(query, tree, roots);
    let matches: Vec<T::Node> = match mode {
        SelectMode::All => iter.collect(),
        SelectMode::First => iter.take(1).collect(),
    };
    trace!(
        selector = %query.source,
        ?mode,
        roots = roots.len(),
        matches = matches.len(),
        "selected"
    );
    matches
}

/// Drop duplicate roots and roots inside other roots, then sort the rest
/// into document order so their subtrees come out in order.
fn normalize_roots<T: SelectorTree + ?Sized>(tree: &T, roots: &[T::Node]) -> Vec<T::Node> {
    let given: HashSet<T::Node> = roots.iter().copied().collect();
    let mut seen = HashSet::with_capacity(roots.len());
    let mut kept: Vec<T::Node> = roots
        .iter()
        .copied()
        .filter(|&root| seen.insert(root))
        .filter(|&root| !has_ancestor_in(tree, root, &given))
        .collect();
    kept.sort_by(|&a, &b| document_order(tree, a, b));
    kept
}

fn has_ancestor_in<T: SelectorTree + ?Sized>(
    tree: &T,
    node: T::Node,
    set: &HashSet<T::Node>,
) -> bool {
    let mut current = tree.parent(node);
    while let Some(ancestor) = current {
        if set.contains(&ancestor) {
            return true;
        }
        current = tree.parent(ancestor);
    }
    false
}

/// Candidates from the tree's id index, when every branch names an id and
/// the tree has an index. `None` means fall back to walking.
fn seeded_candidates<T: SelectorTree + ?Sized>(
    query: &CompiledQuery,
    tree: &T,
    roots: &[T::Node],
) -> Option<Vec<T::Node>> {
    let ids = query.id_seeds()?;
    let roots: HashSet<T::Node> = roots.iter().copied().collect();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for id in ids {
        for &element in tree.elements_with_id(id)? {
            // Roots themselves are never candidates.
            if has_ancestor_in(tree, element, &roots) && seen.insert(element) {
                candidates.push(element);
            }
        }
    }
    candidates.sort_by(|&a, &b| document_order(tree, a, b));
    Some(candidates)
}
