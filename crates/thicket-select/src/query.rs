//! Query entry points.
//!
//! One-shot calls take selector text and compile it on the spot; callers that
//! run the same selector repeatedly compile once and pass the
//! [`CompiledQuery`] instead. Both paths give identical results.

use std::borrow::Cow;

use crate::compiler::CompiledQuery;
use crate::error::SelectorError;
use crate::matcher::MatchContext;
use crate::matcher::traversal::{self, Select, SelectMode};
use crate::options::CompileOptions;
use crate::parser::parse_selector_list_with;
use crate::tree::SelectorTree;

/// Compile selector text with default options.
///
/// # Errors
///
/// Returns [`SelectorError::Syntax`] for malformed text and
/// [`SelectorError::Unsupported`] for constructs this engine does not
/// implement.
pub fn compile(text: &str) -> Result<CompiledQuery, SelectorError> {
    compile_with(text, &CompileOptions::default())
}

/// Compile selector text with explicit options.
///
/// # Errors
///
/// See [`compile`].
pub fn compile_with(text: &str, options: &CompileOptions) -> Result<CompiledQuery, SelectorError> {
    let selectors = parse_selector_list_with(text, options)?;
    Ok(CompiledQuery::from_selector_list(text, selectors, options))
}

/// Anything a query function accepts as its selector: text to compile, or
/// an already compiled query.
pub trait IntoQuery<'a> {
    /// Produce a compiled query, compiling if necessary.
    ///
    /// # Errors
    ///
    /// Returns the compilation error for invalid selector text.
    fn into_query(self) -> Result<Cow<'a, CompiledQuery>, SelectorError>;
}

impl<'a> IntoQuery<'a> for &str {
    fn into_query(self) -> Result<Cow<'a, CompiledQuery>, SelectorError> {
        compile(self).map(Cow::Owned)
    }
}

impl<'a> IntoQuery<'a> for &String {
    fn into_query(self) -> Result<Cow<'a, CompiledQuery>, SelectorError> {
        compile(self).map(Cow::Owned)
    }
}

impl<'a> IntoQuery<'a> for &'a CompiledQuery {
    fn into_query(self) -> Result<Cow<'a, CompiledQuery>, SelectorError> {
        Ok(Cow::Borrowed(self))
    }
}

/// All elements under `root` matching `query`, in document order.
///
/// `root` itself is never part of the result. An empty vector means nothing
/// matched.
///
/// # Errors
///
/// Only if `query` is selector text that fails to compile.
pub fn select_all<'a, T: SelectorTree + ?Sized>(
    query: impl IntoQuery<'a>,
    tree: &T,
    root: T::Node,
) -> Result<Vec<T::Node>, SelectorError> {
    Ok(query.into_query()?.select_all(tree, root))
}

/// The first element under `root` matching `query` in document order.
///
/// # Errors
///
/// Only if `query` is selector text that fails to compile.
pub fn select_one<'a, T: SelectorTree + ?Sized>(
    query: impl IntoQuery<'a>,
    tree: &T,
    root: T::Node,
) -> Result<Option<T::Node>, SelectorError> {
    Ok(query.into_query()?.select_one(tree, root))
}

/// Whether `element` itself matches `query`.
///
/// # Errors
///
/// Only if `query` is selector text that fails to compile.
pub fn matches<'a, T: SelectorTree + ?Sized>(
    query: impl IntoQuery<'a>,
    tree: &T,
    element: T::Node,
) -> Result<bool, SelectorError> {
    Ok(query.into_query()?.matches(tree, element))
}

impl CompiledQuery {
    /// All elements under `root` that match, in document order.
    #[must_use]
    pub fn select_all<T: SelectorTree + ?Sized>(&self, tree: &T, root: T::Node) -> Vec<T::Node> {
        traversal::select(self, tree, &[root], SelectMode::All)
    }

    /// The first matching element under `root`, without looking further.
    #[must_use]
    pub fn select_one<T: SelectorTree + ?Sized>(
        &self,
        tree: &T,
        root: T::Node,
    ) -> Option<T::Node> {
        traversal::select(self, tree, &[root], SelectMode::First)
            .into_iter()
            .next()
    }

    /// All elements under any of `roots` that match.
    ///
    /// Roots may repeat or contain one another; each element is reported
    /// once, in document order.
    #[must_use]
    pub fn select_all_from<T: SelectorTree + ?Sized>(
        &self,
        tree: &T,
        roots: &[T::Node],
    ) -> Vec<T::Node> {
        traversal::select(self, tree, roots, SelectMode::All)
    }

    /// Select under `roots` with an explicit mode.
    #[must_use]
    pub fn select<T: SelectorTree + ?Sized>(
        &self,
        tree: &T,
        roots: &[T::Node],
        mode: SelectMode,
    ) -> Vec<T::Node> {
        traversal::select(self, tree, roots, mode)
    }

    /// Lazily iterate the elements under `root` that match.
    #[must_use]
    pub fn select_iter<'q, 't, T: SelectorTree + ?Sized>(
        &'q self,
        tree: &'t T,
        root: T::Node,
    ) -> Select<'q, 't, T> {
        Select::new(self, tree, &[root])
    }

    /// Whether `element` matches. Combinators may look at any ancestor or
    /// sibling.
    ///
    /// # Panics
    ///
    /// Panics if the query has no selectors, which only a hand-built empty
    /// selector list can produce.
    #[must_use]
    pub fn matches<T: SelectorTree + ?Sized>(&self, tree: &T, element: T::Node) -> bool {
        assert!(
            !self.branches.is_empty(),
            "compiled query {:?} has no selectors to match",
            self.source
        );
        MatchContext::new(tree, self.case_sensitive_names).matches_any(&self.branches, element)
    }
}
