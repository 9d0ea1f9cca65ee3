//! CSS selector compilation and matching over element trees.
//!
//! # Scope
//!
//! This crate implements:
//! - **Selector Tokenizer** ([CSS Syntax § 4](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - Identifiers, hashes, strings, numbers and delimiters with byte offsets
//!   - Escape sequences and comments
//!
//! - **Selector Parser** ([Selectors Level 4 § 18](https://www.w3.org/TR/selectors-4/#grammar))
//!   - Type, universal, class, ID and attribute selectors (all six operators, `i`/`s` flags)
//!   - Compound and complex selectors with descendant, child and sibling combinators
//!   - Selector lists
//!   - Structural, negation, matches-any, link and form-state pseudo-classes
//!
//! - **Selector Compiler**
//!   - Per-compound test ordering by evaluation cost
//!   - Id-index seeding for selectors whose subject carries an id
//!
//! - **Matcher**
//!   - Right-to-left matching with bounded backtracking
//!   - Sibling positions computed once per parent per call
//!   - Lazy document-order traversal over one or many roots
//!
//! Any tree implementing [`SelectorTree`] can be queried; `thicket_dom::DomTree`
//! implements it out of the box.
//!
//! # Not Implemented
//!
//! - Pseudo-elements (`::before`), namespaces (`ns|div`), `:has()`
//! - Specificity and cascade
//!
//! # Example
//!
//! ```
//! use thicket_dom::{DomTree, ElementData, NodeId};
//!
//! let mut tree = DomTree::new();
//! let div = tree.append_element(NodeId::ROOT, ElementData::new("div"));
//! let p = tree.append_element(div, ElementData::new("p").with_attr("class", "intro"));
//!
//! let query = thicket_select::compile("div > p.intro").unwrap();
//! assert_eq!(query.select_all(&tree, NodeId::ROOT), vec![p]);
//! assert_eq!(thicket_select::select_one("p", &tree, div).unwrap(), Some(p));
//! ```

/// Caller-owned cache of compiled queries.
pub mod cache;
/// Selector compilation into execution plans.
pub mod compiler;
/// [`SelectorTree`] implementation for `thicket_dom::DomTree`.
pub mod dom;
/// Selector errors.
pub mod error;
/// Compilation options.
pub mod options;
/// Selector parser per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod parser;
/// Query entry points.
pub mod query;
/// Parsed selector structures per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Selector tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;
/// The node-model capability trait.
pub mod tree;

mod matcher;

// Re-exports for convenience
pub use cache::{QueryCache, QueryCacheStats};
pub use compiler::CompiledQuery;
pub use error::{SelectorError, SyntaxErrorKind};
pub use matcher::traversal::{Select, SelectMode};
pub use options::CompileOptions;
pub use parser::{parse_selector_list, parse_selector_list_with};
pub use query::{IntoQuery, compile, compile_with, matches, select_all, select_one};
pub use selector::{
    AttributeOperation, AttributeSelector, CaseSensitivity, Combinator, ComplexSelector,
    CompoundSelector, NthFormula, PseudoClass, PseudoClassKeyword, SelectorList, SimpleSelector,
};
pub use tree::{SelectorTree, SiblingPosition};
