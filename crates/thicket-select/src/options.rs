//! Compilation options.

use serde::{Deserialize, Serialize};

/// Knobs that affect how selector text is parsed and compiled.
///
/// Options are fixed at compile time; a [`CompiledQuery`](crate::CompiledQuery)
/// carries the choices it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Compare type selectors and attribute names exactly rather than
    /// ASCII case-insensitively.
    ///
    /// [§ 5.1](https://www.w3.org/TR/selectors-4/#type-selectors): in HTML
    /// documents element and attribute names are case-insensitive, so this
    /// defaults to `false`.
    pub case_sensitive_names: bool,

    /// Maximum nesting of `:not()`, `:is()` and `:nth-*( of S)` arguments.
    pub max_nesting_depth: usize,

    /// Seed id-subject selectors from the tree's id index when it has one.
    pub use_id_index: bool,
}

impl CompileOptions {
    /// Nesting limit used by [`CompileOptions::default`].
    pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            case_sensitive_names: false,
            max_nesting_depth: Self::DEFAULT_MAX_NESTING_DEPTH,
            use_id_index: true,
        }
    }
}
