//! Selector compilation.
//!
//! A [`SelectorList`] is lowered into a [`CompiledQuery`]: every compound
//! becomes a flat list of tests sorted so the cheapest, most selective
//! checks run first, and every branch of the list records how its
//! candidates are found.

use tracing::debug;

use crate::options::CompileOptions;
use crate::selector::{
    AttributeOperation, CaseSensitivity, Combinator, ComplexSelector, CompoundSelector,
    NthFormula, PseudoClass, PseudoClassKeyword, SelectorList, SimpleSelector,
};

/// An immutable, reusable matcher built from selector text.
///
/// Compiling is pure: the same text and options always produce a query with
/// the same matching behaviour. A compiled query holds no interior state, so
/// it can be shared between threads and used by concurrent traversals.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub(crate) source: String,
    pub(crate) selectors: SelectorList,
    pub(crate) branches: Vec<Branch>,
    pub(crate) case_sensitive_names: bool,
    pub(crate) use_id_index: bool,
    needs_sibling_positions: bool,
}

impl CompiledQuery {
    /// Build the execution plan for an already parsed selector list.
    ///
    /// `source` is kept only for display and diagnostics.
    #[must_use]
    pub fn from_selector_list(
        source: impl Into<String>,
        selectors: SelectorList,
        options: &CompileOptions,
    ) -> Self {
        let compiler = Compiler {
            case_sensitive_names: options.case_sensitive_names,
        };
        let branches = compiler.compile_list(&selectors);
        let needs_sibling_positions = branches.iter().any(Branch::needs_sibling_positions);

        let query = Self {
            source: source.into(),
            selectors,
            branches,
            case_sensitive_names: options.case_sensitive_names,
            use_id_index: options.use_id_index,
            needs_sibling_positions,
        };
        debug!(
            selector = %query.source,
            branches = query.branches.len(),
            id_seeded = query.id_seeds().is_some(),
            needs_sibling_positions,
            subject_only = query.is_subject_only(),
            "compiled selector"
        );
        query
    }

    /// The selector text this query was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed form of the selector.
    #[must_use]
    pub const fn selector_list(&self) -> &SelectorList {
        &self.selectors
    }

    /// Whether matching needs element positions among siblings
    /// (`:nth-child()`, `:first-of-type` and friends).
    ///
    /// Informational only. It is logged on compile, and traversal computes
    /// positions lazily whether or not this is set.
    #[must_use]
    pub const fn needs_sibling_positions(&self) -> bool {
        self.needs_sibling_positions
    }

    /// Whether every branch is a single compound, so that no ancestor or
    /// sibling ever has to be inspected outside of pseudo-classes.
    ///
    /// Informational only, like [`Self::needs_sibling_positions`].
    #[must_use]
    pub fn is_subject_only(&self) -> bool {
        self.branches.iter().all(|b| b.links.is_empty())
    }

    /// The id each branch is seeded from, if every branch has one and the
    /// query was compiled with the id index enabled.
    pub(crate) fn id_seeds(&self) -> Option<Vec<&str>> {
        if !self.use_id_index {
            return None;
        }
        self.branches
            .iter()
            .map(|b| match &b.seed {
                Seed::IdLookup(id) => Some(id.as_str()),
                Seed::Traverse => None,
            })
            .collect()
    }
}

/// One complex selector of the list, ready to run.
#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub(crate) subject: CompiledCompound,
    /// Steps outward from the subject, nearest first.
    pub(crate) links: Vec<Link>,
    pub(crate) seed: Seed,
}

impl Branch {
    fn needs_sibling_positions(&self) -> bool {
        self.subject.needs_sibling_positions()
            || self.links.iter().any(|l| l.compound.needs_sibling_positions())
    }
}

/// A combinator and the compound on its far side.
#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub(crate) combinator: Combinator,
    pub(crate) compound: CompiledCompound,
}

/// How candidates for a branch's subject are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Seed {
    /// The subject carries this id; look it up when the tree has an index.
    IdLookup(String),
    /// Walk every element under the roots.
    Traverse,
}

/// The tests of one compound, cheapest first. Empty means "any element".
#[derive(Debug, Clone)]
pub(crate) struct CompiledCompound {
    pub(crate) tests: Vec<Test>,
}

impl CompiledCompound {
    fn needs_sibling_positions(&self) -> bool {
        self.tests.iter().any(Test::needs_sibling_positions)
    }
}

/// A single check against one element.
#[derive(Debug, Clone)]
pub(crate) enum Test {
    /// Never true in a static tree.
    Never,
    Id(String),
    /// Lowercased unless names are case-sensitive.
    LocalName(String),
    Class(String),
    Attribute {
        /// Lowercased unless names are case-sensitive.
        name: String,
        operation: AttributeOperation,
        case: CaseSensitivity,
    },
    Keyword(PseudoClassKeyword),
    NthChild {
        formula: NthFormula,
        from_end: bool,
        of: Option<Vec<Branch>>,
    },
    NthOfType {
        formula: NthFormula,
        from_end: bool,
    },
    Not(Vec<Branch>),
    Is(Vec<Branch>),
}

impl Test {
    /// Relative evaluation cost. Lower runs first.
    fn rank(&self) -> u8 {
        match self {
            Self::Never => 0,
            Self::Id(_) => 1,
            Self::LocalName(_) => 2,
            Self::Class(_) => 3,
            Self::Attribute { operation, .. } => {
                if *operation == AttributeOperation::Exists {
                    4
                } else {
                    5
                }
            }
            Self::Keyword(keyword) => {
                if keyword.is_structural() {
                    7
                } else {
                    6
                }
            }
            Self::NthChild { of: None, .. } | Self::NthOfType { .. } => 7,
            Self::NthChild { of: Some(_), .. } | Self::Not(_) | Self::Is(_) => 8,
        }
    }

    fn needs_sibling_positions(&self) -> bool {
        match self {
            Self::Keyword(keyword) => keyword.is_structural(),
            Self::NthChild { .. } | Self::NthOfType { .. } => true,
            Self::Not(branches) | Self::Is(branches) => {
                branches.iter().any(Branch::needs_sibling_positions)
            }
            _ => false,
        }
    }
}

struct Compiler {
    case_sensitive_names: bool,
}

impl Compiler {
    fn compile_list(&self, list: &SelectorList) -> Vec<Branch> {
        list.selectors
            .iter()
            .map(|complex| self.compile_complex(complex))
            .collect()
    }

    fn compile_complex(&self, complex: &ComplexSelector) -> Branch {
        let subject = self.compile_compound(&complex.subject);
        let seed = subject
            .tests
            .iter()
            .find_map(|test| match test {
                Test::Id(id) => Some(Seed::IdLookup(id.clone())),
                _ => None,
            })
            .unwrap_or(Seed::Traverse);

        let links = complex
            .combinators
            .iter()
            .map(|(combinator, compound)| Link {
                combinator: *combinator,
                compound: self.compile_compound(compound),
            })
            .collect();

        Branch {
            subject,
            links,
            seed,
        }
    }

    fn compile_compound(&self, compound: &CompoundSelector) -> CompiledCompound {
        let mut tests: Vec<Test> = compound
            .simple_selectors
            .iter()
            .filter_map(|simple| self.compile_simple(simple))
            .collect();
        tests.sort_by_key(Test::rank);
        CompiledCompound { tests }
    }

    /// `None` for selectors that always hold, i.e. `*`.
    fn compile_simple(&self, simple: &SimpleSelector) -> Option<Test> {
        Some(match simple {
            SimpleSelector::Universal => return None,
            SimpleSelector::NeverMatch => Test::Never,
            SimpleSelector::Type(name) => Test::LocalName(self.fold_name(name)),
            SimpleSelector::Id(id) => Test::Id(id.clone()),
            SimpleSelector::Class(class) => Test::Class(class.clone()),
            SimpleSelector::Attribute(attr) => Test::Attribute {
                name: self.fold_name(&attr.name),
                operation: attr.operation.clone(),
                case: attr.case,
            },
            SimpleSelector::PseudoClass(pseudo) => self.compile_pseudo_class(pseudo),
        })
    }

    fn compile_pseudo_class(&self, pseudo: &PseudoClass) -> Test {
        match pseudo {
            PseudoClass::Keyword(keyword) => Test::Keyword(*keyword),
            PseudoClass::NthChild { formula, of } => Test::NthChild {
                formula: *formula,
                from_end: false,
                of: of.as_deref().map(|list| self.compile_list(list)),
            },
            PseudoClass::NthLastChild { formula, of } => Test::NthChild {
                formula: *formula,
                from_end: true,
                of: of.as_deref().map(|list| self.compile_list(list)),
            },
            PseudoClass::NthOfType(formula) => Test::NthOfType {
                formula: *formula,
                from_end: false,
            },
            PseudoClass::NthLastOfType(formula) => Test::NthOfType {
                formula: *formula,
                from_end: true,
            },
            PseudoClass::Not(list) => Test::Not(self.compile_list(list)),
            PseudoClass::Is(list) => Test::Is(self.compile_list(list)),
        }
    }

    fn fold_name(&self, name: &str) -> String {
        if self.case_sensitive_names {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }
}
