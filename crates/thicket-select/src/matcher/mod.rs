//! [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
//!
//! Matching runs right to left: the subject compound is tested against the
//! candidate first, and only on success are the combinators walked outward
//! through ancestors and earlier siblings.

mod nth_cache;
pub mod traversal;

use crate::compiler::{Branch, CompiledCompound, Link, Test};
use crate::selector::{Combinator, PseudoClassKeyword};
use crate::tree::{
    SelectorTree, SiblingPosition, next_element_sibling, parent_element, prev_element_sibling,
};

use nth_cache::{NthIndexCache, SiblingScope};

/// Outcome of matching a compound and everything to its left.
///
/// The failure variants tell the caller how far back it must go before a
/// different candidate could possibly succeed, which bounds the work of
/// descendant and subsequent-sibling backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchResult {
    Matched,
    /// Try an earlier sibling, or a farther ancestor past a `~`.
    NotMatchedAndRestartFromClosestLaterSibling,
    /// Only a farther ancestor past a descendant combinator can help.
    NotMatchedAndRestartFromClosestDescendant,
    /// No other candidate for any link can help.
    NotMatchedGlobally,
}

/// Scratch state for matching against one tree during one call.
pub(crate) struct MatchContext<'t, T: SelectorTree + ?Sized> {
    tree: &'t T,
    case_sensitive_names: bool,
    nth_cache: NthIndexCache<T::Node>,
}

impl<'t, T: SelectorTree + ?Sized> MatchContext<'t, T> {
    pub(crate) fn new(tree: &'t T, case_sensitive_names: bool) -> Self {
        Self {
            tree,
            case_sensitive_names,
            nth_cache: NthIndexCache::new(),
        }
    }

    /// Whether any branch matches `element`.
    pub(crate) fn matches_any(&mut self, branches: &[Branch], element: T::Node) -> bool {
        branches.iter().any(|branch| self.matches_branch(branch, element))
    }

    fn matches_branch(&mut self, branch: &Branch, element: T::Node) -> bool {
        self.match_compound_and_links(&branch.subject, &branch.links, element)
            == MatchResult::Matched
    }

    /// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
    ///
    /// Test `compound` on `element`, then find an element for each link in
    /// turn. Descendant and subsequent-sibling links try every candidate
    /// until the remainder of the chain matches or the result says that no
    /// farther candidate can.
    fn match_compound_and_links(
        &mut self,
        compound: &CompiledCompound,
        links: &[Link],
        element: T::Node,
    ) -> MatchResult {
        if !self.matches_compound(compound, element) {
            return MatchResult::NotMatchedAndRestartFromClosestLaterSibling;
        }
        let Some((link, rest)) = links.split_first() else {
            return MatchResult::Matched;
        };

        let candidate_not_found = match link.combinator {
            Combinator::NextSibling | Combinator::SubsequentSibling => {
                MatchResult::NotMatchedAndRestartFromClosestDescendant
            }
            Combinator::Child | Combinator::Descendant => MatchResult::NotMatchedGlobally,
        };

        let mut next = element;
        loop {
            let candidate = match link.combinator {
                Combinator::Child | Combinator::Descendant => parent_element(self.tree, next),
                Combinator::NextSibling | Combinator::SubsequentSibling => {
                    prev_element_sibling(self.tree, next)
                }
            };
            let Some(candidate) = candidate else {
                return candidate_not_found;
            };

            let result = self.match_compound_and_links(&link.compound, rest, candidate);
            match (result, link.combinator) {
                (MatchResult::Matched | MatchResult::NotMatchedGlobally, _)
                | (_, Combinator::NextSibling)
                | (
                    MatchResult::NotMatchedAndRestartFromClosestDescendant,
                    Combinator::SubsequentSibling,
                ) => return result,
                (_, Combinator::Child) => {
                    return MatchResult::NotMatchedAndRestartFromClosestDescendant;
                }
                // A farther ancestor or earlier sibling may still match.
                _ => {}
            }
            next = candidate;
        }
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    ///
    /// "A compound selector ... represents a set of simultaneous conditions
    /// on a single element."
    fn matches_compound(&mut self, compound: &CompiledCompound, element: T::Node) -> bool {
        self.tree.is_element(element)
            && compound
                .tests
                .iter()
                .all(|test| self.matches_test(test, element))
    }

    fn matches_test(&mut self, test: &Test, element: T::Node) -> bool {
        let tree = self.tree;
        match test {
            Test::Never => false,

            // [§ 6.7 ID selectors](https://www.w3.org/TR/selectors-4/#id-selectors)
            Test::Id(id) => tree.id(element) == Some(id.as_str()),

            // [§ 5.1 Type selectors](https://www.w3.org/TR/selectors-4/#type-selectors)
            Test::LocalName(name) => tree
                .local_name(element)
                .is_some_and(|local| self.names_equal(local, name)),

            // [§ 6.6 Class selectors](https://www.w3.org/TR/selectors-4/#class-html)
            Test::Class(class) => tree.has_class(element, class),

            // [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
            Test::Attribute {
                name,
                operation,
                case,
            } => self
                .attribute(element, name)
                .is_some_and(|value| operation.matches(value, *case)),

            Test::Keyword(keyword) => self.matches_keyword(*keyword, element),

            // [§ 14.4.1 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
            Test::NthChild {
                formula,
                from_end,
                of: None,
            } => {
                let position = self.position(element, SiblingScope::Child);
                formula.matches(if *from_end {
                    position.index_from_end()
                } else {
                    position.index
                })
            }

            // "...the list composed of their inclusive siblings that match the
            // selector list S." The element itself must match S.
            Test::NthChild {
                formula,
                from_end,
                of: Some(branches),
            } => {
                if !self.matches_any(branches, element) {
                    return false;
                }
                let step = if *from_end {
                    next_element_sibling::<T>
                } else {
                    prev_element_sibling::<T>
                };
                let mut index = 1;
                let mut sibling = step(tree, element);
                while let Some(s) = sibling {
                    if self.matches_any(branches, s) {
                        index += 1;
                    }
                    sibling = step(tree, s);
                }
                formula.matches(index)
            }

            // [§ 14.5.1 :nth-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-of-type-pseudo)
            Test::NthOfType { formula, from_end } => {
                let position = self.position(element, SiblingScope::OfType);
                formula.matches(if *from_end {
                    position.index_from_end()
                } else {
                    position.index
                })
            }

            // [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
            // The argument is matched as a query anchored at this element.
            Test::Not(branches) => !self.matches_any(branches, element),

            // [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches)
            Test::Is(branches) => self.matches_any(branches, element),
        }
    }

    fn matches_keyword(&mut self, keyword: PseudoClassKeyword, element: T::Node) -> bool {
        let tree = self.tree;
        match keyword {
            // [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
            PseudoClassKeyword::Root => tree.is_root_element(element),

            // [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
            PseudoClassKeyword::Empty => tree.is_empty_element(element),

            // "Same as :nth-child(1)." Only element siblings count.
            PseudoClassKeyword::FirstChild => prev_element_sibling(tree, element).is_none(),
            PseudoClassKeyword::LastChild => next_element_sibling(tree, element).is_none(),
            PseudoClassKeyword::OnlyChild => {
                prev_element_sibling(tree, element).is_none()
                    && next_element_sibling(tree, element).is_none()
            }

            PseudoClassKeyword::FirstOfType => {
                self.position(element, SiblingScope::OfType).index == 1
            }
            PseudoClassKeyword::LastOfType => {
                self.position(element, SiblingScope::OfType)
                    .index_from_end()
                    == 1
            }
            PseudoClassKeyword::OnlyOfType => {
                self.position(element, SiblingScope::OfType).count == 1
            }

            // [§ 8.2 :link](https://www.w3.org/TR/selectors-4/#link)
            // With no history every hyperlink is unvisited: any <a> or <area>
            // with an href attribute.
            PseudoClassKeyword::Link => {
                self.is_one_of(element, &["a", "area"]) && self.attribute(element, "href").is_some()
            }

            // [§ 13.3.1 :checked](https://html.spec.whatwg.org/multipage/semantics-other.html#selector-checked)
            PseudoClassKeyword::Checked => {
                let checkable = self.is_one_of(element, &["input"])
                    && self.attribute(element, "type").is_some_and(|t| {
                        t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio")
                    });
                (checkable && self.attribute(element, "checked").is_some())
                    || (self.is_one_of(element, &["option"])
                        && self.attribute(element, "selected").is_some())
            }

            // [§ 13.1 :enabled and :disabled](https://html.spec.whatwg.org/multipage/semantics-other.html#selector-disabled)
            // Only form controls are either.
            PseudoClassKeyword::Disabled => {
                self.is_form_control(element) && self.attribute(element, "disabled").is_some()
            }
            PseudoClassKeyword::Enabled => {
                self.is_form_control(element) && self.attribute(element, "disabled").is_none()
            }

            // [§ 13.5.1 :required and :optional](https://html.spec.whatwg.org/multipage/semantics-other.html#selector-required)
            PseudoClassKeyword::Required => {
                self.is_one_of(element, &["input", "select", "textarea"])
                    && self.attribute(element, "required").is_some()
            }
            PseudoClassKeyword::Optional => {
                self.is_one_of(element, &["input", "select", "textarea"])
                    && self.attribute(element, "required").is_none()
            }
        }
    }

    fn position(&mut self, element: T::Node, scope: SiblingScope) -> SiblingPosition {
        self.nth_cache
            .position(self.tree, element, scope, self.case_sensitive_names)
    }

    /// Attribute lookup honouring the query's name case-sensitivity.
    /// `name` is already lowercase when names are case-insensitive.
    fn attribute(&self, element: T::Node, name: &str) -> Option<&'t str> {
        if self.case_sensitive_names {
            self.tree.attribute(element, name)
        } else {
            self.tree.attribute_ignore_ascii_case(element, name)
        }
    }

    fn names_equal(&self, local: &str, expected: &str) -> bool {
        if self.case_sensitive_names {
            local == expected
        } else {
            local.eq_ignore_ascii_case(expected)
        }
    }

    /// HTML elements are matched by lowercase name regardless of the
    /// query's name case-sensitivity.
    fn is_one_of(&self, element: T::Node, names: &[&str]) -> bool {
        self.tree
            .local_name(element)
            .is_some_and(|local| names.iter().any(|n| local.eq_ignore_ascii_case(n)))
    }

    fn is_form_control(&self, element: T::Node) -> bool {
        self.is_one_of(
            element,
            &[
                "button", "input", "select", "textarea", "optgroup", "option", "fieldset",
            ],
        )
    }
}
