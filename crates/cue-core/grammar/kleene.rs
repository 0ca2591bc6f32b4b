//! Kleene-style cardinality combinators
//!
//! A [`Rule`] pairs a cardinality (`*`, `+`, `?`) with a [`Target`]: one
//! element representation or an `or` of several. Rules are stateful: they
//! count their successes so `zero_or_one` can refuse a second occurrence and
//! `one_or_more` can report a missing required element.
//!
//! ```rust
//! use cue_core::grammar::{kleene::{one_or_more, zero_or_one}, representation::{P, REGION}};
//!
//! let mut region = zero_or_one(&REGION);
//! assert!(region.matches("region")?);
//! assert!(!region.matches("region")?);
//!
//! let mut paragraphs = one_or_more(&P);
//! assert!(paragraphs.matches("p")?);
//! assert!(!paragraphs.matches("span")?);
//! # Ok::<(), cue_core::CoreError>(())
//! ```

use super::representation::NodeRepresentation;
use crate::{utils::CoreError, Result};

/// What a rule matches: one element, or any of several
#[derive(Debug, Clone)]
pub enum Target {
    /// A single element representation
    Node(&'static NodeRepresentation),
    /// First alternative whose name matches wins
    Or(Vec<Target>),
}

impl Target {
    /// Find the representation matching `name`
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&'static NodeRepresentation> {
        match self {
            Self::Node(node) => node.matches(name).then_some(*node),
            Self::Or(alternatives) => alternatives.iter().find_map(|alt| alt.find(name)),
        }
    }

    /// Human readable name list, used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Node(node) => node.name.to_string(),
            Self::Or(alternatives) => alternatives
                .iter()
                .map(Self::describe)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

impl From<&'static NodeRepresentation> for Target {
    fn from(node: &'static NodeRepresentation) -> Self {
        Self::Node(node)
    }
}

/// Build an `or` target
pub fn or<I, T>(alternatives: I) -> Target
where
    I: IntoIterator<Item = T>,
    T: Into<Target>,
{
    Target::Or(alternatives.into_iter().map(Into::into).collect())
}

/// Rule cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `?`
    ZeroOrOne,
}

/// Stateful cardinality rule over a target
#[derive(Debug, Clone)]
pub struct Rule {
    cardinality: Cardinality,
    target: Target,
    matched: usize,
    last_matched: Option<&'static NodeRepresentation>,
}

/// `target*`
pub fn zero_or_more(target: impl Into<Target>) -> Rule {
    Rule::new(Cardinality::ZeroOrMore, target.into())
}

/// `target+`
pub fn one_or_more(target: impl Into<Target>) -> Rule {
    Rule::new(Cardinality::OneOrMore, target.into())
}

/// `target?`
pub fn zero_or_one(target: impl Into<Target>) -> Rule {
    Rule::new(Cardinality::ZeroOrOne, target.into())
}

impl Rule {
    const fn new(cardinality: Cardinality, target: Target) -> Self {
        Self {
            cardinality,
            target,
            matched: 0,
            last_matched: None,
        }
    }

    /// Try to match an element name
    ///
    /// # Errors
    ///
    /// A `one_or_more` rule returns [`CoreError::MinimumElementViolation`]
    /// when it has never matched and `name` does not match either.
    pub fn matches(&mut self, name: &str) -> Result<bool> {
        if self.cardinality == Cardinality::ZeroOrOne && self.matched >= 1 {
            return Ok(false);
        }

        if let Some(node) = self.target.find(name) {
            self.matched += 1;
            self.last_matched = Some(node);
            return Ok(true);
        }

        if self.cardinality == Cardinality::OneOrMore && self.matched == 0 {
            return Err(CoreError::MinimumElementViolation {
                element: self.target.describe(),
            });
        }

        Ok(false)
    }

    /// Representation matched by the last successful call
    #[must_use]
    pub const fn matched_node(&self) -> Option<&'static NodeRepresentation> {
        self.last_matched
    }

    /// Number of successful matches
    #[must_use]
    pub const fn matched_count(&self) -> usize {
        self.matched
    }

    /// Rule cardinality
    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Target of the rule
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }
}

/// Ordered list of rules consumed with a cursor
///
/// A child is tried against the rule under the cursor and then against the
/// following rules. The cursor only moves forward, so rules passed over are
/// never revisited.
#[derive(Debug, Clone)]
pub struct RuleSequence {
    rules: Vec<Rule>,
    cursor: usize,
}

impl RuleSequence {
    /// Create sequence over `rules`
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules, cursor: 0 }
    }

    /// Accept a child element
    ///
    /// Returns the matched representation, or `None` when the element is
    /// not allowed at this point.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::MinimumElementViolation`] from `one_or_more`
    /// rules.
    pub fn accept(&mut self, name: &str) -> Result<Option<&'static NodeRepresentation>> {
        for index in self.cursor..self.rules.len() {
            let rule = &mut self.rules[index];
            if rule.matches(name)? {
                self.cursor = index;
                return Ok(rule.matched_node());
            }
        }
        Ok(None)
    }

    /// Rules of the sequence
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
