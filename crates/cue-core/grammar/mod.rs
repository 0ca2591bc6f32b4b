//! Structural validation of TTML element nesting
//!
//! Two views of the same rules:
//!
//! - [`representation`] with [`kleene`] combinators, consumed child by child
//!   during the document walk. This is the canonical grammar.
//! - [`relationships`], a parent table used when collecting header blocks
//!   into a node tree.

pub mod kleene;
pub mod relationships;
pub mod representation;

pub use kleene::{one_or_more, or, zero_or_more, zero_or_one, Cardinality, Rule, RuleSequence, Target};
pub use relationships::{allowed_parents, is_validly_positioned};
pub use representation::{grammar_name, NodeRepresentation, TT};
