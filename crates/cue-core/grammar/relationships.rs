//! Parent-relationship table
//!
//! A flat "who may contain me" table used while collecting header blocks
//! (`<styling>`, `<layout>`) into a [`NodeTree`]. Elements listed in the
//! table are valid only directly under one of their allowed parents;
//! elements absent from the table inherit validity from their parent.
//!
//! The table agrees with the representation tree in
//! [`super::representation`], which stays the canonical grammar for the
//! document walk.

use super::representation::grammar_name;
use crate::{
    tokenizer::Token,
    tree::{NodeId, NodeTree},
};

const RELATIONSHIPS: &[(&str, &[&str])] = &[
    ("tt", &[]),
    ("head", &["tt"]),
    ("body", &["tt"]),
    ("styling", &["head"]),
    ("layout", &["head"]),
    ("style", &["styling", "region"]),
    ("region", &["layout"]),
];

/// Allowed parents of an element, `None` when the element is not listed
#[must_use]
pub fn allowed_parents(name: &str) -> Option<&'static [&'static str]> {
    RELATIONSHIPS
        .iter()
        .find(|(element, _)| *element == name)
        .map(|(_, parents)| *parents)
}

/// Check whether `node` sits in a valid position
///
/// Walks up the ancestor chain: every listed element on the way must have
/// an allowed parent. The root of a tracking tree has no recorded parent
/// and is taken as valid, since the block reader only starts a tree for a
/// block the document walk already accepted.
#[must_use]
pub fn is_validly_positioned(tree: &NodeTree<Token>, node: NodeId) -> bool {
    let mut current = node;
    loop {
        let Some(parent) = tree.parent(current) else {
            return true;
        };

        let name = grammar_name(&tree.get(current).content);
        if let Some(parents) = allowed_parents(name) {
            let parent_name = grammar_name(&tree.get(parent).content);
            if !parents.contains(&parent_name) {
                return false;
            }
        }
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::representation::{HEAD, LAYOUT, REGION, STYLING, TT},
        tokenizer::{Attributes, TokenKind},
    };

    fn open(tree: &mut NodeTree<Token>, name: &str) -> NodeId {
        tree.open(Token::new(TokenKind::StartTag, name, Attributes::new(), 1, 1))
    }

    #[test]
    fn style_inside_region_inside_layout() {
        let mut tree = NodeTree::new();
        open(&mut tree, "layout");
        open(&mut tree, "region");
        let style = open(&mut tree, "style");
        assert!(is_validly_positioned(&tree, style));
    }

    #[test]
    fn region_inside_styling_is_rejected() {
        let mut tree = NodeTree::new();
        open(&mut tree, "styling");
        let region = open(&mut tree, "region");
        let style = open(&mut tree, "style");
        assert!(!is_validly_positioned(&tree, region));
        // Invalid ancestry taints descendants
        assert!(!is_validly_positioned(&tree, style));
    }

    #[test]
    fn unlisted_elements_follow_parent() {
        let mut tree = NodeTree::new();
        open(&mut tree, "layout");
        let region = open(&mut tree, "tt:region");
        let meta = open(&mut tree, "ttm:desc");
        assert!(is_validly_positioned(&tree, region));
        assert!(is_validly_positioned(&tree, meta));
    }

    #[test]
    fn table_agrees_with_representation_tree() {
        for parent in [&TT, &HEAD, &STYLING, &LAYOUT, &REGION] {
            for (element, parents) in RELATIONSHIPS {
                if parents.contains(&parent.name) {
                    let accepted = parent.child_sequence().accept(element).unwrap();
                    assert!(accepted.is_some(), "{element} should be accepted under {}", parent.name);
                }
            }
        }
    }
}
