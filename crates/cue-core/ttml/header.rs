//! Header block readers
//!
//! `<styling>` and `<layout>` blocks, and `<region>` elements declared in
//! `<body>` or `<div>`, are buffered into a [`NodeTree`] until their end
//! tag, then read in one go. Positions inside a block are checked against
//! the parent-relationship table; a misplaced element is reported once and
//! its whole subtree is skipped.

use std::sync::Arc;

use tracing::{trace, warn};

use super::{styles::StyleRegistry, ParseError};
use crate::{
    grammar::{grammar_name, is_validly_positioned},
    model::TtmlStyle,
    scope::RegionDefinition,
    tokenizer::{Token, TokenKind},
    tree::{NodeId, NodeTree},
    utils::CoreError,
};

/// What a buffered block holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `<styling>`
    Styling,
    /// `<layout>`
    Layout,
    /// `<region>` inside `<body>` or `<div>`
    InlineRegion,
}

/// A header block being buffered
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    kind: BlockKind,
    tree: NodeTree<Token>,
    depth: usize,
}

impl HeaderBlock {
    /// Start buffering at the block's opening tag
    #[must_use]
    pub fn start(kind: BlockKind, token: Token) -> Self {
        let mut tree = NodeTree::new();
        let depth = if token.kind == TokenKind::StartTag {
            tree.open(token);
            1
        } else {
            tree.append(token);
            0
        };
        Self { kind, tree, depth }
    }

    /// Buffer one token; returns `true` once the block's end tag was seen
    pub fn push(&mut self, token: Token) -> bool {
        match token.kind {
            TokenKind::StartTag => {
                self.tree.open(token);
                self.depth += 1;
            }
            TokenKind::EndTag => {
                self.tree.close();
                self.depth = self.depth.saturating_sub(1);
            }
            TokenKind::Tag | TokenKind::String | TokenKind::CData => {
                self.tree.append(token);
            }
            TokenKind::Comment | TokenKind::ProcessingInstruction | TokenKind::ValidationEntity => {}
        }
        self.is_complete()
    }

    /// Check if the block's end tag was seen
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.depth == 0
    }

    /// Block kind
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Buffered elements
    #[must_use]
    pub const fn tree(&self) -> &NodeTree<Token> {
        &self.tree
    }

    /// The block's own element
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.tree.roots().first().copied()
    }
}

/// Element nodes of a block that sit in a valid position, in document order
///
/// The topmost element of every misplaced subtree is reported.
fn valid_elements(tree: &NodeTree<Token>, root: NodeId, errors: &mut Vec<ParseError>) -> Vec<NodeId> {
    let mut valid = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let token = tree.get(node);
        if !token.kind.is_tag() {
            continue;
        }
        if !is_validly_positioned(tree, node) {
            let parent = tree
                .parent(node)
                .map_or("", |parent| grammar_name(&tree.get(parent).content));
            warn!(element = %token.content, parent, line = token.line, "skipping misplaced header element");
            errors.push(ParseError::new(
                CoreError::InvalidNesting {
                    element: token.content.clone(),
                    parent: parent.to_string(),
                },
                token.to_string(),
            ));
            continue;
        }
        valid.push(node);
        stack.extend(tree.children(node).iter().rev().copied());
    }
    valid
}

fn is_child_of(tree: &NodeTree<Token>, node: NodeId, parent_name: &str) -> bool {
    tree.parent(node)
        .is_some_and(|parent| grammar_name(&tree.get(parent).content) == parent_name)
}

/// Register every `<style>` of a `<styling>` block
///
/// Returns the registered styles in document order, ids already made
/// unique.
pub fn read_styling(
    block: &HeaderBlock,
    registry: &mut StyleRegistry,
    errors: &mut Vec<ParseError>,
) -> Vec<Arc<TtmlStyle>> {
    let Some(root) = block.root() else {
        return Vec::new();
    };
    let tree = block.tree();
    valid_elements(tree, root, errors)
        .into_iter()
        .filter(|&node| grammar_name(&tree.get(node).content) == "style" && is_child_of(tree, node, "styling"))
        .filter_map(|node| registry.register(tree.get(node), errors))
        .collect()
}

/// Collect the `<region>` declarations of a `<layout>` block
///
/// Regions without `xml:id` and repeated ids are reported and skipped; the
/// first declaration of an id wins.
pub fn read_layout(
    block: &HeaderBlock,
    registry: &StyleRegistry,
    errors: &mut Vec<ParseError>,
) -> Vec<RegionDefinition> {
    let Some(root) = block.root() else {
        return Vec::new();
    };
    let tree = block.tree();
    let mut definitions = Vec::new();

    for node in valid_elements(tree, root, errors) {
        let token = tree.get(node);
        if grammar_name(&token.content) != "region" || !is_child_of(tree, node, "layout") {
            continue;
        }

        let Some(id) = token.attribute("xml:id") else {
            warn!(line = token.line, "discarding <region> without xml:id");
            errors.push(ParseError::new(
                CoreError::InvalidAttribute {
                    attribute: "xml:id".to_string(),
                    value: String::new(),
                },
                token.to_string(),
            ));
            continue;
        };

        if definitions.iter().any(|defined: &RegionDefinition| defined.id == id) {
            warn!(region = id, "duplicate region id, keeping the first declaration");
            errors.push(ParseError::new(
                CoreError::InvalidAttribute {
                    attribute: "xml:id".to_string(),
                    value: id.to_string(),
                },
                token.to_string(),
            ));
            continue;
        }

        trace!(region = id, "declared region");
        let nested = nested_styles(tree, node, id, registry, errors);
        definitions.push(RegionDefinition::new(id, token.clone()).with_nested_styles(nested));
    }

    definitions
}

/// Resolve the `<style>` children of a region element
///
/// Nested styles without `xml:id` take `fallback_id`.
pub fn nested_styles(
    tree: &NodeTree<Token>,
    region: NodeId,
    fallback_id: &str,
    registry: &StyleRegistry,
    errors: &mut Vec<ParseError>,
) -> Vec<Arc<TtmlStyle>> {
    tree.children(region)
        .iter()
        .map(|&child| tree.get(child))
        .filter(|token| token.kind.is_tag() && grammar_name(&token.content) == "style")
        .map(|token| Arc::new(registry.resolve_nested(token, fallback_id, errors)))
        .collect()
}
