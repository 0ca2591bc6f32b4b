//! Single-pass document walker
//!
//! Pulls tokens from the tokenizer and validates every element against its
//! parent's grammar cursor. Misplaced elements are reported and skipped
//! with their whole subtree. Header blocks and paragraphs are buffered and
//! handed to the readers in [`super::header`] and the materializer once
//! their end tag arrives.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{
    header::{read_layout, read_styling, BlockKind, HeaderBlock},
    materialize::{Materializer, Paragraph, RegionBinding},
    options::AdapterOptions,
    regions::{RegionInputs, RegionResolver},
    styles::{element_styles, StyleRegistry},
    ParseError, ParseResult,
};
use crate::{
    grammar::{grammar_name, NodeRepresentation, RuleSequence, TT},
    model::{CueNode, TtmlStyle},
    scope::{
        document_factory, time_factory, Context, RegionContainerContext, ScopeId, ScopeTree,
        StyleContainerContext,
    },
    tokenizer::{IssueLevel, MarkupTokenizer, Token, TokenKind},
    tree::NodeTree,
    utils::CoreError,
    Result,
};

/// An open element
struct Frame {
    representation: &'static NodeRepresentation,
    children: RuleSequence,
    scope: ScopeId,
    binding: RegionBinding,
    /// Styles of the enclosing containers and the element itself
    styles: Vec<Arc<TtmlStyle>>,
}

/// A `<p>` being buffered
struct OpenParagraph {
    tree: NodeTree<Token>,
    /// Number of frames below the paragraph's own
    depth: usize,
}

pub(super) struct DocumentWalker<'a> {
    tokens: MarkupTokenizer<'a>,
    options: &'a AdapterOptions,
    scopes: ScopeTree,
    root: Option<ScopeId>,
    frames: Vec<Frame>,
    /// Open elements left inside a skipped subtree
    ignored_depth: usize,
    block: Option<HeaderBlock>,
    paragraph: Option<OpenParagraph>,
    paragraph_count: usize,
    registry: StyleRegistry,
    regions: RegionResolver,
    cues: Vec<CueNode>,
    errors: Vec<ParseError>,
}

impl<'a> DocumentWalker<'a> {
    pub(super) fn new(content: &'a str, options: &'a AdapterOptions) -> Self {
        Self {
            tokens: MarkupTokenizer::new(content),
            options,
            scopes: ScopeTree::new(),
            root: None,
            frames: Vec::new(),
            ignored_depth: 0,
            block: None,
            paragraph: None,
            paragraph_count: 0,
            registry: StyleRegistry::new(),
            regions: RegionResolver::new(),
            cues: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Walk the whole document
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedRoot`] when the first element is not
    /// `<tt>`, and the first critical error met afterwards.
    pub(super) fn run(mut self) -> Result<ParseResult> {
        let root = self.read_root()?;
        self.open_root(root)?;
        while let Some(token) = self.tokens.next_token() {
            self.dispatch(token)?;
        }
        self.finish()
    }

    fn read_root(&mut self) -> Result<Token> {
        let malformed = |found: String| CoreError::MalformedRoot {
            expected: TT.name.to_string(),
            found,
        };
        while let Some(token) = self.tokens.next_token() {
            match token.kind {
                TokenKind::StartTag | TokenKind::Tag if grammar_name(&token.content) == TT.name => {
                    return Ok(token);
                }
                TokenKind::StartTag | TokenKind::Tag | TokenKind::EndTag => {
                    return Err(malformed(token.to_string()));
                }
                TokenKind::String | TokenKind::CData if !token.is_blank() => {
                    return Err(malformed("text".to_string()));
                }
                _ => {}
            }
        }
        Err(malformed("end of input".to_string()))
    }

    fn open_root(&mut self, token: Token) -> Result<()> {
        let mut issues = Vec::new();
        let scope = self.scopes.create_scope(
            None,
            [document_factory(&token.attributes, self.options.default_time_details, &mut issues)],
        )?;
        for issue in issues {
            warn!(error = %issue, "ignoring document parameter");
            self.errors.push(ParseError::new(issue, token.to_string()));
        }
        self.root = Some(scope);

        if token.kind == TokenKind::StartTag {
            self.frames.push(Frame {
                representation: &TT,
                children: TT.child_sequence(),
                scope,
                binding: RegionBinding::Unbound,
                styles: Vec::new(),
            });
        }
        Ok(())
    }

    fn dispatch(&mut self, token: Token) -> Result<()> {
        if self.ignored_depth > 0 {
            match token.kind {
                TokenKind::StartTag => self.ignored_depth += 1,
                TokenKind::EndTag => self.ignored_depth -= 1,
                _ => {}
            }
            return Ok(());
        }

        if let Some(block) = self.block.as_mut() {
            if block.push(token) {
                self.finish_block()?;
            }
            return Ok(());
        }

        match token.kind {
            TokenKind::StartTag | TokenKind::Tag => self.open_element(token),
            TokenKind::EndTag => self.close_element(&token),
            TokenKind::String | TokenKind::CData => {
                self.text(token);
                Ok(())
            }
            TokenKind::Comment | TokenKind::ProcessingInstruction | TokenKind::ValidationEntity => Ok(()),
        }
    }

    fn skip(&mut self, token: &Token) {
        if token.kind == TokenKind::StartTag {
            self.ignored_depth = 1;
        }
    }

    fn open_element(&mut self, token: Token) -> Result<()> {
        let depth = self.frames.len();
        if depth == 0 {
            debug!(element = %token.content, "ignoring element after the document root");
            self.skip(&token);
            return Ok(());
        }

        if depth >= self.options.max_nesting_depth {
            warn!(element = %token.content, line = token.line, "nesting limit reached");
            self.errors.push(ParseError::new(
                CoreError::NestingTooDeep {
                    element: token.content.clone(),
                    limit: self.options.max_nesting_depth,
                },
                token.to_string(),
            ));
            self.skip(&token);
            return Ok(());
        }

        let Some(parent) = self.frames.last_mut() else {
            return Ok(());
        };
        let Some(representation) = parent.children.accept(grammar_name(&token.content))? else {
            let parent_name = parent.representation.name;
            debug!(element = %token.content, parent = parent_name, line = token.line, "ignoring misplaced element");
            self.errors.push(ParseError::new(
                CoreError::InvalidNesting {
                    element: token.content.clone(),
                    parent: parent_name.to_string(),
                },
                token.to_string(),
            ));
            self.skip(&token);
            return Ok(());
        };

        match representation.name {
            "metadata" | "set" | "animate" => {
                trace!(element = %token.content, "skipping subtree");
                self.skip(&token);
                Ok(())
            }
            _ if self.paragraph.is_some() => {
                self.paragraph_child(representation, token);
                Ok(())
            }
            "styling" => self.start_block(BlockKind::Styling, token),
            "layout" => self.start_block(BlockKind::Layout, token),
            "region" => self.start_block(BlockKind::InlineRegion, token),
            "head" => {
                self.push_frame(representation, &token, None, RegionBinding::Unbound, Vec::new());
                Ok(())
            }
            "body" | "div" | "p" => self.open_container(representation, token),
            other => {
                debug!(element = other, "ignoring element outside a paragraph");
                self.skip(&token);
                Ok(())
            }
        }
    }

    /// Push a frame for a start tag; `scope` defaults to the parent's
    fn push_frame(
        &mut self,
        representation: &'static NodeRepresentation,
        token: &Token,
        scope: Option<ScopeId>,
        binding: RegionBinding,
        styles: Vec<Arc<TtmlStyle>>,
    ) {
        if token.kind != TokenKind::StartTag {
            return;
        }
        let Some(scope) = scope.or_else(|| self.frames.last().map(|frame| frame.scope)) else {
            return;
        };
        self.frames.push(Frame {
            representation,
            children: representation.child_sequence(),
            scope,
            binding,
            styles,
        });
    }

    fn open_container(&mut self, representation: &'static NodeRepresentation, token: Token) -> Result<()> {
        let Some((parent_scope, parent_binding, mut styles)) = self
            .frames
            .last()
            .map(|frame| (frame.scope, frame.binding.clone(), frame.styles.clone()))
        else {
            return Ok(());
        };

        let Some(binding) = parent_binding.narrow(token.attribute("region")) else {
            debug!(element = %token.content, line = token.line, "pruning element bound to another region");
            self.skip(&token);
            return Ok(());
        };

        let scope = match self
            .scopes
            .create_scope(Some(parent_scope), [time_factory(&token.attributes)])
        {
            Ok(scope) => scope,
            Err(err) if err.is_critical() => return Err(err),
            Err(err) => {
                debug!(error = %err, element = %token.content, line = token.line, "ignoring element with unusable timing");
                self.errors.push(ParseError::new(err, token.to_string()));
                self.skip(&token);
                return Ok(());
            }
        };

        styles.extend(element_styles(
            &token,
            self.scopes.style_container(scope),
            &mut self.errors,
        ));

        let is_paragraph = representation.name == "p";
        if is_paragraph && token.kind == TokenKind::StartTag {
            let mut tree = NodeTree::new();
            tree.open(token.clone());
            self.paragraph = Some(OpenParagraph {
                tree,
                depth: self.frames.len(),
            });
        }
        self.push_frame(representation, &token, Some(scope), binding, styles);
        Ok(())
    }

    /// Buffer an element nested in the open paragraph
    fn paragraph_child(&mut self, representation: &'static NodeRepresentation, token: Token) {
        let Some(paragraph) = self.paragraph.as_mut() else {
            return;
        };
        if token.kind == TokenKind::StartTag {
            paragraph.tree.open(token.clone());
        } else {
            paragraph.tree.append(token.clone());
        }
        self.push_frame(representation, &token, None, RegionBinding::Unbound, Vec::new());
    }

    fn start_block(&mut self, kind: BlockKind, token: Token) -> Result<()> {
        let block = HeaderBlock::start(kind, token);
        let complete = block.is_complete();
        self.block = Some(block);
        if complete {
            self.finish_block()?;
        }
        Ok(())
    }

    fn finish_block(&mut self) -> Result<()> {
        let Some(block) = self.block.take() else {
            return Ok(());
        };
        let root = self
            .root
            .ok_or_else(|| CoreError::internal("header block outside the document root"))?;

        match block.kind() {
            BlockKind::Styling => {
                let styles = read_styling(&block, &mut self.registry, &mut self.errors);
                trace!(styles = styles.len(), "read styling block");
                self.scopes
                    .add_context(root, Context::StyleContainer(StyleContainerContext::new(styles)))?;
            }
            BlockKind::Layout => {
                let definitions = read_layout(&block, &self.registry, &mut self.errors);
                trace!(regions = definitions.len(), "read layout block");
                self.scopes
                    .add_context(root, Context::RegionContainer(RegionContainerContext::new(definitions)))?;
            }
            BlockKind::InlineRegion => self.bind_inline_region(&block)?,
        }
        Ok(())
    }

    /// Commit the open `<body>` or `<div>` to a region declared inside it
    fn bind_inline_region(&mut self, block: &HeaderBlock) -> Result<()> {
        let Some(node) = block.root() else {
            return Ok(());
        };
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };

        if frame.binding.is_bound() {
            debug!(element = frame.representation.name, "pruning element: inline region under a bound region");
            self.frames.pop();
            self.ignored_depth = 1;
            return Ok(());
        }

        let details = self.scopes.time_details();
        let inputs = RegionInputs {
            styles: self.scopes.style_container(frame.scope),
            details: &details,
        };
        let region = self
            .regions
            .build_inline(block.tree(), node, &self.registry, inputs, &mut self.errors)?;
        frame.binding = RegionBinding::Inline(region);
        Ok(())
    }

    fn text(&mut self, token: Token) {
        let Some(frame) = self.frames.last() else {
            return;
        };
        if !frame.representation.accepts_text {
            trace!(element = frame.representation.name, line = token.line, "dropping stray text");
            return;
        }
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.tree.append(token);
        }
    }

    fn close_element(&mut self, token: &Token) -> Result<()> {
        let Some(frame) = self.frames.pop() else {
            debug!(element = %token.content, "ignoring end tag outside the document root");
            return Ok(());
        };
        if grammar_name(&token.content) != frame.representation.name {
            debug!(
                expected = frame.representation.name,
                found = %token.content,
                line = token.line,
                "mismatched end tag"
            );
        }

        let inside_paragraph = self
            .paragraph
            .as_ref()
            .map(|paragraph| self.frames.len() > paragraph.depth);
        match (inside_paragraph, self.paragraph.as_mut()) {
            (Some(true), Some(paragraph)) => {
                paragraph.tree.close();
                Ok(())
            }
            (Some(false), _) => self.close_paragraph(frame),
            _ => Ok(()),
        }
    }

    fn close_paragraph(&mut self, frame: Frame) -> Result<()> {
        let Some(paragraph) = self.paragraph.take() else {
            return Ok(());
        };
        let Some(root) = paragraph.tree.roots().first().copied() else {
            return Ok(());
        };
        let index = self.paragraph_count;
        self.paragraph_count += 1;

        let cues = Materializer {
            scopes: &mut self.scopes,
            registry: &self.registry,
            regions: &mut self.regions,
            options: self.options,
            errors: &mut self.errors,
        }
        .materialize(Paragraph {
            tree: &paragraph.tree,
            root,
            scope: frame.scope,
            binding: frame.binding,
            styles: frame.styles,
            index,
        })?;
        trace!(paragraph = index, cues = cues.len(), "materialized paragraph");
        self.cues.extend(cues);
        Ok(())
    }

    fn finish(mut self) -> Result<ParseResult> {
        if let Some(depth) = self.paragraph.as_ref().map(|paragraph| paragraph.depth) {
            debug!("document ended inside a paragraph");
            self.frames.truncate(depth + 1);
            if let Some(frame) = self.frames.pop() {
                self.close_paragraph(frame)?;
            }
        }
        if !self.frames.is_empty() || self.block.is_some() {
            debug!(open = self.frames.len(), "document ended with unclosed elements");
        }

        for issue in self.tokens.take_issues() {
            match issue.level {
                IssueLevel::Warning => trace!(%issue, "tokenizer repaired input"),
                IssueLevel::Error => {
                    warn!(%issue, "malformed markup");
                    self.errors.push(ParseError::new(
                        CoreError::Tokenization(issue.to_string()),
                        String::new(),
                    ));
                }
            }
        }

        Ok(ParseResult {
            data: self.cues,
            errors: self.errors,
        })
    }
}
