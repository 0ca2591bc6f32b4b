//! Paragraph materialization
//!
//! A buffered `<p>` subtree becomes one cue, or several when spans carry
//! timing of their own. Text runs are joined with XML whitespace collapsed
//! to single spaces and trimmed at the edges of each cue; `<br/>` becomes a
//! newline. Every span opens one entity in each cue its text reaches.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{
    options::AdapterOptions,
    regions::{RegionInputs, RegionResolver},
    styles::{element_styles, StyleRegistry},
    ParseError,
};
use crate::{
    grammar::grammar_name,
    model::{CueNode, Entity, EntityKind, Region, TtmlStyle},
    scope::{time_factory, ContextKind, ScopeId, ScopeTree, TimeContext},
    tokenizer::{scanner::is_xml_whitespace, Token},
    tree::{NodeId, NodeTree},
    utils::CoreError,
    Result,
};

/// Region an element and its descendants are committed to
#[derive(Debug, Clone, Default)]
pub(super) enum RegionBinding {
    #[default]
    Unbound,
    /// Out-of-line region, built on first use
    Named(String),
    /// Region declared inside content
    Inline(Arc<Region>),
}

impl RegionBinding {
    fn id(&self) -> Option<&str> {
        match self {
            Self::Unbound => None,
            Self::Named(id) => Some(id),
            Self::Inline(region) => Some(region.id()),
        }
    }

    pub(super) const fn is_bound(&self) -> bool {
        !matches!(self, Self::Unbound)
    }

    /// Binding of an element carrying `region="id"` under `self`
    ///
    /// `None` when an ancestor already committed to another region.
    pub(super) fn narrow(&self, id: Option<&str>) -> Option<Self> {
        match (self, id) {
            (_, None) => Some(self.clone()),
            (Self::Unbound, Some(id)) => Some(Self::Named(id.to_string())),
            (bound, Some(id)) => (bound.id() == Some(id)).then(|| bound.clone()),
        }
    }
}

/// A closed `<p>` ready to be turned into cues
pub(super) struct Paragraph<'t> {
    pub tree: &'t NodeTree<Token>,
    pub root: NodeId,
    pub scope: ScopeId,
    pub binding: RegionBinding,
    /// Container styles, body first, the paragraph's own last
    pub styles: Vec<Arc<TtmlStyle>>,
    /// Ordinal used for generated cue ids
    pub index: usize,
}

/// Text collected for one output cue
#[derive(Debug, Default)]
struct TextGroup {
    /// Scope of the timed span that opened the group; `None` for the paragraph
    scope: Option<ScopeId>,
    content: String,
    entities: Vec<Entity>,
    pending_space: bool,
}

impl TextGroup {
    fn push_text(&mut self, index: usize, text: &str, open: &mut [OpenSpan]) {
        let mut started = false;
        for ch in text.chars() {
            if is_xml_whitespace(ch) {
                self.pending_space = !self.content.is_empty() && !self.content.ends_with('\n');
                continue;
            }
            if self.pending_space {
                self.content.push(' ');
                self.pending_space = false;
            }
            if !started {
                self.open_entities(index, open);
                started = true;
            }
            self.content.push(ch);
        }
    }

    fn push_line_break(&mut self, index: usize, open: &mut [OpenSpan]) {
        self.pending_space = false;
        self.open_entities(index, open);
        let offset = self.content.len();
        self.content.push('\n');
        self.entities.push(Entity::new(EntityKind::LineBreak, offset, 1));
    }

    /// Start the entity of every open span not yet present in this group
    fn open_entities(&mut self, index: usize, open: &mut [OpenSpan]) {
        for span in open {
            if span.slots.iter().any(|&(group, _)| group == index) {
                continue;
            }
            let mut entity = span.template.clone();
            entity.offset = self.content.len();
            span.slots.push((index, self.entities.len()));
            self.entities.push(entity);
        }
    }
}

struct OpenSpan {
    scope: ScopeId,
    /// Group receiving the span's own text
    group: usize,
    template: Entity,
    /// `(group, entity)` positions opened so far
    slots: Vec<(usize, usize)>,
}

impl OpenSpan {
    fn close(&self, groups: &mut [TextGroup]) {
        for &(group, entity) in &self.slots {
            let end = groups[group].content.len();
            let entity = &mut groups[group].entities[entity];
            entity.length = end - entity.offset;
        }
    }
}

enum Step {
    Enter(NodeId),
    Exit,
}

/// Shared parse state a paragraph is materialized against
pub(super) struct Materializer<'p> {
    pub scopes: &'p mut ScopeTree,
    pub registry: &'p StyleRegistry,
    pub regions: &'p mut RegionResolver,
    pub options: &'p AdapterOptions,
    pub errors: &'p mut Vec<ParseError>,
}

impl Materializer<'_> {
    /// Turn a paragraph into cues in document order
    ///
    /// # Errors
    ///
    /// Propagates critical errors: disallowed timing on a span, a region
    /// whose timing is disallowed, and cues that fail output validation.
    pub(super) fn materialize(&mut self, paragraph: Paragraph<'_>) -> Result<Vec<CueNode>> {
        let Paragraph {
            tree,
            root,
            scope,
            mut binding,
            styles,
            index,
        } = paragraph;
        let element = tree.get(root);
        let details = self.scopes.time_details();

        let leading = leading_region(tree, root);
        if let Some(region) = leading {
            if binding.is_bound() {
                debug!(line = element.line, "pruning paragraph: inline region under a bound region");
                return Ok(Vec::new());
            }
            let inputs = RegionInputs {
                styles: self.scopes.style_container(scope),
                details: &details,
            };
            let built = self
                .regions
                .build_inline(tree, region, self.registry, inputs, self.errors)?;
            binding = RegionBinding::Inline(built);
        }

        let groups = self.collect_text(tree, root, scope, &binding, leading)?;
        if groups.iter().all(|group| group.content.is_empty()) {
            trace!(line = element.line, "paragraph without text");
            return Ok(Vec::new());
        }

        let region = match &binding {
            RegionBinding::Unbound => None,
            RegionBinding::Named(id) => {
                let inputs = RegionInputs {
                    styles: self.scopes.style_container(scope),
                    details: &details,
                };
                self.regions.resolve(
                    id,
                    self.scopes.region_container(scope),
                    inputs,
                    element,
                    self.errors,
                )?
            }
            RegionBinding::Inline(region) => Some(Arc::clone(region)),
        };

        let id = element
            .attribute("xml:id")
            .map_or_else(|| format!("cue-{index}"), str::to_string);
        let base = CueNode::builder().id(id).region(region.clone()).styles(styles);

        let mut cues = Vec::with_capacity(groups.len());
        for (position, group) in groups.into_iter().enumerate() {
            if group.content.is_empty() {
                continue;
            }
            let (start, end) = self.interval(group.scope.unwrap_or(scope), region.as_deref());
            if end < start {
                debug!(start, end, line = element.line, "skipping cue that ends before it starts");
                self.errors.push(ParseError::new(
                    CoreError::InvalidTime {
                        expression: format!("{start}..{end}"),
                        reason: "cue ends before it starts".to_string(),
                    },
                    element.to_string(),
                ));
                continue;
            }
            let builder = if position == 0 {
                base.clone()
            } else {
                base.clone().id_suffix(position)
            };
            cues.push(
                builder
                    .start_time(start)
                    .end_time(end)
                    .content(group.content)
                    .entities(group.entities)
                    .build()?,
            );
        }
        Ok(cues)
    }

    fn collect_text(
        &mut self,
        tree: &NodeTree<Token>,
        root: NodeId,
        scope: ScopeId,
        binding: &RegionBinding,
        leading: Option<NodeId>,
    ) -> Result<Vec<TextGroup>> {
        let mut groups = vec![TextGroup::default()];
        let mut open: Vec<OpenSpan> = Vec::new();
        let mut steps: Vec<Step> = tree.children(root).iter().rev().map(|&node| Step::Enter(node)).collect();

        while let Some(step) = steps.pop() {
            let node = match step {
                Step::Enter(node) => node,
                Step::Exit => {
                    if let Some(span) = open.pop() {
                        span.close(&mut groups);
                    }
                    continue;
                }
            };

            let token = tree.get(node);
            let group = open.last().map_or(0, |span| span.group);
            if token.kind.is_character_data() {
                groups[group].push_text(group, &token.content, &mut open);
                continue;
            }

            match grammar_name(&token.content) {
                "br" => groups[group].push_line_break(group, &mut open),
                "span" => {
                    let parent_scope = open.last().map_or(scope, |span| span.scope);
                    if let Some(span) = self.open_span(tree, node, parent_scope, binding, &mut groups, group)? {
                        open.push(span);
                        steps.push(Step::Exit);
                        steps.extend(tree.children(node).iter().rev().map(|&child| Step::Enter(child)));
                    }
                }
                "region" if Some(node) == leading => {}
                "region" => debug!(line = token.line, "ignoring inline region after content"),
                name => trace!(element = name, "skipping element inside paragraph"),
            }
        }
        Ok(groups)
    }

    fn open_span(
        &mut self,
        tree: &NodeTree<Token>,
        node: NodeId,
        parent_scope: ScopeId,
        binding: &RegionBinding,
        groups: &mut Vec<TextGroup>,
        parent_group: usize,
    ) -> Result<Option<OpenSpan>> {
        let token = tree.get(node);
        if let Some(id) = token.attribute("region") {
            if binding.id() != Some(id) {
                debug!(region = id, line = token.line, "pruning span bound to another region");
                return Ok(None);
            }
        }
        if leading_region(tree, node).is_some() {
            debug!(line = token.line, "pruning span declaring an inline region");
            return Ok(None);
        }

        let scope = match self.scopes.create_scope(Some(parent_scope), [time_factory(&token.attributes)]) {
            Ok(scope) => scope,
            Err(err) if err.is_critical() => return Err(err),
            Err(err) => {
                debug!(error = %err, line = token.line, "ignoring span with unusable timing");
                self.errors.push(ParseError::new(err, token.to_string()));
                return Ok(None);
            }
        };

        let timed = self.options.split_timed_spans
            && self.scopes.has_own_context(scope, ContextKind::Time)
            && self
                .scopes
                .time_context_id(scope)
                .and_then(|id| self.scopes.time(id))
                .is_some_and(TimeContext::has_timing);
        let group = if timed {
            groups.push(TextGroup {
                scope: Some(scope),
                ..TextGroup::default()
            });
            groups.len() - 1
        } else {
            parent_group
        };

        let mut template = Entity::new(entity_kind(token), 0, 0);
        template.styles = element_styles(token, self.scopes.style_container(scope), self.errors);
        template.lang = token.attribute("xml:lang").map(str::to_string);

        Ok(Some(OpenSpan {
            scope,
            group,
            template,
            slots: Vec::new(),
        }))
    }

    /// Active interval of a cue whose text lives in `scope`
    ///
    /// Untimed ancestry falls back to the region's own interval, then to
    /// `[0, ∞)`.
    fn interval(&self, scope: ScopeId, region: Option<&Region>) -> (f64, f64) {
        match self.scopes.time_context_id(scope) {
            Some(id) if self.scopes.is_timed(id) => (self.scopes.start_time(id), self.scopes.end_time(id)),
            _ => region
                .and_then(Region::timing)
                .unwrap_or((0.0, f64::INFINITY)),
        }
    }
}

/// Inline `<region>` child declared before any content
fn leading_region(tree: &NodeTree<Token>, node: NodeId) -> Option<NodeId> {
    for &child in tree.children(node) {
        let token = tree.get(child);
        if token.is_blank() {
            continue;
        }
        if token.kind.is_character_data() {
            return None;
        }
        match grammar_name(&token.content) {
            "region" => return Some(child),
            "metadata" | "set" | "animate" => {}
            _ => return None,
        }
    }
    None
}

fn entity_kind(token: &Token) -> EntityKind {
    match token.attribute("tts:ruby") {
        Some("container" | "base" | "baseContainer") => EntityKind::Ruby,
        Some("text" | "textContainer") => EntityKind::RubyText,
        _ => token
            .attribute("ttm:agent")
            .map_or(EntityKind::Span, |agent| EntityKind::Voice(agent.to_string())),
    }
}
