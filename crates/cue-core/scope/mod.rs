//! Scopes and contexts
//!
//! A scope is created for every element the adapter enters. It carries at
//! most one context per [`ContextKind`]: either its own, or a link to the
//! nearest ancestor's. Scopes and contexts live in two arenas owned by
//! [`ScopeTree`] and refer to each other by index, so parents never hold
//! references to children.
//!
//! Context construction goes through [`ContextFactory`] closures that see
//! the tree as it was before the new scope existed. If any factory fails,
//! nothing is added.
//!
//! # Example
//!
//! ```rust
//! use cue_core::scope::{time::time_factory, ContextKind, ScopeTree};
//! use cue_core::tokenizer::Attributes;
//!
//! let mut tree = ScopeTree::new();
//! let outer: Attributes = [("begin", "10s")].into_iter().collect();
//! let inner: Attributes = [("begin", "1s"), ("dur", "2s")].into_iter().collect();
//!
//! let div = tree.create_scope(None, vec![time_factory(&outer)])?;
//! let p = tree.create_scope(Some(div), vec![time_factory(&inner)])?;
//!
//! let time = tree.context_id(p, ContextKind::Time).unwrap();
//! assert_eq!(tree.start_time(time), 11_000.0);
//! assert_eq!(tree.end_time(time), 13_000.0);
//! # Ok::<(), cue_core::CoreError>(())
//! ```

pub mod document;
pub mod region;
pub mod style;
pub mod time;

pub use document::{document_factory, DocumentContext};
pub use region::{RegionContainerContext, RegionDefinition};
pub use style::StyleContainerContext;
pub use time::{active_end, time_factory, TimeContainer, TimeContext};

use crate::{timing::TimeDetails, utils::CoreError, Result};

/// Handle of a scope in a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

/// Handle of a context in a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

/// Kinds of context a scope can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Element timing
    Time,
    /// Declared styles
    StyleContainer,
    /// Declared regions
    RegionContainer,
    /// Document parameters
    Document,
}

impl ContextKind {
    /// Every kind
    pub const ALL: [Self; 4] = [
        Self::Time,
        Self::StyleContainer,
        Self::RegionContainer,
        Self::Document,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::Time => 0,
            Self::StyleContainer => 1,
            Self::RegionContainer => 2,
            Self::Document => 3,
        }
    }
}

/// Context payload
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// See [`TimeContext`]
    Time(TimeContext),
    /// See [`StyleContainerContext`]
    StyleContainer(StyleContainerContext),
    /// See [`RegionContainerContext`]
    RegionContainer(RegionContainerContext),
    /// See [`DocumentContext`]
    Document(DocumentContext),
}

impl Context {
    /// Kind of this context
    #[must_use]
    pub const fn kind(&self) -> ContextKind {
        match self {
            Self::Time(_) => ContextKind::Time,
            Self::StyleContainer(_) => ContextKind::StyleContainer,
            Self::RegionContainer(_) => ContextKind::RegionContainer,
            Self::Document(_) => ContextKind::Document,
        }
    }

    /// Fold a context of the same kind into this one
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateDocumentContext`] for two document
    /// contexts and an internal error for mismatched kinds.
    pub fn merge_with(&mut self, other: Self) -> Result<()> {
        match (self, other) {
            (Self::Time(own), Self::Time(other)) => own.merge_with(other),
            (Self::StyleContainer(own), Self::StyleContainer(other)) => own.merge_with(other),
            (Self::RegionContainer(own), Self::RegionContainer(other)) => own.merge_with(other),
            (Self::Document(_), Self::Document(_)) => return Err(CoreError::DuplicateDocumentContext),
            (own, other) => {
                return Err(CoreError::internal(format!(
                    "cannot merge {:?} context into {:?} context",
                    other.kind(),
                    own.kind()
                )))
            }
        }
        Ok(())
    }
}

/// Deferred context constructor
///
/// Receives the tree and the parent of the scope being created. Returning
/// `Ok(None)` means the element does not need a context of this kind.
pub type ContextFactory<'a> = Box<dyn FnOnce(&ScopeTree, Option<ScopeId>) -> Result<Option<Context>> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Own(ContextId),
    Linked(ContextId),
}

impl Slot {
    const fn id(self) -> ContextId {
        match self {
            Self::Own(id) | Self::Linked(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
struct Scope {
    parent: Option<ScopeId>,
    slots: [Option<Slot>; 4],
}

#[derive(Debug, Clone)]
struct ContextEntry {
    context: Context,
    parent: Option<ContextId>,
}

/// Arena of scopes and contexts for one parse
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    contexts: Vec<ContextEntry>,
    document: Option<ContextId>,
}

impl ScopeTree {
    /// Create an empty tree
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scopes: Vec::new(),
            contexts: Vec::new(),
            document: None,
        }
    }

    /// Create a scope below `parent`
    ///
    /// Factories run first, against the tree without the new scope. Their
    /// contexts are attached in order; two contexts of one kind are merged.
    /// Each own context's parent is the nearest ancestor context of its
    /// kind. Kinds the scope does not produce are linked to the parent's.
    ///
    /// # Errors
    ///
    /// Propagates the first factory error, and returns
    /// [`CoreError::DuplicateDocumentContext`] when a document context is
    /// produced twice in one tree. On error the tree is left unchanged.
    pub fn create_scope<'a>(
        &mut self,
        parent: Option<ScopeId>,
        factories: impl IntoIterator<Item = ContextFactory<'a>>,
    ) -> Result<ScopeId> {
        let mut produced = Vec::new();
        for factory in factories {
            if let Some(context) = factory(self, parent)? {
                produced.push(context);
            }
        }

        let id = ScopeId(self.scopes.len());
        let context_mark = self.contexts.len();
        let document_before = self.document;
        self.scopes.push(Scope {
            parent,
            slots: [None; 4],
        });

        for context in produced {
            if let Err(err) = self.attach(id, context) {
                self.scopes.truncate(id.0);
                self.contexts.truncate(context_mark);
                self.document = document_before;
                return Err(err);
            }
        }

        if let Some(parent) = parent {
            for kind in ContextKind::ALL {
                if self.scopes[id.0].slots[kind.slot()].is_none() {
                    if let Some(linked) = self.context_id(parent, kind) {
                        self.scopes[id.0].slots[kind.slot()] = Some(Slot::Linked(linked));
                    }
                }
            }
        }

        Ok(id)
    }

    /// Attach a context to an existing scope
    ///
    /// Merges into an own context of the same kind, or replaces a linked
    /// one, in which case the linked context becomes the new one's parent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateDocumentContext`] for a second document
    /// context.
    pub fn add_context(&mut self, scope: ScopeId, context: Context) -> Result<ContextId> {
        self.attach(scope, context)
    }

    fn attach(&mut self, scope: ScopeId, context: Context) -> Result<ContextId> {
        let kind = context.kind();
        match self.scopes[scope.0].slots[kind.slot()] {
            Some(Slot::Own(existing)) => {
                self.contexts[existing.0].context.merge_with(context)?;
                Ok(existing)
            }
            Some(Slot::Linked(linked)) => {
                let id = self.store(context, Some(linked))?;
                self.scopes[scope.0].slots[kind.slot()] = Some(Slot::Own(id));
                Ok(id)
            }
            None => {
                let parent = self.scopes[scope.0]
                    .parent
                    .and_then(|parent| self.context_id(parent, kind));
                let id = self.store(context, parent)?;
                self.scopes[scope.0].slots[kind.slot()] = Some(Slot::Own(id));
                Ok(id)
            }
        }
    }

    fn store(&mut self, context: Context, parent: Option<ContextId>) -> Result<ContextId> {
        let id = ContextId(self.contexts.len());
        if context.kind() == ContextKind::Document {
            if self.document.is_some() {
                return Err(CoreError::DuplicateDocumentContext);
            }
            self.document = Some(id);
        }
        self.contexts.push(ContextEntry { context, parent });
        Ok(id)
    }

    /// Parent scope
    #[must_use]
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0).and_then(|s| s.parent)
    }

    /// Context of `kind` visible from `scope`
    ///
    /// Checks the scope's own slot, then walks up the parent scopes.
    #[must_use]
    pub fn context_id(&self, scope: ScopeId, kind: ContextKind) -> Option<ContextId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if let Some(slot) = scope.slots[kind.slot()] {
                return Some(slot.id());
            }
            current = scope.parent;
        }
        None
    }

    /// Check if `scope` holds its own context of `kind`
    #[must_use]
    pub fn has_own_context(&self, scope: ScopeId, kind: ContextKind) -> bool {
        matches!(
            self.scopes.get(scope.0).and_then(|s| s.slots[kind.slot()]),
            Some(Slot::Own(_))
        )
    }

    /// Context payload
    #[must_use]
    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(id.0).map(|entry| &entry.context)
    }

    /// Nearest ancestor context of the same kind
    #[must_use]
    pub fn context_parent(&self, id: ContextId) -> Option<ContextId> {
        self.contexts.get(id.0).and_then(|entry| entry.parent)
    }

    /// Time context visible from `scope`
    #[must_use]
    pub fn time_context_id(&self, scope: ScopeId) -> Option<ContextId> {
        self.context_id(scope, ContextKind::Time)
    }

    /// Raw timing stored in a context
    #[must_use]
    pub fn time(&self, id: ContextId) -> Option<&TimeContext> {
        match self.context(id) {
            Some(Context::Time(time)) => Some(time),
            _ => None,
        }
    }

    /// Check if the context or any ancestor sets `begin`, `end` or `dur`
    #[must_use]
    pub fn is_timed(&self, id: ContextId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            if self.time(id).is_some_and(TimeContext::has_timing) {
                return true;
            }
            current = self.context_parent(id);
        }
        false
    }

    /// Start of a time context: own `begin`, else the parent's start, else 0
    #[must_use]
    pub fn start_time(&self, id: ContextId) -> f64 {
        let mut current = Some(id);
        while let Some(id) = current {
            if let Some(begin) = self.time(id).and_then(|time| time.begin) {
                return begin;
            }
            current = self.context_parent(id);
        }
        0.0
    }

    /// Container of a time context: own, else the direct parent's, else `par`
    #[must_use]
    pub fn time_container(&self, id: ContextId) -> TimeContainer {
        self.time(id)
            .and_then(|time| time.time_container)
            .or_else(|| {
                self.context_parent(id)
                    .and_then(|parent| self.time(parent))
                    .and_then(|time| time.time_container)
            })
            .unwrap_or_default()
    }

    /// Active end of a time context, see [`active_end`]
    #[must_use]
    pub fn end_time(&self, id: ContextId) -> f64 {
        let (end, dur) = self.time(id).map_or((None, None), |time| (time.end, time.dur));
        active_end(self.start_time(id), end, dur, self.time_container(id))
    }

    /// The document context, once created
    #[must_use]
    pub fn document(&self) -> Option<&DocumentContext> {
        match self.document.and_then(|id| self.context(id)) {
            Some(Context::Document(document)) => Some(document),
            _ => None,
        }
    }

    /// Document time parameters, or defaults before the root is seen
    #[must_use]
    pub fn time_details(&self) -> TimeDetails {
        self.document()
            .map(|document| document.time_details)
            .unwrap_or_default()
    }

    /// Styles visible from `scope`
    #[must_use]
    pub fn style_container(&self, scope: ScopeId) -> Option<&StyleContainerContext> {
        match self
            .context_id(scope, ContextKind::StyleContainer)
            .and_then(|id| self.context(id))
        {
            Some(Context::StyleContainer(styles)) => Some(styles),
            _ => None,
        }
    }

    /// Region declarations visible from `scope`
    #[must_use]
    pub fn region_container(&self, scope: ScopeId) -> Option<&RegionContainerContext> {
        match self
            .context_id(scope, ContextKind::RegionContainer)
            .and_then(|id| self.context(id))
        {
            Some(Context::RegionContainer(regions)) => Some(regions),
            _ => None,
        }
    }

    /// Number of scopes
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Number of contexts
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Attributes;

    fn timing(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    fn fixed(context: Context) -> ContextFactory<'static> {
        Box::new(move |_, _| Ok(Some(context)))
    }

    fn time(begin: Option<f64>, end: Option<f64>, dur: Option<f64>) -> Context {
        Context::Time(TimeContext {
            begin,
            end,
            dur,
            time_container: None,
        })
    }

    #[test]
    fn same_kind_contexts_are_merged() {
        let mut tree = ScopeTree::new();
        let scope = tree
            .create_scope(
                None,
                vec![fixed(time(Some(1.0), None, None)), fixed(time(None, Some(5.0), None))],
            )
            .unwrap();
        assert_eq!(tree.context_count(), 1);
        let id = tree.time_context_id(scope).unwrap();
        assert_eq!(tree.start_time(id), 1.0);
        assert_eq!(tree.end_time(id), 5.0);
    }

    #[test]
    fn missing_kinds_are_linked_to_parent() {
        let mut tree = ScopeTree::new();
        let root = tree
            .create_scope(None, vec![fixed(Context::StyleContainer(StyleContainerContext::default()))])
            .unwrap();
        let child = tree.create_scope(Some(root), Vec::new()).unwrap();
        assert!(!tree.has_own_context(child, ContextKind::StyleContainer));
        assert_eq!(
            tree.context_id(child, ContextKind::StyleContainer),
            tree.context_id(root, ContextKind::StyleContainer)
        );
        assert!(tree.context_id(child, ContextKind::Time).is_none());
    }

    #[test]
    fn adding_over_a_link_replaces_it() {
        let mut tree = ScopeTree::new();
        let root = tree
            .create_scope(None, vec![fixed(time(Some(2000.0), None, None))])
            .unwrap();
        let child = tree.create_scope(Some(root), Vec::new()).unwrap();
        let linked = tree.time_context_id(child).unwrap();

        let own = tree
            .add_context(child, time(None, None, Some(500.0)))
            .unwrap();
        assert_ne!(own, linked);
        assert_eq!(tree.context_parent(own), Some(linked));
        assert!(tree.has_own_context(child, ContextKind::Time));
        assert_eq!(tree.start_time(own), 2000.0);
        assert_eq!(tree.end_time(own), 2500.0);
    }

    #[test]
    fn second_document_is_rejected_and_rolled_back() {
        let mut tree = ScopeTree::new();
        let root = tree
            .create_scope(None, vec![fixed(Context::Document(DocumentContext::default()))])
            .unwrap();
        let scopes = tree.scope_count();
        let contexts = tree.context_count();

        let err = tree
            .create_scope(Some(root), vec![fixed(Context::Document(DocumentContext::default()))])
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateDocumentContext);
        assert_eq!(tree.scope_count(), scopes);
        assert_eq!(tree.context_count(), contexts);

        let err = tree
            .add_context(root, Context::Document(DocumentContext::default()))
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateDocumentContext);
    }

    #[test]
    fn factory_error_leaves_tree_unchanged() {
        let mut tree = ScopeTree::new();
        let attributes = timing(&[("begin", "bogus")]);
        assert!(tree.create_scope(None, vec![time_factory(&attributes)]).is_err());
        assert_eq!(tree.scope_count(), 0);
    }

    #[test]
    fn start_is_inherited_and_relative() {
        let mut tree = ScopeTree::new();
        let body = timing(&[("begin", "5s")]);
        let div = timing(&[("timeContainer", "seq")]);
        let p = timing(&[("begin", "1s")]);

        let body = tree.create_scope(None, vec![time_factory(&body)]).unwrap();
        let div = tree.create_scope(Some(body), vec![time_factory(&div)]).unwrap();
        let p = tree.create_scope(Some(div), vec![time_factory(&p)]).unwrap();

        let div_time = tree.time_context_id(div).unwrap();
        assert_eq!(tree.start_time(div_time), 5000.0);
        assert_eq!(tree.time_container(div_time), TimeContainer::Seq);
        assert_eq!(tree.end_time(div_time), 0.0);

        let p_time = tree.time_context_id(p).unwrap();
        assert_eq!(tree.start_time(p_time), 6000.0);
        assert_eq!(tree.time_container(p_time), TimeContainer::Seq);
    }

    #[test]
    fn container_inherits_from_direct_parent_only() {
        let mut tree = ScopeTree::new();
        let outer = timing(&[("timeContainer", "seq")]);
        let middle = timing(&[("begin", "0s")]);
        let inner = timing(&[("begin", "1s")]);
        let outer = tree.create_scope(None, vec![time_factory(&outer)]).unwrap();
        let middle = tree.create_scope(Some(outer), vec![time_factory(&middle)]).unwrap();
        let inner = tree.create_scope(Some(middle), vec![time_factory(&inner)]).unwrap();

        let inner_time = tree.time_context_id(inner).unwrap();
        assert_eq!(tree.time_container(inner_time), TimeContainer::Par);
        assert_eq!(tree.end_time(inner_time), f64::INFINITY);
    }

    #[test]
    fn container_only_context_is_untimed() {
        let mut tree = ScopeTree::new();
        let seq = timing(&[("timeContainer", "seq")]);
        let scope = tree.create_scope(None, vec![time_factory(&seq)]).unwrap();
        let id = tree.time_context_id(scope).unwrap();
        assert!(!tree.is_timed(id));

        let dur = timing(&[("dur", "1s")]);
        let child = tree.create_scope(Some(scope), vec![time_factory(&dur)]).unwrap();
        assert!(tree.is_timed(tree.time_context_id(child).unwrap()));
    }

    #[test]
    fn document_supplies_time_details() {
        let mut tree = ScopeTree::new();
        assert_eq!(tree.time_details(), TimeDetails::default());
        let root_attributes = timing(&[("ttp:tickRate", "10")]);
        let mut issues = Vec::new();
        tree.create_scope(
            None,
            vec![document_factory(&root_attributes, TimeDetails::default(), &mut issues)],
        )
        .unwrap();
        assert_eq!(tree.time_details().tick_rate, 10.0);
        assert!(tree.document().is_some());
    }
}
