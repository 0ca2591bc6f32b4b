//! Style declarations and references
//!
//! Styles are registered in document order. A `style="a b"` reference is
//! resolved against styles registered before it, so forward references and
//! cycles cannot resolve; both are reported and skipped. Referenced styles
//! are folded in with later references overriding earlier ones and the
//! referencing style's own attributes overriding all of them.

use std::sync::Arc;

use tracing::warn;

use super::{memo::MemoCache, ParseError};
use crate::{
    model::{TtmlStyle, STYLE_PREFIX},
    scope::StyleContainerContext,
    tokenizer::Token,
    utils::{create_hash_map, split_idrefs, CoreError, FastHashMap},
};

/// Styles declared under `<styling>`, in document order
#[derive(Debug, Default)]
pub struct StyleRegistry {
    declared: Vec<Arc<TtmlStyle>>,
    by_id: MemoCache<Arc<TtmlStyle>>,
    collisions: FastHashMap<String, usize>,
}

impl StyleRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            declared: Vec::new(),
            by_id: MemoCache::new(),
            collisions: create_hash_map(),
        }
    }

    /// Register a `<style>` element
    ///
    /// Returns `None` for a style without `xml:id`, which nothing could
    /// reference. A repeated id is renamed to `id--N`.
    pub fn register(&mut self, token: &Token, errors: &mut Vec<ParseError>) -> Option<Arc<TtmlStyle>> {
        let Some(declared_id) = token.attribute("xml:id") else {
            warn!(line = token.line, "discarding <style> without xml:id");
            errors.push(ParseError::new(
                CoreError::InvalidAttribute {
                    attribute: "xml:id".to_string(),
                    value: String::new(),
                },
                token.to_string(),
            ));
            return None;
        };

        let id = self.unique_id(declared_id);
        let mut style = TtmlStyle::from_attributes(id.clone(), &token.attributes);
        if let Some(references) = token.attribute("style") {
            apply_references(&mut style, references, |id| self.by_id.get(id).cloned(), token, errors);
        }

        let style = Arc::new(style);
        self.by_id.insert(id, Arc::clone(&style));
        self.declared.push(Arc::clone(&style));
        Some(style)
    }

    fn unique_id(&mut self, id: &str) -> String {
        if !self.by_id.is_occupied(id) {
            return id.to_string();
        }
        let counter = self.collisions.entry(id.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{id}--{counter}");
            if !self.by_id.is_occupied(&candidate) {
                return candidate;
            }
        }
    }

    /// Look up a registered style by its final id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<TtmlStyle>> {
        self.by_id.get(id)
    }

    /// Every registered style in document order
    #[must_use]
    pub fn declared(&self) -> &[Arc<TtmlStyle>] {
        &self.declared
    }

    /// Resolve a style that is not registered (nested in a region)
    ///
    /// Chained references see every registered style.
    pub fn resolve_nested(&self, token: &Token, fallback_id: &str, errors: &mut Vec<ParseError>) -> TtmlStyle {
        let id = token.attribute("xml:id").unwrap_or(fallback_id);
        let mut style = TtmlStyle::from_attributes(id, &token.attributes);
        if let Some(references) = token.attribute("style") {
            apply_references(&mut style, references, |id| self.by_id.get(id).cloned(), token, errors);
        }
        style
    }
}

fn apply_references<F>(
    style: &mut TtmlStyle,
    references: &str,
    lookup: F,
    token: &Token,
    errors: &mut Vec<ParseError>,
) where
    F: Fn(&str) -> Option<Arc<TtmlStyle>>,
{
    let mut found = Vec::new();
    for id in split_idrefs(references) {
        match lookup(id) {
            Some(referenced) => found.push(referenced),
            None => report_unknown_style(id, token, errors),
        }
    }
    for referenced in found.iter().rev() {
        style.inherit_from(referenced);
    }
}

fn report_unknown_style(id: &str, token: &Token, errors: &mut Vec<ParseError>) {
    warn!(style = id, line = token.line, "discarding unresolvable style reference");
    errors.push(ParseError::new(
        CoreError::UnknownReference {
            kind: "style".to_string(),
            id: id.to_string(),
        },
        token.to_string(),
    ));
}

/// Styles applied by a content element (`body`, `div`, `p`, `span`)
///
/// Referenced styles in reference order, then an anonymous style holding
/// the element's own `tts:*` attributes when it has any.
pub fn element_styles(
    token: &Token,
    container: Option<&StyleContainerContext>,
    errors: &mut Vec<ParseError>,
) -> Vec<Arc<TtmlStyle>> {
    let mut styles = referenced_styles(token, container, errors);
    if let Some(inline) = inline_style(token) {
        styles.push(Arc::new(inline));
    }
    styles
}

/// Styles named by the element's `style` attribute
///
/// Ids that are not visible through `container` are reported and skipped.
pub fn referenced_styles(
    token: &Token,
    container: Option<&StyleContainerContext>,
    errors: &mut Vec<ParseError>,
) -> Vec<Arc<TtmlStyle>> {
    let Some(references) = token.attribute("style") else {
        return Vec::new();
    };
    let (found, missing) = container.map_or_else(
        || (Vec::new(), split_idrefs(references).collect()),
        |container| container.resolve(references),
    );
    for id in missing {
        report_unknown_style(id, token, errors);
    }
    found
}

/// The element's own `tts:*` attributes as a style
///
/// Named after the element's `xml:id`, or its local name without one.
#[must_use]
pub fn inline_style(token: &Token) -> Option<TtmlStyle> {
    let has_styling = token.attributes.with_prefix(STYLE_PREFIX).next().is_some();
    has_styling.then(|| {
        let id = token.attribute("xml:id").unwrap_or_else(|| token.local_name());
        TtmlStyle::from_attributes(id, &token.attributes)
    })
}
