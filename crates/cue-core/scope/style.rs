//! Style container context: the styles declared under `<styling>`

use std::sync::Arc;

use crate::{
    model::TtmlStyle,
    utils::{split_idrefs, FastHashMap},
};

/// Ordered set of resolved styles visible from a scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleContainerContext {
    styles: Vec<Arc<TtmlStyle>>,
    index: FastHashMap<String, usize>,
}

impl StyleContainerContext {
    /// Create a container from styles in declaration order
    ///
    /// When two styles share an id the first one is reachable by id.
    #[must_use]
    pub fn new(styles: Vec<Arc<TtmlStyle>>) -> Self {
        let mut container = Self::default();
        container.extend(styles);
        container
    }

    /// Look up a style by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<TtmlStyle>> {
        self.index.get(id).map(|&position| &self.styles[position])
    }

    /// Resolve a whitespace separated id list
    ///
    /// Returns the styles found, in list order, and the ids that matched
    /// nothing.
    #[must_use]
    pub fn resolve<'v>(&self, idrefs: &'v str) -> (Vec<Arc<TtmlStyle>>, Vec<&'v str>) {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for id in split_idrefs(idrefs) {
            match self.get(id) {
                Some(style) => found.push(Arc::clone(style)),
                None => missing.push(id),
            }
        }
        (found, missing)
    }

    /// Every style in declaration order
    #[must_use]
    pub fn styles(&self) -> &[Arc<TtmlStyle>] {
        &self.styles
    }

    /// Number of styles
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the container holds no style
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Append the styles of a later `<styling>` block
    pub fn merge_with(&mut self, other: Self) {
        self.extend(other.styles);
    }

    fn extend(&mut self, styles: Vec<Arc<TtmlStyle>>) {
        for style in styles {
            let position = self.styles.len();
            self.index.entry(style.id().to_string()).or_insert(position);
            self.styles.push(style);
        }
    }
}

impl FromIterator<TtmlStyle> for StyleContainerContext {
    fn from_iter<I: IntoIterator<Item = TtmlStyle>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Arc::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(id: &str, color: &str) -> TtmlStyle {
        let mut style = TtmlStyle::new(id);
        style.set("tts:color", color);
        style
    }

    #[test]
    fn lookup_by_id() {
        let container: StyleContainerContext = [style("s1", "red"), style("s2", "blue")].into_iter().collect();
        assert_eq!(container.get("s2").and_then(|s| s.get("tts:color")), Some("blue"));
        assert!(container.get("s3").is_none());
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn resolve_reports_missing_ids() {
        let container: StyleContainerContext = [style("s1", "red")].into_iter().collect();
        let (found, missing) = container.resolve("s1 nope s1");
        assert_eq!(found.len(), 2);
        assert_eq!(missing, ["nope"]);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut first: StyleContainerContext = [style("s1", "red")].into_iter().collect();
        let second: StyleContainerContext = [style("s2", "blue"), style("s1", "green")].into_iter().collect();
        first.merge_with(second);
        let ids: Vec<_> = first.styles().iter().map(|s| s.id()).collect();
        assert_eq!(ids, ["s1", "s2", "s1"]);
        assert_eq!(first.get("s1").and_then(|s| s.get("tts:color")), Some("red"));
    }
}
