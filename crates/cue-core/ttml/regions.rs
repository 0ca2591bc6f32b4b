//! Region construction
//!
//! Out-of-line regions are declared in `<layout>` but only built the first
//! time a cue refers to them; the result is memoized for the rest of the
//! parse. Inline regions are built where they appear and never cached.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    header::nested_styles,
    memo::MemoCache,
    styles::{inline_style, referenced_styles, StyleRegistry},
    ParseError,
};
use crate::{
    model::{Region, TtmlStyle},
    scope::{active_end, RegionContainerContext, StyleContainerContext, TimeContext},
    timing::TimeDetails,
    tokenizer::Token,
    tree::{NodeId, NodeTree},
    utils::CoreError,
    Result,
};

/// Shared inputs for building a region
#[derive(Debug, Clone, Copy)]
pub struct RegionInputs<'a> {
    /// Styles visible from the referencing element
    pub styles: Option<&'a StyleContainerContext>,
    /// Document timing parameters
    pub details: &'a TimeDetails,
}

/// Lazily built out-of-line regions of one parse
#[derive(Debug, Default)]
pub struct RegionResolver {
    built: MemoCache<Arc<Region>>,
    inline_count: usize,
}

impl RegionResolver {
    /// Create an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Region declared as `id`, built on first use
    ///
    /// Unknown ids are reported against `referrer` as non-critical errors
    /// and yield `None`.
    ///
    /// # Errors
    ///
    /// Propagates critical errors from the region's own timing.
    pub fn resolve(
        &mut self,
        id: &str,
        regions: Option<&RegionContainerContext>,
        inputs: RegionInputs<'_>,
        referrer: &Token,
        errors: &mut Vec<ParseError>,
    ) -> Result<Option<Arc<Region>>> {
        let Some(definition) = regions.and_then(|regions| regions.definition(id)) else {
            warn!(region = id, line = referrer.line, "reference to undeclared region");
            errors.push(ParseError::new(
                CoreError::UnknownReference {
                    kind: "region".to_string(),
                    id: id.to_string(),
                },
                referrer.to_string(),
            ));
            return Ok(None);
        };

        let region = self.built.get_or_try_insert_with(id, || {
            debug!(region = id, "building region");
            build_region(
                &definition.id,
                &definition.element,
                definition.nested_styles.clone(),
                inputs,
                errors,
            )
            .map(Arc::new)
        })?;
        Ok(Some(Arc::clone(region)))
    }

    /// Build a region declared inside content from its buffered subtree
    ///
    /// Regions without `xml:id` are named `inline-N`; nested `<style>`
    /// children without an id take the region's name.
    ///
    /// # Errors
    ///
    /// Propagates critical errors from the region's own timing.
    pub fn build_inline(
        &mut self,
        tree: &NodeTree<Token>,
        node: NodeId,
        registry: &StyleRegistry,
        inputs: RegionInputs<'_>,
        errors: &mut Vec<ParseError>,
    ) -> Result<Arc<Region>> {
        self.inline_count += 1;
        let element = tree.get(node);
        let id = element
            .attribute("xml:id")
            .map_or_else(|| format!("inline-{}", self.inline_count), str::to_string);
        debug!(region = %id, line = element.line, "building inline region");
        let nested = nested_styles(tree, node, &id, registry, errors);
        let region = build_region(&id, element, nested, inputs, errors)?;
        Ok(Arc::new(region.inline()))
    }

    /// Number of out-of-line regions built so far
    #[must_use]
    pub fn built_count(&self) -> usize {
        self.built.len()
    }
}

/// Build a region from its declaring element
///
/// Timing comes from the region's own attributes, measured from 0. Styles
/// are the referenced ones, then nested `<style>` children, then the
/// region's own `tts:*` attributes under the region id.
fn build_region(
    id: &str,
    element: &Token,
    nested_styles: Vec<Arc<TtmlStyle>>,
    inputs: RegionInputs<'_>,
    errors: &mut Vec<ParseError>,
) -> Result<Region> {
    let mut region = Region::new(id);

    match TimeContext::from_attributes(&element.attributes, inputs.details, 0.0) {
        Ok(Some(time)) if time.has_timing() => {
            let begin = time.begin.unwrap_or(0.0);
            let end = active_end(begin, time.end, time.dur, time.time_container.unwrap_or_default());
            region = region.with_timing(begin, end);
        }
        Ok(_) => {}
        Err(err) if err.is_critical() => return Err(err),
        Err(err) => errors.push(ParseError::new(err, element.to_string())),
    }

    let mut styles = referenced_styles(element, inputs.styles, errors);
    styles.extend(nested_styles);
    if let Some(own) = inline_style(element) {
        let mut renamed = TtmlStyle::new(id);
        renamed.inherit_from(&own);
        styles.push(Arc::new(renamed));
    }

    Ok(region.with_styles(styles))
}
