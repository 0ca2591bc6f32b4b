//! Document-wide parameters read from the root element

use super::{Context, ContextFactory};
use crate::{
    timing::TimeDetails,
    tokenizer::Attributes,
    utils::CoreError,
};

/// Default `ttp:cellResolution`
pub const DEFAULT_CELL_RESOLUTION: (u32, u32) = (32, 15);

/// Parameters of the whole document; exactly one per parse
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    /// Timing parameters
    pub time_details: TimeDetails,
    /// `ttp:cellResolution` as columns and rows
    pub cell_resolution: (u32, u32),
    /// `tts:extent` of the root container
    pub extent: Option<String>,
    /// `xml:lang` of the root
    pub lang: Option<String>,
}

impl Default for DocumentContext {
    fn default() -> Self {
        Self {
            time_details: TimeDetails::default(),
            cell_resolution: DEFAULT_CELL_RESOLUTION,
            extent: None,
            lang: None,
        }
    }
}

impl DocumentContext {
    /// Read document parameters from the root attributes
    ///
    /// `defaults` supplies timing parameters the document does not set.
    /// Malformed values fall back to defaults and are reported in `issues`.
    pub fn from_attributes(attributes: &Attributes, defaults: &TimeDetails, issues: &mut Vec<CoreError>) -> Self {
        let cell_resolution = match attributes.get("ttp:cellResolution") {
            None => DEFAULT_CELL_RESOLUTION,
            Some(value) => parse_cell_resolution(value).unwrap_or_else(|| {
                issues.push(CoreError::InvalidAttribute {
                    attribute: "ttp:cellResolution".to_string(),
                    value: value.to_string(),
                });
                DEFAULT_CELL_RESOLUTION
            }),
        };

        Self {
            time_details: TimeDetails::from_attributes(attributes, defaults, issues),
            cell_resolution,
            extent: attributes.get("tts:extent").map(str::to_string),
            lang: attributes.get("xml:lang").map(str::to_string),
        }
    }
}

fn parse_cell_resolution(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.split_ascii_whitespace().map(str::parse::<u32>);
    let columns = parts.next()?.ok()?;
    let rows = parts.next()?.ok()?;
    (parts.next().is_none() && columns > 0 && rows > 0).then_some((columns, rows))
}

/// Factory for the document context of the root scope
///
/// Attribute problems are pushed to `issues`; they never prevent the
/// context from being created.
pub fn document_factory<'a>(
    attributes: &'a Attributes,
    defaults: TimeDetails,
    issues: &'a mut Vec<CoreError>,
) -> ContextFactory<'a> {
    Box::new(move |_, _| {
        Ok(Some(Context::Document(DocumentContext::from_attributes(
            attributes, &defaults, issues,
        ))))
    })
}
