//! TTML adapter
//!
//! Turns a TTML document into [`CueNode`]s in one streaming pass over the
//! token stream. Header blocks (`<styling>`, `<layout>`) and paragraphs are
//! collected into small node trees; everything else is handled as tokens
//! arrive.
//!
//! Errors are split in two classes. Critical errors abort the parse and are
//! returned as `Err`. Everything else is recorded in
//! [`ParseResult::errors`] next to the cues that could still be produced,
//! and reported once to the optional safe-failure callback.
//!
//! # Example
//!
//! ```rust
//! use cue_core::ttml::{CaptionAdapter, TtmlAdapter};
//!
//! let document = r#"<tt xmlns="http://www.w3.org/ns/ttml">
//!   <body><div>
//!     <p begin="1s" end="2.5s">Hello <span tts:color="yellow">world</span></p>
//!   </div></body>
//! </tt>"#;
//!
//! let result = TtmlAdapter::new().parse(document)?;
//! assert_eq!(result.data.len(), 1);
//! assert_eq!(result.data[0].content(), "Hello world");
//! assert_eq!(result.data[0].end_time(), 2500.0);
//! # Ok::<(), cue_core::CoreError>(())
//! ```

pub mod header;
mod materialize;
pub mod memo;
pub mod options;
pub mod regions;
pub mod styles;
mod walker;

use core::fmt;

pub use memo::MemoCache;
pub use options::AdapterOptions;

use tracing::debug;

use crate::{model::CueNode, utils::CoreError, Result};

/// Name the TTML adapter reports in wrapped errors
pub const ADAPTER_NAME: &str = "ttml";

/// One problem met while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong
    pub error: CoreError,
    /// Markup of the element being processed, or empty
    pub failed_chunk: String,
    /// Whether the problem aborts the parse
    pub is_critical: bool,
}

impl ParseError {
    /// Record an error; criticality follows [`CoreError::is_critical`]
    #[must_use]
    pub fn new(error: CoreError, failed_chunk: impl Into<String>) -> Self {
        Self {
            is_critical: error.is_critical(),
            error,
            failed_chunk: failed_chunk.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed_chunk.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{} in `{}`", self.error, self.failed_chunk)
        }
    }
}

/// Cues produced by a parse plus the problems that did not abort it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    /// Cues in document order
    pub data: Vec<CueNode>,
    /// Recorded problems in the order they were met
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Check if any recorded problem is critical
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.errors.iter().any(|error| error.is_critical)
    }

    /// Recorded problems that did not abort the parse
    pub fn recoverable(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter().filter(|error| !error.is_critical)
    }
}

/// Common interface of caption format adapters
pub trait CaptionAdapter: Send + Sync {
    /// Short adapter name
    fn name(&self) -> &'static str;

    /// Check if the adapter handles a MIME type
    fn supports(&self, mime: &str) -> bool;

    /// Parse a whole document
    ///
    /// # Errors
    ///
    /// Returns the first critical error met.
    fn parse(&self, content: &str) -> Result<ParseResult>;
}

type SafeFailureCallback = Box<dyn Fn(&ParseError) + Send + Sync>;

/// Adapter for TTML documents
///
/// Whitespace-only text between tags is dropped rather than collapsed to a
/// space, so `<span>Hello</span> <span>world</span>` reads `Helloworld`.
/// Keep separating spaces inside a span when they matter.
#[derive(Default)]
pub struct TtmlAdapter {
    options: AdapterOptions,
    on_safe_failure: Option<SafeFailureCallback>,
}

impl fmt::Debug for TtmlAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtmlAdapter")
            .field("options", &self.options)
            .field("on_safe_failure", &self.on_safe_failure.is_some())
            .finish()
    }
}

impl TtmlAdapter {
    /// Create an adapter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter with custom options
    #[must_use]
    pub fn with_options(options: AdapterOptions) -> Self {
        Self {
            options,
            on_safe_failure: None,
        }
    }

    /// Register a callback invoked once per non-critical error
    #[must_use]
    pub fn on_safe_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ParseError) + Send + Sync + 'static,
    {
        self.on_safe_failure = Some(Box::new(callback));
        self
    }

    /// Active options
    #[must_use]
    pub const fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl CaptionAdapter for TtmlAdapter {
    fn name(&self) -> &'static str {
        ADAPTER_NAME
    }

    fn supports(&self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        ["application/ttml+xml", "application/xml", "text/xml"]
            .iter()
            .any(|supported| essence.eq_ignore_ascii_case(supported))
    }

    fn parse(&self, content: &str) -> Result<ParseResult> {
        if content.trim().is_empty() {
            return Ok(ParseResult {
                data: Vec::new(),
                errors: vec![ParseError::new(CoreError::MissingContent, "")],
            });
        }

        let result = walker::DocumentWalker::new(content, &self.options)
            .run()
            .map_err(|err| match err {
                root @ CoreError::MalformedRoot { .. } => root,
                other => other.in_adapter(ADAPTER_NAME),
            })?;

        debug!(
            cues = result.data.len(),
            errors = result.errors.len(),
            "parsed ttml document"
        );

        if let Some(callback) = &self.on_safe_failure {
            result.recoverable().for_each(|error| callback(error));
        }
        Ok(result)
    }
}
