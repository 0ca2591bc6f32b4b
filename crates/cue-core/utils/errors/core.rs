//! Core error type for cue-core operations
//!
//! Provides the main `CoreError` enum shared by every stage of the pipeline:
//! tokenizer, grammar validation, scope construction, time parsing and the
//! adapter façade. The adapter decides per variant whether an error aborts
//! the whole parse (critical) or is recorded and skipped.

use thiserror::Error;

/// Main error type for cue-core operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Lexical errors that could not be recovered inside the tokenizer
    #[error("Tokenization error: {0}")]
    Tokenization(String),

    /// Time expression could not be parsed or is out of domain
    #[error("Invalid time expression '{expression}': {reason}")]
    InvalidTime { expression: String, reason: String },

    /// Time expression form is not available under the active time base
    #[error("Time expression '{expression}' is not supported by the '{time_base}' time base")]
    UnsupportedTimeExpression {
        expression: String,
        time_base: String,
    },

    /// A `one_or_more` grammar rule never matched
    #[error("Expected at least one <{element}> element")]
    MinimumElementViolation { element: String },

    /// Element appears where the document grammar does not allow it
    #[error("Element <{element}> is not allowed inside <{parent}>")]
    InvalidNesting { element: String, parent: String },

    /// Element lies deeper than the configured nesting limit
    #[error("Element <{element}> exceeds the nesting limit of {limit}")]
    NestingTooDeep { element: String, limit: usize },

    /// A second document context was requested within one parse
    #[error("A document context already exists for this parse")]
    DuplicateDocumentContext,

    /// Attribute combination forbidden by the active parameters
    #[error("Attribute '{attribute}' is not allowed: {reason}")]
    DisallowedAttribute { attribute: String, reason: String },

    /// Attribute value cannot be interpreted
    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String },

    /// Reference to a style or region id that is not visible
    #[error("Unknown {kind} reference '{id}'")]
    UnknownReference { kind: String, id: String },

    /// Document does not start with the expected root element
    #[error("Malformed root: expected <{expected}>, found {found}")]
    MalformedRoot { expected: String, found: String },

    /// Nothing to parse
    #[error("Missing content: the track content is empty")]
    MissingContent,

    /// Adapter produced data that violates the cue model
    #[error("Invalid adapter output: {0}")]
    InvalidOutput(String),

    /// Error raised inside an adapter, tagged with the adapter identity
    #[error("{adapter} adapter failed: {source}")]
    Adapter {
        adapter: String,
        #[source]
        source: Box<CoreError>,
    },

    /// Internal consistency error (should not happen)
    #[error("Internal error: {0} (this is a bug, please report)")]
    Internal(String),
}

impl CoreError {
    /// Create internal error (indicates a bug)
    pub fn internal<T: core::fmt::Display>(message: T) -> Self {
        Self::Internal(message.to_string())
    }

    /// Wrap an error with the identity of the adapter that raised it
    ///
    /// Already wrapped errors are returned unchanged so the innermost
    /// adapter identity is kept.
    #[must_use]
    pub fn in_adapter(self, adapter: &str) -> Self {
        match self {
            wrapped @ Self::Adapter { .. } => wrapped,
            other => Self::Adapter {
                adapter: adapter.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Check if error must abort the whole parse
    ///
    /// Critical errors never produce partial results. Everything else is
    /// collected next to the cues that could still be produced.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        match self {
            Self::MissingContent
            | Self::MalformedRoot { .. }
            | Self::InvalidOutput(_)
            | Self::MinimumElementViolation { .. }
            | Self::DuplicateDocumentContext
            | Self::DisallowedAttribute { .. }
            | Self::Internal(_) => true,

            Self::Tokenization(_)
            | Self::InvalidTime { .. }
            | Self::UnsupportedTimeExpression { .. }
            | Self::InvalidNesting { .. }
            | Self::NestingTooDeep { .. }
            | Self::InvalidAttribute { .. }
            | Self::UnknownReference { .. } => false,

            Self::Adapter { source, .. } => source.is_critical(),
        }
    }

    /// Check if error is recoverable
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !self.is_critical()
    }

    /// Check if error indicates a bug in the library
    #[must_use]
    pub fn is_internal_bug(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Adapter { source, .. } => source.is_internal_bug(),
            _ => false,
        }
    }

    /// Innermost error, skipping adapter wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Adapter { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = core::result::Result<T, CoreError>;
