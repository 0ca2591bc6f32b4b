//! Error types shared across the caption pipeline
//!
//! # Error Philosophy
//!
//! - Use `thiserror` for structured error handling (no `anyhow` in the library)
//! - Every variant knows whether it aborts a parse (`is_critical`)
//! - Sub-parser failures are wrapped with the adapter identity before they
//!   leave the adapter
//!
//! # Examples
//!
//! ```rust
//! use cue_core::utils::errors::{invalid_time, CoreError};
//!
//! let err = invalid_time("1:23", "missing seconds");
//! assert!(err.is_recoverable());
//! assert!(CoreError::MissingContent.is_critical());
//! ```

mod core;
mod time;

pub use self::core::{CoreError, Result};
pub use time::{invalid_time, unsupported_time_expression};

impl From<::core::num::ParseIntError> for CoreError {
    fn from(err: ::core::num::ParseIntError) -> Self {
        Self::Tokenization(format!("Integer parse error: {err}"))
    }
}
