//! Constructors for time-expression errors
//!
//! Time parsing reports two kinds of failures: malformed or out-of-domain
//! values, and forms the active time base refuses (frames under `clock`,
//! offsets under `smpte`, ...).

use super::CoreError;
use core::fmt::Display;

/// Create time error from an invalid expression
pub fn invalid_time<T: Display>(expression: T, reason: &str) -> CoreError {
    CoreError::InvalidTime {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}

/// Create error for an expression form the time base does not accept
pub fn unsupported_time_expression<T: Display>(expression: T, time_base: &str) -> CoreError {
    CoreError::UnsupportedTimeExpression {
        expression: expression.to_string(),
        time_base: time_base.to_string(),
    }
}
