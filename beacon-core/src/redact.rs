//! Error details for error events, with message redaction.
//!
//! Error messages often carry user data (paths, server names, query text).
//! Unless the caller opts in, the message is withheld and every literal copy
//! of it inside the stack text is masked. Truncated or reformatted copies of
//! the message are not detected.

use std::error::Error as StdError;
use std::fmt::Write as _;

/// Replaces withheld message text inside stack traces.
pub const REDACTION_MARKER: &str = "<REDACTED>";

/// Message and stack for a failure being reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Attach stack text (a backtrace, or any diagnostic dump).
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture an error's `Display` output as the message and its rendered
    /// source chain as the stack. The first stack line repeats the message.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let message = err.to_string();
        let mut stack = message.clone();
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(stack, "\n    caused by: {cause}");
            source = cause.source();
        }
        Self {
            message,
            stack: Some(stack),
        }
    }

    /// The `(message, stack)` pair to put on an event.
    ///
    /// With `include_message` both are returned verbatim. Without it the
    /// message is empty and literal occurrences of it in the stack are
    /// replaced by [`REDACTION_MARKER`].
    pub fn telemetry_fields(&self, include_message: bool) -> (String, String) {
        let stack = self.stack.clone().unwrap_or_default();
        if include_message {
            return (self.message.clone(), stack);
        }
        if self.message.is_empty() {
            return (String::new(), stack);
        }
        (String::new(), stack.replace(&self.message, REDACTION_MARKER))
    }
}
