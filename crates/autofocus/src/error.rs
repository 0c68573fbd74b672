//! Error types for autofocus
//!
//! None of these reach the host: the locator recovers from selector errors
//! and the watcher stays inert when observation fails.

use autofocus_dom::SelectorError;
use thiserror::Error;

/// Errors reported by [`crate::Platform`] primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FocusError {
    /// The selector is not valid syntax for the platform's matching engine
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The platform could not create a visibility observer
    #[error("failed to observe element: {0}")]
    Observe(String),
}

impl From<SelectorError> for FocusError {
    fn from(err: SelectorError) -> Self {
        FocusError::InvalidSelector {
            reason: format!("{} (column {})", err.message, err.column),
            selector: err.selector,
        }
    }
}

/// Result type for autofocus operations
pub type Result<T> = std::result::Result<T, FocusError>;
