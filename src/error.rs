//! Error handling for the router.
//!
//! This module defines the types that describe a failed or finished dispatch:
//!
//! - [`RouterError`]: every error the crate produces (bad patterns,
//!   undecodable path segments, handler failures, unparsable hrefs).
//! - [`DispatchOutcome`]: the settled (or not yet settled) state of one
//!   pipeline run.
//!
//! "No match" is never an error: matchers return `Ok(None)` / `Ok(false)`.
//!
//! # Examples
//!
//! ```
//! use page_router::{DispatchOutcome, RouterError};
//!
//! let outcome = DispatchOutcome::Failed(RouterError::handler("boom"));
//! assert!(outcome.is_failed());
//! assert_eq!(outcome.error().unwrap().to_string(), "Handler failed: boom");
//! ```

use std::fmt;

/// Errors produced by pattern compilation, matching, dispatch and href parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// The pattern could not be compiled into a matcher.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A captured segment is not valid percent-encoding.
    #[error("Could not decode '{value}': {reason}")]
    Decode { value: String, reason: String },

    /// A handler advanced the pipeline with an error.
    #[error("Handler failed: {message}")]
    Handler { message: String },

    /// An activated link carried an href that is not a URL.
    #[error("Invalid href '{href}': {reason}")]
    InvalidHref { href: String, reason: String },

    /// A configuration document could not be read.
    #[error("Invalid router configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl RouterError {
    /// Build the error a handler passes to [`Next::fail`](crate::Next::fail).
    pub fn handler(message: impl fmt::Display) -> Self {
        Self::Handler {
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(value: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// `true` for [`RouterError::Decode`].
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// State of a pipeline run, as reported by a [`Completion`](crate::Completion).
///
/// A run stays `Pending` while a continuation-style handler holds on to its
/// [`Next`](crate::Next). It settles exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DispatchOutcome {
    /// Some handler has not advanced yet.
    #[default]
    Pending,
    /// Every handler ran and no error was left unhandled.
    Completed,
    /// The run reached the end with an error no recovery handler cleared.
    Failed(RouterError),
}

impl DispatchOutcome {
    /// Check if the run is still waiting on a handler
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if the run finished without an unhandled error
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if the run finished with an unhandled error
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Check if the run has settled either way
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Get the unhandled error, if the run failed
    pub fn error(&self) -> Option<&RouterError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}
