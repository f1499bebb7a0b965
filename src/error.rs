//! Error types for the braid composition engine.

use thiserror::Error;

/// Errors raised by the composition engine itself.
///
/// Only construction-time misuse is an error. Every structural or lookup
/// failure on the traversal surface is an inspectable value (`None`, empty
/// mapping) so that walking a wire stays exception-free.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("knot namespace must not be empty")]
    EmptyNamespace,
}

/// Errors raised while initializing the logging subsystem.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level: {0} (must be trace, debug, info, warn, error or off)")]
    InvalidLevel(String),

    #[error("invalid log format: {0} (must be 'json' or 'text')")]
    InvalidFormat(String),
}
