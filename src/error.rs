//! Centralized error types for fotosearch.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the fotosearch library.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query text could not be split into tokens.
    #[error("Syntax error at character {offset}")]
    Syntax { offset: usize },

    /// The query was empty or reduced to nothing (treated as "no filter").
    #[error("Query contains no expression")]
    NoExpression,

    /// A `)` without a matching `(`, or an empty `()` group.
    #[error("Unexpected parenthesis at token {index}")]
    UnexpectedParenthesis { index: usize },

    /// A `(` that was never closed.
    #[error("Expected closing parenthesis for group opened at token {index}")]
    ExpectedParenthesis { index: usize },

    /// Groups or negations nested deeper than the parser allows.
    #[error("Query nests too deeply at token {index}")]
    TooDeep { index: usize },

    /// More terms than a single query may hold.
    #[error("Query has more than {limit} terms")]
    TooManyTerms { limit: usize },

    /// Labels and groups are undefined for boolean combinators.
    #[error("{operation} is not implemented for {node} expressions")]
    NotImplemented {
        operation: &'static str,
        node: &'static str,
    },

    /// `as_collection` was requested for an expression that is not a collection.
    #[error("Expression is not a collection")]
    NotACollection,

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The catalog file could not be decoded.
    #[error("Invalid catalog '{path}': {reason}")]
    CatalogFormat { path: PathBuf, reason: String },
}

/// Convenience alias for `Result<T, SearchError>`.
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only means "the user typed nothing useful".
    pub fn is_no_expression(&self) -> bool {
        matches!(self, Self::NoExpression)
    }
}
