//! The error type shared by every stage of parsing.

use std::fmt;

use crate::lexer::Token;

/// Result type for the [`ParseError`]
pub type ParseResult<T> = ::std::result::Result<T, ParseError>;

/// Syntax error in the formula provided (mismatching brackets, unknown
/// command, malformed argument).
///
/// Carries a human-readable message and, when available, the offending token
/// so callers can point a caret at the source position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    message: String,
    /// The token the error is attributed to, if any.
    pub token: Option<Token>,
}

impl ParseError {
    /// Creates an error with no source attribution.
    pub fn new(message: impl Into<String>) -> Self {
        ParseError { message: message.into(), token: None }
    }

    /// Creates an error attributed to `token`.
    pub fn with_token(message: impl Into<String>, token: &Token) -> Self {
        ParseError { message: message.into(), token: Some(token.clone()) }
    }

    /// Creates an error attributed to `token` when one is at hand.
    pub fn with_opt_token(message: impl Into<String>, token: Option<&Token>) -> Self {
        ParseError { message: message.into(), token: token.cloned() }
    }

    /// The error message, without position information.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(loc) = self.token.as_ref().and_then(|tok| tok.loc) {
            write!(f, " at position {}", loc.start + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
