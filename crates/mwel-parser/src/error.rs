//! Parser error types.

use mwel_error::ErrorRecord;
use mwel_lexer::Token;
use mwel_position_tracking::Position;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Errors the parser can report.
///
/// Grammar mismatches abort the parse (the tree comes back as `None`);
/// structural problems inside an otherwise well-formed construct are
/// reported and parsing continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The token stream ran out where the grammar required more input.
    #[error("Input ended unexpectedly")]
    UnexpectedEnd,

    /// A token the grammar has no use for at this point.
    #[error("Invalid syntax")]
    UnexpectedToken(Token),

    /// A compound-call head whose target is not a plain identifier.
    #[error("Compound call head must be an identifier")]
    HeadNotIdentifier { position: Position },

    /// Positional and named arguments in the same call.
    #[error("Cannot mix positional and named arguments")]
    MixedArguments(Token),

    /// The value of a `name <- expr` argument was not an attribute
    /// expression. Diagnosed at the call's closing parenthesis.
    #[error("Named argument with '<-' must reference an attribute")]
    BadAttributeReference(Token),

    /// The same key twice in one object literal.
    #[error("Duplicate object key '{key}'")]
    DuplicateKey { key: String, token: Token },
}

impl ParseError {
    /// The offending token's text, when there is one.
    pub fn token(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedEnd | ParseError::HeadNotIdentifier { .. } => None,
            ParseError::UnexpectedToken(token)
            | ParseError::MixedArguments(token)
            | ParseError::BadAttributeReference(token)
            | ParseError::DuplicateKey { token, .. } => Some(&token.text),
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::UnexpectedEnd => None,
            ParseError::HeadNotIdentifier { position } => Some(*position),
            ParseError::UnexpectedToken(token)
            | ParseError::MixedArguments(token)
            | ParseError::BadAttributeReference(token)
            | ParseError::DuplicateKey { token, .. } => Some(token.position),
        }
    }

    pub fn into_record(self) -> ErrorRecord {
        ErrorRecord::new(self.to_string(), self.token().map(str::to_owned), self.position())
    }
}
