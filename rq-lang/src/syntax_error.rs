use std::ops::Range;

use thiserror::Error;

use crate::tokenizer::Token;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum SyntaxError {
    /// The argument is the string index of the illegal character.
    #[error("illegal character")]
    IllegalCharacter(usize),
    /// The argument is the string index of the string's opening quote.
    #[error("unterminated string literal")]
    UnterminatedStringLiteral(usize),
    /// The argument is the span of the offending escape sequence.
    #[error("invalid escape sequence")]
    InvalidEscape(Range<usize>),
    /// The argument is the span (as string indices) that represents an invalid number.
    #[error("invalid number")]
    InvalidNumber(Range<usize>),
    #[error("unexpected token `{0}`")]
    UnexpectedToken(Token, Range<usize>),
    #[error("expected `{0}`")]
    ExpectedToken(Token, Range<usize>),
    #[error("left-hand side of assignment is not assignable")]
    InvalidAssignmentTarget(Range<usize>),
    /// The argument is the span of the token where the limit was hit.
    #[error("expression nested too deeply")]
    NestedTooDeeply(Range<usize>),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

impl SyntaxError {
    /// Returns the span of the source string this error is pointing at, if any.
    ///
    /// `len` is the length of the source, used for errors that run to the
    /// end of it.
    pub fn string_range(&self, len: usize) -> Option<Range<usize>> {
        match &self {
            SyntaxError::IllegalCharacter(i) => Some(*i..*i + 1),
            SyntaxError::UnterminatedStringLiteral(i) => Some(*i..len),
            SyntaxError::InvalidEscape(range)
            | SyntaxError::InvalidNumber(range)
            | SyntaxError::UnexpectedToken(_, range)
            | SyntaxError::ExpectedToken(_, range)
            | SyntaxError::InvalidAssignmentTarget(range)
            | SyntaxError::NestedTooDeeply(range) => Some(range.clone()),
            SyntaxError::UnexpectedEndOfInput => Some(len..len + 1),
        }
    }
}
