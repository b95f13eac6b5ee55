use std::{
    backtrace::{Backtrace, BacktraceStatus},
    fmt::Display,
    ops::Range,
};

use thiserror::Error;

use crate::syntax_error::SyntaxError;

#[derive(Debug)]
pub struct TracedInterpreterError {
    pub error: InterpreterError,
    /// Span of the statement source that caused the error, if known.
    pub range: Option<Range<usize>>,
    backtrace: Backtrace,
}

impl TracedInterpreterError {
    pub fn with_range(error: InterpreterError, range: Range<usize>) -> Self {
        TracedInterpreterError {
            error,
            range: Some(range),
            backtrace: Backtrace::capture(),
        }
    }

    /// Returns the span of `source` that this error is pointing at, if any.
    pub fn string_range(&self, source: &str) -> Option<Range<usize>> {
        if let InterpreterError::Syntax(err) = &self.error {
            return err.string_range(source.len());
        }
        self.range.clone()
    }

    /// Attempts to find the line of `source` that this error is pointing at,
    /// and, if found, returns it along with a second line containing one or
    /// more carets that, when printed below the line in a monospaced font,
    /// "points" at the part of the line that caused the error.
    ///
    /// Note that `source` should be the statement that was being evaluated
    /// when the error occurred.
    pub fn get_line_with_pointer_caret(&self, source: &str) -> Vec<String> {
        let Some(range) = self.string_range(source) else {
            return vec![];
        };
        let len = source.len();
        let mut start = range.start.min(len);
        while !source.is_char_boundary(start) {
            start -= 1;
        }
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[start..].find('\n').map_or(len, |i| start + i);
        let mut end = range.end.clamp(start, line_end);
        while !source.is_char_boundary(end) {
            end += 1;
        }
        let column = source[line_start..start].chars().count();
        let width = source[start..end].chars().count().max(1);
        vec![
            source[line_start..line_end].to_owned(),
            format!("{}{}", " ".repeat(column), "^".repeat(width)),
        ]
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum InterpreterError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("undefined function '{0}'")]
    UndefinedFunction(String),
    #[error("{function}() takes {expected} argument(s) but {actual} were given")]
    WrongNumberOfArguments {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("division by zero")]
    DivisionByZero,
    /// The result of an arithmetic operation can't be represented as a
    /// JSON number (e.g. it's infinite).
    #[error("number out of range")]
    NumberOutOfRange,
    #[error("index {0} out of range")]
    IndexOutOfRange(i64),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<SyntaxError> for TracedInterpreterError {
    fn from(value: SyntaxError) -> Self {
        InterpreterError::from(value).into()
    }
}

impl From<InterpreterError> for TracedInterpreterError {
    fn from(value: InterpreterError) -> Self {
        TracedInterpreterError {
            error: value,
            range: None,
            backtrace: Backtrace::capture(),
        }
    }
}

impl From<std::io::Error> for TracedInterpreterError {
    fn from(value: std::io::Error) -> Self {
        InterpreterError::Io(value.to_string()).into()
    }
}

impl std::error::Error for TracedInterpreterError {}

impl Display for TracedInterpreterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if self.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nBacktrace:\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax_error::SyntaxError;

    use super::{InterpreterError, TracedInterpreterError};

    #[test]
    fn caret_points_at_range() {
        let err = TracedInterpreterError::with_range(InterpreterError::DivisionByZero, 4..9);
        assert_eq!(
            err.get_line_with_pointer_caret("1 + (1/0)"),
            vec!["1 + (1/0)".to_string(), "    ^^^^^".to_string()]
        );
    }

    #[test]
    fn caret_points_at_correct_line() {
        let err = TracedInterpreterError::with_range(InterpreterError::DivisionByZero, 6..9);
        assert_eq!(
            err.get_line_with_pointer_caret("a = 1\nb = c\nd"),
            vec!["b = c".to_string(), "^^^".to_string()]
        );
    }

    #[test]
    fn caret_counts_characters_not_bytes() {
        let err: TracedInterpreterError = SyntaxError::IllegalCharacter(7).into();
        assert_eq!(
            err.get_line_with_pointer_caret("\"😊\" @"),
            vec!["\"😊\" @".to_string(), "    ^".to_string()]
        );
    }

    #[test]
    fn caret_for_end_of_input_points_past_the_end() {
        let err: TracedInterpreterError = SyntaxError::UnexpectedEndOfInput.into();
        assert_eq!(
            err.get_line_with_pointer_caret("(1"),
            vec!["(1".to_string(), "  ^".to_string()]
        );
    }

    #[test]
    fn errors_without_range_have_no_caret() {
        let err: TracedInterpreterError = InterpreterError::DivisionByZero.into();
        assert!(err.get_line_with_pointer_caret("1/0").is_empty());
    }
}
