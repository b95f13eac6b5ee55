use std::fmt::Display;

/// Output produced while evaluating, buffered until the host takes it.
#[derive(Debug, PartialEq)]
pub enum InterpreterOutput {
    /// A line written by `puts()`, without its trailing newline.
    Print(String),
    /// A line written by `warn()`, without its trailing newline.
    Warning(String),
}

impl Display for InterpreterOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpreterOutput::Print(string) => string.fmt(f),
            InterpreterOutput::Warning(message) => write!(f, "WARNING: {}", message),
        }
    }
}
