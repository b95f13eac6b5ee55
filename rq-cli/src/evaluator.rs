use std::io::{self, Write};

use colored::Colorize;
use rq_lang::{Interpreter, InterpreterOutput, TracedInterpreterError};

/// Something that can evaluate statements against bindings that persist
/// from one statement to the next.
pub trait Evaluator {
    type Error: std::error::Error;

    const NAME: &'static str;
    const VERSION: &'static str;

    fn eval(&mut self, statement: &str) -> Result<(), Self::Error>;

    /// Writes a human-readable diagnostic for `error`, which was returned
    /// while evaluating `statement`.
    fn report_error(
        &self,
        statement: &str,
        error: &Self::Error,
        stderr: &mut dyn Write,
    ) -> io::Result<()>;

    /// Writes any output produced by evaluated statements so far.
    fn drain_output(&mut self, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<()>;
}

impl Evaluator for Interpreter {
    type Error = TracedInterpreterError;

    const NAME: &'static str = Interpreter::NAME;
    const VERSION: &'static str = Interpreter::VERSION;

    fn eval(&mut self, statement: &str) -> Result<(), Self::Error> {
        self.evaluate(statement).map(|_| ())
    }

    fn report_error(
        &self,
        statement: &str,
        error: &Self::Error,
        stderr: &mut dyn Write,
    ) -> io::Result<()> {
        writeln!(stderr, "{}", error.to_string().red())?;
        for line in error.get_line_with_pointer_caret(statement) {
            writeln!(stderr, "{}", format!("| {line}").dimmed())?;
        }
        Ok(())
    }

    fn drain_output(&mut self, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<()> {
        for output in self.take_output() {
            match output {
                InterpreterOutput::Print(line) => writeln!(stdout, "{line}")?,
                InterpreterOutput::Warning(_) => {
                    writeln!(stderr, "{}", output.to_string().yellow())?
                }
            }
        }
        stdout.flush()
    }
}
