use std::io::{self, Write};

use colored::Colorize;
use thiserror::Error;

use crate::{
    evaluator::Evaluator,
    expression_wrapper::{wrap, PRINT_STATEMENT, READ_STATEMENT},
    stdio_printer::StdioPrinter,
};

/// Why a run stopped early. The messages double as the headline of the
/// diagnostic shown to the user.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("read from stdin failed:")]
    Read,
    #[error("expression {0} failed to run:")]
    Expression(String),
    #[error("printing item failed")]
    Print,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage<'a> {
    Read,
    Expression(&'a str),
    Print,
}

impl<'a> Stage<'a> {
    fn failure(self) -> PipelineError {
        match self {
            Stage::Read => PipelineError::Read,
            Stage::Expression(expression) => PipelineError::Expression(expression.to_string()),
            Stage::Print => PipelineError::Print,
        }
    }
}

/// Reads a document, runs each expression against it in turn, and prints
/// the result, stopping at the first failure.
pub struct Pipeline<V: Evaluator, O: Write, E: Write> {
    evaluator: V,
    printer: StdioPrinter<O, E>,
}

impl<V: Evaluator, O: Write, E: Write> Pipeline<V, O, E> {
    pub fn new(evaluator: V, printer: StdioPrinter<O, E>) -> Self {
        Pipeline { evaluator, printer }
    }

    /// Runs the whole pipeline. Failures have already been reported on
    /// stderr by the time this returns.
    pub fn run<T: AsRef<str>>(&mut self, expressions: &[T]) -> Result<(), PipelineError> {
        self.printer.println("reading from stdin")?;
        self.evaluate(READ_STATEMENT, Stage::Read)?;

        self.printer
            .println(format_args!("running {} expressions", expressions.len()))?;
        for expression in expressions {
            let expression = expression.as_ref();
            let wrapped = wrap(expression);
            self.printer.println(format_args!("----> {wrapped}"))?;
            self.evaluate(&wrapped, Stage::Expression(expression))?;
        }

        self.printer.println("printing item")?;
        self.evaluate(PRINT_STATEMENT, Stage::Print)?;
        Ok(())
    }

    fn evaluate(&mut self, statement: &str, stage: Stage) -> Result<(), PipelineError> {
        tracing::debug!(statement, ?stage, "evaluating");
        let result = self.evaluator.eval(statement);
        let (stdout, stderr) = self.printer.streams();
        let drained = self.evaluator.drain_output(stdout, stderr);

        match (result, drained) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(err), _) => {
                tracing::debug!(?stage, "evaluation failed");
                let failure = stage.failure();
                self.printer
                    .eprintln(format!("rq: {failure}").red())?;
                self.evaluator
                    .report_error(statement, &err, self.printer.stderr())?;
                self.printer.flush()?;
                Err(failure)
            }
            (Ok(()), Err(err)) if stage == Stage::Print => {
                self.printer
                    .eprintln(format!("rq: {}", PipelineError::Print).red())?;
                self.printer.eprintln(err.to_string().red())?;
                Err(PipelineError::Print)
            }
            (Ok(()), Err(err)) => Err(err.into()),
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (V, StdioPrinter<O, E>) {
        (self.evaluator, self.printer)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Write};

    use pretty_assertions::assert_eq;
    use rq_lang::Interpreter;
    use serde_json::json;

    use crate::stdio_printer::StdioPrinter;

    use super::{Pipeline, PipelineError};

    struct Outcome {
        result: Result<(), PipelineError>,
        interpreter: Interpreter,
        stdout: String,
        stderr: String,
    }

    fn run(input: &str, expressions: &[&str]) -> Outcome {
        colored::control::set_override(false);
        let interpreter = Interpreter::with_input(Cursor::new(input.to_string()));
        let printer = StdioPrinter::with_streams(vec![], vec![]);
        let mut pipeline = Pipeline::new(interpreter, printer);
        let result = pipeline.run(expressions);
        let (interpreter, printer) = pipeline.into_parts();
        let (stdout, stderr) = printer.into_streams();
        Outcome {
            result,
            interpreter,
            stdout: String::from_utf8(stdout).unwrap(),
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }

    #[test]
    fn no_expressions_reprints_document() {
        let outcome = run("{\"a\":1}", &[]);
        assert!(outcome.result.is_ok());
        assert_eq!(
            outcome.stdout,
            "reading from stdin\nrunning 0 expressions\nprinting item\n{\n  \"a\": 1\n}\n"
        );
        assert_eq!(outcome.stderr, "");
    }

    #[test]
    fn expressions_are_echoed_and_applied_in_order() {
        let outcome = run("{\"a\":1}", &["item.b = item.a + 1", "item.b"]);
        assert!(outcome.result.is_ok());
        assert_eq!(
            outcome.stdout,
            "reading from stdin\n\
             running 2 expressions\n\
             ----> apply item { item.b = item.a + 1 }\n\
             ----> apply item { item.b }\n\
             printing item\n\
             2\n"
        );
        assert_eq!(outcome.interpreter.get("item"), Some(&json!(2)));
    }

    #[test]
    fn key_order_is_preserved() {
        let outcome = run("{\"z\": 1, \"a\": 2}", &["item.m = 3"]);
        assert!(outcome
            .stdout
            .ends_with("{\n  \"z\": 1,\n  \"a\": 2,\n  \"m\": 3\n}\n"));
    }

    #[test]
    fn invalid_input_fails_to_read() {
        let outcome = run("{", &["item.a"]);
        assert!(matches!(outcome.result, Err(PipelineError::Read)));
        assert_eq!(outcome.stdout, "reading from stdin\n");
        assert!(
            outcome.stderr.starts_with("rq: read from stdin failed:\ninvalid JSON"),
            "{}",
            outcome.stderr
        );
    }

    #[test]
    fn failing_expression_stops_the_run() {
        let outcome = run("{\"a\":1}", &["item.a +", "item.b = 2"]);
        match outcome.result {
            Err(PipelineError::Expression(expression)) => assert_eq!(expression, "item.a +"),
            other => panic!("expected expression failure but got {other:?}"),
        }
        assert!(outcome.stderr.starts_with("rq: expression item.a + failed to run:\n"));
        assert!(!outcome.stdout.contains("printing item"));
        assert!(!outcome.stdout.contains("item.b = 2"));
        assert_eq!(outcome.interpreter.get("item"), Some(&json!({"a": 1})));
    }

    #[test]
    fn deeply_nested_expression_fails_to_run() {
        let expression = format!("{}item{}", "[".repeat(10_000), "]".repeat(10_000));
        let outcome = run("1", &[expression.as_str()]);
        assert!(matches!(outcome.result, Err(PipelineError::Expression(_))));
        assert!(outcome.stderr.contains("expression nested too deeply"), "{}", outcome.stderr);
        assert_eq!(outcome.interpreter.get("item"), Some(&json!(1)));
    }

    #[test]
    fn output_is_flushed_before_failure_is_reported() {
        let outcome = run("1", &["puts(\"before\"); nope"]);
        assert!(outcome.result.is_err());
        assert!(outcome.stdout.ends_with("before\n"));
        assert!(outcome.stderr.contains("undefined variable 'nope'"));
    }

    #[test]
    fn unprintable_document_fails_to_print() {
        struct BrokenAfterProgress(usize);

        impl Write for BrokenAfterProgress {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if buf.starts_with(b"{") {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
                }
                self.0 += buf.len();
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        colored::control::set_override(false);
        let interpreter = Interpreter::with_input(Cursor::new("{}".to_string()));
        let printer = StdioPrinter::with_streams(BrokenAfterProgress(0), vec![]);
        let mut pipeline = Pipeline::new(interpreter, printer);
        assert!(matches!(pipeline.run::<&str>(&[]), Err(PipelineError::Print)));
        let (_, printer) = pipeline.into_parts();
        let (_, stderr) = printer.into_streams();
        let stderr = String::from_utf8(stderr).unwrap();
        assert!(stderr.starts_with("rq: printing item failed\n"), "{stderr}");
        assert!(stderr.contains("pipe closed"), "{stderr}");
    }
}
