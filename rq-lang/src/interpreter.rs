use std::io::Read;

use serde_json::Value;

use crate::{
    bindings::Bindings,
    evaluator::ExpressionEvaluator,
    interpreter_error::{InterpreterError, TracedInterpreterError},
    interpreter_output::InterpreterOutput,
    parser::parse_program,
};

/// Evaluates rq statements one at a time against a shared set of bindings.
///
/// Bindings persist between calls to [`Interpreter::evaluate`], which is
/// how a document read by one statement becomes visible to the next.
pub struct Interpreter {
    pub(crate) bindings: Bindings,
    output: Vec<InterpreterOutput>,
    input: Box<dyn Read>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::with_input(std::io::stdin())
    }
}

impl core::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("bindings", &self.bindings)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    pub const NAME: &'static str = "rq-lang";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Creates an interpreter whose `stdin()` builtin reads from `input`.
    pub fn with_input<R: Read + 'static>(input: R) -> Self {
        Interpreter {
            bindings: Bindings::default(),
            output: vec![],
            input: Box::new(input),
        }
    }

    /// Parses and evaluates `source`, returning the value of its last
    /// statement. Output written by `puts()` and `warn()` is buffered until
    /// [`Interpreter::take_output`] is called, even if evaluation fails.
    pub fn evaluate<T: AsRef<str>>(&mut self, source: T) -> Result<Value, TracedInterpreterError> {
        let source = source.as_ref();
        let statements = parse_program(source)?;
        tracing::debug!(source, statements = statements.len(), "evaluating");
        ExpressionEvaluator::new(self).evaluate_sequence(&statements)
    }

    pub fn take_output(&mut self) -> Vec<InterpreterOutput> {
        std::mem::take(&mut self.output)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub(crate) fn push_output(&mut self, output: InterpreterOutput) {
        self.output.push(output);
    }

    /// Reads everything remaining on the input stream.
    pub(crate) fn read_input(&mut self) -> Result<String, InterpreterError> {
        let mut buffer = String::new();
        self.input
            .read_to_string(&mut buffer)
            .map_err(|err| InterpreterError::Io(err.to_string()))?;
        tracing::debug!(bytes = buffer.len(), "read input");
        Ok(buffer)
    }
}
