mod bindings;
mod builtins;
mod evaluator;
mod expression;
mod interpreter;
mod interpreter_error;
mod interpreter_output;
mod operators;
mod parser;
mod syntax_error;
mod tokenizer;
mod value;

pub use interpreter::Interpreter;
pub use interpreter_error::{InterpreterError, TracedInterpreterError};
pub use interpreter_output::InterpreterOutput;
pub use syntax_error::SyntaxError;
pub use tokenizer::Token;
