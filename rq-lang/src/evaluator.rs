use std::{ops::Range, rc::Rc};

use serde_json::{Map, Value};

use crate::{
    bindings::{place_path_mut, read_path, PathKey},
    builtins::{self, Builtin},
    expression::{
        AssignOp, Expression, ExpressionKind, PathSegment, PathSegmentRef, Place,
    },
    interpreter::Interpreter,
    interpreter_error::{InterpreterError, TracedInterpreterError},
    interpreter_output::InterpreterOutput,
    operators::AddOrSubtractOp,
    value::{display_string, is_truthy},
};

type EvaluationResult = Result<Value, TracedInterpreterError>;

fn at<T>(
    result: Result<T, InterpreterError>,
    range: &Range<usize>,
) -> Result<T, TracedInterpreterError> {
    result.map_err(|err| TracedInterpreterError::with_range(err, range.clone()))
}

pub struct ExpressionEvaluator<'a> {
    interpreter: &'a mut Interpreter,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(interpreter: &'a mut Interpreter) -> Self {
        ExpressionEvaluator { interpreter }
    }

    /// Evaluates each statement in order, returning the value of the last
    /// one (or `null` if there are none).
    pub fn evaluate_sequence(&mut self, statements: &[Expression]) -> EvaluationResult {
        let mut value = Value::Null;
        for statement in statements {
            value = self.evaluate_expression(statement)?;
        }
        Ok(value)
    }

    pub fn evaluate_expression(&mut self, expression: &Expression) -> EvaluationResult {
        let range = &expression.range;
        match &expression.kind {
            ExpressionKind::Literal(value) => Ok(value.clone()),
            ExpressionKind::Variable(name) => self.evaluate_variable(name, range),
            ExpressionKind::Array(items) => items
                .iter()
                .map(|item| self.evaluate_expression(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ExpressionKind::Object(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.evaluate_expression(value)?;
                    map.insert(key.to_string(), value);
                }
                Ok(Value::Object(map))
            }
            ExpressionKind::Field(_, _) | ExpressionKind::Index(_, _) => {
                self.evaluate_path_expression(expression)
            }
            ExpressionKind::Call(name, args) => self.evaluate_function_call(name, args, range),
            ExpressionKind::Unary(op, operand) => {
                let value = self.evaluate_expression(operand)?;
                at(op.evaluate(&value), range)
            }
            ExpressionKind::MultiplyOrDivide(op, left, right) => {
                let (left, right) = self.evaluate_operands(left, right)?;
                at(op.evaluate(&left, &right), range)
            }
            ExpressionKind::AddOrSubtract(op, left, right) => {
                let (left, right) = self.evaluate_operands(left, right)?;
                at(op.evaluate(&left, &right), range)
            }
            ExpressionKind::Comparison(op, left, right) => {
                let (left, right) = self.evaluate_operands(left, right)?;
                at(op.evaluate(&left, &right), range)
            }
            ExpressionKind::Equality(op, left, right) => {
                let (left, right) = self.evaluate_operands(left, right)?;
                Ok(op.evaluate(&left, &right))
            }
            ExpressionKind::LogicalAnd(left, right) => {
                let left = self.evaluate_expression(left)?;
                if is_truthy(&left) {
                    self.evaluate_expression(right)
                } else {
                    Ok(left)
                }
            }
            ExpressionKind::LogicalOr(left, right) => {
                let left = self.evaluate_expression(left)?;
                if is_truthy(&left) {
                    Ok(left)
                } else {
                    self.evaluate_expression(right)
                }
            }
            ExpressionKind::Conditional(condition, then_value, else_value) => {
                if is_truthy(&self.evaluate_expression(condition)?) {
                    self.evaluate_expression(then_value)
                } else {
                    self.evaluate_expression(else_value)
                }
            }
            ExpressionKind::Assign(place, op, value) => {
                self.evaluate_assignment(place, *op, value, range)
            }
            ExpressionKind::Sequence(statements) => self.evaluate_sequence(statements),
            ExpressionKind::Apply(name, body) => self.evaluate_apply(name, body),
        }
    }

    fn evaluate_operands(
        &mut self,
        left: &Expression,
        right: &Expression,
    ) -> Result<(Value, Value), TracedInterpreterError> {
        let left = self.evaluate_expression(left)?;
        let right = self.evaluate_expression(right)?;
        Ok((left, right))
    }

    fn evaluate_variable(&mut self, name: &str, range: &Range<usize>) -> EvaluationResult {
        match self.interpreter.bindings.get(name) {
            Some(value) => Ok(value.clone()),
            None => at(
                Err(InterpreterError::UndefinedVariable(name.to_string())),
                range,
            ),
        }
    }

    fn evaluate_path_keys(
        &mut self,
        segments: &[PathSegmentRef],
    ) -> Result<Vec<PathKey>, TracedInterpreterError> {
        let mut keys = Vec::with_capacity(segments.len());
        for segment in segments {
            let key = match segment {
                PathSegmentRef::Field(name) => PathKey::Field(Rc::clone(name)),
                PathSegmentRef::Index(index) => {
                    let value = self.evaluate_expression(index)?;
                    at(PathKey::from_value(&value), &index.range)?
                }
            };
            keys.push(key);
        }
        Ok(keys)
    }

    fn evaluate_path_expression(&mut self, expression: &Expression) -> EvaluationResult {
        let range = &expression.range;

        // Paths rooted at a variable are read in place, so that e.g.
        // `item.a` doesn't need to copy all of `item` first.
        if let Some((root, segments)) = expression.as_path() {
            let keys = self.evaluate_path_keys(&segments)?;
            let Some(value) = self.interpreter.bindings.get(root) else {
                return at(
                    Err(InterpreterError::UndefinedVariable(root.to_string())),
                    range,
                );
            };
            return at(read_path(value, &keys), range);
        }

        let (base, key) = match &expression.kind {
            ExpressionKind::Field(base, name) => {
                (self.evaluate_expression(base)?, PathKey::Field(Rc::clone(name)))
            }
            ExpressionKind::Index(base, index) => {
                let base = self.evaluate_expression(base)?;
                let index_value = self.evaluate_expression(index)?;
                (base, at(PathKey::from_value(&index_value), &index.range)?)
            }
            _ => return self.evaluate_expression(expression),
        };
        at(read_path(&base, &[key]), range)
    }

    fn evaluate_assignment(
        &mut self,
        place: &Place,
        op: AssignOp,
        value: &Expression,
        range: &Range<usize>,
    ) -> EvaluationResult {
        let value = self.evaluate_expression(value)?;
        let segments = place.path.iter().map(PathSegment::borrowed).collect::<Vec<_>>();
        let keys = self.evaluate_path_keys(&segments)?;

        let value = match op {
            AssignOp::Set => value,
            AssignOp::Add | AssignOp::Subtract => {
                let Some(root_value) = self.interpreter.bindings.get(&place.root) else {
                    return at(
                        Err(InterpreterError::UndefinedVariable(place.root.to_string())),
                        range,
                    );
                };
                let current = at(read_path(root_value, &keys), range)?;
                let op = if op == AssignOp::Add {
                    AddOrSubtractOp::Add
                } else {
                    AddOrSubtractOp::Subtract
                };
                at(op.evaluate(&current, &value), range)?
            }
        };

        if keys.is_empty() {
            self.interpreter
                .bindings
                .set(Rc::clone(&place.root), value.clone());
            return Ok(value);
        }

        let Some(root_value) = self.interpreter.bindings.get_mut(&place.root) else {
            return at(
                Err(InterpreterError::UndefinedVariable(place.root.to_string())),
                range,
            );
        };
        let target = at(place_path_mut(root_value, &keys), range)?;
        *target = value.clone();
        Ok(value)
    }

    /// Evaluates `body`, then rebinds `name` to its value, unless `body`
    /// assigned to `name` (or to something inside it), in which case that
    /// assignment is kept.
    fn evaluate_apply(&mut self, name: &Rc<str>, body: &[Expression]) -> EvaluationResult {
        let bindings = &self.interpreter.bindings;
        if body.is_empty() {
            return Ok(bindings.get(name).cloned().unwrap_or(Value::Null));
        }

        let generation_before = bindings.generation(name);
        let value = self.evaluate_sequence(body)?;

        let bindings = &mut self.interpreter.bindings;
        if bindings.generation(name) != generation_before {
            tracing::trace!(binding = %name, "keeping in-place modification");
            Ok(bindings.get(name).cloned().unwrap_or(Value::Null))
        } else {
            bindings.set(Rc::clone(name), value.clone());
            Ok(value)
        }
    }

    fn evaluate_function_call(
        &mut self,
        function_name: &str,
        args: &[Expression],
        range: &Range<usize>,
    ) -> EvaluationResult {
        let Some(builtin) = Builtin::try_from(function_name) else {
            return at(
                Err(InterpreterError::UndefinedFunction(function_name.to_string())),
                range,
            );
        };
        at(builtin.check_arity(args.len()), range)?;

        let values = args
            .iter()
            .map(|arg| self.evaluate_expression(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut values = values.into_iter();
        // The arity has already been checked, so this never falls back to null.
        let mut next_arg = || values.next().unwrap_or(Value::Null);

        let result = match builtin {
            Builtin::Stdin => self.interpreter.read_input().map(Value::String),
            Builtin::Puts => {
                let line = display_string(&next_arg());
                self.interpreter.push_output(InterpreterOutput::Print(line));
                Ok(Value::Null)
            }
            Builtin::Warn => {
                let line = display_string(&next_arg());
                self.interpreter.push_output(InterpreterOutput::Warning(line));
                Ok(Value::Null)
            }
            Builtin::ParseJson => builtins::parse_json(next_arg()),
            Builtin::ToJson => builtins::to_json(next_arg()),
            Builtin::PrettyJson => builtins::pretty_json(next_arg()),
            Builtin::Len => builtins::len(next_arg()),
            Builtin::Keys => builtins::keys(next_arg()),
            Builtin::Values => builtins::values(next_arg()),
            Builtin::Has => builtins::has(next_arg(), next_arg()),
            Builtin::Remove => builtins::remove(next_arg(), next_arg()),
            Builtin::Push => builtins::push(next_arg(), next_arg()),
            Builtin::Type => builtins::type_of(next_arg()),
            Builtin::Str => builtins::stringify(next_arg()),
            Builtin::Num => builtins::num(next_arg()),
            Builtin::Upcase => builtins::upcase(next_arg()),
            Builtin::Downcase => builtins::downcase(next_arg()),
        };
        at(result, range)
    }
}
