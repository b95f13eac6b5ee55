use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::interpreter_error::InterpreterError;

/// Only `null` and `false` are falsy; everything else, including `0` and
/// `""`, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Numeric {
    pub fn from_number(number: &Number) -> Result<Self, InterpreterError> {
        if let Some(integer) = number.as_i64() {
            Ok(Numeric::Integer(integer))
        } else {
            number
                .as_f64()
                .map(Numeric::Float)
                .ok_or(InterpreterError::NumberOutOfRange)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Integer(integer) => integer as f64,
            Numeric::Float(float) => float,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Numeric::Integer(integer) => integer == 0,
            Numeric::Float(float) => float == 0.0,
        }
    }

    pub fn compare(self, other: Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Integer(l), Numeric::Integer(r)) => Some(l.cmp(&r)),
            (l, r) => l.as_f64().partial_cmp(&r.as_f64()),
        }
    }
}

impl TryFrom<Numeric> for Value {
    type Error = InterpreterError;

    fn try_from(value: Numeric) -> Result<Self, Self::Error> {
        match value {
            Numeric::Integer(integer) => Ok(integer.into()),
            Numeric::Float(float) => Number::from_f64(float)
                .map(Value::Number)
                .ok_or(InterpreterError::NumberOutOfRange),
        }
    }
}

/// Structural equality, except that numbers are compared by value, so
/// that `1 == 1.0`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            match (Numeric::from_number(l), Numeric::from_number(r)) {
                (Ok(l), Ok(r)) => l.compare(r) == Some(Ordering::Equal),
                _ => l == r,
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, l)| r.get(key).is_some_and(|r| values_equal(l, r)))
        }
        _ => left == right,
    }
}

/// Converts a value to the string that `puts` and `str()` show for it:
/// strings as-is, everything else as compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}
