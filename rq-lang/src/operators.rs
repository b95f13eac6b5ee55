use std::cmp::Ordering;

use serde_json::Value;

use crate::{
    interpreter_error::InterpreterError,
    tokenizer::Token,
    value::{is_truthy, type_name, values_equal, Numeric},
};

type OperatorResult = Result<Value, InterpreterError>;

fn type_mismatch(verb: &str, left_side: &Value, right_side: &Value) -> InterpreterError {
    InterpreterError::TypeMismatch(format!(
        "cannot {} {} and {}",
        verb,
        type_name(left_side),
        type_name(right_side)
    ))
}

fn numeric_operands(
    verb: &str,
    left_side: &Value,
    right_side: &Value,
) -> Result<(Numeric, Numeric), InterpreterError> {
    match (left_side, right_side) {
        (Value::Number(l), Value::Number(r)) => {
            Ok((Numeric::from_number(l)?, Numeric::from_number(r)?))
        }
        _ => Err(type_mismatch(verb, left_side, right_side)),
    }
}

/// Applies an operation to two numbers, staying integral when both
/// operands are and `integer_op` doesn't overflow.
fn evaluate_numeric<I, F>(l: Numeric, r: Numeric, integer_op: I, float_op: F) -> OperatorResult
where
    I: Fn(i64, i64) -> Option<i64>,
    F: Fn(f64, f64) -> f64,
{
    let result = match (l, r) {
        (Numeric::Integer(l), Numeric::Integer(r)) => match integer_op(l, r) {
            Some(integer) => Numeric::Integer(integer),
            None => Numeric::Float(float_op(l as f64, r as f64)),
        },
        (l, r) => Numeric::Float(float_op(l.as_f64(), r.as_f64())),
    };
    result.try_into()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOrSubtractOp {
    Add,
    Subtract,
}

impl AddOrSubtractOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Plus => Some(AddOrSubtractOp::Add),
            Token::Minus => Some(AddOrSubtractOp::Subtract),
            _ => None,
        }
    }

    pub fn evaluate(&self, left_side: &Value, right_side: &Value) -> OperatorResult {
        match (self, left_side, right_side) {
            (AddOrSubtractOp::Add, Value::String(l), Value::String(r)) => {
                Ok(Value::String(format!("{l}{r}")))
            }
            (AddOrSubtractOp::Add, Value::Array(l), Value::Array(r)) => {
                Ok(Value::Array(l.iter().chain(r).cloned().collect()))
            }
            (AddOrSubtractOp::Add, Value::Object(l), Value::Object(r)) => {
                let mut merged = l.clone();
                for (key, value) in r {
                    merged.insert(key.clone(), value.clone());
                }
                Ok(Value::Object(merged))
            }
            (AddOrSubtractOp::Add, _, _) => {
                let (l, r) = numeric_operands("add", left_side, right_side)?;
                evaluate_numeric(l, r, i64::checked_add, |l, r| l + r)
            }
            (AddOrSubtractOp::Subtract, _, _) => {
                let (l, r) = numeric_operands("subtract", left_side, right_side)?;
                evaluate_numeric(l, r, i64::checked_sub, |l, r| l - r)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MultiplyOrDivideOp {
    Multiply,
    Divide,
    Modulo,
}

impl MultiplyOrDivideOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Multiply => Some(MultiplyOrDivideOp::Multiply),
            Token::Divide => Some(MultiplyOrDivideOp::Divide),
            Token::Percent => Some(MultiplyOrDivideOp::Modulo),
            _ => None,
        }
    }

    pub fn evaluate(&self, left_side: &Value, right_side: &Value) -> OperatorResult {
        match self {
            MultiplyOrDivideOp::Multiply => {
                let (l, r) = numeric_operands("multiply", left_side, right_side)?;
                evaluate_numeric(l, r, i64::checked_mul, |l, r| l * r)
            }
            MultiplyOrDivideOp::Divide => {
                let (l, r) = numeric_operands("divide", left_side, right_side)?;
                if r.is_zero() {
                    return Err(InterpreterError::DivisionByZero);
                }
                // Integer division only stays integral when it's exact.
                evaluate_numeric(
                    l,
                    r,
                    |l, r| match l.checked_rem(r) {
                        Some(0) => l.checked_div(r),
                        _ => None,
                    },
                    |l, r| l / r,
                )
            }
            MultiplyOrDivideOp::Modulo => {
                let (l, r) = numeric_operands("take the modulo of", left_side, right_side)?;
                if r.is_zero() {
                    return Err(InterpreterError::DivisionByZero);
                }
                // The result takes the sign of the divisor, i.e. this is a
                // floored modulo rather than Rust's truncated remainder.
                evaluate_numeric(
                    l,
                    r,
                    |l, r| {
                        let remainder = l.checked_rem(r).unwrap_or(0);
                        if remainder != 0 && (remainder < 0) != (r < 0) {
                            Some(remainder + r)
                        } else {
                            Some(remainder)
                        }
                    },
                    |l, r| l - r * (l / r).floor(),
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparisonOp {
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
}

impl ComparisonOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::LessThan => Some(ComparisonOp::LessThan),
            Token::LessThanOrEqualTo => Some(ComparisonOp::LessThanOrEqualTo),
            Token::GreaterThan => Some(ComparisonOp::GreaterThan),
            Token::GreaterThanOrEqualTo => Some(ComparisonOp::GreaterThanOrEqualTo),
            _ => None,
        }
    }

    pub fn evaluate(&self, left_side: &Value, right_side: &Value) -> OperatorResult {
        let ordering = match (left_side, right_side) {
            (Value::Number(_), Value::Number(_)) => {
                let (l, r) = numeric_operands("compare", left_side, right_side)?;
                l.compare(r)
            }
            (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
            _ => return Err(type_mismatch("compare", left_side, right_side)),
        };
        let Some(ordering) = ordering else {
            return Ok(Value::Bool(false));
        };
        let result = match self {
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqualTo => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqualTo => ordering != Ordering::Less,
        };
        Ok(Value::Bool(result))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EqualityOp {
    Equal,
    NotEqual,
}

impl EqualityOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::EqualsEquals => Some(EqualityOp::Equal),
            Token::NotEquals => Some(EqualityOp::NotEqual),
            _ => None,
        }
    }

    pub fn evaluate(&self, left_side: &Value, right_side: &Value) -> Value {
        let equal = values_equal(left_side, right_side);
        match self {
            EqualityOp::Equal => Value::Bool(equal),
            EqualityOp::NotEqual => Value::Bool(!equal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Negative,
    Not,
}

impl UnaryOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Minus => Some(UnaryOp::Negative),
            Token::Bang => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn evaluate(&self, value: &Value) -> OperatorResult {
        match self {
            UnaryOp::Negative => {
                let Value::Number(number) = value else {
                    return Err(InterpreterError::TypeMismatch(format!(
                        "cannot negate {}",
                        type_name(value)
                    )));
                };
                match Numeric::from_number(number)? {
                    Numeric::Integer(integer) => match integer.checked_neg() {
                        Some(negated) => Ok(negated.into()),
                        None => Numeric::Float(-(integer as f64)).try_into(),
                    },
                    Numeric::Float(float) => Numeric::Float(-float).try_into(),
                }
            }
            UnaryOp::Not => Ok(Value::Bool(!is_truthy(value))),
        }
    }
}
