use core::fmt::Debug;
use std::{borrow::Cow, collections::HashMap, fmt::Display, rc::Rc};

use serde_json::Value;

use crate::{interpreter_error::InterpreterError, value::type_name};

static NULL: Value = Value::Null;

/// How far past the end of an array an assignment may write. The gap is
/// filled with `null`.
const MAX_ARRAY_PADDING: usize = 1 << 16;

#[derive(Debug)]
struct Binding {
    value: Value,
    /// Bumped every time the binding is assigned to, directly or through a
    /// path, so callers can tell whether a binding was touched.
    generation: u64,
}

#[derive(Default)]
pub struct Bindings {
    values: HashMap<Rc<str>, Binding>,
    next_generation: u64,
}

impl Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.values)
    }
}

impl Bindings {
    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|binding| &binding.value)
    }

    pub fn generation(&self, name: &str) -> Option<u64> {
        self.values.get(name).map(|binding| binding.generation)
    }

    pub fn set(&mut self, name: Rc<str>, value: Value) {
        let generation = self.bump_generation();
        self.values.insert(name, Binding { value, generation });
    }

    /// Returns the value of an existing binding for modification, marking
    /// it as assigned to.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let generation = self.bump_generation();
        let binding = self.values.get_mut(name)?;
        binding.generation = generation;
        Some(&mut binding.value)
    }
}

/// One step of a path into a JSON value: `.name` / `["name"]` or `[index]`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathKey {
    Field(Rc<str>),
    Index(i64),
}

impl PathKey {
    pub fn from_value(value: &Value) -> Result<Self, InterpreterError> {
        match value {
            Value::String(string) => Ok(PathKey::Field(string.as_str().into())),
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    return Ok(PathKey::Index(integer));
                }
                match number.as_f64() {
                    Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                        Ok(PathKey::Index(float as i64))
                    }
                    _ => Err(InterpreterError::TypeMismatch(format!(
                        "cannot use {} as an index",
                        number
                    ))),
                }
            }
            other => Err(InterpreterError::TypeMismatch(format!(
                "cannot use {} as an index",
                type_name(other)
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PathKey::Field(_) => "string",
            PathKey::Index(_) => "number",
        }
    }
}

impl Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKey::Field(name) => write!(f, "{}", Value::String(name.to_string())),
            PathKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Converts a possibly negative index into an offset into a sequence of
/// length `len`, counting negative indices from the end.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let offset = if index < 0 { len + index } else { index };
    if (0..len).contains(&offset) {
        usize::try_from(offset).ok()
    } else {
        None
    }
}

fn lookup<'a>(value: &'a Value, key: &PathKey) -> Result<Cow<'a, Value>, InterpreterError> {
    match (value, key) {
        (Value::Object(map), PathKey::Field(name)) => {
            Ok(Cow::Borrowed(map.get(name.as_ref()).unwrap_or(&NULL)))
        }
        (Value::Array(items), PathKey::Index(index)) => Ok(Cow::Borrowed(
            normalize_index(*index, items.len())
                .and_then(|offset| items.get(offset))
                .unwrap_or(&NULL),
        )),
        (Value::String(string), PathKey::Index(index)) => {
            let len = string.chars().count();
            Ok(Cow::Owned(
                normalize_index(*index, len)
                    .and_then(|offset| string.chars().nth(offset))
                    .map_or(Value::Null, |char| Value::String(char.to_string())),
            ))
        }
        _ => Err(InterpreterError::TypeMismatch(format!(
            "cannot index {} with {} {}",
            type_name(value),
            key.kind(),
            key
        ))),
    }
}

/// Reads the value found by following `keys` from `root`. Missing object
/// keys and out-of-range indices yield `null`.
pub fn read_path(root: &Value, keys: &[PathKey]) -> Result<Value, InterpreterError> {
    let mut current = Cow::Borrowed(root);
    for key in keys {
        current = match current {
            Cow::Borrowed(value) => lookup(value, key)?,
            Cow::Owned(value) => Cow::Owned(lookup(&value, key)?.into_owned()),
        };
    }
    Ok(current.into_owned())
}

fn place_mut<'a>(value: &'a mut Value, key: &PathKey) -> Result<&'a mut Value, InterpreterError> {
    match (value, key) {
        (Value::Object(map), PathKey::Field(name)) => {
            Ok(map.entry(name.to_string()).or_insert(Value::Null))
        }
        (Value::Array(items), PathKey::Index(index)) => {
            let len = i64::try_from(items.len()).map_err(|_| InterpreterError::IndexOutOfRange(*index))?;
            let offset = if *index < 0 { len + index } else { *index };
            let offset =
                usize::try_from(offset).map_err(|_| InterpreterError::IndexOutOfRange(*index))?;
            if offset >= items.len() {
                if offset - items.len() > MAX_ARRAY_PADDING {
                    return Err(InterpreterError::IndexOutOfRange(*index));
                }
                items.resize(offset + 1, Value::Null);
            }
            Ok(&mut items[offset])
        }
        (value, key) => Err(InterpreterError::TypeMismatch(format!(
            "cannot assign into {} with {} {}",
            type_name(value),
            key.kind(),
            key
        ))),
    }
}

/// Returns a mutable reference to the value found by following `keys`
/// from `root`, creating missing object keys and padding arrays with
/// `null` as needed.
pub fn place_path_mut<'a>(
    root: &'a mut Value,
    keys: &[PathKey],
) -> Result<&'a mut Value, InterpreterError> {
    let mut current = root;
    for key in keys {
        current = place_mut(current, key)?;
    }
    Ok(current)
}
