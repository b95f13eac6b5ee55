use serde_json::{Map, Value};

use crate::{
    bindings::PathKey,
    interpreter_error::InterpreterError,
    value::{display_string, type_name},
};

type ValueResult = Result<Value, InterpreterError>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Builtin {
    Stdin,
    ParseJson,
    ToJson,
    PrettyJson,
    Puts,
    Warn,
    Len,
    Keys,
    Values,
    Has,
    Remove,
    Push,
    Type,
    Str,
    Num,
    Upcase,
    Downcase,
}

impl Builtin {
    pub fn try_from(name: &str) -> Option<Self> {
        match name {
            "stdin" => Some(Builtin::Stdin),
            "parse_json" => Some(Builtin::ParseJson),
            "to_json" => Some(Builtin::ToJson),
            "pretty_json" => Some(Builtin::PrettyJson),
            "puts" => Some(Builtin::Puts),
            "warn" => Some(Builtin::Warn),
            "len" => Some(Builtin::Len),
            "keys" => Some(Builtin::Keys),
            "values" => Some(Builtin::Values),
            "has" => Some(Builtin::Has),
            "remove" => Some(Builtin::Remove),
            "push" => Some(Builtin::Push),
            "type" => Some(Builtin::Type),
            "str" => Some(Builtin::Str),
            "num" => Some(Builtin::Num),
            "upcase" => Some(Builtin::Upcase),
            "downcase" => Some(Builtin::Downcase),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Stdin => "stdin",
            Builtin::ParseJson => "parse_json",
            Builtin::ToJson => "to_json",
            Builtin::PrettyJson => "pretty_json",
            Builtin::Puts => "puts",
            Builtin::Warn => "warn",
            Builtin::Len => "len",
            Builtin::Keys => "keys",
            Builtin::Values => "values",
            Builtin::Has => "has",
            Builtin::Remove => "remove",
            Builtin::Push => "push",
            Builtin::Type => "type",
            Builtin::Str => "str",
            Builtin::Num => "num",
            Builtin::Upcase => "upcase",
            Builtin::Downcase => "downcase",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Builtin::Stdin => 0,
            Builtin::Has | Builtin::Remove | Builtin::Push => 2,
            _ => 1,
        }
    }

    pub fn check_arity(&self, actual: usize) -> Result<(), InterpreterError> {
        if actual == self.arity() {
            Ok(())
        } else {
            Err(InterpreterError::WrongNumberOfArguments {
                function: self.name().to_string(),
                expected: self.arity(),
                actual,
            })
        }
    }
}

fn expected(function: &str, what: &str, value: &Value) -> InterpreterError {
    InterpreterError::TypeMismatch(format!(
        "{}() expected {} but got {}",
        function,
        what,
        type_name(value)
    ))
}

pub fn parse_json(value: Value) -> ValueResult {
    let Value::String(string) = value else {
        return Err(expected("parse_json", "a string", &value));
    };
    serde_json::from_str(&string).map_err(|err| InterpreterError::InvalidJson(err.to_string()))
}

pub fn to_json(value: Value) -> ValueResult {
    serde_json::to_string(&value)
        .map(Value::String)
        .map_err(|err| InterpreterError::InvalidJson(err.to_string()))
}

/// Serializes with a fixed two-space indent.
pub fn pretty_json(value: Value) -> ValueResult {
    serde_json::to_string_pretty(&value)
        .map(Value::String)
        .map_err(|err| InterpreterError::InvalidJson(err.to_string()))
}

pub fn len(value: Value) -> ValueResult {
    let len = match &value {
        Value::String(string) => string.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => return Err(expected("len", "a string, array or object", &value)),
    };
    Ok(len.into())
}

pub fn keys(value: Value) -> ValueResult {
    let Value::Object(map) = value else {
        return Err(expected("keys", "an object", &value));
    };
    Ok(Value::Array(map.into_iter().map(|(key, _)| key.into()).collect()))
}

pub fn values(value: Value) -> ValueResult {
    let Value::Object(map) = value else {
        return Err(expected("values", "an object", &value));
    };
    Ok(Value::Array(map.into_iter().map(|(_, value)| value).collect()))
}

pub fn has(container: Value, key: Value) -> ValueResult {
    let key = PathKey::from_value(&key)?;
    let found = match (&container, &key) {
        (Value::Object(map), PathKey::Field(name)) => map.contains_key(name.as_ref()),
        (Value::Array(items), PathKey::Index(index)) => {
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let offset = if *index < 0 { len + index } else { *index };
            (0..len).contains(&offset)
        }
        _ => return Err(expected("has", "an object or array", &container)),
    };
    Ok(found.into())
}

/// Returns `container` without the entry at `key`. Removing a missing
/// entry is not an error.
pub fn remove(container: Value, key: Value) -> ValueResult {
    let key = PathKey::from_value(&key)?;
    match (container, key) {
        (Value::Object(map), PathKey::Field(name)) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter(|(key, _)| key.as_str() != name.as_ref())
                .collect();
            Ok(Value::Object(map))
        }
        (Value::Array(mut items), PathKey::Index(index)) => {
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let offset = if index < 0 { len + index } else { index };
            if let Ok(offset) = usize::try_from(offset) {
                if offset < items.len() {
                    items.remove(offset);
                }
            }
            Ok(Value::Array(items))
        }
        (container, _) => Err(expected("remove", "an object or array", &container)),
    }
}

pub fn push(array: Value, value: Value) -> ValueResult {
    let Value::Array(mut items) = array else {
        return Err(expected("push", "an array", &array));
    };
    items.push(value);
    Ok(Value::Array(items))
}

pub fn type_of(value: Value) -> ValueResult {
    Ok(type_name(&value).into())
}

pub fn stringify(value: Value) -> ValueResult {
    Ok(display_string(&value).into())
}

pub fn num(value: Value) -> ValueResult {
    match value {
        Value::Number(_) => Ok(value),
        Value::String(ref string) => {
            let trimmed = string.trim();
            if let Ok(integer) = trimmed.parse::<i64>() {
                return Ok(integer.into());
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| {
                    InterpreterError::TypeMismatch(format!("cannot convert {} to a number", value))
                })
        }
        _ => Err(expected("num", "a number or string", &value)),
    }
}

pub fn upcase(value: Value) -> ValueResult {
    let Value::String(string) = value else {
        return Err(expected("upcase", "a string", &value));
    };
    Ok(string.to_uppercase().into())
}

pub fn downcase(value: Value) -> ValueResult {
    let Value::String(string) = value else {
        return Err(expected("downcase", "a string", &value));
    };
    Ok(string.to_lowercase().into())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::interpreter_error::InterpreterError;

    use super::{keys, num, pretty_json, remove, Builtin};

    #[test]
    fn names_roundtrip() {
        for name in ["stdin", "parse_json", "pretty_json", "len", "remove", "downcase"] {
            assert_eq!(Builtin::try_from(name).map(|builtin| builtin.name()), Some(name));
        }
        assert_eq!(Builtin::try_from("nope"), None);
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!(
            Builtin::Len.check_arity(2),
            Err(InterpreterError::WrongNumberOfArguments {
                function: "len".to_string(),
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(Builtin::Stdin.check_arity(0), Ok(()));
    }

    #[test]
    fn pretty_json_uses_two_space_indent() {
        assert_eq!(
            pretty_json(json!({"a": [1, {"b": null}]})),
            Ok(json!("{\n  \"a\": [\n    1,\n    {\n      \"b\": null\n    }\n  ]\n}"))
        );
    }

    #[test]
    fn keys_preserve_order() {
        assert_eq!(keys(json!({"z": 1, "a": 2, "m": 3})), Ok(json!(["z", "a", "m"])));
    }

    #[test]
    fn remove_preserves_order_of_remaining_keys() {
        let removed = remove(json!({"z": 1, "a": 2, "m": 3}), json!("z")).unwrap();
        assert_eq!(keys(removed), Ok(json!(["a", "m"])));
        assert_eq!(remove(json!([1, 2, 3]), json!(-1)), Ok(json!([1, 2])));
        assert_eq!(remove(json!([1]), json!(5)), Ok(json!([1])));
    }

    #[test]
    fn num_parses_strings() {
        assert_eq!(num(json!(" 42 ")), Ok(json!(42)));
        assert_eq!(num(json!("1.5")), Ok(json!(1.5)));
        assert!(num(json!("abc")).is_err());
        assert!(num(json!(null)).is_err());
    }
}
