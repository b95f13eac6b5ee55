use std::io::Cursor;

use pretty_assertions::assert_eq;
use rq_lang::{Interpreter, InterpreterError, InterpreterOutput, SyntaxError, Token};
use serde_json::{json, Value};

fn create_interpreter() -> Interpreter {
    Interpreter::with_input("".as_bytes())
}

fn create_interpreter_with_item(item: Value) -> Interpreter {
    let mut interpreter = Interpreter::with_input(Cursor::new(item.to_string()));
    interpreter
        .evaluate("item = parse_json(stdin())")
        .unwrap_or_else(|err| panic!("reading {item} failed: {err}"));
    interpreter
}

fn assert_eval_value(source: &'static str, expected: Value) {
    let mut interpreter = create_interpreter();
    match interpreter.evaluate(source) {
        Ok(value) => assert_eq!(value, expected, "evaluating '{source}'"),
        Err(err) => panic!("expected '{source}' to evaluate without error but got {err}"),
    }
}

fn assert_eval_error(source: &'static str, expected: InterpreterError) {
    let mut interpreter = create_interpreter();
    match interpreter.evaluate(source) {
        Ok(value) => panic!("expected '{source}' to fail with {expected:?} but got {value}"),
        Err(err) => assert_eq!(err.error, expected, "evaluating '{source}'"),
    }
}

fn assert_eval_output(source: &'static str, expected: &'static str) {
    let mut interpreter = create_interpreter();
    if let Err(err) = interpreter.evaluate(source) {
        panic!("expected '{source}' to evaluate without error but got {err}");
    }
    let output = interpreter
        .take_output()
        .iter()
        .map(|output| format!("{output}\n"))
        .collect::<String>();
    assert_eq!(output, expected, "evaluating '{source}'");
}

fn assert_applied(item: Value, expression: &'static str, expected: Value) {
    let mut interpreter = create_interpreter_with_item(item);
    let source = format!("apply item {{ {expression} }}");
    if let Err(err) = interpreter.evaluate(&source) {
        panic!("expected '{source}' to evaluate without error but got {err}");
    }
    assert_eq!(interpreter.get("item"), Some(&expected), "evaluating '{source}'");
}

#[test]
fn empty_statements_evaluate_to_null() {
    assert_eval_value("", json!(null));
    assert_eval_value(";;", json!(null));
}

#[test]
fn arithmetic_works() {
    assert_eval_value("1 + 2 * 3", json!(7));
    assert_eval_value("(1 + 2) * 3", json!(9));
    assert_eval_value("7 / 2", json!(3.5));
    assert_eval_value("6 / 2", json!(3));
    assert_eval_value("-7 % 3", json!(2));
    assert_eval_value("0.5 + 0.25", json!(0.75));
    assert_eval_value("-(2)", json!(-2));
}

#[test]
fn arithmetic_errors_work() {
    assert_eval_error("1 / 0", InterpreterError::DivisionByZero);
    assert!(matches!(
        create_interpreter().evaluate("1 + \"a\"").unwrap_err().error,
        InterpreterError::TypeMismatch(_)
    ));
}

#[test]
fn string_and_collection_addition_works() {
    assert_eval_value("\"a\" + \"b\"", json!("ab"));
    assert_eval_value("[1] + [2, 3]", json!([1, 2, 3]));
    assert_eval_value("{a: 1, b: 2} + {b: 3}", json!({"a": 1, "b": 3}));
}

#[test]
fn comparisons_work() {
    assert_eval_value("1 < 2", json!(true));
    assert_eval_value("\"b\" >= \"a\"", json!(true));
    assert_eval_value("1 == 1.0", json!(true));
    assert_eval_value("[1, {a: null}] == [1, {a: null}]", json!(true));
    assert_eval_value("1 != \"1\"", json!(true));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eval_value("false && nope", json!(false));
    assert_eval_value("1 || nope", json!(1));
    assert_eval_value("null || \"default\"", json!("default"));
    assert_eval_value("!null", json!(true));
    assert_eval_value("!0", json!(false));
}

#[test]
fn conditionals_work() {
    assert_eval_value("1 > 2 ? \"yes\" : \"no\"", json!("no"));
    assert_eval_value("0 ? \"yes\" : \"no\"", json!("yes"));
}

#[test]
fn variables_work() {
    assert_eval_value("x = 1; y = x + 1; [x, y]", json!([1, 2]));
    assert_eval_value("x = 1; x += 2; x -= 1", json!(2));
    assert_eval_error("nope", InterpreterError::UndefinedVariable("nope".to_string()));
}

#[test]
fn paths_work() {
    assert_eval_value("x = {a: [1, {b: 2}]}; x.a[1].b", json!(2));
    assert_eval_value("x = {a: [1, 2]}; x.a[-1]", json!(2));
    assert_eval_value("x = {a: 1}; x[\"a\"]", json!(1));
    assert_eval_value("x = {a: 1}; x.missing", json!(null));
    assert_eval_value("parse_json(\"[1, 2]\")[0]", json!(1));
    assert_eval_value("\"abc\"[1]", json!("b"));
}

#[test]
fn path_assignment_works() {
    assert_eval_value("x = {}; x.a = 1; x.b = [1]; x.b[2] = 3; x", json!({"a": 1, "b": [1, null, 3]}));
    assert_eval_value("x = {n: 1}; x.n += 1; x", json!({"n": 2}));
    assert_eval_value("x = {a: 1}; x.a = x.b = 2; x", json!({"a": 2, "b": 2}));
}

#[test]
fn assigning_far_past_end_of_array_fails() {
    let mut interpreter = create_interpreter();
    interpreter.evaluate("x = [1]").unwrap();
    for source in ["x[9223372036854775807] = 1", "x[100000000000] = 1"] {
        let err = interpreter.evaluate(source).unwrap_err();
        assert!(
            matches!(err.error, InterpreterError::IndexOutOfRange(_)),
            "evaluating '{source}' gave {err}"
        );
    }
    assert_eq!(interpreter.get("x"), Some(&json!([1])));
}

#[test]
fn applying_huge_index_assignment_fails() {
    let mut interpreter = create_interpreter_with_item(json!([]));
    let err = interpreter
        .evaluate("apply item { item[9223372036854775807] = 1 }")
        .unwrap_err();
    assert_eq!(err.error, InterpreterError::IndexOutOfRange(i64::MAX));
    assert_eq!(interpreter.get("item"), Some(&json!([])));
}

#[test]
fn builtins_work() {
    assert_eval_value("len(\"h😊\")", json!(2));
    assert_eval_value("len([1, 2, 3])", json!(3));
    assert_eval_value("keys({b: 1, a: 2})", json!(["b", "a"]));
    assert_eval_value("values({b: 1, a: 2})", json!([1, 2]));
    assert_eval_value("has({a: null}, \"a\")", json!(true));
    assert_eval_value("remove({a: 1, b: 2}, \"a\")", json!({"b": 2}));
    assert_eval_value("push([1], 2)", json!([1, 2]));
    assert_eval_value("type(1.5)", json!("number"));
    assert_eval_value("str([1, \"a\"])", json!("[1,\"a\"]"));
    assert_eval_value("num(\"12\") + 1", json!(13));
    assert_eval_value("upcase(\"abc\")", json!("ABC"));
    assert_eval_value("downcase(\"ABC\")", json!("abc"));
    assert_eval_value("to_json({a: [1, 2]})", json!("{\"a\":[1,2]}"));
    assert_eval_value("pretty_json([])", json!("[]"));
}

#[test]
fn builtin_errors_work() {
    assert_eval_error("nope(1)", InterpreterError::UndefinedFunction("nope".to_string()));
    assert_eval_error(
        "len()",
        InterpreterError::WrongNumberOfArguments {
            function: "len".to_string(),
            expected: 1,
            actual: 0,
        },
    );
    assert!(matches!(
        create_interpreter().evaluate("parse_json(\"{\")").unwrap_err().error,
        InterpreterError::InvalidJson(_)
    ));
}

#[test]
fn puts_and_warn_work() {
    assert_eval_output("puts(\"hi\")", "hi\n");
    assert_eval_output("puts({a: 1}); warn(\"careful\")", "{\"a\":1}\nWARNING: careful\n");
    assert_eval_output("puts(pretty_json({a: 1}))", "{\n  \"a\": 1\n}\n");
}

#[test]
fn syntax_errors_work() {
    assert_eval_error(
        "1 +",
        InterpreterError::Syntax(SyntaxError::UnexpectedEndOfInput),
    );
    assert_eval_error(
        "1 = 2",
        InterpreterError::Syntax(SyntaxError::InvalidAssignmentTarget(0..1)),
    );
    assert_eval_error(
        "(1 2)",
        InterpreterError::Syntax(SyntaxError::ExpectedToken(Token::RightParen, 3..4)),
    );
}

#[test]
fn deeply_nested_expressions_fail_cleanly() {
    let source = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
    let err = create_interpreter().evaluate(&source).unwrap_err();
    assert!(
        matches!(err.error, InterpreterError::Syntax(SyntaxError::NestedTooDeeply(_))),
        "{err}"
    );

    let source = format!("{}1", "-".repeat(100_000));
    let err = create_interpreter().evaluate(&source).unwrap_err();
    assert!(
        matches!(err.error, InterpreterError::Syntax(SyntaxError::NestedTooDeeply(_))),
        "{err}"
    );
    let caret = err.get_line_with_pointer_caret(&source);
    assert_eq!(caret.len(), 2);
    assert!(caret[1].ends_with('^'));
}

#[test]
fn syntax_errors_do_not_evaluate_anything() {
    let mut interpreter = create_interpreter();
    assert!(interpreter.evaluate("puts(1); )").is_err());
    assert!(interpreter.take_output().is_empty());
}

#[test]
fn apply_rebinds_to_body_value() {
    assert_applied(json!({"a": 1}), "item.a", json!(1));
    assert_applied(json!({"a": [1, 2]}), "len(item.a)", json!(2));
    assert_applied(json!(1), "item + 1", json!(2));
    assert_applied(json!({"a": 1}), "1 > 0 ? \"big\" : \"small\"", json!("big"));
}

#[test]
fn apply_keeps_in_place_modifications() {
    assert_applied(json!({"a": 1}), "item.b = 2", json!({"a": 1, "b": 2}));
    assert_applied(json!({"a": 1}), "item.a += 1; 5", json!({"a": 2}));
    assert_applied(json!([]), "item[1] = true", json!([null, true]));
    assert_applied(json!({"a": 1}), "item = [item]", json!([{"a": 1}]));
}

#[test]
fn apply_with_empty_body_leaves_binding_unchanged() {
    assert_applied(json!({"a": 1}), "", json!({"a": 1}));
}

#[test]
fn apply_yields_new_value() {
    let mut interpreter = create_interpreter_with_item(json!({"a": {"b": 1}}));
    assert_eq!(interpreter.evaluate("apply item { item.a }").unwrap(), json!({"b": 1}));
    assert_eq!(interpreter.evaluate("apply item { item.c = 2 }").unwrap(), json!({"b": 1, "c": 2}));
}

#[test]
fn apply_with_failing_body_leaves_binding_unchanged() {
    let mut interpreter = create_interpreter_with_item(json!({"a": 1}));
    assert!(interpreter.evaluate("apply item { item.a.b.c }").is_err());
    assert_eq!(interpreter.get("item"), Some(&json!({"a": 1})));
}

#[test]
fn successive_applies_see_previous_results() {
    let mut interpreter = create_interpreter_with_item(json!({"a": 1}));
    interpreter.evaluate("apply item { item.b = 2 }").unwrap();
    interpreter.evaluate("apply item { item.a + item.b }").unwrap();
    assert_eq!(interpreter.get("item"), Some(&json!(3)));
}

#[test]
fn output_is_pretty_printed_in_key_order() {
    let mut interpreter = create_interpreter_with_item(json!({"z": 1, "a": [true, null]}));
    interpreter.evaluate("puts(pretty_json(item))").unwrap();
    assert_eq!(
        interpreter.take_output(),
        vec![InterpreterOutput::Print(
            "{\n  \"z\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}".to_string()
        )]
    );
}
