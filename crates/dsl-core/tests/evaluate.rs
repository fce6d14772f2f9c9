//! Integration tests for program evaluation.

use dsl_core::{
    Environment, EvalError, HostFn, Program, Registry, RegistryBuilder, Value,
};
use proptest::prelude::*;
use serde_json::{json, Value as Json};

fn check(form: Json, expected: Json, data: Json) {
    let env = Environment::from_json(&data);
    let result = Program::new(form.clone())
        .run(&env)
        .unwrap_or_else(|e| panic!("evaluate({}) failed: {}", form, e));
    assert_eq!(result.to_json(), expected, "form: {}", form);
}

fn check_err(form: Json, data: Json) -> EvalError {
    let env = Environment::from_json(&data);
    Program::new(form.clone())
        .run(&env)
        .err()
        .unwrap_or_else(|| panic!("expected error for {}", form))
}

/// Runs `form` and returns the environment afterwards.
fn run_env(form: Json, data: Json) -> (Value, Environment) {
    let env = Environment::from_json(&data);
    let result = Program::new(form.clone())
        .run(&env)
        .unwrap_or_else(|e| panic!("evaluate({}) failed: {}", form, e));
    (result, env)
}

// ---------------------------------------------------------------- Literals

#[test]
fn test_literals() {
    check(json!(1), json!(1), json!({}));
    check(json!("plain text"), json!("plain text"), json!({}));
    check(json!([1, "a", null]), json!([1, "a", null]), json!({}));
    check(json!({"a": 1, "b": "$.x"}), json!({"a": 1, "b": 2}), json!({"x": 2}));
    check(json!("$"), json!({"x": 2}), json!({"x": 2}));
}

#[test]
fn test_unknown_single_key_object_is_a_map() {
    check(json!({"notAnOperator": [1, 2]}), json!({"notAnOperator": [1, 2]}), json!({}));
}

// ---------------------------------------------------------------- Paths

#[test]
fn test_get() {
    let data = json!({"a": {"b": 1}, "list": [10, 20, 30], "i": 2});
    check(json!("$.a.b"), json!(1), data.clone());
    check(json!("$a.b"), json!(1), data.clone());
    check(json!("$.list[1]"), json!(20), data.clone());
    check(json!("$.list[$.i]"), json!(30), data.clone());
    check(json!("$.list.0"), json!(10), data.clone());
    check(json!({"get": ["$.list", 2]}), json!(30), data.clone());
    check(json!({"get": ["$.a.missing", "fallback"]}), json!("fallback"), data.clone());
    check(json!({"get": ["$.nope.deeper", "fallback"]}), json!("fallback"), data.clone());
    check(json!("$.nope.deeper"), json!(null), data);
}

#[test]
fn test_set_then_get() {
    let data = json!({"a": {"b": 1}, "list": [1, 2, 3]});
    check(json!({"sequence": [{"set": ["$.a.b", 5]}, "$.a.b"]}), json!(5), data.clone());
    check(json!({"sequence": [{"$.a.c": [1]}, "$.a.c"]}), json!([1]), data.clone());
    check(json!({"sequence": [{"$.list[0]": "x"}, "$.list"]}), json!(["x", 2, 3]), data);
}

#[test]
fn test_set_on_missing_parent_is_noop() {
    let (result, env) = run_env(json!({"set": ["$.x.y", 1]}), json!({"a": 1}));
    assert_eq!(result, Value::Null);
    assert_eq!(env.to_json(), json!({"a": 1}));

    let (_, env) = run_env(json!({"$.list[9]": 1}), json!({"list": [0]}));
    assert_eq!(env.to_json(), json!({"list": [0]}));
}

#[test]
fn test_set_into_scalar_fails() {
    let err = check_err(json!({"$.a.b": 1}), json!({"a": 3}));
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

#[test]
fn test_do_calls_host_function() {
    let registry = RegistryBuilder::with_builtins()
        .value(
            "double",
            Value::Host(HostFn::new("double", |args| {
                Ok(Value::Int(args.first().map_or(Ok(0), Value::to_int)? * 2))
            })),
        )
        .build();
    let env = Environment::from_json(&json!({"tools": {"n": 4}}));
    let program = Program::with_registry(json!({"do": ["double", 21]}), registry.clone());
    assert_eq!(program.run(&env).unwrap(), Value::Int(42));

    let program = Program::with_registry(json!({"do": ["$.tools", "n"]}), registry);
    assert_eq!(program.run(&env).unwrap(), Value::Null);
}

// ---------------------------------------------------------------- Control flow

#[test]
fn test_sequence_returns_last_non_null() {
    check(json!({"sequence": [1, 2, null]}), json!(2), json!({}));
    check(json!({"sequence": []}), json!(null), json!({}));
    check(
        json!({"sequence": [1, {"sequence": [2, 3]}, null]}),
        json!(3),
        json!({}),
    );
}

#[test]
fn test_sequence_exit_skips_rest() {
    let (result, env) = run_env(
        json!({"sequence": [1, {"exit": []}, {"$.after": true}]}),
        json!({}),
    );
    assert_eq!(result, Value::Int(1));
    assert_eq!(env.get("after"), None);
    assert_eq!(env.get("exit"), Some(Value::Bool(true)));
    assert_eq!(env.get("seqArray"), Some(Value::list(vec![])));
}

#[test]
fn test_sequence_propagates_errors() {
    let err = check_err(json!({"sequence": [1, {"when": []}, 3]}), json!({}));
    assert!(matches!(err, EvalError::NoMatch(_)), "got: {}", err);
}

#[test]
fn test_when() {
    check(json!({"when": [false, "X", true, "Y", "Z"]}), json!("Y"), json!({}));
    check(json!({"when": ["$.n > 1", "big", true, "small"]}), json!("big"), json!({"n": 5}));
    check(json!({"when": [false, 1, true]}), json!(null), json!({}));

    let err = check_err(json!({"when": []}), json!({}));
    assert!(matches!(err, EvalError::NoMatch(_)), "got: {}", err);
    let err = check_err(json!({"when": [false, 1]}), json!({}));
    assert!(matches!(err, EvalError::NoMatch(_)), "got: {}", err);
    let err = check_err(json!({"when": [1, 2]}), json!({}));
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

// ---------------------------------------------------------------- Iteration

#[test]
fn test_map_and_filter() {
    check(json!({"map": [[1, 2, 3], "$.item * 2"]}), json!([2, 4, 6]), json!({}));
    check(json!({"map": [[5, 6], "$.index"]}), json!([0, 1]), json!({}));
    check(json!({"filter": [[1, 2, 3, 4], "$.item > 2"]}), json!([3, 4]), json!({}));
    check(
        json!({"map": [["a", "b"], {"format": ["%s!", "$.x"]}, "x"]}),
        json!(["a!", "b!"]),
        json!({}),
    );
    check(json!({"map": [7, "$.item"]}), json!([7]), json!({}));
    check(json!({"map": ["$.missing", "$.item"]}), json!([]), json!({}));
}

#[test]
fn test_filter_needs_bool() {
    let err = check_err(json!({"filter": [[1], "$.item"]}), json!({}));
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

#[test]
fn test_for_each_mutates_environment() {
    let (result, env) = run_env(
        json!({"forEach": ["$.xs", {"$.total": "$.total + $.item"}]}),
        json!({"xs": [1, 2, 3], "total": 0}),
    );
    assert_eq!(result, Value::Null);
    assert_eq!(env.get("total"), Some(Value::Int(6)));
    assert_eq!(env.get("item"), None);
    assert_eq!(env.get("index"), None);
}

#[test]
fn test_empty_sources() {
    let (_, env) = run_env(
        json!({"forEach": [[], {"$.touched": true}]}),
        json!({"item": "kept"}),
    );
    assert_eq!(env.to_json(), json!({"item": "kept"}));
    check(json!({"filter": [[], true]}), json!([]), json!({}));
    check(json!({"map": [[], 1]}), json!([]), json!({}));
}

#[test]
fn test_item_variable_must_be_literal() {
    let err = check_err(json!({"map": [[1], "$.item", 3]}), json!({}));
    assert!(matches!(err, EvalError::ArityOrArgument(_)), "got: {}", err);
}

#[test]
fn test_to_unique() {
    check(
        json!({"toUnique": ["evaluate-to-unique", "$.item", 2, [1, 1, 2, 3, 1]]}),
        json!([1, 2, 3, 1]),
        json!({}),
    );
    // The window persists across calls.
    check(
        json!({"toUnique": ["evaluate-to-unique-persist", "$.item.id", 5, [{"id": 1}]]}),
        json!([{"id": 1}]),
        json!({}),
    );
    check(
        json!({"toUnique": ["evaluate-to-unique-persist", "$.item.id", 5, [{"id": 1}, {"id": 2}]]}),
        json!([{"id": 2}]),
        json!({}),
    );
}

#[test]
fn test_to_unique_argument_errors() {
    let err = check_err(json!({"toUnique": ["k-err", "$.item", 0, [1]]}), json!({}));
    assert!(matches!(err, EvalError::ArityOrArgument(_)), "got: {}", err);
    let err = check_err(json!({"toUnique": [1, "$.item", 2, [1]]}), json!({}));
    assert!(matches!(err, EvalError::ArityOrArgument(_)), "got: {}", err);
    let err = check_err(json!({"toUnique": ["k-err", "$.item", 2, 5]}), json!({}));
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

// ---------------------------------------------------------------- Arithmetic

#[test]
fn test_inline_arithmetic() {
    check(json!("$.a + 2"), json!(5), json!({"a": 3}));
    check(json!("$.a - 1 - 1"), json!(3), json!({"a": 3}));
    check(json!("10 / 3"), json!(3), json!({}));
    check(json!("$.a % 2"), json!(1), json!({"a": 3}));
}

#[test]
fn test_inline_comparison() {
    check(json!("$.a >= 3"), json!(true), json!({"a": 3}));
    check(json!("$.a<$.b"), json!(false), json!({"a": 3, "b": 1}));
    check(json!("1 < b"), json!("1 < b"), json!({}));
}

#[test]
fn test_arity_errors() {
    let err = check_err(json!({"minus": []}), json!({}));
    assert!(err.to_string().contains("at least 1"), "got: {}", err);
    let err = check_err(json!({"len": [1, 2]}), json!({}));
    assert!(err.to_string().contains("expects 1 operands"), "got: {}", err);
}

#[test]
fn test_non_numeric_operand() {
    let err = check_err(json!({"plus": [1, "abc"]}), json!({}));
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

#[test]
fn test_operands_evaluate_before_coercion() {
    let env = Environment::from_json(&json!({}));
    let err = Program::new(json!({"plus": ["abc", {"$.touched": true}]}))
        .run(&env)
        .unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
    assert_eq!(env.get("touched"), Some(Value::Bool(true)));

    let env = Environment::from_json(&json!({}));
    let err = Program::new(json!({"compare": ["<", "x", {"$.touched": 1}]}))
        .run(&env)
        .unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
    assert_eq!(env.get("touched"), Some(Value::Int(1)));
}

proptest! {
    #[test]
    fn plus_folds_like_sum(xs in proptest::collection::vec(-1000i64..1000, 0..8)) {
        let result = Program::new(json!({"plus": xs.clone()})).run_fresh().unwrap();
        prop_assert_eq!(result, Value::Int(xs.iter().sum()));
    }

    #[test]
    fn minus_folds_from_first(first in -1000i64..1000, rest in proptest::collection::vec(-1000i64..1000, 0..8)) {
        let mut operands = vec![first];
        operands.extend(&rest);
        let result = Program::new(json!({"minus": operands})).run_fresh().unwrap();
        prop_assert_eq!(result, Value::Int(first - rest.iter().sum::<i64>()));
    }
}

// ---------------------------------------------------------------- Predicates

#[test]
fn test_predicates() {
    check(json!({"is": [1, 1.0]}), json!(true), json!({}));
    check(json!({"is": [{"a": [1]}, {"a": [1]}]}), json!(true), json!({}));
    check(json!({"is": ["hello", {"regexp": "^h"}]}), json!(true), json!({}));
    check(json!({"is": [{"regexp": "o$"}, "hello"]}), json!(true), json!({}));
    check(json!({"not": [1, 2]}), json!(true), json!({}));
    check(json!({"in": ["b", "a", "b"]}), json!(true), json!({}));
    check(json!({"in": [42, {"regexp": "^4"}]}), json!(true), json!({}));
    check(json!({"in": ["z"]}), json!(false), json!({}));
}

#[test]
fn test_is_on_self_referencing_maps() {
    let build = json!([
        {"$.a": {"x": 1, "y": 2}},
        {"$.a.self": "$.a"},
        {"$.b": {"x": 1, "y": 2}},
        {"$.b.self": "$.b"}
    ]);
    let with = |tail: Vec<Json>| {
        let mut steps = build.as_array().cloned().unwrap();
        steps.extend(tail);
        json!({"sequence": steps})
    };
    check(with(vec![json!({"is": ["$.a", "$.b"]})]), json!(true), json!({}));
    check(with(vec![json!({"not": ["$.a", "$.b"]})]), json!(false), json!({}));
    check(
        with(vec![json!({"$.b.y": 3}), json!({"is": ["$.a", "$.b"]})]),
        json!(false),
        json!({}),
    );
}

#[test]
fn test_bad_pattern() {
    let err = check_err(json!({"regexp": "("}), json!({}));
    assert!(matches!(err, EvalError::ArityOrArgument(_)), "got: {}", err);
}

// ---------------------------------------------------------------- Misc

#[test]
fn test_format_len_reverse() {
    check(json!({"format": ["%s has %s", "$.name", "$.n"]}), json!("box has 3"), json!({"name": "box", "n": 3}));
    check(json!({"len": "héllo"}), json!(5), json!({}));
    check(json!({"len": [[1, 2]]}), json!(2), json!({}));
    check(json!({"reverse": [[1, 2, 3]]}), json!([3, 2, 1]), json!({}));

    let err = check_err(json!({"reverse": "abc"}), json!({}));
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

#[test]
fn test_now_is_epoch_millis() {
    let value = Program::new(json!({"now": []})).run_fresh().unwrap();
    match value {
        Value::Int(ms) => assert!(ms > 1_600_000_000_000),
        other => panic!("expected int, got {}", other),
    }
}

#[test]
fn test_registry_values_resolve_as_names() {
    let registry = RegistryBuilder::with_builtins()
        .value("answer", Value::Int(42))
        .build();
    let program = Program::with_registry(json!(["answer", "question"]), registry);
    assert_eq!(program.run_fresh().unwrap().to_json(), json!([42, "question"]));
    assert!(Registry::global().operator("+").is_some());
}
