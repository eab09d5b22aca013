//! Integration tests for the loris interpreter
//!
//! Drives the full pipeline through the public API:
//! - scanner → parser → tree-walking evaluator
//! - scanner → parser → bytecode compiler → VM
//! and checks that both engines agree on the feature subset they share.

use loris::compiler::Compiler;
use loris::interp::{new_root_env, ErrorKind, EvalResult, Evaluator, RuntimeError, Value};
use loris::parser;
use loris::vm::Vm;

/// Evaluate a program with the tree walker and return the statement results
fn eval_program(source: &str) -> EvalResult<Vec<Value>> {
    let program = parser::parse_source(source).expect("parse failed");
    let env = new_root_env();
    Evaluator::new().run(&program, &env)
}

/// Evaluate and render the way the shell does: non-null results joined by
/// newlines
fn eval_inspect(source: &str) -> String {
    eval_program(source)
        .expect("evaluation failed")
        .iter()
        .filter(|value| !value.is_null())
        .map(Value::inspect)
        .collect::<Vec<_>>()
        .join("\n")
}

fn eval_error(source: &str) -> RuntimeError {
    eval_program(source).expect_err("expected a runtime error")
}

/// Compile and run a program on the VM; returns the last popped value
fn vm_inspect(source: &str) -> String {
    let program = parser::parse_source(source).expect("parse failed");
    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile failed");
    let bytecode = compiler.bytecode();

    let mut vm = Vm::new();
    vm.run(&bytecode).expect("vm failed");
    vm.last_popped().inspect()
}

// ============================================
// End-to-end scenarios
// ============================================

#[test]
fn test_integer_expression() {
    assert_eq!(eval_inspect("1 + (1 * 7) / 2"), "4");
}

#[test]
fn test_comparison_expression() {
    assert_eq!(eval_inspect("(5 + 10 * 2 + 15 / 3) == 2 + -10"), "false");
}

#[test]
fn test_string_literal() {
    assert_eq!(eval_inspect("\"hello\""), "hello");
}

#[test]
fn test_float_addition() {
    assert_eq!(eval_inspect("420.69 + 7.4"), "428.090000");
}

#[test]
fn test_if_else_with_returns() {
    assert_eq!(
        eval_inspect("if (6 < 7) { return 5; } else { return \"hello\"; }"),
        "5"
    );
}

#[test]
fn test_push_and_len_share_the_array() {
    assert_eq!(eval_inspect("let a = [1,2,3]; push(a, 4); len(a)"), "4");
}

#[test]
fn test_ast_stringification() {
    let program = parser::parse_source("a * [1, 2, 3, 4][b * c] * d").unwrap();
    assert_eq!(program.to_string(), "((a * ([1, 2, 3, 4][(b * c)])) * d)");
}

#[test]
fn test_compiled_addition_last_popped() {
    assert_eq!(vm_inspect("1 + 2"), "3");
}

// ============================================
// Language semantics
// ============================================

#[test]
fn test_closure_capture() {
    assert_eq!(
        eval_inspect("let makeAdder = fn(a) { fn(b) { a + b } }; makeAdder(2)(3)"),
        "5"
    );
}

#[test]
fn test_truthiness_in_conditions() {
    let falsy = ["0", "0.0", "\"\"", "false"];
    for cond in falsy {
        assert_eq!(
            eval_inspect(&format!("if ({cond}) {{ 1 }} else {{ 2 }}")),
            "2",
            "{cond} should be falsy"
        );
    }

    let truthy = ["1", "-1", "0.5", "\"x\"", "true", "[0]", "{}"];
    for cond in truthy {
        assert_eq!(
            eval_inspect(&format!("if ({cond}) {{ 1 }} else {{ 2 }}")),
            "1",
            "{cond} should be truthy"
        );
    }
}

#[test]
fn test_bang_follows_truthiness() {
    assert_eq!(eval_inspect("!0"), "true");
    assert_eq!(eval_inspect("!\"\""), "true");
    assert_eq!(eval_inspect("!3"), "false");
    assert_eq!(eval_inspect("!!true"), "true");
}

#[test]
fn test_map_with_mixed_hashable_keys() {
    let source = "let m = {\"name\" : \"loris\", 1 : \"one\", true : \"yes\"};
        m[\"name\"]";
    assert_eq!(eval_inspect(source), "loris");
}

#[test]
fn test_float_map_key_is_rejected() {
    let err = eval_error("{1.5 : 1}");
    assert!(matches!(err.kind, ErrorKind::UnhashableKey));
}

#[test]
fn test_missing_map_key_yields_null() {
    let results = eval_program("let m = {1 : 2}; m[99]").unwrap();
    assert_eq!(results.last(), Some(&Value::Null));
}

#[test]
fn test_while_with_break() {
    let source = "let acc = [];
        while (true) {
            if (len(acc) >= 3) { break; }
            push(acc, len(acc));
        }
        acc";
    assert_eq!(eval_inspect(source), "[0, 1, 2]");
}

#[test]
fn test_functions_declared_then_called_across_programs() {
    let env = new_root_env();
    let mut evaluator = Evaluator::new();

    let decl = parser::parse_source("fn square(n) { return n * n; }").unwrap();
    evaluator.run(&decl, &env).unwrap();

    let call = parser::parse_source("square(9)").unwrap();
    let results = evaluator.run(&call, &env).unwrap();
    assert_eq!(results, vec![Value::Int(81)]);
}

#[test]
fn test_recursion_through_the_environment() {
    let env = new_root_env();
    let mut evaluator = Evaluator::new();

    let decl = parser::parse_source(
        "fn fact(n) { if (n < 2) { return 1; } return n * fact(n - 1); }",
    )
    .unwrap();
    evaluator.run(&decl, &env).unwrap();

    let call = parser::parse_source("fact(6)").unwrap();
    assert_eq!(evaluator.run(&call, &env).unwrap(), vec![Value::Int(720)]);
}

#[test]
fn test_string_index_and_comparison() {
    assert_eq!(eval_inspect("\"hello\"[0]"), "h");
    assert_eq!(eval_inspect("\"abc\" < \"abd\""), "true");
    assert_eq!(eval_inspect("\"same\" == \"same\""), "true");
}

#[test]
fn test_short_circuit_avoids_errors() {
    assert_eq!(eval_inspect("false && missing"), "false");
    assert_eq!(eval_inspect("true || missing"), "true");
    assert!(matches!(
        eval_error("true && missing").kind,
        ErrorKind::UndefinedSymbol
    ));
}

#[test]
fn test_runtime_errors_carry_positions() {
    let source = "let x = 10;\nmissing";
    let err = eval_error(source);
    let pos = loris::ast::Position::locate(source, err.span.start);
    assert_eq!((pos.line, pos.column), (2, 1));
    assert_eq!(err.message, "Could not find symbol missing");
}

#[test]
fn test_print_returns_null() {
    let results = eval_program("print(\"x\", 1)").unwrap();
    assert_eq!(results, vec![Value::Null]);
}

// ============================================
// Engine agreement
// ============================================

#[test]
fn test_engines_agree_on_shared_subset() {
    let sources = [
        "1 + (1 * 7) / 2",
        "(5 + 10 * 2 + 15 / 3) == 2 + -10",
        "\"hello\"",
        "420.69 + 7.4",
        "1 < 2",
        "9 <= 8",
        "3 > 2",
        "2 >= 2",
        "1 == 1",
        "true != false",
        "!false",
        "-42",
        "~7",
        "1; 2; 3 * 4",
    ];

    for source in sources {
        let walked = eval_program(source)
            .unwrap()
            .pop()
            .expect("tree walker produced no result");
        assert_eq!(
            vm_inspect(source),
            walked.inspect(),
            "engines disagree on {source}"
        );
    }
}

#[test]
fn test_both_engines_reject_mixed_numeric_types() {
    assert!(matches!(eval_error("1 + 2.5").kind, ErrorKind::TypeError));

    let program = parser::parse_source("1 + 2.5").unwrap();
    let mut compiler = Compiler::new();
    compiler.compile(&program).unwrap();
    let err = Vm::new().run(&compiler.bytecode()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeError));
}

// ============================================
// Parser surface
// ============================================

#[test]
fn test_parse_errors_are_collected_not_fatal() {
    let tokens = loris::lexer::tokenize("let x 1; 2 + 3;").unwrap();
    let (program, errors) = parser::parse(tokens);
    assert_eq!(errors.len(), 1);
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn test_lex_error_positions() {
    let err = loris::lexer::tokenize("let x = 1 ` 2").unwrap_err();
    assert!(err.message().contains("Unknown token"));
    assert_eq!(err.span().map(|s| s.start), Some(10));
}

#[test]
fn test_numeric_separator_literals_run() {
    assert_eq!(eval_inspect("1_000 + 57"), "1057");
    assert_eq!(eval_inspect("1_000.57 + 0.0"), "1000.570000");
}
