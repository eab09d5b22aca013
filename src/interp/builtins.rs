//! Native functions exposed to user code
//!
//! Builtins resolve after the environment chain, so user bindings shadow
//! them. Every misuse is a recoverable error carrying the call span.

use crate::ast::Span;
use crate::interp::error::{EvalResult, RuntimeError};
use crate::interp::value::{Builtin, Value};

static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "print",
        func: builtin_print,
    },
    Builtin {
        name: "quit",
        func: builtin_quit,
    },
    Builtin {
        name: "exit",
        func: builtin_exit,
    },
];

/// Look up a builtin by name
pub fn lookup(name: &str) -> Option<Value> {
    BUILTINS
        .iter()
        .find(|b| b.name == name)
        .map(Value::Builtin)
}

fn expect_arity(name: &str, expected: usize, args: &[Value], span: Span) -> EvalResult<()> {
    if args.len() != expected {
        return Err(RuntimeError::type_error(
            format!(
                "Expected {expected} argument(s) for {name}(), got {}",
                args.len()
            ),
            span,
        ));
    }
    Ok(())
}

/// Number of items in a string, array or map
fn builtin_len(span: Span, args: &[Value]) -> EvalResult<Value> {
    expect_arity("len", 1, args, span)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.len() as i64)),
        Value::Array(elements) => Ok(Value::Int(elements.borrow().len() as i64)),
        Value::Map(entries) => Ok(Value::Int(entries.borrow().len() as i64)),
        other => Err(RuntimeError::type_error(
            format!("Cannot use type {} as argument for len()", other.type_name()),
            span,
        )),
    }
}

/// Append every remaining argument to the array in place; aliases observe
/// the mutation. Returns the array.
fn builtin_push(span: Span, args: &[Value]) -> EvalResult<Value> {
    let Some((target, items)) = args.split_first() else {
        return Err(RuntimeError::type_error(
            "Expected at least 1 argument for push()",
            span,
        ));
    };
    match target {
        Value::Array(elements) => {
            elements.borrow_mut().extend(items.iter().cloned());
            Ok(target.clone())
        }
        other => Err(RuntimeError::type_error(
            format!("Cannot push to type {}", other.type_name()),
            span,
        )),
    }
}

/// First element of an array, or Null when empty
fn builtin_first(span: Span, args: &[Value]) -> EvalResult<Value> {
    expect_arity("first", 1, args, span)?;
    match &args[0] {
        Value::Array(elements) => Ok(elements.borrow().first().cloned().unwrap_or(Value::Null)),
        other => Err(RuntimeError::type_error(
            format!("Cannot call first() on type {}", other.type_name()),
            span,
        )),
    }
}

/// Print the inspected arguments joined by spaces, then a newline
fn builtin_print(_span: Span, args: &[Value]) -> EvalResult<Value> {
    let parts: Vec<String> = args.iter().map(Value::inspect).collect();
    println!("{}", parts.join(" "));
    Ok(Value::Null)
}

/// Terminate the process with status 0
fn builtin_quit(span: Span, args: &[Value]) -> EvalResult<Value> {
    if !args.is_empty() {
        return Err(RuntimeError::type_error(
            format!(
                "Expected 0 arguments for quit(), got {}; use exit() to exit with a status code",
                args.len()
            ),
            span,
        ));
    }
    std::process::exit(0);
}

/// Terminate the process with the given integer status
fn builtin_exit(span: Span, args: &[Value]) -> EvalResult<Value> {
    expect_arity("exit", 1, args, span)?;
    match &args[0] {
        Value::Int(code) => std::process::exit(*code as i32),
        other => Err(RuntimeError::type_error(
            format!("Cannot use {} as argument in exit()", other.type_name()),
            span,
        )),
    }
}
