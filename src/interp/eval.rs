//! Tree-walking evaluator

use crate::ast::{BinOp, Block, ElseBranch, Expr, FnDecl, Program, Span, Spanned, Stmt, UnOp};
use crate::interp::builtins;
use crate::interp::env::{child_env, EnvRef};
use crate::interp::error::{ErrorKind, EvalResult, RuntimeError};
use crate::interp::value::{Function, MapPair, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// The tree-walking execution engine
///
/// Statements return `Null` unless they carry a value. Errors carry a
/// message and the span of the offending node and propagate by early
/// return through every layer; `return` and `break` ride the same channel
/// as control-flow kinds and are intercepted at call, loop and program
/// boundaries.
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Execute a program, collecting one result per top-level statement.
    ///
    /// A literal top-level `return` collapses the remainder to its value.
    /// After the statements, every function declaration is bound into
    /// `env` as a closure over it, so later programs sharing the
    /// environment can call them.
    pub fn run(&mut self, program: &Program, env: &EnvRef) -> EvalResult<Vec<Value>> {
        let mut results = Vec::new();

        for stmt in &program.statements {
            match self.eval_stmt(stmt, env) {
                Ok(value) => results.push(value),
                Err(err) => match err.kind {
                    ErrorKind::Return(value) => {
                        if matches!(stmt.node, Stmt::Return(_)) {
                            return Ok(vec![*value]);
                        }
                        // A return that escaped a nested construct is
                        // unwrapped here; the wrapper is never user-visible
                        results.push(*value);
                    }
                    ErrorKind::Break => return Err(RuntimeError::break_outside_loop(err.span)),
                    _ => return Err(err),
                },
            }
        }

        for decl in &program.functions {
            self.define_function(decl, env);
        }

        Ok(results)
    }

    /// Evaluate a single expression against an environment
    pub fn eval_expr(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> EvalResult<Value> {
        match &expr.node {
            Expr::Ident(name) => env
                .borrow()
                .get(name)
                .or_else(|| builtins::lookup(name))
                .ok_or_else(|| RuntimeError::undefined_symbol(name, expr.span)),

            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::FloatLit(x) => Ok(Value::Float(*x)),
            Expr::StrLit(s) => Ok(Value::Str(s.clone())),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),

            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::array(values))
            }

            Expr::Map(pairs) => {
                let mut entries = HashMap::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key_value = self.eval_expr(key, env)?;
                    let hash = key_value.hash_key(key.span)?;
                    let value = self.eval_expr(value, env)?;
                    entries.insert(
                        hash,
                        MapPair {
                            key: key_value,
                            value,
                        },
                    );
                }
                Ok(Value::map(entries))
            }

            Expr::Prefix { op, right } => self.eval_prefix(*op, right, env, expr.span),
            Expr::Infix { left, op, right } => self.eval_infix(left, *op, right, env, expr.span),

            Expr::If { cond, then, alt } => {
                let cond = self.eval_expr(cond, env)?;
                if cond.is_truthy() {
                    self.eval_block(then, env)
                } else {
                    match alt.as_deref() {
                        Some(ElseBranch::Block(block)) => self.eval_block(block, env),
                        Some(ElseBranch::If(chained)) => self.eval_expr(chained, env),
                        None => Ok(Value::Null),
                    }
                }
            }

            Expr::FnLit { params, body } => Ok(Value::Function(Rc::new(Function {
                params: params.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            }))),

            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                self.apply_function(callee, values, expr.span)
            }

            Expr::Index { left, index } => {
                let target = self.eval_expr(left, env)?;
                let index_value = self.eval_expr(index, env)?;
                self.eval_index(target, index_value, index.span, expr.span)
            }

            Expr::Dot { .. } => Err(RuntimeError::unsupported(
                "Dot expressions are not yet implemented",
                expr.span,
            )),
        }
    }

    fn eval_stmt(&mut self, stmt: &Spanned<Stmt>, env: &EnvRef) -> EvalResult<Value> {
        match &stmt.node {
            Stmt::Let { name, value } => {
                let value = self.eval_expr(value, env)?;
                env.borrow_mut().define(name.node.clone(), value);
                Ok(Value::Null)
            }

            Stmt::Return(value) => {
                let value = self.eval_expr(value, env)?;
                Err(RuntimeError::ret(value, stmt.span))
            }

            Stmt::Expr(expr) => self.eval_expr(expr, env),

            Stmt::Block(block) => self.eval_block(block, env),

            Stmt::While { cond, body } => {
                while self.eval_expr(cond, env)?.is_truthy() {
                    match self.eval_block(body, env) {
                        Ok(_) => {}
                        Err(err) if err.kind == ErrorKind::Break => break,
                        Err(err) => return Err(err),
                    }
                }
                Ok(Value::Null)
            }

            Stmt::Break => Err(RuntimeError::brk(stmt.span)),
        }
    }

    /// Evaluate the statements of a block in the enclosing environment.
    ///
    /// Only function calls introduce frames; blocks share the scope they
    /// appear in. Return and break signals pass through untouched.
    fn eval_block(&mut self, block: &Block, env: &EnvRef) -> EvalResult<Value> {
        let mut result = Value::Null;
        for stmt in &block.statements {
            result = self.eval_stmt(stmt, env)?;
        }
        Ok(result)
    }

    fn eval_prefix(
        &mut self,
        op: UnOp,
        right: &Spanned<Expr>,
        env: &EnvRef,
        span: Span,
    ) -> EvalResult<Value> {
        let value = self.eval_expr(right, env)?;
        match op {
            UnOp::Not => Ok(Value::Bool(!value.is_truthy())),
            UnOp::Neg => match value {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(RuntimeError::type_error(
                    format!("Cannot negate {}", other.type_name()),
                    span,
                )),
            },
            UnOp::BitNot => match value {
                Value::Int(n) => Ok(Value::Int(!n)),
                other => Err(RuntimeError::type_error(
                    format!("Cannot use bitwise NOT on {}", other.type_name()),
                    span,
                )),
            },
        }
    }

    fn eval_infix(
        &mut self,
        left: &Spanned<Expr>,
        op: BinOp,
        right: &Spanned<Expr>,
        env: &EnvRef,
        span: Span,
    ) -> EvalResult<Value> {
        // Short-circuit operators decide on the left side's truthiness
        // before the right side is evaluated at all
        if let BinOp::And | BinOp::Or = op {
            let left = self.eval_expr(left, env)?;
            return match op {
                BinOp::And if !left.is_truthy() => Ok(Value::Bool(false)),
                BinOp::Or if left.is_truthy() => Ok(Value::Bool(true)),
                _ => Ok(Value::Bool(self.eval_expr(right, env)?.is_truthy())),
            };
        }

        // Binary `~` only has a meaning in the bytecode path
        if op == BinOp::BitXor {
            return Err(RuntimeError::type_error(
                "Cannot use operator `~` as an infix operator",
                span,
            ));
        }

        let left = self.eval_expr(left, env)?;
        let right = self.eval_expr(right, env)?;

        if op.is_comparison() {
            eval_comparison_op(&left, &right, op, span)
        } else {
            eval_binary_op(&left, &right, op, span)
        }
    }

    fn apply_function(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        match callee {
            Value::Function(func) => {
                if args.len() != func.params.len() {
                    return Err(RuntimeError::arity_mismatch(
                        func.params.len(),
                        args.len(),
                        span,
                    ));
                }

                let call_env = child_env(&func.env);
                for (param, arg) in func.params.iter().zip(args) {
                    call_env.borrow_mut().define(param.node.clone(), arg);
                }

                match self.eval_block(&func.body, &call_env) {
                    Ok(value) => Ok(value),
                    // The return signal unwraps at exactly this boundary
                    Err(err) => match err.kind {
                        ErrorKind::Return(value) => Ok(*value),
                        ErrorKind::Break => Err(RuntimeError::break_outside_loop(err.span)),
                        _ => Err(err),
                    },
                }
            }
            Value::Builtin(builtin) => (builtin.func)(span, &args),
            other => Err(RuntimeError::type_error(
                format!("Not a function: {}", other.type_name()),
                span,
            )),
        }
    }

    fn eval_index(
        &mut self,
        target: Value,
        index: Value,
        index_span: Span,
        span: Span,
    ) -> EvalResult<Value> {
        match target {
            Value::Array(elements) => {
                let elements = elements.borrow();
                let idx = match index {
                    Value::Int(n) => n,
                    other => {
                        return Err(RuntimeError::type_error(
                            format!(
                                "Cannot index into array with index of type {}",
                                other.type_name()
                            ),
                            index_span,
                        ))
                    }
                };
                usize::try_from(idx)
                    .ok()
                    .and_then(|i| elements.get(i).cloned())
                    .ok_or_else(|| RuntimeError::index_out_of_bounds(idx, elements.len(), span))
            }

            Value::Str(s) => {
                let idx = match index {
                    Value::Int(n) => n,
                    other => {
                        return Err(RuntimeError::type_error(
                            format!(
                                "Cannot index into string with index of type {}",
                                other.type_name()
                            ),
                            index_span,
                        ))
                    }
                };
                usize::try_from(idx)
                    .ok()
                    .and_then(|i| s.as_bytes().get(i).copied())
                    .map(|b| Value::Str((b as char).to_string()))
                    .ok_or_else(|| RuntimeError::index_out_of_bounds(idx, s.len(), span))
            }

            Value::Map(entries) => {
                let hash = index.hash_key(index_span)?;
                Ok(entries
                    .borrow()
                    .get(&hash)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Value::Null))
            }

            other => Err(RuntimeError::type_error(
                format!("Cannot index into type {}", other.type_name()),
                span,
            )),
        }
    }

    fn define_function(&mut self, decl: &FnDecl, env: &EnvRef) {
        let function = Value::Function(Rc::new(Function {
            params: decl.params.clone(),
            body: decl.body.clone(),
            env: Rc::clone(env),
        }));
        env.borrow_mut().define(decl.name.node.clone(), function);
    }
}

/// Apply an arithmetic or bitwise operator to two values.
///
/// Dispatch is strictly same-type: mixed int/float operands are an error,
/// strings and booleans have no arithmetic. Shared between the evaluator
/// and the VM so both engines agree on every result.
pub fn eval_binary_op(left: &Value, right: &Value, op: BinOp, span: Span) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => eval_int_op(*l, *r, op, span),
        (Value::Float(l), Value::Float(r)) => eval_float_op(*l, *r, op, span),
        (Value::Str(_), Value::Str(_)) => Err(RuntimeError::type_error(
            format!("Cannot use operator `{op}` on str"),
            span,
        )),
        (Value::Bool(_), Value::Bool(_)) => Err(RuntimeError::type_error(
            format!("Cannot use operator `{op}` on bool"),
            span,
        )),
        (l, r) => Err(RuntimeError::type_error(
            format!("Cannot operate on {} and {}", l.type_name(), r.type_name()),
            span,
        )),
    }
}

/// Apply a comparison operator to two values of the same type.
///
/// Strings compare lexicographically; booleans support only `==`/`!=`.
pub fn eval_comparison_op(left: &Value, right: &Value, op: BinOp, span: Span) -> EvalResult<Value> {
    let result = match (left, right) {
        (Value::Int(l), Value::Int(r)) => compare(l, r, op),
        (Value::Float(l), Value::Float(r)) => compare(l, r, op),
        (Value::Str(l), Value::Str(r)) => compare(l, r, op),
        (Value::Bool(l), Value::Bool(r)) => match op {
            BinOp::Eq => l == r,
            BinOp::NotEq => l != r,
            _ => {
                return Err(RuntimeError::type_error(
                    format!("Cannot use operator `{op}` with bool"),
                    span,
                ))
            }
        },
        (l, r) => {
            return Err(RuntimeError::type_error(
                format!("Cannot compare {} and {}", l.type_name(), r.type_name()),
                span,
            ))
        }
    };
    Ok(Value::Bool(result))
}

fn compare<T: PartialOrd>(left: &T, right: &T, op: BinOp) -> bool {
    match op {
        BinOp::Eq => left == right,
        BinOp::NotEq => left != right,
        BinOp::Lt => left < right,
        BinOp::Gt => left > right,
        BinOp::LtEq => left <= right,
        BinOp::GtEq => left >= right,
        // Callers route only comparison operators here
        _ => unreachable!("non-comparison operator {op}"),
    }
}

fn eval_int_op(left: i64, right: i64, op: BinOp, span: Span) -> EvalResult<Value> {
    let result = match op {
        BinOp::Add => left.wrapping_add(right),
        BinOp::Sub => left.wrapping_sub(right),
        BinOp::Mul => left.wrapping_mul(right),
        BinOp::Div => {
            if right == 0 {
                return Err(RuntimeError::division_by_zero(span));
            }
            left.wrapping_div(right)
        }
        BinOp::BitAnd => left & right,
        BinOp::BitOr => left | right,
        BinOp::BitXor => left ^ right,
        BinOp::Shl | BinOp::Shr => {
            if !(0..64).contains(&right) {
                return Err(RuntimeError::shift_out_of_range(right, span));
            }
            if op == BinOp::Shl {
                left << right
            } else {
                left >> right
            }
        }
        _ => {
            return Err(RuntimeError::type_error(
                format!("Cannot use operator `{op}` on int"),
                span,
            ))
        }
    };
    Ok(Value::Int(result))
}

fn eval_float_op(left: f64, right: f64, op: BinOp, span: Span) -> EvalResult<Value> {
    let result = match op {
        BinOp::Add => left + right,
        BinOp::Sub => left - right,
        BinOp::Mul => left * right,
        BinOp::Div => {
            if right == 0.0 {
                return Err(RuntimeError::division_by_zero(span));
            }
            left / right
        }
        _ => {
            return Err(RuntimeError::type_error(
                format!("Cannot use operator `{op}` on float"),
                span,
            ))
        }
    };
    Ok(Value::Float(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::env::new_root_env;
    use crate::interp::ErrorKind;
    use crate::parser;

    fn run_source(source: &str) -> EvalResult<Vec<Value>> {
        let program = parser::parse_source(source).expect("parse failed");
        let env = new_root_env();
        Evaluator::new().run(&program, &env)
    }

    /// Inspect the non-null results joined by newlines, like the shell does
    fn inspect_source(source: &str) -> String {
        let results = run_source(source).expect("evaluation failed");
        results
            .iter()
            .filter(|v| !v.is_null())
            .map(Value::inspect)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run_error(source: &str) -> RuntimeError {
        run_source(source).expect_err("expected an error")
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(inspect_source("1 + (1 * 7) / 2"), "4");
        assert_eq!(inspect_source("2 - 5"), "-3");
        assert_eq!(inspect_source("7 / 2"), "3");
        assert_eq!(inspect_source("1 << 4"), "16");
        assert_eq!(inspect_source("12 & 10"), "8");
        assert_eq!(inspect_source("12 | 3"), "15");
        assert_eq!(inspect_source("256 >> 4"), "16");
    }

    #[test]
    fn test_comparison_chains() {
        assert_eq!(inspect_source("(5 + 10 * 2 + 15 / 3) == 2 + -10"), "false");
        assert_eq!(inspect_source("6 < 7"), "true");
        assert_eq!(inspect_source("6 >= 7"), "false");
        assert_eq!(inspect_source("\"abc\" < \"abd\""), "true");
        assert_eq!(inspect_source("true != false"), "true");
    }

    #[test]
    fn test_string_and_float_literals() {
        assert_eq!(inspect_source("\"hello\""), "hello");
        assert_eq!(inspect_source("420.69 + 7.4"), "428.090000");
    }

    #[test]
    fn test_prefix_operators() {
        assert_eq!(inspect_source("-5"), "-5");
        assert_eq!(inspect_source("-4.2"), "-4.200000");
        assert_eq!(inspect_source("!0"), "true");
        assert_eq!(inspect_source("!\"text\""), "false");
        assert_eq!(inspect_source("~0"), "-1");
        assert!(matches!(
            run_error("-true").kind,
            ErrorKind::TypeError
        ));
        assert!(matches!(
            run_error("~1.5").kind,
            ErrorKind::TypeError
        ));
    }

    #[test]
    fn test_mixed_numeric_types_error() {
        assert!(matches!(run_error("1 + 2.0").kind, ErrorKind::TypeError));
        assert!(matches!(run_error("1.0 < 2").kind, ErrorKind::TypeError));
    }

    #[test]
    fn test_string_arithmetic_is_an_error() {
        assert!(matches!(
            run_error("\"a\" + \"b\"").kind,
            ErrorKind::TypeError
        ));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            run_error("1 / 0").kind,
            ErrorKind::DivisionByZero
        ));
        assert!(matches!(
            run_error("1.0 / 0.0").kind,
            ErrorKind::DivisionByZero
        ));
    }

    #[test]
    fn test_shift_range_checks() {
        assert!(matches!(
            run_error("1 << -1").kind,
            ErrorKind::ShiftOutOfRange
        ));
        assert!(matches!(
            run_error("1 >> 64").kind,
            ErrorKind::ShiftOutOfRange
        ));
    }

    #[test]
    fn test_binary_tilde_rejected_by_evaluator() {
        assert!(matches!(run_error("1 ~ 2").kind, ErrorKind::TypeError));
    }

    #[test]
    fn test_let_binding_and_lookup() {
        assert_eq!(inspect_source("let x = 10; let y = x * 2; y"), "20");
    }

    #[test]
    fn test_undefined_symbol() {
        let err = run_error("foobar");
        assert!(matches!(err.kind, ErrorKind::UndefinedSymbol));
        assert_eq!(err.message, "Could not find symbol foobar");
    }

    #[test]
    fn test_if_else_with_returns() {
        assert_eq!(
            inspect_source("if (6 < 7) { return 5; } else { return \"hello\"; }"),
            "5"
        );
        assert_eq!(
            inspect_source("if (6 > 7) { return 5; } else { return \"hello\"; }"),
            "hello"
        );
    }

    #[test]
    fn test_if_without_else_yields_null() {
        let results = run_source("if (false) { 1 }").unwrap();
        assert_eq!(results, vec![Value::Null]);
    }

    #[test]
    fn test_else_if_chain() {
        let source = "let x = 3;
            if (x == 1) { \"one\" } else if (x == 2) { \"two\" } else { \"many\" }";
        assert_eq!(inspect_source(source), "many");
    }

    #[test]
    fn test_top_level_return_collapses_remainder() {
        let results = run_source("let a = 1; return 7; let b = 2; b").unwrap();
        assert_eq!(results, vec![Value::Int(7)]);
    }

    #[test]
    fn test_function_literal_call() {
        assert_eq!(
            inspect_source("let add = fn(a, b) { return a + b; }; add(15, 35)"),
            "50"
        );
        // Implicit result: the last statement's value
        assert_eq!(
            inspect_source("let add = fn(a, b) { a + b }; add(2, 3)"),
            "5"
        );
    }

    #[test]
    fn test_closure_capture() {
        assert_eq!(
            inspect_source(
                "let makeAdder = fn(a) { fn(b) { a + b } }; makeAdder(2)(3)"
            ),
            "5"
        );
    }

    #[test]
    fn test_closure_keeps_frame_alive() {
        let source = "let counter = fn() {
                let n = [0];
                fn() { push(n, first(n) + 1); first(n) + len(n) }
            };
            let c = counter();
            c();
            c()";
        // The array captured by the closure survives the defining call;
        // both call results are collected
        assert_eq!(inspect_source(source), "2\n3");
    }

    #[test]
    fn test_arity_mismatch() {
        let err = run_error("let f = fn(a) { a }; f(1, 2)");
        assert!(matches!(err.kind, ErrorKind::ArityMismatch));
        assert_eq!(err.message, "Param mismatch: expected 1, got 2");
    }

    #[test]
    fn test_calling_a_non_function() {
        assert!(matches!(
            run_error("let x = 3; x(1)").kind,
            ErrorKind::TypeError
        ));
    }

    #[test]
    fn test_function_declarations_bind_after_statements() {
        let program = parser::parse_source("fn double(x) { return x * 2; }").unwrap();
        let env = new_root_env();
        let mut evaluator = Evaluator::new();
        evaluator.run(&program, &env).unwrap();

        // A later program sharing the environment can call the declaration
        let call = parser::parse_source("double(21)").unwrap();
        let results = evaluator.run(&call, &env).unwrap();
        assert_eq!(results, vec![Value::Int(42)]);
    }

    #[test]
    fn test_while_loop_with_break() {
        let source = "let i = [];
            while (true) {
                if (len(i) == 4) { break; }
                push(i, 0);
            }
            len(i)";
        assert_eq!(inspect_source(source), "4");
    }

    #[test]
    fn test_while_loop_condition_rechecked() {
        let source = "let seen = [];
            while (len(seen) < 3) { push(seen, len(seen)); }
            seen";
        assert_eq!(inspect_source(source), "[0, 1, 2]");
    }

    #[test]
    fn test_while_false_never_runs() {
        let results = run_source("while (false) { 1 }").unwrap();
        assert_eq!(results, vec![Value::Null]);
    }

    #[test]
    fn test_break_outside_loop() {
        assert!(matches!(
            run_error("break;").kind,
            ErrorKind::BreakOutsideLoop
        ));
        assert!(matches!(
            run_error("let f = fn() { break; }; f()").kind,
            ErrorKind::BreakOutsideLoop
        ));
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        // The right side would be an undefined-symbol error if evaluated
        assert_eq!(inspect_source("false && boom"), "false");
        assert_eq!(inspect_source("true || boom"), "true");
        assert_eq!(inspect_source("true && 1"), "true");
        assert_eq!(inspect_source("0 || 0"), "false");
    }

    #[test]
    fn test_array_literal_and_index() {
        assert_eq!(inspect_source("[1, 2, 3][0]"), "1");
        assert_eq!(inspect_source("let a = [1, 2 * 2, 9]; a[1]"), "4");
        assert!(matches!(
            run_error("[1, 2][5]").kind,
            ErrorKind::IndexOutOfBounds
        ));
        assert!(matches!(
            run_error("[1, 2][-1]").kind,
            ErrorKind::IndexOutOfBounds
        ));
        assert!(matches!(
            run_error("[1, 2][\"x\"]").kind,
            ErrorKind::TypeError
        ));
    }

    #[test]
    fn test_push_aliases_the_array() {
        assert_eq!(inspect_source("let a = [1,2,3]; push(a, 4); len(a)"), "4");
    }

    #[test]
    fn test_string_index() {
        assert_eq!(inspect_source("\"hello\"[1]"), "e");
        assert!(matches!(
            run_error("\"hi\"[2]").kind,
            ErrorKind::IndexOutOfBounds
        ));
    }

    #[test]
    fn test_map_literal_and_index() {
        assert_eq!(
            inspect_source("let m = {\"a\" : 1, \"b\" : 2}; m[\"b\"]"),
            "2"
        );
        assert_eq!(inspect_source("let m = {1 : \"one\"}; m[1]"), "one");
        assert_eq!(inspect_source("let m = {true : 1}; m[true]"), "1");
        // Missing keys yield Null
        let results = run_source("let m = {\"a\" : 1}; m[\"zzz\"]").unwrap();
        assert_eq!(results.last(), Some(&Value::Null));
    }

    #[test]
    fn test_float_map_key_is_an_error() {
        assert!(matches!(
            run_error("{1.5 : 1}").kind,
            ErrorKind::UnhashableKey
        ));
        assert!(matches!(
            run_error("let m = {1 : 1}; m[2.5]").kind,
            ErrorKind::UnhashableKey
        ));
    }

    #[test]
    fn test_block_statement_evaluates_in_place() {
        // The grammar nests blocks inside constructs; a bare block node
        // still evaluates to its last statement's value
        let inner = Spanned::new(
            Stmt::Expr(Spanned::new(Expr::IntLit(7), Span::default())),
            Span::default(),
        );
        let program = Program {
            statements: vec![Spanned::new(
                Stmt::Block(Block {
                    statements: vec![inner],
                    span: Span::default(),
                }),
                Span::default(),
            )],
            functions: vec![],
        };

        let env = new_root_env();
        let results = Evaluator::new().run(&program, &env).unwrap();
        assert_eq!(results, vec![Value::Int(7)]);
    }

    #[test]
    fn test_dot_expression_is_unsupported() {
        assert!(matches!(
            run_error("let a = [1]; a.size").kind,
            ErrorKind::Unsupported
        ));
    }

    #[test]
    fn test_error_spans_point_into_the_source() {
        let source = "let x = 1;\nx / 0";
        let err = run_error(source);
        let pos = crate::ast::Position::locate(source, err.span.start);
        assert_eq!(pos.line, 2);
    }

    #[test]
    fn test_operator_functions_shared_with_vm() {
        let span = Span::default();
        assert_eq!(
            eval_binary_op(&Value::Int(2), &Value::Int(3), BinOp::Mul, span).unwrap(),
            Value::Int(6)
        );
        // XOR reaches the shared function only from compiled code
        assert_eq!(
            eval_binary_op(&Value::Int(6), &Value::Int(3), BinOp::BitXor, span).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            eval_comparison_op(&Value::Int(2), &Value::Int(3), BinOp::Lt, span).unwrap(),
            Value::Bool(true)
        );
    }
}
