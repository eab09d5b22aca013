//! Bytecode compiler
//!
//! Walks the syntax tree and emits instructions into an append-only buffer
//! plus a constants pool. Children compile in evaluation order, then the
//! node's own operator is emitted. The compiler covers the expression
//! subset the VM executes; anything else is a compile error rather than a
//! silent skip, which would corrupt the stack discipline between
//! statements.

use crate::ast::{BinOp, Expr, Program, Spanned, Stmt, UnOp};
use crate::code::{encode, Instructions, Opcode};
use crate::error::{CompileError, Result};
use crate::interp::Value;

/// Compiled program: instruction stream plus constants pool
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

/// Compiles a syntax tree into bytecode
#[derive(Debug, Default)]
pub struct Compiler {
    instructions: Instructions,
    constants: Vec<Value>,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            instructions: Instructions::new(),
            constants: Vec::new(),
        }
    }

    /// Compile a whole program
    pub fn compile(&mut self, program: &Program) -> Result<()> {
        if let Some(decl) = program.functions.first() {
            return Err(CompileError::compile(
                "Function declarations are not supported by the bytecode compiler",
                decl.span,
            ));
        }
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    /// Extract the compiled bytecode
    pub fn bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self.instructions,
            constants: self.constants,
        }
    }

    fn compile_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<()> {
        match &stmt.node {
            Stmt::Expr(expr) => {
                self.compile_expr(expr)?;
                // Discard the value so the stack is empty between statements
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
            other => Err(CompileError::compile(
                format!("{} statements are not supported by the bytecode compiler", stmt_name(other)),
                stmt.span,
            )),
        }
    }

    fn compile_expr(&mut self, expr: &Spanned<Expr>) -> Result<()> {
        match &expr.node {
            Expr::IntLit(n) => {
                let index = self.add_constant(Value::Int(*n));
                self.emit(Opcode::Constant, &[index]);
            }
            Expr::FloatLit(x) => {
                let index = self.add_constant(Value::Float(*x));
                self.emit(Opcode::Constant, &[index]);
            }
            Expr::StrLit(s) => {
                let index = self.add_constant(Value::Str(s.clone()));
                self.emit(Opcode::Constant, &[index]);
            }
            Expr::BoolLit(true) => {
                self.emit(Opcode::True, &[]);
            }
            Expr::BoolLit(false) => {
                self.emit(Opcode::False, &[]);
            }

            Expr::Prefix { op, right } => {
                self.compile_expr(right)?;
                let opcode = match op {
                    UnOp::Not => Opcode::Bang,
                    UnOp::Neg => Opcode::Minus,
                    UnOp::BitNot => Opcode::BitNot,
                };
                self.emit(opcode, &[]);
            }

            Expr::Infix { left, op, right } => {
                // `<` and `<=` have no opcodes: swap the operands and emit
                // the mirrored comparison
                if let BinOp::Lt | BinOp::LtEq = op {
                    self.compile_expr(right)?;
                    self.compile_expr(left)?;
                    let opcode = if *op == BinOp::Lt {
                        Opcode::Greater
                    } else {
                        Opcode::GreaterEqual
                    };
                    self.emit(opcode, &[]);
                    return Ok(());
                }

                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let opcode = match op {
                    BinOp::Add => Opcode::Add,
                    BinOp::Sub => Opcode::Sub,
                    BinOp::Mul => Opcode::Mul,
                    BinOp::Div => Opcode::Div,
                    BinOp::BitAnd => Opcode::BitAnd,
                    BinOp::BitOr => Opcode::BitOr,
                    // Binary `~` means XOR in the bytecode path
                    BinOp::BitXor => Opcode::BitXor,
                    BinOp::Eq => Opcode::Equal,
                    BinOp::NotEq => Opcode::NotEqual,
                    BinOp::Gt => Opcode::Greater,
                    BinOp::GtEq => Opcode::GreaterEqual,
                    other => {
                        return Err(CompileError::compile(
                            format!("Unknown operator {other}"),
                            expr.span,
                        ))
                    }
                };
                self.emit(opcode, &[]);
            }

            other => {
                return Err(CompileError::compile(
                    format!("{} expressions are not supported by the bytecode compiler", expr_name(other)),
                    expr.span,
                ))
            }
        }
        Ok(())
    }

    /// Append an encoded instruction; returns its position
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let position = self.instructions.len();
        self.instructions.0.extend(encode(op, operands));
        position
    }

    /// Intern a literal into the constants pool; returns its index
    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }
}

fn stmt_name(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Let { .. } => "`let`",
        Stmt::Return(_) => "`return`",
        Stmt::Expr(_) => "expression",
        Stmt::Block(_) => "Block",
        Stmt::While { .. } => "`while`",
        Stmt::Break => "`break`",
    }
}

fn expr_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Ident(_) => "Identifier",
        Expr::Array(_) => "Array",
        Expr::Map(_) => "Map",
        Expr::If { .. } => "If",
        Expr::FnLit { .. } => "Function literal",
        Expr::Call { .. } => "Call",
        Expr::Index { .. } => "Index",
        Expr::Dot { .. } => "Dot",
        Expr::IntLit(_)
        | Expr::FloatLit(_)
        | Expr::StrLit(_)
        | Expr::BoolLit(_)
        | Expr::Prefix { .. }
        | Expr::Infix { .. } => unreachable!("compilable expression {expr:?}"),
    }
}
