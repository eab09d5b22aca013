//! Abstract syntax tree definitions

mod span;

pub use span::{Position, Span, Spanned};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed program: top-level statements plus collected function declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Spanned<Stmt>>,
    pub functions: Vec<FnDecl>,
}

/// A named function declaration: `fn name(params) { body }`
///
/// Distinct from an anonymous [`Expr::FnLit`]: declarations are collected into
/// [`Program::functions`] instead of appearing in statement position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDecl {
    pub name: Spanned<String>,
    pub params: Vec<Spanned<String>>,
    pub body: Block,
    pub span: Span,
}

/// A brace-delimited sequence of statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Spanned<Stmt>>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// `let name = value;`
    Let {
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
    /// `return value;`
    Return(Spanned<Expr>),
    /// A bare expression, with optional trailing `;`
    Expr(Spanned<Expr>),
    /// A block in statement position
    Block(Block),
    /// `while (cond) { body }`
    While { cond: Spanned<Expr>, body: Block },
    /// `break;`
    Break,
}

/// The alternative of an `if` expression: a block or a chained `if`
///
/// Any other shape is unrepresentable; the chained variant always holds an
/// [`Expr::If`] node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElseBranch {
    Block(Block),
    If(Spanned<Expr>),
}

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Variable or function reference
    Ident(String),
    /// Integer literal
    IntLit(i64),
    /// Float literal
    FloatLit(f64),
    /// String literal (escapes already decoded)
    StrLit(String),
    /// Boolean literal
    BoolLit(bool),
    /// `[e1, e2, …]`
    Array(Vec<Spanned<Expr>>),
    /// `{k1 : v1, k2 : v2, …}`
    Map(Vec<(Spanned<Expr>, Spanned<Expr>)>),
    /// Unary operation
    Prefix {
        op: UnOp,
        right: Box<Spanned<Expr>>,
    },
    /// Binary operation
    Infix {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },
    /// `if (cond) { then } else …`
    If {
        cond: Box<Spanned<Expr>>,
        then: Block,
        alt: Option<Box<ElseBranch>>,
    },
    /// Anonymous function literal: `fn(params) { body }`
    FnLit {
        params: Vec<Spanned<String>>,
        body: Block,
    },
    /// `callee(args)`
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    /// `left[index]`
    Index {
        left: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    /// `left.right`, where `right` is an identifier or a call
    Dot {
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitOr,
    /// Binary `~`; only the bytecode path gives it a meaning (XOR)
    BitXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinOp {
    /// True for the six ordering/equality operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "~",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{s}")
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::BitNot => "~",
        };
        write!(f, "{s}")
    }
}

// The pretty-printer mirrors the source forms, fully parenthesizing
// expressions so that tests can pin the parsed shape.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt.node)?;
        }
        for func in &self.functions {
            write!(f, "{func}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FnDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(|p| p.node.as_str()).collect();
        write!(f, "fn {}({}) {}", self.name.node, params.join(", "), self.body)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt.node)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name.node, value.node),
            Stmt::Return(value) => write!(f, "return {};", value.node),
            Stmt::Expr(expr) => write!(f, "{}", expr.node),
            Stmt::Block(block) => write!(f, "{block}"),
            Stmt::While { cond, body } => write!(f, "while ({}) {}", cond.node, body),
            Stmt::Break => write!(f, "break;"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::IntLit(n) => write!(f, "{n}"),
            Expr::FloatLit(x) => write!(f, "{x}"),
            Expr::StrLit(s) => write!(f, "\"{s}\""),
            Expr::BoolLit(b) => write!(f, "{b}"),
            Expr::Array(elems) => {
                let elems: Vec<String> = elems.iter().map(|e| e.node.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
            Expr::Map(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{} : {}", k.node, v.node))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right.node),
            Expr::Infix { left, op, right } => {
                write!(f, "({} {} {})", left.node, op, right.node)
            }
            Expr::If { cond, then, alt } => {
                write!(f, "if ({}) {}", cond.node, then)?;
                match alt.as_deref() {
                    Some(ElseBranch::Block(block)) => write!(f, " else {block}"),
                    Some(ElseBranch::If(chained)) => write!(f, " else {}", chained.node),
                    None => Ok(()),
                }
            }
            Expr::FnLit { params, body } => {
                let params: Vec<&str> = params.iter().map(|p| p.node.as_str()).collect();
                write!(f, "fn({}) {}", params.join(", "), body)
            }
            Expr::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| a.node.to_string()).collect();
                write!(f, "{}({})", callee.node, args.join(", "))
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left.node, index.node),
            Expr::Dot { left, right } => write!(f, "{}.{}", left.node, right.node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(expr: Expr) -> Spanned<Expr> {
        Spanned::new(expr, Span::default())
    }

    #[test]
    fn test_program_display() {
        let program = Program {
            statements: vec![Spanned::new(
                Stmt::Let {
                    name: Spanned::new("my_var".to_string(), Span::default()),
                    value: sp(Expr::Ident("another_var".to_string())),
                },
                Span::default(),
            )],
            functions: vec![],
        };
        assert_eq!(program.to_string(), "let my_var = another_var;");
    }

    #[test]
    fn test_infix_display_parenthesizes() {
        let expr = Expr::Infix {
            left: Box::new(sp(Expr::Infix {
                left: Box::new(sp(Expr::Ident("a".to_string()))),
                op: BinOp::Add,
                right: Box::new(sp(Expr::Ident("b".to_string()))),
            })),
            op: BinOp::Add,
            right: Box::new(sp(Expr::Ident("c".to_string()))),
        };
        assert_eq!(expr.to_string(), "((a + b) + c)");
    }

    #[test]
    fn test_index_display() {
        let expr = Expr::Index {
            left: Box::new(sp(Expr::Array(vec![sp(Expr::IntLit(1)), sp(Expr::IntLit(2))]))),
            index: Box::new(sp(Expr::IntLit(0))),
        };
        assert_eq!(expr.to_string(), "([1, 2][0])");
    }

    #[test]
    fn test_binop_comparison_predicate() {
        assert!(BinOp::Eq.is_comparison());
        assert!(BinOp::LtEq.is_comparison());
        assert!(!BinOp::Add.is_comparison());
        assert!(!BinOp::And.is_comparison());
    }
}
