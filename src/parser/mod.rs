//! Hand-written Pratt parser
//!
//! Expressions are parsed by operator-precedence climbing: every token kind
//! maps to a prefix and/or infix rule, and `parse_expression` folds infix
//! rules while the next operator binds tighter than the current context.
//! Errors accumulate on the parser; a failed sub-parse abandons the current
//! construct and resumes at the next top-level boundary.

use crate::ast::{
    BinOp, Block, ElseBranch, Expr, FnDecl, Program, Span, Spanned, Stmt, UnOp,
};
use crate::error::CompileError;
use crate::lexer::{self, Token};


/// Binding power, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    /// `==` `!=`
    Equals,
    /// `<` `>` `<=` `>=`
    Compare,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `&` `|` `~` `<<` `>>`
    Bitwise,
    /// `&&` `||`
    Logic,
    /// unary `-` `!` `~`
    Prefix,
    /// `.`
    Dot,
    /// call `(` and index `[`
    Call,
}

fn precedence_of(token: &Token) -> Precedence {
    match token {
        Token::EqEq | Token::NotEq => Precedence::Equals,
        Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => Precedence::Compare,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Star | Token::Slash => Precedence::Product,
        Token::Amp | Token::Pipe | Token::Tilde | Token::Shl | Token::Shr => Precedence::Bitwise,
        Token::AmpAmp | Token::PipePipe => Precedence::Logic,
        Token::Dot => Precedence::Dot,
        Token::LParen | Token::LBracket => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn binop_for(token: &Token) -> Option<BinOp> {
    let op = match token {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Amp => BinOp::BitAnd,
        Token::Pipe => BinOp::BitOr,
        Token::Tilde => BinOp::BitXor,
        Token::Shl => BinOp::Shl,
        Token::Shr => BinOp::Shr,
        Token::EqEq => BinOp::Eq,
        Token::NotEq => BinOp::NotEq,
        Token::Lt => BinOp::Lt,
        Token::Gt => BinOp::Gt,
        Token::LtEq => BinOp::LtEq,
        Token::GtEq => BinOp::GtEq,
        Token::AmpAmp => BinOp::And,
        Token::PipePipe => BinOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Parse a token stream into a program plus the accumulated errors.
///
/// Callers must consult the error list before trusting the tree.
pub fn parse(tokens: Vec<(Token, Span)>) -> (Program, Vec<CompileError>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.errors)
}

/// Scan and parse a source string in one step
pub fn parse_source(source: &str) -> Result<Program, Vec<CompileError>> {
    let tokens = lexer::tokenize(source).map_err(|err| vec![err])?;
    let (program, errors) = parse(tokens);
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    errors: Vec<CompileError>,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.at_end() {
            if self.current_is(&Token::Fn) && matches!(self.peek(), Some(Token::Ident(_))) {
                match self.parse_fn_decl() {
                    Some(decl) => program.functions.push(decl),
                    None => self.synchronize(),
                }
            } else {
                match self.parse_statement() {
                    Some(stmt) => program.statements.push(stmt),
                    None => self.synchronize(),
                }
            }
        }

        program
    }

    // ------------------------------------------------------------------
    // Statements and declarations
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Option<Spanned<Stmt>> {
        match self.current()? {
            Token::Let => self.parse_let(),
            Token::Return => self.parse_return(),
            Token::While => self.parse_while(),
            Token::Break => {
                let span = self.current_span();
                self.advance();
                self.eat_semi();
                Some(Spanned::new(Stmt::Break, span))
            }
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_let(&mut self) -> Option<Spanned<Stmt>> {
        let start = self.current_span();
        self.advance();

        let name = self.expect_ident()?;

        if !self.current_is(&Token::Assign) {
            self.error_here("Expected assignment operator");
            return None;
        }
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        let span = start.merge(value.span);
        self.eat_semi();

        Some(Spanned::new(Stmt::Let { name, value }, span))
    }

    fn parse_return(&mut self) -> Option<Spanned<Stmt>> {
        let start = self.current_span();
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        let span = start.merge(value.span);
        self.eat_semi();

        Some(Spanned::new(Stmt::Return(value), span))
    }

    fn parse_while(&mut self) -> Option<Spanned<Stmt>> {
        let start = self.current_span();
        self.advance();

        self.expect(&Token::LParen, "`(`")?;
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect(&Token::RParen, "`)`")?;

        if !self.current_is(&Token::LBrace) {
            self.error_here("Expected `{`");
            return None;
        }
        let body = self.parse_block()?;
        let span = start.merge(body.span);

        Some(Spanned::new(Stmt::While { cond, body }, span))
    }

    fn parse_expr_statement(&mut self) -> Option<Spanned<Stmt>> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        let span = expr.span;
        self.eat_semi();
        Some(Spanned::new(Stmt::Expr(expr), span))
    }

    /// Parse `{ statements }`; the caller has checked for the opening brace
    fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.advance();

        let mut statements = Vec::new();
        while !self.current_is(&Token::RBrace) {
            if self.at_end() {
                self.error_here("Expected `}`");
                return None;
            }
            if self.current_is(&Token::Fn) && matches!(self.peek(), Some(Token::Ident(_))) {
                self.error_here("Only statements can be declared in blocks");
                return None;
            }
            statements.push(self.parse_statement()?);
        }

        let end = self.current_span();
        self.advance();

        Some(Block {
            statements,
            span: start.merge(end),
        })
    }

    fn parse_fn_decl(&mut self) -> Option<FnDecl> {
        let start = self.current_span();
        self.advance();

        let name = self.expect_ident()?;
        let params = self.parse_params()?;

        if !self.current_is(&Token::LBrace) {
            self.error_here("Expected block");
            return None;
        }
        let body = self.parse_block()?;
        let span = start.merge(body.span);

        Some(FnDecl {
            name,
            params,
            body,
            span,
        })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self, min: Precedence) -> Option<Spanned<Expr>> {
        let mut left = self.parse_prefix()?;

        while !self.current_is(&Token::Semi) && self.current_precedence() > min {
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Spanned<Expr>> {
        let span = self.current_span();
        let Some(token) = self.current().cloned() else {
            self.error("Unexpected end of input", span);
            return None;
        };

        match token {
            Token::Ident(name) => {
                self.advance();
                Some(Spanned::new(Expr::Ident(name), span))
            }
            Token::IntLit(n) => {
                self.advance();
                Some(Spanned::new(Expr::IntLit(n), span))
            }
            Token::FloatLit(x) => {
                self.advance();
                Some(Spanned::new(Expr::FloatLit(x), span))
            }
            Token::StrLit(s) => {
                self.advance();
                Some(Spanned::new(Expr::StrLit(s), span))
            }
            Token::True | Token::False => {
                self.advance();
                Some(Spanned::new(Expr::BoolLit(token == Token::True), span))
            }

            Token::LBracket => {
                self.advance();
                let (elements, end) = self.parse_expr_list(&Token::RBracket, "`]`")?;
                Some(Spanned::new(Expr::Array(elements), span.merge(end)))
            }

            Token::LBrace => self.parse_map(),

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(&Token::RParen, "`)`")?;
                Some(expr)
            }

            Token::If => self.parse_if(),
            Token::Fn => self.parse_fn_literal(),

            Token::Minus | Token::Bang | Token::Tilde => {
                let op = match token {
                    Token::Minus => UnOp::Neg,
                    Token::Bang => UnOp::Not,
                    _ => UnOp::BitNot,
                };
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                let span = span.merge(right.span);
                Some(Spanned::new(
                    Expr::Prefix {
                        op,
                        right: Box::new(right),
                    },
                    span,
                ))
            }

            other => {
                self.error(format!("Unable to parse operator `{other}`"), span);
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Spanned<Expr>) -> Option<Spanned<Expr>> {
        let span = self.current_span();
        let token = self.current().cloned()?;

        match token {
            Token::LParen => {
                self.advance();
                let (args, end) = self.parse_expr_list(&Token::RParen, "`)`")?;
                let span = left.span.merge(end);
                Some(Spanned::new(
                    Expr::Call {
                        callee: Box::new(left),
                        args,
                    },
                    span,
                ))
            }

            Token::LBracket => {
                self.advance();
                let index = self.parse_expression(Precedence::Lowest)?;
                let end = self.expect(&Token::RBracket, "`]`")?;
                let span = left.span.merge(end);
                Some(Spanned::new(
                    Expr::Index {
                        left: Box::new(left),
                        index: Box::new(index),
                    },
                    span,
                ))
            }

            Token::Dot => {
                self.advance();
                let right = self.parse_expression(Precedence::Dot)?;
                if !matches!(right.node, Expr::Ident(_) | Expr::Call { .. }) {
                    self.error(
                        "The right side of a dot expression must be a field or a call",
                        right.span,
                    );
                    return None;
                }
                let span = left.span.merge(right.span);
                Some(Spanned::new(
                    Expr::Dot {
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                ))
            }

            other => {
                let Some(op) = binop_for(&other) else {
                    self.error(format!("Unable to parse operator `{other}`"), span);
                    return None;
                };
                let precedence = precedence_of(&other);
                self.advance();
                let right = self.parse_expression(precedence)?;
                let span = left.span.merge(right.span);
                Some(Spanned::new(
                    Expr::Infix {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    },
                    span,
                ))
            }
        }
    }

    fn parse_if(&mut self) -> Option<Spanned<Expr>> {
        let start = self.current_span();
        self.advance();

        self.expect(&Token::LParen, "`(`")?;
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect(&Token::RParen, "`)`")?;

        if !self.current_is(&Token::LBrace) {
            self.error_here("Expected `{`");
            return None;
        }
        let then = self.parse_block()?;
        let mut span = start.merge(then.span);

        let alt = if self.current_is(&Token::Else) {
            self.advance();
            if self.current_is(&Token::LBrace) {
                let block = self.parse_block()?;
                span = span.merge(block.span);
                Some(Box::new(ElseBranch::Block(block)))
            } else if self.current_is(&Token::If) {
                let chained = self.parse_if()?;
                span = span.merge(chained.span);
                Some(Box::new(ElseBranch::If(chained)))
            } else {
                self.error_here("Expected a block or `if` after `else`");
                return None;
            }
        } else {
            None
        };

        Some(Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                then,
                alt,
            },
            span,
        ))
    }

    fn parse_fn_literal(&mut self) -> Option<Spanned<Expr>> {
        let start = self.current_span();
        self.advance();

        if matches!(self.current(), Some(Token::Ident(_))) {
            self.error_here("Function declarations are only allowed at the top level");
            return None;
        }

        let params = self.parse_params()?;

        if !self.current_is(&Token::LBrace) {
            self.error_here("Expected block");
            return None;
        }
        let body = self.parse_block()?;
        let span = start.merge(body.span);

        Some(Spanned::new(Expr::FnLit { params, body }, span))
    }

    fn parse_params(&mut self) -> Option<Vec<Spanned<String>>> {
        self.expect(&Token::LParen, "`(`")?;

        let mut params = Vec::new();
        if self.current_is(&Token::RParen) {
            self.advance();
            return Some(params);
        }

        params.push(self.expect_ident()?);
        while self.current_is(&Token::Comma) {
            self.advance();
            params.push(self.expect_ident()?);
        }

        self.expect(&Token::RParen, "`)`")?;
        Some(params)
    }

    /// Parse a comma-separated expression list up to `end`, consuming it;
    /// returns the elements and the closing token's span
    fn parse_expr_list(&mut self, end: &Token, end_name: &str) -> Option<(Vec<Spanned<Expr>>, Span)> {
        let mut elements = Vec::new();

        if self.current_is(end) {
            let span = self.current_span();
            self.advance();
            return Some((elements, span));
        }

        elements.push(self.parse_expression(Precedence::Lowest)?);
        while self.current_is(&Token::Comma) {
            self.advance();
            elements.push(self.parse_expression(Precedence::Lowest)?);
        }

        let span = self.expect(end, end_name)?;
        Some((elements, span))
    }

    fn parse_map(&mut self) -> Option<Spanned<Expr>> {
        let start = self.current_span();
        self.advance();

        let mut pairs = Vec::new();
        if self.current_is(&Token::RBrace) {
            let end = self.current_span();
            self.advance();
            return Some(Spanned::new(Expr::Map(pairs), start.merge(end)));
        }

        loop {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(&Token::Colon, "`:`")?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.current_is(&Token::Comma) {
                self.advance();
                // Allow a trailing comma before the closing brace
                if self.current_is(&Token::RBrace) {
                    break;
                }
            } else {
                break;
            }
        }

        let end = self.expect(&Token::RBrace, "`}`")?;
        Some(Spanned::new(Expr::Map(pairs), start.merge(end)))
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(token, _)| token)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            // Zero-width span just past the last token
            None => self
                .tokens
                .last()
                .map(|(_, span)| Span::point(span.end))
                .unwrap_or_default(),
        }
    }

    fn current_is(&self, token: &Token) -> bool {
        self.current() == Some(token)
    }

    fn current_precedence(&self) -> Precedence {
        self.current().map(precedence_of).unwrap_or(Precedence::Lowest)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat_semi(&mut self) {
        if self.current_is(&Token::Semi) {
            self.advance();
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Option<Span> {
        if self.current_is(token) {
            let span = self.current_span();
            self.advance();
            Some(span)
        } else {
            self.error_here(&format!("Expected {what}"));
            None
        }
    }

    fn expect_ident(&mut self) -> Option<Spanned<String>> {
        let span = self.current_span();
        match self.current() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Some(Spanned::new(name, span))
            }
            _ => {
                self.error_here("Expected identifier");
                None
            }
        }
    }

    /// Record an error at the current token, naming what was found
    fn error_here(&mut self, message: &str) {
        let found = match self.current() {
            Some(token) => format!("`{token}`"),
            None => "end of input".to_string(),
        };
        let span = self.current_span();
        self.error(format!("{message}, got {found}"), span);
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(CompileError::parser(message, span));
    }

    /// Skip ahead to the next statement boundary after a parse failure
    fn synchronize(&mut self) {
        self.advance();
        while let Some(token) = self.current() {
            match token {
                Token::Semi => {
                    self.advance();
                    return;
                }
                Token::Let | Token::Fn | Token::Return | Token::While | Token::Break => return,
                _ => self.advance(),
            }
        }
    }
}
