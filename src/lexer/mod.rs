//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{CompileError, Result};
use logos::Logos;

/// Pull-based scanner over a source string.
///
/// `next_token` yields one spanned token per call and `None` once the input
/// is exhausted (and keeps yielding `None` afterwards). An unrecognized byte
/// surfaces as a lexer error positioned at the offending character.
pub struct Scanner<'src> {
    lexer: logos::Lexer<'src, Token>,
    done: bool,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner {
            lexer: Token::lexer(source),
            done: false,
        }
    }

    /// Scan the next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<(Token, Span)>> {
        if self.done {
            return Ok(None);
        }
        match self.lexer.next() {
            Some(Ok(token)) => Ok(Some((token, self.lexer.span().into()))),
            Some(Err(_)) => {
                self.done = true;
                Err(CompileError::lexer(
                    format!("Unknown token {:?}", self.lexer.slice()),
                    self.lexer.span().into(),
                ))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    /// Scan the remaining input in bulk
    pub fn tokenize(&mut self) -> Result<Vec<(Token, Span)>> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token()? {
            tokens.push(tok);
        }
        Ok(tokens)
    }
}

/// Tokenize a whole source string
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    Scanner::new(source).tokenize()
}
