//! Front-end error types and reporting

use crate::ast::Span;
use thiserror::Error;

/// Result type alias for front-end stages
pub type Result<T> = std::result::Result<T, CompileError>;

/// Error raised while scanning, parsing or compiling to bytecode
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    #[error("Compile error at {span}: {message}")]
    Compile { message: String, span: Span },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn compile(message: impl Into<String>, span: Span) -> Self {
        Self::Compile {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } => Some(*span),
            Self::Parser { span, .. } => Some(*span),
            Self::Compile { span, .. } => Some(*span),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Parser { message, .. } => message,
            Self::Compile { message, .. } => message,
        }
    }
}

/// Report a front-end error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) {
    let kind = match error {
        CompileError::Lexer { .. } => "Lexer",
        CompileError::Parser { .. } => "Parser",
        CompileError::Compile { .. } => "Compile",
    };
    let span = error.span().unwrap_or_default();
    report(filename, source, kind, error.message(), span);
}

/// Report a runtime error with ariadne
pub fn report_runtime_error(filename: &str, source: &str, error: &crate::interp::RuntimeError) {
    report(filename, source, "Runtime", &error.message, error.span);
}

fn report(filename: &str, source: &str, kind: &str, message: &str, span: Span) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    Report::build(ReportKind::Error, filename, span.start)
        .with_message(format!("{kind} error"))
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .print((filename, Source::from(source)))
        .unwrap();
}
