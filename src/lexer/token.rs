//! Token definitions

use logos::Logos;

/// Decode the body of a string literal (quotes already stripped).
///
/// The input is copied in unescaped runs: everything up to the next
/// backslash verbatim, then the escape resolved through [`unescape`]. An
/// unrecognized escape is kept as written, backslash included.
fn decode_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let mut tail = rest[at + 1..].chars();
        match tail.next() {
            Some(escaped) => {
                match unescape(escaped) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(escaped);
                    }
                }
                rest = tail.as_str();
            }
            // A trailing backslash cannot survive the literal regex, but
            // keep the byte rather than drop it
            None => {
                out.push('\\');
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '0' => Some('\0'),
        _ => None,
    }
}

/// Loris token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("let")]
    Let,
    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("true")]
    True,
    #[token("false")]
    False,
    // Reserved keywords with no grammar rules yet
    #[token("int")]
    TyInt,
    #[token("float")]
    TyFloat,
    #[token("str")]
    TyStr,
    #[token("bool")]
    TyBool,
    #[token("class")]
    Class,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("loop")]
    Loop,

    // Literals
    // Digits with optional `_` separators; a `.` between digit runs makes
    // the literal a float: 1_000.57
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*", |lex| {
        lex.slice().replace('_', "").parse::<f64>().ok()
    }, priority = 3)]
    FloatLit(f64),

    #[regex(r"[0-9][0-9_]*", |lex| {
        lex.slice().replace('_', "").parse::<i64>().ok()
    }, priority = 2)]
    IntLit(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let raw = lex.slice();
        decode_string(&raw[1..raw.len() - 1])
    })]
    StrLit(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("+")]
    Plus,
    #[token("+=")]
    PlusEq,
    #[token("-")]
    Minus,
    #[token("-=")]
    MinusEq,
    #[token("->")]
    Arrow,
    #[token("*")]
    Star,
    #[token("*=")]
    StarEq,
    #[token("/")]
    Slash,
    #[token("/=")]
    SlashEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token("<<")]
    Shl,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token(">>")]
    Shr,
    #[token("&")]
    Amp,
    #[token("&&")]
    AmpAmp,
    #[token("&=")]
    AmpEq,
    #[token("|")]
    Pipe,
    #[token("||")]
    PipePipe,
    #[token("|=")]
    PipeEq,
    #[token("~")]
    Tilde,
    #[token("~=")]
    TildeEq,
    #[token("!")]
    Bang,
    #[token(".")]
    Dot,

    // Delimiters
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Let => write!(f, "let"),
            Token::Fn => write!(f, "fn"),
            Token::Return => write!(f, "return"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Break => write!(f, "break"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::TyInt => write!(f, "int"),
            Token::TyFloat => write!(f, "float"),
            Token::TyStr => write!(f, "str"),
            Token::TyBool => write!(f, "bool"),
            Token::Class => write!(f, "class"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::Loop => write!(f, "loop"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::FloatLit(x) => write!(f, "{x}"),
            Token::StrLit(s) => write!(f, "\"{s}\""),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Assign => write!(f, "="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Plus => write!(f, "+"),
            Token::PlusEq => write!(f, "+="),
            Token::Minus => write!(f, "-"),
            Token::MinusEq => write!(f, "-="),
            Token::Arrow => write!(f, "->"),
            Token::Star => write!(f, "*"),
            Token::StarEq => write!(f, "*="),
            Token::Slash => write!(f, "/"),
            Token::SlashEq => write!(f, "/="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Shl => write!(f, "<<"),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Shr => write!(f, ">>"),
            Token::Amp => write!(f, "&"),
            Token::AmpAmp => write!(f, "&&"),
            Token::AmpEq => write!(f, "&="),
            Token::Pipe => write!(f, "|"),
            Token::PipePipe => write!(f, "||"),
            Token::PipeEq => write!(f, "|="),
            Token::Tilde => write!(f, "~"),
            Token::TildeEq => write!(f, "~="),
            Token::Bang => write!(f, "!"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
        }
    }
}
