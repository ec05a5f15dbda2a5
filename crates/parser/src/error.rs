use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lex,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for Diag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagKind::Lex => "lex",
            DiagKind::Parse => "parse",
        };
        write!(
            f,
            "{kind} error at {}..{}: {}",
            self.span.start, self.span.end, self.message
        )
    }
}

/// Everything collected before the parser gave up.
#[derive(Debug, Error)]
#[error("{}", render_diags(.diags))]
pub struct ParseFailure {
    pub diags: Vec<Diag>,
}

fn render_diags(diags: &[Diag]) -> String {
    match diags {
        [] => "parse failed".to_string(),
        [one] => one.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

#[derive(Debug, Error, Clone, Default, PartialEq, Eq)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
}

#[derive(Debug, Error, Clone, Default, PartialEq, Eq)]
#[error("{kind}: {span:?}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    #[inline]
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Lex,
            span: self.span,
            message: self.kind.to_string(),
        }
    }
}

/// A single parser error; the parser bails out on the first one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    #[inline]
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Parse,
            span: self.span,
            message: self.message.clone(),
        }
    }
}
