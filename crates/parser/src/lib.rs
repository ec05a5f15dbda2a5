//! Go-subset lexer and parser (Logos + recursive descent).
//!
//! - Lexer uses Logos and implements Go semicolon insertion.
//! - Parser builds an arena AST; it stops at the first syntax error.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod parser_support;
pub mod walk;

pub use ast::{ParsedFile, Span};
pub use error::{Diag, ParseFailure};
pub use lexer::Lexer;

/// Parses one Go source file.
pub fn parse_source(src: &str) -> Result<ParsedFile, ParseFailure> {
    let (toks, mut diags) = lexer::tokenize(src);
    let mut parser = parser::Parser::new(src, toks);
    match parser.parse_file() {
        Ok(root) if diags.is_empty() => {
            let (arena, interner) = parser.into_parts();
            Ok(ParsedFile {
                arena,
                interner,
                root,
                src: src.to_string(),
            })
        }
        Ok(_) => Err(ParseFailure { diags }),
        Err(err) => {
            diags.push(err.diag());
            Err(ParseFailure { diags })
        }
    }
}
