use crate::ast::Span;
use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

// =============================================================================
// 0. Shared helpers
// =============================================================================

#[inline(always)]
const fn first_newline_offset(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'\n' | b'\r') {
            return Some(i);
        }
        i += 1;
    }

    None
}

#[inline(always)]
pub const fn is_dec_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline(always)]
const fn is_number_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// =============================================================================
// 1. Block comment scanner
// =============================================================================

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    use memchr::memchr;

    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star_pos) = memchr(b'*', &rem[search_start..]) {
        let abs_pos = search_start + star_pos;

        if rem.get(abs_pos + 1) == Some(&b'/') {
            lex.bump(abs_pos + 2);
            return Ok(());
        }

        search_start = abs_pos + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

// =============================================================================
// 2. Numbers (maximal munch, classification in the wrapper)
// =============================================================================

mod num {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum NumClass {
        Int,
        Float,
        Imag,
    }

    #[inline(always)]
    const fn is_hex_prefixed(lit: &[u8]) -> bool {
        lit.len() >= 2 && lit[0] == b'0' && (lit[1] == b'x' || lit[1] == b'X')
    }

    /// Extends the token from the one or two bytes logos matched up to the end of the
    /// literal: digits, letters, underscores, one `.`, and a sign right after an exponent.
    pub fn lex_number(lex: &mut LogosLexer<'_, super::RawTok>) -> Result<(), LexErrorKind> {
        let start = lex.span().start;
        let src = lex.source().as_bytes();
        let mut i = lex.span().end;
        let mut seen_dot = src[start] == b'.';
        let mut seen_exp = false;

        while i < src.len() {
            let b = src[i];
            let hex = is_hex_prefixed(&src[start..i]);
            if b == b'.' && !seen_dot && !seen_exp {
                // `1..` never occurs in Go; `x[1:]` has no dot. Stop before `...`.
                if src.get(i + 1) == Some(&b'.') {
                    break;
                }
                seen_dot = true;
                i += 1;
                continue;
            }
            if (b == b'+' || b == b'-') && i > start {
                let prev = src[i - 1];
                let is_exp = if hex {
                    matches!(prev, b'p' | b'P')
                } else {
                    matches!(prev, b'e' | b'E')
                };
                if is_exp {
                    i += 1;
                    continue;
                }
                break;
            }
            if !is_number_continue(b) {
                break;
            }
            if (hex && matches!(b, b'p' | b'P')) || (!hex && matches!(b, b'e' | b'E')) {
                seen_exp = true;
            }
            i += 1;
        }

        lex.bump(i - lex.span().end);
        let lit = &src[start..i];
        if lit.ends_with(b"_") || matches!(lit.last(), Some(b'+' | b'-')) {
            return Err(LexErrorKind::InvalidNumber);
        }
        Ok(())
    }

    pub fn classify(lit: &[u8]) -> NumClass {
        if lit.ends_with(b"i") {
            return NumClass::Imag;
        }
        let float = if is_hex_prefixed(lit) {
            lit.iter().any(|&b| matches!(b, b'.' | b'p' | b'P'))
        } else {
            lit.iter().any(|&b| matches!(b, b'.' | b'e' | b'E'))
        };
        if float {
            NumClass::Float
        } else {
            NumClass::Int
        }
    }
}

// =============================================================================
// 3. Token Definition (RawTok)
// =============================================================================

#[repr(u8)]
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*", logos::skip)] _LineComment,
    #[token("/*", lex_block_comment)]
    BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    // Identifiers
    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    // Numbers (maximal munch in callback)
    #[regex(r"[0-9]|\.[0-9]", num::lex_number)] Number,

    // Strings / runes
    #[regex(r"`[^`]*`")] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'")] Rune,

    // Operators
    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,

    // Catch-all (lowest priority)
    #[regex(r".", priority = 0)] Error,
}

// =============================================================================
// 4. Lookup tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    Literal,
    Simple,
    Trivia,
}

macro_rules! gen_lookup_table {
    (bool, $size:expr, $($variant:ident),* $(,)?) => {{
        let mut table = [false; $size];
        $(table[RawTok::$variant as usize] = true;)*
        table
    }};
    ($enum:ty, $size:expr, $default:expr, $($variant:ident => $value:expr),* $(,)?) => {{
        let mut table = [$default; $size];
        $(table[RawTok::$variant as usize] = $value;)*
        table
    }};
}

const SEMI_INSERT_TABLE: [bool; 256] = gen_lookup_table!(
    bool,
    256,
    Ident,
    Number,
    Rune,
    String,
    RawString,
    KwBreak,
    KwContinue,
    KwFallthrough,
    KwReturn,
    Inc,
    Dec,
    RParen,
    RBrack,
    RBrace,
);

const TOKEN_KIND_TABLE: [TokKind; 256] = gen_lookup_table!(
    TokKind, 256, TokKind::Simple,
    Newline => TokKind::Trivia,
    _LineComment => TokKind::Trivia,
    BlockComment => TokKind::Trivia,
    Ident => TokKind::Literal,
    Number => TokKind::Literal,
    Rune => TokKind::Literal,
    String => TokKind::Literal,
    RawString => TokKind::Literal,
);

impl RawTok {
    #[inline(always)]
    const fn can_insert_semicolon(self) -> bool {
        SEMI_INSERT_TABLE[self as usize]
    }

    #[inline(always)]
    const fn kind(self) -> TokKind {
        TOKEN_KIND_TABLE[self as usize]
    }

    #[inline]
    fn to_token<'src>(self, slice: &'src str) -> Tok<'src> {
        if matches!(self.kind(), TokKind::Literal) {
            return match self {
                Self::Ident => Tok::Ident(slice),
                Self::Rune => Tok::RuneLit(slice),
                Self::String => Tok::StringLit(slice),
                Self::RawString => Tok::RawStringLit(slice),
                Self::Number => match num::classify(slice.as_bytes()) {
                    num::NumClass::Int => Tok::IntLit(slice),
                    num::NumClass::Float => Tok::FloatLit(slice),
                    num::NumClass::Imag => Tok::ImagLit(slice),
                },
                _ => Tok::Error,
            };
        }

        macro_rules! simple_tok {
            ($($raw:ident => $tok:ident),* $(,)?) => {
                match self {
                    $(Self::$raw => Tok::$tok,)*
                    _ => Tok::Error,
                }
            };
        }

        simple_tok! {
            KwBreak => KwBreak, KwCase => KwCase, KwChan => KwChan, KwConst => KwConst,
            KwContinue => KwContinue, KwDefault => KwDefault, KwDefer => KwDefer, KwElse => KwElse,
            KwFallthrough => KwFallthrough, KwFor => KwFor, KwFunc => KwFunc, KwGo => KwGo,
            KwGoto => KwGoto, KwIf => KwIf, KwImport => KwImport, KwInterface => KwInterface,
            KwMap => KwMap, KwPackage => KwPackage, KwRange => KwRange, KwReturn => KwReturn,
            KwSelect => KwSelect, KwStruct => KwStruct, KwSwitch => KwSwitch, KwType => KwType, KwVar => KwVar,

            Ellipsis => Ellipsis, ShlAssign => ShlAssign, ShrAssign => ShrAssign, AndNotAssign => AndNotAssign,
            AddAssign => AddAssign, SubAssign => SubAssign, MulAssign => MulAssign, DivAssign => DivAssign,
            ModAssign => ModAssign, AndAssign => AndAssign, OrAssign => OrAssign, XorAssign => XorAssign,
            Shl => Shl, Shr => Shr, AndNot => AndNot, LAnd => LAnd, LOr => LOr, EqEq => EqEq, NotEq => NotEq,
            Le => Le, Ge => Ge, Inc => Inc, Dec => Dec, Define => Define, Arrow => Arrow,
            Assign => Assign, Plus => Plus, Minus => Minus, Star => Star, Slash => Slash, Percent => Percent,
            Amp => Amp, Pipe => Pipe, Caret => Caret, Tilde => Tilde, Bang => Bang, Lt => Lt, Gt => Gt,

            LParen => LParen, RParen => RParen, LBrack => LBrack, RBrack => RBrack, LBrace => LBrace,
            RBrace => RBrace, Comma => Comma, Semi => Semi, Colon => Colon, Dot => Dot,
        }
    }
}

// =============================================================================
// 5. Public Token Definition (zero-copy)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators / Delimiters
    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
}

impl<'input> std::fmt::Display for Tok<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => write!(f, "{s:?}"),
            other => write!(f, "{:?}", other),
        }
    }
}

// =============================================================================
// 6. Lexer wrapper: semicolon insertion + diags
// =============================================================================

pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<(usize, Tok<'src>, usize)>,
    diags: Vec<Diag>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::with_capacity(16),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    #[inline]
    fn push_lex_diag(&mut self, kind: LexErrorKind, span: Range<usize>) {
        let span = Span::new(span.start, span.end);
        self.diags.push(LexError { kind, span }.diag());
    }

    #[inline]
    fn emit_semi_at(&mut self, pos: usize) {
        self.pending = Some((pos, Tok::Semi, pos));
    }

    #[inline]
    fn handle_trivia(&mut self, raw: RawTok, span: &Range<usize>, slice: &str) -> bool {
        match raw {
            RawTok::Newline => {
                if self.last_can_insert_semi {
                    self.last_can_insert_semi = false;
                    self.emit_semi_at(span.start);
                }
                true
            }
            RawTok::BlockComment => {
                if self.last_can_insert_semi {
                    if let Some(off) = first_newline_offset(slice) {
                        self.last_can_insert_semi = false;
                        self.emit_semi_at(span.start + off);
                    }
                }
                true
            }
            _ => false,
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = (usize, Tok<'src>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Injected ';' first.
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }

            if self.eof_done {
                return None;
            }

            match self.logos.next() {
                None => {
                    // Don't return yet: a trailing ';' may still be pending.
                    self.handle_eof();
                    continue;
                }

                Some(Err(kind)) => return self.handle_lex_error(kind),

                Some(Ok(raw)) => {
                    if let Some(item) = self.handle_raw_token(raw) {
                        return Some(item);
                    }
                }
            }
        }
    }
}

impl<'src> Lexer<'src> {
    #[inline]
    fn handle_eof(&mut self) {
        self.eof_done = true;

        if self.last_can_insert_semi {
            self.last_can_insert_semi = false;
            self.emit_semi_at(self.src_len);
        }
    }

    #[inline]
    fn handle_lex_error(&mut self, kind: LexErrorKind) -> Option<(usize, Tok<'src>, usize)> {
        let span = self.logos.span();
        self.push_lex_diag(kind, span.clone());
        self.last_can_insert_semi = false;
        Some((span.start, Tok::Error, span.end))
    }

    /// `None` means the token was trivia (or a leading BOM) and nothing is emitted.
    #[inline]
    fn handle_raw_token(&mut self, raw: RawTok) -> Option<(usize, Tok<'src>, usize)> {
        let span = self.logos.span();
        let slice = self.logos.slice();

        if raw == RawTok::Bom {
            if span.start == 0 {
                return None;
            }
            self.push_lex_diag(LexErrorKind::InvalidToken, span.clone());
            self.last_can_insert_semi = false;
            return Some((span.start, Tok::Error, span.end));
        }

        if self.handle_trivia(raw, &span, slice) {
            return None;
        }

        if raw == RawTok::Error {
            self.push_lex_diag(LexErrorKind::InvalidToken, span.clone());
            self.last_can_insert_semi = false;
            return Some((span.start, Tok::Error, span.end));
        }

        self.last_can_insert_semi = raw.can_insert_semicolon();
        let tok = raw.to_token(slice);
        Some((span.start, tok, span.end))
    }
}

/// Lexes the whole input. Tokens come with byte offsets; diagnostics are returned alongside.
pub fn tokenize(input: &str) -> (Vec<(usize, Tok<'_>, usize)>, Vec<Diag>) {
    let mut lexer = Lexer::new(input);
    let toks: Vec<_> = lexer.by_ref().collect();
    let diags = lexer.take_diags();
    (toks, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Tok<'_>> {
        tokenize(src).0.into_iter().map(|(_, t, _)| t).collect()
    }

    #[test]
    fn classifies_numbers() {
        assert_eq!(
            kinds("1 0x1F 1.5 .5 1e9 0x1p-2 2i 1_000"),
            vec![
                Tok::IntLit("1"),
                Tok::IntLit("0x1F"),
                Tok::FloatLit("1.5"),
                Tok::FloatLit(".5"),
                Tok::FloatLit("1e9"),
                Tok::FloatLit("0x1p-2"),
                Tok::ImagLit("2i"),
                Tok::IntLit("1_000"),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn number_stops_before_ellipsis_and_operators() {
        assert_eq!(
            kinds("a[1:]+2-3"),
            vec![
                Tok::Ident("a"),
                Tok::LBrack,
                Tok::IntLit("1"),
                Tok::Colon,
                Tok::RBrack,
                Tok::Plus,
                Tok::IntLit("2"),
                Tok::Minus,
                Tok::IntLit("3"),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn trailing_underscore_is_invalid() {
        let (toks, diags) = tokenize("1_");
        assert_eq!(toks[0].1, Tok::Error);
        assert_eq!(diags.len(), 1);
    }
}
