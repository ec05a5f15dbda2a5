//! Recursive-descent parser over the token stream produced by [`crate::lexer`].
//!
//! The parser stops at the first syntax error. `expr_lev` follows the usual Go scheme: it is
//! negative inside control clause headers, where `T {` opens a block rather than a composite
//! literal, and is bumped inside any bracketed context where the ambiguity disappears.

mod decl;
mod expr;
mod stmt;
mod types;

use std::mem::discriminant;

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::Tok;

pub(crate) type PResult<T> = Result<T, ParseError>;

pub struct Parser<'src> {
    src: &'src str,
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    prev_end: usize,
    expr_lev: i32,
    pub(crate) arena: AstArena,
    pub(crate) interner: Interner,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str, toks: Vec<(usize, Tok<'src>, usize)>) -> Self {
        Self {
            src,
            toks,
            pos: 0,
            prev_end: 0,
            expr_lev: 0,
            arena: AstArena::new(),
            interner: Interner::new(),
        }
    }

    pub fn into_parts(self) -> (AstArena, Interner) {
        (self.arena, self.interner)
    }

    /// `SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }`
    pub fn parse_file(&mut self) -> PResult<SourceFile> {
        let package_pos = self.expect(Tok::KwPackage, "`package`")?;
        let name = self.ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        while !self.at_eof() {
            let decl = match self.peek() {
                Tok::KwImport => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Import)?),
                Tok::KwConst => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Const)?),
                Tok::KwType => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Type)?),
                Tok::KwVar => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Var)?),
                Tok::KwFunc => TopLevelDecl::Func(self.func_decl()?),
                Tok::Semi => {
                    self.bump();
                    continue;
                }
                _ => return Err(self.unexpected("declaration")),
            };
            decls.push(decl);
            if !self.at_eof() {
                self.expect_semi()?;
            }
        }

        let decls = self.arena.list_top_decls(decls);
        Ok(SourceFile {
            package_pos,
            name,
            decls,
        })
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub(crate) fn peek(&self) -> Tok<'src> {
        self.peek_at(0)
    }

    #[inline]
    pub(crate) fn peek_at(&self, n: usize) -> Tok<'src> {
        self.toks
            .get(self.pos + n)
            .map(|t| t.1)
            .unwrap_or(Tok::Error)
    }

    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    /// Span of the current token, or an empty span at the end of input.
    #[inline]
    pub(crate) fn cur_span(&self) -> Span {
        match self.toks.get(self.pos) {
            Some(&(s, _, e)) => Span::new(s, e),
            None => Span::new(self.src.len(), self.src.len()),
        }
    }

    #[inline]
    pub(crate) fn cur_start(&self) -> usize {
        self.cur_span().start as usize
    }

    /// Span from `start` to the end of the last consumed token.
    #[inline]
    pub(crate) fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    #[inline]
    pub(crate) fn bump(&mut self) -> Span {
        let span = self.cur_span();
        if !self.at_eof() {
            self.pos += 1;
            self.prev_end = span.end as usize;
        }
        span
    }

    /// Same token kind, ignoring literal payloads.
    #[inline]
    pub(crate) fn at(&self, tok: Tok<'_>) -> bool {
        !self.at_eof() && discriminant(&self.peek()) == discriminant(&tok)
    }

    #[inline]
    pub(crate) fn eat(&mut self, tok: Tok<'_>) -> Option<Span> {
        if self.at(tok) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, tok: Tok<'_>, what: &str) -> PResult<Span> {
        match self.eat(tok) {
            Some(span) => Ok(span),
            None => Err(self.unexpected(what)),
        }
    }

    /// A `;` is optional before a closing `)` or `}`.
    pub(crate) fn expect_semi(&mut self) -> PResult<()> {
        match self.peek() {
            Tok::Semi if !self.at_eof() => {
                self.bump();
                Ok(())
            }
            Tok::RParen | Tok::RBrace if !self.at_eof() => Ok(()),
            _ if self.at_eof() => Ok(()),
            _ => Err(self.unexpected("`;` or newline")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        if self.at_eof() {
            return ParseError::new(
                self.cur_span(),
                format!("expected {expected}, found end of file"),
            );
        }
        ParseError::new(
            self.cur_span(),
            format!("expected {expected}, found {}", self.peek()),
        )
    }

    pub(crate) fn ident(&mut self) -> PResult<IdentName> {
        match self.peek() {
            Tok::Ident(name) if !self.at_eof() => {
                let pos = self.bump();
                let sym = self.interner.intern(name);
                Ok(IdentName { sym, pos })
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn ident_list(&mut self) -> PResult<Vec<IdentName>> {
        let mut names = vec![self.ident()?];
        while self.eat(Tok::Comma).is_some() {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    pub(crate) fn string_lit(&mut self) -> PResult<StringLit> {
        match self.peek() {
            Tok::StringLit(_) | Tok::RawStringLit(_) if !self.at_eof() => {
                Ok(StringLit { raw: self.bump() })
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    /// Runs `f` with a different expression level, restoring the old one afterwards.
    pub(crate) fn with_expr_lev<T>(
        &mut self,
        lev: i32,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = self.expr_lev;
        self.expr_lev = lev;
        let out = f(self);
        self.expr_lev = saved;
        out
    }

    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let lev = if self.expr_lev < 0 { 1 } else { self.expr_lev + 1 };
        self.with_expr_lev(lev, f)
    }

    pub(crate) fn alloc_expr(&mut self, expr: Expr, start: usize) -> ExprId {
        let span = self.span_from(start);
        self.arena.exprs.alloc(expr, span)
    }

    pub(crate) fn alloc_type(&mut self, typ: Type, start: usize) -> TypeId {
        let span = self.span_from(start);
        self.arena.types.alloc(typ, span)
    }

    pub(crate) fn alloc_stmt(&mut self, stmt: Stmt, start: usize) -> StmtId {
        let span = self.span_from(start);
        self.arena.stmts.alloc(stmt, span)
    }

    pub(crate) fn alloc_simple(&mut self, stmt: SimpleStmt, start: usize) -> SimpleStmtId {
        let span = self.span_from(start);
        self.arena.simple_stmts.alloc(stmt, span)
    }
}
