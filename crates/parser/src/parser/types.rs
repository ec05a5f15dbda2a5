use super::{PResult, Parser};
use crate::ast::*;
use crate::lexer::Tok;

impl<'src> Parser<'src> {
    pub(crate) fn at_type_start(&self) -> bool {
        !self.at_eof()
            && matches!(
                self.peek(),
                Tok::Ident(_)
                    | Tok::LBrack
                    | Tok::KwStruct
                    | Tok::Star
                    | Tok::KwFunc
                    | Tok::KwInterface
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::LParen
                    | Tok::Arrow
            )
    }

    pub(crate) fn parse_type(&mut self) -> PResult<TypeId> {
        let start = self.cur_start();
        let typ = match self.peek() {
            Tok::Ident(_) if !self.at_eof() => return self.type_name(),
            Tok::Star => {
                self.bump();
                let elem = self.parse_type()?;
                Type::Pointer { elem }
            }
            Tok::LBrack => {
                self.bump();
                if self.eat(Tok::RBrack).is_some() {
                    let elem = self.parse_type()?;
                    Type::Slice { elem }
                } else {
                    let len = if let Some(span) = self.eat(Tok::Ellipsis) {
                        ArrayLen::Ellipsis(span)
                    } else {
                        ArrayLen::Expr(self.nested(|p| p.expr())?)
                    };
                    self.expect(Tok::RBrack, "`]`")?;
                    let elem = self.parse_type()?;
                    Type::Array { len, elem }
                }
            }
            Tok::KwMap => {
                self.bump();
                self.expect(Tok::LBrack, "`[`")?;
                let key = self.nested(|p| p.parse_type())?;
                self.expect(Tok::RBrack, "`]`")?;
                let val = self.parse_type()?;
                Type::Map { key, val }
            }
            Tok::KwChan => {
                self.bump();
                let dir = if self.eat(Tok::Arrow).is_some() {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Type::Chan { dir, elem }
            }
            Tok::Arrow => {
                self.bump();
                self.expect(Tok::KwChan, "`chan`")?;
                let elem = self.parse_type()?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    elem,
                }
            }
            Tok::KwStruct => return self.struct_type(),
            Tok::KwInterface => return self.interface_type(),
            Tok::KwFunc => {
                self.bump();
                let sig = self.signature()?;
                Type::Func { sig }
            }
            Tok::LParen => {
                self.bump();
                let typ = self.nested(|p| p.parse_type())?;
                self.expect(Tok::RParen, "`)`")?;
                Type::Paren { typ }
            }
            _ => return Err(self.unexpected("type")),
        };
        Ok(self.alloc_type(typ, start))
    }

    /// `TypeName = identifier | PackageName "." identifier`
    pub(crate) fn type_name(&mut self) -> PResult<TypeId> {
        let start = self.cur_start();
        let first = self.ident()?;
        let typ = if self.at(Tok::Dot) && matches!(self.peek_at(1), Tok::Ident(_)) {
            self.bump();
            let name = self.ident()?;
            Type::Named {
                pkg: Some(first),
                name,
            }
        } else {
            Type::Named {
                pkg: None,
                name: first,
            }
        };
        if self.at(Tok::LBrack) && self.expr_lev >= 0 && self.looks_like_type_args() {
            return Err(self.unexpected("type (generic instantiation is not supported)"));
        }
        Ok(self.alloc_type(typ, start))
    }

    /// `Name[` followed by a type-only token is an instantiation, not an array length.
    fn looks_like_type_args(&self) -> bool {
        matches!(
            self.peek_at(1),
            Tok::KwMap | Tok::KwChan | Tok::KwStruct | Tok::KwInterface | Tok::Star
        )
    }

    fn struct_type(&mut self) -> PResult<TypeId> {
        let start = self.cur_start();
        self.bump();
        self.expect(Tok::LBrace, "`{`")?;
        let fields = self.nested(|p| {
            let mut fields = Vec::new();
            while !p.at(Tok::RBrace) && !p.at_eof() {
                fields.push(p.field_decl()?);
                p.expect_semi()?;
            }
            Ok(fields)
        })?;
        self.expect(Tok::RBrace, "`}`")?;
        let fields = self.arena.list_fields(fields);
        Ok(self.alloc_type(Type::Struct { fields }, start))
    }

    /// `FieldDecl = (IdentifierList Type | EmbeddedField) [ Tag ]`
    fn field_decl(&mut self) -> PResult<FieldId> {
        let start = self.cur_start();
        let embedded = match (self.peek(), self.peek_at(1)) {
            (Tok::Star, _) => true,
            (Tok::Ident(_), Tok::Dot) => true,
            (Tok::Ident(_), Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_)) => {
                true
            }
            _ => false,
        };

        let (names, typ) = if embedded {
            (ListRef::EMPTY, self.parse_type()?)
        } else {
            let names = self.ident_list()?;
            let typ = self.parse_type()?;
            (self.arena.list_ident_names(names), typ)
        };

        let tag = match self.peek() {
            Tok::StringLit(_) | Tok::RawStringLit(_) if !self.at_eof() => {
                Some(self.string_lit()?)
            }
            _ => None,
        };

        let field = Field {
            names,
            ellipsis_pos: None,
            typ,
            tag,
            is_embed: embedded,
        };
        let span = self.span_from(start);
        Ok(self.arena.fields.alloc(field, span))
    }

    fn interface_type(&mut self) -> PResult<TypeId> {
        let start = self.cur_start();
        self.bump();
        self.expect(Tok::LBrace, "`{`")?;
        let elems = self.nested(|p| {
            let mut elems = Vec::new();
            while !p.at(Tok::RBrace) && !p.at_eof() {
                elems.push(p.interface_elem()?);
                p.expect_semi()?;
            }
            Ok(elems)
        })?;
        self.expect(Tok::RBrace, "`}`")?;
        let elems = self.arena.list_interface_elems(elems);
        Ok(self.alloc_type(Type::Interface { elems }, start))
    }

    fn interface_elem(&mut self) -> PResult<InterfaceElem> {
        if let (Tok::Ident(_), Tok::LParen) = (self.peek(), self.peek_at(1)) {
            let name = self.ident()?;
            let sig = self.signature()?;
            return Ok(InterfaceElem::Method { name, sig });
        }
        let mut terms = vec![self.type_term()?];
        while self.eat(Tok::Pipe).is_some() {
            terms.push(self.type_term()?);
        }
        let terms = self.arena.list_type_terms(terms);
        Ok(InterfaceElem::TypeElem { terms })
    }

    fn type_term(&mut self) -> PResult<TypeTerm> {
        let tilde = self.eat(Tok::Tilde).is_some();
        let typ = self.parse_type()?;
        Ok(TypeTerm { tilde, typ })
    }
}
