use super::{PResult, Parser};
use crate::ast::*;
use crate::lexer::Tok;
use crate::parser_support::{resolve_param_list, ParamDecl};

impl<'src> Parser<'src> {
    /// `import`, `const`, `type` or `var`, either a single spec or a parenthesized group.
    pub(crate) fn gen_decl(&mut self, kind: GenDeclKind) -> PResult<DeclId> {
        let start = self.cur_start();
        let kw_pos = self.bump();

        let mut specs = Vec::new();
        let (l_paren, r_paren) = if let Some(l_paren) = self.eat(Tok::LParen) {
            let mut iota = 0u32;
            while !self.at(Tok::RParen) && !self.at_eof() {
                specs.push(self.spec(kind, iota)?);
                iota += 1;
                self.expect_semi()?;
            }
            let r_paren = self.expect(Tok::RParen, "`)`")?;
            (Some(l_paren), Some(r_paren))
        } else {
            specs.push(self.spec(kind, 0)?);
            (None, None)
        };

        let specs = self.arena.list_specs(specs);
        let decl = GenDecl {
            kw_pos,
            kind,
            l_paren,
            specs,
            r_paren,
        };
        let span = self.span_from(start);
        Ok(self.arena.decls.alloc(decl, span))
    }

    fn spec(&mut self, kind: GenDeclKind, iota: u32) -> PResult<Spec> {
        match kind {
            GenDeclKind::Import => self.import_spec().map(Spec::Import),
            GenDeclKind::Type => self.type_spec().map(Spec::Type),
            GenDeclKind::Const | GenDeclKind::Var => {
                self.value_spec(kind, iota).map(Spec::Value)
            }
        }
    }

    fn import_spec(&mut self) -> PResult<ImportSpec> {
        let name = match self.peek() {
            Tok::Dot => Some(ImportName::Dot(self.bump())),
            Tok::Ident("_") => Some(ImportName::Blank(self.bump())),
            Tok::Ident(_) => Some(ImportName::Name(self.ident()?)),
            _ => None,
        };
        let path = self.string_lit()?;
        Ok(ImportSpec { name, path })
    }

    fn type_spec(&mut self) -> PResult<TypeSpec> {
        let name = self.ident()?;
        if self.at(Tok::LBrack) && matches!(self.peek_at(1), Tok::Ident(_)) {
            if !matches!(self.peek_at(2), Tok::RBrack) {
                return Err(self.unexpected("type (type parameters are not supported)"));
            }
        }
        let assign_pos = self.eat(Tok::Assign);
        let typ = self.parse_type()?;
        Ok(TypeSpec {
            name,
            assign_pos,
            typ,
            alias: assign_pos.is_some(),
        })
    }

    fn value_spec(&mut self, kind: GenDeclKind, iota: u32) -> PResult<ValueSpec> {
        let names = self.ident_list()?;
        let typ = if !self.at(Tok::Assign) && !self.at(Tok::Semi) && !self.at(Tok::RParen) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.eat(Tok::Assign).is_some() {
            self.expr_list()?
        } else {
            if kind == GenDeclKind::Var && typ.is_none() {
                return Err(self.unexpected("type or `=`"));
            }
            Vec::new()
        };
        let names = self.arena.list_ident_names(names);
        let values = self.arena.list_exprs(values);
        Ok(ValueSpec {
            names,
            typ,
            values,
            iota,
        })
    }

    pub(crate) fn func_decl(&mut self) -> PResult<FuncDeclId> {
        let start = self.cur_start();
        let func_pos = self.expect(Tok::KwFunc, "`func`")?;
        let recv = if self.at(Tok::LParen) {
            Some(self.receiver()?)
        } else {
            None
        };
        let name = self.ident()?;
        if self.at(Tok::LBrack) {
            return Err(self.unexpected("`(` (type parameters are not supported)"));
        }
        let signature = self.signature()?;
        let body = if self.at(Tok::LBrace) {
            Some(self.with_expr_lev(0, |p| p.block())?)
        } else {
            None
        };
        let decl = FuncDecl {
            func_pos,
            recv,
            name,
            signature,
            body,
        };
        let span = self.span_from(start);
        Ok(self.arena.funcs.alloc(decl, span))
    }

    fn receiver(&mut self) -> PResult<Receiver> {
        let l_paren = self.bump();
        let name = match (self.peek(), self.peek_at(1)) {
            (Tok::Ident(_), Tok::RParen | Tok::Dot | Tok::LBrack) => None,
            (Tok::Ident(_), _) => Some(self.ident()?),
            _ => None,
        };
        let typ = self.parse_type()?;
        let r_paren = self.expect(Tok::RParen, "`)`")?;
        Ok(Receiver {
            l_paren,
            name,
            typ,
            r_paren,
        })
    }

    /// `Signature = Parameters [ Result ]`
    pub(crate) fn signature(&mut self) -> PResult<SignatureId> {
        let start = self.cur_start();
        let params = self.parameters()?;
        let results = if self.at(Tok::LParen) {
            Some(Results::Params(self.parameters()?))
        } else if self.at_type_start() {
            Some(Results::Type(self.parse_type()?))
        } else {
            None
        };
        let span = self.span_from(start);
        Ok(self
            .arena
            .signatures
            .alloc(Signature { params, results }, span))
    }

    pub(crate) fn parameters(&mut self) -> PResult<FieldList> {
        let l_paren = self.expect(Tok::LParen, "`(`")?;
        let decls = self.nested(|p| {
            let mut decls = Vec::new();
            while !p.at(Tok::RParen) && !p.at_eof() {
                decls.push(p.param_decl()?);
                if p.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            Ok(decls)
        })?;
        let r_paren = self.expect(Tok::RParen, "`)`")?;
        let fields = resolve_param_list(&mut self.arena, decls);
        let fields = self.arena.list_fields(fields);
        Ok(FieldList {
            l_paren,
            fields,
            r_paren,
        })
    }

    fn param_decl(&mut self) -> PResult<ParamDecl> {
        let start = self.cur_start();
        match (self.peek(), self.peek_at(1)) {
            (Tok::Ident(_), Tok::Comma | Tok::RParen) => {
                let name = self.ident()?;
                Ok(ParamDecl {
                    names: vec![name],
                    ellipsis_pos: None,
                    typ: None,
                    span: name.pos,
                })
            }
            (Tok::Ident(_), Tok::Dot) => {
                let typ = self.parse_type()?;
                Ok(ParamDecl {
                    names: Vec::new(),
                    ellipsis_pos: None,
                    typ: Some(typ),
                    span: self.span_from(start),
                })
            }
            (Tok::Ident(_), _) => {
                let name = self.ident()?;
                let ellipsis_pos = self.eat(Tok::Ellipsis);
                let typ = self.parse_type()?;
                Ok(ParamDecl {
                    names: vec![name],
                    ellipsis_pos,
                    typ: Some(typ),
                    span: self.span_from(start),
                })
            }
            _ => {
                let ellipsis_pos = self.eat(Tok::Ellipsis);
                let typ = self.parse_type()?;
                Ok(ParamDecl {
                    names: Vec::new(),
                    ellipsis_pos,
                    typ: Some(typ),
                    span: self.span_from(start),
                })
            }
        }
    }
}
