use super::{PResult, Parser};
use crate::ast::*;
use crate::lexer::Tok;

impl<'src> Parser<'src> {
    pub(crate) fn expr(&mut self) -> PResult<ExprId> {
        self.binary_expr(1)
    }

    pub(crate) fn expr_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = vec![self.expr()?];
        while self.eat(Tok::Comma).is_some() {
            list.push(self.expr()?);
        }
        Ok(list)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        if self.at_eof() {
            return None;
        }
        Some(match self.peek() {
            Tok::LOr => BinaryOp::LOr,
            Tok::LAnd => BinaryOp::LAnd,
            Tok::EqEq => BinaryOp::Eq,
            Tok::NotEq => BinaryOp::Ne,
            Tok::Lt => BinaryOp::Lt,
            Tok::Le => BinaryOp::Le,
            Tok::Gt => BinaryOp::Gt,
            Tok::Ge => BinaryOp::Ge,
            Tok::Plus => BinaryOp::Add,
            Tok::Minus => BinaryOp::Sub,
            Tok::Pipe => BinaryOp::Or,
            Tok::Caret => BinaryOp::Xor,
            Tok::Star => BinaryOp::Mul,
            Tok::Slash => BinaryOp::Div,
            Tok::Percent => BinaryOp::Mod,
            Tok::Shl => BinaryOp::Shl,
            Tok::Shr => BinaryOp::Shr,
            Tok::Amp => BinaryOp::And,
            Tok::AndNot => BinaryOp::AndNot,
            _ => return None,
        })
    }

    /// Precedence climbing; all binary operators are left-associative.
    fn binary_expr(&mut self, min_prec: u8) -> PResult<ExprId> {
        let start = self.cur_start();
        let mut left = self.unary_expr()?;
        while let Some(op) = self.binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.bump();
            let right = self.binary_expr(prec + 1)?;
            left = self.alloc_expr(Expr::Binary { left, op, right }, start);
        }
        Ok(left)
    }

    pub(crate) fn unary_expr(&mut self) -> PResult<ExprId> {
        let start = self.cur_start();
        let op = match self.peek() {
            Tok::Plus => UnaryOp::Add,
            Tok::Minus => UnaryOp::Sub,
            Tok::Bang => UnaryOp::Not,
            Tok::Caret => UnaryOp::Xor,
            Tok::Star => UnaryOp::Deref,
            Tok::Amp => UnaryOp::Addr,
            Tok::Arrow => {
                // `<-chan T` is a type, `<-ch` a receive.
                if matches!(self.peek_at(1), Tok::KwChan) {
                    let typ = self.parse_type()?;
                    let x = self.alloc_expr(Expr::Type(typ), start);
                    return self.primary_suffix(x, start);
                }
                UnaryOp::Recv
            }
            _ => return self.primary_expr(),
        };
        if self.at_eof() {
            return Err(self.unexpected("expression"));
        }
        self.bump();
        let expr = self.unary_expr()?;
        Ok(self.alloc_expr(Expr::Unary { op, expr }, start))
    }

    fn primary_expr(&mut self) -> PResult<ExprId> {
        let start = self.cur_start();
        let x = self.operand()?;
        self.primary_suffix(x, start)
    }

    fn operand(&mut self) -> PResult<ExprId> {
        let start = self.cur_start();
        if self.at_eof() {
            return Err(self.unexpected("expression"));
        }
        let lit_kind = match self.peek() {
            Tok::IntLit(_) => Some(BasicLitKind::Int),
            Tok::FloatLit(_) => Some(BasicLitKind::Float),
            Tok::ImagLit(_) => Some(BasicLitKind::Imag),
            Tok::RuneLit(_) => Some(BasicLitKind::Rune),
            Tok::StringLit(_) | Tok::RawStringLit(_) => Some(BasicLitKind::String),
            _ => None,
        };
        if let Some(kind) = lit_kind {
            let raw = self.bump();
            return Ok(self.alloc_expr(Expr::BasicLit(BasicLit { kind, raw }), start));
        }

        match self.peek() {
            Tok::Ident(_) => {
                let name = self.ident()?;
                Ok(self.alloc_expr(Expr::Ident(name.sym), start))
            }
            Tok::LParen => {
                self.bump();
                let inner = self.nested(|p| p.expr())?;
                self.expect(Tok::RParen, "`)`")?;
                Ok(self.alloc_expr(Expr::Paren(inner), start))
            }
            Tok::KwFunc => {
                self.bump();
                let sig = self.signature()?;
                if self.at(Tok::LBrace) {
                    let body = self.with_expr_lev(0, |p| p.block())?;
                    Ok(self.alloc_expr(Expr::FuncLit { sig, body }, start))
                } else {
                    let typ = self.alloc_type(Type::Func { sig }, start);
                    Ok(self.alloc_expr(Expr::Type(typ), start))
                }
            }
            Tok::LBrack | Tok::KwMap | Tok::KwChan | Tok::KwStruct | Tok::KwInterface => {
                let typ = self.parse_type()?;
                Ok(self.alloc_expr(Expr::Type(typ), start))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn primary_suffix(&mut self, mut x: ExprId, start: usize) -> PResult<ExprId> {
        loop {
            match self.peek() {
                Tok::Dot if !self.at_eof() => {
                    self.bump();
                    if self.eat(Tok::LParen).is_some() {
                        let typ = if self.eat(Tok::KwType).is_some() {
                            None
                        } else {
                            Some(self.nested(|p| p.parse_type())?)
                        };
                        self.expect(Tok::RParen, "`)`")?;
                        x = self.alloc_expr(Expr::TypeAssert { expr: x, typ }, start);
                    } else {
                        let sel = self.ident()?;
                        x = self.alloc_expr(Expr::Selector { expr: x, sel }, start);
                    }
                }
                Tok::LBrack if !self.at_eof() => {
                    self.bump();
                    x = self.nested(|p| p.index_or_slice(x, start))?;
                }
                Tok::LParen if !self.at_eof() => {
                    self.bump();
                    let (args, ellipsis) = self.nested(|p| {
                        let mut args = Vec::new();
                        let mut ellipsis = None;
                        while !p.at(Tok::RParen) && !p.at_eof() {
                            args.push(p.expr()?);
                            if let Some(span) = p.eat(Tok::Ellipsis) {
                                ellipsis = Some(span);
                            }
                            if p.eat(Tok::Comma).is_none() {
                                break;
                            }
                        }
                        Ok((args, ellipsis))
                    })?;
                    self.expect(Tok::RParen, "`)`")?;
                    let args = self.arena.list_exprs(args);
                    x = self.alloc_expr(
                        Expr::Call {
                            callee: x,
                            args,
                            ellipsis,
                        },
                        start,
                    );
                }
                Tok::LBrace if !self.at_eof() => {
                    let Some(typ) = self.literal_type(x) else {
                        return Ok(x);
                    };
                    let lit = self.literal_value()?;
                    x = self.alloc_expr(
                        Expr::CompositeLit {
                            typ: Some(typ),
                            lit,
                        },
                        start,
                    );
                }
                _ => return Ok(x),
            }
        }
    }

    fn index_or_slice(&mut self, base: ExprId, start: usize) -> PResult<ExprId> {
        let lo = if self.at(Tok::Colon) {
            None
        } else {
            Some(self.expr()?)
        };

        if self.eat(Tok::Colon).is_some() {
            let hi = if self.at(Tok::Colon) || self.at(Tok::RBrack) {
                None
            } else {
                Some(self.expr()?)
            };
            let max = if self.eat(Tok::Colon).is_some() {
                Some(self.expr()?)
            } else {
                None
            };
            self.expect(Tok::RBrack, "`]`")?;
            return Ok(self.alloc_expr(
                Expr::Slice {
                    expr: base,
                    lo,
                    hi,
                    max,
                },
                start,
            ));
        }

        let mut indices = Vec::new();
        indices.extend(lo);
        while self.eat(Tok::Comma).is_some() {
            if self.at(Tok::RBrack) {
                break;
            }
            indices.push(self.expr()?);
        }
        self.expect(Tok::RBrack, "`]`")?;
        let indices = self.arena.list_exprs(indices);
        Ok(self.alloc_expr(Expr::Index { base, indices }, start))
    }

    /// The type of `x{...}` when `x` can head a composite literal here. A bare type name
    /// only qualifies outside control clause headers.
    fn literal_type(&mut self, x: ExprId) -> Option<TypeId> {
        let expr = self.arena.exprs[x];
        match expr {
            Expr::Type(t) => match self.arena.types[t] {
                Type::Array { .. } | Type::Slice { .. } | Type::Map { .. } | Type::Struct { .. } => {
                    Some(t)
                }
                _ => None,
            },
            Expr::Ident(_) | Expr::Selector { .. } if self.expr_lev >= 0 => self.expr_to_type(x),
            _ => None,
        }
    }

    /// Reinterprets `T` or `pkg.T` as a type node.
    pub(crate) fn expr_to_type(&mut self, x: ExprId) -> Option<TypeId> {
        let span = self.arena.exprs.span(x);
        let expr = self.arena.exprs[x];
        let typ = match expr {
            Expr::Ident(sym) => Type::Named {
                pkg: None,
                name: IdentName { sym, pos: span },
            },
            Expr::Selector { expr: base, sel } => match self.arena.exprs[base] {
                Expr::Ident(pkg) => Type::Named {
                    pkg: Some(IdentName {
                        sym: pkg,
                        pos: self.arena.exprs.span(base),
                    }),
                    name: sel,
                },
                _ => return None,
            },
            Expr::Type(t) => return Some(t),
            _ => return None,
        };
        Some(self.arena.types.alloc(typ, span))
    }

    /// `LiteralValue = "{" [ ElementList [ "," ] ] "}"`
    pub(crate) fn literal_value(&mut self) -> PResult<LiteralValue> {
        let l_brace = self.expect(Tok::LBrace, "`{`")?;
        let elements = self.nested(|p| {
            let mut elems = Vec::new();
            while !p.at(Tok::RBrace) && !p.at_eof() {
                elems.push(p.keyed_element()?);
                if p.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            Ok(elems)
        })?;
        let r_brace = self.expect(Tok::RBrace, "`}` or `,`")?;
        let elements = self.arena.list_keyed_elems(elements);
        Ok(LiteralValue {
            l_brace,
            elements,
            r_brace,
        })
    }

    fn keyed_element(&mut self) -> PResult<KeyedElement> {
        let first = self.element()?;
        if let Some(colon_pos) = self.eat(Tok::Colon) {
            let value = self.element()?;
            return Ok(KeyedElement {
                key: Some(first),
                colon_pos: Some(colon_pos),
                value,
            });
        }
        Ok(KeyedElement {
            key: None,
            colon_pos: None,
            value: first,
        })
    }

    /// An element or key; a bare `{...}` is a literal whose type is implied.
    fn element(&mut self) -> PResult<ExprId> {
        if self.at(Tok::LBrace) {
            let start = self.cur_start();
            let lit = self.literal_value()?;
            return Ok(self.alloc_expr(Expr::CompositeLit { typ: None, lit }, start));
        }
        self.expr()
    }
}
