use super::{PResult, Parser};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::Tok;

/// What a `for` header's first simple statement turned out to be.
enum Header {
    Simple(SimpleStmtId),
    Range(RangeLhs, Span, ExprId),
}

impl<'src> Parser<'src> {
    /// `Block = "{" StatementList "}"`
    pub(crate) fn block(&mut self) -> PResult<Block> {
        let l_brace = self.expect(Tok::LBrace, "`{`")?;
        let stmts = self.stmt_list()?;
        let r_brace = self.expect(Tok::RBrace, "`}`")?;
        Ok(Block {
            l_brace,
            stmts,
            r_brace,
        })
    }

    fn stmt_list(&mut self) -> PResult<ListRef<StmtId>> {
        let mut stmts = Vec::new();
        while !self.at_eof()
            && !matches!(self.peek(), Tok::RBrace | Tok::KwCase | Tok::KwDefault)
        {
            if self.eat(Tok::Semi).is_some() {
                continue;
            }
            stmts.push(self.stmt()?);
            self.expect_semi()?;
        }
        Ok(self.arena.list_stmts(stmts))
    }

    fn stmt(&mut self) -> PResult<StmtId> {
        let start = self.cur_start();
        let stmt = match self.peek() {
            Tok::KwVar => Stmt::Decl(self.gen_decl(GenDeclKind::Var)?),
            Tok::KwConst => Stmt::Decl(self.gen_decl(GenDeclKind::Const)?),
            Tok::KwType => Stmt::Decl(self.gen_decl(GenDeclKind::Type)?),
            Tok::Ident(_) if matches!(self.peek_at(1), Tok::Colon) => {
                let label = self.ident()?;
                let colon_pos = self.bump();
                let stmt = if self.at(Tok::RBrace) {
                    let span = self.cur_span();
                    let empty = self.arena.simple_stmts.alloc(SimpleStmt::Empty(span), span);
                    self.arena.stmts.alloc(Stmt::Simple(empty), span)
                } else {
                    self.stmt()?
                };
                Stmt::Labeled {
                    label,
                    colon_pos,
                    stmt,
                }
            }
            Tok::KwGo => {
                let go_pos = self.bump();
                let call = self.call_expr("`go`")?;
                Stmt::Go { go_pos, call }
            }
            Tok::KwDefer => {
                let defer_pos = self.bump();
                let call = self.call_expr("`defer`")?;
                Stmt::Defer { defer_pos, call }
            }
            Tok::KwReturn => {
                let return_pos = self.bump();
                let results = if self.at(Tok::Semi) || self.at(Tok::RBrace) || self.at_eof() {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                let results = self.arena.list_exprs(results);
                Stmt::Return {
                    return_pos,
                    results,
                }
            }
            Tok::KwBreak => {
                self.bump();
                Stmt::Branch(BranchStmt::Break(self.opt_label()?))
            }
            Tok::KwContinue => {
                self.bump();
                Stmt::Branch(BranchStmt::Continue(self.opt_label()?))
            }
            Tok::KwGoto => {
                self.bump();
                Stmt::Branch(BranchStmt::Goto(self.ident()?))
            }
            Tok::KwFallthrough => {
                self.bump();
                Stmt::Branch(BranchStmt::Fallthrough)
            }
            Tok::LBrace => Stmt::Block(self.block()?),
            Tok::KwIf => return self.if_stmt(),
            Tok::KwFor => return self.for_stmt(),
            Tok::KwSwitch => return self.switch_stmt(),
            Tok::KwSelect => return self.select_stmt(),
            _ => Stmt::Simple(self.simple_stmt()?),
        };
        Ok(self.alloc_stmt(stmt, start))
    }

    fn opt_label(&mut self) -> PResult<Option<IdentName>> {
        if matches!(self.peek(), Tok::Ident(_)) && !self.at_eof() {
            Ok(Some(self.ident()?))
        } else {
            Ok(None)
        }
    }

    fn call_expr(&mut self, what: &str) -> PResult<ExprId> {
        let span = self.cur_span();
        let x = self.expr()?;
        match self.arena.exprs[x] {
            Expr::Call { .. } => Ok(x),
            _ => Err(ParseError::new(
                span,
                format!("expression in {what} must be function call"),
            )),
        }
    }

    pub(crate) fn simple_stmt(&mut self) -> PResult<SimpleStmtId> {
        match self.simple_stmt_or_range(false)? {
            Header::Simple(id) => Ok(id),
            Header::Range(_, span, _) => Err(ParseError::new(span, "unexpected `range`")),
        }
    }

    fn simple_stmt_or_range(&mut self, range_ok: bool) -> PResult<Header> {
        let start = self.cur_start();
        if range_ok && self.at(Tok::KwRange) {
            let range_pos = self.bump();
            let expr = self.expr()?;
            return Ok(Header::Range(
                RangeLhs::Assign {
                    exprs: ListRef::EMPTY,
                },
                range_pos,
                expr,
            ));
        }

        let lhs = self.expr_list()?;

        let assign_op = match self.peek() {
            Tok::Assign => Some(AssignOp::Assign),
            Tok::AddAssign => Some(AssignOp::AddAssign),
            Tok::SubAssign => Some(AssignOp::SubAssign),
            Tok::MulAssign => Some(AssignOp::MulAssign),
            Tok::DivAssign => Some(AssignOp::DivAssign),
            Tok::ModAssign => Some(AssignOp::ModAssign),
            Tok::AndAssign => Some(AssignOp::AndAssign),
            Tok::OrAssign => Some(AssignOp::OrAssign),
            Tok::XorAssign => Some(AssignOp::XorAssign),
            Tok::ShlAssign => Some(AssignOp::ShlAssign),
            Tok::ShrAssign => Some(AssignOp::ShrAssign),
            Tok::AndNotAssign => Some(AssignOp::AndNotAssign),
            _ => None,
        };

        let stmt = if self.at_eof() {
            self.single_expr_stmt(&lhs)?
        } else if let Some(op) = assign_op {
            let op_pos = self.bump();
            if range_ok && op == AssignOp::Assign && self.at(Tok::KwRange) {
                let range_pos = self.bump();
                let expr = self.expr()?;
                let exprs = self.arena.list_exprs(lhs);
                return Ok(Header::Range(RangeLhs::Assign { exprs }, range_pos, expr));
            }
            let rhs = self.expr_list()?;
            let lhs = self.arena.list_exprs(lhs);
            let rhs = self.arena.list_exprs(rhs);
            SimpleStmt::Assign {
                lhs,
                op,
                op_pos,
                rhs,
            }
        } else if self.at(Tok::Define) {
            let op_pos = self.bump();
            let names = self.lhs_idents(&lhs)?;
            if range_ok && self.at(Tok::KwRange) {
                let range_pos = self.bump();
                let expr = self.expr()?;
                let idents = self.arena.list_ident_names(names);
                return Ok(Header::Range(RangeLhs::Def { idents }, range_pos, expr));
            }
            let values = self.expr_list()?;
            let names = self.arena.list_ident_names(names);
            let values = self.arena.list_exprs(values);
            SimpleStmt::ShortVarDecl {
                names,
                op_pos,
                values,
            }
        } else if self.at(Tok::Arrow) {
            let chan = self.single(&lhs)?;
            let op_pos = self.bump();
            let value = self.expr()?;
            SimpleStmt::Send {
                chan,
                op_pos,
                value,
            }
        } else if self.at(Tok::Inc) || self.at(Tok::Dec) {
            let expr = self.single(&lhs)?;
            let op = if self.at(Tok::Inc) {
                IncDecOp::Inc
            } else {
                IncDecOp::Dec
            };
            let op_pos = self.bump();
            SimpleStmt::IncDec { expr, op, op_pos }
        } else {
            self.single_expr_stmt(&lhs)?
        };

        Ok(Header::Simple(self.alloc_simple(stmt, start)))
    }

    fn single(&self, lhs: &[ExprId]) -> PResult<ExprId> {
        match lhs {
            [x] => Ok(*x),
            _ => Err(ParseError::new(self.cur_span(), "expected 1 expression")),
        }
    }

    fn single_expr_stmt(&self, lhs: &[ExprId]) -> PResult<SimpleStmt> {
        self.single(lhs).map(SimpleStmt::Expr)
    }

    fn lhs_idents(&self, lhs: &[ExprId]) -> PResult<Vec<IdentName>> {
        lhs.iter()
            .map(|&x| match self.arena.exprs[x] {
                Expr::Ident(sym) => Ok(IdentName {
                    sym,
                    pos: self.arena.exprs.span(x),
                }),
                _ => Err(ParseError::new(
                    self.arena.exprs.span(x),
                    "non-name on left side of :=",
                )),
            })
            .collect()
    }

    /// Parses a header statement with composite literals of bare type names disabled.
    fn header<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.with_expr_lev(-1, f)
    }

    fn if_stmt(&mut self) -> PResult<StmtId> {
        let start = self.cur_start();
        let if_pos = self.bump();
        let (init, cond) = self.header(|p| {
            if p.at(Tok::LBrace) {
                return Err(p.unexpected("condition"));
            }
            let init = if p.at(Tok::Semi) {
                None
            } else {
                Some(p.simple_stmt()?)
            };
            if p.eat(Tok::Semi).is_some() {
                let cond = p.expr()?;
                return Ok((init, cond));
            }
            match init.map(|id| p.arena.simple_stmts[id]) {
                Some(SimpleStmt::Expr(cond)) => Ok((None, cond)),
                _ => Err(p.unexpected("condition")),
            }
        })?;
        let then_block = self.block()?;
        let else_stmt = if self.eat(Tok::KwElse).is_some() {
            match self.peek() {
                Tok::KwIf => Some(self.if_stmt()?),
                Tok::LBrace => {
                    let s = self.cur_start();
                    let block = self.block()?;
                    Some(self.alloc_stmt(Stmt::Block(block), s))
                }
                _ => return Err(self.unexpected("`if` or `{`")),
            }
        } else {
            None
        };
        Ok(self.alloc_stmt(
            Stmt::If {
                if_pos,
                init,
                cond,
                then_block,
                else_stmt,
            },
            start,
        ))
    }

    fn for_stmt(&mut self) -> PResult<StmtId> {
        let start = self.cur_start();
        let for_pos = self.bump();
        let kind = self.header(|p| {
            if p.at(Tok::LBrace) {
                return Ok(ForKind::Infinite);
            }
            let first = if p.at(Tok::Semi) {
                None
            } else {
                match p.simple_stmt_or_range(true)? {
                    Header::Range(lhs, range_pos, expr) => {
                        let lhs = match lhs {
                            RangeLhs::Assign { exprs } if exprs.is_empty() => None,
                            other => Some(other),
                        };
                        return Ok(ForKind::Range {
                            lhs,
                            range_pos,
                            expr,
                        });
                    }
                    Header::Simple(id) => Some(id),
                }
            };
            if p.eat(Tok::Semi).is_none() {
                return match first.map(|id| p.arena.simple_stmts[id]) {
                    Some(SimpleStmt::Expr(cond)) => Ok(ForKind::Cond(cond)),
                    _ => Err(p.unexpected("`{`")),
                };
            }
            let cond = if p.at(Tok::Semi) {
                None
            } else {
                Some(p.expr()?)
            };
            p.expect(Tok::Semi, "`;`")?;
            let post = if p.at(Tok::LBrace) {
                None
            } else {
                Some(p.simple_stmt()?)
            };
            Ok(ForKind::ForClause {
                init: first,
                cond,
                post,
            })
        })?;
        let block = self.block()?;
        Ok(self.alloc_stmt(
            Stmt::For {
                for_pos,
                kind,
                block,
            },
            start,
        ))
    }

    fn switch_stmt(&mut self) -> PResult<StmtId> {
        let start = self.cur_start();
        let switch_pos = self.bump();
        let (init, tag) = self.header(|p| {
            let mut init = None;
            let mut tag = None;
            if !p.at(Tok::LBrace) {
                if !p.at(Tok::Semi) {
                    tag = Some(p.simple_stmt()?);
                }
                if p.eat(Tok::Semi).is_some() {
                    init = tag.take();
                    if !p.at(Tok::LBrace) {
                        tag = Some(p.simple_stmt()?);
                    }
                }
            }
            Ok((init, tag))
        })?;

        if let Some(guard) = tag.and_then(|t| self.type_switch_guard(t)) {
            let clauses = self.clauses(true)?;
            return Ok(self.alloc_stmt(
                Stmt::TypeSwitch {
                    switch_pos,
                    init,
                    guard,
                    clauses,
                },
                start,
            ));
        }

        let tag = match tag.map(|t| self.arena.simple_stmts[t]) {
            None => None,
            Some(SimpleStmt::Expr(x)) => Some(x),
            Some(_) => return Err(self.unexpected("switch expression")),
        };
        let clauses = self.clauses(false)?;
        Ok(self.alloc_stmt(
            Stmt::Switch {
                switch_pos,
                init,
                tag,
                clauses,
            },
            start,
        ))
    }

    /// `x.(type)` or `v := x.(type)`.
    fn type_switch_guard(&self, tag: SimpleStmtId) -> Option<TypeSwitchGuard> {
        let is_guard = |x: ExprId| {
            matches!(self.arena.exprs[x], Expr::TypeAssert { typ: None, .. })
        };
        match self.arena.simple_stmts[tag] {
            SimpleStmt::Expr(x) if is_guard(x) => Some(TypeSwitchGuard { bind: None, x }),
            SimpleStmt::ShortVarDecl { names, values, .. } => {
                match (self.arena.ident_names(names), self.arena.exprs_list(values)) {
                    ([name], [x]) if is_guard(*x) => Some(TypeSwitchGuard {
                        bind: Some(*name),
                        x: *x,
                    }),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn clauses(&mut self, type_switch: bool) -> PResult<ListRef<SwitchClauseId>> {
        self.expect(Tok::LBrace, "`{`")?;
        let mut clauses = Vec::new();
        while !self.at(Tok::RBrace) && !self.at_eof() {
            let start = self.cur_start();
            let case_pos = self.cur_span();
            let is_default = match self.peek() {
                Tok::KwCase => false,
                Tok::KwDefault => true,
                _ => return Err(self.unexpected("`case` or `default`")),
            };
            self.bump();
            let clause = if type_switch {
                let items = if is_default {
                    Vec::new()
                } else {
                    self.type_case_list()?
                };
                let items = self.arena.list_type_cases(items);
                let colon_pos = self.expect(Tok::Colon, "`:`")?;
                let stmts = self.stmt_list()?;
                SwitchClause::TypeCase {
                    case_pos,
                    items,
                    colon_pos,
                    stmts,
                }
            } else {
                let items = if is_default {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                let items = self.arena.list_exprs(items);
                let colon_pos = self.expect(Tok::Colon, "`:`")?;
                let stmts = self.stmt_list()?;
                SwitchClause::ExprCase {
                    case_pos,
                    items,
                    colon_pos,
                    stmts,
                }
            };
            let span = self.span_from(start);
            clauses.push(self.arena.switch_clauses.alloc(clause, span));
        }
        self.expect(Tok::RBrace, "`}`")?;
        Ok(self.arena.list_switch_clause_ids(clauses))
    }

    fn type_case_list(&mut self) -> PResult<Vec<TypeCaseElem>> {
        let mut items = Vec::new();
        loop {
            if let Tok::Ident("nil") = self.peek() {
                items.push(TypeCaseElem::Nil(self.bump()));
            } else {
                items.push(TypeCaseElem::Type(self.parse_type()?));
            }
            if self.eat(Tok::Comma).is_none() {
                return Ok(items);
            }
        }
    }

    fn select_stmt(&mut self) -> PResult<StmtId> {
        let start = self.cur_start();
        let select_pos = self.bump();
        self.expect(Tok::LBrace, "`{`")?;
        let mut clauses = Vec::new();
        while !self.at(Tok::RBrace) && !self.at_eof() {
            let clause_start = self.cur_start();
            let case_pos = self.cur_span();
            let comm = match self.peek() {
                Tok::KwCase => {
                    self.bump();
                    Some(self.simple_stmt()?)
                }
                Tok::KwDefault => {
                    self.bump();
                    None
                }
                _ => return Err(self.unexpected("`case` or `default`")),
            };
            let colon_pos = self.expect(Tok::Colon, "`:`")?;
            let stmts = self.stmt_list()?;
            let clause = CommClause {
                case_pos,
                comm,
                colon_pos,
                stmts,
            };
            let span = self.span_from(clause_start);
            clauses.push(self.arena.comm_clauses.alloc(clause, span));
        }
        self.expect(Tok::RBrace, "`}`")?;
        let clauses = self.arena.list_comm_clause_ids(clauses);
        Ok(self.alloc_stmt(
            Stmt::Select {
                select_pos,
                clauses,
            },
            start,
        ))
    }
}
