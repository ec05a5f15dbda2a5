use reftools_syntax::ast::{
    Block, CommClause, DeclId, ExprId, ForKind, GenDeclKind, IdentName, ListRef, RangeLhs,
    Receiver, Results, SignatureId, SimpleStmt, SimpleStmtId, Span, Spec, Stmt, StmtId,
    SwitchClause, TypeCaseElem, TypeId,
};

use super::UnitChecker;
use crate::program::{ObjId, ObjKind, Object, ScopeId, ScopeKind};
use crate::types::{BasicKind, Type, TypeRef};

impl UnitChecker<'_> {
    /// Checks a function body in a fresh function scope spanning `start..end` that holds
    /// the receiver, parameters and named results.
    pub(super) fn func_body(
        &mut self,
        parent: ScopeId,
        start: u32,
        end: u32,
        sig: SignatureId,
        recv: Option<Receiver>,
        body: &Block,
    ) {
        let (start, end) = (self.pos(start), self.pos(end));
        let scope = self
            .prog
            .new_scope(ScopeKind::Func, Some(parent), start, end);
        let arena = &self.file().arena;

        if let Some(recv) = recv {
            let ty = self.resolve_type(parent, recv.typ);
            if let Some(name) = recv.name {
                self.declare_var(scope, name, ty);
            }
        }

        let signature = arena.signatures[sig];
        let mut lists = vec![signature.params];
        if let Some(Results::Params(results)) = signature.results {
            lists.push(results);
        }
        for list in lists {
            for &f in arena.fields_list(list.fields) {
                let field = arena.fields[f];
                let mut ty = self.resolve_type(parent, field.typ);
                if field.ellipsis_pos.is_some() {
                    ty = self.prog.types.slice(ty);
                }
                for &name in arena.ident_names(field.names) {
                    self.declare_var(scope, name, ty);
                }
            }
        }

        self.stmt_list(scope, body.stmts);
    }

    fn open(&mut self, parent: ScopeId, span: Span) -> ScopeId {
        let (start, end) = (self.pos(span.start), self.pos(span.end));
        self.prog
            .new_scope(ScopeKind::Block, Some(parent), start, end)
    }

    fn declare_var(&mut self, scope: ScopeId, name: IdentName, ty: TypeRef) -> Option<ObjId> {
        let obj = Object {
            name: self.name(name.sym).to_string(),
            kind: ObjKind::Var,
            ty,
            pos: self.pos(name.pos.start),
        };
        self.prog.declare(scope, obj)
    }

    fn block(&mut self, parent: ScopeId, block: &Block) {
        let scope = self.open(parent, block.span());
        self.stmt_list(scope, block.stmts);
    }

    fn stmt_list(&mut self, scope: ScopeId, stmts: ListRef<StmtId>) {
        for &s in self.file().arena.stmts_list(stmts) {
            self.stmt(scope, s);
        }
    }

    fn stmt(&mut self, scope: ScopeId, id: StmtId) {
        let arena = &self.file().arena;
        let span = arena.stmts.span(id);
        match arena.stmts[id] {
            Stmt::Simple(s) => self.simple(scope, s),
            Stmt::Decl(d) => self.local_decl(scope, d),
            Stmt::Labeled { stmt, .. } => self.stmt(scope, stmt),
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => {
                self.expr(scope, call, None);
            }
            Stmt::Return { results, .. } => {
                for &e in arena.exprs_list(results) {
                    self.expr(scope, e, None);
                }
            }
            Stmt::Branch(_) => {}
            Stmt::Block(b) => self.block(scope, &b),
            Stmt::If {
                init,
                cond,
                then_block,
                else_stmt,
                ..
            } => {
                let s = self.open(scope, span);
                if let Some(init) = init {
                    self.simple(s, init);
                }
                self.expr(s, cond, None);
                self.block(s, &then_block);
                if let Some(e) = else_stmt {
                    self.stmt(s, e);
                }
            }
            Stmt::For { kind, block, .. } => {
                let s = self.open(scope, span);
                match kind {
                    ForKind::Infinite => {}
                    ForKind::Cond(c) => {
                        self.expr(s, c, None);
                    }
                    ForKind::ForClause { init, cond, post } => {
                        if let Some(init) = init {
                            self.simple(s, init);
                        }
                        if let Some(cond) = cond {
                            self.expr(s, cond, None);
                        }
                        if let Some(post) = post {
                            self.simple(s, post);
                        }
                    }
                    ForKind::Range { lhs, expr, .. } => {
                        let xt = self.expr(s, expr, None);
                        let (key, value) = self.range_types(xt);
                        match lhs {
                            Some(RangeLhs::Def { idents }) => {
                                let idents = arena.ident_names(idents);
                                for (&name, ty) in idents.iter().zip([key, value]) {
                                    self.declare_var(s, name, ty);
                                }
                            }
                            Some(RangeLhs::Assign { exprs }) => {
                                for &e in arena.exprs_list(exprs) {
                                    self.expr(s, e, None);
                                }
                            }
                            None => {}
                        }
                    }
                }
                self.block(s, &block);
            }
            Stmt::Switch {
                init, tag, clauses, ..
            } => {
                let s = self.open(scope, span);
                if let Some(init) = init {
                    self.simple(s, init);
                }
                if let Some(tag) = tag {
                    self.expr(s, tag, None);
                }
                for &c in arena.switch_clause_ids(clauses) {
                    let cs = self.open(s, arena.switch_clauses.span(c));
                    if let SwitchClause::ExprCase { items, stmts, .. } = arena.switch_clauses[c] {
                        for &e in arena.exprs_list(items) {
                            self.expr(cs, e, None);
                        }
                        self.stmt_list(cs, stmts);
                    }
                }
            }
            Stmt::TypeSwitch {
                init,
                guard,
                clauses,
                ..
            } => {
                let s = self.open(scope, span);
                if let Some(init) = init {
                    self.simple(s, init);
                }
                let xt = self.expr(s, guard.x, None);
                for &c in arena.switch_clause_ids(clauses) {
                    let cs = self.open(s, arena.switch_clauses.span(c));
                    let SwitchClause::TypeCase { items, stmts, .. } = arena.switch_clauses[c]
                    else {
                        continue;
                    };
                    let items = arena.type_case_elems(items);
                    let mut case_types: Vec<TypeRef> = Vec::new();
                    for item in items {
                        if let TypeCaseElem::Type(t) = *item {
                            case_types.push(self.resolve_type(cs, t));
                        }
                    }
                    if let Some(bind) = guard.bind {
                        // A single-type case binds that type, anything else the guard's.
                        let ty = match (items, case_types.as_slice()) {
                            ([TypeCaseElem::Type(_)], [t]) => *t,
                            _ => xt,
                        };
                        self.declare_var(cs, bind, ty);
                    }
                    self.stmt_list(cs, stmts);
                }
            }
            Stmt::Select { clauses, .. } => {
                for &c in arena.comm_clause_ids(clauses) {
                    let cs = self.open(scope, arena.comm_clauses.span(c));
                    let CommClause { comm, stmts, .. } = arena.comm_clauses[c];
                    if let Some(comm) = comm {
                        self.simple(cs, comm);
                    }
                    self.stmt_list(cs, stmts);
                }
            }
        }
    }

    fn simple(&mut self, scope: ScopeId, id: SimpleStmtId) {
        let arena = &self.file().arena;
        match arena.simple_stmts[id] {
            SimpleStmt::Empty(_) => {}
            SimpleStmt::Expr(e) | SimpleStmt::IncDec { expr: e, .. } => {
                self.expr(scope, e, None);
            }
            SimpleStmt::Send { chan, value, .. } => {
                self.expr(scope, chan, None);
                self.expr(scope, value, None);
            }
            SimpleStmt::Assign { lhs, rhs, .. } => {
                let lhs = arena.exprs_list(lhs);
                for &e in lhs {
                    self.expr(scope, e, None);
                }
                self.assigned_types(scope, lhs.len(), arena.exprs_list(rhs));
            }
            SimpleStmt::ShortVarDecl { names, values, .. } => {
                let names = arena.ident_names(names);
                let types = self.assigned_types(scope, names.len(), arena.exprs_list(values));
                for (&name, ty) in names.iter().zip(types) {
                    let ty = self.prog.types.default_type(ty);
                    self.declare_var(scope, name, ty);
                }
            }
        }
    }

    /// Types of the values assigned to `n` targets, covering multi-value calls and the
    /// `v, ok` forms.
    fn assigned_types(&mut self, scope: ScopeId, n: usize, values: &[ExprId]) -> Vec<TypeRef> {
        let invalid = self.prog.types.invalid();
        let mut types: Vec<TypeRef> = match values {
            [single] if n == 2 => match self.comma_ok(scope, *single) {
                Some(t) => vec![t, self.prog.types.basic(BasicKind::Bool)],
                None => self.expr_multi(scope, *single).into_vec(),
            },
            [single] if n > 2 => self.expr_multi(scope, *single).into_vec(),
            _ => values.iter().map(|&e| self.expr(scope, e, None)).collect(),
        };
        types.resize(n, invalid);
        types
    }

    fn range_types(&self, xt: TypeRef) -> (TypeRef, TypeRef) {
        let types = &self.prog.types;
        let invalid = types.invalid();
        let int = types.basic(BasicKind::Int);
        let mut under = types.underlying(xt);
        if let Type::Pointer { elem } = types.get(under) {
            under = types.underlying(*elem);
        }
        match types.get(under) {
            Type::Basic { kind, .. } => match kind {
                BasicKind::String | BasicKind::UntypedString => (int, types.rune()),
                k if k.default_kind().is_integer() => (types.default_type(xt), invalid),
                _ => (invalid, invalid),
            },
            Type::Array { elem, .. } | Type::Slice { elem } => (int, *elem),
            Type::Map { key, elem } => (*key, *elem),
            Type::Chan { elem, .. } => (*elem, invalid),
            // Range-over-func: `func(yield func(K, V) bool)`.
            Type::Signature(sig) => match sig.params.first().and_then(|&y| types.as_signature(y)) {
                Some(yield_sig) => (
                    yield_sig.params.first().copied().unwrap_or(invalid),
                    yield_sig.params.get(1).copied().unwrap_or(invalid),
                ),
                None => (invalid, invalid),
            },
            _ => (invalid, invalid),
        }
    }

    fn local_decl(&mut self, scope: ScopeId, id: DeclId) {
        let arena = &self.file().arena;
        let decl = arena.decls[id];
        let mut inherited: Option<(Option<TypeId>, ListRef<ExprId>)> = None;
        for spec in arena.specs_list(decl.specs) {
            match *spec {
                Spec::Import(_) => {}
                Spec::Type(ts) => {
                    let name = self.name(ts.name.sym).to_string();
                    let pos = self.pos(ts.name.pos.start);
                    if ts.alias {
                        let ty = self.resolve_type(scope, ts.typ);
                        self.prog.declare(
                            scope,
                            Object {
                                name,
                                kind: ObjKind::TypeName,
                                ty,
                                pos,
                            },
                        );
                    } else {
                        let unit = self.unit;
                        let named = self.prog.types.new_named(&name, Some(unit));
                        self.prog.declare(
                            scope,
                            Object {
                                name,
                                kind: ObjKind::TypeName,
                                ty: named,
                                pos,
                            },
                        );
                        let under = self.resolve_type(scope, ts.typ);
                        self.prog.types.set_underlying(named, under);
                    }
                }
                Spec::Value(vs) => {
                    let is_const = decl.kind == GenDeclKind::Const;
                    let (typ, values) = if is_const {
                        if !vs.values.is_empty() {
                            inherited = Some((vs.typ, vs.values));
                        }
                        inherited.unwrap_or((vs.typ, vs.values))
                    } else {
                        (vs.typ, vs.values)
                    };
                    if is_const {
                        self.iota = Some(vs.iota as i128);
                    }
                    let declared = typ.map(|t| self.resolve_type(scope, t));
                    let names = arena.ident_names(vs.names);
                    let values = arena.exprs_list(values);
                    let types = if values.is_empty() {
                        vec![declared.unwrap_or_else(|| self.prog.types.invalid()); names.len()]
                    } else if values.len() == 1 && names.len() > 1 {
                        self.assigned_types(scope, names.len(), values)
                    } else {
                        values
                            .iter()
                            .map(|&e| self.expr(scope, e, declared))
                            .collect()
                    };
                    let const_values: Vec<Option<i128>> = if is_const {
                        values.iter().map(|&e| self.const_value(scope, e)).collect()
                    } else {
                        Vec::new()
                    };
                    self.iota = None;

                    for (i, &name) in names.iter().enumerate() {
                        let inferred = types.get(i).copied().unwrap_or_else(|| self.prog.types.invalid());
                        let ty = match declared {
                            Some(t) => t,
                            None if is_const => inferred,
                            None => self.prog.types.default_type(inferred),
                        };
                        let obj = Object {
                            name: self.name(name.sym).to_string(),
                            kind: if is_const { ObjKind::Const } else { ObjKind::Var },
                            ty,
                            pos: self.pos(name.pos.start),
                        };
                        let Some(obj) = self.prog.declare(scope, obj) else {
                            continue;
                        };
                        if let Some(Some(v)) = const_values.get(i) {
                            self.prog.const_vals.insert(obj, *v);
                        }
                    }
                }
            }
        }
    }
}
