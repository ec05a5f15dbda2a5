use reftools_syntax::ast::{self, ArrayLen, BasicLitKind, Expr, ExprId, ListRef, UnaryOp};
use smallvec::{smallvec, SmallVec};
use tracing::debug;

use super::UnitChecker;
use crate::program::{Builtin, ObjKind, ScopeId};
use crate::types::{BasicKind, Type, TypeRef};

pub(super) type Results = SmallVec<[TypeRef; 2]>;

impl UnitChecker<'_> {
    /// Types `e` and records the result. `hint` is the type implied by an enclosing
    /// composite literal, used by elided `{...}` elements.
    pub(super) fn expr(&mut self, scope: ScopeId, e: ExprId, hint: Option<TypeRef>) -> TypeRef {
        let ty = self.expr_inner(scope, e, hint);
        let file = self.file_id();
        self.prog.record_expr(file, e, ty);
        ty
    }

    /// All values of `e`: the results of a call, one type for anything else.
    pub(super) fn expr_multi(&mut self, scope: ScopeId, e: ExprId) -> Results {
        match self.file().arena.exprs[e] {
            Expr::Paren(inner) => self.expr_multi(scope, inner),
            Expr::Call { callee, args, .. } => {
                let results = self.call(scope, callee, args);
                let single = match results.as_slice() {
                    [t] => *t,
                    _ => self.prog.types.invalid(),
                };
                let file = self.file_id();
                self.prog.record_expr(file, e, single);
                results
            }
            _ => smallvec![self.expr(scope, e, None)],
        }
    }

    /// Value type of `e` when it is one of the `v, ok` forms: map index, type assertion
    /// or channel receive.
    pub(super) fn comma_ok(&mut self, scope: ScopeId, e: ExprId) -> Option<TypeRef> {
        match self.file().arena.exprs[e] {
            Expr::Paren(inner) => self.comma_ok(scope, inner),
            Expr::Index { base, .. } => {
                let ty = self.expr(scope, e, None);
                let base_ty = self.prog.type_of(self.file_id(), base)?;
                let under = self.prog.types.underlying(base_ty);
                matches!(self.prog.types.get(under), Type::Map { .. }).then_some(ty)
            }
            Expr::TypeAssert { typ: Some(_), .. }
            | Expr::Unary {
                op: UnaryOp::Recv, ..
            } => Some(self.expr(scope, e, None)),
            _ => None,
        }
    }

    fn expr_inner(&mut self, scope: ScopeId, e: ExprId, hint: Option<TypeRef>) -> TypeRef {
        let f = self.file();
        let invalid = self.prog.types.invalid();
        match f.arena.exprs[e] {
            Expr::Ident(sym) => {
                let name = self.name(sym);
                self.ident(scope, name)
            }
            Expr::BasicLit(lit) => self.prog.types.basic(match lit.kind {
                BasicLitKind::Int => BasicKind::UntypedInt,
                BasicLitKind::Float => BasicKind::UntypedFloat,
                BasicLitKind::Imag => BasicKind::UntypedComplex,
                BasicLitKind::Rune => BasicKind::UntypedRune,
                BasicLitKind::String => BasicKind::UntypedString,
            }),
            Expr::FuncLit { sig, body } => {
                let ty = self.resolve_signature(scope, sig);
                let span = f.arena.exprs.span(e);
                self.func_body(scope, span.start, body.r_brace.end, sig, None, &body);
                ty
            }
            Expr::CompositeLit { typ, lit } => {
                let ty = match typ {
                    // `[...]T{...}`: the length comes from the elements below.
                    Some(t) => match f.arena.types[t] {
                        ast::Type::Array {
                            len: ArrayLen::Ellipsis(_),
                            elem,
                        } => {
                            let elem = self.resolve_type(scope, elem);
                            self.prog.types.array(elem, 0)
                        }
                        _ => self.resolve_type(scope, t),
                    },
                    // `{...}` standing for `&T{...}` has type T.
                    None => match hint.map(|h| (h, self.prog.types.get(h))) {
                        Some((_, Type::Pointer { elem })) => *elem,
                        Some((h, _)) => h,
                        None => invalid,
                    },
                };
                let elements = f.arena.keyed_elems_list(lit.elements);
                let under = self.prog.types.underlying(ty);
                match self.prog.types.get(under).clone() {
                    Type::Struct { fields } => {
                        for (i, el) in elements.iter().enumerate() {
                            let field_ty = match el.key.map(|k| f.arena.exprs[k]) {
                                Some(Expr::Ident(key)) => {
                                    let key = self.name(key);
                                    fields.iter().find(|fd| fd.name == key).map(|fd| fd.ty)
                                }
                                Some(_) => None,
                                None => fields.get(i).map(|fd| fd.ty),
                            };
                            self.expr(scope, el.value, field_ty);
                        }
                        ty
                    }
                    Type::Array { elem, len } => {
                        let mut next = 0i128;
                        let mut count = 0i128;
                        for el in elements {
                            if let Some(key) = el.key {
                                self.expr(scope, key, None);
                                if let Some(k) = self.const_value(scope, key) {
                                    next = k;
                                }
                            }
                            self.expr(scope, el.value, Some(elem));
                            next += 1;
                            count = count.max(next);
                        }
                        if len == 0 && count > 0 {
                            self.prog.types.array(elem, count as u64)
                        } else {
                            ty
                        }
                    }
                    Type::Slice { elem } => {
                        for el in elements {
                            if let Some(key) = el.key {
                                self.expr(scope, key, None);
                            }
                            self.expr(scope, el.value, Some(elem));
                        }
                        ty
                    }
                    Type::Map { key, elem } => {
                        for el in elements {
                            if let Some(k) = el.key {
                                self.expr(scope, k, Some(key));
                            }
                            self.expr(scope, el.value, Some(elem));
                        }
                        ty
                    }
                    _ => {
                        debug!("composite literal of unknown type");
                        for el in elements {
                            self.expr(scope, el.value, None);
                        }
                        ty
                    }
                }
            }
            Expr::Paren(inner) => self.expr(scope, inner, hint),
            Expr::Selector { expr, sel } => {
                let sel = self.name(sel.sym);
                if let Some(dep) = self.package_qualifier(scope, expr) {
                    let unit = self.prog.unit(dep);
                    return match self.prog.scope(unit.scope).lookup(sel) {
                        Some(obj) => self.prog.object(obj).ty,
                        None => {
                            debug!(sel, opaque = unit.opaque, "unknown package member");
                            invalid
                        }
                    };
                }
                let x = self.expr(scope, expr, None);
                match self.prog.types.lookup_member(x, sel) {
                    Some(t) => t,
                    None => {
                        debug!(sel, "unknown field or method");
                        invalid
                    }
                }
            }
            Expr::Index { base, indices } => {
                let bt = self.expr(scope, base, None);
                for &i in f.arena.exprs_list(indices) {
                    self.expr(scope, i, None);
                }
                let under = self.prog.types.underlying(bt);
                match self.prog.types.get(under) {
                    Type::Slice { elem } | Type::Array { elem, .. } | Type::Map { elem, .. } => {
                        *elem
                    }
                    Type::Pointer { elem } => match self.prog.types.get(self.prog.types.underlying(*elem)) {
                        Type::Array { elem, .. } => *elem,
                        _ => invalid,
                    },
                    Type::Basic {
                        kind: BasicKind::String | BasicKind::UntypedString,
                        ..
                    } => self.prog.types.byte(),
                    _ => invalid,
                }
            }
            Expr::Slice { expr, lo, hi, max } => {
                let bt = self.expr(scope, expr, None);
                for i in [lo, hi, max].into_iter().flatten() {
                    self.expr(scope, i, None);
                }
                let under = self.prog.types.underlying(bt);
                match self.prog.types.get(under).clone() {
                    Type::Basic {
                        kind: BasicKind::UntypedString,
                        ..
                    } => self.prog.types.basic(BasicKind::String),
                    Type::Array { elem, .. } => self.prog.types.slice(elem),
                    Type::Pointer { elem } => {
                        match self.prog.types.get(self.prog.types.underlying(elem)).clone() {
                            Type::Array { elem, .. } => self.prog.types.slice(elem),
                            _ => invalid,
                        }
                    }
                    _ => bt,
                }
            }
            Expr::TypeAssert { expr, typ } => {
                self.expr(scope, expr, None);
                match typ {
                    Some(t) => self.resolve_type(scope, t),
                    None => invalid,
                }
            }
            Expr::Call { callee, args, .. } => {
                let results = self.call(scope, callee, args);
                match results.as_slice() {
                    [t] => *t,
                    _ => invalid,
                }
            }
            Expr::Unary { op, expr } => match op {
                UnaryOp::Addr => {
                    let inner_hint = hint.and_then(|h| match self.prog.types.get(h) {
                        Type::Pointer { elem } => Some(*elem),
                        _ => None,
                    });
                    let t = self.expr(scope, expr, inner_hint);
                    self.prog.types.pointer(t)
                }
                UnaryOp::Deref => {
                    let t = self.expr(scope, expr, None);
                    let under = self.prog.types.underlying(t);
                    match self.prog.types.get(under) {
                        Type::Pointer { elem } => *elem,
                        _ => invalid,
                    }
                }
                UnaryOp::Recv => {
                    let t = self.expr(scope, expr, None);
                    let under = self.prog.types.underlying(t);
                    match self.prog.types.get(under) {
                        Type::Chan { elem, .. } => *elem,
                        _ => invalid,
                    }
                }
                UnaryOp::Not | UnaryOp::Add | UnaryOp::Sub | UnaryOp::Xor => {
                    self.expr(scope, expr, hint)
                }
            },
            Expr::Binary { left, op, right } => {
                let l = self.expr(scope, left, None);
                let r = self.expr(scope, right, None);
                if op.is_comparison() {
                    self.prog.types.basic(BasicKind::UntypedBool)
                } else if matches!(
                    op,
                    reftools_syntax::ast::BinaryOp::Shl | reftools_syntax::ast::BinaryOp::Shr
                ) {
                    l
                } else {
                    self.prog.types.binary_result(l, r)
                }
            }
            Expr::Type(t) => self.resolve_type(scope, t),
        }
    }

    fn ident(&mut self, scope: ScopeId, name: &str) -> TypeRef {
        if name == "_" {
            return self.prog.types.invalid();
        }
        if name == "iota" && self.iota.is_some() {
            return self.prog.types.basic(BasicKind::UntypedInt);
        }
        let Some(obj) = self.prog.resolve(scope, name) else {
            debug!(name, "undeclared name");
            return self.prog.types.invalid();
        };
        match self.prog.object(obj).kind {
            ObjKind::Var | ObjKind::Const | ObjKind::Func | ObjKind::TypeName | ObjKind::Nil => {
                self.object_type(obj)
            }
            ObjKind::PkgName(_) | ObjKind::Builtin(_) => self.prog.types.invalid(),
        }
    }

    /// The unit `x` names when it is an imported package identifier.
    fn package_qualifier(&self, scope: ScopeId, x: ExprId) -> Option<crate::program::UnitId> {
        let Expr::Ident(sym) = self.file().arena.exprs[x] else {
            return None;
        };
        let obj = self.prog.resolve(scope, self.name(sym))?;
        match self.prog.object(obj).kind {
            ObjKind::PkgName(dep) => Some(dep),
            _ => None,
        }
    }

    /// `e` read as a type, for conversions and the type operands of builtins.
    fn expr_as_type(&mut self, scope: ScopeId, e: ExprId) -> Option<TypeRef> {
        let f = self.file();
        let ty = match f.arena.exprs[e] {
            Expr::Ident(sym) => {
                let obj = self.prog.resolve(scope, self.name(sym))?;
                if self.prog.object(obj).kind != ObjKind::TypeName {
                    return None;
                }
                self.object_type(obj)
            }
            Expr::Selector { expr, sel } => {
                let dep = self.package_qualifier(scope, expr)?;
                let unit = self.prog.unit(dep);
                let obj = self.prog.scope(unit.scope).lookup(self.name(sel.sym))?;
                if self.prog.object(obj).kind != ObjKind::TypeName {
                    return None;
                }
                self.prog.object(obj).ty
            }
            Expr::Paren(inner) => self.expr_as_type(scope, inner)?,
            Expr::Unary {
                op: UnaryOp::Deref,
                expr,
            } => {
                let elem = self.expr_as_type(scope, expr)?;
                self.prog.types.pointer(elem)
            }
            Expr::Type(t) => self.resolve_type(scope, t),
            _ => return None,
        };
        let file = self.file_id();
        self.prog.record_expr(file, e, ty);
        Some(ty)
    }

    fn builtin(&self, scope: ScopeId, callee: ExprId) -> Option<Builtin> {
        let Expr::Ident(sym) = self.file().arena.exprs[callee] else {
            return None;
        };
        let obj = self.prog.resolve(scope, self.name(sym))?;
        match self.prog.object(obj).kind {
            ObjKind::Builtin(b) => Some(b),
            _ => None,
        }
    }

    fn call(&mut self, scope: ScopeId, callee: ExprId, args: ListRef<ExprId>) -> Results {
        let args = self.file().arena.exprs_list(args);

        if let Some(t) = self.expr_as_type(scope, callee) {
            for &a in args {
                self.expr(scope, a, Some(t));
            }
            return smallvec![t];
        }

        if let Some(b) = self.builtin(scope, callee) {
            return self.builtin_call(scope, b, args);
        }

        let ct = self.expr(scope, callee, None);
        let (params, results, variadic) = match self.prog.types.as_signature(ct) {
            Some(sig) => (sig.params.clone(), sig.results.clone(), sig.variadic),
            None => {
                debug!("call of a non-function");
                for &a in args {
                    self.expr(scope, a, None);
                }
                return SmallVec::new();
            }
        };
        for (i, &a) in args.iter().enumerate() {
            let hint = match params.get(i) {
                Some(&p) if variadic && i + 1 >= params.len() => self.prog.types.elem(p),
                Some(&p) => Some(p),
                None if variadic => params.last().and_then(|&p| self.prog.types.elem(p)),
                None => None,
            };
            self.expr(scope, a, hint);
        }
        results.into_iter().collect()
    }

    fn builtin_call(&mut self, scope: ScopeId, b: Builtin, args: &[ExprId]) -> Results {
        let types = |c: &mut Self| -> Vec<TypeRef> {
            args.iter().map(|&a| c.expr(scope, a, None)).collect()
        };
        let int = self.prog.types.basic(BasicKind::Int);
        match b {
            Builtin::Len | Builtin::Cap | Builtin::Copy => {
                types(self);
                smallvec![int]
            }
            Builtin::New | Builtin::Make => {
                let Some((&first, rest)) = args.split_first() else {
                    return smallvec![self.prog.types.invalid()];
                };
                let t = self
                    .expr_as_type(scope, first)
                    .unwrap_or_else(|| self.prog.types.invalid());
                for &a in rest {
                    self.expr(scope, a, None);
                }
                if b == Builtin::New {
                    smallvec![self.prog.types.pointer(t)]
                } else {
                    smallvec![t]
                }
            }
            Builtin::Append => {
                let ts = types(self);
                smallvec![ts.first().copied().unwrap_or_else(|| self.prog.types.invalid())]
            }
            Builtin::Complex => {
                types(self);
                smallvec![self.prog.types.basic(BasicKind::Complex128)]
            }
            Builtin::Real | Builtin::Imag => {
                types(self);
                smallvec![self.prog.types.basic(BasicKind::Float64)]
            }
            Builtin::Min | Builtin::Max => {
                let ts = types(self);
                let t = ts
                    .iter()
                    .copied()
                    .reduce(|x, y| self.prog.types.binary_result(x, y))
                    .unwrap_or_else(|| self.prog.types.invalid());
                smallvec![t]
            }
            Builtin::Recover => smallvec![self.prog.types.empty_interface()],
            Builtin::Clear
            | Builtin::Close
            | Builtin::Delete
            | Builtin::Panic
            | Builtin::Print
            | Builtin::Println => {
                types(self);
                SmallVec::new()
            }
        }
    }
}
