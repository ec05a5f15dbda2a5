use reftools_syntax::ast::{self, ArrayLen, BasicLitKind, BinaryOp, Expr, InterfaceElem, TypeId, UnaryOp};
use tracing::debug;

use super::UnitChecker;
use crate::program::{Builtin, ObjId, ObjKind, ScopeId};
use crate::types::{self, BasicKind, Field, Method, Signature, Type, TypeRef};

impl UnitChecker<'_> {
    /// Resolves a type expression in `scope`.
    pub(super) fn resolve_type(&mut self, scope: ScopeId, t: TypeId) -> TypeRef {
        let arena = &self.file().arena;
        match arena.types[t] {
            ast::Type::Named { pkg: None, name } => {
                let name = self.name(name.sym);
                self.type_name(scope, name)
            }
            ast::Type::Named {
                pkg: Some(pkg),
                name,
            } => {
                let pkg = self.name(pkg.sym);
                let name = self.name(name.sym);
                self.qualified_type_name(scope, pkg, name)
            }
            ast::Type::Pointer { elem } => {
                let elem = self.resolve_type(scope, elem);
                self.prog.types.pointer(elem)
            }
            ast::Type::Slice { elem } => {
                let elem = self.resolve_type(scope, elem);
                self.prog.types.slice(elem)
            }
            ast::Type::Array { len, elem } => {
                let len = match len {
                    ArrayLen::Expr(e) => self
                        .const_value(scope, e)
                        .and_then(|n| u64::try_from(n).ok()),
                    ArrayLen::Ellipsis(_) => None,
                };
                let elem = self.resolve_type(scope, elem);
                match len {
                    Some(len) => self.prog.types.array(elem, len),
                    None => {
                        debug!("array length is not a known constant");
                        self.prog.types.invalid()
                    }
                }
            }
            ast::Type::Map { key, val } => {
                let key = self.resolve_type(scope, key);
                let val = self.resolve_type(scope, val);
                self.prog.types.map(key, val)
            }
            ast::Type::Chan { dir, elem } => {
                let elem = self.resolve_type(scope, elem);
                let dir = match dir {
                    ast::ChanDir::Both => types::ChanDir::Both,
                    ast::ChanDir::Send => types::ChanDir::Send,
                    ast::ChanDir::Recv => types::ChanDir::Recv,
                };
                self.prog.types.chan(elem, dir)
            }
            ast::Type::Struct { fields } => {
                let mut out = Vec::new();
                for &f in arena.fields_list(fields) {
                    let field = arena.fields[f];
                    let ty = self.resolve_type(scope, field.typ);
                    if field.is_embed {
                        out.push(Field {
                            name: self.embedded_name(field.typ).to_string(),
                            ty,
                            embedded: true,
                        });
                        continue;
                    }
                    for n in arena.ident_names(field.names) {
                        out.push(Field {
                            name: self.name(n.sym).to_string(),
                            ty,
                            embedded: false,
                        });
                    }
                }
                self.prog.types.new_struct(out)
            }
            ast::Type::Interface { elems } => {
                let mut methods = Vec::new();
                for elem in arena.interface_elems(elems) {
                    match *elem {
                        InterfaceElem::Method { name, sig } => {
                            let sig = self.resolve_signature(scope, sig);
                            methods.push(Method {
                                name: self.name(name.sym).to_string(),
                                sig,
                            });
                        }
                        InterfaceElem::TypeElem { terms } => {
                            // Only a single embedded interface contributes methods.
                            let terms = arena.type_terms(terms);
                            if let [term] = terms {
                                if !term.tilde {
                                    let embedded = self.resolve_type(scope, term.typ);
                                    let under = self.prog.types.underlying(embedded);
                                    if let Type::Interface { methods: m } = self.prog.types.get(under)
                                    {
                                        methods.extend(m.iter().cloned());
                                    }
                                }
                            }
                        }
                    }
                }
                self.prog.types.new_interface(methods)
            }
            ast::Type::Func { sig } => self.resolve_signature(scope, sig),
            ast::Type::Paren { typ } => self.resolve_type(scope, typ),
        }
    }

    fn type_name(&mut self, scope: ScopeId, name: &str) -> TypeRef {
        match self.prog.resolve(scope, name) {
            Some(obj) if self.prog.object(obj).kind == ObjKind::TypeName => self.object_type(obj),
            _ => {
                debug!(name, "unknown type name");
                self.prog.types.invalid()
            }
        }
    }

    fn qualified_type_name(&mut self, scope: ScopeId, pkg: &str, name: &str) -> TypeRef {
        let dep = match self.prog.resolve(scope, pkg).map(|o| self.prog.object(o).kind) {
            Some(ObjKind::PkgName(dep)) => dep,
            _ => {
                if pkg == "unsafe" && name == "Pointer" {
                    return self.prog.types.basic(BasicKind::UnsafePointer);
                }
                debug!(pkg, name, "qualifier is not an imported package");
                return self.prog.types.invalid();
            }
        };
        let unit = self.prog.unit(dep);
        if unit.path == "unsafe" && name == "Pointer" {
            return self.prog.types.basic(BasicKind::UnsafePointer);
        }
        match self.prog.scope(unit.scope).lookup(name) {
            Some(obj) if self.prog.object(obj).kind == ObjKind::TypeName => self.prog.object(obj).ty,
            _ => {
                debug!(pkg, name, opaque = unit.opaque, "type not found in package");
                self.prog.types.invalid()
            }
        }
    }

    /// Field name of an embedded field: the type name without qualifier or pointer.
    fn embedded_name(&self, t: TypeId) -> &str {
        let arena = &self.file().arena;
        match arena.types[t] {
            ast::Type::Named { name, .. } => self.name(name.sym),
            ast::Type::Pointer { elem } | ast::Type::Paren { typ: elem } => self.embedded_name(elem),
            _ => "",
        }
    }

    pub(super) fn resolve_signature(&mut self, scope: ScopeId, sig: ast::SignatureId) -> TypeRef {
        let arena = &self.file().arena;
        let signature = arena.signatures[sig];
        let mut params = Vec::new();
        let mut variadic = false;
        for &f in arena.fields_list(signature.params.fields) {
            let field = arena.fields[f];
            let mut ty = self.resolve_type(scope, field.typ);
            if field.ellipsis_pos.is_some() {
                variadic = true;
                ty = self.prog.types.slice(ty);
            }
            for _ in 0..field.names.len().max(1) {
                params.push(ty);
            }
        }
        let results = arena
            .result_types(sig)
            .into_iter()
            .map(|t| self.resolve_type(scope, t))
            .collect();
        self.prog.types.signature(Signature {
            params,
            results,
            variadic,
        })
    }

    /// The defined type a method's receiver names, through `*` and parentheses.
    pub(super) fn receiver_base(&mut self, scope: ScopeId, t: TypeId) -> Option<TypeRef> {
        let arena = &self.file().arena;
        match arena.types[t] {
            ast::Type::Pointer { elem } | ast::Type::Paren { typ: elem } => {
                self.receiver_base(scope, elem)
            }
            ast::Type::Named { pkg: None, name } => {
                let name = self.name(name.sym);
                let ty = self.type_name(scope, name);
                self.prog.types.as_named(ty).map(|_| ty)
            }
            _ => None,
        }
    }

    /// Integer value of a constant expression, when it has one.
    pub(super) fn const_value(&mut self, scope: ScopeId, e: ast::ExprId) -> Option<i128> {
        let f = self.file();
        match f.arena.exprs[e] {
            Expr::BasicLit(lit) => match lit.kind {
                BasicLitKind::Int => parse_int(f.text(lit.raw)),
                BasicLitKind::Rune => parse_rune(f.text(lit.raw)),
                _ => None,
            },
            Expr::Ident(sym) => {
                let name = self.name(sym);
                if name == "iota" {
                    if let Some(v) = self.iota {
                        return Some(v);
                    }
                }
                let obj = self.prog.resolve(scope, name)?;
                self.const_of(obj)
            }
            Expr::Selector { .. } => {
                let obj = self.imported_object(scope, e)?;
                self.const_of(obj)
            }
            Expr::Paren(inner) => self.const_value(scope, inner),
            Expr::Unary { op, expr } => {
                let v = self.const_value(scope, expr)?;
                match op {
                    UnaryOp::Add => Some(v),
                    UnaryOp::Sub => v.checked_neg(),
                    UnaryOp::Xor => Some(!v),
                    _ => None,
                }
            }
            Expr::Binary { left, op, right } => {
                let x = self.const_value(scope, left)?;
                let y = self.const_value(scope, right)?;
                match op {
                    BinaryOp::Add => x.checked_add(y),
                    BinaryOp::Sub => x.checked_sub(y),
                    BinaryOp::Mul => x.checked_mul(y),
                    BinaryOp::Div => x.checked_div(y),
                    BinaryOp::Mod => x.checked_rem(y),
                    BinaryOp::And => Some(x & y),
                    BinaryOp::Or => Some(x | y),
                    BinaryOp::Xor => Some(x ^ y),
                    BinaryOp::AndNot => Some(x & !y),
                    BinaryOp::Shl => u32::try_from(y).ok().and_then(|s| x.checked_shl(s)),
                    BinaryOp::Shr => u32::try_from(y).ok().and_then(|s| x.checked_shr(s)),
                    _ => None,
                }
            }
            Expr::Call { callee, args, .. } => {
                let arg = match f.arena.exprs_list(args) {
                    [arg] => *arg,
                    _ => return None,
                };
                let callee_obj = match f.arena.exprs[callee] {
                    Expr::Ident(sym) => self.prog.resolve(scope, self.name(sym)),
                    Expr::Paren(_) => None,
                    _ => self.imported_object(scope, callee),
                };
                match callee_obj.map(|o| self.prog.object(o).kind) {
                    Some(ObjKind::Builtin(Builtin::Len | Builtin::Cap)) => {
                        self.array_len_of(scope, arg)
                    }
                    // Conversions such as `int(4)` keep the value.
                    Some(ObjKind::TypeName) => self.const_value(scope, arg),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn const_of(&mut self, obj: ObjId) -> Option<i128> {
        if self.prog.object(obj).kind != ObjKind::Const {
            return None;
        }
        self.object_type(obj);
        self.prog.const_vals.get(&obj).copied()
    }

    /// The object `pkg.Name` names, for a selector on an imported package.
    fn imported_object(&self, scope: ScopeId, e: ast::ExprId) -> Option<ObjId> {
        let f = self.file();
        let Expr::Selector { expr, sel } = f.arena.exprs[e] else {
            return None;
        };
        let Expr::Ident(pkg) = f.arena.exprs[expr] else {
            return None;
        };
        let pkg = self.prog.resolve(scope, self.name(pkg))?;
        let ObjKind::PkgName(dep) = self.prog.object(pkg).kind else {
            return None;
        };
        let unit = self.prog.unit(dep);
        self.prog.scope(unit.scope).lookup(self.name(sel.sym))
    }

    /// `len` or `cap` of a named array variable, which Go treats as a constant.
    fn array_len_of(&mut self, scope: ScopeId, e: ast::ExprId) -> Option<i128> {
        let obj = match self.file().arena.exprs[e] {
            Expr::Ident(sym) => self.prog.resolve(scope, self.name(sym))?,
            Expr::Selector { .. } => self.imported_object(scope, e)?,
            _ => return None,
        };
        if !matches!(self.prog.object(obj).kind, ObjKind::Var | ObjKind::Const) {
            return None;
        }
        let ty = self.object_type(obj);
        let types = &self.prog.types;
        let ty = match types.get(types.underlying(ty)) {
            Type::Pointer { elem } => types.underlying(*elem),
            _ => types.underlying(ty),
        };
        match types.get(ty) {
            Type::Array { len, .. } => Some(*len as i128),
            _ => None,
        }
    }
}

fn parse_int(raw: &str) -> Option<i128> {
    let digits: String = raw.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i128::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        i128::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}

fn parse_rune(raw: &str) -> Option<i128> {
    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let c = chars.next()?;
    if c != '\\' {
        return Some(c as i128);
    }
    match chars.next()? {
        'n' => Some('\n' as i128),
        't' => Some('\t' as i128),
        'r' => Some('\r' as i128),
        '0' => Some(0),
        '\\' => Some('\\' as i128),
        '\'' => Some('\'' as i128),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_literal_forms() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x_1F"), Some(31));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("017"), Some(15));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0"), Some(0));
    }

    #[test]
    fn parses_simple_runes() {
        assert_eq!(parse_rune("'a'"), Some(97));
        assert_eq!(parse_rune("'\\n'"), Some(10));
    }
}
