use smallvec::SmallVec;
use tracing::debug;

use super::{Donors, SynthOptions};
use crate::fragment::{Element, Expr, Fragment, Node};
use crate::program::{FileId, Program};
use crate::typestr::{type_string, write_signature, Qualifier};
use crate::types::{BasicKind, Field, Type, TypeRef};

/// Which notion of "zero" to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroPolicy {
    /// Illustrative values for filling a literal: nested structs expanded, one map
    /// entry, array elements spelled out, function stubs.
    #[default]
    Fill,
    /// The language's zero value, as written in a return statement.
    Return,
}

/// Spelling of the zero value of a basic kind. Invalid and untyped kinds have none.
pub fn basic_zero(kind: BasicKind) -> Option<&'static str> {
    match kind {
        BasicKind::Bool => Some("false"),
        BasicKind::Int
        | BasicKind::Int8
        | BasicKind::Int16
        | BasicKind::Int32
        | BasicKind::Int64
        | BasicKind::Uint
        | BasicKind::Uint8
        | BasicKind::Uint16
        | BasicKind::Uint32
        | BasicKind::Uint64 => Some("0"),
        BasicKind::Uintptr => Some("uintptr(0)"),
        BasicKind::UnsafePointer => Some("unsafe.Pointer(uintptr(0))"),
        BasicKind::Float32 | BasicKind::Float64 => Some("0.0"),
        BasicKind::Complex64 | BasicKind::Complex128 => Some("(0 + 0i)"),
        BasicKind::String => Some("\"\""),
        BasicKind::Invalid
        | BasicKind::UntypedBool
        | BasicKind::UntypedInt
        | BasicKind::UntypedRune
        | BasicKind::UntypedFloat
        | BasicKind::UntypedComplex
        | BasicKind::UntypedString
        | BasicKind::UntypedNil => None,
    }
}

/// Zero value of `t` as seen from `file`, or `None` if it cannot be written there.
pub fn zero_value(
    prog: &Program,
    file: FileId,
    t: TypeRef,
    policy: ZeroPolicy,
    opts: &SynthOptions,
) -> Option<Fragment> {
    let z = Zero::new(prog, file, opts);
    let (expr, lines) = match policy {
        ZeroPolicy::Fill => z.fill(t, Ctx::default(), None, &mut Visited::new())?,
        ZeroPolicy::Return => (z.ret(t)?, 0),
    };
    Some(Fragment {
        node: Node::Expr(expr),
        lines,
    })
}

/// Values reserved for the fields of the outermost literal.
#[derive(Debug, Default)]
pub(crate) struct TopLevel<'a> {
    /// Field name to the value already written in the literal.
    pub existing: Vec<(String, Expr)>,
    pub donors: Option<&'a Donors>,
}

impl TopLevel<'_> {
    fn existing(&self, field: &str) -> Option<&Expr> {
        self.existing
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, e)| e)
    }
}

/// How the literal being built is written.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Ctx {
    /// The enclosing literal implies the type, so it is left out.
    pub hide_type: bool,
    /// Defined type to show instead of the bare struct.
    pub named: Option<TypeRef>,
    /// Reached through a pointer: written `&T{...}`.
    pub pointer: bool,
}

pub(crate) struct Zero<'a> {
    prog: &'a Program,
    q: Qualifier<'a>,
    opts: &'a SynthOptions,
}

/// An expression and the number of lines it adds.
type Synth = (Expr, usize);

/// Structs whose fields are being expanded, outermost first.
pub(crate) type Visited = SmallVec<[TypeRef; 8]>;

impl<'a> Zero<'a> {
    pub fn new(prog: &'a Program, file: FileId, opts: &'a SynthOptions) -> Self {
        Zero {
            prog,
            q: Qualifier::new(prog, file),
            opts,
        }
    }

    fn spell(&self, t: TypeRef) -> Option<String> {
        match type_string(self.prog, t, &self.q) {
            Ok(s) => Some(s),
            Err(e) => {
                debug!(error = %e, "type cannot be written here");
                None
            }
        }
    }

    /// Fill-policy zero value. `top` is only passed for the outermost struct and survives
    /// unwrapping its defined type; `visited` holds the structs being expanded.
    pub fn fill(
        &self,
        t: TypeRef,
        ctx: Ctx,
        top: Option<&TopLevel<'_>>,
        visited: &mut Visited,
    ) -> Option<Synth> {
        let types = &self.prog.types;
        match types.get(t) {
            Type::Basic { kind, .. } => basic_zero(*kind).map(|s| (Expr::atom(s), 0)),
            Type::Named(n) => {
                let under = types.underlying(t);
                let named = if types.is_struct(under) {
                    Some(t)
                } else {
                    ctx.named
                };
                if types.is_invalid(under) {
                    debug!(name = %n.name, "defined type has no known underlying type");
                    return None;
                }
                self.fill(under, Ctx { named, ..ctx }, top, visited)
            }
            Type::Struct { fields } => self.struct_lit(t, fields, ctx, top, visited),
            Type::Pointer { elem } => {
                if types.is_struct(*elem) {
                    let ctx = Ctx {
                        pointer: true,
                        named: None,
                        ..ctx
                    };
                    self.fill(*elem, ctx, None, visited)
                } else {
                    Some((Expr::atom("nil"), 0))
                }
            }
            Type::Interface { .. } => Some((Expr::atom("nil"), 0)),
            Type::Slice { .. } => {
                let ty = self.literal_type(t, ctx)?;
                Some((Expr::Composite { ty, elems: Vec::new() }, 2))
            }
            Type::Array { elem, len } => {
                let ty = self.literal_type(t, ctx)?;
                let mut elems = Vec::new();
                let mut lines = 2;
                let hidden = Ctx {
                    hide_type: true,
                    ..Ctx::default()
                };
                for _ in 0..*len {
                    if let Some((v, l)) = self.fill(*elem, hidden, None, visited) {
                        elems.push(Element::Value(v));
                        lines += l + 1;
                    }
                }
                Some((Expr::Composite { ty, elems }, lines))
            }
            Type::Map { key, elem } => {
                let ty = self.literal_type(t, ctx)?;
                let hidden = Ctx {
                    hide_type: true,
                    ..Ctx::default()
                };
                let mut lines = 2;
                let mut elems = Vec::new();
                let k = self.fill(*key, hidden, None, visited);
                let v = self.fill(*elem, hidden, None, visited);
                match (k, v) {
                    (Some((key, kl)), Some((value, vl))) => {
                        lines += kl + vl;
                        elems.push(Element::Keyed { key, value });
                    }
                    _ => debug!("map entry has no zero key or value"),
                }
                Some((Expr::Composite { ty, elems }, lines))
            }
            Type::Chan { .. } => Some((Expr::Make(self.spell(t)?), 0)),
            Type::Signature(sig) => {
                let mut text = String::new();
                if let Err(e) = write_signature(self.prog, sig, &self.q, &mut text) {
                    debug!(error = %e, "signature cannot be written here");
                    return None;
                }
                Some((Expr::FuncStub { sig: text }, 0))
            }
        }
    }

    /// The type written in front of a slice, array or map literal.
    fn literal_type(&self, t: TypeRef, ctx: Ctx) -> Option<Option<String>> {
        if ctx.hide_type {
            return Some(None);
        }
        self.spell(t).map(Some)
    }

    fn struct_lit(
        &self,
        t: TypeRef,
        fields: &[Field],
        ctx: Ctx,
        top: Option<&TopLevel<'_>>,
        visited: &mut Visited,
    ) -> Option<Synth> {
        let ty = if ctx.hide_type {
            None
        } else {
            Some(self.spell(ctx.named.unwrap_or(t))?)
        };
        let wrap = |elems: Vec<Element>| {
            let lit = Expr::Composite { ty, elems };
            if ctx.pointer && !ctx.hide_type {
                Expr::AddrOf(Box::new(lit))
            } else {
                lit
            }
        };
        if visited.contains(&t) {
            return Some((wrap(Vec::new()), 0));
        }

        let foreign = ctx
            .named
            .and_then(|n| self.prog.types.as_named(n))
            .is_some_and(|n| self.q.is_foreign(n.unit));
        visited.push(t);
        let mut elems = Vec::new();
        let mut nested = 0;
        for field in fields {
            if field.name.starts_with(&self.opts.reserved_prefix) {
                continue;
            }
            let key = Expr::atom(field.name.clone());
            if let Some(value) = top.and_then(|top| top.existing(&field.name)) {
                nested += verbatim_lines(value);
                elems.push(Element::Keyed {
                    key,
                    value: value.clone(),
                });
                continue;
            }
            if foreign && !field.is_exported() {
                debug!(field = %field.name, "unexported field of a foreign type");
                continue;
            }
            let donor = top
                .and_then(|top| top.donors)
                .and_then(|d| d.get(&field.name));
            if let Some(value) = donor {
                debug!(field = %field.name, "reusing donor value");
                elems.push(Element::Keyed {
                    key,
                    value: value.clone(),
                });
                continue;
            }
            match self.fill(field.ty, Ctx::default(), None, visited) {
                Some((value, lines)) => {
                    nested += lines;
                    elems.push(Element::Keyed { key, value });
                }
                None => debug!(field = %field.name, "no zero value, field left out"),
            }
        }
        visited.pop();

        let lines = if elems.is_empty() {
            0
        } else {
            nested + elems.len() + 2
        };
        Some((wrap(elems), lines))
    }

    /// Return-policy zero value.
    pub fn ret(&self, t: TypeRef) -> Option<Expr> {
        let types = &self.prog.types;
        match types.get(types.underlying(t)) {
            Type::Basic { kind, .. } => {
                let v = basic_zero(*kind);
                if v.is_none() {
                    debug!(kind = kind.name(), "no zero value for result");
                }
                v.map(Expr::atom)
            }
            Type::Struct { .. } | Type::Array { .. } => Some(Expr::Composite {
                ty: Some(self.spell(t)?),
                elems: Vec::new(),
            }),
            Type::Pointer { .. }
            | Type::Slice { .. }
            | Type::Map { .. }
            | Type::Chan { .. }
            | Type::Signature(_)
            | Type::Interface { .. } => Some(Expr::atom("nil")),
            Type::Named(_) => None,
        }
    }
}

/// Lines a carried-over value adds beyond its own.
fn verbatim_lines(e: &Expr) -> usize {
    match e {
        Expr::Verbatim(text) => text.lines().count().saturating_sub(1),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_basic_kind_has_a_decision() {
        for kind in BasicKind::ALL {
            let z = basic_zero(kind);
            assert_eq!(
                z.is_none(),
                kind == BasicKind::Invalid || kind.is_untyped(),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn basic_spellings() {
        assert_eq!(basic_zero(BasicKind::Bool), Some("false"));
        assert_eq!(basic_zero(BasicKind::Int64), Some("0"));
        assert_eq!(basic_zero(BasicKind::Uint8), Some("0"));
        assert_eq!(basic_zero(BasicKind::Uintptr), Some("uintptr(0)"));
        assert_eq!(
            basic_zero(BasicKind::UnsafePointer),
            Some("unsafe.Pointer(uintptr(0))")
        );
        assert_eq!(basic_zero(BasicKind::Float32), Some("0.0"));
        assert_eq!(basic_zero(BasicKind::Complex128), Some("(0 + 0i)"));
        assert_eq!(basic_zero(BasicKind::String), Some("\"\""));
    }
}
