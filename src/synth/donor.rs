use std::collections::BTreeMap;

use tracing::debug;

use crate::fragment::Expr;
use crate::program::{ObjKind, Pos, Program, Scope, UnitId};
use crate::types::{Type, TypeRef};

/// Field values that in-scope struct variables can lend to a literal, keyed by lowercased
/// field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Donors {
    values: BTreeMap<String, Expr>,
}

impl Donors {
    /// Donor for a field, matched case-insensitively.
    pub fn get(&self, field: &str) -> Option<&Expr> {
        self.values.get(&field.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

struct Candidate<'p> {
    owner: &'p str,
    pos: Pos,
    field: &'p str,
}

/// Collects donors from `chain` (innermost scope first) for a literal of type `lit`.
///
/// Only variables declared at or before `pos` whose type is a struct, or a defined type
/// over one, are considered; a variable of the literal's own struct type is not. When two
/// variables have a field of the same name the one declared first wins. Unexported fields
/// of a struct defined outside `unit` cannot be read and are not offered.
pub fn resolve_donors(
    prog: &Program,
    chain: &[&Scope],
    lit: TypeRef,
    pos: Pos,
    unit: UnitId,
) -> Donors {
    let types = &prog.types;
    let lit_under = types.underlying(lit);
    let mut candidates = Vec::new();
    for scope in chain {
        for id in scope.objects() {
            let obj = prog.object(id);
            if obj.kind != ObjKind::Var || obj.pos > pos {
                continue;
            }
            // Pointers to structs do not lend their fields.
            if !matches!(types.get(obj.ty), Type::Named(_) | Type::Struct { .. }) {
                continue;
            }
            let Type::Struct { fields } = types.get(types.underlying(obj.ty)) else {
                continue;
            };
            if types.underlying(obj.ty) == lit_under {
                continue;
            }
            let foreign = types
                .as_named(obj.ty)
                .and_then(|n| n.unit)
                .is_some_and(|u| u != unit);
            let readable = fields.iter().filter(|f| !foreign || f.is_exported());
            candidates.extend(readable.map(|f| Candidate {
                owner: &obj.name,
                pos: obj.pos,
                field: &f.name,
            }));
        }
    }
    candidates.sort_by_key(|c| c.pos);

    let mut donors = Donors::default();
    for c in candidates {
        let key = c.field.to_lowercase();
        if donors.values.contains_key(&key) {
            continue;
        }
        debug!(owner = c.owner, field = c.field, "donor candidate");
        donors
            .values
            .insert(key, Expr::atom(format!("{}.{}", c.owner, c.field)));
    }
    donors
}
