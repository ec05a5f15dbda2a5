use std::collections::HashMap;

use reftools_syntax::ast::{AstArena, Expr as AstExpr, ExprId};
use reftools_syntax::walk::{walk_file, Visitor, Walk};
use tracing::{debug, info_span};

use super::zero::{Ctx, TopLevel, Visited, Zero};
use super::{resolve_donors, SynthOptions, Synthesized};
use crate::error::{ErrorKind, Result};
use crate::fragment::{Expr, Fragment, Node};
use crate::loader::Loaded;
use crate::types::Type;

/// Finds the innermost composite literal enclosing an offset.
struct LitFinder {
    offset: u32,
    found: Option<ExprId>,
    /// Keys and values of literal elements, mapped to the literal holding them.
    parents: HashMap<ExprId, ExprId>,
}

impl<'ast> Visitor<'ast> for LitFinder {
    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        if !a.exprs.span(id).encloses(self.offset) {
            return;
        }
        let expr = &a.exprs[id];
        if let AstExpr::CompositeLit { lit, .. } = expr {
            self.found = Some(id);
            for el in a.keyed_elems_list(lit.elements) {
                if let Some(key) = el.key {
                    self.parents.insert(key, id);
                }
                self.parents.insert(el.value, id);
            }
        }
        expr.walk(a, self);
    }
}

/// Fills the struct literal around the loaded offset with a value for every field.
///
/// Fields already written in the literal keep their text; other fields take a donor
/// value from an in-scope struct variable when one has a field of the same name, and a
/// zero value otherwise.
pub fn fill_struct(loaded: &Loaded, opts: &SynthOptions) -> Result<Synthesized> {
    let span = info_span!("fill_struct", offset = loaded.offset);
    let _enter = span.enter();

    let prog = &loaded.program;
    let file = loaded.source();
    let arena = &file.parsed.arena;

    let mut finder = LitFinder {
        offset: loaded.offset,
        found: None,
        parents: HashMap::new(),
    };
    walk_file(arena, &file.parsed.root, &mut finder);
    let lit_id = finder.found.ok_or(ErrorKind::NoStructLiteral)?;
    let lit_ty = prog
        .type_of(loaded.file, lit_id)
        .ok_or(ErrorKind::NoStructLiteral)?;
    let Some(fields) = prog.types.struct_fields(lit_ty) else {
        debug!("literal at offset is not a struct");
        return Err(ErrorKind::NoStructLiteral.into());
    };

    let hide_type = finder
        .parents
        .get(&lit_id)
        .and_then(|&parent| prog.type_of(loaded.file, parent))
        .is_some_and(|parent| {
            matches!(
                prog.types.get(prog.types.underlying(parent)),
                Type::Array { .. } | Type::Slice { .. } | Type::Map { .. }
            )
        });

    let AstExpr::CompositeLit { lit, .. } = arena.exprs[lit_id] else {
        return Err(ErrorKind::NoStructLiteral.into());
    };
    let mut existing = Vec::new();
    for (i, el) in arena.keyed_elems_list(lit.elements).iter().enumerate() {
        let name = match el.key.map(|k| &arena.exprs[k]) {
            Some(AstExpr::Ident(sym)) => file.parsed.name(*sym).to_string(),
            Some(_) => continue,
            None => match fields.get(i) {
                Some(f) => f.name.clone(),
                None => continue,
            },
        };
        let text = file.parsed.text(arena.exprs.span(el.value));
        existing.push((name, Expr::Verbatim(text.to_string())));
    }

    let pos = loaded.pos();
    let donors = resolve_donors(
        prog,
        &prog.scope_chain(pos),
        lit_ty,
        pos,
        prog.file(loaded.file).unit,
    );
    debug!(donors = donors.len(), existing = existing.len(), hide_type, "filling");

    let top = TopLevel {
        existing,
        donors: Some(&donors),
    };
    let ctx = Ctx {
        hide_type,
        ..Ctx::default()
    };
    let zero = Zero::new(prog, loaded.file, opts);
    let (expr, lines) = zero
        .fill(lit_ty, ctx, Some(&top), &mut Visited::new())
        .ok_or_else(|| ErrorKind::TypeResolution("type of the literal".to_string()))?;

    let lit_span = arena.exprs.span(lit_id);
    Ok(Synthesized {
        start: lit_span.start as usize,
        end: lit_span.end as usize,
        fragment: Fragment {
            node: Node::Expr(expr),
            lines,
        },
    })
}
