use reftools_syntax::ast::{
    AssignOp, AstArena, Expr as AstExpr, ExprId, SimpleStmt, Stmt as AstStmt, StmtId,
    TopLevelDecl,
};
use reftools_syntax::ParsedFile;
use tracing::{debug, info_span};

use super::zero::Zero;
use super::{SynthOptions, Synthesized};
use crate::error::{ErrorKind, Result};
use crate::fragment::{Expr, Fragment, Node, Stmt};
use crate::loader::Loaded;

/// Builds `if err != nil { return <zero values>, fmt.Errorf("<func>: <call> failed, %w", err) }`
/// for the function around the loaded offset, to be inserted at the offset.
pub fn error_check(loaded: &Loaded, opts: &SynthOptions) -> Result<Synthesized> {
    let span = info_span!("error_check", offset = loaded.offset);
    let _enter = span.enter();

    let prog = &loaded.program;
    let parsed = &loaded.source().parsed;
    let arena = &parsed.arena;
    let offset = loaded.offset;

    let func_id = parsed
        .top_decls()
        .iter()
        .find_map(|d| match *d {
            TopLevelDecl::Func(id) if arena.funcs.span(id).encloses(offset) => Some(id),
            _ => None,
        })
        .ok_or(ErrorKind::NoEnclosingFunc)?;
    let func = arena.funcs[func_id];
    let func_name = parsed.name(func.name.sym);

    let mut call = opts.fallback_call.clone();
    if let Some(body) = func.body {
        for &stmt in arena.stmts_list(body.stmts) {
            if arena.stmts.span(stmt).start > offset {
                break;
            }
            if let Some(name) = assigned_call(parsed, stmt) {
                call = name;
            }
        }
    }
    debug!(func = func_name, call = %call, "previous call");

    let mut values = Vec::new();
    match prog
        .func_type(loaded.file, func_id)
        .and_then(|t| prog.types.as_signature(t))
    {
        Some(sig) if !sig.results.is_empty() => {
            let zero = Zero::new(prog, loaded.file, opts);
            for &result in &sig.results[..sig.results.len() - 1] {
                match zero.ret(result) {
                    Some(v) => values.push(v),
                    None => debug!("result type has no zero value, left out"),
                }
            }
            let message = opts
                .message
                .replace("{func}", func_name)
                .replace("{call}", &call);
            values.push(Expr::Call {
                func: opts.errorf.clone(),
                args: vec![Expr::string_lit(&message), Expr::atom(opts.err_var.clone())],
            });
        }
        _ => debug!(func = func_name, "function has no results, bare return"),
    }

    let guard = Stmt::If {
        cond: Expr::Binary {
            left: Box::new(Expr::atom(opts.err_var.clone())),
            op: "!=",
            right: Box::new(Expr::atom("nil")),
        },
        body: vec![Stmt::Return(values)],
    };
    Ok(Synthesized {
        start: offset as usize,
        end: offset as usize,
        fragment: Fragment {
            node: Node::Stmt(guard),
            lines: 1,
        },
    })
}

/// Name of the call in `a, b := f()` or `a, b = f()`.
fn assigned_call(parsed: &ParsedFile, stmt: StmtId) -> Option<String> {
    let arena = &parsed.arena;
    let AstStmt::Simple(simple) = arena.stmts[stmt] else {
        return None;
    };
    let (lhs, rhs) = match arena.simple_stmts[simple] {
        SimpleStmt::Assign {
            lhs,
            op: AssignOp::Assign,
            rhs,
            ..
        } => (lhs.len(), arena.exprs_list(rhs)),
        SimpleStmt::ShortVarDecl { names, values, .. } => (names.len(), arena.exprs_list(values)),
        _ => return None,
    };
    let [value] = rhs else {
        return None;
    };
    if lhs < 2 {
        return None;
    }
    match arena.exprs[*value] {
        AstExpr::Call { callee, .. } => callee_name(parsed, arena, callee),
        _ => None,
    }
}

fn callee_name(parsed: &ParsedFile, arena: &AstArena, callee: ExprId) -> Option<String> {
    match arena.exprs[callee] {
        AstExpr::Ident(sym) => Some(parsed.name(sym).to_string()),
        AstExpr::Selector { expr, sel } => {
            let sel = parsed.name(sel.sym);
            Some(match dotted(parsed, arena, expr) {
                Some(path) => format!("{path}.{sel}"),
                None => sel.to_string(),
            })
        }
        AstExpr::Paren(inner) => callee_name(parsed, arena, inner),
        _ => None,
    }
}

/// `a.b.c` for chains of identifiers and selectors.
fn dotted(parsed: &ParsedFile, arena: &AstArena, e: ExprId) -> Option<String> {
    match arena.exprs[e] {
        AstExpr::Ident(sym) => Some(parsed.name(sym).to_string()),
        AstExpr::Selector { expr, sel } => {
            let base = dotted(parsed, arena, expr)?;
            Some(format!("{base}.{}", parsed.name(sel.sym)))
        }
        _ => None,
    }
}
