use crate::ast::{self, Span};

/// One comma-separated entry of a parameter list before grouping. A lone identifier has
/// `typ == None`: it is a name when some entry of the list is written `name Type`,
/// otherwise it is a type.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub names: Vec<ast::IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

/// Groups parameter entries into fields. Either every entry is named (`a, b int, c string`)
/// or none is (`int, string`); a mixed list is resolved as named.
pub fn resolve_param_list(
    arena: &mut ast::AstArena,
    params: Vec<ParamDecl>,
) -> Vec<ast::FieldId> {
    let named = params
        .iter()
        .any(|p| p.typ.is_some() && !p.names.is_empty());
    if named {
        group_named(arena, params)
    } else {
        params
            .into_iter()
            .flat_map(|p| unnamed_fields(arena, p))
            .collect()
    }
}

fn group_named(arena: &mut ast::AstArena, params: Vec<ParamDecl>) -> Vec<ast::FieldId> {
    let mut out = Vec::new();
    let mut pending: Vec<ast::IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;

    for param in params {
        let Some(typ) = param.typ else {
            pending_start.get_or_insert(param.span.start);
            pending.extend(param.names);
            continue;
        };
        let mut names = std::mem::take(&mut pending);
        names.extend(param.names);
        let names = if names.is_empty() {
            ast::ListRef::EMPTY
        } else {
            arena.list_ident_names(names)
        };
        let span = Span {
            start: pending_start.take().unwrap_or(param.span.start),
            end: param.span.end,
        };
        out.push(arena.fields.alloc(
            ast::Field {
                names,
                ellipsis_pos: param.ellipsis_pos,
                typ,
                tag: None,
                is_embed: false,
            },
            span,
        ));
    }

    // Trailing names without a type (`a int, b`); keep them as types so nothing is lost.
    for name in pending {
        out.extend(unnamed_fields(
            arena,
            ParamDecl {
                names: vec![name],
                ellipsis_pos: None,
                typ: None,
                span: name.pos,
            },
        ));
    }
    out
}

/// Fields for an entry of an all-unnamed list: a bare identifier is itself the type.
fn unnamed_fields(arena: &mut ast::AstArena, param: ParamDecl) -> Vec<ast::FieldId> {
    let field = |typ| ast::Field {
        names: ast::ListRef::EMPTY,
        ellipsis_pos: param.ellipsis_pos,
        typ,
        tag: None,
        is_embed: false,
    };
    match param.typ {
        Some(typ) => vec![arena.fields.alloc(field(typ), param.span)],
        None => param
            .names
            .iter()
            .map(|&name| {
                let typ = named_type_from_ident(arena, name);
                arena.fields.alloc(field(typ), name.pos)
            })
            .collect(),
    }
}

pub fn named_type_from_ident(arena: &mut ast::AstArena, name: ast::IdentName) -> ast::TypeId {
    arena
        .types
        .alloc(ast::Type::Named { pkg: None, name }, name.pos)
}
