use crate::ast::*;

// Core traits
pub trait Walk<'ast> {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V);
}

/// Node-id level hooks. Every default re-enters the derived walk, so an override that wants
/// to keep descending calls `walk` itself.
pub trait Visitor<'ast> {
    #[inline(always)]
    fn visit_source_file(&mut self, a: &'ast AstArena, f: &'ast SourceFile) {
        f.walk(a, self);
    }

    #[inline(always)]
    fn visit_decl(&mut self, a: &'ast AstArena, id: DeclId) {
        a.decls[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_func_decl(&mut self, a: &'ast AstArena, id: FuncDeclId) {
        a.funcs[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_stmt(&mut self, a: &'ast AstArena, id: StmtId) {
        a.stmts[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_simple_stmt(&mut self, a: &'ast AstArena, id: SimpleStmtId) {
        a.simple_stmts[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        a.exprs[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_type(&mut self, a: &'ast AstArena, id: TypeId) {
        a.types[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_field(&mut self, a: &'ast AstArena, id: FieldId) {
        a.fields[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_signature(&mut self, a: &'ast AstArena, id: SignatureId) {
        a.signatures[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_switch_clause(&mut self, a: &'ast AstArena, id: SwitchClauseId) {
        a.switch_clauses[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_comm_clause(&mut self, a: &'ast AstArena, id: CommClauseId) {
        a.comm_clauses[id].walk(a, self);
    }
}

macro_rules! impl_walk_for_ids {
    ($($id:ty => $visit:ident),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $id {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
                    v.$visit(a, *self);
                }
            }
        )*
    };
}

impl_walk_for_ids! {
    DeclId => visit_decl,
    FuncDeclId => visit_func_decl,
    StmtId => visit_stmt,
    SimpleStmtId => visit_simple_stmt,
    ExprId => visit_expr,
    TypeId => visit_type,
    FieldId => visit_field,
    SignatureId => visit_signature,
    SwitchClauseId => visit_switch_clause,
    CommClauseId => visit_comm_clause,
}

pub trait ListSlice<T> {
    fn slice(&self, r: ListRef<T>) -> &[T];
}

impl<'ast, T> Walk<'ast> for ListRef<T>
where
    AstArena: ListSlice<T>,
    T: Walk<'ast> + 'ast,
{
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        for item in a.slice(*self) {
            item.walk(a, v);
        }
    }
}

macro_rules! impl_list_slice {
    ($($t:ty => $getter:ident),* $(,)?) => {
        $(
            impl ListSlice<$t> for AstArena {
                #[inline(always)]
                fn slice(&self, r: ListRef<$t>) -> &[$t] {
                    self.$getter(r)
                }
            }
        )*
    };
}

impl_list_slice! {
    ExprId => exprs_list,
    StmtId => stmts_list,
    TypeId => types_list,
    FieldId => fields_list,
    KeyedElement => keyed_elems_list,
    Spec => specs_list,
    TopLevelDecl => top_decls,
    SwitchClauseId => switch_clause_ids,
    CommClauseId => comm_clause_ids,
    TypeCaseElem => type_case_elems,
    TypeTerm => type_terms,
    InterfaceElem => interface_elems,
    IdentName => ident_names,
}

impl<'ast, T: Walk<'ast>> Walk<'ast> for Option<T> {
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        if let Some(x) = self {
            x.walk(a, v);
        }
    }
}

impl<'ast> Walk<'ast> for Block {
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        self.stmts.walk(a, v);
    }
}

// Leaves
macro_rules! impl_walk_noop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $ty {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, _: &'ast AstArena, _: &mut V) {}
            }
        )*
    };
}

impl_walk_noop! {
    Span,
    Symbol,
    BasicLit,
    StringLit,
    bool,
    u32,
    GenDeclKind,
    BasicLitKind,
    ChanDir,
    UnaryOp,
    BinaryOp,
    AssignOp,
    IncDecOp,
}

/// Visits every node under `file` with `v`.
pub fn walk_file<'ast, V: Visitor<'ast> + ?Sized>(
    a: &'ast AstArena,
    file: &'ast SourceFile,
    v: &mut V,
) {
    v.visit_source_file(a, file);
}
