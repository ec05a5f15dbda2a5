//! # Go-subset syntax tree
//!
//! Arena-allocated AST for the part of Go that the synthesis tools need to read: package
//! clauses, imports, declarations, function bodies and every expression form.
//!
//! ## Architecture
//!
//! - **Nodes**: allocated in typed arenas (`SpannedArena<T>`), referenced by `Id<T>`
//! - **Lists**: centralized buffers in `ExtraData`, referenced by `ListRef<T>`
//! - **Spans**: byte offsets local to the file, stored in side tables next to each node
//! - **Symbols**: identifiers are interned once per file
//!
//! Walk/Visitor infrastructure lives in `crate::walk`; `#[derive(WalkAst)]` generates the
//! per-node traversal.

use ast_derive::WalkAst;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::HashMap;

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Byte range inside one source file. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Inclusive containment: a cursor sitting right after the closing token still counts.
    #[inline]
    pub const fn encloses(&self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }

    #[inline]
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        &src[self.start as usize..self.end as usize]
    }
}

/// Type-safe identifier for arena-allocated nodes. The trait impls are written by hand so
/// they hold for any `T`, node types included.
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }
}

/// Typed reference into a centralized list buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.start + self.len
    }
}

// =============================================================================
// Symbol Interning
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Symbol(u32);

pub type Ident = Symbol;

impl Symbol {
    #[inline]
    pub const fn from_raw(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Identifier occurrence (interned symbol + source position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct IdentName {
    pub sym: Ident,
    pub pos: Span,
}

/// Per-file string interner.
#[derive(Debug, Default)]
pub struct Interner {
    map: HashMap<Box<str>, Symbol>,
    strings: Vec<Box<str>>,
}

impl Interner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let boxed: Box<str> = s.into();
        let sym = Symbol(self.strings.len() as u32);
        self.map.insert(boxed.clone(), sym);
        self.strings.push(boxed);
        sym
    }

    /// Looks a string up without interning it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings
            .get(sym.0 as usize)
            .map(AsRef::as_ref)
            .unwrap_or("")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

/// Nodes and their spans in parallel vectors.
#[derive(Debug)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }

    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    /// Widens a node's span after the fact (used once trailing tokens are known).
    #[inline]
    pub fn set_span(&mut self, id: Id<T>, span: Span) {
        self.spans[id.to_usize()] = span;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        (0..self.data.len() as u32).map(Id::from_raw)
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

// =============================================================================
// Node IDs
// =============================================================================

pub type DeclId = Id<GenDecl>;
pub type StmtId = Id<Stmt>;
pub type SimpleStmtId = Id<SimpleStmt>;
pub type ExprId = Id<Expr>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;
pub type FuncDeclId = Id<FuncDecl>;
pub type SwitchClauseId = Id<SwitchClause>;
pub type CommClauseId = Id<CommClause>;

// =============================================================================
// Centralized List Storage
// =============================================================================

#[derive(Debug, Default)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub exprs: Vec<ExprId>,
    pub stmts: Vec<StmtId>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub keyed_elems: Vec<KeyedElement>,
    pub top_decls: Vec<TopLevelDecl>,
    pub switch_clause_ids: Vec<SwitchClauseId>,
    pub comm_clause_ids: Vec<CommClauseId>,
    pub type_case_elems: Vec<TypeCaseElem>,
    pub type_terms: Vec<TypeTerm>,
    pub interface_elems: Vec<InterfaceElem>,
}

// =============================================================================
// Main AST Arena
// =============================================================================

#[derive(Debug, Default)]
pub struct AstArena {
    pub decls: SpannedArena<GenDecl>,
    pub stmts: SpannedArena<Stmt>,
    pub simple_stmts: SpannedArena<SimpleStmt>,
    pub exprs: SpannedArena<Expr>,
    pub types: SpannedArena<Type>,
    pub signatures: SpannedArena<Signature>,
    pub funcs: SpannedArena<FuncDecl>,
    pub fields: SpannedArena<Field>,
    pub switch_clauses: SpannedArena<SwitchClause>,
    pub comm_clauses: SpannedArena<CommClause>,
    pub extras: ExtraData,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(len <= u32::MAX as usize);
        ListRef::new(start as u32, len as u32)
    }

    #[inline]
    fn slice<T>(buf: &[T], r: ListRef<T>) -> &[T] {
        &buf[r.start() as usize..r.end() as usize]
    }

    // List Builders

    pub fn list_ident_names(
        &mut self,
        i: impl IntoIterator<Item = IdentName>,
    ) -> ListRef<IdentName> {
        Self::push_list(&mut self.extras.ident_names, i)
    }

    pub fn list_exprs(&mut self, i: impl IntoIterator<Item = ExprId>) -> ListRef<ExprId> {
        Self::push_list(&mut self.extras.exprs, i)
    }

    pub fn list_stmts(&mut self, i: impl IntoIterator<Item = StmtId>) -> ListRef<StmtId> {
        Self::push_list(&mut self.extras.stmts, i)
    }

    pub fn list_types(&mut self, i: impl IntoIterator<Item = TypeId>) -> ListRef<TypeId> {
        Self::push_list(&mut self.extras.types, i)
    }

    pub fn list_fields(&mut self, i: impl IntoIterator<Item = FieldId>) -> ListRef<FieldId> {
        Self::push_list(&mut self.extras.fields, i)
    }

    pub fn list_keyed_elems(
        &mut self,
        i: impl IntoIterator<Item = KeyedElement>,
    ) -> ListRef<KeyedElement> {
        Self::push_list(&mut self.extras.keyed_elems, i)
    }

    pub fn list_specs(&mut self, i: impl IntoIterator<Item = Spec>) -> ListRef<Spec> {
        Self::push_list(&mut self.extras.specs, i)
    }

    pub fn list_top_decls(
        &mut self,
        i: impl IntoIterator<Item = TopLevelDecl>,
    ) -> ListRef<TopLevelDecl> {
        Self::push_list(&mut self.extras.top_decls, i)
    }

    pub fn list_switch_clause_ids(
        &mut self,
        i: impl IntoIterator<Item = SwitchClauseId>,
    ) -> ListRef<SwitchClauseId> {
        Self::push_list(&mut self.extras.switch_clause_ids, i)
    }

    pub fn list_comm_clause_ids(
        &mut self,
        i: impl IntoIterator<Item = CommClauseId>,
    ) -> ListRef<CommClauseId> {
        Self::push_list(&mut self.extras.comm_clause_ids, i)
    }

    pub fn list_type_cases(
        &mut self,
        i: impl IntoIterator<Item = TypeCaseElem>,
    ) -> ListRef<TypeCaseElem> {
        Self::push_list(&mut self.extras.type_case_elems, i)
    }

    pub fn list_type_terms(&mut self, i: impl IntoIterator<Item = TypeTerm>) -> ListRef<TypeTerm> {
        Self::push_list(&mut self.extras.type_terms, i)
    }

    pub fn list_interface_elems(
        &mut self,
        i: impl IntoIterator<Item = InterfaceElem>,
    ) -> ListRef<InterfaceElem> {
        Self::push_list(&mut self.extras.interface_elems, i)
    }

    // List Accessors

    pub fn ident_names(&self, r: ListRef<IdentName>) -> &[IdentName] {
        Self::slice(&self.extras.ident_names, r)
    }

    pub fn exprs_list(&self, r: ListRef<ExprId>) -> &[ExprId] {
        Self::slice(&self.extras.exprs, r)
    }

    pub fn stmts_list(&self, r: ListRef<StmtId>) -> &[StmtId] {
        Self::slice(&self.extras.stmts, r)
    }

    pub fn types_list(&self, r: ListRef<TypeId>) -> &[TypeId] {
        Self::slice(&self.extras.types, r)
    }

    pub fn fields_list(&self, r: ListRef<FieldId>) -> &[FieldId] {
        Self::slice(&self.extras.fields, r)
    }

    pub fn keyed_elems_list(&self, r: ListRef<KeyedElement>) -> &[KeyedElement] {
        Self::slice(&self.extras.keyed_elems, r)
    }

    pub fn specs_list(&self, r: ListRef<Spec>) -> &[Spec] {
        Self::slice(&self.extras.specs, r)
    }

    pub fn top_decls(&self, r: ListRef<TopLevelDecl>) -> &[TopLevelDecl] {
        Self::slice(&self.extras.top_decls, r)
    }

    pub fn switch_clause_ids(&self, r: ListRef<SwitchClauseId>) -> &[SwitchClauseId] {
        Self::slice(&self.extras.switch_clause_ids, r)
    }

    pub fn comm_clause_ids(&self, r: ListRef<CommClauseId>) -> &[CommClauseId] {
        Self::slice(&self.extras.comm_clause_ids, r)
    }

    pub fn type_case_elems(&self, r: ListRef<TypeCaseElem>) -> &[TypeCaseElem] {
        Self::slice(&self.extras.type_case_elems, r)
    }

    pub fn type_terms(&self, r: ListRef<TypeTerm>) -> &[TypeTerm] {
        Self::slice(&self.extras.type_terms, r)
    }

    pub fn interface_elems(&self, r: ListRef<InterfaceElem>) -> &[InterfaceElem] {
        Self::slice(&self.extras.interface_elems, r)
    }

    /// Result types of a signature in declaration order, one entry per declared name.
    pub fn result_types(&self, sig: SignatureId) -> SmallVec<[TypeId; 4]> {
        let mut out = SmallVec::new();
        match self.signatures[sig].results {
            None => {}
            Some(Results::Type(t)) => out.push(t),
            Some(Results::Params(list)) => {
                for &f in self.fields_list(list.fields) {
                    let field = &self.fields[f];
                    let n = field.names.len().max(1);
                    for _ in 0..n {
                        out.push(field.typ);
                    }
                }
            }
        }
        out
    }
}

// =============================================================================
// Source File (Root Node)
// =============================================================================

/// `SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct SourceFile {
    #[walk(skip)]
    pub package_pos: Span,
    pub name: IdentName,
    /// Imports and all other top-level declarations in source order.
    pub decls: ListRef<TopLevelDecl>,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDeclId),
}

/// import / const / type / var, grouped or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct GenDecl {
    #[walk(skip)]
    pub kw_pos: Span,
    pub kind: GenDeclKind,
    #[walk(skip)]
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    #[walk(skip)]
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `ImportSpec = [ "." | PackageName ] ImportPath`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    pub path: StringLit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ImportName {
    Dot(#[walk(skip)] Span),
    Blank(#[walk(skip)] Span),
    Name(IdentName),
}

/// const or var spec. For a const spec with no values, `values` is empty and the checker
/// repeats the previous spec's type; `iota` is the spec's index inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ValueSpec {
    pub names: ListRef<IdentName>,
    pub typ: Option<TypeId>,
    pub values: ListRef<ExprId>,
    pub iota: u32,
}

/// `TypeSpec = AliasDecl | TypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSpec {
    pub name: IdentName,
    #[walk(skip)]
    pub assign_pos: Option<Span>,
    pub typ: TypeId,
    pub alias: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FuncDecl {
    #[walk(skip)]
    pub func_pos: Span,
    pub recv: Option<Receiver>,
    pub name: IdentName,
    pub signature: SignatureId,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Receiver {
    #[walk(skip)]
    pub l_paren: Span,
    pub name: Option<IdentName>,
    pub typ: TypeId,
    #[walk(skip)]
    pub r_paren: Span,
}

// =============================================================================
// Signatures and Fields
// =============================================================================

/// `Signature = Parameters [ Result ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Results {
    Params(FieldList),
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FieldList {
    #[walk(skip)]
    pub l_paren: Span,
    pub fields: ListRef<FieldId>,
    #[walk(skip)]
    pub r_paren: Span,
}

/// Parameter, result, or struct field. Embedded struct fields have no names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Field {
    pub names: ListRef<IdentName>,
    #[walk(skip)]
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    pub tag: Option<StringLit>,
    pub is_embed: bool,
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum SimpleStmt {
    Empty(#[walk(skip)] Span),
    Expr(ExprId),

    /// `ch <- v`
    Send {
        chan: ExprId,
        #[walk(skip)]
        op_pos: Span,
        value: ExprId,
    },

    /// `x++` / `x--`
    IncDec {
        expr: ExprId,
        op: IncDecOp,
        #[walk(skip)]
        op_pos: Span,
    },

    /// `x = y`, `x += y`
    Assign {
        lhs: ListRef<ExprId>,
        op: AssignOp,
        #[walk(skip)]
        op_pos: Span,
        rhs: ListRef<ExprId>,
    },

    /// `x := y`
    ShortVarDecl {
        names: ListRef<IdentName>,
        #[walk(skip)]
        op_pos: Span,
        values: ListRef<ExprId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Stmt {
    Simple(SimpleStmtId),
    Decl(DeclId),

    Labeled {
        label: IdentName,
        #[walk(skip)]
        colon_pos: Span,
        stmt: StmtId,
    },

    Go {
        #[walk(skip)]
        go_pos: Span,
        call: ExprId,
    },

    Defer {
        #[walk(skip)]
        defer_pos: Span,
        call: ExprId,
    },

    Return {
        #[walk(skip)]
        return_pos: Span,
        results: ListRef<ExprId>,
    },

    Branch(BranchStmt),

    Block(Block),

    If {
        #[walk(skip)]
        if_pos: Span,
        init: Option<SimpleStmtId>,
        cond: ExprId,
        then_block: Block,
        else_stmt: Option<StmtId>,
    },

    For {
        #[walk(skip)]
        for_pos: Span,
        kind: ForKind,
        block: Block,
    },

    Switch {
        #[walk(skip)]
        switch_pos: Span,
        init: Option<SimpleStmtId>,
        tag: Option<ExprId>,
        clauses: ListRef<SwitchClauseId>,
    },

    TypeSwitch {
        #[walk(skip)]
        switch_pos: Span,
        init: Option<SimpleStmtId>,
        guard: TypeSwitchGuard,
        clauses: ListRef<SwitchClauseId>,
    },

    Select {
        #[walk(skip)]
        select_pos: Span,
        clauses: ListRef<CommClauseId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ForKind {
    Infinite,
    Cond(ExprId),
    ForClause {
        init: Option<SimpleStmtId>,
        cond: Option<ExprId>,
        post: Option<SimpleStmtId>,
    },
    Range {
        lhs: Option<RangeLhs>,
        #[walk(skip)]
        range_pos: Span,
        expr: ExprId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum RangeLhs {
    /// `k, v :=`
    Def { idents: ListRef<IdentName> },
    /// `k, v =`
    Assign { exprs: ListRef<ExprId> },
}

/// Case clause of an expression or type switch. Empty `items` means `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum SwitchClause {
    ExprCase {
        #[walk(skip)]
        case_pos: Span,
        items: ListRef<ExprId>,
        #[walk(skip)]
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
    TypeCase {
        #[walk(skip)]
        case_pos: Span,
        items: ListRef<TypeCaseElem>,
        #[walk(skip)]
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
}

/// `case <comm>:` of a select; `comm` is `None` for `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct CommClause {
    #[walk(skip)]
    pub case_pos: Span,
    pub comm: Option<SimpleStmtId>,
    #[walk(skip)]
    pub colon_pos: Span,
    pub stmts: ListRef<StmtId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum BranchStmt {
    Break(Option<IdentName>),
    Continue(Option<IdentName>),
    Goto(IdentName),
    Fallthrough,
}

/// `Block = "{" StatementList "}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub l_brace: Span,
    pub stmts: ListRef<StmtId>,
    pub r_brace: Span,
}

impl Block {
    #[inline]
    pub fn span(&self) -> Span {
        self.l_brace.to(self.r_brace)
    }
}

/// `TypeSwitchGuard = [ identifier ":=" ] PrimaryExpr "." "(" "type" ")"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSwitchGuard {
    pub bind: Option<IdentName>,
    pub x: ExprId,
}

// =============================================================================
// Expressions
// =============================================================================

/// `LiteralValue = "{" [ ElementList [ "," ] ] "}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct LiteralValue {
    #[walk(skip)]
    pub l_brace: Span,
    pub elements: ListRef<KeyedElement>,
    #[walk(skip)]
    pub r_brace: Span,
}

/// `KeyedElement = [ Key ":" ] Element`. Struct field keys are `Expr::Ident`; elided
/// nested literals are `Expr::CompositeLit` with no type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct KeyedElement {
    pub key: Option<ExprId>,
    #[walk(skip)]
    pub colon_pos: Option<Span>,
    pub value: ExprId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Expr {
    Ident(Ident),

    BasicLit(BasicLit),

    FuncLit {
        sig: SignatureId,
        body: Block,
    },

    /// `T{...}`, or `{...}` when the type is implied by the enclosing literal.
    CompositeLit {
        typ: Option<TypeId>,
        lit: LiteralValue,
    },

    Paren(ExprId),

    Selector {
        expr: ExprId,
        sel: IdentName,
    },

    /// `a[i]`, or `F[T1, T2]`.
    Index {
        base: ExprId,
        indices: ListRef<ExprId>,
    },

    /// `a[lo:hi]` / `a[lo:hi:max]`
    Slice {
        expr: ExprId,
        lo: Option<ExprId>,
        hi: Option<ExprId>,
        max: Option<ExprId>,
    },

    /// `x.(T)`; `typ` is `None` for `x.(type)` inside a type switch guard.
    TypeAssert {
        expr: ExprId,
        typ: Option<TypeId>,
    },

    /// Call or conversion. Type operands (`make([]T, n)`) appear as `Expr::Type`.
    Call {
        callee: ExprId,
        args: ListRef<ExprId>,
        #[walk(skip)]
        ellipsis: Option<Span>,
    },

    Unary {
        op: UnaryOp,
        expr: ExprId,
    },

    Binary {
        left: ExprId,
        op: BinaryOp,
        right: ExprId,
    },

    /// A type in expression position: `[]int` in `[]int(x)`, `chan T` in `make(chan T)`.
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicLit {
    pub kind: BasicLitKind,
    pub raw: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BasicLitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLit {
    pub raw: Span,
}

impl StringLit {
    /// Literal contents without quotes; escapes are left as written.
    pub fn unquoted<'s>(&self, src: &'s str) -> &'s str {
        let raw = self.raw.text(src);
        if raw.len() >= 2 {
            &raw[1..raw.len() - 1]
        } else {
            raw
        }
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Type {
    /// `Name` or `pkg.Name`
    Named {
        pkg: Option<IdentName>,
        name: IdentName,
    },

    Pointer {
        elem: TypeId,
    },

    Array {
        len: ArrayLen,
        elem: TypeId,
    },

    Slice {
        elem: TypeId,
    },

    Map {
        key: TypeId,
        val: TypeId,
    },

    Chan {
        dir: ChanDir,
        elem: TypeId,
    },

    Struct {
        fields: ListRef<FieldId>,
    },

    Interface {
        elems: ListRef<InterfaceElem>,
    },

    Func {
        sig: SignatureId,
    },

    Paren {
        typ: TypeId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ArrayLen {
    /// `[10]int`
    Expr(ExprId),
    /// `[...]int`
    Ellipsis(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TypeCaseElem {
    Type(TypeId),
    Nil(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeTerm {
    pub tilde: bool,
    pub typ: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum InterfaceElem {
    Method { name: IdentName, sig: SignatureId },
    /// Embedded interface or a union of terms.
    TypeElem { terms: ListRef<TypeTerm> },
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Add,   // +
    Sub,   // -
    Not,   // !
    Xor,   // ^
    Deref, // *
    Addr,  // &
    Recv,  // <-
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    Mod,    // %
    And,    // &
    Or,     // |
    Xor,    // ^
    Shl,    // <<
    Shr,    // >>
    AndNot, // &^
    LAnd,   // &&
    LOr,    // ||
    Eq,     // ==
    Ne,     // !=
    Lt,     // <
    Le,     // <=
    Gt,     // >
    Ge,     // >=
}

impl BinaryOp {
    /// Go operator precedence, 5 binds tightest.
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOp::LOr => 1,
            BinaryOp::LAnd => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,       // =
    AddAssign,    // +=
    SubAssign,    // -=
    MulAssign,    // *=
    DivAssign,    // /=
    ModAssign,    // %=
    AndAssign,    // &=
    OrAssign,     // |=
    XorAssign,    // ^=
    ShlAssign,    // <<=
    ShrAssign,    // >>=
    AndNotAssign, // &^=
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc, // ++
    Dec, // --
}

/// Parse result for one file: the arena, its interner, the root node and the source text
/// spans refer to.
#[derive(Debug)]
pub struct ParsedFile {
    pub arena: AstArena,
    pub interner: Interner,
    pub root: SourceFile,
    pub src: String,
}

impl ParsedFile {
    #[inline]
    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    #[inline]
    pub fn text(&self, span: Span) -> &str {
        span.text(&self.src)
    }

    #[inline]
    pub fn package_name(&self) -> &str {
        self.name(self.root.name.sym)
    }

    pub fn top_decls(&self) -> &[TopLevelDecl] {
        self.arena.top_decls(self.root.decls)
    }

    /// Import specs in source order.
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> + '_ {
        self.top_decls()
            .iter()
            .filter_map(|d| match d {
                TopLevelDecl::Decl(id) => Some(&self.arena.decls[*id]),
                TopLevelDecl::Func(_) => None,
            })
            .filter(|g| g.kind == GenDeclKind::Import)
            .flat_map(|g| self.arena.specs_list(g.specs))
            .filter_map(|s| match s {
                Spec::Import(i) => Some(i),
                _ => None,
            })
    }
}
