//! A checked program: units (packages), their files, the scope tree with global
//! positions, and the types recorded for expressions.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use reftools_syntax::ast::{ExprId, FuncDeclId, ParsedFile};

use crate::types::{TypeRef, TypeTable};

/// Global source position: a file's `base` plus a byte offset. `0` is never a valid
/// position, so files are laid out starting at 1 in load order.
pub type Pos = u32;

macro_rules! id_type {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) u32);

            impl $name {
                #[inline]
                pub(crate) fn idx(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

id_type!(UnitId, FileId, ScopeId, ObjId);

#[derive(Debug)]
pub struct Unit {
    /// Import path, or the directory for the target's own unit.
    pub path: String,
    pub name: String,
    pub files: Vec<FileId>,
    pub scope: ScopeId,
    /// Could not be found or parsed; everything it declares is unknown.
    pub opaque: bool,
}

#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub unit: UnitId,
    pub base: Pos,
    pub parsed: ParsedFile,
    pub scope: ScopeId,
    /// Import path to the local name this file binds it to.
    pub import_names: HashMap<String, String>,
}

impl SourceFile {
    pub fn pos(&self, offset: u32) -> Pos {
        self.base + offset
    }

    pub fn end(&self) -> Pos {
        self.base + self.parsed.src.len() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Func,
    Block,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub start: Pos,
    pub end: Pos,
    names: BTreeMap<String, ObjId>,
    children: Vec<ScopeId>,
}

impl Scope {
    /// Half-open on the right, like a block's extent.
    pub fn contains(&self, pos: Pos) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn lookup(&self, name: &str) -> Option<ObjId> {
        self.names.get(name).copied()
    }

    /// Objects in name order.
    pub fn objects(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.names.values().copied()
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Var,
    Const,
    TypeName,
    Func,
    PkgName(UnitId),
    Builtin(Builtin),
    Nil,
}

#[derive(Debug)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    pub ty: TypeRef,
    pub pos: Pos,
}

#[derive(Debug, Default)]
pub struct Program {
    pub types: TypeTable,
    pub(crate) units: Vec<Unit>,
    pub(crate) files: Vec<SourceFile>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) objects: Vec<Object>,
    pub(crate) expr_types: HashMap<(FileId, ExprId), TypeRef>,
    pub(crate) func_types: HashMap<(FileId, FuncDeclId), TypeRef>,
    /// Integer values of constants, for every unit checked so far.
    pub(crate) const_vals: HashMap<ObjId, i128>,
    pub(crate) universe: Option<ScopeId>,
}

impl Program {
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.idx()]
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> + '_ {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (UnitId(i as u32), u))
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.idx()]
    }

    pub fn file_by_path(&self, path: &Path) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.path == path)
            .map(|i| FileId(i as u32))
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.idx()]
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id.idx()]
    }

    /// Type recorded for an expression by the checker.
    pub fn type_of(&self, file: FileId, expr: ExprId) -> Option<TypeRef> {
        self.expr_types.get(&(file, expr)).copied()
    }

    /// Signature type of a function or method declaration.
    pub fn func_type(&self, file: FileId, func: FuncDeclId) -> Option<TypeRef> {
        self.func_types.get(&(file, func)).copied()
    }

    /// Innermost scope containing `pos`, starting from the file scope that holds it.
    pub fn innermost_scope(&self, pos: Pos) -> Option<ScopeId> {
        let file = self
            .files
            .iter()
            .find(|f| f.base <= pos && pos <= f.end())?;
        let mut current = file.scope;
        'descend: loop {
            for &child in self.scope(current).children() {
                if self.scope(child).contains(pos) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Scopes visible at `pos`, innermost first, without the universe.
    pub fn scope_chain(&self, pos: Pos) -> Vec<&Scope> {
        let mut chain = Vec::new();
        let mut next = self.innermost_scope(pos);
        while let Some(id) = next {
            let scope = self.scope(id);
            if scope.kind == ScopeKind::Universe {
                break;
            }
            chain.push(scope);
            next = scope.parent;
        }
        chain
    }

    // Construction, used by the checker.

    pub(crate) fn add_unit(&mut self, unit: Unit) -> UnitId {
        self.units.push(unit);
        UnitId(self.units.len() as u32 - 1)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.idx()]
    }

    pub(crate) fn add_file(&mut self, file: SourceFile) -> FileId {
        self.files.push(file);
        FileId(self.files.len() as u32 - 1)
    }

    pub(crate) fn new_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        start: Pos,
        end: Pos,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent,
            start,
            end,
            names: BTreeMap::new(),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            // File scopes are reached through `files`, not through the package scope.
            if kind != ScopeKind::File {
                self.scopes[parent.idx()].children.push(id);
            }
        }
        id
    }

    /// Declares `obj` in `scope`. An existing binding of the same name is kept, and the
    /// blank identifier is never bound.
    pub(crate) fn declare(&mut self, scope: ScopeId, obj: Object) -> Option<ObjId> {
        if obj.name == "_" || self.scopes[scope.idx()].names.contains_key(&obj.name) {
            return None;
        }
        let id = ObjId(self.objects.len() as u32);
        self.scopes[scope.idx()].names.insert(obj.name.clone(), id);
        self.objects.push(obj);
        Some(id)
    }

    pub(crate) fn set_object_type(&mut self, id: ObjId, ty: TypeRef) {
        self.objects[id.idx()].ty = ty;
    }

    /// Resolves `name` starting at `scope` and walking outwards.
    pub(crate) fn resolve(&self, mut scope: ScopeId, name: &str) -> Option<ObjId> {
        loop {
            let s = self.scope(scope);
            if let Some(obj) = s.lookup(name) {
                return Some(obj);
            }
            scope = s.parent?;
        }
    }

    pub(crate) fn record_expr(&mut self, file: FileId, expr: ExprId, ty: TypeRef) {
        self.expr_types.insert((file, expr), ty);
    }
}
