//! Lenient type checker.
//!
//! Builds the [`Program`] for a set of parsed units: package, file, function and block
//! scopes with global positions, named types, method sets, signatures, variable types and
//! a type for every expression it understands. Anything it does not understand gets the
//! invalid type and a debug event; checking itself never fails.

mod expr;
mod stmt;
mod typexpr;

use std::collections::HashMap;
use std::path::PathBuf;

use reftools_syntax::ast::{
    ExprId, GenDeclKind, ImportName, ListRef, ParsedFile, Spec, TopLevelDecl, TypeId, ValueSpec,
};
use tracing::{debug, debug_span};

use crate::program::{
    Builtin, FileId, ObjId, ObjKind, Object, Pos, Program, ScopeId, ScopeKind, SourceFile, Unit,
    UnitId,
};
use crate::types::{BasicKind, TypeRef, TypeTable};

/// One package as handed over by the loader. Units must come dependencies first.
#[derive(Debug)]
pub struct UnitInput {
    pub path: String,
    pub files: Vec<FileInput>,
    pub opaque: bool,
    /// Check function bodies too (only needed for the unit being edited).
    pub check_bodies: bool,
}

#[derive(Debug)]
pub struct FileInput {
    pub path: PathBuf,
    pub parsed: ParsedFile,
}

/// Checks every unit and assembles the program.
pub fn check(units: Vec<UnitInput>) -> Program {
    let mut prog = Program {
        types: TypeTable::new(),
        ..Program::default()
    };
    let universe = declare_universe(&mut prog);
    prog.universe = Some(universe);

    let mut by_path: HashMap<String, UnitId> = HashMap::new();
    let mut next_base: Pos = 1;
    let mut all_files: Vec<(FileMeta, ParsedFile)> = Vec::new();

    for input in units {
        let span = debug_span!("check_unit", path = %input.path);
        let _enter = span.enter();

        let name = input
            .files
            .first()
            .map(|f| f.parsed.package_name().to_string())
            .unwrap_or_else(|| last_path_element(&input.path).to_string());
        let scope = prog.new_scope(ScopeKind::Package, Some(universe), 0, Pos::MAX);
        let unit = prog.add_unit(Unit {
            path: input.path.clone(),
            name,
            files: Vec::new(),
            scope,
            opaque: input.opaque,
        });
        by_path.insert(input.path.clone(), unit);

        let mut metas = Vec::with_capacity(input.files.len());
        let mut parsed = Vec::with_capacity(input.files.len());
        for f in input.files {
            let base = next_base;
            next_base += f.parsed.src.len() as u32 + 1;
            let end = base + f.parsed.src.len() as u32 + 1;
            let file_scope = prog.new_scope(ScopeKind::File, Some(scope), base, end);
            metas.push(FileMeta {
                path: f.path,
                unit,
                base,
                scope: file_scope,
                import_names: HashMap::new(),
                id: FileId(0),
            });
            parsed.push(f.parsed);
        }

        // File ids are assigned in load order, matching the base positions.
        let first_id = all_files.len() as u32;
        for (i, m) in metas.iter_mut().enumerate() {
            m.id = FileId(first_id + i as u32);
        }
        prog.unit_mut(unit).files = metas.iter().map(|m| m.id).collect();

        let mut uc = UnitChecker {
            prog: &mut prog,
            unit,
            files: &parsed,
            metas: &mut metas,
            by_path: &by_path,
            cur: 0,
            pending: HashMap::new(),
            iota: None,
        };
        uc.run(input.check_bodies);

        all_files.extend(metas.into_iter().zip(parsed));
    }

    for (meta, parsed) in all_files {
        prog.add_file(SourceFile {
            path: meta.path,
            unit: meta.unit,
            base: meta.base,
            parsed,
            scope: meta.scope,
            import_names: meta.import_names,
        });
    }
    prog
}

fn last_path_element(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug)]
struct FileMeta {
    path: PathBuf,
    unit: UnitId,
    base: Pos,
    scope: ScopeId,
    import_names: HashMap<String, String>,
    id: FileId,
}

fn declare_universe(prog: &mut Program) -> ScopeId {
    let universe = prog.new_scope(ScopeKind::Universe, None, 0, Pos::MAX);
    let declare = |prog: &mut Program, name: &str, kind: ObjKind, ty: TypeRef| {
        prog.declare(
            universe,
            Object {
                name: name.to_string(),
                kind,
                ty,
                pos: 0,
            },
        );
    };

    for kind in BasicKind::ALL {
        if kind == BasicKind::Invalid || kind == BasicKind::UnsafePointer || kind.is_untyped() {
            continue;
        }
        let ty = prog.types.basic(kind);
        declare(prog, kind.name(), ObjKind::TypeName, ty);
    }
    let named = [
        ("byte", prog.types.byte()),
        ("rune", prog.types.rune()),
        ("error", prog.types.error()),
        ("any", prog.types.empty_interface()),
        ("comparable", prog.types.empty_interface()),
    ];
    for (name, ty) in named {
        declare(prog, name, ObjKind::TypeName, ty);
    }

    let untyped_bool = prog.types.basic(BasicKind::UntypedBool);
    declare(prog, "true", ObjKind::Const, untyped_bool);
    declare(prog, "false", ObjKind::Const, untyped_bool);
    let untyped_int = prog.types.basic(BasicKind::UntypedInt);
    declare(prog, "iota", ObjKind::Const, untyped_int);
    let untyped_nil = prog.types.basic(BasicKind::UntypedNil);
    declare(prog, "nil", ObjKind::Nil, untyped_nil);

    let builtins = [
        ("append", Builtin::Append),
        ("cap", Builtin::Cap),
        ("clear", Builtin::Clear),
        ("close", Builtin::Close),
        ("complex", Builtin::Complex),
        ("copy", Builtin::Copy),
        ("delete", Builtin::Delete),
        ("imag", Builtin::Imag),
        ("len", Builtin::Len),
        ("make", Builtin::Make),
        ("max", Builtin::Max),
        ("min", Builtin::Min),
        ("new", Builtin::New),
        ("panic", Builtin::Panic),
        ("print", Builtin::Print),
        ("println", Builtin::Println),
        ("real", Builtin::Real),
        ("recover", Builtin::Recover),
    ];
    let invalid = prog.types.invalid();
    for (name, b) in builtins {
        declare(prog, name, ObjKind::Builtin(b), invalid);
    }
    universe
}

/// Package-level declarations whose types are computed on first use.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Alias {
        file: usize,
        typ: TypeId,
    },
    Value {
        file: usize,
        spec: ValueSpec,
        /// Type and values a const spec without values repeats.
        inherited: Option<(Option<TypeId>, ListRef<ExprId>)>,
        index: usize,
        is_const: bool,
    },
}

pub(crate) struct UnitChecker<'a> {
    prog: &'a mut Program,
    unit: UnitId,
    files: &'a [ParsedFile],
    metas: &'a mut Vec<FileMeta>,
    by_path: &'a HashMap<String, UnitId>,
    /// Index of the file whose AST is being looked at.
    cur: usize,
    pending: HashMap<ObjId, Pending>,
    iota: Option<i128>,
}

impl<'a> UnitChecker<'a> {
    fn file(&self) -> &'a ParsedFile {
        &self.files[self.cur]
    }

    fn file_id(&self) -> FileId {
        self.metas[self.cur].id
    }

    fn file_scope(&self) -> ScopeId {
        self.metas[self.cur].scope
    }

    fn package_scope(&self) -> ScopeId {
        self.prog.unit(self.unit).scope
    }

    #[inline]
    fn pos(&self, offset: u32) -> Pos {
        self.metas[self.cur].base + offset
    }

    fn name(&self, sym: reftools_syntax::ast::Symbol) -> &'a str {
        self.file().name(sym)
    }

    /// Runs `f` with `file` as the current file.
    fn in_file<R>(&mut self, file: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = (self.cur, self.iota.take());
        self.cur = file;
        let r = f(self);
        self.cur = saved.0;
        self.iota = saved.1;
        r
    }

    fn run(&mut self, check_bodies: bool) {
        for i in 0..self.files.len() {
            self.in_file(i, |c| c.collect_imports());
        }
        for i in 0..self.files.len() {
            self.in_file(i, |c| c.collect_decls());
        }
        for i in 0..self.files.len() {
            self.in_file(i, |c| c.resolve_type_decls());
        }
        for i in 0..self.files.len() {
            self.in_file(i, |c| c.resolve_funcs());
        }
        let pending: Vec<ObjId> = {
            let mut ids: Vec<ObjId> = self.pending.keys().copied().collect();
            ids.sort();
            ids
        };
        for obj in pending {
            self.object_type(obj);
        }
        if check_bodies {
            for i in 0..self.files.len() {
                self.in_file(i, |c| c.check_bodies());
            }
        }
    }

    fn collect_imports(&mut self) {
        let file = self.file();
        let scope = self.file_scope();
        for spec in file.imports() {
            let path = spec.path.unquoted(&file.src).to_string();
            if path == "C" {
                continue;
            }
            let Some(&dep) = self.by_path.get(&path) else {
                debug!(%path, "import was not loaded");
                continue;
            };
            let pos = self.pos(spec.path.raw.start);
            match spec.name {
                Some(ImportName::Blank(_)) => {}
                Some(ImportName::Dot(_)) => self.dot_import(scope, dep, pos),
                Some(ImportName::Name(n)) => {
                    let local = file.name(n.sym).to_string();
                    self.metas[self.cur]
                        .import_names
                        .insert(path.clone(), local.clone());
                    self.declare_pkg_name(scope, local, dep, pos);
                }
                None => {
                    let local = self.prog.unit(dep).name.clone();
                    self.declare_pkg_name(scope, local, dep, pos);
                }
            }
        }
    }

    fn declare_pkg_name(&mut self, scope: ScopeId, name: String, dep: UnitId, pos: Pos) {
        let invalid = self.prog.types.invalid();
        self.prog.declare(
            scope,
            Object {
                name,
                kind: ObjKind::PkgName(dep),
                ty: invalid,
                pos,
            },
        );
    }

    fn dot_import(&mut self, scope: ScopeId, dep: UnitId, pos: Pos) {
        let dep_scope = self.prog.unit(dep).scope;
        let exported: Vec<(String, ObjKind, TypeRef)> = self
            .prog
            .scope(dep_scope)
            .objects()
            .map(|id| self.prog.object(id))
            .filter(|o| crate::types::is_exported(&o.name))
            .map(|o| (o.name.clone(), o.kind, o.ty))
            .collect();
        for (name, kind, ty) in exported {
            self.prog.declare(scope, Object { name, kind, ty, pos });
        }
    }

    fn collect_decls(&mut self) {
        let file = self.file();
        let pkg = self.package_scope();
        let invalid = self.prog.types.invalid();
        for decl in file.top_decls() {
            match *decl {
                TopLevelDecl::Func(id) => {
                    let func = &file.arena.funcs[id];
                    if func.recv.is_some() {
                        continue;
                    }
                    let name = self.name(func.name.sym);
                    if name == "init" || name == "_" {
                        continue;
                    }
                    let pos = self.pos(func.name.pos.start);
                    self.prog.declare(
                        pkg,
                        Object {
                            name: name.to_string(),
                            kind: ObjKind::Func,
                            ty: invalid,
                            pos,
                        },
                    );
                }
                TopLevelDecl::Decl(id) => {
                    let decl = file.arena.decls[id];
                    let mut inherited = None;
                    for spec in file.arena.specs_list(decl.specs) {
                        match *spec {
                            Spec::Import(_) => {}
                            Spec::Type(ts) => self.collect_type_spec(pkg, ts),
                            Spec::Value(vs) => {
                                let is_const = decl.kind == GenDeclKind::Const;
                                if is_const && !vs.values.is_empty() {
                                    inherited = Some((vs.typ, vs.values));
                                }
                                self.collect_value_spec(pkg, vs, is_const, inherited);
                            }
                        }
                    }
                }
            }
        }
    }

    fn collect_type_spec(&mut self, scope: ScopeId, ts: reftools_syntax::ast::TypeSpec) {
        let name = self.name(ts.name.sym);
        let pos = self.pos(ts.name.pos.start);
        let unit = self.unit;
        let ty = if ts.alias {
            self.prog.types.invalid()
        } else {
            self.prog.types.new_named(name, Some(unit))
        };
        let obj = self.prog.declare(
            scope,
            Object {
                name: name.to_string(),
                kind: ObjKind::TypeName,
                ty,
                pos,
            },
        );
        if let (Some(obj), true) = (obj, ts.alias) {
            self.pending.insert(
                obj,
                Pending::Alias {
                    file: self.cur,
                    typ: ts.typ,
                },
            );
        }
    }

    fn collect_value_spec(
        &mut self,
        scope: ScopeId,
        vs: ValueSpec,
        is_const: bool,
        inherited: Option<(Option<TypeId>, ListRef<ExprId>)>,
    ) {
        let invalid = self.prog.types.invalid();
        let names = self.file().arena.ident_names(vs.names);
        for (index, n) in names.iter().enumerate() {
            let name = self.name(n.sym).to_string();
            let pos = self.pos(n.pos.start);
            let obj = self.prog.declare(
                scope,
                Object {
                    name,
                    kind: if is_const { ObjKind::Const } else { ObjKind::Var },
                    ty: invalid,
                    pos,
                },
            );
            if let Some(obj) = obj {
                self.pending.insert(
                    obj,
                    Pending::Value {
                        file: self.cur,
                        spec: vs,
                        inherited,
                        index,
                        is_const,
                    },
                );
            }
        }
    }

    /// Underlying types of the package's defined types.
    fn resolve_type_decls(&mut self) {
        let file = self.file();
        let pkg = self.package_scope();
        let scope = self.file_scope();
        for decl in file.top_decls() {
            let TopLevelDecl::Decl(id) = *decl else {
                continue;
            };
            for spec in file.arena.specs_list(file.arena.decls[id].specs) {
                let Spec::Type(ts) = *spec else {
                    continue;
                };
                let Some(obj) = self.prog.scope(pkg).lookup(self.name(ts.name.sym)) else {
                    continue;
                };
                if ts.alias {
                    self.object_type(obj);
                    continue;
                }
                let named = self.prog.object(obj).ty;
                if self.prog.types.as_named(named).is_none() {
                    continue;
                }
                let under = self.resolve_type(scope, ts.typ);
                self.prog.types.set_underlying(named, under);
            }
        }
    }

    /// Function signatures and method sets.
    fn resolve_funcs(&mut self) {
        let file = self.file();
        let pkg = self.package_scope();
        let scope = self.file_scope();
        for decl in file.top_decls() {
            let TopLevelDecl::Func(id) = *decl else {
                continue;
            };
            let func = file.arena.funcs[id];
            let sig = self.resolve_signature(scope, func.signature);
            self.prog.func_types.insert((self.file_id(), id), sig);
            let name = self.name(func.name.sym);
            match func.recv {
                Some(recv) => {
                    let Some(base) = self.receiver_base(scope, recv.typ) else {
                        debug!(method = name, "receiver base type not found");
                        continue;
                    };
                    self.prog.types.add_method(
                        base,
                        crate::types::Method {
                            name: name.to_string(),
                            sig,
                        },
                    );
                }
                None => {
                    if let Some(obj) = self.prog.scope(pkg).lookup(name) {
                        if self.prog.object(obj).kind == ObjKind::Func {
                            self.prog.set_object_type(obj, sig);
                        }
                    }
                }
            }
        }
    }

    /// The declared type of an object, computing it first if it is still pending.
    fn object_type(&mut self, obj: ObjId) -> TypeRef {
        if let Some(p) = self.pending.remove(&obj) {
            let ty = match p {
                Pending::Alias { file, typ } => self.in_file(file, |c| {
                    let scope = c.file_scope();
                    c.resolve_type(scope, typ)
                }),
                Pending::Value {
                    file,
                    spec,
                    inherited,
                    index,
                    is_const,
                } => self.in_file(file, |c| {
                    let scope = c.file_scope();
                    c.value_spec_type(scope, obj, spec, inherited, index, is_const)
                }),
            };
            self.prog.set_object_type(obj, ty);
        }
        self.prog.object(obj).ty
    }

    /// Type of the `index`-th name of a var or const spec, recording a constant value
    /// when there is one.
    fn value_spec_type(
        &mut self,
        scope: ScopeId,
        obj: ObjId,
        spec: ValueSpec,
        inherited: Option<(Option<TypeId>, ListRef<ExprId>)>,
        index: usize,
        is_const: bool,
    ) -> TypeRef {
        let (typ, values) = if is_const && spec.values.is_empty() {
            inherited.unwrap_or((spec.typ, spec.values))
        } else {
            (spec.typ, spec.values)
        };
        let values = self.file().arena.exprs_list(values);
        if is_const {
            self.iota = Some(spec.iota as i128);
        }
        let declared = typ.map(|t| self.resolve_type(scope, t));

        let ty = if values.len() == 1 && spec.names.len() > 1 {
            let results = self.expr_multi(scope, values[0]);
            results
                .get(index)
                .copied()
                .unwrap_or_else(|| self.prog.types.invalid())
        } else if let Some(&value) = values.get(index) {
            if is_const {
                if let Some(v) = self.const_value(scope, value) {
                    self.prog.const_vals.insert(obj, v);
                }
            }
            self.expr(scope, value, declared)
        } else {
            self.prog.types.invalid()
        };
        self.iota = None;

        match declared {
            Some(t) => t,
            None if is_const => ty,
            None => self.prog.types.default_type(ty),
        }
    }

    fn check_bodies(&mut self) {
        let file = self.file();
        let scope = self.file_scope();
        for decl in file.top_decls() {
            let TopLevelDecl::Func(id) = *decl else {
                continue;
            };
            let func = file.arena.funcs[id];
            let Some(body) = func.body else {
                continue;
            };
            let span = file.arena.funcs.span(id);
            self.func_body(
                scope,
                span.start,
                body.r_brace.end,
                func.signature,
                func.recv,
                &body,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn check_one(src: &str) -> Program {
        let parsed = reftools_syntax::parse_source(src).expect("parse");
        check(vec![UnitInput {
            path: "example.com/p".to_string(),
            files: vec![FileInput {
                path: PathBuf::from("/p/p.go"),
                parsed,
            }],
            opaque: false,
            check_bodies: true,
        }])
    }

    fn package_object<'p>(prog: &'p Program, name: &str) -> &'p Object {
        let (_, unit) = prog.units().next().expect("unit");
        let obj = prog.scope(unit.scope).lookup(name).expect("object");
        prog.object(obj)
    }

    #[test]
    fn infers_package_var_types_in_any_order() {
        let prog = check_one("package p\nvar a = b\nvar b = T{}\ntype T struct{ X int }\n");
        let a = package_object(&prog, "a");
        let t = package_object(&prog, "T");
        assert_eq!(a.ty, t.ty);
    }

    #[test]
    fn array_lengths_use_constants() {
        let prog = check_one("package p\nconst (\n\tA = iota + 2\n\tB\n)\nvar v [B * 2]int\n");
        let v = package_object(&prog, "v");
        assert!(matches!(prog.types.get(v.ty), Type::Array { len: 6, .. }));
    }

    #[test]
    fn array_lengths_from_len_of_arrays() {
        let prog = check_one("package p\nvar a [3]int\nvar p *[5]int\nvar v [len(a) + cap(p)]bool\n");
        let v = package_object(&prog, "v");
        assert!(matches!(prog.types.get(v.ty), Type::Array { len: 8, .. }));
    }

    #[test]
    fn unknown_array_lengths_are_invalid() {
        let prog = check_one("package p\nvar s []int\nvar v [len(s)]bool\nvar w [n]bool\n");
        assert!(prog.types.is_invalid(package_object(&prog, "v").ty));
        assert!(prog.types.is_invalid(package_object(&prog, "w").ty));
    }

    #[test]
    fn ellipsis_array_literals_count_their_elements() {
        let prog = check_one("package p\nvar v = [...]string{\"a\", 4: \"e\"}\n");
        let v = package_object(&prog, "v");
        assert!(matches!(prog.types.get(v.ty), Type::Array { len: 5, .. }));
    }

    #[test]
    fn constants_of_imported_units_size_arrays() {
        let dep = reftools_syntax::parse_source("package dep\nconst N = 1 << 2\n").expect("parse");
        let app = reftools_syntax::parse_source(
            "package app\nimport \"example.com/dep\"\nvar v [dep.N]byte\n",
        )
        .expect("parse");
        let unit = |path: &str, file: &str, parsed| UnitInput {
            path: path.to_string(),
            files: vec![FileInput {
                path: PathBuf::from(file),
                parsed,
            }],
            opaque: false,
            check_bodies: true,
        };
        let prog = check(vec![
            unit("example.com/dep", "/dep/dep.go", dep),
            unit("example.com/app", "/app/app.go", app),
        ]);
        let (_, app) = prog.units().nth(1).expect("unit");
        let v = prog.scope(app.scope).lookup("v").expect("object");
        assert!(matches!(
            prog.types.get(prog.object(v).ty),
            Type::Array { len: 4, .. }
        ));
    }

    #[test]
    fn aliases_share_the_target() {
        let prog = check_one("package p\ntype A = B\ntype B struct{}\n");
        assert_eq!(
            package_object(&prog, "A").ty,
            package_object(&prog, "B").ty
        );
    }

    #[test]
    fn multi_value_var_specs_take_their_result() {
        let prog = check_one("package p\nfunc f() (int, string) { return 0, \"\" }\nvar x, y = f()\n");
        let y = package_object(&prog, "y");
        assert_eq!(y.ty, prog.types.basic(BasicKind::String));
    }

    #[test]
    fn methods_are_attached_to_receivers() {
        let prog = check_one("package p\ntype T struct{}\nfunc (t *T) Name() string { return \"\" }\n");
        let t = package_object(&prog, "T").ty;
        let m = prog.types.lookup_member(t, "Name").expect("method");
        assert!(prog.types.as_signature(m).is_some());
    }
}
