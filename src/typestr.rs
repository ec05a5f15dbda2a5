//! Spelling types as Go source from the point of view of one file.

use std::fmt::Write;

use crate::error::{ErrorKind, Result};
use crate::program::{FileId, Program, UnitId};
use crate::types::{BasicKind, ChanDir, Signature, Type, TypeRef};

/// Decides how names from other units are written in the current file.
#[derive(Debug, Clone, Copy)]
pub struct Qualifier<'p> {
    prog: &'p Program,
    file: FileId,
    unit: UnitId,
}

impl<'p> Qualifier<'p> {
    pub fn new(prog: &'p Program, file: FileId) -> Self {
        Qualifier {
            prog,
            file,
            unit: prog.file(file).unit,
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Whether `unit` is some other compilation unit than the current file's.
    pub fn is_foreign(&self, unit: Option<UnitId>) -> bool {
        unit.is_some_and(|u| u != self.unit)
    }

    /// The local name for `unit`: the file's import alias, else the package name.
    fn package_name(&self, unit: UnitId) -> &'p str {
        let u = self.prog.unit(unit);
        self.prog
            .file(self.file)
            .import_names
            .get(&u.path)
            .map(String::as_str)
            .filter(|alias| *alias != "." && *alias != "_")
            .unwrap_or(&u.name)
    }
}

/// Renders `t`; fails if a named type in it cannot be referred to from the file.
pub fn type_string(prog: &Program, t: TypeRef, q: &Qualifier<'_>) -> Result<String> {
    let mut out = String::new();
    write_type(prog, t, q, &mut out)?;
    Ok(out)
}

fn write_type(prog: &Program, t: TypeRef, q: &Qualifier<'_>, out: &mut String) -> Result<()> {
    match prog.types.get(t) {
        Type::Basic { kind, name } => match kind {
            BasicKind::Invalid | BasicKind::UntypedNil => {
                return Err(ErrorKind::TypeResolution(kind.name().to_string()).into());
            }
            k if k.is_untyped() => out.push_str(k.default_kind().name()),
            _ => out.push_str(name),
        },
        Type::Named(n) => {
            if q.is_foreign(n.unit) {
                let unit = n.unit.map(|u| q.package_name(u)).unwrap_or_default();
                if !n.is_exported() {
                    return Err(
                        ErrorKind::TypeResolution(format!("{unit}.{} is not exported", n.name))
                            .into(),
                    );
                }
                out.push_str(unit);
                out.push('.');
            }
            out.push_str(&n.name);
        }
        Type::Struct { fields } => {
            out.push_str("struct{");
            for (i, f) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                if !f.embedded {
                    out.push_str(&f.name);
                    out.push(' ');
                }
                write_type(prog, f.ty, q, out)?;
            }
            out.push('}');
        }
        Type::Pointer { elem } => {
            out.push('*');
            write_type(prog, *elem, q, out)?;
        }
        Type::Interface { methods } => {
            out.push_str("interface{");
            for (i, m) in methods.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                out.push_str(&m.name);
                match prog.types.get(m.sig) {
                    Type::Signature(sig) => write_signature(prog, sig, q, out)?,
                    _ => out.push_str("()"),
                }
            }
            out.push('}');
        }
        Type::Slice { elem } => {
            out.push_str("[]");
            write_type(prog, *elem, q, out)?;
        }
        Type::Array { elem, len } => {
            let _ = write!(out, "[{len}]");
            write_type(prog, *elem, q, out)?;
        }
        Type::Map { key, elem } => {
            out.push_str("map[");
            write_type(prog, *key, q, out)?;
            out.push(']');
            write_type(prog, *elem, q, out)?;
        }
        Type::Chan { elem, dir } => {
            out.push_str(match dir {
                ChanDir::Both => "chan ",
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
            });
            // `chan (<-chan T)` needs the parentheses to keep its meaning.
            let nested_recv = *dir == ChanDir::Both
                && matches!(
                    prog.types.get(*elem),
                    Type::Chan {
                        dir: ChanDir::Recv,
                        ..
                    }
                );
            if nested_recv {
                out.push('(');
            }
            write_type(prog, *elem, q, out)?;
            if nested_recv {
                out.push(')');
            }
        }
        Type::Signature(sig) => {
            out.push_str("func");
            write_signature(prog, sig, q, out)?;
        }
    }
    Ok(())
}

/// `(P1, ...P2) R` or `(P) (R1, R2)`, without the `func` keyword.
pub(crate) fn write_signature(
    prog: &Program,
    sig: &Signature,
    q: &Qualifier<'_>,
    out: &mut String,
) -> Result<()> {
    out.push('(');
    for (i, &p) in sig.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let last = i + 1 == sig.params.len();
        match prog.types.get(p) {
            Type::Slice { elem } if sig.variadic && last => {
                out.push_str("...");
                write_type(prog, *elem, q, out)?;
            }
            _ => write_type(prog, p, q, out)?,
        }
    }
    out.push(')');
    match sig.results.as_slice() {
        [] => {}
        [one] => {
            out.push(' ');
            write_type(prog, *one, q, out)?;
        }
        many => {
            out.push_str(" (");
            for (i, &r) in many.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(prog, r, q, out)?;
            }
            out.push(')');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::check::{check, FileInput, UnitInput};

    fn unit(path: &str, file: &str, src: &str, bodies: bool) -> UnitInput {
        UnitInput {
            path: path.to_string(),
            files: vec![FileInput {
                path: PathBuf::from(file),
                parsed: reftools_syntax::parse_source(src).expect("parse"),
            }],
            opaque: false,
            check_bodies: bodies,
        }
    }

    fn render(prog: &Program, name: &str) -> Result<String> {
        let file = prog.file_by_path(std::path::Path::new("/m/main.go")).unwrap();
        let scope = prog.file(file).scope;
        let obj = prog.resolve(scope, name).expect("declared");
        type_string(prog, prog.object(obj).ty, &Qualifier::new(prog, file))
    }

    fn program() -> Program {
        check(vec![
            unit(
                "example.com/dep",
                "/dep/dep.go",
                "package dep\ntype Exported struct{}\ntype hidden int\nvar H hidden\n",
                false,
            ),
            unit(
                "example.com/m",
                "/m/main.go",
                concat!(
                    "package main\n",
                    "import d \"example.com/dep\"\n",
                    "type Local struct{}\n",
                    "var a map[string]*d.Exported\n",
                    "var b func(int, ...string) (Local, error)\n",
                    "var c chan (<-chan int)\n",
                    "var e struct{ X int; d.Exported }\n",
                    "var h = d.H\n",
                    "var i interface{ Name() string }\n",
                ),
                true,
            ),
        ])
    }

    #[test]
    fn foreign_names_use_the_import_alias() {
        let prog = program();
        assert_eq!(render(&prog, "a").unwrap(), "map[string]*d.Exported");
        assert_eq!(render(&prog, "e").unwrap(), "struct{X int; d.Exported}");
    }

    #[test]
    fn signatures_and_channels() {
        let prog = program();
        assert_eq!(
            render(&prog, "b").unwrap(),
            "func(int, ...string) (Local, error)"
        );
        assert_eq!(render(&prog, "c").unwrap(), "chan (<-chan int)");
        assert_eq!(render(&prog, "i").unwrap(), "interface{Name() string}");
    }

    #[test]
    fn unexported_foreign_types_cannot_be_spelled() {
        let prog = program();
        let err = render(&prog, "h").unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::TypeResolution);
    }
}
