//! Renders fragments as Go source.
//!
//! [`Mode::Gofmt`] follows gofmt's layout for composite literals: one element per line
//! with a trailing comma, tab indentation, and keyed values aligned in a column within
//! each section. A section ends at a multi-line element, or where the key widths differ
//! too much (gofmt's geometric-mean ratio rule). [`Mode::Compact`] prints everything on
//! one line.

use crate::fragment::{Element, Expr, Fragment, Node, Stmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Gofmt,
    Compact,
}

/// Keys up to this width are always aligned with their neighbours.
const SMALL_KEY: usize = 40;
/// Maximum ratio between a key and the section's geometric mean key size.
const KEY_RATIO: f64 = 2.5;

const NOT_IMPLEMENTED: &str = "panic(\"not implemented\")";

pub fn print_fragment(fragment: &Fragment, mode: Mode) -> String {
    match &fragment.node {
        Node::Expr(e) => print_expr(e, mode),
        Node::Stmt(s) => print_stmt(s, mode),
    }
}

pub fn print_expr(e: &Expr, mode: Mode) -> String {
    let mut p = Printer::new(mode, 0);
    p.expr(e);
    p.out
}

pub fn print_stmt(s: &Stmt, mode: Mode) -> String {
    let mut p = Printer::new(mode, 0);
    p.stmt(s);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
    mode: Mode,
}

impl Printer {
    fn new(mode: Mode, indent: usize) -> Self {
        Printer {
            out: String::new(),
            indent,
            mode,
        }
    }

    fn sub(&self, e: &Expr) -> String {
        let mut p = Printer::new(self.mode, self.indent);
        p.expr(e);
        p.out
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn expr(&mut self, e: &Expr) {
        match e {
            Expr::Atom(text) => self.out.push_str(text),
            Expr::Verbatim(text) => self.verbatim(text),
            Expr::Composite { ty, elems } => {
                if let Some(ty) = ty {
                    self.out.push_str(ty);
                }
                self.out.push('{');
                match self.mode {
                    _ if elems.is_empty() => {}
                    Mode::Compact => {
                        for (i, el) in elems.iter().enumerate() {
                            if i > 0 {
                                self.out.push_str(", ");
                            }
                            if let Element::Keyed { key, .. } = el {
                                self.expr(key);
                                self.out.push_str(": ");
                            }
                            self.expr(el.value());
                        }
                    }
                    Mode::Gofmt => self.elements(elems),
                }
                self.out.push('}');
            }
            Expr::AddrOf(inner) => {
                self.out.push('&');
                self.expr(inner);
            }
            Expr::Make(ty) => {
                self.out.push_str("make(");
                self.out.push_str(ty);
                self.out.push(')');
            }
            Expr::FuncStub { sig } => {
                self.out.push_str("func");
                self.out.push_str(sig);
                self.out.push_str(" {");
                match self.mode {
                    Mode::Compact => {
                        self.out.push(' ');
                        self.out.push_str(NOT_IMPLEMENTED);
                        self.out.push(' ');
                    }
                    Mode::Gofmt => {
                        self.indent += 1;
                        self.newline();
                        self.out.push_str(NOT_IMPLEMENTED);
                        self.indent -= 1;
                        self.newline();
                    }
                }
                self.out.push('}');
            }
            Expr::Call { func, args } => {
                self.out.push_str(func);
                self.out.push('(');
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(a);
                }
                self.out.push(')');
            }
            Expr::Binary { left, op, right } => {
                self.expr(left);
                self.out.push(' ');
                self.out.push_str(op);
                self.out.push(' ');
                self.expr(right);
            }
        }
    }

    /// Element lines of a non-empty literal, between the braces.
    fn elements(&mut self, elems: &[Element]) {
        self.indent += 1;
        let rendered: Vec<(Option<String>, String)> = elems
            .iter()
            .map(|el| match el {
                Element::Value(v) => (None, self.sub(v)),
                Element::Keyed { key, value } => (Some(self.sub(key)), self.sub(value)),
            })
            .collect();
        let sections = sections(&rendered);
        let mut widths = vec![0usize; sections.last().map_or(0, |s| s + 1)];
        for ((key, _), &section) in rendered.iter().zip(&sections) {
            if let Some(key) = key {
                widths[section] = widths[section].max(key.chars().count());
            }
        }
        for ((key, value), &section) in rendered.iter().zip(&sections) {
            self.newline();
            if let Some(key) = key {
                self.out.push_str(key);
                self.out.push(':');
                for _ in key.chars().count()..widths[section] {
                    self.out.push(' ');
                }
                self.out.push(' ');
            }
            self.out.push_str(value);
            self.out.push(',');
        }
        self.indent -= 1;
        self.newline();
    }

    /// Re-indents carried-over text so its continuation lines sit under the current
    /// indentation.
    fn verbatim(&mut self, text: &str) {
        let mut lines = text.lines();
        let Some(first) = lines.next() else {
            return;
        };
        self.out.push_str(first.trim_end());
        if self.mode == Mode::Compact {
            for line in lines {
                self.out.push('\n');
                self.out.push_str(line);
            }
            return;
        }
        let rest: Vec<&str> = lines.collect();
        let common = rest
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start().len())
            .min()
            .unwrap_or(0);
        for line in rest {
            if line.trim().is_empty() {
                self.out.push('\n');
                continue;
            }
            self.newline();
            self.out.push_str(line[common..].trim_end());
        }
    }

    fn stmt(&mut self, s: &Stmt) {
        match s {
            Stmt::Return(values) => {
                self.out.push_str("return");
                for (i, v) in values.iter().enumerate() {
                    self.out.push_str(if i == 0 { " " } else { ", " });
                    self.expr(v);
                }
            }
            Stmt::If { cond, body } => {
                self.out.push_str("if ");
                self.expr(cond);
                self.out.push_str(" {");
                match self.mode {
                    Mode::Compact => {
                        for s in body {
                            self.out.push(' ');
                            self.stmt(s);
                        }
                        self.out.push_str(" }");
                    }
                    Mode::Gofmt => {
                        self.indent += 1;
                        for s in body {
                            self.newline();
                            self.stmt(s);
                        }
                        self.indent -= 1;
                        self.newline();
                        self.out.push('}');
                    }
                }
            }
        }
    }
}

/// Alignment section index for every element.
fn sections(rendered: &[(Option<String>, String)]) -> Vec<usize> {
    let mut out = Vec::with_capacity(rendered.len());
    let mut section = 0;
    let mut prev_size = 0usize;
    let mut lnsum = 0.0f64;
    let mut count = 0usize;
    for (i, (key, value)) in rendered.iter().enumerate() {
        let size = if value.contains('\n') {
            0
        } else {
            key.as_ref().unwrap_or(value).chars().count()
        };
        if i > 0 {
            let mut break_here = true;
            if prev_size > 0 && size > 0 {
                if count == 0 || (prev_size <= SMALL_KEY && size <= SMALL_KEY) {
                    break_here = false;
                } else {
                    let geomean = (lnsum / count as f64).exp();
                    let ratio = size as f64 / geomean;
                    break_here = KEY_RATIO * ratio <= 1.0 || KEY_RATIO <= ratio;
                }
            }
            if break_here {
                section += 1;
            }
        }
        if size > 0 {
            lnsum += (size as f64).ln();
            count += 1;
        }
        prev_size = size;
        out.push(section);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(key: &str, value: Expr) -> Element {
        Element::Keyed {
            key: Expr::atom(key),
            value,
        }
    }

    fn lit(ty: Option<&str>, elems: Vec<Element>) -> Expr {
        Expr::Composite {
            ty: ty.map(str::to_string),
            elems,
        }
    }

    #[test]
    fn aligns_keyed_values() {
        let e = lit(
            Some("T"),
            vec![
                keyed("X", Expr::atom("0")),
                keyed("Name", Expr::atom("\"\"")),
            ],
        );
        assert_eq!(print_expr(&e, Mode::Gofmt), "T{\n\tX:    0,\n\tName: \"\",\n}");
        assert_eq!(print_expr(&e, Mode::Compact), "T{X: 0, Name: \"\"}");
    }

    #[test]
    fn multi_line_values_break_alignment() {
        let inner = lit(Some("Inner"), vec![keyed("A", Expr::atom("0"))]);
        let e = lit(
            Some("T"),
            vec![
                keyed("Long", Expr::atom("0")),
                keyed("In", inner),
                keyed("B", Expr::atom("0")),
            ],
        );
        assert_eq!(
            print_expr(&e, Mode::Gofmt),
            "T{\n\tLong: 0,\n\tIn: Inner{\n\t\tA: 0,\n\t},\n\tB: 0,\n}"
        );
    }

    #[test]
    fn very_different_long_keys_start_a_new_section() {
        let long = "K".repeat(120);
        let e = lit(
            None,
            vec![
                keyed(&"k".repeat(41), Expr::atom("0")),
                keyed(&long, Expr::atom("0")),
            ],
        );
        let out = print_expr(&e, Mode::Gofmt);
        assert!(out.contains(&format!("\t{}: 0,", "k".repeat(41))), "{out}");
    }

    #[test]
    fn empty_literals_and_elided_types() {
        assert_eq!(print_expr(&lit(Some("T"), vec![]), Mode::Gofmt), "T{}");
        let arr = lit(
            Some("[2]int"),
            vec![Element::Value(Expr::atom("0")), Element::Value(Expr::atom("0"))],
        );
        assert_eq!(print_expr(&arr, Mode::Gofmt), "[2]int{\n\t0,\n\t0,\n}");
        assert_eq!(print_expr(&arr, Mode::Compact), "[2]int{0, 0}");
    }

    #[test]
    fn func_stubs_panic() {
        let stub = Expr::FuncStub {
            sig: "(int) error".to_string(),
        };
        assert_eq!(
            print_expr(&stub, Mode::Gofmt),
            "func(int) error {\n\tpanic(\"not implemented\")\n}"
        );
    }

    #[test]
    fn verbatim_text_is_reindented() {
        let e = lit(
            Some("T"),
            vec![keyed(
                "In",
                Expr::Verbatim("Inner{\n\t\t\t\tA: 1,\n\t\t\t}".to_string()),
            )],
        );
        assert_eq!(
            print_expr(&e, Mode::Gofmt),
            "T{\n\tIn: Inner{\n\t\tA: 1,\n\t},\n}"
        );
    }

    #[test]
    fn guarded_return() {
        let s = Stmt::If {
            cond: Expr::Binary {
                left: Box::new(Expr::atom("err")),
                op: "!=",
                right: Box::new(Expr::atom("nil")),
            },
            body: vec![Stmt::Return(vec![Expr::atom("0"), Expr::atom("err")])],
        };
        assert_eq!(
            print_stmt(&s, Mode::Gofmt),
            "if err != nil {\n\treturn 0, err\n}"
        );
        assert_eq!(print_stmt(&s, Mode::Compact), "if err != nil { return 0, err }");
    }
}
