use proptest::prelude::*;
use reftools_syntax::ast::*;
use reftools_syntax::parse_source;
use reftools_syntax::walk::{walk_file, Visitor};

fn assert_parses(src: &str) -> ParsedFile {
    match parse_source(src) {
        Ok(f) => f,
        Err(f) => panic!("expected parse ok, got diagnostics: {:#?}", f.diags),
    }
}

#[test]
fn parses_imports_and_decls() {
    let file = assert_parses(
        r#"
package main

import (
    "fmt"
    . "math"
    _ "net/http"
    str "strings"
)

const (
    A = iota
    B
    C int = 2
)

var (
    x = 1
    y, z int
)

type (
    T = int
    U struct {
        F T `json:"f"`
        G, H *U
        io.Reader
        *bytes.Buffer
        fmt.Stringer
    }
    V interface {
        M(x int) int
        ~int | ~string
    }
)

func main() {
    fmt.Println(Sqrt(4), str.ToUpper("x"))
}
"#,
    );
    assert_eq!(file.package_name(), "main");

    let imports: Vec<_> = file
        .imports()
        .map(|i| i.path.unquoted(&file.src).to_string())
        .collect();
    assert_eq!(imports, ["fmt", "math", "net/http", "strings"]);

    let named = file
        .imports()
        .filter_map(|i| match i.name {
            Some(ImportName::Name(n)) => Some(file.name(n.sym).to_string()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(named, ["str"]);
}

#[test]
fn const_specs_record_iota() {
    let file = assert_parses("package p\nconst (\n\tA = iota\n\tB\n\tC\n)\n");
    let TopLevelDecl::Decl(id) = file.top_decls()[0] else {
        panic!("expected gen decl");
    };
    let iotas: Vec<u32> = file
        .arena
        .specs_list(file.arena.decls[id].specs)
        .iter()
        .map(|s| match s {
            Spec::Value(v) => v.iota,
            _ => panic!("expected value spec"),
        })
        .collect();
    assert_eq!(iotas, [0, 1, 2]);
}

#[test]
fn parses_statements() {
    assert_parses(
        r#"
package p

func f(x int, ch chan int) int {
    if x < 0 { return -x }
    if v, err := g(); err != nil {
        return v
    } else if x > 1 {
        x--
    } else {
        x++
    }
    for i := 0; i < 10; i++ {
        if i == 5 { break }
        continue
    }
    for range []int{1,2,3} {
    }
    for k, v := range map[string]int{} {
        _, _ = k, v
    }
    for x < 100 {
        x *= 2
    }
outer:
    for {
        break outer
    }
    switch x {
    case 0, 1:
        x++
        fallthrough
    default:
        x = 3
    }
    switch y := any(x).(type) {
    case int, nil:
        _ = y
    case *T:
    }
    select {
    case ch <- x:
        return x
    case v, ok := <-ch:
        _, _ = v, ok
    default:
        return 0
    }
    go func() {}()
    defer close(ch)
    var local = struct{ A int }{A: 1}
    _ = local
    return 0
}
"#,
    );
}

#[test]
fn parses_expressions() {
    assert_parses(
        r#"
package p

func f(a, b, c int, ch chan<- int, rc <-chan int, xs ...string) (n int, err error) {
    _ = a + b*c - (a<<2)
    _ = a == b || a < c && b <= c
    _ = &a
    _ = <-rc
    _ = []int{1,2,3}[0]
    _ = []int{1,2,3}[1:]
    _ = []int{1,2,3}[:2]
    _ = []int{1,2,3}[0:2:3]
    _ = map[string]int{"a":1, "b":2}["a"]
    _ = [...]string{"x", "y"}
    _ = map[string]T{"k": {A: 1}}
    _ = []*T{{A: 1}, &T{}}
    _ = f(a, b, c, ch, rc)
    _ = g(xs...)
    _ = make(chan int, 1)
    _ = new(T)
    _ = (*T)(nil)
    _ = []byte("x")
    _ = 1.5 + 2i + 0x1F + 'a'
    _ = func(x int) bool { return x > 0 }
    return 0, nil
}
"#,
    );
}

#[test]
fn composite_literal_in_if_header_needs_parens() {
    assert_parses("package p\nfunc f() {\n\tif x == (T{}) {\n\t}\n}\n");
    assert_parses("package p\nfunc f() {\n\tfor _, v := range []T{{}} {\n\t\t_ = v\n\t}\n}\n");
}

#[test]
fn keyed_elements_and_elided_literals() {
    let file = assert_parses("package p\nvar v = T{A: 1, B: {C: 2}}\n");
    let lit = file
        .arena
        .exprs
        .ids()
        .find_map(|id| match file.arena.exprs[id] {
            Expr::CompositeLit { typ: Some(_), lit } => Some(lit),
            _ => None,
        })
        .expect("composite literal");
    let elems = file.arena.keyed_elems_list(lit.elements);
    assert_eq!(elems.len(), 2);
    assert!(elems.iter().all(|e| e.key.is_some()));
    assert!(matches!(
        file.arena.exprs[elems[1].value],
        Expr::CompositeLit { typ: None, .. }
    ));

    let lit_span = file.arena.exprs.span(
        file.arena
            .exprs
            .ids()
            .find(|&id| matches!(file.arena.exprs[id], Expr::CompositeLit { typ: Some(_), .. }))
            .unwrap(),
    );
    assert_eq!(file.text(lit_span), "T{A: 1, B: {C: 2}}");
}

#[test]
fn grouped_params_share_type() {
    let file = assert_parses("package p\nfunc f(a, b int, s string) {}\n");
    let TopLevelDecl::Func(id) = file.top_decls()[0] else {
        panic!("expected func");
    };
    let sig = file.arena.funcs[id].signature;
    let fields = file.arena.fields_list(file.arena.signatures[sig].params.fields);
    assert_eq!(fields.len(), 2);
    assert_eq!(file.arena.ident_names(file.arena.fields[fields[0]].names).len(), 2);
}

#[test]
fn unnamed_params_are_types() {
    let file = assert_parses("package p\nfunc f(int, string) (int, error)\n");
    let TopLevelDecl::Func(id) = file.top_decls()[0] else {
        panic!("expected func");
    };
    let f = &file.arena.funcs[id];
    assert!(f.body.is_none());
    assert_eq!(file.arena.result_types(f.signature).len(), 2);
}

fn type_texts(file: &ParsedFile, types: &[TypeId]) -> Vec<String> {
    types
        .iter()
        .map(|&t| file.text(file.arena.types.span(t)).to_string())
        .collect()
}

#[test]
fn unnamed_variadic_param_stays_separate() {
    let file = assert_parses("package p\nfunc f(int, ...string) error\n");
    let TopLevelDecl::Func(id) = file.top_decls()[0] else {
        panic!("expected func");
    };
    let sig = file.arena.funcs[id].signature;
    let fields = file.arena.fields_list(file.arena.signatures[sig].params.fields);
    assert_eq!(fields.len(), 2);
    let types: Vec<TypeId> = fields.iter().map(|&f| file.arena.fields[f].typ).collect();
    assert_eq!(type_texts(&file, &types), ["int", "string"]);
    assert!(file.arena.fields[fields[0]].ellipsis_pos.is_none());
    assert!(file.arena.fields[fields[1]].ellipsis_pos.is_some());
    assert!(file.arena.fields[fields[1]].names.is_empty());
}

#[test]
fn unnamed_results_keep_every_type() {
    let file = assert_parses(
        "package p\nfunc f() (Config, *Config, ID, [2]int, bool, error) {\n\treturn\n}\n",
    );
    let TopLevelDecl::Func(id) = file.top_decls()[0] else {
        panic!("expected func");
    };
    let results = file.arena.result_types(file.arena.funcs[id].signature);
    assert_eq!(
        type_texts(&file, &results),
        ["Config", "*Config", "ID", "[2]int", "bool", "error"]
    );
}

#[test]
fn named_params_still_group_leading_names() {
    let file = assert_parses("package p\nfunc f(a, b Config, rest ...string) {}\n");
    let TopLevelDecl::Func(id) = file.top_decls()[0] else {
        panic!("expected func");
    };
    let sig = file.arena.funcs[id].signature;
    let fields = file.arena.fields_list(file.arena.signatures[sig].params.fields);
    assert_eq!(fields.len(), 2);
    assert_eq!(file.arena.ident_names(file.arena.fields[fields[0]].names).len(), 2);
    assert!(file.arena.fields[fields[1]].ellipsis_pos.is_some());
}

#[test]
fn reports_first_error() {
    let err = parse_source("package p\nfunc f() {\n\tx := \n}\n").unwrap_err();
    assert_eq!(err.diags.len(), 1);
    assert!(err.to_string().contains("expected expression"));
}

#[test]
fn rejects_missing_package_clause() {
    assert!(parse_source("func f() {}\n").is_err());
}

#[derive(Default)]
struct CountCalls(usize);

impl<'ast> Visitor<'ast> for CountCalls {
    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        if matches!(a.exprs[id], Expr::Call { .. }) {
            self.0 += 1;
        }
        reftools_syntax::walk::Walk::walk(&a.exprs[id], a, self);
    }
}

#[test]
fn visitor_reaches_nested_calls() {
    let file = assert_parses(
        "package p\nfunc f() {\n\tif err := g(h()); err != nil {\n\t\tpanic(err)\n\t}\n}\n",
    );
    let mut counter = CountCalls::default();
    walk_file(&file.arena, &file.root, &mut counter);
    assert_eq!(counter.0, 3);
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]
    #[test]
    fn parser_never_panics(s in ".*") {
        let _ = parse_source(&s);
    }

    #[test]
    fn parser_never_panics_on_go_shaped_input(body in "[a-z{}():=,.;\\n\\t \"0-9*&\\[\\]]{0,64}") {
        let src = format!("package p\nfunc f() {{\n{body}\n}}\n");
        let _ = parse_source(&src);
    }
}
