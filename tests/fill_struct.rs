mod common;

use common::{compact, gofmt, synth_at};
use reftools::fill_struct;

const MAIN: &str = "/virtual/p/main.go";

fn fill(src: &str, needle: &str) -> String {
    match synth_at(&[(MAIN, src)], MAIN, needle, fill_struct) {
        Ok(s) => compact(&s),
        Err(e) => panic!("fill failed: {e}"),
    }
}

const PERSON: &str = r#"package p

type T struct {
	X    int
	Name string
}

type Person struct {
	Name string
	Age  int
}

type Owner struct {
	Name  string
	Email string
}

type Employee struct {
	Name   string
	Email  string
	Salary int
}
"#;

fn with_func(body: &str) -> String {
    format!("{PERSON}\n{body}\n")
}

#[test]
fn fills_zero_values_and_reports_the_literal_span() {
    let src = with_func("func f() {\n\tt := T{}\n\t_ = t\n}");
    let s = synth_at(&[(MAIN, src.as_str())], MAIN, "t := T{", fill_struct).unwrap();
    assert_eq!(compact(&s), "T{X: 0, Name: \"\"}");
    assert_eq!(gofmt(&s), "T{\n\tX:    0,\n\tName: \"\",\n}");
    assert_eq!(&src[s.start..s.end], "T{}");
    assert_eq!(s.fragment.lines, 4);
}

#[test]
fn arrays_are_spelled_out_and_maps_get_one_entry() {
    let src = "package p\n\ntype A struct {\n\tArr [3]int\n\tM   map[string]int\n\tS   []string\n}\n\nvar a = A{}\n";
    assert_eq!(
        fill(src, "A{"),
        "A{Arr: [3]int{0, 0, 0}, M: map[string]int{\"\": 0}, S: []string{}}"
    );
    let s = synth_at(&[(MAIN, src)], MAIN, "A{", fill_struct).unwrap();
    // 5 for the array, 2 for the map, 2 for the slice, 3 fields plus braces.
    assert_eq!(s.fragment.lines, 5 + 2 + 2 + 3 + 2);
}

#[test]
fn nested_structs_and_pointers() {
    let src = "package p\n\ntype Inner struct {\n\tA int\n}\n\ntype Outer struct {\n\tIn  Inner\n\tPtr *Inner\n\tAnon *struct{ B bool }\n\tN   *int\n}\n\nvar o = Outer{}\n";
    assert_eq!(
        fill(src, "Outer{"),
        "Outer{In: Inner{A: 0}, Ptr: &Inner{A: 0}, Anon: &struct{B bool}{B: false}, N: nil}"
    );
}

#[test]
fn recursive_types_stop_at_the_first_repeat() {
    let src = "package p\n\ntype Node struct {\n\tV    int\n\tNext *Node\n\tKids []Node\n}\n\nvar n = Node{}\n";
    assert_eq!(fill(src, "Node{"), "Node{V: 0, Next: &Node{}, Kids: []Node{}}");
}

#[test]
fn reserved_fields_are_skipped() {
    let src = "package p\n\ntype Msg struct {\n\tID              int\n\tXXX_unrecognized []byte\n}\n\nvar m = Msg{}\n";
    assert_eq!(fill(src, "Msg{"), "Msg{ID: 0}");
}

#[test]
fn donors_lend_fields_case_insensitively() {
    let src = with_func("func f(p Person) {\n\te := Employee{}\n\t_ = e\n}");
    assert_eq!(
        fill(&src, "Employee{"),
        "Employee{Name: p.Name, Email: \"\", Salary: 0}"
    );
}

#[test]
fn local_variables_in_the_same_scope_are_donors() {
    let src = with_func("func f() {\n\tq := Person{Name: \"q\"}\n\te := Employee{}\n\t_, _ = q, e\n}");
    assert_eq!(
        fill(&src, "Employee{"),
        "Employee{Name: q.Name, Email: \"\", Salary: 0}"
    );
}

#[test]
fn earliest_declared_donor_wins() {
    let src = with_func(
        "func f(o Owner) {\n\tvar p Person\n\te := Employee{}\n\t_, _ = e, p\n}",
    );
    assert_eq!(
        fill(&src, "Employee{"),
        "Employee{Name: o.Name, Email: o.Email, Salary: 0}"
    );
}

#[test]
fn donors_declared_after_the_cursor_do_not_count() {
    let src = with_func("func f() {\n\te := Employee{}\n\tp := Person{}\n\t_, _ = e, p\n}");
    assert_eq!(
        fill(&src, "Employee{"),
        "Employee{Name: \"\", Email: \"\", Salary: 0}"
    );
}

#[test]
fn pointer_variables_and_same_type_variables_are_not_donors() {
    let src = with_func("func f(p *Person, other Employee) {\n\te := Employee{}\n\t_ = e\n}");
    assert_eq!(
        fill(&src, "Employee{"),
        "Employee{Name: \"\", Email: \"\", Salary: 0}"
    );
}

#[test]
fn written_values_take_priority_over_donors() {
    let src = with_func(
        "func f(p Person) {\n\te := Employee{Salary: 10 * 2, Name: \"bob\"}\n\t_ = e\n}",
    );
    assert_eq!(
        fill(&src, "Employee{"),
        "Employee{Name: \"bob\", Email: \"\", Salary: 10 * 2}"
    );
}

#[test]
fn positional_values_are_kept() {
    let src = with_func("func f() {\n\tt := T{7, \"x\"}\n\t_ = t\n}");
    assert_eq!(fill(&src, "T{7"), "T{X: 7, Name: \"x\"}");
}

#[test]
fn elements_of_slices_and_maps_hide_their_type() {
    let src = with_func("var ts = []T{{}}\nvar ps = []*T{{}}\nvar ms = map[string]T{\"a\": {}}");
    assert_eq!(fill(&src, "[]T{{"), "{X: 0, Name: \"\"}");
    assert_eq!(fill(&src, "[]*T{{"), "{X: 0, Name: \"\"}");
    assert_eq!(fill(&src, "\"a\": {"), "{X: 0, Name: \"\"}");
}

#[test]
fn innermost_literal_is_filled() {
    let src = "package p\n\ntype Inner struct {\n\tA int\n}\n\ntype Outer struct {\n\tIn Inner\n\tB  string\n}\n\nvar o = Outer{In: Inner{}}\n";
    assert_eq!(fill(src, "In: Inner{"), "Inner{A: 0}");
    assert_eq!(fill(src, "Outer{"), "Outer{In: Inner{}, B: \"\"}");
}

#[test]
fn filling_twice_changes_nothing() {
    let src = with_func("func f(p Person) {\n\te := Employee{}\n\t_ = e\n}");
    let first = synth_at(&[(MAIN, src.as_str())], MAIN, "e := Employee{", fill_struct).unwrap();
    let code = gofmt(&first);
    let edited = format!("{}{}{}", &src[..first.start], code, &src[first.end..]);

    let second = synth_at(&[(MAIN, edited.as_str())], MAIN, "e := Employee{", fill_struct).unwrap();
    assert_eq!(gofmt(&second), code);
    assert_eq!(&edited[second.start..second.end], code);
}

#[test]
fn function_fields_get_stubs() {
    let src = "package p\n\ntype H struct {\n\tOn func(int, ...string) error\n}\n\nvar h = H{}\n";
    let s = synth_at(&[(MAIN, src)], MAIN, "H{", fill_struct).unwrap();
    assert_eq!(
        gofmt(&s),
        "H{\n\tOn: func(int, ...string) error {\n\t\tpanic(\"not implemented\")\n\t},\n}"
    );
}

#[test]
fn cursor_outside_a_struct_literal_is_not_found() {
    let src = "package p\n\nvar xs = []int{1, 2}\n\nfunc f() {}\n";
    let err = synth_at(&[(MAIN, src)], MAIN, "[]int{", fill_struct).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.kind().to_string(), "no struct literal found at selection");

    let err = synth_at(&[(MAIN, src)], MAIN, "func f(", fill_struct).unwrap_err();
    assert!(err.is_not_found());
}

mod foreign {
    use super::*;

    const GO_MOD: &str = "module example.com/w\n\ngo 1.22\n";
    const DEP: &str = r#"package dep

type options struct {
	verbose bool
}

type Config struct {
	Addr  string
	port  int
	Opts  options
	Inner Public
}

type Public struct {
	Level  int
	hidden string
}

const N = 4

var Table [3]int
"#;
    const APP: &str = r#"package app

import (
	cfg "example.com/w/dep"
	"unsafe"
)

var arr [2]int
var word int64

type local struct {
	a int
	B cfg.Public
}

type sized struct {
	Buf   [cfg.N]byte
	Rows  [len(cfg.Table)]int
	Pair  [len(arr)]bool
	Words [unsafe.Sizeof(word)]byte
}

type source struct {
	port int
	addr string
}

type mirror struct {
	port int
	Addr string
}

func f() {
	_ = cfg.Config{}
	_ = local{}
	_ = sized{}
}

func g(s source) {
	c := cfg.Config{}
	_ = c
}

func h(c cfg.Config) {
	_ = mirror{}
}
"#;

    fn fill_app(needle: &str) -> String {
        let files = [
            ("/w/go.mod", GO_MOD),
            ("/w/dep/dep.go", DEP),
            ("/w/app/app.go", APP),
        ];
        compact(&synth_at(&files, "/w/app/app.go", needle, fill_struct).unwrap())
    }

    #[test]
    fn unexported_fields_of_other_packages_are_left_out() {
        assert_eq!(
            fill_app("cfg.Config{"),
            "cfg.Config{Addr: \"\", Inner: cfg.Public{Level: 0}}"
        );
    }

    #[test]
    fn array_lengths_from_imported_constants_and_len() {
        // `unsafe.Sizeof` is not evaluated, so `Words` has no known type and is left out.
        assert_eq!(
            fill_app("sized{"),
            "sized{Buf: [4]byte{0, 0, 0, 0}, Rows: [3]int{0, 0, 0}, Pair: [2]bool{false, false}}"
        );
    }

    #[test]
    fn donors_do_not_fill_unexported_foreign_fields() {
        assert_eq!(
            fill_app("c := cfg.Config{"),
            "cfg.Config{Addr: s.addr, Inner: cfg.Public{Level: 0}}"
        );
    }

    #[test]
    fn foreign_donors_only_lend_exported_fields() {
        assert_eq!(fill_app("mirror{"), "mirror{port: 0, Addr: c.Addr}");
    }

    #[test]
    fn local_types_keep_unexported_fields() {
        assert_eq!(
            fill_app("local{"),
            "local{a: 0, B: cfg.Public{Level: 0}}"
        );
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    const KINDS: [(&str, &str); 6] = [
        ("int", "0"),
        ("string", "\"\""),
        ("bool", "false"),
        ("float64", "0.0"),
        ("*int", "nil"),
        ("error", "nil"),
    ];

    fn source(kinds: &[usize], lit: &str) -> String {
        let mut src = String::from("package p\n\ntype T struct {\n");
        for (i, k) in kinds.iter().enumerate() {
            src.push_str(&format!("\tF{i} {}\n", KINDS[*k].0));
        }
        src.push_str(&format!("}}\n\nvar t = {lit}\n"));
        src
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
        #[test]
        fn every_field_is_filled_once_and_refilling_is_stable(
            kinds in proptest::collection::vec(0usize..KINDS.len(), 1..8)
        ) {
            let want = kinds
                .iter()
                .enumerate()
                .map(|(i, k)| format!("F{i}: {}", KINDS[*k].1))
                .collect::<Vec<_>>()
                .join(", ");
            let want = format!("T{{{want}}}");

            let first = fill(&source(&kinds, "T{}"), "T{");
            prop_assert_eq!(&first, &want);

            let again = fill(&source(&kinds, &first), "T{");
            prop_assert_eq!(again, want);
        }
    }
}
