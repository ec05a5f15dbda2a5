mod common;

use common::load_at;
use reftools::printer::{print_fragment, Mode};
use reftools::synth::{zero_value, ZeroPolicy};
use reftools::SynthOptions;

const SRC: &str = r#"package p

import "unsafe"

type Small struct {
	A int
}

type Kind int

type Z struct {
	B   bool
	I   int
	U8  uint8
	By  byte
	R   rune
	P   uintptr
	UP  unsafe.Pointer
	F   float64
	C   complex128
	S   string
	K   Kind
	Ptr *int
	SP  *Small
	Sl  []int
	M   map[string]bool
	Ch  chan int
	RCh <-chan string
	Fn  func(int, ...string) error
	If  interface{}
	E   error
	Arr [2]bool
	St  Small
}

var z Z
"#;

/// Zero value of every field of `Z`, by field name.
fn zeros(policy: ZeroPolicy) -> Vec<(String, Option<String>)> {
    let loaded = load_at(&[("/virtual/z/z.go", SRC)], "/virtual/z/z.go", "var z");
    let prog = &loaded.program;
    let unit = prog.unit(loaded.source().unit);
    let z = prog.scope(unit.scope).lookup("Z").unwrap();
    let fields = prog.types.struct_fields(prog.object(z).ty).unwrap();
    fields
        .iter()
        .map(|f| {
            let zero = zero_value(prog, loaded.file, f.ty, policy, &SynthOptions::default())
                .map(|frag| print_fragment(&frag, Mode::Compact));
            (f.name.clone(), zero)
        })
        .collect()
}

fn expect(table: &[(String, Option<String>)], field: &str, want: &str) {
    let got = table
        .iter()
        .find(|(name, _)| name == field)
        .and_then(|(_, z)| z.as_deref());
    assert_eq!(got, Some(want), "zero value of field {field}");
}

#[test]
fn fill_policy_table() {
    let table = zeros(ZeroPolicy::Fill);
    let want = [
        ("B", "false"),
        ("I", "0"),
        ("U8", "0"),
        ("By", "0"),
        ("R", "0"),
        ("P", "uintptr(0)"),
        ("UP", "unsafe.Pointer(uintptr(0))"),
        ("F", "0.0"),
        ("C", "(0 + 0i)"),
        ("S", "\"\""),
        ("K", "0"),
        ("Ptr", "nil"),
        ("SP", "&Small{A: 0}"),
        ("Sl", "[]int{}"),
        ("M", "map[string]bool{\"\": false}"),
        ("Ch", "make(chan int)"),
        ("RCh", "make(<-chan string)"),
        ("Fn", "func(int, ...string) error { panic(\"not implemented\") }"),
        ("If", "nil"),
        ("E", "nil"),
        ("Arr", "[2]bool{false, false}"),
        ("St", "Small{A: 0}"),
    ];
    assert_eq!(table.len(), want.len());
    for (field, zero) in want {
        expect(&table, field, zero);
    }
}

#[test]
fn return_policy_table() {
    let table = zeros(ZeroPolicy::Return);
    let want = [
        ("B", "false"),
        ("I", "0"),
        ("P", "uintptr(0)"),
        ("S", "\"\""),
        ("K", "0"),
        ("Ptr", "nil"),
        ("SP", "nil"),
        ("Sl", "nil"),
        ("M", "nil"),
        ("Ch", "nil"),
        ("Fn", "nil"),
        ("If", "nil"),
        ("E", "nil"),
        ("Arr", "[2]bool{}"),
        ("St", "Small{}"),
    ];
    for (field, zero) in want {
        expect(&table, field, zero);
    }
}

#[test]
fn fill_policy_line_hints() {
    let loaded = load_at(&[("/virtual/z/z.go", SRC)], "/virtual/z/z.go", "var z");
    let prog = &loaded.program;
    let unit = prog.unit(loaded.source().unit);
    let z = prog.scope(unit.scope).lookup("Z").unwrap();
    let fields = prog.types.struct_fields(prog.object(z).ty).unwrap();
    let lines = |name: &str| {
        let f = fields.iter().find(|f| f.name == name).unwrap();
        zero_value(prog, loaded.file, f.ty, ZeroPolicy::Fill, &SynthOptions::default())
            .unwrap()
            .lines
    };
    assert_eq!(lines("I"), 0);
    assert_eq!(lines("Sl"), 2);
    assert_eq!(lines("M"), 2);
    assert_eq!(lines("Arr"), 4);
    assert_eq!(lines("St"), 3);
}
