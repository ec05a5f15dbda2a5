mod common;

use common::{compact, gofmt, synth_at};
use reftools::error_check;

const MAIN: &str = "/virtual/p/main.go";

fn guard(src: &str, needle: &str) -> String {
    match synth_at(&[(MAIN, src)], MAIN, needle, error_check) {
        Ok(s) => compact(&s),
        Err(e) => panic!("error check failed: {e}"),
    }
}

#[test]
fn names_the_function_and_the_previous_call() {
    let src = r#"package p

func compute() (int, error) { return 0, nil }

func run() (int, error) {
	v, err := compute()
	// here
	return v, nil
}
"#;
    let s = synth_at(&[(MAIN, src)], MAIN, "// here", error_check).unwrap();
    assert_eq!(
        compact(&s),
        "if err != nil { return 0, fmt.Errorf(\"run: compute failed, %w\", err) }"
    );
    assert_eq!(
        gofmt(&s),
        "if err != nil {\n\treturn 0, fmt.Errorf(\"run: compute failed, %w\", err)\n}"
    );
    assert_eq!(s.start, s.end);
    assert_eq!(s.start, src.find("// here").unwrap() + "// here".len());
    assert_eq!(s.fragment.lines, 1);
}

#[test]
fn last_assigned_call_before_the_cursor_wins() {
    let src = r#"package p

type Client struct{}

func (c *Client) Get() (string, error) { return "", nil }

type Service struct {
	client *Client
}

func open() (*Client, error) { return nil, nil }

func (s *Service) Fetch() (string, error) {
	c, err := open()
	var body string
	body, err = s.client.Get()
	// here
	c2, err := open()
	_, _, _ = c, c2, body
	return body, nil
}
"#;
    assert_eq!(
        guard(src, "// here"),
        "if err != nil { return \"\", fmt.Errorf(\"Fetch: s.client.Get failed, %w\", err) }"
    );
}

#[test]
fn single_value_assignments_are_not_calls_to_check() {
    let src = r#"package p

func one() error { return nil }

func two() (int, error) { return 0, nil }

func run() error {
	_, err := two()
	err = one()
	x := two
	_ = x
	// here
	return err
}
"#;
    assert_eq!(
        guard(src, "// here"),
        "if err != nil { return fmt.Errorf(\"run: two failed, %w\", err) }"
    );
}

#[test]
fn falls_back_when_no_call_precedes_the_cursor() {
    let src = "package p\n\nfunc run() error {\n\t// here\n\treturn nil\n}\n";
    assert_eq!(
        guard(src, "// here"),
        "if err != nil { return fmt.Errorf(\"run: func failed, %w\", err) }"
    );
}

#[test]
fn results_get_their_zero_values() {
    let src = r#"package p

import "os"

type Config struct {
	Name string
}

type ID int

func load(path string) (Config, *Config, []byte, map[string]int, ID, [2]int, bool, string, error) {
	data, err := os.ReadFile(path)
	// here
	_ = data
	return Config{}, nil, nil, nil, 0, [2]int{}, false, "", nil
}
"#;
    assert_eq!(
        guard(src, "// here"),
        "if err != nil { return Config{}, nil, nil, nil, 0, [2]int{}, false, \"\", fmt.Errorf(\"load: os.ReadFile failed, %w\", err) }"
    );
}

#[test]
fn functions_without_results_return_bare() {
    let src = "package p\n\nfunc do() (int, error) { return 0, nil }\n\nfunc run() {\n\t_, err := do()\n\t// here\n\t_ = err\n}\n";
    assert_eq!(guard(src, "// here"), "if err != nil { return }");
}

#[test]
fn nested_function_literals_use_the_declared_function() {
    let src = r#"package p

func do() (int, error) { return 0, nil }

func outer() error {
	f := func() {
		_, err := do()
		// here
		_ = err
	}
	f()
	return nil
}
"#;
    let out = guard(src, "// here");
    assert!(out.contains("\"outer: func failed, %w\""), "{out}");
}

#[test]
fn outside_any_function_is_an_error() {
    let src = "package p\n\nvar x = 1\n\nfunc f() {}\n";
    let err = synth_at(&[(MAIN, src)], MAIN, "var x", error_check).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.kind().to_string(), "enclosing Func is null");
}
