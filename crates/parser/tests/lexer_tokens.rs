use reftools_syntax::lexer::{tokenize, Tok};

/// Tokens as their source text; injected semicolons show as `;`.
fn texts(src: &str) -> Vec<&str> {
    let (toks, diags) = tokenize(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    toks.into_iter()
        .map(|(s, _, e)| if s == e { ";" } else { &src[s..e] })
        .collect()
}

fn kind(t: &Tok<'_>) -> &'static str {
    match t {
        Tok::Ident(_) => "IDENT",
        Tok::IntLit(_) => "INT",
        Tok::FloatLit(_) => "FLOAT",
        Tok::ImagLit(_) => "IMAG",
        Tok::RuneLit(_) => "CHAR",
        Tok::StringLit(_) | Tok::RawStringLit(_) => "STRING",
        Tok::Semi => ";",
        Tok::Error => "ERROR",
        _ => "OTHER",
    }
}

fn kinds(src: &str) -> Vec<&'static str> {
    tokenize(src).0.iter().map(|(_, t, _)| kind(t)).collect()
}

#[test]
fn compact_struct_literal() {
    assert_eq!(
        texts("T{X: 0, Name: \"\", F: 0.0, C: (0 + 0i), P: uintptr(0)}"),
        [
            "T", "{", "X", ":", "0", ",", "Name", ":", "\"\"", ",", "F", ":", "0.0", ",", "C",
            ":", "(", "0", "+", "0i", ")", ",", "P", ":", "uintptr", "(", "0", ")", "}", ";",
        ]
    );
}

#[test]
fn multiline_literal_gets_semicolons_only_after_the_closing_brace() {
    let src = "t := T{\n\tX:    0,\n\tName: \"\",\n}\n";
    assert_eq!(
        texts(src),
        ["t", ":=", "T", "{", "X", ":", "0", ",", "Name", ":", "\"\"", ",", "}", ";"]
    );
}

#[test]
fn element_values_of_every_zero_shape() {
    let src = "[]T{&Small{A: 0}, {}}\nmap[string]bool{\"\": false}\n[2]bool{false, false}\nmake(<-chan string)\n";
    assert_eq!(
        texts(src),
        [
            "[", "]", "T", "{", "&", "Small", "{", "A", ":", "0", "}", ",", "{", "}", "}", ";",
            "map", "[", "string", "]", "bool", "{", "\"\"", ":", "false", "}", ";",
            "[", "2", "]", "bool", "{", "false", ",", "false", "}", ";",
            "make", "(", "<-", "chan", "string", ")", ";",
        ]
    );
}

#[test]
fn function_stub_value() {
    let src = "func(int, ...string) error { panic(\"not implemented\") }";
    assert_eq!(
        texts(src),
        [
            "func", "(", "int", ",", "...", "string", ")", "error", "{", "panic", "(",
            "\"not implemented\"", ")", "}", ";",
        ]
    );
}

#[test]
fn error_guard_block() {
    let src = "if err != nil {\n\treturn T{}, fmt.Errorf(\"run: func failed, %w\", err)\n}\n";
    assert_eq!(
        texts(src),
        [
            "if", "err", "!=", "nil", "{", "return", "T", "{", "}", ",", "fmt", ".", "Errorf",
            "(", "\"run: func failed, %w\"", ",", "err", ")", ";", "}", ";",
        ]
    );
}

#[test]
fn bare_return_ends_its_line() {
    assert_eq!(texts("return\n}"), ["return", ";", "}", ";"]);
}

#[test]
fn literal_kinds() {
    let src = "0x1F 1_000 0o17 0b1 1.5e3 .5 2i 'a' '\\n' \"a\\\"b\" `raw\nline`\n";
    assert_eq!(
        kinds(src),
        [
            "INT", "INT", "INT", "INT", "FLOAT", "FLOAT", "IMAG", "CHAR", "CHAR", "STRING",
            "STRING", ";",
        ]
    );
}

#[test]
fn raw_strings_span_lines_without_semicolons() {
    let src = "x := `a\nb`\n";
    let (toks, _) = tokenize(src);
    let raw = toks
        .iter()
        .find(|(_, t, _)| matches!(t, Tok::RawStringLit(_)))
        .unwrap();
    assert_eq!(&src[raw.0..raw.2], "`a\nb`");
    assert_eq!(texts(src), ["x", ":=", "`a\nb`", ";"]);
}

#[test]
fn comments_are_skipped() {
    let src = "x := T{} // filled\n/* note\n*/ y := 1\n";
    assert_eq!(
        texts(src),
        ["x", ":=", "T", "{", "}", ";", "y", ":=", "1", ";"]
    );
}

#[test]
fn crlf_line_endings_insert_semicolons() {
    assert_eq!(texts("a := b\r\nc()\r\n"), ["a", ":=", "b", ";", "c", "(", ")", ";"]);
}

#[test]
fn unterminated_string_is_reported() {
    let (_, diags) = tokenize("x := \"abc\ny := 1\n");
    assert!(!diags.is_empty());
}

#[test]
fn leading_bom_is_ignored() {
    assert_eq!(texts("\u{FEFF}package p\n"), ["package", "p", ";"]);
}
