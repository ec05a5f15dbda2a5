use std::path::PathBuf;

use reftools::cli::{execute, Args};
use reftools::output::write_json;
use reftools::{error_check, fill_struct, Output, Overlay};

const SRC: &str = "package p\n\ntype T struct {\n\tX    int\n\tName string\n}\n\nfunc run() (T, error) {\n\tt := T{}\n\treturn t, nil\n}\n";

fn args(offset: usize) -> Args {
    Args {
        file: PathBuf::from("/virtual/out/main.go"),
        offset,
        modified: true,
        tags: Vec::new(),
    }
}

fn overlay() -> Overlay {
    let archive = format!("/virtual/out/main.go\n{}\n{SRC}", SRC.len());
    Overlay::parse(archive.as_bytes()).unwrap()
}

#[test]
fn fill_result_as_json() {
    let offset = SRC.find("T{}").unwrap() + 2;
    let out = execute(&args(offset), overlay(), fill_struct).unwrap();
    let start = SRC.find("T{}").unwrap();
    assert_eq!(
        out,
        Output {
            start,
            end: start + 3,
            code: "T{\n\tX:    0,\n\tName: \"\",\n}".to_string(),
        }
    );

    let mut buf = Vec::new();
    write_json(&mut buf, &[out]).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text,
        format!(
            "[{{\"start\":{start},\"end\":{},\"code\":\"T{{\\n\\tX:    0,\\n\\tName: \\\"\\\",\\n}}\"}}]\n",
            start + 3
        )
    );
    let parsed: Vec<Output> = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.len(), 1);
}

#[test]
fn error_check_result_is_an_insertion() {
    let offset = SRC.find("\treturn").unwrap();
    let out = execute(&args(offset), overlay(), error_check).unwrap();
    assert_eq!(out.start, offset);
    assert_eq!(out.end, offset);
    assert_eq!(
        out.code,
        "if err != nil {\n\treturn T{}, fmt.Errorf(\"run: func failed, %w\", err)\n}"
    );
}

#[test]
fn failures_carry_the_user_facing_message() {
    let err = execute(&args(SRC.len() + 5), overlay(), fill_struct).unwrap_err();
    assert_eq!(
        err.kind().to_string(),
        format!(
            "file size ({}) is smaller than given offset ({})",
            SRC.len(),
            SRC.len() + 5
        )
    );
}
