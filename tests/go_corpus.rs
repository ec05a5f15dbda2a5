use std::path::PathBuf;

use reftools::check::{check, FileInput, UnitInput};
use reftools_syntax::parse_source;
use walkdir::WalkDir;

#[test]
fn parses_and_checks_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("REFTOOLS_GO_CORPUS") else {
        eprintln!("REFTOOLS_GO_CORPUS not set; skipping corpus test");
        return;
    };

    let mut total = 0usize;
    let mut failed = Vec::new();

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        if path.to_string_lossy().contains("testdata") {
            continue;
        }
        let Ok(src) = std::fs::read_to_string(path) else {
            continue;
        };

        total += 1;
        match parse_source(&src) {
            Ok(parsed) => {
                check(vec![UnitInput {
                    path: path.display().to_string(),
                    files: vec![FileInput {
                        path: PathBuf::from(path),
                        parsed,
                    }],
                    opaque: false,
                    check_bodies: true,
                }]);
            }
            Err(f) => {
                eprintln!("FAILED: {}", path.display());
                for d in f.diags.iter().take(4) {
                    eprintln!("  {:?} {:?}: {}", d.kind, d.span, d.message);
                }
                failed.push(path.to_path_buf());
            }
        }
    }

    // Files using type parameters are rejected by the parser; only panics fail the test.
    eprintln!("Parsed {total} Go files, {} rejected.", failed.len());
}
