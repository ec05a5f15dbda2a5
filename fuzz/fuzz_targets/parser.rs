// fuzz_targets/parser.rs
#![no_main]

use std::path::PathBuf;

use libfuzzer_sys::fuzz_target;
use reftools::check::{check, FileInput, UnitInput};
use reftools_syntax::lexer::{Lexer, Tok};
use reftools_syntax::parse_source;

fuzz_target!(|data: &[u8]| {
    let src = String::from_utf8_lossy(data);

    let mut last_real_end = 0usize;
    for (start, tok, end) in Lexer::new(&src) {
        assert!(start <= end && end <= src.len());
        if !(matches!(tok, Tok::Semi) && start == end) {
            assert!(start >= last_real_end);
            last_real_end = end;
        }
    }

    let parsed = match parse_source(&src) {
        Ok(parsed) => parsed,
        Err(failure) => {
            assert!(!failure.diags.is_empty());
            return;
        }
    };
    // Anything the parser accepts must check without panicking.
    check(vec![UnitInput {
        path: "fuzz".to_string(),
        files: vec![FileInput {
            path: PathBuf::from("/fuzz/input.go"),
            parsed,
        }],
        opaque: false,
        check_bodies: true,
    }]);
});
