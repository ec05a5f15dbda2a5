use proptest::prelude::*;
use reftools_syntax::lexer::{tokenize, Tok};

/// Pieces of the literals and guards the synthesizers print, with the whitespace between.
fn piece() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "T", "pkg.T", "{", "}", "(", ")", "[2]", "[]", "map[string]int", "&", "X", ":", ",",
        "0", "0.0", "0i", "\"\"", "\"a b\"", "'c'", "nil", "false", "err", "!=", "return", "if",
        "make", "<-chan", "...", " ", "\t", "\n",
    ])
}

fn squeeze(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

    #[test]
    fn arbitrary_input_never_panics_and_spans_stay_ordered(s in ".*") {
        let (toks, _) = tokenize(&s);
        let mut frontier = 0usize;
        prop_assert!(toks.len() <= s.len() * 2 + 1, "too many tokens for {s:?}");
        for (start, tok, end) in toks {
            prop_assert!(start <= end && end <= s.len(), "span ({start},{end}) in {s:?}");
            let injected = matches!(tok, Tok::Semi) && start == end;
            prop_assert!(start >= frontier, "{tok:?} at {start} before {frontier} in {s:?}");
            if !injected {
                frontier = end;
            }
        }
    }

    #[test]
    fn literal_pieces_lex_back_to_their_text(pieces in prop::collection::vec(piece(), 0..40)) {
        let src = pieces.concat();
        let (toks, diags) = tokenize(&src);
        prop_assert!(diags.is_empty(), "{diags:?} for {src:?}");
        let text: String = toks
            .iter()
            .filter(|(s, _, e)| s != e)
            .map(|&(s, _, e)| &src[s..e])
            .collect();
        prop_assert_eq!(squeeze(&text), squeeze(&src));
    }
}
