#![allow(dead_code)]

use std::path::Path;

use reftools::loader::BuildContext;
use reftools::printer::{print_fragment, Mode};
use reftools::{load, LoadConfig, Loaded, Overlay, Result, SynthOptions, Synthesized};

/// Loader config over in-memory files only.
pub fn config(files: &[(&str, &str)]) -> LoadConfig {
    let mut overlay = Overlay::new();
    for (path, src) in files {
        overlay.insert(path, *src);
    }
    LoadConfig {
        build: BuildContext::host(Vec::new()),
        goroot: None,
        overlay,
    }
}

/// Byte offset just past the first occurrence of `needle`.
pub fn cursor(src: &str, needle: &str) -> usize {
    match src.find(needle) {
        Some(i) => i + needle.len(),
        None => panic!("{needle:?} not in source"),
    }
}

pub fn load_at(files: &[(&str, &str)], target: &str, needle: &str) -> Loaded {
    let src = files
        .iter()
        .find(|(p, _)| *p == target)
        .map(|(_, s)| *s)
        .unwrap();
    load(&config(files), Path::new(target), cursor(src, needle)).unwrap()
}

pub fn synth_at(
    files: &[(&str, &str)],
    target: &str,
    needle: &str,
    synth: fn(&Loaded, &SynthOptions) -> Result<Synthesized>,
) -> Result<Synthesized> {
    synth(&load_at(files, target, needle), &SynthOptions::default())
}

pub fn compact(s: &Synthesized) -> String {
    print_fragment(&s.fragment, Mode::Compact)
}

pub fn gofmt(s: &Synthesized) -> String {
    print_fragment(&s.fragment, Mode::Gofmt)
}
