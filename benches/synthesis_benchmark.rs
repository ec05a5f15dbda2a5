use std::fmt::Write as _;
use std::hint::black_box as bb;
use std::path::{Path, PathBuf};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reftools::check::{check, FileInput, UnitInput};
use reftools::loader::BuildContext;
use reftools::printer::{print_fragment, Mode};
use reftools::{error_check, fill_struct, load, LoadConfig, Overlay, SynthOptions};
use reftools_syntax::parse_source;

// =============================================================================
// Corpus
// =============================================================================

const SERVICE: &str = r#"
package service

import (
    "fmt"
    "strings"
)

type Request struct {
    ID      int
    Path    string
    Headers map[string][]string
    Body    []byte
}

type Response struct {
    ID      int
    Status  int
    Headers map[string][]string
    Body    []byte
    Err     error
}

type Handler func(*Request) (*Response, error)

type Server struct {
    routes   map[string]Handler
    fallback Handler
}

func (s *Server) Handle(path string, h Handler) {
    s.routes[strings.TrimSpace(path)] = h
}

func (s *Server) Serve(req *Request) (*Response, error) {
    h, ok := s.routes[req.Path]
    if !ok {
        h = s.fallback
    }
    resp, err := h(req)
    if err != nil {
        return nil, fmt.Errorf("serve %s: %w", req.Path, err)
    }
    return resp, nil
}
"#;

/// A package with a struct of `n` fields of mixed kinds and a literal of it.
fn wide_struct(n: usize) -> String {
    let mut src = String::from("package wide\n\ntype Inner struct {\n\tA int\n\tB string\n}\n\ntype Wide struct {\n");
    for i in 0..n {
        let ty = match i % 6 {
            0 => "int",
            1 => "string",
            2 => "[]byte",
            3 => "map[string]Inner",
            4 => "*Inner",
            _ => "[4]bool",
        };
        let _ = writeln!(src, "\tField{i} {ty}");
    }
    src.push_str("}\n\nfunc build(in Inner) (Wide, error) {\n\tw := Wide{}\n\treturn w, nil\n}\n");
    src
}

fn config(path: &Path, src: &str) -> LoadConfig {
    let mut overlay = Overlay::new();
    overlay.insert(path, src);
    LoadConfig {
        build: BuildContext::host(Vec::new()),
        goroot: None,
        overlay,
    }
}

// =============================================================================
// Benchmark 1: parse + check
// =============================================================================

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_check");
    group.throughput(Throughput::Bytes(SERVICE.len() as u64));

    group.bench_function("parse_only", |b| {
        b.iter(|| bb(parse_source(bb(SERVICE)).is_ok()));
    });

    group.bench_function("parse_and_check", |b| {
        b.iter(|| {
            let Ok(parsed) = parse_source(bb(SERVICE)) else {
                return;
            };
            let prog = check(vec![UnitInput {
                path: "example.com/service".to_string(),
                files: vec![FileInput {
                    path: PathBuf::from("/bench/service.go"),
                    parsed,
                }],
                opaque: false,
                check_bodies: true,
            }]);
            bb(prog.types.len());
        });
    });

    group.finish();
}

// =============================================================================
// Benchmark 2: fill a large struct (load excluded, then included)
// =============================================================================

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_struct");
    let path = Path::new("/bench/wide/wide.go");
    let opts = SynthOptions::default();

    for &n in &[10usize, 100, 500] {
        let src = wide_struct(n);
        let offset = src.find("Wide{}").map_or(0, |i| i + 5);
        let config = config(path, &src);
        let Ok(loaded) = load(&config, path, offset) else {
            continue;
        };

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("synthesize", n), &loaded, |b, loaded| {
            b.iter(|| {
                if let Ok(s) = fill_struct(bb(loaded), &opts) {
                    bb(s.fragment.lines);
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("synthesize_and_print", n),
            &loaded,
            |b, loaded| {
                b.iter(|| {
                    if let Ok(s) = fill_struct(bb(loaded), &opts) {
                        bb(print_fragment(&s.fragment, Mode::Gofmt));
                    }
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("load_and_fill", n), &config, |b, config| {
            b.iter(|| {
                if let Ok(loaded) = load(config, path, offset) {
                    bb(fill_struct(&loaded, &opts).is_ok());
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 3: error-check guard
// =============================================================================

fn bench_error_check(c: &mut Criterion) {
    let path = Path::new("/bench/service/service.go");
    let offset = SERVICE.find("resp, err := h(req)").map_or(0, |i| i + 20);
    let config = config(path, SERVICE);
    let Ok(loaded) = load(&config, path, offset) else {
        return;
    };
    let opts = SynthOptions::default();

    c.bench_function("error_check", |b| {
        b.iter(|| {
            if let Ok(s) = error_check(bb(&loaded), &opts) {
                bb(print_fragment(&s.fragment, Mode::Gofmt));
            }
        });
    });
}

criterion_group!(benches, bench_check, bench_fill, bench_error_check);
criterion_main!(benches);
