//! Build constraints: `//go:build` expressions, legacy `// +build` lines and
//! `_GOOS`/`_GOARCH` file name suffixes.

use std::collections::HashSet;

use tracing::debug;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// The tag set files are matched against.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub tags: HashSet<String>,
}

impl BuildContext {
    /// Host OS and architecture, in Go's naming.
    pub fn host(tags: impl IntoIterator<Item = String>) -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            other => other,
        };
        BuildContext {
            goos: goos.to_string(),
            goarch: goarch.to_string(),
            tags: tags.into_iter().collect(),
        }
    }

    fn has_tag(&self, tag: &str) -> bool {
        tag == self.goos
            || tag == self.goarch
            || tag == "gc"
            || (tag == "unix" && UNIX_OS.contains(&self.goos.as_str()))
            || is_release_tag(tag)
            || self.tags.contains(tag)
    }

    /// Whether a file with this name and source is part of the build.
    pub fn matches(&self, file_name: &str, src: &str) -> bool {
        self.matches_name(file_name) && self.matches_header(src)
    }

    pub fn matches_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some(i) = stem.find('_') else {
            return true;
        };
        let parts: Vec<&str> = stem[i..].split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return parts[n - 2] == self.goos && parts[n - 1] == self.goarch;
        }
        if KNOWN_OS.contains(&parts[n - 1]) {
            return parts[n - 1] == self.goos
                || (parts[n - 1] == "unix" && UNIX_OS.contains(&self.goos.as_str()));
        }
        if KNOWN_ARCH.contains(&parts[n - 1]) {
            return parts[n - 1] == self.goarch;
        }
        true
    }

    pub fn matches_header(&self, src: &str) -> bool {
        let header = header_comments(src);
        if let Some(expr) = header
            .iter()
            .find_map(|line| line.strip_prefix("//go:build"))
        {
            return match Expr::parse(expr) {
                Some(e) => e.eval(&|tag| self.has_tag(tag)),
                None => {
                    debug!(expr, "malformed //go:build line");
                    false
                }
            };
        }
        header
            .iter()
            .filter_map(|line| line.strip_prefix("//"))
            .filter_map(|line| line.trim_start().strip_prefix("+build"))
            .all(|line| self.plus_build_line(line))
    }

    /// `// +build a,b c` means `(a && b) || c`.
    fn plus_build_line(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.has_tag(tag),
                None => self.has_tag(term),
            })
        })
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// Comment lines before the package clause, trimmed.
fn header_comments(src: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in src.lines() {
        let line = line.trim();
        if in_block {
            if line.contains("*/") {
                in_block = false;
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with("//") {
            out.push(line);
            continue;
        }
        if line.starts_with("/*") {
            in_block = !line.contains("*/");
            continue;
        }
        break;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(src: &str) -> Option<Expr> {
        let tokens = tokenize(src)?;
        let mut p = ExprParser { tokens, pos: 0 };
        let e = p.or()?;
        (p.pos == p.tokens.len()).then_some(e)
    }

    fn eval(&self, has: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Tag(t) => has(t),
            Expr::Not(e) => !e.eval(has),
            Expr::And(a, b) => a.eval(has) && b.eval(has),
            Expr::Or(a, b) => a.eval(has) || b.eval(has),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Not,
    And,
    Or,
    LParen,
    RParen,
    Tag(String),
}

fn tokenize(src: &str) -> Option<Vec<Token>> {
    let mut out = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' => i += 1,
            b'!' => {
                out.push(Token::Not);
                i += 1;
            }
            b'(' => {
                out.push(Token::LParen);
                i += 1;
            }
            b')' => {
                out.push(Token::RParen);
                i += 1;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                out.push(Token::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                out.push(Token::Or);
                i += 2;
            }
            c if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                out.push(Token::Tag(src[start..i].to_string()));
            }
            _ => return None,
        }
    }
    Some(out)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut left = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn not(&mut self) -> Option<Expr> {
        match self.peek()? {
            Token::Not => {
                self.pos += 1;
                Some(Expr::Not(Box::new(self.not()?)))
            }
            Token::LParen => {
                self.pos += 1;
                let e = self.or()?;
                if self.peek() != Some(&Token::RParen) {
                    return None;
                }
                self.pos += 1;
                Some(e)
            }
            Token::Tag(t) => {
                let e = Expr::Tag(t.clone());
                self.pos += 1;
                Some(e)
            }
            Token::And | Token::Or | Token::RParen => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux(tags: &[&str]) -> BuildContext {
        BuildContext {
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn go_build_expressions() {
        let ctx = linux(&["integration"]);
        assert!(ctx.matches_header("//go:build linux && amd64\n\npackage p\n"));
        assert!(!ctx.matches_header("//go:build windows\n\npackage p\n"));
        assert!(ctx.matches_header("//go:build !windows && (integration || e2e)\npackage p\n"));
        assert!(!ctx.matches_header("//go:build !integration\npackage p\n"));
        assert!(ctx.matches_header("//go:build unix\npackage p\n"));
        assert!(ctx.matches_header("//go:build go1.21\npackage p\n"));
    }

    #[test]
    fn go_build_wins_over_plus_build() {
        let ctx = linux(&[]);
        assert!(ctx.matches_header("//go:build linux\n// +build windows\n\npackage p\n"));
    }

    #[test]
    fn legacy_plus_build_lines() {
        let ctx = linux(&["foo"]);
        assert!(ctx.matches_header("// +build darwin linux\n\npackage p\n"));
        assert!(ctx.matches_header("// +build linux,foo\n\npackage p\n"));
        assert!(!ctx.matches_header("// +build linux,!foo\n\npackage p\n"));
        assert!(!ctx.matches_header("// +build linux\n// +build bar\n\npackage p\n"));
    }

    #[test]
    fn constraints_after_package_clause_are_ignored() {
        let ctx = linux(&[]);
        assert!(ctx.matches_header("package p\n//go:build windows\n"));
    }

    #[test]
    fn file_name_suffixes() {
        let ctx = linux(&[]);
        assert!(ctx.matches_name("x_linux.go"));
        assert!(ctx.matches_name("x_linux_amd64.go"));
        assert!(!ctx.matches_name("x_windows.go"));
        assert!(!ctx.matches_name("x_linux_arm64.go"));
        assert!(!ctx.matches_name("x_arm_test.go"));
        assert!(ctx.matches_name("linux.go"));
        assert!(ctx.matches_name("plain_file.go"));
    }

    #[test]
    fn malformed_expressions_exclude_the_file() {
        let ctx = linux(&[]);
        assert!(!ctx.matches_header("//go:build linux &&\npackage p\n"));
    }
}
