//! Finds, reads, filters and parses the files of the target package and its imports, then
//! hands them to the checker.

pub mod constraint;
pub mod overlay;

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use reftools_syntax::lexer::{Lexer, Tok};
use reftools_syntax::{parse_source, ParseFailure, ParsedFile};
use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::check::{self, FileInput, UnitInput};
use crate::program::{FileId, Pos, Program, SourceFile};

pub use constraint::BuildContext;
pub use overlay::Overlay;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not find file {path:?}")]
    FileNotFound { path: String },

    #[error("file size ({size}) is smaller than given offset ({offset})")]
    OffsetOutOfRange { size: usize, offset: usize },

    #[error("{path}: {failure}")]
    Parse {
        path: String,
        #[source]
        failure: ParseFailure,
    },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("overlay: {0}")]
    Overlay(String),
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub build: BuildContext,
    /// Root of the standard library sources; `None` leaves standard imports opaque.
    pub goroot: Option<PathBuf>,
    pub overlay: Overlay,
}

impl LoadConfig {
    /// Host build context with the given tags, `GOROOT` from the environment and no overlay.
    pub fn from_env(tags: impl IntoIterator<Item = String>) -> Self {
        LoadConfig {
            build: BuildContext::host(tags),
            goroot: std::env::var_os("GOROOT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            overlay: Overlay::new(),
        }
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = overlay;
        self
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig::from_env(std::iter::empty())
    }
}

/// A checked program and the file and offset a request points into.
#[derive(Debug)]
pub struct Loaded {
    pub program: Program,
    pub file: FileId,
    pub offset: u32,
}

impl Loaded {
    pub fn source(&self) -> &SourceFile {
        self.program.file(self.file)
    }

    /// Global position of the request offset.
    pub fn pos(&self) -> Pos {
        self.source().pos(self.offset)
    }
}

/// Loads the package containing `path` with its imports and checks it.
pub fn load(config: &LoadConfig, path: &Path, offset: usize) -> Result<Loaded, LoadError> {
    let span = info_span!("load", path = %path.display(), offset);
    let _enter = span.enter();

    let target = target_path(config, path)?;
    let src = read_source(config, &target)?;
    if offset > src.len() {
        return Err(LoadError::OffsetOutOfRange {
            size: src.len(),
            offset,
        });
    }
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let mut files = vec![FileInput {
        parsed: parse_target(&target, &src)?,
        path: target.clone(),
    }];
    let package = files[0].parsed.package_name().to_string();

    for candidate in list_go_files(config, &dir)? {
        if candidate == target {
            continue;
        }
        let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        let src = read_source(config, &candidate)?;
        if !config.build.matches(name, &src) {
            debug!(file = name, "excluded by build constraints");
            continue;
        }
        if package_clause(&src) != Some(package.as_str()) {
            debug!(file = name, "different package");
            continue;
        }
        files.push(FileInput {
            parsed: parse_target(&candidate, &src)?,
            path: candidate,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let imports = import_paths(files.iter().map(|f| &f.parsed));
    let mut deps = DepLoader {
        config,
        module: find_module(config, &dir),
        seen: HashSet::new(),
        units: Vec::new(),
    };
    for import in imports {
        deps.visit(&import);
    }

    let mut units = deps.units;
    units.push(UnitInput {
        path: dir.display().to_string(),
        files,
        opaque: false,
        check_bodies: true,
    });
    let program = check::check(units);
    let file = program
        .file_by_path(&target)
        .ok_or_else(|| LoadError::FileNotFound {
            path: target.display().to_string(),
        })?;
    Ok(Loaded {
        program,
        file,
        offset: offset as u32,
    })
}

fn target_path(config: &LoadConfig, path: &Path) -> Result<PathBuf, LoadError> {
    let abs = overlay::absolute(path);
    if config.overlay.contains(&abs) {
        return Ok(abs);
    }
    std::fs::canonicalize(path).map_err(|_| LoadError::FileNotFound {
        path: path.display().to_string(),
    })
}

fn read_source(config: &LoadConfig, path: &Path) -> Result<String, LoadError> {
    if let Some(src) = config.overlay.get(path) {
        return Ok(src.to_string());
    }
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_target(path: &Path, src: &str) -> Result<ParsedFile, LoadError> {
    parse_source(src).map_err(|failure| LoadError::Parse {
        path: path.display().to_string(),
        failure,
    })
}

/// `.go` files in `dir` from disk and overlay, sorted. A missing directory is empty.
fn list_go_files(config: &LoadConfig, dir: &Path) -> Result<BTreeSet<PathBuf>, LoadError> {
    let mut out: BTreeSet<PathBuf> = config
        .overlay
        .files_in(dir)
        .map(Path::to_path_buf)
        .collect();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(filter_go(out)),
        Err(source) => {
            return Err(LoadError::Io {
                path: dir.display().to_string(),
                source,
            })
        }
    };
    for entry in entries.flatten() {
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            out.insert(dir.join(entry.file_name()));
        }
    }
    Ok(filter_go(out))
}

fn filter_go(paths: BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    paths
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "go"))
        .collect()
}

/// The package name from the clause at the top of `src`.
pub fn package_clause(src: &str) -> Option<&str> {
    let mut toks = Lexer::new(src).map(|(_, tok, _)| tok);
    match (toks.next()?, toks.next()?) {
        (Tok::KwPackage, Tok::Ident(name)) => Some(name),
        _ => None,
    }
}

fn import_paths<'a>(files: impl Iterator<Item = &'a ParsedFile>) -> BTreeSet<String> {
    files
        .flat_map(|f| f.imports().map(move |spec| spec.path.unquoted(&f.src).to_string()))
        .filter(|p| p != "C")
        .collect()
}

/// The directory holding `go.mod` and its module path, searching upwards from `dir`.
fn find_module(config: &LoadConfig, dir: &Path) -> Option<(PathBuf, String)> {
    for ancestor in dir.ancestors() {
        let go_mod = ancestor.join("go.mod");
        let Ok(text) = read_source(config, &go_mod) else {
            continue;
        };
        let module = text.lines().find_map(|line| {
            let rest = line.trim().strip_prefix("module")?;
            let name = rest.trim().trim_matches('"');
            (!name.is_empty() && rest.starts_with(char::is_whitespace)).then_some(name)
        });
        match module {
            Some(m) => return Some((ancestor.to_path_buf(), m.to_string())),
            None => {
                debug!(path = %go_mod.display(), "go.mod without module directive");
                return None;
            }
        }
    }
    None
}

struct DepLoader<'c> {
    config: &'c LoadConfig,
    module: Option<(PathBuf, String)>,
    seen: HashSet<String>,
    /// Dependencies first.
    units: Vec<UnitInput>,
}

impl DepLoader<'_> {
    fn visit(&mut self, import: &str) {
        if !self.seen.insert(import.to_string()) {
            return;
        }
        if import == "unsafe" {
            self.units.push(UnitInput {
                path: import.to_string(),
                files: Vec::new(),
                opaque: false,
                check_bodies: false,
            });
            return;
        }

        let files = self
            .candidate_dirs(import)
            .into_iter()
            .map(|dir| self.load_dir(&dir))
            .find(|files| !files.is_empty())
            .unwrap_or_default();
        if files.is_empty() {
            warn!(import, "package not found, treating it as opaque");
            self.units.push(UnitInput {
                path: import.to_string(),
                files,
                opaque: true,
                check_bodies: false,
            });
            return;
        }

        for dep in import_paths(files.iter().map(|f| &f.parsed)) {
            self.visit(&dep);
        }
        self.units.push(UnitInput {
            path: import.to_string(),
            files,
            opaque: false,
            check_bodies: false,
        });
    }

    fn candidate_dirs(&self, import: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some((root, module)) = &self.module {
            if import == module {
                dirs.push(root.clone());
            } else if let Some(rest) = import
                .strip_prefix(module.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                dirs.push(root.join(rest));
            }
            dirs.push(root.join("vendor").join(import));
        }
        if let Some(goroot) = &self.config.goroot {
            dirs.push(goroot.join("src").join(import));
            dirs.push(goroot.join("src").join("vendor").join(import));
        }
        dirs
    }

    /// Non-test files of one package directory. Files that fail to read or parse are
    /// skipped.
    fn load_dir(&self, dir: &Path) -> Vec<FileInput> {
        let paths = match list_go_files(self.config, dir) {
            Ok(paths) => paths,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "cannot list directory");
                return Vec::new();
            }
        };
        let mut package: Option<String> = None;
        let mut files = Vec::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('_') || name.starts_with('.') || name.ends_with("_test.go") {
                continue;
            }
            let Ok(src) = read_source(self.config, &path) else {
                continue;
            };
            if !self.config.build.matches(name, &src) {
                continue;
            }
            let Some(clause) = package_clause(&src) else {
                continue;
            };
            if clause == "main" || package.as_deref().is_some_and(|p| p != clause) {
                continue;
            }
            match parse_source(&src) {
                Ok(parsed) => {
                    package.get_or_insert_with(|| clause.to_string());
                    files.push(FileInput { path, parsed });
                }
                Err(failure) => {
                    debug!(file = %path.display(), %failure, "skipping unparsable dependency file");
                }
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_package_clause_after_comments() {
        let src = "// Copyright\n\n/* doc */\npackage widgets // trailing\n";
        assert_eq!(package_clause(src), Some("widgets"));
        assert_eq!(package_clause("func main() {}"), None);
    }

    #[test]
    fn unknown_files_are_not_found() {
        let config = LoadConfig::default();
        let err = load(&config, Path::new("/definitely/not/here.go"), 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not find file \"/definitely/not/here.go\""
        );
    }

    #[test]
    fn offsets_past_the_end_are_rejected() {
        let mut overlay = Overlay::new();
        overlay.insert("/virtual/p/a.go", "package p\n");
        let config = LoadConfig::default().with_overlay(overlay);
        let err = load(&config, Path::new("/virtual/p/a.go"), 11).unwrap_err();
        assert!(matches!(
            err,
            LoadError::OffsetOutOfRange {
                size: 10,
                offset: 11
            }
        ));
    }

    #[test]
    fn module_path_comes_from_go_mod() {
        let mut overlay = Overlay::new();
        overlay.insert("/virtual/m/go.mod", "module example.com/m\n\ngo 1.22\n");
        let config = LoadConfig::default().with_overlay(overlay);
        let found = find_module(&config, Path::new("/virtual/m/sub/pkg"));
        assert_eq!(
            found,
            Some((PathBuf::from("/virtual/m"), "example.com/m".to_string()))
        );
    }
}
