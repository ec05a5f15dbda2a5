//! In-memory file contents that shadow the disk.
//!
//! The archive format is a sequence of entries, each `<filename>\n<decimal size>\n` followed
//! by exactly `size` bytes of content.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use super::LoadError;

#[derive(Debug, Clone, Default)]
pub struct Overlay {
    files: BTreeMap<PathBuf, String>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file. Relative paths are made absolute against the current
    /// directory.
    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(absolute(path.as_ref()), content.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(&absolute(path)).map(String::as_str)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(&absolute(path))
    }

    /// Overlay files directly inside `dir`.
    pub fn files_in<'a>(&'a self, dir: &Path) -> impl Iterator<Item = &'a Path> + 'a {
        let dir = absolute(dir);
        self.files
            .keys()
            .filter(move |p| p.parent() == Some(dir.as_path()))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn read_from(mut r: impl Read) -> Result<Self, LoadError> {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)
            .map_err(|e| LoadError::Overlay(format!("read: {e}")))?;
        Self::parse(&buf)
    }

    pub fn parse(mut data: &[u8]) -> Result<Self, LoadError> {
        let mut overlay = Overlay::new();
        while !data.is_empty() {
            let (name, rest) = split_line(data)
                .ok_or_else(|| LoadError::Overlay("missing file name".to_string()))?;
            let name = std::str::from_utf8(name)
                .map_err(|_| LoadError::Overlay("file name is not UTF-8".to_string()))?
                .to_string();
            let (size, rest) = split_line(rest)
                .ok_or_else(|| LoadError::Overlay(format!("missing size for {name}")))?;
            let size: usize = std::str::from_utf8(size)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| LoadError::Overlay(format!("invalid size for {name}")))?;
            if rest.len() < size {
                return Err(LoadError::Overlay(format!(
                    "{name}: expected {size} bytes, got {}",
                    rest.len()
                )));
            }
            let content = String::from_utf8(rest[..size].to_vec())
                .map_err(|_| LoadError::Overlay(format!("{name}: content is not UTF-8")))?;
            overlay.insert(&name, content);
            data = &rest[size..];
        }
        Ok(overlay)
    }
}

fn split_line(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let nl = data.iter().position(|&b| b == b'\n')?;
    Some((&data[..nl], &data[nl + 1..]))
}

/// Absolute, lexically normalised path. Does not touch the filesystem beyond reading the
/// current directory.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let mut out = PathBuf::new();
    for c in joined.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_consecutive_entries() {
        let archive = b"/w/a.go\n10\npackage a\n/w/b.go\n3\nxyz";
        let overlay = Overlay::parse(archive).unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.get(Path::new("/w/a.go")), Some("package a\n"));
        assert_eq!(overlay.get(Path::new("/w/b.go")), Some("xyz"));
    }

    #[test]
    fn content_may_contain_newlines_and_digits() {
        let archive = b"/w/a.go\n5\n1\n2\n3";
        let overlay = Overlay::parse(archive).unwrap();
        assert_eq!(overlay.get(Path::new("/w/a.go")), Some("1\n2\n3"));
    }

    #[test]
    fn truncated_content_is_an_error() {
        let err = Overlay::parse(b"/w/a.go\n50\nshort").unwrap_err();
        assert!(matches!(err, LoadError::Overlay(_)));
    }

    #[test]
    fn lists_files_by_directory() {
        let mut overlay = Overlay::new();
        overlay.insert("/w/p/a.go", "");
        overlay.insert("/w/p/sub/b.go", "");
        overlay.insert("/w/p/../p/c.go", "");
        let names: Vec<_> = overlay.files_in(Path::new("/w/p")).collect();
        assert_eq!(names, [Path::new("/w/p/a.go"), Path::new("/w/p/c.go")]);
    }
}
