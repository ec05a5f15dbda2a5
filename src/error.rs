use std::fmt;
use std::panic::Location;

use thiserror::Error;

use crate::loader::LoadError;

/// Coarse classification of a failure, for callers that only branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    TypeResolution,
    Load,
    Render,
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("no struct literal found at selection")]
    NoStructLiteral,

    #[error("enclosing Func is null")]
    NoEnclosingFunc,

    /// A type that cannot be spelled from the current file.
    #[error("cannot qualify type: {0}")]
    TypeResolution(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("render: {0}")]
    Render(String),
}

impl ErrorKind {
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::NoStructLiteral | ErrorKind::NoEnclosingFunc => ErrorClass::NotFound,
            ErrorKind::TypeResolution(_) => ErrorClass::TypeResolution,
            ErrorKind::Load(_) => ErrorClass::Load,
            ErrorKind::Render(_) => ErrorClass::Render,
        }
    }
}

/// Crate error: a kind plus the source location of the check that raised it.
pub struct Error {
    kind: ErrorKind,
    origin: &'static Location<'static>,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            origin: Location::caller(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }
}

impl From<ErrorKind> for Error {
    #[track_caller]
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<LoadError> for Error {
    #[track_caller]
    fn from(err: LoadError) -> Self {
        Error::new(ErrorKind::Load(err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.origin.file(),
            self.origin.line(),
            self.kind
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("origin", &format_args!("{}:{}", self.origin.file(), self.origin.line()))
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> Result<()> {
        Err(ErrorKind::NoStructLiteral)?
    }

    #[test]
    fn display_carries_origin() {
        let err = not_found().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("error.rs:"), "{text}");
        assert!(text.ends_with(": no struct literal found at selection"), "{text}");
        assert!(err.is_not_found());
    }

    #[test]
    fn load_errors_keep_their_message() {
        let err = Error::from(LoadError::OffsetOutOfRange { size: 3, offset: 9 });
        assert_eq!(err.class(), ErrorClass::Load);
        assert!(err
            .to_string()
            .ends_with("file size (3) is smaller than given offset (9)"));
    }
}
