//! Error types for tree building.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors: the build cannot start or cannot produce a root.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for the root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An include, exclude or ignore pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Syntax errors in a match pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// `|` at the start or end of a pattern (or of an alternative).
    #[error("empty alternative around '|'")]
    EmptyAlternative,

    /// A `[` class with no closing `]`.
    #[error("unterminated character class starting at byte {offset}")]
    UnterminatedClass { offset: usize },

    /// A glob handed to the path-ignore set failed to parse.
    #[error("{message}")]
    Glob { message: String },
}

/// Per-entry problem recorded on the entry itself. Never aborts a build.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryError {
    /// The directory could not be opened.
    #[error("error opening dir")]
    Open { message: String },

    /// A followed symlink leads back into a directory on the open chain.
    #[error("recursive, not followed")]
    Recursive,

    /// Too many entries to descend into.
    #[error("{count} entries exceeds filelimit, not opening dir")]
    LimitExceeded { count: usize },

    /// `readlink` failed on a symlink.
    #[error("error reading symbolic link information")]
    UnreadableLink,
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory could not be opened.
    ReadError,
    /// Symlink cycle, not followed.
    Recursive,
    /// Directory skipped because of the entry limit.
    LimitExceeded,
    /// Symbolic link target does not exist.
    BrokenSymlink,
}

impl WarningKind {
    /// Whether this warning counts towards the error total.
    pub fn is_error(&self) -> bool {
        matches!(self, WarningKind::ReadError)
    }
}

/// Non-fatal warning encountered during a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning mirroring an entry error.
    pub fn from_entry_error(path: impl Into<PathBuf>, error: &EntryError) -> Self {
        let kind = match error {
            EntryError::Open { .. } => WarningKind::ReadError,
            EntryError::Recursive => WarningKind::Recursive,
            EntryError::LimitExceeded { .. } => WarningKind::LimitExceeded,
            EntryError::UnreadableLink => WarningKind::BrokenSymlink,
        };
        let message = match error {
            EntryError::Open { message } => format!("{error}: {message}"),
            _ => error.to_string(),
        };
        Self::new(path, message, kind)
    }

    /// Create a broken symlink warning.
    pub fn broken_symlink(path: impl Into<PathBuf>, target: &str) -> Self {
        let path = path.into();
        Self {
            message: format!("Broken symlink: {} -> {target}", path.display()),
            path,
            kind: WarningKind::BrokenSymlink,
        }
    }
}
