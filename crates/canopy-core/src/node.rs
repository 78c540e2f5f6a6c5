//! File and directory entry types.

use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::EntryError;

/// Device and inode pair identifying a file system object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time.
    pub accessed: SystemTime,
    /// Last status change time.
    pub changed: SystemTime,
}

impl Timestamps {
    /// Create timestamps with only modified time; the others are copied from it.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: modified,
            changed: modified,
        }
    }

    /// Create timestamps with all three times.
    pub fn new(modified: SystemTime, accessed: SystemTime, changed: SystemTime) -> Self {
        Self {
            modified,
            accessed,
            changed,
        }
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::with_modified(SystemTime::UNIX_EPOCH)
    }
}

/// Type of file system object, taken from the mode bits of `lstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    #[default]
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Named pipe.
    Fifo,
    /// Unix domain socket.
    Socket,
    /// Block device.
    BlockDevice,
    /// Character device.
    CharDevice,
    /// Anything the platform reports that is none of the above.
    Other,
}

impl EntryKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Check if this is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, EntryKind::Symlink)
    }
}

/// A single node of the result tree.
///
/// `kind` describes the object itself (a symlink stays a symlink), while
/// `is_dir` reports whether the object, after following a symlink, is a
/// directory. Only entries with `is_dir` set ever carry children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// File/directory name (not full path).
    pub name: CompactString,

    /// Object type from `lstat`.
    pub kind: EntryKind,

    /// Raw mode bits from `lstat`.
    pub mode: u32,

    /// Mode bits of the symlink target, when this entry is a symlink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_mode: Option<u32>,

    /// Whether the entry is, or resolves to, a directory.
    pub is_dir: bool,

    /// Whether any execute bit is set on the (resolved) object.
    pub executable: bool,

    /// Owner user id.
    pub uid: u32,

    /// Owner group id.
    pub gid: u32,

    /// Size in bytes; the aggregated subtree size for directories when
    /// aggregation is enabled.
    pub size: u64,

    /// Access, status change and modification times.
    pub timestamps: Timestamps,

    /// Identity of the resolved object (the target, for symlinks).
    pub inode: InodeInfo,

    /// Identity of the entry itself, as seen by `lstat`.
    pub link_inode: InodeInfo,

    /// Symlink target, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<CompactString>,

    /// The symlink target cannot be resolved.
    #[serde(default)]
    pub orphan: bool,

    /// Problem encountered while reading this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EntryError>,

    /// Annotation lines supplied by a comment source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Vec<String>>,

    /// Children (directories only), in final sibling order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Entry>,
}

impl Entry {
    /// Create a bare entry of the given kind with default metadata.
    pub fn new(name: impl Into<CompactString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mode: 0,
            link_mode: None,
            is_dir: kind.is_dir(),
            executable: false,
            uid: 0,
            gid: 0,
            size: 0,
            timestamps: Timestamps::default(),
            inode: InodeInfo::default(),
            link_inode: InodeInfo::default(),
            link_target: None,
            orphan: false,
            error: None,
            comment: None,
            children: Vec::new(),
        }
    }

    /// Create a new regular file entry.
    pub fn new_file(name: impl Into<CompactString>, size: u64, timestamps: Timestamps) -> Self {
        Self {
            size,
            timestamps,
            ..Self::new(name, EntryKind::File)
        }
    }

    /// Create a new directory entry.
    pub fn new_directory(name: impl Into<CompactString>, timestamps: Timestamps) -> Self {
        Self {
            timestamps,
            ..Self::new(name, EntryKind::Directory)
        }
    }

    /// Check if this entry is, or resolves to, a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Check if this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }

    /// Check if an error was recorded for this entry.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Attach an error. Children are dropped: an entry with an error has none.
    pub fn set_error(&mut self, error: EntryError) {
        self.children.clear();
        self.error = Some(error);
    }

    /// Visit this entry and all descendants in depth-first pre-order.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(&'a Entry, usize)) {
        let mut stack = vec![(self, 0)];
        while let Some((entry, depth)) = stack.pop() {
            f(entry, depth);
            stack.extend(entry.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
}
