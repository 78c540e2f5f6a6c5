//! Finished tree container and statistics.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::TreeConfig;
use crate::error::ScanWarning;
use crate::node::Entry;
use crate::render::{Renderer, render};

/// Summary statistics for a finished tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Directories below the root (the root itself is not counted).
    pub directories: u64,
    /// Non-directory entries.
    pub files: u64,
    /// Sum of the sizes of all non-directory entries.
    pub total_size: u64,
    /// Deepest level holding an entry.
    pub max_depth: usize,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count everything below `root`.
    pub fn from_root(root: &Entry) -> Self {
        let mut stats = Self::new();
        root.walk(|entry, depth| {
            if depth == 0 {
                return;
            }
            if entry.is_dir() {
                stats.record_dir(depth);
            } else {
                stats.record_file(entry.size, depth);
            }
        });
        stats
    }

    /// Record a non-directory entry.
    pub fn record_file(&mut self, size: u64, depth: usize) {
        self.files += 1;
        self.total_size += size;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: usize) {
        self.directories += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// A complete tree with the context it was built in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTree {
    /// Root entry.
    pub root: Entry,

    /// Root path as given.
    pub root_path: PathBuf,

    /// When this build finished.
    pub scanned_at: SystemTime,

    /// Duration of the build.
    pub scan_duration: Duration,

    /// Configuration used.
    pub config: TreeConfig,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Non-fatal problems met along the way.
    pub warnings: Vec<ScanWarning>,
}

impl FileTree {
    /// Create a new file tree; statistics are computed from `root`.
    pub fn new(
        root: Entry,
        root_path: PathBuf,
        config: TreeConfig,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        let stats = TreeStats::from_root(&root);
        Self {
            root,
            root_path,
            scanned_at: SystemTime::now(),
            scan_duration,
            config,
            stats,
            warnings,
        }
    }

    /// Number of directories that could not be opened.
    pub fn error_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.kind.is_error()).count()
    }

    /// Check if there were any warnings during the build.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Size recorded on the root entry.
    pub fn total_size(&self) -> u64 {
        self.root.size
    }

    /// Hand the tree to a renderer.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> io::Result<()> {
        render(&self.root, renderer)
    }
}
