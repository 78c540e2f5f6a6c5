//! Directory traversal engine for canopy.
//!
//! # Overview
//!
//! `canopy-scan` walks a directory hierarchy and produces the filtered,
//! pruned, size-aggregated and ordered tree described by a
//! [`TreeConfig`]. Key pieces:
//!
//! - [`DirectoryReader`] lists one directory with `lstat`/`stat` metadata
//! - [`VisitedSet`] guards followed directory symlinks against cycles
//! - [`TreeBuilder`] drives an explicit frame stack over the hierarchy
//! - [`GlobIgnore`] is a ready-made ignore predicate backed by `globset`
//!
//! # Example
//!
//! ```rust,no_run
//! use canopy_scan::{TreeBuilder, TreeConfig};
//!
//! let config = TreeConfig::builder()
//!     .include_patterns(vec!["*.rs".to_string()])
//!     .prune(true)
//!     .build()
//!     .unwrap();
//! let tree = TreeBuilder::new(config).unwrap().build(".").unwrap();
//!
//! println!("{} directories, {} files", tree.stats.directories, tree.stats.files);
//! ```
//!
//! # Hooks
//!
//! Ignore predicates and comment sources are plain closures or types
//! implementing [`IgnoreFilter`] / [`CommentSource`]:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use canopy_scan::{TreeBuilder, TreeConfig};
//!
//! let builder = TreeBuilder::new(TreeConfig::default())
//!     .unwrap()
//!     .with_ignore(|path: &Path, is_dir: bool| is_dir && path.ends_with("target"))
//!     .with_comments(|_: &Path, name: &str, _: bool| {
//!         (name == "README.md").then(|| vec!["start here".to_string()])
//!     });
//! let tree = builder.build(".").unwrap();
//! ```

mod builder;
mod ignore;
mod reader;
mod visited;

pub use builder::{Scan, TreeBuilder};
pub use ignore::GlobIgnore;
pub use reader::{DirListing, DirectoryReader, LinkInfo, RawEntry};
pub use visited::VisitedSet;

// Re-export core types for convenience
pub use canopy_core::{
    CommentSource, Entry, EntryError, EntryKind, FileTree, IgnoreFilter, MetaSort, ScanError,
    ScanWarning, SortKey, Sorter, TreeConfig, TreeStats, WarningKind,
};
