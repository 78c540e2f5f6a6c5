//! Core types and traits for canopy.
//!
//! This crate provides the data structures shared by the traversal engine
//! and its collaborators: entries, configuration, name patterns, sibling
//! ordering, extension hooks and the renderer contract.

mod config;
mod error;
mod hooks;
mod node;
mod pattern;
mod render;
mod sort;
mod tree;

pub use config::{TreeConfig, TreeConfigBuilder, TreeConfigBuilderError};
pub use error::{EntryError, PatternError, ScanError, ScanWarning, WarningKind};
pub use hooks::{CommentSource, IgnoreFilter};
pub use node::{Entry, EntryKind, InodeInfo, Timestamps};
pub use pattern::{MatchResult, Pattern, PatternSet, match_pattern};
pub use render::{Renderer, render};
pub use sort::{MetaSort, SortKey, Sorter, version_cmp};
pub use tree::{FileTree, TreeStats};
