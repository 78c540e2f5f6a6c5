//! Tree building configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::sort::{MetaSort, SortKey, Sorter};

/// Immutable settings for one tree build.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TreeConfig {
    /// List entries whose names start with `.`.
    #[builder(default = "false")]
    #[serde(default)]
    pub show_hidden: bool,

    /// List directories only.
    #[builder(default = "false")]
    #[serde(default)]
    pub dirs_only: bool,

    /// Descend into symlinks that point at directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_links: bool,

    /// Do not descend into directories on another device than the root.
    #[builder(default = "false")]
    #[serde(default)]
    pub one_filesystem: bool,

    /// Number of directory levels to list (None = unlimited). One lists the
    /// root's entries only.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Do not descend into directories holding more entries than this.
    #[builder(default)]
    #[serde(default)]
    pub file_limit: Option<usize>,

    /// Only list files matching one of these patterns.
    #[builder(default)]
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Never list entries matching one of these patterns.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Fold ASCII case when matching patterns.
    #[builder(default = "false")]
    #[serde(default)]
    pub ignore_case: bool,

    /// Test include patterns against directory names too.
    #[builder(default = "false")]
    #[serde(default)]
    pub match_dirs: bool,

    /// Drop directories left without children.
    #[builder(default = "false")]
    #[serde(default)]
    pub prune: bool,

    /// Replace directory sizes with the sum of their contents.
    #[builder(default = "false")]
    #[serde(default)]
    pub aggregate_sizes: bool,

    /// Base sibling order.
    #[builder(default)]
    #[serde(default)]
    pub sort: SortKey,

    /// Reverse the base sibling order.
    #[builder(default = "false")]
    #[serde(default)]
    pub reverse: bool,

    /// Put directories before files, or after.
    #[builder(default)]
    #[serde(default)]
    pub meta_sort: Option<MetaSort>,

    /// File name reserved by a renderer, never listed.
    #[builder(default)]
    #[serde(default)]
    pub reserved_name: Option<String>,
}

impl TreeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.max_depth {
            return Err("Max depth must be greater than 0".to_string());
        }
        if let Some(Some(0)) = self.file_limit {
            return Err("File limit must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl TreeConfig {
    /// Create a new tree config builder.
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::default()
    }

    /// Check the invariants the builder enforces, for configs that were
    /// deserialized or assembled by hand.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == Some(0) {
            return Err("Max depth must be greater than 0".to_string());
        }
        if self.file_limit == Some(0) {
            return Err("File limit must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Whether empty directories are removed. Listing directories only
    /// would leave nothing to show otherwise.
    pub fn prunes(&self) -> bool {
        self.prune && !self.dirs_only
    }

    /// Check if a name is hidden from the listing by the dot-file rule.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.show_hidden && name.starts_with('.')
    }

    /// Check if a name is the renderer's reserved file.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_name.as_deref() == Some(name)
    }

    /// The sibling comparator described by this config.
    pub fn sorter(&self) -> Sorter {
        Sorter::new(self.sort)
            .with_reverse(self.reverse)
            .with_meta(self.meta_sort)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            dirs_only: false,
            follow_links: false,
            one_filesystem: false,
            max_depth: None,
            file_limit: None,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            ignore_case: false,
            match_dirs: false,
            prune: false,
            aggregate_sizes: false,
            sort: SortKey::Name,
            reverse: false,
            meta_sort: None,
            reserved_name: None,
        }
    }
}
