//! Glob-based ignore predicate.

use std::path::Path;

use canopy_core::{IgnoreFilter, PatternError, ScanError};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Ignore predicate backed by a [`GlobSet`].
///
/// A path is ignored when a glob matches either the full path or its final
/// component, so both `**/target` and `target` drop a `target` directory.
#[derive(Debug, Clone)]
pub struct GlobIgnore {
    set: GlobSet,
    dirs_only: bool,
}

impl GlobIgnore {
    /// Compile a set of globs.
    pub fn new<I, S>(globs: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for glob in globs {
            let glob = glob.as_ref();
            builder.add(Glob::new(glob).map_err(|e| invalid(glob, &e))?);
        }
        let set = builder
            .build()
            .map_err(|e| invalid(e.glob().unwrap_or_default(), &e))?;
        Ok(Self {
            set,
            dirs_only: false,
        })
    }

    /// Only ignore directories.
    pub fn dirs_only(mut self, dirs_only: bool) -> Self {
        self.dirs_only = dirs_only;
        self
    }
}

impl IgnoreFilter for GlobIgnore {
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        if self.dirs_only && !is_dir {
            return false;
        }
        self.set.is_match(path) || path.file_name().is_some_and(|name| self.set.is_match(name))
    }
}

fn invalid(glob: &str, err: &globset::Error) -> ScanError {
    ScanError::InvalidPattern {
        pattern: glob.to_string(),
        source: PatternError::Glob {
            message: err.kind().to_string(),
        },
    }
}
