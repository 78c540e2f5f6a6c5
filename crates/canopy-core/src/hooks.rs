//! Extension points implemented by collaborators outside the core.

use std::path::Path;

/// Decides whether an entry is dropped before it is ever built, e.g. from
/// ignore files.
pub trait IgnoreFilter {
    /// Return `true` to drop the entry at `path`.
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool;
}

impl<F> IgnoreFilter for F
where
    F: Fn(&Path, bool) -> bool,
{
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        self(path, is_dir)
    }
}

/// Supplies annotation lines for entries.
pub trait CommentSource {
    /// Lines to attach to the entry `name` at `path`, if any.
    fn comment_for(&self, path: &Path, name: &str, is_dir: bool) -> Option<Vec<String>>;
}

impl<F> CommentSource for F
where
    F: Fn(&Path, &str, bool) -> Option<Vec<String>>,
{
    fn comment_for(&self, path: &Path, name: &str, is_dir: bool) -> Option<Vec<String>> {
        self(path, name, is_dir)
    }
}
