//! Depth-first tree construction.

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use canopy_core::{
    CommentSource, Entry, EntryError, FileTree, IgnoreFilter, InodeInfo, PatternSet, ScanError,
    ScanWarning, Sorter, TreeConfig,
};
use compact_str::CompactString;
use tracing::{debug, trace, warn};

use crate::reader::{DirListing, DirectoryReader, RawEntry};
use crate::visited::VisitedSet;

/// Filtered, pruned and aggregated tree whose siblings are still in
/// directory order.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Root entry.
    pub root: Entry,
    /// Non-fatal problems met along the way.
    pub warnings: Vec<ScanWarning>,
}

/// Builds a [`FileTree`] from a root path under one immutable
/// [`TreeConfig`].
///
/// Building happens in two phases: [`collect`](Self::collect) walks the
/// file system, filtering, pruning and aggregating bottom-up, then the
/// configured [`Sorter`] orders every sibling list top-down.
/// [`build`](Self::build) runs both.
pub struct TreeBuilder {
    config: TreeConfig,
    include: PatternSet,
    exclude: PatternSet,
    sorter: Sorter,
    ignore: Option<Box<dyn IgnoreFilter>>,
    comments: Option<Box<dyn CommentSource>>,
}

impl TreeBuilder {
    /// Validate the config and compile its patterns.
    pub fn new(config: TreeConfig) -> Result<Self, ScanError> {
        config
            .validate()
            .map_err(|message| ScanError::InvalidConfig { message })?;
        let include = PatternSet::new(&config.include_patterns, config.ignore_case)?;
        let exclude = PatternSet::new(&config.exclude_patterns, config.ignore_case)?;
        let sorter = config.sorter();

        Ok(Self {
            config,
            include,
            exclude,
            sorter,
            ignore: None,
            comments: None,
        })
    }

    /// Drop entries the predicate rejects before they are built.
    pub fn with_ignore(mut self, ignore: impl IgnoreFilter + 'static) -> Self {
        self.ignore = Some(Box::new(ignore));
        self
    }

    /// Attach annotation lines to entries.
    pub fn with_comments(mut self, comments: impl CommentSource + 'static) -> Self {
        self.comments = Some(Box::new(comments));
        self
    }

    /// Build the sorted tree rooted at `root`.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<FileTree, ScanError> {
        let start = Instant::now();
        let root = root.as_ref();

        let Scan {
            root: mut entry,
            warnings,
        } = self.collect(root)?;
        self.sorter.sort_tree(&mut entry);

        let tree = FileTree::new(
            entry,
            root.to_path_buf(),
            self.config.clone(),
            start.elapsed(),
            warnings,
        );
        debug!(
            root = %root.display(),
            directories = tree.stats.directories,
            files = tree.stats.files,
            errors = tree.error_count(),
            elapsed_ms = tree.scan_duration.as_millis() as u64,
            "Tree built"
        );
        Ok(tree)
    }

    /// Walk `root` without sorting.
    pub fn collect(&self, root: impl AsRef<Path>) -> Result<Scan, ScanError> {
        let root = root.as_ref();
        let raw = RawEntry::stat_root(root).map_err(|e| ScanError::io(root, e))?;
        if !raw.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut entry = raw.into_entry();
        entry.name = CompactString::new(root.to_string_lossy());

        let mut walk = Walk {
            visited: VisitedSet::new(),
            root_device: self.config.one_filesystem.then_some(entry.inode.device),
            warnings: Vec::new(),
        };

        let recorded = self.config.follow_links.then_some(entry.inode);
        if let Some(info) = recorded {
            walk.visited.record(info);
        }

        let pending = self.open(&mut entry, root, 0, &mut walk);
        let frame = Frame::new(entry, root.to_path_buf(), 0, pending, recorded);
        let root = self.descend(frame, &mut walk);

        Ok(Scan {
            root,
            warnings: walk.warnings,
        })
    }

    /// Run the frame stack until the root frame closes.
    fn descend(&self, mut root: Frame, walk: &mut Walk) -> Entry {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let frame = stack.last_mut().unwrap_or(&mut root);
            match frame.pending.next() {
                Some(child) => {
                    if let Some(next) = self.step(frame, child, walk) {
                        stack.push(next);
                    }
                }
                None => match stack.pop() {
                    Some(done) => {
                        let entry = self.close(done, walk);
                        let parent = stack.last_mut().unwrap_or(&mut root);
                        self.attach(parent, entry, true);
                    }
                    None => return self.close(root, walk),
                },
            }
        }
    }

    /// Handle one child of `frame`: attach it directly, or return the frame
    /// to descend into.
    fn step(&self, frame: &mut Frame, child: Child, walk: &mut Walk) -> Option<Frame> {
        let Child {
            entry: mut child,
            path,
            link,
        } = child;
        if !child.is_dir() || walk.crosses_device(&child) {
            self.attach(frame, child, false);
            return None;
        }

        let path = if child.is_symlink() {
            let target = match link {
                Some(target) if self.config.follow_links => target,
                _ => {
                    self.attach(frame, child, true);
                    return None;
                }
            };
            if target.is_absolute() {
                target
            } else {
                frame.path.join(target)
            }
        } else {
            path
        };

        let mut recorded = None;
        if self.config.follow_links {
            if walk.visited.record(child.inode) {
                if child.is_symlink() {
                    debug!(path = %path.display(), "Symlink cycle, not followed");
                    let error = EntryError::Recursive;
                    walk.warnings
                        .push(ScanWarning::from_entry_error(&path, &error));
                    child.set_error(error);
                    self.attach(frame, child, true);
                    return None;
                }
            } else {
                recorded = Some(child.inode);
            }
        }

        let level = frame.level + 1;
        let pending = self.open(&mut child, &path, level, walk);
        Some(Frame::new(child, path, level, pending, recorded))
    }

    /// List the directory behind `entry`, recording any failure on it.
    fn open(&self, entry: &mut Entry, path: &Path, level: usize, walk: &mut Walk) -> Vec<Child> {
        match self.open_dir(path, level, walk) {
            Opened::Listed(children) => children,
            Opened::Empty => Vec::new(),
            Opened::Failed(error) => {
                entry.set_error(error);
                Vec::new()
            }
        }
    }

    /// Read and filter one directory at `level` (the root is level 0).
    fn open_dir(&self, path: &Path, level: usize, walk: &mut Walk) -> Opened {
        if self.config.max_depth.is_some_and(|max| level >= max) {
            return Opened::Empty;
        }

        let reader = DirectoryReader::new(&self.config, self.ignore.as_deref());
        let raw = match reader.read(path) {
            Ok(DirListing::Entries(raw)) => raw,
            Ok(DirListing::Empty) => return Opened::Empty,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to open directory");
                let error = EntryError::Open {
                    message: err.to_string(),
                };
                walk.warnings
                    .push(ScanWarning::from_entry_error(path, &error));
                return Opened::Failed(error);
            }
        };
        debug!(path = %path.display(), level, entries = raw.len(), "Opened directory");

        let suppress_include = self.suppresses_include(path, level);
        let mut children = Vec::with_capacity(raw.len());
        let mut warnings = Vec::new();

        for raw in raw {
            if self.filtered_out(&raw, suppress_include) {
                trace!(path = %raw.path.display(), "Filtered out");
                continue;
            }

            if raw.is_unreadable_link() {
                warnings.push(ScanWarning::from_entry_error(
                    &raw.path,
                    &EntryError::UnreadableLink,
                ));
            } else if raw.is_orphan() {
                let target = raw.link_target().unwrap_or_default();
                warnings.push(ScanWarning::broken_symlink(&raw.path, &target));
            }

            let comment = self
                .comments
                .as_ref()
                .and_then(|source| source.comment_for(&raw.path, &raw.name, raw.is_dir()));
            let path = raw.path.clone();
            let link = raw.link_path().map(Path::to_path_buf);
            let mut entry = raw.into_entry();
            entry.comment = comment;
            children.push(Child { entry, path, link });
        }

        if children.is_empty() {
            return Opened::Empty;
        }

        if self.config.file_limit.is_some_and(|limit| children.len() > limit) {
            let error = EntryError::LimitExceeded {
                count: children.len(),
            };
            debug!(path = %path.display(), count = children.len(), "Entry limit exceeded");
            walk.warnings
                .push(ScanWarning::from_entry_error(path, &error));
            return Opened::Failed(error);
        }

        walk.warnings.append(&mut warnings);
        Opened::Listed(children)
    }

    /// Whether `raw` is dropped by the dirs-only rule or a name pattern.
    fn filtered_out(&self, raw: &RawEntry, suppress_include: bool) -> bool {
        let is_dir = raw.is_dir();
        if self.config.dirs_only && !is_dir {
            return true;
        }

        let include_applies = !suppress_include
            && !self.include.is_empty()
            && !raw.is_real_dir()
            && !(self.config.follow_links && is_dir);
        if include_applies && !self.include.matches(&raw.name, is_dir) {
            return true;
        }

        self.exclude.matches(&raw.name, is_dir)
    }

    /// In match-dirs mode, a directory whose path relative to the root
    /// matches an include pattern lists its direct children unfiltered by
    /// include patterns.
    fn suppresses_include(&self, path: &Path, level: usize) -> bool {
        if level == 0 || !self.config.match_dirs || self.include.is_empty() {
            return false;
        }
        let segments: Vec<_> = path
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        let relative = segments[segments.len().saturating_sub(level)..].join("/");
        !relative.is_empty() && self.include.matches(&relative, true)
    }

    /// Whether a childless directory is kept because its own name matches
    /// an include pattern in match-dirs mode.
    fn exempt_from_pruning(&self, entry: &Entry) -> bool {
        self.config.match_dirs
            && !self.include.is_empty()
            && self.include.matches(&entry.name, entry.is_dir())
    }

    /// Add a finished child to its parent frame, or prune it. A directory
    /// that was not descended keeps its own size.
    fn attach(&self, frame: &mut Frame, child: Entry, prunable: bool) {
        if prunable
            && child.is_dir()
            && child.children.is_empty()
            && self.config.prunes()
            && !child.has_error()
            && !self.exempt_from_pruning(&child)
        {
            trace!(name = %child.name, parent = %frame.path.display(), "Pruned empty directory");
            return;
        }

        if self.config.aggregate_sizes {
            frame.size += child.size;
        }
        frame.entry.children.push(child);
    }

    /// Finish a frame: release its identity and settle its size.
    fn close(&self, frame: Frame, walk: &mut Walk) -> Entry {
        if let Some(info) = frame.recorded {
            walk.visited.release(&info);
        }
        let mut entry = frame.entry;
        if self.config.aggregate_sizes {
            entry.size = frame.size;
        }
        entry
    }
}

/// Mutable state shared by every frame of one walk.
struct Walk {
    visited: VisitedSet,
    root_device: Option<u64>,
    warnings: Vec<ScanWarning>,
}

impl Walk {
    fn crosses_device(&self, entry: &Entry) -> bool {
        self.root_device
            .is_some_and(|device| entry.inode.device != device)
    }
}

/// A directory whose children are being processed.
struct Frame {
    entry: Entry,
    path: PathBuf,
    level: usize,
    pending: std::vec::IntoIter<Child>,
    size: u64,
    recorded: Option<InodeInfo>,
}

impl Frame {
    fn new(
        entry: Entry,
        path: PathBuf,
        level: usize,
        pending: Vec<Child>,
        recorded: Option<InodeInfo>,
    ) -> Self {
        Self {
            entry,
            path,
            level,
            pending: pending.into_iter(),
            size: 0,
            recorded,
        }
    }
}

/// A listed entry with the on-disk paths needed to descend into it. The
/// entry's name and link target are display text and may be lossy.
struct Child {
    entry: Entry,
    path: PathBuf,
    link: Option<PathBuf>,
}

/// Outcome of opening one directory.
enum Opened {
    Listed(Vec<Child>),
    Empty,
    Failed(EntryError),
}
