//! Single-directory listing with metadata.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use canopy_core::{Entry, EntryError, EntryKind, IgnoreFilter, InodeInfo, Timestamps, TreeConfig};
use compact_str::CompactString;
use tracing::trace;

/// What `readlink` and `stat` report for a symlink.
#[derive(Debug, Clone)]
pub struct LinkInfo {
    /// Link contents; `None` when `readlink` failed.
    pub target: Option<PathBuf>,
    /// Metadata of the object the link resolves to; `None` for an orphan.
    pub resolved: Option<Metadata>,
}

/// One directory entry as read from disk, before an [`Entry`] is built.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// File name.
    pub name: String,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Metadata of the entry itself.
    pub lstat: Metadata,
    /// Set for symlinks only.
    pub link: Option<LinkInfo>,
}

impl RawEntry {
    /// Read the metadata of `path`, resolving it if it is a symlink.
    pub fn stat(name: impl Into<String>, path: PathBuf) -> io::Result<Self> {
        let lstat = fs::symlink_metadata(&path)?;
        let link = lstat.file_type().is_symlink().then(|| LinkInfo {
            target: fs::read_link(&path).ok(),
            resolved: fs::metadata(&path).ok(),
        });
        Ok(Self {
            name: name.into(),
            path,
            lstat,
            link,
        })
    }

    /// Read the root of a build. The root is always followed.
    pub fn stat_root(path: &Path) -> io::Result<Self> {
        Ok(Self {
            name: path.to_string_lossy().into_owned(),
            path: path.to_path_buf(),
            lstat: fs::metadata(path)?,
            link: None,
        })
    }

    /// Metadata of the object this entry stands for: the target for a
    /// resolvable symlink, the entry itself otherwise.
    fn resolved(&self) -> Option<&Metadata> {
        match &self.link {
            Some(link) => link.resolved.as_ref(),
            None => Some(&self.lstat),
        }
    }

    /// Whether the entry is a directory, or a readable symlink to one.
    pub fn is_dir(&self) -> bool {
        match &self.link {
            Some(LinkInfo { target: None, .. }) => false,
            _ => self.resolved().is_some_and(Metadata::is_dir),
        }
    }

    /// Whether the entry is a real directory, not a link to one.
    pub fn is_real_dir(&self) -> bool {
        self.lstat.is_dir()
    }

    /// A readable symlink whose target cannot be resolved.
    pub fn is_orphan(&self) -> bool {
        matches!(
            &self.link,
            Some(LinkInfo {
                target: Some(_),
                resolved: None
            })
        )
    }

    /// A symlink whose contents could not be read.
    pub fn is_unreadable_link(&self) -> bool {
        matches!(&self.link, Some(LinkInfo { target: None, .. }))
    }

    /// Link contents, if this is a readable symlink.
    pub fn link_path(&self) -> Option<&Path> {
        self.link.as_ref().and_then(|link| link.target.as_deref())
    }

    /// Link contents as text, if this is a readable symlink.
    pub fn link_target(&self) -> Option<CompactString> {
        self.link_path()
            .map(|target| CompactString::new(target.to_string_lossy()))
    }

    /// Build the tree node for this entry.
    pub fn into_entry(self) -> Entry {
        let resolved = self.resolved();
        let mut entry = Entry::new(self.name.as_str(), kind_of(&self.lstat));

        entry.mode = get_mode(&self.lstat);
        entry.link_mode = self
            .link
            .as_ref()
            .map(|link| link.resolved.as_ref().map_or(0, get_mode));
        entry.is_dir = self.is_dir();
        entry.executable = resolved.is_some_and(is_executable);
        entry.uid = get_uid(&self.lstat);
        entry.gid = get_gid(&self.lstat);
        entry.size = self.lstat.len();
        entry.timestamps = timestamps(&self.lstat);
        entry.inode = resolved.map(inode_info).unwrap_or_default();
        entry.link_inode = inode_info(&self.lstat);
        entry.link_target = self.link_target();
        entry.orphan = self.is_orphan();
        if self.is_unreadable_link() {
            entry.error = Some(EntryError::UnreadableLink);
        }
        entry
    }
}

/// Result of listing a directory that could be opened.
#[derive(Debug)]
pub enum DirListing {
    /// Nothing visible in the directory.
    Empty,
    /// Visible entries in `readdir` order.
    Entries(Vec<RawEntry>),
}

/// Lists the immediate entries of one directory.
///
/// `.` and `..`, dot-files (unless hidden entries are shown), the reserved
/// renderer file and anything the ignore predicate rejects never make it
/// into the listing.
pub struct DirectoryReader<'a> {
    config: &'a TreeConfig,
    ignore: Option<&'a dyn IgnoreFilter>,
}

impl<'a> DirectoryReader<'a> {
    /// Create a reader for the given settings.
    pub fn new(config: &'a TreeConfig, ignore: Option<&'a dyn IgnoreFilter>) -> Self {
        Self { config, ignore }
    }

    /// List `dir`. Failing to open the directory is an error; entries that
    /// vanish or cannot be stat'ed while listing are skipped.
    pub fn read(&self, dir: &Path) -> io::Result<DirListing> {
        let mut entries = Vec::new();

        for dirent in fs::read_dir(dir)? {
            let dirent = match dirent {
                Ok(d) => d,
                Err(err) => {
                    trace!(dir = %dir.display(), error = %err, "Skipping unreadable entry");
                    continue;
                }
            };

            let name = dirent.file_name().to_string_lossy().into_owned();
            if name == "." || name == ".." {
                continue;
            }
            if self.config.should_skip_hidden(&name) || self.config.is_reserved(&name) {
                continue;
            }

            let raw = match RawEntry::stat(name, dirent.path()) {
                Ok(raw) => raw,
                Err(err) => {
                    trace!(path = %dirent.path().display(), error = %err, "Skipping entry without metadata");
                    continue;
                }
            };

            if let Some(ignore) = self.ignore {
                if ignore.should_ignore(&raw.path, raw.is_dir()) {
                    trace!(path = %raw.path.display(), "Ignored");
                    continue;
                }
            }

            entries.push(raw);
        }

        if entries.is_empty() {
            Ok(DirListing::Empty)
        } else {
            Ok(DirListing::Entries(entries))
        }
    }
}

fn kind_of(metadata: &Metadata) -> EntryKind {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        return EntryKind::Symlink;
    }
    if file_type.is_dir() {
        return EntryKind::Directory;
    }
    if file_type.is_file() {
        return EntryKind::File;
    }
    special_kind(&file_type)
}

#[cfg(unix)]
fn special_kind(file_type: &fs::FileType) -> EntryKind {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_fifo() {
        EntryKind::Fifo
    } else if file_type.is_socket() {
        EntryKind::Socket
    } else if file_type.is_block_device() {
        EntryKind::BlockDevice
    } else if file_type.is_char_device() {
        EntryKind::CharDevice
    } else {
        EntryKind::Other
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: &fs::FileType) -> EntryKind {
    EntryKind::Other
}

fn inode_info(metadata: &Metadata) -> InodeInfo {
    InodeInfo::new(get_ino(metadata), get_dev(metadata))
}

fn timestamps(metadata: &Metadata) -> Timestamps {
    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    Timestamps::new(
        modified,
        metadata.accessed().unwrap_or(modified),
        get_ctime(metadata).unwrap_or(modified),
    )
}

/// Check if any execute bit is set (Unix).
#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    metadata.mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    false
}

// Cross-platform metadata helpers

#[cfg(unix)]
fn get_mode(metadata: &Metadata) -> u32 {
    metadata.mode()
}

#[cfg(not(unix))]
fn get_mode(metadata: &Metadata) -> u32 {
    if metadata.is_dir() { 0o040755 } else { 0o100644 }
}

#[cfg(unix)]
fn get_uid(metadata: &Metadata) -> u32 {
    metadata.uid()
}

#[cfg(not(unix))]
fn get_uid(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn get_gid(metadata: &Metadata) -> u32 {
    metadata.gid()
}

#[cfg(not(unix))]
fn get_gid(_metadata: &Metadata) -> u32 {
    0
}

/// Get the device ID from metadata.
#[cfg(unix)]
fn get_dev(metadata: &Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &Metadata) -> u64 {
    0
}

/// Get the inode number from metadata.
#[cfg(unix)]
fn get_ino(metadata: &Metadata) -> u64 {
    metadata.ino()
}

#[cfg(not(unix))]
fn get_ino(_metadata: &Metadata) -> u64 {
    0
}

/// Status change time; only Unix has one.
#[cfg(unix)]
fn get_ctime(metadata: &Metadata) -> Option<SystemTime> {
    let secs = u64::try_from(metadata.ctime()).ok()?;
    let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
    UNIX_EPOCH.checked_add(std::time::Duration::new(secs, nanos))
}

#[cfg(not(unix))]
fn get_ctime(_metadata: &Metadata) -> Option<SystemTime> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(listing: DirListing) -> Vec<String> {
        let mut names = match listing {
            DirListing::Empty => Vec::new(),
            DirListing::Entries(entries) => entries.into_iter().map(|e| e.name).collect(),
        };
        names.sort();
        names
    }

    #[test]
    fn test_hidden_and_reserved_are_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("visible"), "x").unwrap();
        fs::write(temp.path().join(".hidden"), "x").unwrap();
        fs::write(temp.path().join("00Tree.html"), "x").unwrap();

        let config = TreeConfig::builder()
            .reserved_name(Some("00Tree.html".to_string()))
            .build()
            .unwrap();
        let listing = DirectoryReader::new(&config, None).read(temp.path()).unwrap();
        assert_eq!(names(listing), ["visible"]);

        let config = TreeConfig::builder().show_hidden(true).build().unwrap();
        let listing = DirectoryReader::new(&config, None).read(temp.path()).unwrap();
        assert_eq!(names(listing), [".hidden", "00Tree.html", "visible"]);
    }

    #[test]
    fn test_empty_is_distinct_from_open_failure() {
        let temp = TempDir::new().unwrap();
        let config = TreeConfig::default();
        let reader = DirectoryReader::new(&config, None);

        assert!(matches!(reader.read(temp.path()), Ok(DirListing::Empty)));
        assert!(reader.read(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_ignore_predicate_drops_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("target")).unwrap();
        fs::write(temp.path().join("target.txt"), "x").unwrap();

        let config = TreeConfig::default();
        let ignore = |path: &Path, is_dir: bool| is_dir && path.ends_with("target");
        let listing = DirectoryReader::new(&config, Some(&ignore))
            .read(temp.path())
            .unwrap();
        assert_eq!(names(listing), ["target.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_metadata() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("dir")).unwrap();
        std::os::unix::fs::symlink("dir", temp.path().join("to_dir")).unwrap();
        std::os::unix::fs::symlink("nowhere", temp.path().join("orphan")).unwrap();

        let to_dir = RawEntry::stat("to_dir", temp.path().join("to_dir")).unwrap();
        assert!(to_dir.is_dir());
        assert!(!to_dir.is_real_dir());
        assert!(!to_dir.is_orphan());

        let entry = to_dir.into_entry();
        assert_eq!(entry.kind, EntryKind::Symlink);
        assert!(entry.is_dir());
        assert_eq!(entry.link_target.as_deref(), Some("dir"));
        assert_ne!(entry.inode, entry.link_inode);

        let orphan = RawEntry::stat("orphan", temp.path().join("orphan")).unwrap();
        assert!(orphan.is_orphan());
        let entry = orphan.into_entry();
        assert!(entry.orphan);
        assert!(!entry.is_dir());
        assert!(!entry.has_error());
    }

    #[test]
    fn test_file_entry_fields() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ten"), "0123456789").unwrap();

        let entry = RawEntry::stat("ten", temp.path().join("ten"))
            .unwrap()
            .into_entry();
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size, 10);
        assert_eq!(entry.inode, entry.link_inode);
        assert!(entry.link_target.is_none());
    }
}
