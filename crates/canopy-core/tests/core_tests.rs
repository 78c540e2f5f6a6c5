use canopy_core::{
    Entry, EntryError, EntryKind, FileTree, InodeInfo, MatchResult, MetaSort, PatternSet,
    Renderer, ScanError, SortKey, Sorter, Timestamps, TreeConfig, TreeStats, match_pattern,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

fn file(name: &str, size: u64) -> Entry {
    Entry::new_file(name, size, Timestamps::default())
}

fn dir(name: &str, children: Vec<Entry>) -> Entry {
    let mut entry = Entry::new_directory(name, Timestamps::default());
    entry.children = children;
    entry
}

#[test]
fn test_inode_info() {
    let inode1 = InodeInfo::new(12345, 67890);
    assert_eq!(inode1.inode, 12345);
    assert_eq!(inode1.device, 67890);

    let inode2 = InodeInfo::new(12345, 67890);
    assert_eq!(inode1, inode2);
    assert_ne!(inode1, InodeInfo::new(12345, 1));
}

#[test]
fn test_timestamps() {
    let now = SystemTime::now();
    let timestamps = Timestamps::with_modified(now);

    assert_eq!(timestamps.modified, now);
    assert_eq!(timestamps.accessed, now);
    assert_eq!(timestamps.changed, now);

    let accessed = now - Duration::from_secs(3600);
    let changed = now - Duration::from_secs(7200);
    let full = Timestamps::new(now, accessed, changed);
    assert_eq!(full.accessed, accessed);
    assert_eq!(full.changed, changed);
}

#[test]
fn test_entry_kinds() {
    assert!(EntryKind::Directory.is_dir());
    assert!(EntryKind::File.is_file());
    assert!(EntryKind::Symlink.is_symlink());
    assert!(!EntryKind::Fifo.is_file());

    let socket = Entry::new("sock", EntryKind::Socket);
    assert!(!socket.is_dir());
    assert!(socket.children.is_empty());
}

#[test]
fn test_pattern_truth_table() {
    assert_eq!(match_pattern("foo.txt", "*.txt", false, false), MatchResult::Match);
    assert_eq!(match_pattern("a/b/c", "a/**/c", true, false), MatchResult::Match);
    assert_eq!(match_pattern("abc", "a|b", false, false), MatchResult::NoMatch);
    assert_eq!(match_pattern("a", "a|b", false, false), MatchResult::Match);
    assert_eq!(match_pattern("x", "[a-", false, false), MatchResult::SyntaxError);
    assert_eq!(match_pattern("README", "readme", false, true), MatchResult::Match);
    assert_eq!(match_pattern("README", "readme", false, false), MatchResult::NoMatch);
}

#[test]
fn test_pattern_grammar() {
    assert_eq!(match_pattern("a/c", "a/**/c", true, false), MatchResult::Match);
    assert_eq!(match_pattern("src", "src/", true, false), MatchResult::Match);
    assert_eq!(match_pattern("src", "src/", false, false), MatchResult::NoMatch);
    assert_eq!(match_pattern("b1", "[a-c]x|?1", false, false), MatchResult::Match);
    assert_eq!(match_pattern("x", "[^abc]", false, false), MatchResult::Match);
    assert_eq!(match_pattern("*", "\\*", false, false), MatchResult::Match);
    assert_eq!(match_pattern("a", "|b", false, false), MatchResult::SyntaxError);
}

#[test]
fn test_pattern_set_reports_offending_pattern() {
    let set = PatternSet::new(["*.rs", "*.toml"], false).unwrap();
    assert!(set.matches("lib.rs", false));
    assert!(set.matches("Cargo.toml", false));
    assert!(!set.matches("README.md", false));

    match PatternSet::new(["ok", "bad|"], false) {
        Err(ScanError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "bad|"),
        other => panic!("unexpected result: {:?}", other.map(|s| s.is_empty())),
    }
}

#[test]
fn test_sorter_is_transitive_for_every_key() {
    let mut entries = vec![
        file("b10", 5),
        file("b2", 5),
        dir("a", vec![]),
        file("c", 50),
        file("b", 1),
    ];
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.timestamps =
            Timestamps::with_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(i as u64 % 3));
    }

    let keys = [
        SortKey::Name,
        SortKey::Version,
        SortKey::Size,
        SortKey::Modified,
        SortKey::Changed,
    ];
    for key in keys {
        for meta in [None, Some(MetaSort::DirsFirst), Some(MetaSort::FilesFirst)] {
            for reverse in [false, true] {
                let sorter = Sorter::new(key).with_reverse(reverse).with_meta(meta);
                for a in &entries {
                    for b in &entries {
                        for c in &entries {
                            if sorter.compare(a, b).is_le() && sorter.compare(b, c).is_le() {
                                assert!(
                                    sorter.compare(a, c).is_le(),
                                    "{key:?} {meta:?} {reverse}: {} {} {}",
                                    a.name,
                                    b.name,
                                    c.name
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_reverse_keeps_membership() {
    let mut forward = vec![file("b", 1), file("a", 2), file("c", 3)];
    let mut backward = forward.clone();

    Sorter::new(SortKey::Name).sort(&mut forward);
    Sorter::new(SortKey::Name).with_reverse(true).sort(&mut backward);

    let forward: Vec<_> = forward.iter().map(|e| e.name.as_str()).collect();
    let mut backward: Vec<_> = backward.iter().map(|e| e.name.as_str()).collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn test_unordered_keeps_insertion_order() {
    let mut entries = vec![file("z", 1), dir("m", vec![]), file("a", 1)];
    Sorter::new(SortKey::Unordered).sort(&mut entries);
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["z", "m", "a"]);
}

#[test]
fn test_sort_key_parsing() {
    assert_eq!("name".parse::<SortKey>().unwrap(), SortKey::Name);
    assert_eq!("VERSION".parse::<SortKey>().unwrap(), SortKey::Version);
    assert_eq!("mtime".parse::<SortKey>().unwrap(), SortKey::Modified);
    assert_eq!("ctime".parse::<SortKey>().unwrap(), SortKey::Changed);
    assert_eq!("none".parse::<SortKey>().unwrap(), SortKey::Unordered);
    assert!("colour".parse::<SortKey>().is_err());
}

#[test]
fn test_config_serde_defaults() {
    let config: TreeConfig = serde_json::from_str(r#"{"prune": true, "sort": "size"}"#).unwrap();
    assert!(config.prune);
    assert_eq!(config.sort, SortKey::Size);
    assert!(!config.follow_links);
    assert!(config.prunes());

    let dirs_only = TreeConfig {
        dirs_only: true,
        ..config
    };
    assert!(!dirs_only.prunes());
}

#[test]
fn test_file_tree_json_export() {
    let mut root = dir("root", vec![file("a", 10), dir("sub", vec![file("b", 20)])]);
    root.children[1].set_error(EntryError::LimitExceeded { count: 9 });

    let tree = FileTree::new(
        root,
        PathBuf::from("root"),
        TreeConfig::default(),
        Duration::from_millis(3),
        Vec::new(),
    );
    assert_eq!(
        tree.stats,
        TreeStats {
            directories: 1,
            files: 1,
            total_size: 10,
            max_depth: 1,
        }
    );

    let json = serde_json::to_value(&tree.root).unwrap();
    assert_eq!(json["name"], "root");
    assert_eq!(json["children"][0]["size"], 10);
    assert_eq!(json["children"][1]["error"]["kind"], "limit_exceeded");
    assert_eq!(json["children"][1]["error"]["count"], 9);
    assert!(json["children"][0].get("children").is_none());
}

#[test]
fn test_entry_error_messages() {
    assert_eq!(
        EntryError::LimitExceeded { count: 12 }.to_string(),
        "12 entries exceeds filelimit, not opening dir"
    );
    assert_eq!(EntryError::Recursive.to_string(), "recursive, not followed");
}

#[test]
fn test_render_contract() {
    struct Lines(Vec<String>);

    impl Renderer for Lines {
        fn visit(&mut self, entry: &Entry, depth: usize, last: &[bool]) -> io::Result<()> {
            assert_eq!(last.len(), depth);
            let prefix: String = last.iter().map(|&l| if l { 'L' } else { 'T' }).collect();
            self.0.push(format!("{prefix}{}", entry.name));
            Ok(())
        }
    }

    let root = dir(
        ".",
        vec![dir("a", vec![file("x", 1), file("y", 1)]), file("b", 1)],
    );
    let tree = FileTree::new(
        root,
        PathBuf::from("."),
        TreeConfig::default(),
        Duration::ZERO,
        Vec::new(),
    );

    let mut lines = Lines(Vec::new());
    tree.render(&mut lines).unwrap();
    assert_eq!(lines.0, [".", "Ta", "TTx", "TLy", "Lb"]);
}
