//! Sibling ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::node::Entry;

/// Base comparison strategy for siblings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Name, by Unicode scalar value.
    #[default]
    Name,
    /// Name, with digit runs compared as numbers.
    Version,
    /// Size, largest first; ties broken by name.
    Size,
    /// Modification time, oldest first; ties broken by name.
    #[strum(serialize = "mtime")]
    #[serde(rename = "mtime")]
    Modified,
    /// Status change time, oldest first; ties broken by name.
    #[strum(serialize = "ctime")]
    #[serde(rename = "ctime")]
    Changed,
    /// Directory order as returned by the reader.
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    Unordered,
}

impl SortKey {
    /// Compare two siblings under this key, ignoring `reverse`.
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Version => version_cmp(&a.name, &b.name),
            SortKey::Size => b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)),
            SortKey::Modified => a
                .timestamps
                .modified
                .cmp(&b.timestamps.modified)
                .then_with(|| a.name.cmp(&b.name)),
            SortKey::Changed => a
                .timestamps
                .changed
                .cmp(&b.timestamps.changed)
                .then_with(|| a.name.cmp(&b.name)),
            SortKey::Unordered => Ordering::Equal,
        }
    }
}

/// Type-based ordering layered above the base key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MetaSort {
    DirsFirst,
    FilesFirst,
}

impl MetaSort {
    /// Order of two entries of different type; `a_is_dir` is the left side.
    fn order(&self, a_is_dir: bool) -> Ordering {
        match (self, a_is_dir) {
            (MetaSort::DirsFirst, true) | (MetaSort::FilesFirst, false) => Ordering::Less,
            _ => Ordering::Greater,
        }
    }
}

/// A complete sibling comparator: optional meta-sort, base key, reverse.
///
/// `reverse` flips the base key only; directories stay ahead of files (or
/// behind them) regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sorter {
    pub key: SortKey,
    pub reverse: bool,
    pub meta: Option<MetaSort>,
}

impl Sorter {
    /// Create a sorter for `key`, ascending, without meta-sort.
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            reverse: false,
            meta: None,
        }
    }

    /// Set the reverse toggle.
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Set the meta-sort layer.
    pub fn with_meta(mut self, meta: Option<MetaSort>) -> Self {
        self.meta = meta;
        self
    }

    /// True when sorting would leave every sibling list untouched.
    pub fn is_noop(&self) -> bool {
        self.key == SortKey::Unordered && self.meta.is_none()
    }

    /// Compare two siblings.
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        if let Some(meta) = self.meta {
            if a.is_dir != b.is_dir {
                return meta.order(a.is_dir);
            }
        }
        let ord = self.key.compare(a, b);
        if self.reverse { ord.reverse() } else { ord }
    }

    /// Stable-sort one sibling list.
    pub fn sort(&self, entries: &mut [Entry]) {
        if self.is_noop() {
            return;
        }
        entries.sort_by(|a, b| self.compare(a, b));
    }

    /// Sort every sibling list under `root`, top-down.
    pub fn sort_tree(&self, root: &mut Entry) {
        if self.is_noop() {
            return;
        }
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            self.sort(&mut node.children);
            stack.extend(node.children.iter_mut());
        }
    }
}

/// Compare names treating each run of ASCII digits as a number.
///
/// Equal numbers with different zero padding order the shorter run first.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (run_a, next_i) = digit_run(a, i);
            let (run_b, next_j) = digit_run(b, j);
            let ord = compare_numeric(run_a, run_b);
            if ord != Ordering::Equal {
                return ord;
            }
            i = next_i;
            j = next_j;
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run(s: &[u8], start: usize) -> (&[u8], usize) {
    let end = s[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(s.len(), |n| start + n);
    (&s[start..end], end)
}

fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let (sig_a, sig_b) = (&a[trim(a)..], &b[trim(b)..]);

    sig_a
        .len()
        .cmp(&sig_b.len())
        .then_with(|| sig_a.cmp(sig_b))
        .then_with(|| a.len().cmp(&b.len()))
}
