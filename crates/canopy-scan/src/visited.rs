//! Cycle detection for followed directory symlinks.

use std::collections::HashSet;

use canopy_core::InodeInfo;

/// Tracks the (device, inode) identities of the directories currently open
/// on the descent chain.
///
/// An identity is recorded when a directory is entered and released once its
/// subtree is finished, so sibling links to the same target are each listed
/// in full while a link back to an ancestor is caught.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<InodeInfo>,
}

impl VisitedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Record an identity. Returns `true` if it was already present, in
    /// which case the set is unchanged.
    pub fn record(&mut self, info: InodeInfo) -> bool {
        !self.seen.insert(info)
    }

    /// Forget an identity once the directory it belongs to is closed.
    pub fn release(&mut self, info: &InodeInfo) {
        self.seen.remove(info);
    }
}
