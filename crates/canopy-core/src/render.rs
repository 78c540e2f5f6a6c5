//! Call contract between a finished tree and whatever prints it.

use std::io;

use crate::node::Entry;

/// Consumer of a finished tree. Receives entries read-only, in depth-first
/// pre-order.
pub trait Renderer {
    /// Called once before the first entry.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Called for every entry. `last[i]` tells whether the ancestor at level
    /// `i + 1` (or the entry itself, for the final element) is the last of
    /// its siblings; the slice is empty for the root.
    fn visit(&mut self, entry: &Entry, depth: usize, last: &[bool]) -> io::Result<()>;

    /// Called once after the last entry.
    fn end(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Drive `renderer` over the tree rooted at `root`.
pub fn render<R: Renderer + ?Sized>(root: &Entry, renderer: &mut R) -> io::Result<()> {
    renderer.begin()?;

    let mut last: Vec<bool> = Vec::new();
    let mut stack = vec![(root, 0usize, true)];
    while let Some((entry, depth, is_last)) = stack.pop() {
        last.truncate(depth.saturating_sub(1));
        if depth > 0 {
            last.push(is_last);
        }
        renderer.visit(entry, depth, &last)?;

        let count = entry.children.len();
        for (i, child) in entry.children.iter().enumerate().rev() {
            stack.push((child, depth + 1, i + 1 == count));
        }
    }

    renderer.end()
}
