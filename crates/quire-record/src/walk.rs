//! Depth-first traversal of a record graph.
//!
//! The store uses this to decide whether a file needs rewriting. Nodes are
//! deduplicated by address, so an object reachable along two paths is
//! visited once. The walk keeps an explicit stack.

use std::collections::HashSet;

/// A record as seen by the traversal.
pub trait Node {
    /// The record's type name.
    fn record_type(&self) -> &'static str;

    /// Whether the record has unsaved changes.
    fn is_dirty(&self) -> bool;

    /// Records directly reachable from this one.
    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    /// Whether this record lives in its own file rather than in its parent's.
    fn stored_separately(&self) -> bool {
        false
    }
}

/// Iterator returned by [`walk`] and [`walk_file`].
pub struct Walk<'a> {
    stack: Vec<&'a dyn Node>,
    seen: HashSet<*const ()>,
    same_file: bool,
}

/// Visit every record reachable from `root`, each once, parents first.
pub fn walk(root: &dyn Node) -> Walk<'_> {
    Walk {
        stack: vec![root],
        seen: HashSet::new(),
        same_file: false,
    }
}

/// Like [`walk`], but stops at records stored in their own files.
pub fn walk_file(root: &dyn Node) -> Walk<'_> {
    Walk {
        same_file: true,
        ..walk(root)
    }
}

/// Whether anything written to `root`'s file has unsaved changes.
pub fn file_is_dirty(root: &dyn Node) -> bool {
    walk_file(root).any(|node| node.is_dirty())
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a dyn Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            let identity = std::ptr::from_ref(node).cast::<()>();
            if !self.seen.insert(identity) {
                continue;
            }
            let same_file = self.same_file;
            self.stack.extend(
                node.children()
                    .into_iter()
                    .rev()
                    .filter(|child| !(same_file && child.stored_separately())),
            );
            return Some(node);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Leaf {
        name: &'static str,
        dirty: Cell<bool>,
        separate: bool,
    }

    impl Node for Leaf {
        fn record_type(&self) -> &'static str {
            self.name
        }

        fn is_dirty(&self) -> bool {
            self.dirty.get()
        }

        fn stored_separately(&self) -> bool {
            self.separate
        }
    }

    struct Root<'a> {
        kids: Vec<&'a Leaf>,
    }

    impl Node for Root<'_> {
        fn record_type(&self) -> &'static str {
            "root"
        }

        fn is_dirty(&self) -> bool {
            false
        }

        fn children(&self) -> Vec<&dyn Node> {
            self.kids.iter().map(|leaf| *leaf as &dyn Node).collect()
        }
    }

    fn leaf(name: &'static str, separate: bool) -> Leaf {
        Leaf {
            name,
            dirty: Cell::new(false),
            separate,
        }
    }

    #[test]
    fn shared_nodes_are_visited_once() {
        let a = leaf("a", false);
        let b = leaf("b", false);
        let root = Root {
            kids: vec![&a, &b, &a],
        };
        let order: Vec<_> = walk(&root).map(|node| node.record_type()).collect();
        assert_eq!(order, vec!["root", "a", "b"]);
    }

    #[test]
    fn file_walk_skips_separately_stored_nodes() {
        let inline = leaf("inline", false);
        let issue = leaf("issue", true);
        let root = Root {
            kids: vec![&inline, &issue],
        };
        assert_eq!(walk(&root).count(), 3);
        assert_eq!(walk_file(&root).count(), 2);

        issue.dirty.set(true);
        assert!(!file_is_dirty(&root));
        inline.dirty.set(true);
        assert!(file_is_dirty(&root));
    }
}
