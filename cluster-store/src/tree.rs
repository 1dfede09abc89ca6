//! The root-only tree-position service (spec §4.6): a fixed-capacity
//! level-order binary tree array, handing out absolute Registry paths to
//! joining nodes. Grounded in
//! `original_source/ex03/client/src/cluster/cluster_structure.py`
//! (`__binary_tree`, `__next_idx`, `find_absolute_parent_path`).
//!
//! The Python original's path list starts with a parent *index* and only
//! becomes well-formed because index 0 is later overwritten by the empty
//! string. This implementation instead pushes node *names* throughout and
//! derives the leading `/` explicitly (SPEC_FULL §9 open question).

use parking_lot::Mutex;

struct TreeInner {
    slots: Vec<Option<String>>,
    next_idx: usize,
}

impl TreeInner {
    fn parent_idx(idx: usize) -> usize {
        (idx - 1) / 2
    }

    /// Path from `idx`'s own name up through every ancestor to the root,
    /// joined `/`-separated with a leading slash.
    fn path_of(&self, idx: usize) -> String {
        let mut names = vec![self.slots[idx].clone().expect("slot must be occupied")];
        let mut cur = idx;
        while cur != 0 {
            cur = Self::parent_idx(cur);
            names.push(self.slots[cur].clone().expect("ancestor slot must be occupied"));
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }
}

/// Holds the binary-tree array. The root itself is registered
/// synchronously at construction, before the service accepts any lookups
/// (spec §4.6, "The root itself is registered synchronously before the
/// service starts accepting requests").
pub struct TreePositionService {
    inner: Mutex<TreeInner>,
}

impl TreePositionService {
    pub fn new(capacity: usize, root_name: impl Into<String>) -> Self {
        assert!(capacity >= 1, "tree must have room for at least the root");
        let mut slots = vec![None; capacity];
        slots[0] = Some(root_name.into());
        Self {
            inner: Mutex::new(TreeInner { slots, next_idx: 1 }),
        }
    }

    /// Looks up (inserting if new) `name`'s position and returns its
    /// absolute Registry path. Calling twice with the same name returns
    /// identical paths (spec §4.6 contract).
    pub fn assign_path(&self, name: &str) -> String {
        let mut inner = self.inner.lock();
        let idx = match inner.slots.iter().position(|s| s.as_deref() == Some(name)) {
            Some(idx) => idx,
            None => {
                let idx = inner.next_idx;
                assert!(idx < inner.slots.len(), "tree is at capacity");
                inner.slots[idx] = Some(name.to_string());
                inner.next_idx += 1;
                idx
            }
        };
        inner.path_of(idx)
    }

    /// A shallow copy of the current tree (spec §6 "root-only tree
    /// surface", `GET /nodes/structure`).
    pub fn structure(&self) -> Vec<Option<String>> {
        self.inner.lock().slots.clone()
    }
}
