use alloc::vec::Vec;

use crate::fenwick::Fenwick;
use crate::key::{KeyCacheKey, KeyMap, KeySet};

/// The materialized children of one node (or of the synthetic root).
#[derive(Clone, Debug)]
struct Branch<K> {
    ids: Vec<K>,
    rows: Fenwick, // slot i = subtree size of ids[i]
}

impl<K> Branch<K> {
    fn empty() -> Self {
        Self {
            ids: Vec::new(),
            rows: Fenwick::from_rows(core::iter::empty()),
        }
    }
}

#[derive(Clone, Debug)]
struct Node<T, K> {
    item: T,
    parent: Option<K>,
    /// Position inside the parent's branch.
    slot: usize,
    children: Option<Branch<K>>,
    /// Visible rows contributed by this node: 1, plus its children's rows while expanded.
    size: usize,
}

/// Identity-keyed tree of every node observed so far.
///
/// Expansion flags live in their own set so they survive structural invalidation and can be
/// recorded for items that have not been discovered yet. An expanded node whose children are
/// not materialized is queued in `pending` and counts as a single row until the mapper settles
/// it.
#[derive(Clone, Debug)]
pub(crate) struct NodeIndex<T, K> {
    nodes: KeyMap<K, Node<T, K>>,
    root: Option<Branch<K>>,
    expanded: KeySet<K>,
    pending: Vec<K>,
}

impl<T, K: KeyCacheKey> NodeIndex<T, K> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: KeyMap::new(),
            root: None,
            expanded: KeySet::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn is_root_materialized(&self) -> bool {
        self.root.is_some()
    }

    pub(crate) fn contains(&self, id: &K) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn cached_len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn item(&self, id: &K) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.item)
    }

    pub(crate) fn is_expanded(&self, id: &K) -> bool {
        self.expanded.contains(id)
    }

    pub(crate) fn expanded_len(&self) -> usize {
        self.expanded.len()
    }

    pub(crate) fn is_materialized(&self, id: &K) -> bool {
        self.nodes.get(id).is_some_and(|n| n.children.is_some())
    }

    /// Subtree size of `id`, or the total visible row count for the root.
    pub(crate) fn size(&self, id: Option<&K>) -> usize {
        match id {
            None => self.root.as_ref().map_or(0, |b| b.rows.total() as usize),
            Some(id) => self.nodes.get(id).map_or(0, |n| n.size),
        }
    }

    /// Whether `id` is cached and every ancestor is expanded.
    pub(crate) fn is_visible(&self, id: &K) -> bool {
        let Some(mut node) = self.nodes.get(id) else {
            return false;
        };
        while let Some(parent) = &node.parent {
            if !self.expanded.contains(parent) {
                return false;
            }
            let Some(next) = self.nodes.get(parent) else {
                return false;
            };
            node = next;
        }
        true
    }

    /// `None` if `id` is unknown, `Some(None)` if its parent is the root.
    pub(crate) fn parent_of(&self, id: &K) -> Option<Option<&K>> {
        self.nodes.get(id).map(|n| n.parent.as_ref())
    }

    pub(crate) fn depth(&self, id: &K) -> Option<usize> {
        let mut node = self.nodes.get(id)?;
        let mut depth = 0usize;
        while let Some(parent) = &node.parent {
            node = self.nodes.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    pub(crate) fn children(&self, parent: Option<&K>) -> Option<&[K]> {
        self.branch(parent).map(|b| b.ids.as_slice())
    }

    fn branch(&self, parent: Option<&K>) -> Option<&Branch<K>> {
        match parent {
            None => self.root.as_ref(),
            Some(id) => self.nodes.get(id)?.children.as_ref(),
        }
    }

    /// Records the flag without touching structure. Used for items that are not in the index
    /// yet; they are materialized once discovered.
    ///
    /// Such a flag is kept until the item is collapsed or all data is destroyed, even if the
    /// item never shows up, so the set grows with every distinct undiscovered id expanded.
    pub(crate) fn mark_expanded(&mut self, id: K) {
        self.expanded.insert(id);
    }

    pub(crate) fn unmark_expanded(&mut self, id: &K) {
        self.expanded.remove(id);
    }

    pub(crate) fn push_pending(&mut self, id: K) {
        self.pending.push(id);
    }

    pub(crate) fn pop_pending(&mut self) -> Option<K> {
        self.pending.pop()
    }

    /// Sets the flag of a known node and returns the signed change in visible rows.
    ///
    /// Collapsing keeps the cached children so a later expand is instant.
    pub(crate) fn set_expanded(&mut self, id: &K, expanded: bool) -> isize {
        if expanded {
            self.expanded.insert(id.clone());
        } else {
            self.expanded.remove(id);
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return 0;
        };
        let new = match (expanded, &node.children) {
            (true, Some(branch)) => 1 + branch.rows.total() as usize,
            (true, None) => {
                self.pending.push(id.clone());
                1
            }
            (false, _) => 1,
        };
        let delta = new as isize - node.size as isize;
        node.size = new;
        self.propagate(id, delta);
        delta
    }

    /// Pushes a size change of `id` into every ancestor that currently counts it.
    fn propagate(&mut self, id: &K, delta: isize) {
        if delta == 0 {
            return;
        }
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let mut parent = node.parent.clone();
        let mut slot = node.slot;
        loop {
            let Some(p) = parent else {
                if let Some(root) = self.root.as_mut() {
                    root.rows.add(slot, delta as i64);
                }
                return;
            };
            let expanded = self.expanded.contains(&p);
            let Some(pnode) = self.nodes.get_mut(&p) else {
                return;
            };
            let Some(branch) = pnode.children.as_mut() else {
                return;
            };
            branch.rows.add(slot, delta as i64);
            // A collapsed ancestor still tracks its children's rows for re-expansion, but its
            // own size stays 1.
            if !expanded {
                return;
            }
            pnode.size = 1 + branch.rows.total() as usize;
            slot = pnode.slot;
            parent = pnode.parent.clone();
        }
    }

    /// Commits a freshly fetched, non-empty child list for `parent`.
    ///
    /// Previously cached children that are no longer reported are evicted with their
    /// subtrees; children that were cached under another parent are moved here, keeping
    /// their own cached subtrees. Duplicate ids and ids that would create a cycle are dropped.
    pub(crate) fn attach(&mut self, parent: Option<&K>, children: Vec<(K, T)>) {
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return;
            }
        }

        let mut ancestors = KeySet::new();
        let mut cur = parent.cloned();
        while let Some(id) = cur {
            cur = self.nodes.get(&id).and_then(|n| n.parent.clone());
            ancestors.insert(id);
        }

        let mut seen = KeySet::new();
        let mut fresh = Vec::with_capacity(children.len());
        for (id, item) in children {
            if ancestors.contains(&id) {
                hlog!(warn, "attach: dropping child that is an ancestor of its parent");
                continue;
            }
            if !seen.insert(id.clone()) {
                hlog!(warn, "attach: dropping duplicate child id");
                continue;
            }
            fresh.push((id, item));
        }

        // Move reused nodes out first: one of them may be cached below a stale child.
        let mut moved = Vec::new();
        for (id, _) in &fresh {
            if let Some(node) = self.nodes.get(id) {
                if node.parent.as_ref() != parent {
                    moved.push(id.clone());
                }
            }
        }
        for id in &moved {
            hlog!(debug, "attach: moving cached node to a new parent");
            self.detach(id);
        }

        if let Some(old) = self.branch(parent).map(|b| b.ids.clone()) {
            for id in old.iter().filter(|id| !seen.contains(*id)) {
                self.remove_subtree(id);
            }
        }

        let mut ids = Vec::with_capacity(fresh.len());
        for (id, item) in fresh {
            match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.item = item;
                    node.parent = parent.cloned();
                }
                None => {
                    if self.expanded.contains(&id) {
                        self.pending.push(id.clone());
                    }
                    self.nodes.insert(
                        id.clone(),
                        Node {
                            item,
                            parent: parent.cloned(),
                            slot: 0,
                            children: None,
                            size: 1,
                        },
                    );
                }
            }
            ids.push(id);
        }
        hlog!(trace, children = ids.len(), "attach");
        self.install_branch(parent, ids);
    }

    /// Removes `id` from its parent's branch, leaving the node and its subtree cached.
    fn detach(&mut self, id: &K) {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent.clone()) else {
            return;
        };
        let Some(ids) = self.branch(parent.as_ref()).map(|b| {
            b.ids
                .iter()
                .filter(|other| *other != id)
                .cloned()
                .collect::<Vec<_>>()
        }) else {
            return;
        };
        self.install_branch(parent.as_ref(), ids);
    }

    /// Replaces the branch of `parent`, re-slotting children and rebuilding row sums from the
    /// children's current sizes.
    fn install_branch(&mut self, parent: Option<&K>, ids: Vec<K>) {
        let mut rows = Vec::with_capacity(ids.len());
        for (slot, id) in ids.iter().enumerate() {
            let size = match self.nodes.get_mut(id) {
                Some(node) => {
                    node.slot = slot;
                    node.size
                }
                None => 1,
            };
            rows.push(size as u64);
        }
        let branch = Branch {
            rows: Fenwick::from_rows(rows.into_iter()),
            ids,
        };

        let Some(p) = parent else {
            self.root = Some(branch);
            return;
        };
        let expanded = self.expanded.contains(p);
        let Some(node) = self.nodes.get_mut(p) else {
            return;
        };
        let new = if expanded {
            1 + branch.rows.total() as usize
        } else {
            1
        };
        node.children = Some(branch);
        let delta = new as isize - node.size as isize;
        node.size = new;
        self.propagate(p, delta);
    }

    /// Drops the cached children of `parent` and every cached descendant.
    ///
    /// Used when the provider reports that `parent` has no children any more: the node stays
    /// (as a collapsed leaf) but nothing stale remains below it. For the root, the tree
    /// becomes empty.
    pub(crate) fn evict_children(&mut self, parent: Option<&K>) {
        let ids = match parent {
            None => self.root.take().map(|b| b.ids),
            Some(p) => self
                .nodes
                .get_mut(p)
                .and_then(|n| n.children.take())
                .map(|b| b.ids),
        }
        .unwrap_or_default();
        hlog!(debug, evicted = ids.len(), "evict_children");
        for id in &ids {
            self.remove_subtree(id);
        }

        let Some(p) = parent else {
            self.root = Some(Branch::empty());
            return;
        };
        self.expanded.remove(p);
        let Some(node) = self.nodes.get_mut(p) else {
            return;
        };
        let delta = 1 - node.size as isize;
        node.size = 1;
        self.propagate(p, delta);
    }

    /// Forgets `id` and everything cached below it, including expansion flags.
    fn remove_subtree(&mut self, id: &K) {
        let mut stack = alloc::vec![id.clone()];
        while let Some(id) = stack.pop() {
            self.expanded.remove(&id);
            if let Some(node) = self.nodes.remove(&id) {
                if let Some(branch) = node.children {
                    stack.extend(branch.ids);
                }
            }
        }
    }

    /// Drops all cached structure but keeps expansion flags.
    pub(crate) fn invalidate(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.pending.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.invalidate();
        self.expanded.clear();
    }

    /// 0-based flattened row of `id`, or `None` if it is unknown or hidden under a collapsed
    /// ancestor.
    pub(crate) fn rank(&self, id: &K) -> Option<usize> {
        let mut cur = id;
        let mut node = self.nodes.get(cur)?;
        let mut row = 0u64;
        loop {
            let branch = self.branch(node.parent.as_ref())?;
            if branch.ids.get(node.slot) != Some(cur) {
                return None;
            }
            row = row.saturating_add(branch.rows.prefix_rows(node.slot));
            let Some(parent) = node.parent.as_ref() else {
                return usize::try_from(row).ok();
            };
            if !self.expanded.contains(parent) {
                return None;
            }
            row = row.saturating_add(1);
            cur = parent;
            node = self.nodes.get(cur)?;
        }
    }

    /// Identity at flattened row `row`.
    pub(crate) fn locate(&self, row: usize) -> Option<&K> {
        self.rows_from(None, row).current_id()
    }

    /// Pre-order rows starting at `row`, over the whole tree (`base = None`) or over the
    /// descendants of `base` (the base node itself is not a row of its own subtree).
    pub(crate) fn rows_from<'a>(&'a self, base: Option<&'a K>, row: usize) -> Rows<'a, T, K> {
        let mut stack = Vec::new();
        let mut parent = base;
        let mut row = row as u64;
        while let Some(branch) = self.branch(parent) {
            if row >= branch.rows.total() {
                stack.clear();
                break;
            }
            let slot = branch.rows.slot_for_row(row);
            row -= branch.rows.prefix_rows(slot);
            stack.push((parent, slot));
            if row == 0 {
                break;
            }
            row -= 1;
            parent = Some(&branch.ids[slot]);
        }
        Rows { index: self, stack }
    }
}

#[cfg(test)]
impl<T, K: KeyCacheKey + core::fmt::Debug> NodeIndex<T, K> {
    pub(crate) fn assert_consistent(&self) {
        let Some(root) = &self.root else {
            assert!(self.nodes.is_empty());
            return;
        };
        let mut visited = 0usize;
        let mut stack: Vec<(Option<&K>, &Branch<K>)> = alloc::vec![(None, root)];
        while let Some((parent, branch)) = stack.pop() {
            assert_eq!(branch.ids.len(), branch.rows.len());
            let mut sum = 0u64;
            for (slot, id) in branch.ids.iter().enumerate() {
                let node = self.nodes.get(id).expect("branch child must be cached");
                visited += 1;
                assert_eq!(node.parent.as_ref(), parent);
                assert_eq!(node.slot, slot);
                let expected = match (&node.children, self.expanded.contains(id)) {
                    (Some(b), true) => 1 + b.rows.total() as usize,
                    _ => 1,
                };
                assert_eq!(node.size, expected);
                assert_eq!(
                    branch.rows.prefix_rows(slot + 1) - branch.rows.prefix_rows(slot),
                    node.size as u64
                );
                sum += node.size as u64;
                if let Some(children) = &node.children {
                    stack.push((Some(id), children));
                }
            }
            assert_eq!(branch.rows.total(), sum);
        }
        assert_eq!(visited, self.nodes.len(), "every cached node hangs off the root");
    }
}

/// Pre-order cursor over visible rows.
///
/// Seeking costs one descent from the base; each step afterwards is amortized O(1).
pub(crate) struct Rows<'a, T, K> {
    index: &'a NodeIndex<T, K>,
    /// `(parent, slot)` frames from the base down to the current row.
    stack: Vec<(Option<&'a K>, usize)>,
}

impl<'a, T, K: KeyCacheKey> Rows<'a, T, K> {
    pub(crate) fn current_id(&self) -> Option<&'a K> {
        let &(parent, slot) = self.stack.last()?;
        self.index.branch(parent)?.ids.get(slot)
    }
}

impl<'a, T, K: KeyCacheKey> Iterator for Rows<'a, T, K> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let index = self.index;
        let id = self.current_id()?;
        let node = index.nodes.get(id)?;

        let descend = index.expanded.contains(id)
            && node.children.as_ref().is_some_and(|b| !b.ids.is_empty());
        if descend {
            self.stack.push((Some(id), 0));
        } else {
            while let Some((parent, slot)) = self.stack.pop() {
                let len = index.branch(parent).map_or(0, |b| b.ids.len());
                if slot + 1 < len {
                    self.stack.push((parent, slot + 1));
                    break;
                }
            }
        }
        Some(&node.item)
    }
}
