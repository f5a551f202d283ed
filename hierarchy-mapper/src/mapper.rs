use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::index::NodeIndex;
use crate::key::KeySet;
use crate::options::{CollapseAllowedProvider, InMemorySorting, MapperOptions};
use crate::provider::{HierarchicalDataProvider, HierarchicalQuery};
use crate::types::{RowData, RowRange, SortOrder};

/// Presents a lazily fetched tree as a flat, range-addressable sequence of rows.
///
/// The flattened view is the pre-order traversal of the tree that descends only into expanded
/// nodes. The root (`None` wherever an item is accepted) is never a row itself and is always
/// expanded.
///
/// Children are fetched from the provider the first time a node is expanded (or the first time
/// the root is read) and cached by identity. Each cached node keeps its visible subtree size,
/// so the tree size is O(1), and row/index lookups walk one root-to-node path instead of
/// flattening the tree.
///
/// Reads take `&mut self` because they may have to fetch: after a filter or sort change the
/// structure is rebuilt from the root on the next read, re-expanding nodes whose flags were
/// kept.
pub struct HierarchyMapper<T, F, P: HierarchicalDataProvider<T, F>> {
    provider: P,
    options: MapperOptions<T, F>,
    index: NodeIndex<T, P::Id>,
}

impl<T: Clone, F, P: HierarchicalDataProvider<T, F>> HierarchyMapper<T, F, P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, MapperOptions::new())
    }

    pub fn with_options(provider: P, options: MapperOptions<T, F>) -> Self {
        hlog!(
            debug,
            back_end_sorting = options.back_end_sorting.len(),
            filtered = options.filter.is_some(),
            "HierarchyMapper::new"
        );
        Self {
            provider,
            options,
            index: NodeIndex::new(),
        }
    }

    pub fn data_provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the provider.
    ///
    /// Changing the provider's data does not touch cached children; call
    /// [`Self::refresh_all`] or [`Self::refresh_children`] afterwards.
    pub fn data_provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Replaces the provider. All cached nodes and expansion flags are dropped.
    pub fn set_data_provider(&mut self, provider: P) {
        self.provider = provider;
        self.destroy_all_data();
    }

    pub fn options(&self) -> &MapperOptions<T, F> {
        &self.options
    }

    /// Applies new options, invalidating cached children if the filter or sorting may differ.
    pub fn set_options(&mut self, options: MapperOptions<T, F>) {
        let invalidate = self.options.invalidates(&options);
        self.options = options;
        if invalidate {
            self.invalidate();
        }
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut MapperOptions<T, F>))
    where
        F: Clone,
    {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn filter(&self) -> Option<&F> {
        self.options.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Option<F>) {
        self.options.filter = filter;
        self.invalidate();
    }

    pub fn back_end_sorting(&self) -> &[SortOrder] {
        &self.options.back_end_sorting
    }

    pub fn set_back_end_sorting(&mut self, sorting: Vec<SortOrder>) {
        self.options.back_end_sorting = sorting;
        self.invalidate();
    }

    pub fn in_memory_sorting(&self) -> Option<&InMemorySorting<T>> {
        self.options.in_memory_sorting.as_ref()
    }

    pub fn set_in_memory_sorting(&mut self, sorting: Option<InMemorySorting<T>>) {
        self.options.in_memory_sorting = sorting;
        self.invalidate();
    }

    pub fn collapse_allowed_provider(&self) -> Option<&CollapseAllowedProvider<T>> {
        self.options.collapse_allowed.as_ref()
    }

    /// Replaces the collapse policy. Only row metadata is affected; nothing is refetched.
    pub fn set_collapse_allowed_provider(&mut self, policy: Option<CollapseAllowedProvider<T>>) {
        self.options.collapse_allowed = policy;
    }

    /// Number of rows in the flattened view.
    pub fn get_tree_size(&mut self) -> Result<usize, P::Error> {
        self.settle()?;
        Ok(self.index.size(None))
    }

    /// The root is always expanded; items never expanded (or unknown) are not.
    pub fn is_expanded(&self, item: Option<&T>) -> bool {
        match item {
            None => true,
            Some(item) => self.index.is_expanded(&self.provider.id(item)),
        }
    }

    pub fn has_children(&self, item: &T) -> Result<bool, P::Error> {
        self.provider.has_children(item).map_err(Error::Provider)
    }

    /// Number of items currently flagged as expanded, including ones not in the index.
    pub fn expanded_count(&self) -> usize {
        self.index.expanded_len()
    }

    /// Number of nodes currently cached in the index.
    pub fn cached_node_count(&self) -> usize {
        self.index.cached_len()
    }

    /// Expands `item` and returns the rows it inserted after `position` (the item's own row).
    ///
    /// Returns an empty range when nothing changed: the root, an item that is already
    /// expanded, or an item the provider reports as childless (any stale children cached for
    /// it are evicted). Also empty when `position` is `None`.
    ///
    /// An item that has not been discovered yet only has its flag recorded; it opens when it
    /// first shows up in a fetched child list.
    pub fn do_expand(
        &mut self,
        item: Option<&T>,
        position: Option<usize>,
    ) -> Result<RowRange, P::Error> {
        let Some(item) = item else {
            return Ok(RowRange::EMPTY);
        };
        let id = self.provider.id(item);
        if self.index.is_expanded(&id) {
            return Ok(RowRange::EMPTY);
        }
        self.settle()?;

        if !self.has_children(item)? {
            if self.index.is_materialized(&id) {
                self.index.evict_children(Some(&id));
            }
            return Ok(RowRange::EMPTY);
        }
        if !self.index.contains(&id) {
            hlog!(debug, "do_expand: recording flag for an undiscovered item");
            self.index.mark_expanded(id);
            return Ok(RowRange::EMPTY);
        }
        if !self.index.is_materialized(&id) {
            self.materialize(Some(&id))?;
            if !self.index.is_materialized(&id) {
                // The fetch came back empty despite the probe.
                return Ok(RowRange::EMPTY);
            }
        }

        let delta = self.index.set_expanded(&id, true);
        debug_assert!(delta >= 0);
        if let Err(err) = self.settle() {
            // A descendant that just became visible could not be fetched.
            self.index.set_expanded(&id, false);
            return Err(err);
        }
        let inserted = self.index.size(Some(&id)).saturating_sub(1);
        hlog!(debug, delta, inserted, "do_expand");
        Ok(position.map_or(RowRange::EMPTY, |p| {
            RowRange::with_length(p.saturating_add(1), inserted)
        }))
    }

    /// Collapses `item` and returns the rows it removed after `position`.
    ///
    /// The range is computed from the subtree size before collapsing. Cached children are
    /// kept, so expanding again does not refetch. Never fetches.
    pub fn do_collapse(&mut self, item: Option<&T>, position: Option<usize>) -> RowRange {
        let Some(item) = item else {
            return RowRange::EMPTY;
        };
        let id = self.provider.id(item);
        if !self.index.is_expanded(&id) {
            return RowRange::EMPTY;
        }
        if !self.index.contains(&id) {
            self.index.unmark_expanded(&id);
            return RowRange::EMPTY;
        }

        let removed = self.index.size(Some(&id)).saturating_sub(1);
        let delta = self.index.set_expanded(&id, false);
        debug_assert_eq!(delta, -(removed as isize));
        hlog!(debug, delta, removed, "do_collapse");
        position.map_or(RowRange::EMPTY, |p| {
            RowRange::with_length(p.saturating_add(1), removed)
        })
    }

    /// Items at flattened rows `range`. Rows past the end are simply missing from the result.
    pub fn fetch_items(&mut self, range: RowRange) -> Result<Vec<T>, P::Error> {
        self.settle()?;
        Ok(self
            .index
            .rows_from(None, range.start)
            .take(range.len())
            .cloned()
            .collect())
    }

    /// Items at rows `range` of the flattened subtree below `parent`, not counting `parent`
    /// itself. Empty if `parent` is collapsed or unknown; `None` means the whole tree.
    pub fn fetch_children_items(
        &mut self,
        parent: Option<&T>,
        range: RowRange,
    ) -> Result<Vec<T>, P::Error> {
        let Some(parent) = parent else {
            return self.fetch_items(range);
        };
        self.settle()?;
        let id = self.provider.id(parent);
        if !self.index.is_expanded(&id) {
            return Ok(Vec::new());
        }
        Ok(self
            .index
            .rows_from(Some(&id), range.start)
            .take(range.len())
            .cloned()
            .collect())
    }

    /// The item at a single flattened row.
    pub fn item_at(&mut self, row: usize) -> Result<Option<T>, P::Error> {
        self.settle()?;
        Ok(self
            .index
            .locate(row)
            .and_then(|id| self.index.item(id))
            .cloned())
    }

    /// Row of `item` in the flattened view, or `None` if it is not visible under the current
    /// filter and expansion state. The root has no row.
    pub fn get_index_of(&mut self, item: Option<&T>) -> Result<Option<usize>, P::Error> {
        let Some(item) = item else {
            return Ok(None);
        };
        self.settle()?;
        Ok(self.index.rank(&self.provider.id(item)))
    }

    /// Row of the parent of `item`.
    ///
    /// Only the parent has to be visible: a cached item hidden under a collapsed parent
    /// still resolves to that parent's row. `Ok(None)` when the parent is the root or hidden,
    /// or when `item` is not cached.
    pub fn get_parent_index(&mut self, item: Option<&T>) -> Result<Option<usize>, P::Error> {
        let Some(item) = item else {
            return Err(Error::InvalidArgument("cannot find the parent of the root"));
        };
        self.settle()?;
        let id = self.provider.id(item);
        Ok(match self.index.parent_of(&id) {
            Some(Some(parent)) => self.index.rank(parent),
            _ => None,
        })
    }

    /// The cached parent item, if `item` is in the index and is not a root-level item.
    pub fn parent_of(&self, item: &T) -> Option<&T> {
        let id = self.provider.id(item);
        let parent = self.index.parent_of(&id)??;
        self.index.item(parent)
    }

    /// Direct children of `parent` as currently cached, in display order. Empty when they
    /// have not been fetched. Never fetches.
    pub fn cached_children(&self, parent: Option<&T>) -> Vec<T> {
        let id = parent.map(|item| self.provider.id(item));
        self.index
            .children(id.as_ref())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.index.item(child))
            .cloned()
            .collect()
    }

    /// Number of ancestors of `item` below the root, or `None` if it is not in the index.
    pub fn get_depth(&self, item: Option<&T>) -> Result<Option<usize>, P::Error> {
        let Some(item) = item else {
            return Err(Error::InvalidArgument("the root has no depth"));
        };
        Ok(self.index.depth(&self.provider.id(item)))
    }

    /// Hierarchy metadata for the row showing `item`.
    pub fn generate_data(&self, item: Option<&T>) -> Result<RowData, P::Error> {
        let Some(item) = item else {
            return Err(Error::InvalidArgument("cannot generate row data for the root"));
        };
        let id = self.provider.id(item);
        let depth = self.index.depth(&id);
        if !self.has_children(item)? {
            return Ok(RowData::leaf(depth));
        }
        Ok(RowData::branch(
            depth,
            !self.index.is_expanded(&id),
            self.options.collapse_allowed_for(item),
        ))
    }

    /// Drops every cached node and forgets all expansion state. Idempotent.
    pub fn destroy_all_data(&mut self) {
        hlog!(debug, cached = self.index.cached_len(), "destroy_all_data");
        self.index.clear();
    }

    /// Drops cached structure so the next read refetches from the root. Expansion flags are
    /// kept.
    pub fn refresh_all(&mut self) {
        self.invalidate();
    }

    /// Refetches the children of `item`.
    ///
    /// For an expanded item the new list replaces the cached one; if it is empty, the cached
    /// subtree is evicted and the item becomes a collapsed leaf. For a collapsed item the cache
    /// is just dropped, so the next expand fetches.
    pub fn refresh_children(&mut self, item: &T) -> Result<(), P::Error> {
        let id = self.provider.id(item);
        if !self.index.contains(&id) {
            return Ok(());
        }
        self.settle()?;
        if self.index.is_expanded(&id) {
            self.materialize(Some(&id))?;
            return self.settle();
        }
        if self.index.is_materialized(&id) {
            self.index.evict_children(Some(&id));
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        hlog!(
            debug,
            cached = self.index.cached_len(),
            expanded = self.index.expanded_len(),
            "invalidating cached hierarchy"
        );
        self.index.invalidate();
    }

    /// Makes sure the root and every visible pending node have their children.
    ///
    /// Pending nodes under a collapsed ancestor stay queued; they are fetched once an
    /// expand makes them visible. On failure the failed node stays queued and is retried by
    /// the next read.
    fn settle(&mut self) -> Result<(), P::Error> {
        if !self.index.is_root_materialized() {
            self.materialize(None)?;
        }
        let mut hidden = Vec::new();
        let mut outcome = Ok(());
        while let Some(id) = self.index.pop_pending() {
            if !self.index.is_expanded(&id)
                || !self.index.contains(&id)
                || self.index.is_materialized(&id)
            {
                continue;
            }
            if !self.index.is_visible(&id) {
                hidden.push(id);
                continue;
            }
            if let Err(err) = self.materialize(Some(&id)) {
                self.index.push_pending(id);
                outcome = Err(err);
                break;
            }
        }
        for id in hidden {
            self.index.push_pending(id);
        }
        outcome
    }

    /// Fetches the children of `parent`, and those of every fetched descendant whose flag is
    /// set, then commits them all. Nothing is committed when any fetch fails.
    fn materialize(&mut self, parent: Option<&P::Id>) -> Result<(), P::Error> {
        let item = match parent {
            None => None,
            Some(id) => match self.index.item(id) {
                Some(item) => Some(item.clone()),
                None => return Ok(()),
            },
        };

        let mut staged = Vec::new();
        let mut queue = alloc::vec![(parent.cloned(), item)];
        let mut seen = KeySet::new();
        while let Some((id, item)) = queue.pop() {
            if let Some(id) = &id {
                if !seen.insert(id.clone()) {
                    continue;
                }
            }
            let children = self.fetch_children_of(item.as_ref())?;
            for child in &children {
                let child_id = self.provider.id(child);
                if self.index.is_expanded(&child_id) && !self.index.is_materialized(&child_id) {
                    queue.push((Some(child_id), Some(child.clone())));
                }
            }
            staged.push((id, children));
        }

        // Parents were staged before their children, so each commit finds its node.
        for (id, children) in staged {
            self.commit(id.as_ref(), children);
        }
        Ok(())
    }

    fn fetch_children_of(&self, parent: Option<&T>) -> Result<Vec<T>, P::Error> {
        let query = HierarchicalQuery {
            parent,
            offset: 0,
            limit: None,
            sort_orders: &self.options.back_end_sorting,
            in_memory_sorting: self.options.in_memory_sorting.as_ref(),
            filter: self.options.filter.as_ref(),
        };
        let mut children = self
            .provider
            .fetch_children(query)
            .map_err(Error::Provider)?;
        if let Some(cmp) = &self.options.in_memory_sorting {
            children.sort_by(|a, b| cmp(a, b));
        }
        hlog!(
            trace,
            root = parent.is_none(),
            children = children.len(),
            "fetched children"
        );
        Ok(children)
    }

    fn commit(&mut self, parent: Option<&P::Id>, children: Vec<T>) {
        if children.is_empty() {
            self.index.evict_children(parent);
            return;
        }
        let children = children
            .into_iter()
            .map(|item| (self.provider.id(&item), item))
            .collect();
        self.index.attach(parent, children);
    }
}

#[cfg(test)]
impl<T, F, P> HierarchyMapper<T, F, P>
where
    P: HierarchicalDataProvider<T, F>,
    P::Id: core::fmt::Debug,
{
    pub(crate) fn assert_consistent(&self) {
        self.index.assert_consistent();
    }
}
