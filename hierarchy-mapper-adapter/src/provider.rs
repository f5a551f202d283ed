use std::convert::Infallible;
use std::sync::Arc;

use hierarchy_mapper::{HierarchicalDataProvider, HierarchicalQuery};

use crate::{TreeData, TreeKey};

/// Predicate filter understood by [`TreeDataProvider`].
pub type ItemFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A provider serving children straight from a [`TreeData`].
///
/// An item passes a filter when it, or any of its descendants, matches. That keeps the path to
/// every matching item reachable. The provider's own filter and the query's filter must both
/// pass. Back-end sort orders are ignored; the query's in-memory comparator is applied.
///
/// [`Self::has_children`] does not consult filters, so a node whose children are all
/// filtered out still reports children.
pub struct TreeDataProvider<T, K> {
    data: TreeData<T, K>,
    filter: Option<ItemFilter<T>>,
}

impl<T, K: TreeKey> TreeDataProvider<T, K> {
    pub fn new(data: TreeData<T, K>) -> Self {
        Self { data, filter: None }
    }

    pub fn tree_data(&self) -> &TreeData<T, K> {
        &self.data
    }

    /// Mutable access to the backing tree. Refresh the mapper afterwards.
    pub fn tree_data_mut(&mut self) -> &mut TreeData<T, K> {
        &mut self.data
    }

    pub fn filter(&self) -> Option<&ItemFilter<T>> {
        self.filter.as_ref()
    }

    /// Sets the provider-level filter. Refresh the mapper afterwards.
    pub fn set_filter(&mut self, filter: Option<ItemFilter<T>>) {
        self.filter = filter;
    }

    fn matches(&self, item: &T, extra: Option<&ItemFilter<T>>) -> bool {
        self.filter.as_ref().is_none_or(|f| f(item)) && extra.is_none_or(|f| f(item))
    }

    fn passes(&self, key: &K, extra: Option<&ItemFilter<T>>) -> bool {
        if self.filter.is_none() && extra.is_none() {
            return true;
        }
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            if self.data.get(key).is_some_and(|item| self.matches(item, extra)) {
                return true;
            }
            stack.extend(self.data.child_keys(Some(key)));
        }
        false
    }
}

impl<T: Clone, K: TreeKey> HierarchicalDataProvider<T, ItemFilter<T>> for TreeDataProvider<T, K> {
    type Id = K;
    type Error = Infallible;

    fn id(&self, item: &T) -> K {
        self.data.key_of(item)
    }

    fn has_children(&self, item: &T) -> Result<bool, Infallible> {
        let key = self.data.key_of(item);
        Ok(!self.data.child_keys(Some(&key)).is_empty())
    }

    fn fetch_children(
        &self,
        query: HierarchicalQuery<'_, T, ItemFilter<T>>,
    ) -> Result<Vec<T>, Infallible> {
        let parent = query.parent.map(|p| self.data.key_of(p));
        let mut children: Vec<T> = self
            .data
            .child_keys(parent.as_ref())
            .iter()
            .filter(|key| self.passes(key, query.filter))
            .filter_map(|key| self.data.get(key))
            .cloned()
            .collect();
        if let Some(cmp) = query.in_memory_sorting {
            children.sort_by(|a, b| cmp(a, b));
        }
        Ok(query.page(children).collect())
    }
}

impl<T, K: core::fmt::Debug> core::fmt::Debug for TreeDataProvider<T, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TreeDataProvider")
            .field("data", &self.data)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
