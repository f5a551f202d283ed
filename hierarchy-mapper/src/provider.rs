use alloc::vec::Vec;

use crate::key::KeyCacheKey;
use crate::options::InMemorySorting;
use crate::types::SortOrder;

/// A request for the direct children of `parent` (`None` = the root level).
///
/// Sort orders, the in-memory comparator and the filter are the mapper's current settings,
/// handed over unchanged.
pub struct HierarchicalQuery<'a, T, F> {
    pub parent: Option<&'a T>,
    pub offset: usize,
    /// `None` requests every remaining child.
    pub limit: Option<usize>,
    pub sort_orders: &'a [SortOrder],
    pub in_memory_sorting: Option<&'a InMemorySorting<T>>,
    pub filter: Option<&'a F>,
}

impl<T, F> Clone for HierarchicalQuery<'_, T, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, F> Copy for HierarchicalQuery<'_, T, F> {}

impl<'a, T, F> HierarchicalQuery<'a, T, F> {
    /// An unsorted, unfiltered request for every child of `parent`.
    pub fn children_of(parent: Option<&'a T>) -> Self {
        Self {
            parent,
            offset: 0,
            limit: None,
            sort_orders: &[],
            in_memory_sorting: None,
            filter: None,
        }
    }

    /// Applies `offset`/`limit` to an already ordered child list.
    pub fn page<I: IntoIterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
    }
}

impl<T, F> core::fmt::Debug for HierarchicalQuery<'_, T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HierarchicalQuery")
            .field("root", &self.parent.is_none())
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("sort_orders", &self.sort_orders)
            .field("in_memory_sorting", &self.in_memory_sorting.is_some())
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// The backing data source a [`crate::HierarchyMapper`] reads from.
///
/// Calls are synchronous; the mapper neither retries nor cancels them. Errors are returned to
/// the caller of the mapper operation that issued the call.
pub trait HierarchicalDataProvider<T, F> {
    /// Stable identity of an item, consistent across repeated fetches.
    type Id: KeyCacheKey;
    type Error;

    fn id(&self, item: &T) -> Self::Id;

    /// Existence probe: does `item` have at least one child under the current data?
    ///
    /// Defaults to an unfiltered [`Self::child_count`]. Override it when the backend can
    /// answer more cheaply.
    fn has_children(&self, item: &T) -> Result<bool, Self::Error> {
        self.child_count(HierarchicalQuery::children_of(Some(item)))
            .map(|count| count > 0)
    }

    fn fetch_children(&self, query: HierarchicalQuery<'_, T, F>) -> Result<Vec<T>, Self::Error>;

    fn child_count(&self, query: HierarchicalQuery<'_, T, F>) -> Result<usize, Self::Error> {
        self.fetch_children(query).map(|children| children.len())
    }
}
