use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::SortOrder;

/// An in-memory comparator applied to fetched children before they are committed.
///
/// It is also passed to the provider inside each [`crate::HierarchicalQuery`].
pub type InMemorySorting<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Decides whether the user may collapse a given item.
///
/// Only consulted when generating row metadata. When unset, collapsing is always allowed.
pub type CollapseAllowedProvider<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Configuration for [`crate::HierarchyMapper`].
///
/// Cheap to clone: closures live in `Arc`s, so adapters can tweak a field and call
/// `HierarchyMapper::set_options` without rebuilding them.
pub struct MapperOptions<T, F> {
    /// Opaque filter handed to the provider.
    pub filter: Option<F>,
    /// Back-end sort directives, in priority order.
    pub back_end_sorting: Vec<SortOrder>,
    pub in_memory_sorting: Option<InMemorySorting<T>>,
    pub collapse_allowed: Option<CollapseAllowedProvider<T>>,
}

impl<T, F> MapperOptions<T, F> {
    pub fn new() -> Self {
        Self {
            filter: None,
            back_end_sorting: Vec::new(),
            in_memory_sorting: None,
            collapse_allowed: None,
        }
    }

    pub fn with_filter(mut self, filter: F) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_back_end_sorting(mut self, sorting: impl IntoIterator<Item = SortOrder>) -> Self {
        self.back_end_sorting = sorting.into_iter().collect();
        self
    }

    pub fn with_in_memory_sorting(
        mut self,
        cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.in_memory_sorting = Some(Arc::new(cmp));
        self
    }

    pub fn with_collapse_allowed(mut self, f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.collapse_allowed = Some(Arc::new(f));
        self
    }

    pub(crate) fn collapse_allowed_for(&self, item: &T) -> bool {
        self.collapse_allowed.as_ref().is_none_or(|f| f(item))
    }

    /// Whether switching from `self` to `next` can change which children the provider returns,
    /// or their order.
    ///
    /// Filters are opaque, so any filter on either side counts as a change.
    pub(crate) fn invalidates(&self, next: &Self) -> bool {
        let sorting_changed = match (&self.in_memory_sorting, &next.in_memory_sorting) {
            (None, None) => false,
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            _ => true,
        };
        sorting_changed
            || self.back_end_sorting != next.back_end_sorting
            || self.filter.is_some()
            || next.filter.is_some()
    }
}

impl<T, F> Default for MapperOptions<T, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F: Clone> Clone for MapperOptions<T, F> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            back_end_sorting: self.back_end_sorting.clone(),
            in_memory_sorting: self.in_memory_sorting.clone(),
            collapse_allowed: self.collapse_allowed.clone(),
        }
    }
}

impl<T, F: core::fmt::Debug> core::fmt::Debug for MapperOptions<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MapperOptions")
            .field("filter", &self.filter)
            .field("back_end_sorting", &self.back_end_sorting)
            .field("in_memory_sorting", &self.in_memory_sorting.is_some())
            .field("collapse_allowed", &self.collapse_allowed.is_some())
            .finish()
    }
}
