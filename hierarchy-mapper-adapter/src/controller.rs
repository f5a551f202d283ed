use hierarchy_mapper::{HierarchicalDataProvider, HierarchyMapper, Result, RowData, RowRange};

/// One rendered row: its index in the flattened view, the item, and its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row<T> {
    pub index: usize,
    pub item: T,
    pub data: RowData,
}

/// Structural change produced by an expand or collapse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowChange {
    #[default]
    None,
    Inserted(RowRange),
    Removed(RowRange),
}

impl RowChange {
    fn inserted(range: RowRange) -> Self {
        if range.is_empty() {
            Self::None
        } else {
            Self::Inserted(range)
        }
    }

    fn removed(range: RowRange) -> Self {
        if range.is_empty() {
            Self::None
        } else {
            Self::Removed(range)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A framework-neutral controller that wraps a [`HierarchyMapper`] and provides common grid
/// workflows (row rendering, toggles, recursive expansion).
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `set_active_range` when the grid scrolls
/// - `toggle` / `expand` / `collapse` on user input, applying the returned [`RowChange`]
/// - `active_rows` (or `rows`) to get what to render
///
/// The active range keeps the rows above it anchored: rows inserted or removed before it shift
/// it, so the same items stay in view.
pub struct Controller<T, F, P: HierarchicalDataProvider<T, F>> {
    mapper: HierarchyMapper<T, F, P>,
    active: RowRange,
}

impl<T: Clone, F, P: HierarchicalDataProvider<T, F>> Controller<T, F, P> {
    pub fn new(provider: P) -> Self {
        Self::from_mapper(HierarchyMapper::new(provider))
    }

    pub fn from_mapper(mapper: HierarchyMapper<T, F, P>) -> Self {
        Self {
            mapper,
            active: RowRange::EMPTY,
        }
    }

    pub fn mapper(&self) -> &HierarchyMapper<T, F, P> {
        &self.mapper
    }

    /// Mutable access to the mapper. Structural changes made through it do not move the
    /// active range; call [`Self::clamp_active_range`] afterwards.
    pub fn mapper_mut(&mut self) -> &mut HierarchyMapper<T, F, P> {
        &mut self.mapper
    }

    pub fn into_mapper(self) -> HierarchyMapper<T, F, P> {
        self.mapper
    }

    pub fn size(&mut self) -> Result<usize, P::Error> {
        self.mapper.get_tree_size()
    }

    pub fn active_range(&self) -> RowRange {
        self.active
    }

    pub fn set_active_range(&mut self, range: RowRange) {
        self.active = range;
    }

    /// Shrinks the active range so it does not extend past the last row.
    pub fn clamp_active_range(&mut self) -> Result<RowRange, P::Error> {
        let size = self.mapper.get_tree_size()?;
        let start = self.active.start.min(size);
        self.active = RowRange::new(start, self.active.end.min(size));
        Ok(self.active)
    }

    /// Rows in `range` with their metadata. Rows past the end are missing from the result.
    pub fn rows(&mut self, range: RowRange) -> Result<Vec<Row<T>>, P::Error> {
        let items = self.mapper.fetch_items(range)?;
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let data = self.mapper.generate_data(Some(&item))?;
                Ok(Row {
                    index: range.start + i,
                    item,
                    data,
                })
            })
            .collect()
    }

    pub fn active_rows(&mut self) -> Result<Vec<Row<T>>, P::Error> {
        self.rows(self.active)
    }

    pub fn expand(&mut self, item: &T) -> Result<RowChange, P::Error> {
        let position = self.mapper.get_index_of(Some(item))?;
        let inserted = self.mapper.do_expand(Some(item), position)?;
        let change = RowChange::inserted(inserted);
        self.shift_active(change);
        Ok(change)
    }

    pub fn collapse(&mut self, item: &T) -> Result<RowChange, P::Error> {
        let position = self.mapper.get_index_of(Some(item))?;
        let removed = self.mapper.do_collapse(Some(item), position);
        let change = RowChange::removed(removed);
        self.shift_active(change);
        Ok(change)
    }

    pub fn toggle(&mut self, item: &T) -> Result<RowChange, P::Error> {
        if self.mapper.is_expanded(Some(item)) {
            self.collapse(item)
        } else {
            self.expand(item)
        }
    }

    /// Expands `items` and their descendants down to `depth` levels below them
    /// (`0` expands only `items`).
    ///
    /// Returns the changes in the order they were applied.
    pub fn expand_recursively(
        &mut self,
        items: impl IntoIterator<Item = T>,
        depth: usize,
    ) -> Result<Vec<RowChange>, P::Error> {
        let mut changes = Vec::new();
        let mut level: Vec<T> = items.into_iter().collect();
        for remaining in (0..=depth).rev() {
            let mut next = Vec::new();
            for item in &level {
                let change = self.expand(item)?;
                if !change.is_none() {
                    changes.push(change);
                }
                if remaining > 0 {
                    next.extend(self.mapper.cached_children(Some(item)));
                }
            }
            level = next;
        }
        Ok(changes)
    }

    /// Collapses `items` and their cached descendants down to `depth` levels below them.
    ///
    /// Descendants are collapsed first, so each returned change is what the grid would see
    /// at that moment.
    pub fn collapse_recursively(
        &mut self,
        items: impl IntoIterator<Item = T>,
        depth: usize,
    ) -> Result<Vec<RowChange>, P::Error> {
        let mut levels: Vec<Vec<T>> = vec![items.into_iter().collect()];
        for _ in 0..depth {
            let next: Vec<T> = levels
                .last()
                .into_iter()
                .flatten()
                .flat_map(|item| self.mapper.cached_children(Some(item)))
                .collect();
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }

        let mut changes = Vec::new();
        for level in levels.iter().rev() {
            for item in level {
                let change = self.collapse(item)?;
                if !change.is_none() {
                    changes.push(change);
                }
            }
        }
        Ok(changes)
    }

    /// Sets the filter, which rebuilds the tree, and clamps the active range.
    pub fn set_filter(&mut self, filter: Option<F>) -> Result<(), P::Error> {
        self.mapper.set_filter(filter);
        self.clamp_active_range().map(|_| ())
    }

    /// Drops cached children after a data change and clamps the active range.
    pub fn refresh_all(&mut self) -> Result<(), P::Error> {
        self.mapper.refresh_all();
        self.clamp_active_range().map(|_| ())
    }

    fn shift_active(&mut self, change: RowChange) {
        let active = self.active;
        self.active = match change {
            RowChange::None => active,
            RowChange::Inserted(r) if r.start <= active.start => {
                RowRange::with_length(active.start + r.len(), active.len())
            }
            RowChange::Removed(r) if r.start < active.start => {
                let removed_before = r.end.min(active.start) - r.start;
                RowRange::with_length(active.start - removed_before, active.len())
            }
            _ => active,
        };
    }
}

impl<T: Clone, F, P> core::fmt::Debug for Controller<T, F, P>
where
    P: HierarchicalDataProvider<T, F>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("active", &self.active)
            .field("expanded", &self.mapper.expanded_count())
            .finish_non_exhaustive()
    }
}
