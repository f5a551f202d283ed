use alloc::string::String;

/// A contiguous range of flattened rows: `start..end` (end exclusive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowRange {
    pub start: usize,
    pub end: usize, // exclusive
}

impl RowRange {
    /// The empty range at row 0, returned by expand/collapse calls that changed nothing.
    pub const EMPTY: RowRange = RowRange { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn with_length(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }
}

/// Hierarchy annotation attached to an emitted row.
///
/// It has no influence on ordering or indexing. With `feature = "serde"` it serializes to the
/// row hierarchy description object (`depth`, `leaf`, `collapsed`, `collapseAllowed`), omitting
/// fields that do not apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RowData {
    /// Number of ancestors below the root; items directly under the root have depth 0.
    /// `None` when the item is not in the index.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub depth: Option<usize>,
    pub leaf: bool,
    /// Only set for non-leaf rows.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub collapsed: Option<bool>,
    /// Only set for non-leaf rows.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub collapse_allowed: Option<bool>,
}

impl RowData {
    pub fn leaf(depth: Option<usize>) -> Self {
        Self {
            depth,
            leaf: true,
            collapsed: None,
            collapse_allowed: None,
        }
    }

    pub fn branch(depth: Option<usize>, collapsed: bool, collapse_allowed: bool) -> Self {
        Self {
            depth,
            leaf: false,
            collapsed: Some(collapsed),
            collapse_allowed: Some(collapse_allowed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A back-end sort directive, passed to the provider untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortOrder {
    pub property: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}
