//! A headless hierarchy virtualization engine.
//!
//! For adapter-level utilities (an in-memory tree provider, a grid controller, a shareable
//! handle), see the `hierarchy-mapper-adapter` crate.
//!
//! This crate presents a tree whose children are fetched lazily from a backing provider as one
//! flat sequence of rows that a virtualized grid can address by range: per-node expansion
//! state, incremental subtree sizes, row ↔ item lookups that walk a single root-to-node path,
//! and cache eviction when the provider reports that a node lost its children.
//!
//! It is UI-agnostic. The caller is expected to provide:
//! - a [`HierarchicalDataProvider`] (identity, child probe, child fetch)
//! - optionally a filter, sort orders and a collapse policy ([`MapperOptions`])
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod fenwick;
mod index;
mod key;
mod mapper;
mod options;
mod provider;
mod types;


pub use error::{Error, Result};
pub use mapper::HierarchyMapper;
pub use options::{CollapseAllowedProvider, InMemorySorting, MapperOptions};
pub use provider::{HierarchicalDataProvider, HierarchicalQuery};
pub use types::{RowData, RowRange, SortDirection, SortOrder};

#[doc(hidden)]
pub use key::KeyCacheKey;
