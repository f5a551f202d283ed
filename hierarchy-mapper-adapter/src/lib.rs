//! Adapter utilities for the `hierarchy-mapper` crate.
//!
//! The `hierarchy-mapper` crate is UI-agnostic and focuses on the flattening math and the
//! child cache. This crate provides small, framework-neutral helpers commonly needed by
//! adapters:
//!
//! - An in-memory tree store ([`TreeData`]) and a provider serving it ([`TreeDataProvider`])
//! - A grid [`Controller`] (row rendering, toggles, recursive expansion, an anchored row window)
//! - A clonable [`SharedMapper`] handle for multi-threaded hosts
//!
//! This crate is intentionally framework-agnostic (no egui/iced/web bindings).
#![forbid(unsafe_code)]

mod controller;
mod key;
mod provider;
mod shared;
mod tree_data;

#[cfg(test)]
mod tests;

pub use controller::{Controller, Row, RowChange};
pub use key::TreeKey;
pub use provider::{ItemFilter, TreeDataProvider};
pub use shared::SharedMapper;
pub use tree_data::{KeyFn, TreeData, TreeDataError};
