// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! strata-adapters: per-scheme resource adapters (`mtime`/`rm`) plus the
//! registry that dispatches a URI to the adapter for its scheme.

pub mod error;
pub mod local_file;
pub mod object_store_adapter;
pub mod registry;
pub mod warehouse_adapter;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::AdapterError;
pub use local_file::LocalFileAdapter;
pub use object_store_adapter::ObjectStoreAdapter;
pub use registry::{AdapterRegistry, ResourceAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use test_support::FakeAdapter;
pub use warehouse_adapter::WarehouseAdapter;

/// Build a registry with the three schemes named in §6: `file`, `gs`
/// (object store), and `bq` (table warehouse).
pub fn default_registry(cache: std::sync::Arc<strata_storage::HashCache>) -> AdapterRegistry {
    let registry = AdapterRegistry::new();
    registry.register("file", std::sync::Arc::new(LocalFileAdapter::new(cache.clone())));
    registry.register("gs", std::sync::Arc::new(ObjectStoreAdapter::new(cache)));
    registry.register("bq", std::sync::Arc::new(WarehouseAdapter::new()));
    registry
}
