//! Workgroup-to-cluster mapping and cache hit-rate model for tiled matrix products.
//!
//! Configuration flows one way: a [`ClusterDispatcher`](gpu::ClusterDispatcher) and a
//! [`Remapper`](remap::Remapper) build a [`MappingTable`](mapping::MappingTable), which
//! [`Sim::simulate`](sim::Sim::simulate) replays through a two-level LRU
//! [`CacheHierarchy`](cache::CacheHierarchy).

pub mod cache;
pub mod error;
pub mod gpu;
pub mod mapping;
pub mod remap;
pub mod sim;
pub mod types;
pub mod ui;

#[cfg(test)]
mod unit_tests;

pub use error::{ConfigError, InvariantViolation, WgsimError};
pub use types::{ClusterAssignment, GridShape, WorkgroupCoord};
