//! Workgroup coordinate remapping.
//!
//! A remapper is a pure bijection over the tile grid. It decides which output tile a
//! workgroup computes, given the tile it would have computed in plain launch order.
//! Neighboring workgroups in launch order land on the same cluster, so the goal of every
//! policy is to make those neighbors share operand tiles.

pub mod block_edge;
pub mod linear;

pub use block_edge::{BlockRegion, CustomBlockEdge, EDGE_BLOCK_WIDTH};
pub use linear::LinearGrouping;

use serde::Serialize;

use crate::error::ConfigError;
use crate::types::{GridShape, WorkgroupCoord};

pub trait Remap {
    fn remap(&self, coord: WorkgroupCoord) -> RemapResult;
}

/// Policy selection with its parameters, independent of any grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RemapPolicy {
    Identity,
    LinearGrouping { group_size: usize },
    CustomBlockEdge { block_rows: usize, block_cols: usize },
}

impl RemapPolicy {
    /// Check the policy against a concrete grid and cluster count and build the transform.
    pub fn bind(self, grid: GridShape, num_clusters: usize) -> Result<Remapper, ConfigError> {
        Ok(match self {
            RemapPolicy::Identity => Remapper::Identity,
            RemapPolicy::LinearGrouping { group_size } => {
                Remapper::LinearGrouping(LinearGrouping::new(grid, group_size)?)
            }
            RemapPolicy::CustomBlockEdge {
                block_rows,
                block_cols,
            } => Remapper::CustomBlockEdge(CustomBlockEdge::new(
                grid,
                block_rows,
                block_cols,
                num_clusters,
            )?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RemapPolicy::Identity => "identity",
            RemapPolicy::LinearGrouping { .. } => "linear_grouping",
            RemapPolicy::CustomBlockEdge { .. } => "custom_block_edge",
        }
    }
}

/// A policy bound to a grid.
#[derive(Debug, Clone)]
pub enum Remapper {
    Identity,
    LinearGrouping(LinearGrouping),
    CustomBlockEdge(CustomBlockEdge),
}

impl Remap for Remapper {
    fn remap(&self, coord: WorkgroupCoord) -> RemapResult {
        match self {
            Remapper::Identity => RemapResult {
                coord,
                diagnostics: RemapDiagnostics::Identity,
            },
            Remapper::LinearGrouping(policy) => policy.remap(coord),
            Remapper::CustomBlockEdge(policy) => policy.remap(coord),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemapResult {
    pub coord: WorkgroupCoord,
    pub diagnostics: RemapDiagnostics,
}

/// Intermediate values of a remap, kept for inspection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RemapDiagnostics {
    Identity,
    LinearGrouping {
        band: usize,
        serial: usize,
        x: usize,
        y: usize,
    },
    CustomBlockEdge {
        serial: usize,
        dechunked: usize,
        region: BlockRegion,
    },
}
