use serde::Serialize;

use crate::error::ConfigError;
use crate::remap::{Remap, RemapDiagnostics, RemapResult};
use crate::types::{GridShape, WorkgroupCoord};

/// Width of the edge row handed to each cluster: the two units per cluster left over
/// once every cluster owns one full block.
pub const EDGE_BLOCK_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRegion {
    Block,
    Edge,
}

/// Block tiling with a single edge row.
///
/// The grid is covered by `block_rows x block_cols` blocks, one per cluster. Launch ids are
/// "dechunked" by the cluster count, so that the ids the dispatcher sends to cluster `c`
/// (every `c`-th id under round-robin) fill block `c` contiguously. An optional single
/// leftover row on top of the blocks is handed out two tiles per cluster the same way.
///
/// Shape requirements, checked by [`CustomBlockEdge::new`]:
/// - columns divide evenly into blocks (edges along columns are not supported)
/// - the number of full blocks equals the number of clusters
/// - at most one leftover row, and if present it is exactly `2 * clusters` tiles wide
#[derive(Debug, Clone)]
pub struct CustomBlockEdge {
    grid: GridShape,
    block_rows: usize,
    block_cols: usize,
    num_clusters: usize,
    blocks_m: usize,
    block_covered: usize,
}

impl CustomBlockEdge {
    pub fn new(
        grid: GridShape,
        block_rows: usize,
        block_cols: usize,
        num_clusters: usize,
    ) -> Result<Self, ConfigError> {
        if block_rows == 0 {
            return Err(ConfigError::ZeroParameter { name: "block_rows" });
        }
        if block_cols == 0 {
            return Err(ConfigError::ZeroParameter { name: "block_cols" });
        }
        if num_clusters == 0 {
            return Err(ConfigError::ZeroParameter {
                name: "num_clusters",
            });
        }
        if grid.n_tiles % block_cols != 0 {
            return Err(ConfigError::ColumnEdgeUnsupported {
                n_tiles: grid.n_tiles,
                block_cols,
            });
        }

        let blocks_m = grid.m_tiles / block_rows;
        let blocks_n = grid.n_tiles / block_cols;
        let blocks = blocks_m * blocks_n;
        if blocks != num_clusters {
            return Err(ConfigError::BlockCountMismatch {
                blocks,
                clusters: num_clusters,
            });
        }

        let leftover_rows = grid.m_tiles % block_rows;
        if leftover_rows > 1 {
            return Err(ConfigError::EdgeTooDeep { leftover_rows });
        }
        if leftover_rows == 1 && grid.n_tiles != EDGE_BLOCK_WIDTH * num_clusters {
            return Err(ConfigError::EdgeWidthMismatch {
                n_tiles: grid.n_tiles,
                expected: EDGE_BLOCK_WIDTH * num_clusters,
            });
        }

        Ok(Self {
            grid,
            block_rows,
            block_cols,
            num_clusters,
            blocks_m,
            block_covered: blocks * block_rows * block_cols,
        })
    }

    /// Number of workgroups that land inside full blocks.
    pub fn block_covered(&self) -> usize {
        self.block_covered
    }

    fn dechunk(&self, id: usize, per_cluster: usize) -> usize {
        (id % self.num_clusters) * per_cluster + id / self.num_clusters
    }

    fn remap_block(&self, id: usize) -> (usize, WorkgroupCoord) {
        let per_block = self.block_rows * self.block_cols;
        let dechunked = self.dechunk(id, per_block);

        let block_id = dechunked / per_block;
        let block_m = block_id % self.blocks_m;
        let block_n = block_id / self.blocks_m;

        let offset = dechunked % per_block;
        let wg_m = offset % self.block_rows;
        let wg_n = offset / self.block_rows;

        let coord = WorkgroupCoord::new(
            block_m * self.block_rows + wg_m,
            block_n * self.block_cols + wg_n,
        );
        (dechunked, coord)
    }

    fn remap_edge(&self, id: usize) -> (usize, WorkgroupCoord) {
        let dechunked = self.dechunk(id - self.block_covered, EDGE_BLOCK_WIDTH);
        let block_n = dechunked / EDGE_BLOCK_WIDTH;
        let wg_n = dechunked % EDGE_BLOCK_WIDTH;
        // the edge sits directly above the block-covered rows
        let coord = WorkgroupCoord::new(
            self.blocks_m * self.block_rows,
            block_n * EDGE_BLOCK_WIDTH + wg_n,
        );
        (dechunked, coord)
    }
}

impl Remap for CustomBlockEdge {
    fn remap(&self, coord: WorkgroupCoord) -> RemapResult {
        let serial = self.grid.linear_id(coord);
        let (region, (dechunked, remapped)) = if serial < self.block_covered {
            (BlockRegion::Block, self.remap_block(serial))
        } else {
            (BlockRegion::Edge, self.remap_edge(serial))
        };
        RemapResult {
            coord: remapped,
            diagnostics: RemapDiagnostics::CustomBlockEdge {
                serial,
                dechunked,
                region,
            },
        }
    }
}
