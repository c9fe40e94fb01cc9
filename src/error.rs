use thiserror::Error;

use crate::types::WorkgroupCoord;

/// Rejected configurations. Raised before any mapping or cache state is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{dim} extent {extent} is not a multiple of tile size {tile}")]
    NonExactTiling {
        dim: &'static str,
        extent: usize,
        tile: usize,
    },

    #[error("{name} must be > 0")]
    ZeroParameter { name: &'static str },

    #[error("{operand} tile size in bits does not fit in 64 bits")]
    TileBytesOverflow { operand: &'static str },

    #[error("{level} cache capacity {capacity} B cannot hold a single {tile_bytes} B tile")]
    TileExceedsCache {
        level: &'static str,
        tile_bytes: u64,
        capacity: u64,
    },

    #[error("column tiles {n_tiles} not divisible by block width {block_cols}; edge regions are only supported along rows")]
    ColumnEdgeUnsupported { n_tiles: usize, block_cols: usize },

    #[error("{leftover_rows} leftover row tiles; the edge region must be a single row")]
    EdgeTooDeep { leftover_rows: usize },

    #[error("grid holds {blocks} full blocks but there are {clusters} clusters; need exactly one block per cluster")]
    BlockCountMismatch { blocks: usize, clusters: usize },

    #[error("edge row spans {n_tiles} column tiles, expected {expected} (two per cluster)")]
    EdgeWidthMismatch { n_tiles: usize, expected: usize },
}

/// Logic defects detected while building a mapping or finishing a simulation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("remap collision: {original} -> {remapped}, already claimed by {existing}")]
    RemapCollision {
        original: WorkgroupCoord,
        remapped: WorkgroupCoord,
        existing: WorkgroupCoord,
    },

    #[error("remap of {original} landed outside the grid at {remapped}")]
    RemapOutOfGrid {
        original: WorkgroupCoord,
        remapped: WorkgroupCoord,
    },

    #[error("hit counters do not conserve requests: {private} + {shared} + {backing} != {requests}")]
    HitConservation {
        requests: u64,
        private: u64,
        shared: u64,
        backing: u64,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WgsimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

pub type Result<T> = std::result::Result<T, WgsimError>;
