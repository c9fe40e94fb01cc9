use std::path::PathBuf;
use std::str::FromStr;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

use crate::error::ConfigError;
use crate::remap::RemapPolicy;
use crate::types::GridShape;

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Result<Self, toml::de::Error> {
        match section {
            Some(value) => value.clone().try_into(),
            None => {
                warn!("config section not found");
                Ok(Self::default())
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    pub log_level: u64,
    pub print_mapping: bool,
    pub estimate: bool,
    pub results_json: Option<PathBuf>,
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_level: 0,
            print_mapping: false,
            estimate: false,
            results_json: None,
        }
    }
}

/// Problem shape of one matrix product `C[m, n] = A[m, k] * B[k, n]`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct GemmConfig {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub tile_m: usize,
    pub tile_n: usize,
    pub tile_k: usize,
    pub element_bits: u64,
    pub workgroups_per_unit: usize,
}

impl Config for GemmConfig {}

impl Default for GemmConfig {
    fn default() -> Self {
        Self {
            m: 128,
            n: 106496,
            k: 16384,
            tile_m: 64,
            tile_n: 512,
            tile_k: 512,
            element_bits: 4,
            workgroups_per_unit: 1,
        }
    }
}

impl GemmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("tile_m", self.tile_m),
            ("tile_n", self.tile_n),
            ("tile_k", self.tile_k),
            ("m", self.m),
            ("n", self.n),
            ("k", self.k),
            ("workgroups_per_unit", self.workgroups_per_unit),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroParameter { name });
            }
        }
        if self.element_bits == 0 {
            return Err(ConfigError::ZeroParameter {
                name: "element_bits",
            });
        }
        for (dim, extent, tile) in [
            ("m", self.m, self.tile_m),
            ("n", self.n, self.tile_n),
            ("k", self.k, self.tile_k),
        ] {
            if extent % tile != 0 {
                return Err(ConfigError::NonExactTiling { dim, extent, tile });
            }
        }
        self.a_tile_bytes()?;
        self.b_tile_bytes()?;
        Ok(())
    }

    pub fn grid(&self) -> GridShape {
        GridShape::new(self.m / self.tile_m, self.n / self.tile_n)
    }

    pub fn k_slices(&self) -> usize {
        self.k / self.tile_k
    }

    fn tile_bytes(
        &self,
        operand: &'static str,
        rows: usize,
        cols: usize,
    ) -> Result<u64, ConfigError> {
        (rows as u64)
            .checked_mul(cols as u64)
            .and_then(|elements| elements.checked_mul(self.element_bits))
            .map(|bits| bits.div_ceil(8))
            .ok_or(ConfigError::TileBytesOverflow { operand })
    }

    pub fn a_tile_bytes(&self) -> Result<u64, ConfigError> {
        self.tile_bytes("A", self.tile_m, self.tile_k)
    }

    pub fn b_tile_bytes(&self) -> Result<u64, ConfigError> {
        self.tile_bytes("B", self.tile_k, self.tile_n)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct GpuConfig {
    pub num_clusters: usize,
    pub units_per_cluster: usize,
    pub chunk_size: usize,
    pub private_cache_bytes: u64,
    pub shared_cache_bytes: u64,
}

impl Config for GpuConfig {}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            num_clusters: 8,
            units_per_cluster: 32,
            chunk_size: 1,
            private_cache_bytes: 4 << 20,
            shared_cache_bytes: 256 << 20,
        }
    }
}

impl GpuConfig {
    pub fn num_units(&self) -> usize {
        self.num_clusters * self.units_per_cluster
    }

    /// `largest_tile` is the larger of the A and B tile sizes; both cache levels must be
    /// able to hold at least one tile.
    pub fn validate(&self, largest_tile: u64) -> Result<(), ConfigError> {
        for (name, value) in [
            ("num_clusters", self.num_clusters),
            ("units_per_cluster", self.units_per_cluster),
            ("chunk_size", self.chunk_size),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroParameter { name });
            }
        }
        for (level, name, capacity) in [
            ("private", "private_cache_bytes", self.private_cache_bytes),
            ("shared", "shared_cache_bytes", self.shared_cache_bytes),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroParameter { name });
            }
            if capacity < largest_tile {
                return Err(ConfigError::TileExceedsCache {
                    level,
                    tile_bytes: largest_tile,
                    capacity,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Identity,
    #[default]
    LinearGrouping,
    CustomBlockEdge,
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "identity" => Ok(Self::Identity),
            "linear_grouping" => Ok(Self::LinearGrouping),
            "custom_block_edge" => Ok(Self::CustomBlockEdge),
            _ => Err(format!(
                "unsupported remap policy '{}', expected one of: identity, linear_grouping, custom_block_edge",
                value
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RemapConfig {
    pub policy: PolicyKind,
    pub group_size: usize,
    pub block_rows: usize,
    pub block_cols: usize,
}

impl Config for RemapConfig {}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::LinearGrouping,
            group_size: 16,
            block_rows: 2,
            block_cols: 16,
        }
    }
}

impl RemapConfig {
    pub fn to_policy(&self) -> RemapPolicy {
        match self.policy {
            PolicyKind::Identity => RemapPolicy::Identity,
            PolicyKind::LinearGrouping => RemapPolicy::LinearGrouping {
                group_size: self.group_size,
            },
            PolicyKind::CustomBlockEdge => RemapPolicy::CustomBlockEdge {
                block_rows: self.block_rows,
                block_cols: self.block_cols,
            },
        }
    }
}
