use std::collections::HashSet;
use std::ops::Range;

use log::{info, warn};
use serde::Serialize;

use crate::cache::{CacheHierarchy, HitCounters, HitRates, TileTag};
use crate::error::Result;
use crate::gpu::ClusterDispatcher;
use crate::mapping::MappingTable;
use crate::remap::RemapPolicy;
use crate::sim::config::{GemmConfig, GpuConfig};
use crate::sim::report::SimReport;

/// How launch order is cut into waves: `full_waves` cohorts of `wave_size` workgroups,
/// then one trailing cohort of `partial_wave` if it is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaveShape {
    pub wave_size: usize,
    pub full_waves: usize,
    pub partial_wave: usize,
}

impl WaveShape {
    pub fn new(num_workgroups: usize, wave_size: usize) -> Self {
        assert!(wave_size > 0, "wave_size must be > 0");
        Self {
            wave_size,
            full_waves: num_workgroups / wave_size,
            partial_wave: num_workgroups % wave_size,
        }
    }

    pub fn num_waves(&self) -> usize {
        self.full_waves + usize::from(self.partial_wave != 0)
    }

    /// Launch-id range of every wave, in order.
    pub fn waves(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.num_waves()).map(move |wave| {
            let start = wave * self.wave_size;
            let len = if wave < self.full_waves {
                self.wave_size
            } else {
                self.partial_wave
            };
            start..start + len
        })
    }
}

/// One configured kernel launch: a validated problem, a topology and the resulting mapping.
pub struct Sim {
    gemm: GemmConfig,
    gpu: GpuConfig,
    policy: RemapPolicy,
    mapping: MappingTable,
    a_tile_bytes: u64,
    b_tile_bytes: u64,
}

impl Sim {
    pub fn new(gemm: GemmConfig, gpu: GpuConfig, policy: RemapPolicy) -> Result<Self> {
        gemm.validate()?;
        let a_tile_bytes = gemm.a_tile_bytes()?;
        let b_tile_bytes = gemm.b_tile_bytes()?;
        gpu.validate(a_tile_bytes.max(b_tile_bytes))?;

        let grid = gemm.grid();
        let remapper = policy.bind(grid, gpu.num_clusters)?;
        let dispatcher =
            ClusterDispatcher::new(gpu.num_clusters, gpu.units_per_cluster, gpu.chunk_size);
        let mapping = MappingTable::build(grid, dispatcher, &remapper)?;

        info!(
            "MxNxK: {}x{}x{}; tile: {}x{}x{}; grid: {}x{} tiles; policy: {}",
            gemm.m,
            gemm.n,
            gemm.k,
            gemm.tile_m,
            gemm.tile_n,
            gemm.tile_k,
            grid.m_tiles,
            grid.n_tiles,
            policy.name()
        );
        Ok(Self {
            gemm,
            gpu,
            policy,
            mapping,
            a_tile_bytes,
            b_tile_bytes,
        })
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn gemm(&self) -> &GemmConfig {
        &self.gemm
    }

    pub fn a_tile_bytes(&self) -> u64 {
        self.a_tile_bytes
    }

    pub fn b_tile_bytes(&self) -> u64 {
        self.b_tile_bytes
    }

    pub fn wave_shape(&self) -> WaveShape {
        WaveShape::new(
            self.mapping.len(),
            self.gpu.num_units() * self.gemm.workgroups_per_unit,
        )
    }

    /// Visit every tile request of the kernel in issue order as `(cluster, tile, bytes)`.
    ///
    /// Waves follow launch order. Within a wave the reduction slice is the outer loop, so
    /// each workgroup of the wave requests its slice-`s` tiles before any workgroup moves to
    /// slice `s + 1`. Each workgroup issues its A tile, then its B tile.
    pub fn for_each_request(&self, mut visit: impl FnMut(usize, TileTag, u64)) {
        for wave in self.wave_shape().waves() {
            for slice in 0..self.gemm.k_slices() {
                for launch_id in wave.clone() {
                    let wg = self.mapping.by_launch_id(launch_id);
                    let cluster = wg.assignment.cluster_id;
                    let a = TileTag::A {
                        row: wg.remapped.row,
                        slice,
                    };
                    let b = TileTag::B {
                        slice,
                        col: wg.remapped.col,
                    };
                    visit(cluster, a, self.a_tile_bytes);
                    visit(cluster, b, self.b_tile_bytes);
                }
            }
        }
    }

    /// Replay every tile request of the kernel through the cache hierarchy.
    pub fn simulate(&self) -> Result<SimReport> {
        let waves = self.wave_shape();
        info!(
            "workgroups: {}; wave size: {}; full waves: {}; partial wave: {}",
            self.mapping.len(),
            waves.wave_size,
            waves.full_waves,
            waves.partial_wave
        );

        let mut caches = CacheHierarchy::new(
            self.gpu.num_clusters,
            self.gpu.private_cache_bytes,
            self.gpu.shared_cache_bytes,
        );
        self.for_each_request(|cluster, tag, bytes| {
            caches.access(cluster, tag, bytes);
        });

        let counters = *caches.stats();
        counters.check_conservation()?;
        let report = SimReport {
            policy: self.policy,
            grid: self.mapping.grid(),
            k_slices: self.gemm.k_slices(),
            waves,
            a_tile_bytes: self.a_tile_bytes,
            b_tile_bytes: self.b_tile_bytes,
            rates: counters.rates(),
            counters,
            per_cluster: caches.cluster_stats().to_vec(),
        };
        info!("{}", report);
        Ok(report)
    }

    /// Presence-only estimate: every cache level is treated as infinitely large and the
    /// reduction dimension is ignored, so each distinct A row and B column is fetched at
    /// most once per level.
    ///
    /// This is an upper bound on on-chip hits that ignores finite capacity entirely. It is
    /// a sanity check, never a substitute for [`Sim::simulate`].
    pub fn estimate_unbounded(&self) -> Result<HitRates> {
        warn!("unbounded estimate ignores cache capacity; use it as an upper bound only");
        let num_clusters = self.gpu.num_clusters;
        let mut private_rows = vec![HashSet::new(); num_clusters];
        let mut private_cols = vec![HashSet::new(); num_clusters];
        let mut shared_rows = HashSet::new();
        let mut shared_cols = HashSet::new();
        let mut counters = HitCounters::default();

        let mut record = |hit_private: bool, hit_shared: bool| {
            counters.record_request();
            if hit_private {
                counters.record_private_hit();
            } else if hit_shared {
                counters.record_shared_hit();
            } else {
                counters.record_backing_hit();
            }
        };
        for wg in self.mapping.workgroups() {
            let cluster = wg.assignment.cluster_id;
            let row = wg.remapped.row;
            let col = wg.remapped.col;

            let private_a = !private_rows[cluster].insert(row);
            let shared_a = !private_a && !shared_rows.insert(row);
            record(private_a, shared_a);

            let private_b = !private_cols[cluster].insert(col);
            let shared_b = !private_b && !shared_cols.insert(col);
            record(private_b, shared_b);
        }

        counters.check_conservation()?;
        Ok(counters.rates())
    }
}
