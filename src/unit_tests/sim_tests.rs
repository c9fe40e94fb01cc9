use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::TileTag;
use crate::error::{ConfigError, WgsimError};
use crate::remap::RemapPolicy;
use crate::sim::config::{GemmConfig, GpuConfig};
use crate::sim::top::{Sim, WaveShape};

/// 16x16 tiles of 8-bit elements, so every A and B tile is 256 bytes.
fn gemm(m_tiles: usize, n_tiles: usize, k_slices: usize) -> GemmConfig {
    GemmConfig {
        m: 16 * m_tiles,
        n: 16 * n_tiles,
        k: 16 * k_slices,
        tile_m: 16,
        tile_n: 16,
        tile_k: 16,
        element_bits: 8,
        workgroups_per_unit: 1,
    }
}

const TILE: u64 = 256;

fn gpu(num_clusters: usize, units_per_cluster: usize, private: u64, shared: u64) -> GpuConfig {
    GpuConfig {
        num_clusters,
        units_per_cluster,
        chunk_size: 1,
        private_cache_bytes: private,
        shared_cache_bytes: shared,
    }
}

#[test]
fn wave_shape_splits_partial_wave() {
    let shape = WaveShape::new(10, 4);
    assert_eq!(shape.full_waves, 2);
    assert_eq!(shape.partial_wave, 2);
    assert_eq!(shape.waves().collect::<Vec<_>>(), vec![0..4, 4..8, 8..10]);

    let exact = WaveShape::new(8, 4);
    assert_eq!(exact.num_waves(), 2);
}

#[test]
fn single_cluster_replay_by_hand() {
    // one workgroup per wave; the second reuses the first one's A tiles
    let sim = Sim::new(
        gemm(1, 2, 2),
        gpu(1, 1, 64 * TILE, 64 * TILE),
        RemapPolicy::Identity,
    )
    .unwrap();
    let report = sim.simulate().unwrap();
    assert_eq!(report.waves.num_waves(), 2);
    assert_eq!(report.counters.requests(), 8);
    assert_eq!(report.counters.private_hits(), 2);
    assert_eq!(report.counters.shared_hits(), 0);
    assert_eq!(report.counters.backing_hits(), 6);
}

#[test]
fn sibling_cluster_replay_by_hand() {
    // both workgroups share a wave but run on different clusters
    let sim = Sim::new(
        gemm(1, 2, 2),
        gpu(2, 1, 64 * TILE, 64 * TILE),
        RemapPolicy::Identity,
    )
    .unwrap();
    let report = sim.simulate().unwrap();
    assert_eq!(report.waves.num_waves(), 1);
    assert_eq!(report.counters.requests(), 8);
    assert_eq!(report.counters.private_hits(), 0);
    assert_eq!(report.counters.shared_hits(), 2);
    assert_eq!(report.counters.backing_hits(), 6);
    assert_eq!(report.per_cluster[1].shared_hits(), 2);
}

#[test]
fn slice_outer_replay_reuses_a_tile_in_private() {
    // both workgroups share one wave on one cluster and need A(0,s) at the same slice;
    // two private tiles only hold that reuse if slices are the outer loop
    let sim = Sim::new(
        gemm(1, 2, 2),
        gpu(1, 2, 2 * TILE, 64 * TILE),
        RemapPolicy::Identity,
    )
    .unwrap();
    let report = sim.simulate().unwrap();
    assert_eq!(report.waves.num_waves(), 1);
    assert_eq!(report.counters.requests(), 8);
    assert_eq!(report.counters.private_hits(), 2);
    assert_eq!(report.counters.shared_hits(), 0);
    assert_eq!(report.counters.backing_hits(), 6);
}

#[test]
fn replay_follows_launch_order_not_remapped_order() {
    // LinearGrouping moves workgroups across waves and clusters here, so walking the
    // grid in remapped order, issuing B first or going workgroup-outer all give
    // different counts
    let sim = Sim::new(
        gemm(2, 4, 2),
        gpu(2, 2, TILE, 3 * TILE),
        RemapPolicy::LinearGrouping { group_size: 3 },
    )
    .unwrap();
    let report = sim.simulate().unwrap();
    assert_eq!(report.waves.num_waves(), 2);
    assert_eq!(report.counters.requests(), 32);
    assert_eq!(report.counters.private_hits(), 0);
    assert_eq!(report.counters.shared_hits(), 8);
    assert_eq!(report.counters.backing_hits(), 24);
}

#[test]
fn request_trace_is_wave_slice_workgroup_a_then_b() {
    // 2x2 grid grouped by 2: launch ids 1 and 2 swap places, (1,0) <-> (0,1)
    let sim = Sim::new(
        gemm(2, 2, 2),
        gpu(2, 1, 4 * TILE, 16 * TILE),
        RemapPolicy::LinearGrouping { group_size: 2 },
    )
    .unwrap();
    let mut trace = Vec::new();
    sim.for_each_request(|cluster, tag, bytes| {
        assert_eq!(bytes, TILE);
        trace.push((cluster, tag));
    });

    let a = |row, slice| TileTag::A { row, slice };
    let b = |slice, col| TileTag::B { slice, col };
    let expected = vec![
        // wave 0: launch ids 0 and 1, remapped to (0,0) and (0,1)
        (0, a(0, 0)),
        (0, b(0, 0)),
        (1, a(0, 0)),
        (1, b(0, 1)),
        (0, a(0, 1)),
        (0, b(1, 0)),
        (1, a(0, 1)),
        (1, b(1, 1)),
        // wave 1: launch ids 2 and 3, remapped to (1,0) and (1,1)
        (0, a(1, 0)),
        (0, b(0, 0)),
        (1, a(1, 0)),
        (1, b(0, 1)),
        (0, a(1, 1)),
        (0, b(1, 0)),
        (1, a(1, 1)),
        (1, b(1, 1)),
    ];
    assert_eq!(trace, expected);
}

#[test]
fn rates_sum_to_one_on_random_configs() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let policy = if rng.gen_bool(0.5) {
            RemapPolicy::LinearGrouping {
                group_size: rng.gen_range(1..6),
            }
        } else {
            RemapPolicy::Identity
        };
        let sim = Sim::new(
            gemm(rng.gen_range(1..8), rng.gen_range(1..12), rng.gen_range(1..5)),
            GpuConfig {
                chunk_size: rng.gen_range(1..3),
                ..gpu(
                    rng.gen_range(1..4),
                    rng.gen_range(1..4),
                    TILE * rng.gen_range(1..8),
                    TILE * rng.gen_range(1..16),
                )
            },
            policy,
        )
        .unwrap();
        let report = sim.simulate().unwrap();
        let c = report.counters;
        assert_eq!(
            c.private_hits() + c.shared_hits() + c.backing_hits(),
            c.requests()
        );
        assert_eq!(c.requests() as usize, 2 * sim.mapping().len() * report.k_slices);
        assert!((report.rates.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn larger_private_cache_never_hurts() {
    let mut last = 0;
    for tiles in 1..40 {
        let sim = Sim::new(
            gemm(8, 16, 4),
            gpu(4, 4, tiles * TILE, 16 * TILE),
            RemapPolicy::LinearGrouping { group_size: 4 },
        )
        .unwrap();
        let hits = sim.simulate().unwrap().counters.private_hits();
        assert!(hits >= last, "{} tiles: {} < {}", tiles, hits, last);
        last = hits;
    }
    assert!(last > 0);
}

#[test]
fn larger_shared_cache_never_hurts() {
    let mut last = 0;
    for tiles in 1..60 {
        let sim = Sim::new(
            gemm(8, 16, 4),
            gpu(4, 4, 2 * TILE, tiles * TILE),
            RemapPolicy::LinearGrouping { group_size: 4 },
        )
        .unwrap();
        let c = sim.simulate().unwrap().counters;
        let on_chip = c.private_hits() + c.shared_hits();
        assert!(on_chip >= last, "{} tiles: {} < {}", tiles, on_chip, last);
        last = on_chip;
    }
}

#[test]
fn unbounded_estimate_matches_oversized_caches() {
    let sim = Sim::new(
        gemm(4, 8, 3),
        gpu(2, 2, 1 << 20, 1 << 20),
        RemapPolicy::LinearGrouping { group_size: 2 },
    )
    .unwrap();
    let exact = sim.simulate().unwrap().rates;
    let estimate = sim.estimate_unbounded().unwrap();
    assert!((exact.private - estimate.private).abs() < 1e-12);
    assert!((exact.shared - estimate.shared).abs() < 1e-12);
    assert!((exact.backing - estimate.backing).abs() < 1e-12);
}

#[test]
fn unbounded_estimate_bounds_finite_caches() {
    let sim = Sim::new(
        gemm(8, 16, 4),
        gpu(4, 4, 2 * TILE, 4 * TILE),
        RemapPolicy::LinearGrouping { group_size: 4 },
    )
    .unwrap();
    let exact = sim.simulate().unwrap().rates;
    let estimate = sim.estimate_unbounded().unwrap();
    assert!(estimate.on_chip() >= exact.on_chip());
}

#[test]
fn default_configuration_runs() {
    let sim = Sim::new(
        GemmConfig::default(),
        GpuConfig::default(),
        RemapPolicy::LinearGrouping { group_size: 16 },
    )
    .unwrap();
    assert_eq!(sim.mapping().len(), 2 * 208);
    let report = sim.simulate().unwrap();
    assert_eq!(report.a_tile_bytes, 16 << 10);
    assert_eq!(report.b_tile_bytes, 128 << 10);
    assert_eq!(report.waves.full_waves, 1);
    assert_eq!(report.waves.partial_wave, 160);
    assert!((report.rates.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn block_edge_policy_runs_end_to_end() {
    let sim = Sim::new(
        gemm(17, 16, 2),
        gpu(8, 34, 8 * TILE, 64 * TILE),
        RemapPolicy::CustomBlockEdge {
            block_rows: 2,
            block_cols: 16,
        },
    )
    .unwrap();
    let report = sim.simulate().unwrap();
    assert_eq!(report.waves.num_waves(), 1);
    assert!((report.rates.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn non_exact_tiling_is_rejected() {
    let mut cfg = gemm(2, 2, 2);
    cfg.n += 1;
    let err = Sim::new(cfg, gpu(1, 1, TILE, TILE), RemapPolicy::Identity)
        .err()
        .unwrap();
    assert_eq!(
        err,
        WgsimError::Config(ConfigError::NonExactTiling {
            dim: "n",
            extent: 33,
            tile: 16
        })
    );
}

#[test]
fn zero_capacity_is_rejected() {
    let err = Sim::new(gemm(2, 2, 2), gpu(1, 1, 0, TILE), RemapPolicy::Identity)
        .err()
        .unwrap();
    assert_eq!(
        err,
        WgsimError::Config(ConfigError::ZeroParameter {
            name: "private_cache_bytes"
        })
    );
}

#[test]
fn cache_smaller_than_a_tile_is_rejected() {
    let err = Sim::new(gemm(2, 2, 2), gpu(1, 1, TILE, TILE - 1), RemapPolicy::Identity)
        .err()
        .unwrap();
    assert_eq!(
        err,
        WgsimError::Config(ConfigError::TileExceedsCache {
            level: "shared",
            tile_bytes: TILE,
            capacity: TILE - 1
        })
    );
}

#[test]
fn incompatible_block_shape_is_rejected() {
    let err = Sim::new(
        gemm(16, 32, 1),
        gpu(8, 32, TILE, TILE),
        RemapPolicy::CustomBlockEdge {
            block_rows: 2,
            block_cols: 16,
        },
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        WgsimError::Config(ConfigError::BlockCountMismatch { .. })
    ));
}

#[test]
fn report_serializes_to_json() {
    let sim = Sim::new(
        gemm(2, 4, 1),
        gpu(2, 1, 4 * TILE, 8 * TILE),
        RemapPolicy::LinearGrouping { group_size: 2 },
    )
    .unwrap();
    let report = sim.simulate().unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["policy"]["policy"], "linear_grouping");
    assert_eq!(json["policy"]["group_size"], 2);
    assert_eq!(json["counters"]["requests"], 16);
    assert_eq!(json["per_cluster"].as_array().unwrap().len(), 2);
    assert!(report.to_string().starts_with("hit-rate(private,shared,backing) ("));
}
