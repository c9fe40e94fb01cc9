use serde::Serialize;
use std::fmt;

use crate::cache::{HitCounters, HitRates};
use crate::remap::RemapPolicy;
use crate::sim::top::WaveShape;
use crate::types::GridShape;

/// Outcome of one full simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub policy: RemapPolicy,
    pub grid: GridShape,
    pub k_slices: usize,
    pub waves: WaveShape,
    pub a_tile_bytes: u64,
    pub b_tile_bytes: u64,
    pub rates: HitRates,
    pub counters: HitCounters,
    pub per_cluster: Vec<HitCounters>,
}

impl SimReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hit-rate(private,shared,backing) ({:.6}, {:.6}, {:.6})",
            self.rates.private, self.rates.shared, self.rates.backing
        )
    }
}
