use log::debug;
use std::fmt;

use crate::cache::lru::{LruCache, Tick};
use crate::cache::stats::HitCounters;

/// Identity of one operand tile: an A tile is a row band of the left operand at one
/// reduction slice, a B tile a column band of the right operand at one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileTag {
    A { row: usize, slice: usize },
    B { slice: usize, col: usize },
}

impl fmt::Display for TileTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileTag::A { row, slice } => write!(f, "A({},{})", row, slice),
            TileTag::B { slice, col } => write!(f, "B({},{})", slice, col),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitLevel {
    Private,
    Shared,
    Backing,
}

/// Per-cluster private caches over one shared cache over unlimited backing memory.
///
/// Every request takes one tick of a single global clock; that tick is the only notion of
/// recency at both levels.
#[derive(Debug)]
pub struct CacheHierarchy {
    private: Vec<LruCache<TileTag>>,
    shared: LruCache<TileTag>,
    tick: Tick,
    stats: HitCounters,
    per_cluster: Vec<HitCounters>,
}

impl CacheHierarchy {
    pub fn new(num_clusters: usize, private_bytes: u64, shared_bytes: u64) -> Self {
        Self {
            private: (0..num_clusters).map(|_| LruCache::new(private_bytes)).collect(),
            shared: LruCache::new(shared_bytes),
            tick: 0,
            stats: HitCounters::default(),
            per_cluster: vec![HitCounters::default(); num_clusters],
        }
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn stats(&self) -> &HitCounters {
        &self.stats
    }

    pub fn cluster_stats(&self) -> &[HitCounters] {
        &self.per_cluster
    }

    pub fn private_cache(&self, cluster_id: usize) -> &LruCache<TileTag> {
        &self.private[cluster_id]
    }

    pub fn shared_cache(&self) -> &LruCache<TileTag> {
        &self.shared
    }

    /// Service one tile request from `cluster_id` and advance the clock.
    pub fn access(&mut self, cluster_id: usize, tag: TileTag, bytes: u64) -> HitLevel {
        let now = self.tick;
        self.tick += 1;
        self.stats.record_request();
        let cluster_stats = &mut self.per_cluster[cluster_id];
        cluster_stats.record_request();

        let level = if self.private[cluster_id].probe(tag, now) {
            HitLevel::Private
        } else {
            for (victim, last_used) in self.private[cluster_id].fill(tag, bytes, now) {
                debug!(
                    "{}: evicting {} from private[{}], last used at {}",
                    now, victim, cluster_id, last_used
                );
            }
            if self.shared.probe(tag, now) {
                HitLevel::Shared
            } else {
                for (victim, last_used) in self.shared.fill(tag, bytes, now) {
                    debug!(
                        "{}: evicting {} from shared, last used at {}",
                        now, victim, last_used
                    );
                }
                HitLevel::Backing
            }
        };

        match level {
            HitLevel::Private => {
                self.stats.record_private_hit();
                cluster_stats.record_private_hit();
            }
            HitLevel::Shared => {
                self.stats.record_shared_hit();
                cluster_stats.record_shared_hit();
            }
            HitLevel::Backing => {
                self.stats.record_backing_hit();
                cluster_stats.record_backing_hit();
            }
        }
        debug!("{}: cluster {} {} serviced by {:?}", now, cluster_id, tag, level);
        level
    }
}
