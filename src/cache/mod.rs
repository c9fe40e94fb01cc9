pub mod hierarchy;
pub mod lru;
pub mod stats;

pub use hierarchy::{CacheHierarchy, HitLevel, TileTag};
pub use lru::LruCache;
pub use stats::{HitCounters, HitRates};
