use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

pub type Tick = u64;

#[derive(Debug, Clone, Copy)]
struct Entry {
    tick: Tick,
    bytes: u64,
}

/// Fully associative, byte-capacity cache with strict LRU replacement.
///
/// Recency is the tick of the last access. Ticks are handed out by the caller, one per
/// request and strictly increasing, so `order` never sees two entries with the same tick and
/// its first key is always the single least recently used entry.
#[derive(Debug)]
pub struct LruCache<K> {
    capacity_bytes: u64,
    used_bytes: u64,
    entries: HashMap<K, Entry>,
    order: BTreeMap<Tick, K>,
}

impl<K: Copy + Eq + Hash> LruCache<K> {
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            used_bytes: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, tag: &K) -> bool {
        self.entries.contains_key(tag)
    }

    /// Look up `tag`; on a hit, make it the most recently used entry as of `tick`.
    pub fn probe(&mut self, tag: K, tick: Tick) -> bool {
        let Some(entry) = self.entries.get_mut(&tag) else {
            return false;
        };
        debug_assert!(tick > entry.tick, "ticks must be strictly increasing");
        self.order.remove(&entry.tick);
        entry.tick = tick;
        self.order.insert(tick, tag);
        true
    }

    /// Insert `tag` as the most recently used entry, first evicting least recently used
    /// entries for as long as the insert would overflow the capacity. Returns the evicted
    /// tags with the tick they were last used on, oldest first.
    ///
    /// When all entries have the same size this evicts at most the single LRU entry. A and B
    /// operand tiles differ in size, so one fill of a large tile may have to drop several
    /// small ones before it fits.
    ///
    /// Callers only fill after a missed probe.
    pub fn fill(&mut self, tag: K, bytes: u64, tick: Tick) -> Vec<(K, Tick)> {
        debug_assert!(!self.entries.contains_key(&tag), "fill of a resident tag");
        let mut evicted = Vec::new();
        while self.used_bytes + bytes > self.capacity_bytes {
            match self.evict_lru() {
                Some(victim) => evicted.push(victim),
                None => break,
            }
        }
        self.entries.insert(tag, Entry { tick, bytes });
        self.order.insert(tick, tag);
        self.used_bytes += bytes;
        evicted
    }

    fn evict_lru(&mut self) -> Option<(K, Tick)> {
        let (tick, tag) = self.order.pop_first()?;
        if let Some(entry) = self.entries.remove(&tag) {
            self.used_bytes -= entry.bytes;
        }
        Some((tag, tick))
    }

}

#[cfg(test)]
mod tests {
    use super::LruCache;

    #[test]
    fn lru_hits_and_evicts() {
        let mut cache = LruCache::new(2);
        assert!(!cache.probe(0u32, 0));
        cache.fill(0, 1, 0);
        cache.fill(1, 1, 1);
        assert!(cache.probe(0, 2));
        let evicted = cache.fill(2, 1, 3);
        assert_eq!(evicted, vec![(1, 1)]);
        assert!(cache.probe(0, 4));
        assert!(!cache.probe(1, 5));
    }

    #[test]
    fn probe_returns_false_for_empty_cache() {
        let mut cache = LruCache::<u32>::new(64);
        assert!(!cache.probe(123, 0));
    }

    #[test]
    fn fill_to_exact_capacity_does_not_evict() {
        let mut cache = LruCache::new(8);
        assert!(cache.fill(1u32, 4, 0).is_empty());
        assert!(cache.fill(2, 4, 1).is_empty());
        assert_eq!(cache.used_bytes(), 8);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn large_fill_evicts_until_it_fits() {
        let mut cache = LruCache::new(8);
        cache.fill(1u32, 2, 0);
        cache.fill(2, 2, 1);
        cache.fill(3, 4, 2);
        let evicted = cache.fill(4, 6, 3);
        assert_eq!(evicted, vec![(1, 0), (2, 1), (3, 2)]);
        assert_eq!(cache.used_bytes(), 6);
    }

    #[test]
    fn single_entry_cache() {
        let mut cache = LruCache::new(1);
        cache.fill(1u32, 1, 0);
        assert!(cache.probe(1, 1));
        cache.fill(2, 1, 2);
        assert!(!cache.probe(1, 3));
        assert!(cache.probe(2, 4));
    }
}
