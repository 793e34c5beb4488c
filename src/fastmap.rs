// Hash map aliases used throughout the package system.
//
// Symbol names are short strings looked up constantly, so everything hashes
// with Fx instead of SipHash.

use dashmap::DashMap;

pub use rustc_hash::FxBuildHasher as BuildHasher;

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

pub type HashSet<K> = rustc_hash::FxHashSet<K>;

/// Concurrent map: lock-free for readers on distinct shards.
pub type ConcurrentMap<K, V> = DashMap<K, V, BuildHasher>;

pub fn concurrent_map<K, V>(capacity: usize) -> ConcurrentMap<K, V>
where
    K: Eq + std::hash::Hash,
{
    DashMap::with_capacity_and_hasher(capacity, BuildHasher::default())
}
