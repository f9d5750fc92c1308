//! Key-stabilizing cache for collected metrics.
//!
//! Once a key has been reported it keeps appearing in every later
//! [`MetricSet`], carrying its last known value, so series never vanish and
//! reappear between polls.

use crate::MetricSet;

/// Last published metric set, used for gap filling.
#[derive(Debug, Clone, Default)]
pub struct MetricCache {
    last: MetricSet,
}

impl MetricCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `fresh` into the known key space and returns the full set.
    ///
    /// Keys in `fresh` take their new value; every other known key keeps its
    /// previous one. The returned map is a new allocation, never shared with
    /// the cache.
    pub fn stabilize(&mut self, fresh: MetricSet) -> MetricSet {
        let mut merged = self.last.clone();
        merged.extend(fresh);
        self.last = merged.clone();
        merged
    }

    /// Value last published for `key`.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.last.get(key).copied()
    }

    pub fn known_keys(&self) -> impl Iterator<Item = &str> {
        self.last.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, i64)]) -> MetricSet {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_first_stabilize_passes_through() {
        let mut cache = MetricCache::new();
        let out = cache.stabilize(set(&[("num.queries", 10)]));
        assert_eq!(out, set(&[("num.queries", 10)]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_absent_key_keeps_previous_value() {
        let mut cache = MetricCache::new();
        cache.stabilize(set(&[("num.queries", 10), ("num.tcp", 4)]));

        let out = cache.stabilize(set(&[("num.queries", 15)]));

        assert_eq!(out["num.queries"], 15);
        assert_eq!(out["num.tcp"], 4);
        assert_eq!(cache.get("num.tcp"), Some(4));
    }

    #[test]
    fn test_new_keys_join_the_key_space() {
        let mut cache = MetricCache::new();
        cache.stabilize(set(&[("num.queries", 1)]));
        let out = cache.stabilize(set(&[("num.udp", 2)]));

        assert_eq!(out.len(), 2);
        let mut keys: Vec<&str> = cache.known_keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["num.queries", "num.udp"]);
    }

    #[test]
    fn test_clear() {
        let mut cache = MetricCache::new();
        cache.stabilize(set(&[("num.queries", 1)]));
        cache.clear();
        assert!(cache.is_empty());
    }
}
