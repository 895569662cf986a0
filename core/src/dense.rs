//! Sparse-to-dense materialization shared by the rollforward and the
//! reconciliation cube.
//!
//! Grouped SQL aggregates are sparse: a key with no matching rows simply does
//! not appear. Financial reconciliation needs the absence of expected
//! activity visible as an explicit zero, so both engines collect their
//! grouped maps first, take the full key union, and then read every (map,
//! key) cell through a zero default.

use std::collections::{BTreeMap, BTreeSet};

/// The full key set across any number of sparse maps.
pub fn key_union<K: Ord + Clone>(maps: &[&BTreeMap<K, f64>]) -> BTreeSet<K> {
    let mut keys = BTreeSet::new();
    for map in maps {
        keys.extend(map.keys().cloned());
    }
    keys
}

/// Cell read with zero default. A missing aggregate is zero exposure,
/// never an error.
pub fn at<K: Ord>(map: &BTreeMap<K, f64>, key: &K) -> f64 {
    map.get(key).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn union_spans_all_maps() {
        let a = map(&[("X", 1.0)]);
        let b = map(&[("Y", 2.0)]);
        let c = map(&[("X", 3.0), ("Z", 4.0)]);
        let keys = key_union(&[&a, &b, &c]);
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["X".to_string(), "Y".to_string(), "Z".to_string()]
        );
    }

    #[test]
    fn absent_cells_read_as_zero() {
        let a = map(&[("X", 1.5)]);
        assert_eq!(at(&a, &"X".to_string()), 1.5);
        assert_eq!(at(&a, &"Y".to_string()), 0.0);
    }
}
