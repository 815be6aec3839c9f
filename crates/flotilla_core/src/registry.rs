//! Stable-ID registry: a fixed-capacity open-addressing map from
//! persistent ship IDs to their current dense-array slot.
//!
//! Entity stores compact themselves with swap-removal, so an entity's
//! array index changes over its lifetime while its ID never does. The
//! registry is the one place that translation lives. It never owns the
//! entities it indexes.
//!
//! The hash is the identity function on the key (a known weakness - IDs
//! are issued sequentially, so clustering stays mild in practice) with
//! linear probing. Deleted buckets become tombstones so that probe chains
//! survive arbitrary insert/remove interleavings; inserts reuse the first
//! tombstone on their probe path. There is no resize: capacity is fixed at
//! construction and must comfortably exceed the peak live-entity count.

use serde::{Deserialize, Serialize};

use crate::components::ShipId;
use crate::error::{Result, SimError};

/// Bucket key marking a never-occupied slot. Probes stop here.
const EMPTY_KEY: ShipId = ShipId::MAX;

/// Bucket key marking a deleted slot. Probes continue past here.
const DELETED_KEY: ShipId = ShipId::MAX - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Bucket {
    key: ShipId,
    value: usize,
}

/// Fixed-capacity open-addressing ID-to-index map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRegistry {
    buckets: Vec<Bucket>,
    len: usize,
}

impl SlotRegistry {
    /// Create a registry with the given bucket count.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or not a power of two (the bucket
    /// index is computed with a mask).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "registry capacity must be positive");
        assert!(
            capacity.is_power_of_two(),
            "registry capacity must be a power of two"
        );

        Self {
            buckets: vec![
                Bucket {
                    key: EMPTY_KEY,
                    value: 0,
                };
                capacity
            ],
            len: 0,
        }
    }

    /// Number of live entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the registry holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    // Identity hash: the ID counter is sequential, so the low bits are
    // already well distributed over a power-of-two table.
    #[inline]
    fn bucket_of(&self, key: ShipId) -> usize {
        (key as usize) & (self.buckets.len() - 1)
    }

    /// Find the bucket index holding `key`, or `None`.
    fn probe(&self, key: ShipId) -> Option<usize> {
        let mask = self.buckets.len() - 1;
        let mut index = self.bucket_of(key);

        for _ in 0..self.buckets.len() {
            let bucket = &self.buckets[index];
            if bucket.key == EMPTY_KEY {
                return None;
            }
            if bucket.key == key {
                return Some(index);
            }
            index = (index + 1) & mask;
        }

        None
    }

    /// Insert a `(key, value)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicateShipId`] if `key` is already present,
    /// or [`SimError::CapacityExceeded`] if every bucket is occupied.
    pub fn insert(&mut self, key: ShipId, value: usize) -> Result<()> {
        debug_assert!(key != EMPTY_KEY && key != DELETED_KEY, "reserved key");

        if self.probe(key).is_some() {
            return Err(SimError::DuplicateShipId(key));
        }

        let mask = self.buckets.len() - 1;
        let mut index = self.bucket_of(key);

        for _ in 0..self.buckets.len() {
            let bucket = &mut self.buckets[index];
            if bucket.key == EMPTY_KEY || bucket.key == DELETED_KEY {
                bucket.key = key;
                bucket.value = value;
                self.len += 1;
                return Ok(());
            }
            index = (index + 1) & mask;
        }

        Err(SimError::CapacityExceeded {
            what: "ship ID registry".to_string(),
            capacity: self.buckets.len(),
        })
    }

    /// Look up the slot index stored under `key`.
    #[must_use]
    pub fn find(&self, key: ShipId) -> Option<usize> {
        self.probe(key).map(|index| self.buckets[index].value)
    }

    /// Repoint an existing entry at a new slot index.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShipNotFound`] if `key` is absent.
    pub fn update(&mut self, key: ShipId, value: usize) -> Result<()> {
        let index = self.probe(key).ok_or(SimError::ShipNotFound(key))?;
        self.buckets[index].value = value;
        Ok(())
    }

    /// Remove the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShipNotFound`] if `key` is absent.
    pub fn remove(&mut self, key: ShipId) -> Result<()> {
        let index = self.probe(key).ok_or(SimError::ShipNotFound(key))?;
        self.buckets[index] = Bucket {
            key: DELETED_KEY,
            value: 0,
        };
        self.len -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_find_remove() {
        let mut registry = SlotRegistry::new(16);

        registry.insert(7, 3).unwrap();
        assert_eq!(registry.find(7), Some(3));
        assert_eq!(registry.len(), 1);

        registry.remove(7).unwrap();
        assert_eq!(registry.find(7), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut registry = SlotRegistry::new(16);

        registry.insert(1, 0).unwrap();
        assert!(matches!(
            registry.insert(1, 5),
            Err(SimError::DuplicateShipId(1))
        ));
        // Original value untouched
        assert_eq!(registry.find(1), Some(0));
    }

    #[test]
    fn test_remove_missing_fails() {
        let mut registry = SlotRegistry::new(16);
        assert!(matches!(
            registry.remove(42),
            Err(SimError::ShipNotFound(42))
        ));
    }

    #[test]
    fn test_update_repoints_entry() {
        let mut registry = SlotRegistry::new(16);

        registry.insert(9, 2).unwrap();
        registry.update(9, 0).unwrap();
        assert_eq!(registry.find(9), Some(0));
    }

    #[test]
    fn test_colliding_keys_probe_linearly() {
        let mut registry = SlotRegistry::new(8);

        // 1, 9 and 17 all land in bucket 1
        registry.insert(1, 10).unwrap();
        registry.insert(9, 20).unwrap();
        registry.insert(17, 30).unwrap();

        assert_eq!(registry.find(1), Some(10));
        assert_eq!(registry.find(9), Some(20));
        assert_eq!(registry.find(17), Some(30));
    }

    #[test]
    fn test_removal_does_not_break_probe_chain() {
        let mut registry = SlotRegistry::new(8);

        registry.insert(1, 10).unwrap();
        registry.insert(9, 20).unwrap();

        // Removing the head of the cluster must leave the collided
        // entry reachable through the tombstone.
        registry.remove(1).unwrap();
        assert_eq!(registry.find(9), Some(20));
        assert_eq!(registry.find(1), None);
    }

    #[test]
    fn test_tombstone_is_reused() {
        let mut registry = SlotRegistry::new(8);

        registry.insert(1, 10).unwrap();
        registry.insert(9, 20).unwrap();
        registry.remove(1).unwrap();

        // 17 hashes into the same cluster and should claim the tombstone.
        registry.insert(17, 30).unwrap();
        assert_eq!(registry.find(17), Some(30));
        assert_eq!(registry.find(9), Some(20));
    }

    #[test]
    fn test_full_registry_rejects_insert() {
        let mut registry = SlotRegistry::new(4);

        for key in 0..4 {
            registry.insert(key, key as usize).unwrap();
        }

        assert!(matches!(
            registry.insert(4, 4),
            Err(SimError::CapacityExceeded { .. })
        ));
    }

    proptest! {
        /// Any interleaving of inserts and removes preserves the map laws:
        /// present keys resolve to their latest value, absent keys miss.
        #[test]
        fn prop_registry_matches_model(ops in proptest::collection::vec(
            (0u32..64, 0usize..256, proptest::bool::ANY),
            0..200,
        )) {
            let mut registry = SlotRegistry::new(128);
            let mut model = std::collections::HashMap::new();

            for (key, value, is_insert) in ops {
                if is_insert {
                    if model.contains_key(&key) {
                        prop_assert!(registry.insert(key, value).is_err());
                    } else {
                        registry.insert(key, value).unwrap();
                        model.insert(key, value);
                    }
                } else if model.remove(&key).is_some() {
                    registry.remove(key).unwrap();
                } else {
                    prop_assert!(registry.remove(key).is_err());
                }
            }

            for (key, value) in &model {
                prop_assert_eq!(registry.find(*key), Some(*value));
            }
            prop_assert_eq!(registry.len(), model.len());
        }
    }
}
