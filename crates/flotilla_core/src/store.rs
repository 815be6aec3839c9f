//! Fixed-capacity dense entity stores with swap-removal.
//!
//! [`DenseStore`] is the reusable container behind every entity array:
//! a dense `Vec` with a hard capacity, O(1) unordered removal (the last
//! live element is swapped into the vacated slot), and stable iteration
//! over `0..len`. Slot indices are NOT stable across removals; anything
//! that needs a persistent handle goes through [`ShipStore`], which pairs
//! the dense array with a [`SlotRegistry`] mapping IDs to current slots.

use serde::{Deserialize, Serialize};

use crate::components::{Ship, ShipId, ShipSpawnParams};
use crate::error::{Result, SimError};
use crate::math::{Fixed, Vec2Fixed};
use crate::registry::SlotRegistry;

/// A dense array with fixed capacity and swap-removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseStore<T> {
    items: Vec<T>,
    capacity: usize,
    what: String,
}

impl<T> DenseStore<T> {
    /// Create an empty store that holds at most `capacity` items.
    ///
    /// `what` names the store in capacity errors.
    #[must_use]
    pub fn new(what: &str, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            what: what.to_string(),
        }
    }

    /// Number of live items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an item at the end of the live range.
    ///
    /// Returns the slot index the item landed in.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the store is full.
    pub fn push(&mut self, item: T) -> Result<usize> {
        if self.items.len() >= self.capacity {
            return Err(SimError::CapacityExceeded {
                what: self.what.clone(),
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// Remove the item at `index` by swapping the last live item into its
    /// slot. Returns the removed item.
    ///
    /// Live-item order is not preserved. If the removed item was not last,
    /// the item previously at the end now lives at `index` - callers that
    /// track indices externally must repoint them.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn swap_remove(&mut self, index: usize) -> T {
        self.items.swap_remove(index)
    }

    /// Shared access to a slot.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable access to a slot.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// View the live items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// View the live items as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Iterate over the live items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterate mutably over the live items.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

/// The ship store: a [`DenseStore`] plus the stable-ID registry.
///
/// Invariant: every live ship has exactly one registry entry pointing at
/// its current slot. Swap-removal repoints the relocated ship's entry
/// before the destroyed ship's entry is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipStore {
    ships: DenseStore<Ship>,
    registry: SlotRegistry,
    next_id: ShipId,
}

impl ShipStore {
    /// Create an empty ship store.
    ///
    /// `registry_capacity` must be a power of two and should comfortably
    /// exceed `capacity` to keep probe chains short.
    #[must_use]
    pub fn new(capacity: usize, registry_capacity: usize) -> Self {
        Self {
            ships: DenseStore::new("ship store", capacity),
            registry: SlotRegistry::new(registry_capacity),
            next_id: 0,
        }
    }

    /// Number of live ships.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// Whether no ships are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// View the live ships as a slice, in dense slot order.
    #[must_use]
    pub fn as_slice(&self) -> &[Ship] {
        self.ships.as_slice()
    }

    /// View the live ships as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [Ship] {
        self.ships.as_mut_slice()
    }

    /// Spawn a new ship, assigning it the next ID.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the store or registry
    /// is full.
    pub fn spawn(&mut self, params: ShipSpawnParams) -> Result<ShipId> {
        if self.next_id >= ShipId::MAX - 1 {
            return Err(SimError::InvalidState(
                "ship ID counter exhausted".to_string(),
            ));
        }

        let id = self.next_id;
        let ship = Ship {
            id,
            team: params.team,
            position: params.position,
            rotation: Fixed::ZERO,
            size: params.size,
            velocity: Vec2Fixed::ZERO,
            health: params.health,
            fire_cooldown: params.fire_cooldown,
            fire_timer: Fixed::ZERO,
            move_order: None,
        };

        let index = self.ships.push(ship)?;
        if let Err(err) = self.registry.insert(id, index) {
            // Roll the array back so a full registry leaves the store
            // unchanged.
            self.ships.swap_remove(index);
            return Err(err);
        }

        self.next_id += 1;
        Ok(id)
    }

    /// Current slot index of a ship.
    #[must_use]
    pub fn index_of(&self, id: ShipId) -> Option<usize> {
        self.registry.find(id)
    }

    /// Look up a ship by ID.
    #[must_use]
    pub fn get(&self, id: ShipId) -> Option<&Ship> {
        let index = self.registry.find(id)?;
        let ship = self.ships.get(index);
        debug_assert!(
            ship.is_some(),
            "registry entry for live ship {id} points out of bounds"
        );
        ship
    }

    /// Look up a ship mutably by ID.
    pub fn get_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        let index = self.registry.find(id)?;
        self.ships.get_mut(index)
    }

    /// Destroy a ship by ID, compacting the array with swap-removal.
    ///
    /// Returns the destroyed ship.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShipNotFound`] if no ship has this ID.
    pub fn destroy(&mut self, id: ShipId) -> Result<Ship> {
        let index = self.registry.find(id).ok_or(SimError::ShipNotFound(id))?;

        let removed = self.ships.swap_remove(index);
        debug_assert_eq!(removed.id, id, "registry pointed at the wrong slot");

        // If another ship was relocated into the vacated slot, repoint its
        // registry entry BEFORE deleting the destroyed ship's entry. The
        // reverse order corrupts lookups for the relocated ship.
        if let Some(relocated) = self.ships.get(index) {
            let relocated_id = relocated.id;
            self.registry
                .update(relocated_id, index)
                .expect("relocated ship must have a registry entry");
        }

        self.registry
            .remove(id)
            .expect("destroyed ship had a registry entry a moment ago");

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Team;
    use crate::math::Fixed;

    fn params(x: i32) -> ShipSpawnParams {
        ShipSpawnParams {
            team: Team::Ally,
            position: Vec2Fixed::new(Fixed::from_num(x), Fixed::ZERO),
            size: Vec2Fixed::splat(Fixed::ONE),
            health: 5,
            fire_cooldown: Fixed::from_num(2),
        }
    }

    #[test]
    fn test_dense_store_push_and_capacity() {
        let mut store: DenseStore<u32> = DenseStore::new("test store", 2);

        assert_eq!(store.push(10).unwrap(), 0);
        assert_eq!(store.push(20).unwrap(), 1);
        assert!(matches!(
            store.push(30),
            Err(SimError::CapacityExceeded { capacity: 2, .. })
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_dense_store_swap_remove_relocates_last() {
        let mut store: DenseStore<u32> = DenseStore::new("test store", 4);
        store.push(10).unwrap();
        store.push(20).unwrap();
        store.push(30).unwrap();

        assert_eq!(store.swap_remove(0), 10);
        assert_eq!(store.as_slice(), &[30, 20]);
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut store = ShipStore::new(8, 16);

        assert_eq!(store.spawn(params(0)).unwrap(), 0);
        assert_eq!(store.spawn(params(1)).unwrap(), 1);
        assert_eq!(store.spawn(params(2)).unwrap(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_destroy_middle_keeps_all_others_reachable() {
        let mut store = ShipStore::new(8, 16);
        let ids: Vec<ShipId> = (0..5).map(|x| store.spawn(params(x)).unwrap()).collect();

        store.destroy(ids[1]).unwrap();

        assert_eq!(store.len(), 4);
        assert_eq!(store.get(ids[1]).map(|s| s.id), None);
        for &id in ids.iter().filter(|&&id| id != ids[1]) {
            let ship = store.get(id).expect("surviving ship must stay reachable");
            assert_eq!(ship.id, id);

            // Registry index must agree with the ship's actual slot.
            let index = store.index_of(id).unwrap();
            assert_eq!(store.as_slice()[index].id, id);
        }
    }

    #[test]
    fn test_destroy_last_does_not_relocate() {
        let mut store = ShipStore::new(8, 16);
        let a = store.spawn(params(0)).unwrap();
        let b = store.spawn(params(1)).unwrap();

        store.destroy(b).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.index_of(a), Some(0));
        assert_eq!(store.get(b).map(|s| s.id), None);
    }

    #[test]
    fn test_destroy_missing_fails() {
        let mut store = ShipStore::new(8, 16);
        assert!(matches!(
            store.destroy(99),
            Err(SimError::ShipNotFound(99))
        ));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = ShipStore::new(8, 16);
        let a = store.spawn(params(0)).unwrap();
        store.destroy(a).unwrap();

        let b = store.spawn(params(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_spawn_at_capacity_fails_cleanly() {
        let mut store = ShipStore::new(2, 16);
        store.spawn(params(0)).unwrap();
        store.spawn(params(1)).unwrap();

        assert!(matches!(
            store.spawn(params(2)),
            Err(SimError::CapacityExceeded { .. })
        ));
        assert_eq!(store.len(), 2);
    }
}
