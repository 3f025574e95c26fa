//! Open-addressed map objects.
//!
//! The map is a flat slot array with linear probing: each slot holds a
//! `(hash, key, value)` triple and an `Undef` key marks an empty slot. The
//! iteration protocol walks this slot array directly, so iteration order is
//! slot order, not insertion order, and the iterator index is opaque to
//! callers.
//!
//! Lookup needs read access to other heap entries (string keys compare by
//! content), while mutation needs exclusive access to the map itself, so
//! probing and writing are split: [`Map::probe`] runs with shared borrows
//! and returns a slot index, and the caller re-borrows mutably to write
//! that slot.

use crate::{
    heap::{Heap, HeapData},
    resource::ResourceTracker,
    value::Value,
};

/// Capacity of the first non-empty slot array. Always a power of two.
const MIN_CAPACITY: usize = 8;

/// One slot of the backing array. `key == Undef` marks an empty slot.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub(crate) hash: u64,
    pub(crate) key: Value,
    pub(crate) value: Value,
}

impl Slot {
    const EMPTY: Self = Self {
        hash: 0,
        key: Value::Undef,
        value: Value::Undef,
    };

    /// Whether this slot holds an entry.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        !matches!(self.key, Value::Undef)
    }

    /// The stored key. `Undef` when the slot is empty.
    #[must_use]
    pub fn key(&self) -> Value {
        self.key
    }

    /// The stored value. `Undef` when the slot is empty.
    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }
}

/// Result of probing for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The key is present at this slot index.
    Found(usize),
    /// The key is absent; this is the slot an insert would claim.
    Vacant(usize),
}

/// An open-addressed mapping from hashable values to values.
#[derive(Debug, Default, Clone)]
pub struct Map {
    slots: Vec<Slot>,
    len: usize,
}

impl Map {
    /// Creates an empty map. The slot array is allocated lazily on first
    /// insert.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing slot array (the iteration domain).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The slot at `index`, if the index is inside the backing array.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Iterates occupied slots in slot order.
    pub fn entries(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.is_occupied())
            .map(|slot| (slot.key, slot.value))
    }

    /// Grows the slot array if an insert could push the load factor above
    /// 3/4. Must be called before [`Map::probe`] when inserting, so probe
    /// indices stay valid for the commit.
    pub(crate) fn reserve_for_insert(&mut self) {
        if self.slots.is_empty() {
            self.slots = vec![Slot::EMPTY; MIN_CAPACITY];
            return;
        }
        if (self.len + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, vec![Slot::EMPTY; new_capacity]);
        let mask = new_capacity - 1;
        for slot in old {
            if !slot.is_occupied() {
                continue;
            }
            // Keys are unique, so rehashing only needs the first empty slot.
            let mut index = (slot.hash as usize) & mask;
            while self.slots[index].is_occupied() {
                index = (index + 1) & mask;
            }
            self.slots[index] = slot;
        }
    }

    /// Probes for `key` with the given hash. Requires a non-empty slot
    /// array (see [`Map::reserve_for_insert`]) when used for insertion;
    /// lookups on an empty map should short-circuit on `capacity() == 0`.
    pub(crate) fn probe<T: ResourceTracker>(&self, key: Value, key_hash: u64, heap: &Heap<T>) -> Probe {
        debug_assert!(!self.slots.is_empty(), "probe on an unallocated slot array");
        let mask = self.slots.len() - 1;
        let mut index = (key_hash as usize) & mask;
        loop {
            let slot = &self.slots[index];
            if !slot.is_occupied() {
                return Probe::Vacant(index);
            }
            if slot.hash == key_hash && key_eq(slot.key, key, heap) {
                return Probe::Found(index);
            }
            index = (index + 1) & mask;
        }
    }

    /// Looks up a string key by content without allocating a key object.
    /// Used by attribute access, where the attribute name doubles as a map
    /// key.
    #[must_use]
    pub(crate) fn get_by_str<T: ResourceTracker>(&self, name: &str, heap: &Heap<T>) -> Option<Value> {
        if self.slots.is_empty() {
            return None;
        }
        let key_hash = crate::hash::hash_str(name);
        let mask = self.slots.len() - 1;
        let mut index = (key_hash as usize) & mask;
        loop {
            let slot = &self.slots[index];
            if !slot.is_occupied() {
                return None;
            }
            if slot.hash == key_hash
                && let Value::Ref(id) = slot.key
                && let HeapData::Str(s) = heap.get(id)
                && s.as_str() == name
            {
                return Some(slot.value);
            }
            index = (index + 1) & mask;
        }
    }

    /// Looks up a key, given its hash.
    #[must_use]
    pub(crate) fn get<T: ResourceTracker>(&self, key: Value, key_hash: u64, heap: &Heap<T>) -> Option<Value> {
        if self.slots.is_empty() {
            return None;
        }
        match self.probe(key, key_hash, heap) {
            Probe::Found(index) => Some(self.slots[index].value),
            Probe::Vacant(_) => None,
        }
    }

    /// Commits an entry to a slot index returned by [`Map::probe`].
    pub(crate) fn commit(&mut self, probe: Probe, key_hash: u64, key: Value, value: Value) {
        match probe {
            Probe::Found(index) => self.slots[index].value = value,
            Probe::Vacant(index) => {
                self.slots[index] = Slot {
                    hash: key_hash,
                    key,
                    value,
                };
                self.len += 1;
            }
        }
    }

    /// Estimated heap footprint in bytes.
    #[must_use]
    pub(crate) fn estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.slots.capacity() * std::mem::size_of::<Slot>()
    }
}

/// Key equality as maps see it.
///
/// Numbers and booleans compare by coerced numeric value (so `true`, `1`,
/// and `1.0` are one key), strings by content, ranges by endpoints. This is
/// intentionally narrower than script-level equality, which belongs to the
/// interpreter.
pub(crate) fn key_eq<T: ResourceTracker>(a: Value, b: Value, heap: &Heap<T>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(_) | Value::Num(_), Value::Bool(_) | Value::Num(_)) => {
            let (Some(x), Some(y)) = (a.as_number(), b.as_number()) else {
                return false;
            };
            x == y
        }
        (Value::Ref(id_a), Value::Ref(id_b)) => {
            if id_a == id_b {
                return true;
            }
            match (heap.get(id_a), heap.get(id_b)) {
                (HeapData::Str(s1), HeapData::Str(s2)) => s1.hash() == s2.hash() && s1.as_str() == s2.as_str(),
                (HeapData::Range(r1), HeapData::Range(r2)) => r1.from == r2.from && r1.to == r2.to,
                _ => false,
            }
        }
        _ => false,
    }
}
