//! Open-addressing hash table driven by callback tables.
//!
//! Layout
//! - One slot vector; each slot is empty, a tombstone, or an occupied entry
//!   holding its key, its value and the key's hash code.
//! - Capacity is always a power of two and probing is triangular
//!   (`hash + i(i+1)/2`), which visits every slot exactly once in
//!   `capacity` steps.
//!
//! Probing
//! - Lookups stop at the first empty slot; tombstones are stepped over.
//! - Inserts remember the first tombstone on the path and reuse it once the
//!   key is known to be absent.
//!
//! Growth
//! - Before an insert, if the live entries reached the configured load
//!   limit the capacity doubles; if live entries plus tombstones fill
//!   every slot the table is rehashed in place. Rehashing reuses stored
//!   hash codes and calls no user callbacks.

use crate::callbacks::CallbackTable;
use crate::config::TableConfig;
use crate::error::{ContainerError, Result};
use crate::hash::AsKeyBytes;
use crate::object::{impl_object, Class};
use crate::reentrancy::DebugReentrancy;
use core::cmp::Ordering;
use tracing::debug;

#[derive(Debug)]
enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied { hash: u64, key: K, value: V },
}

/// Arguments for [`HashTable`] initialization.
pub struct TableInit<K, V> {
    pub config: TableConfig,
    pub keys: CallbackTable<K>,
    pub values: CallbackTable<V>,
}

impl<K, V> Default for TableInit<K, V> {
    fn default() -> Self {
        Self {
            config: TableConfig::default(),
            keys: CallbackTable::NONE,
            values: CallbackTable::NONE,
        }
    }
}

/// Outcome of walking a key's probe sequence.
enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

pub struct HashTable<K, V> {
    slots: Vec<Slot<K, V>>,
    live: usize,
    tombstones: usize,
    config: TableConfig,
    key_callbacks: CallbackTable<K>,
    value_callbacks: CallbackTable<V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashTable<K, V>
where
    K: AsKeyBytes + 'static,
    V: 'static,
{
    /// Table with default config and callbacks.
    pub fn new() -> Result<Self> {
        Self::with_callbacks(TableConfig::default(), CallbackTable::NONE, CallbackTable::NONE)
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_callbacks(config, CallbackTable::NONE, CallbackTable::NONE)
    }

    pub fn with_callbacks(
        config: TableConfig,
        keys: CallbackTable<K>,
        values: CallbackTable<V>,
    ) -> Result<Self> {
        crate::object::construct::<Self>(TableInit {
            config,
            keys,
            values,
        })
    }
}

fn empty_slots<K, V>(capacity: usize) -> Result<Vec<Slot<K, V>>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| ContainerError::alloc(capacity, core::mem::size_of::<Slot<K, V>>()))?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}

/// Move every occupied slot into a fresh vector of `capacity` slots,
/// placing entries by their stored hash codes. Tombstones are dropped.
fn rehash_into<K, V>(
    slots: &mut Vec<Slot<K, V>>,
    capacity: usize,
    live: usize,
    tombstones: usize,
) -> Result<()> {
    debug_assert!(capacity.is_power_of_two() && capacity >= live);
    let fresh = empty_slots(capacity)?;
    let old = core::mem::replace(slots, fresh);
    debug!(
        from = old.len(),
        to = capacity,
        live,
        tombstones,
        "rehashing table"
    );
    let mask = capacity - 1;
    for slot in old {
        if let Slot::Occupied { hash, key, value } = slot {
            let mut step = 0;
            loop {
                let idx = probe_index(hash, step, mask);
                if matches!(slots[idx], Slot::Empty) {
                    slots[idx] = Slot::Occupied { hash, key, value };
                    break;
                }
                step += 1;
            }
        }
    }
    Ok(())
}

#[inline]
fn probe_index(hash: u64, step: usize, mask: usize) -> usize {
    // Triangular offsets: 0, 1, 3, 6, ...
    let offset = step.wrapping_mul(step.wrapping_add(1)) / 2;
    (hash as usize).wrapping_add(offset) & mask
}

impl<K, V> HashTable<K, V>
where
    K: AsKeyBytes,
{
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots cleared by `remove`/`take` and not yet reclaimed.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Walk `key`'s probe sequence.
    fn probe(&self, hash: u64, key: &K) -> Probe {
        let cap = self.slots.len();
        if cap == 0 {
            return Probe::Full;
        }
        let mask = cap - 1;
        let mut first_tombstone = None;
        for step in 0..cap {
            let idx = probe_index(hash, step, mask);
            match &self.slots[idx] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(idx);
                }
                Slot::Occupied { hash: h, key: k, .. } => {
                    if *h == hash && self.key_callbacks.keys_equal(k, key) {
                        return Probe::Found(idx);
                    }
                }
            }
        }
        match first_tombstone {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Full,
        }
    }

    fn find_index(&self, key: &K) -> Option<usize> {
        let hash = self.key_callbacks.hash_of(key);
        match self.probe(hash, key) {
            Probe::Found(idx) => Some(idx),
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    /// Value stored under `key`.
    pub fn find(&self, key: &K) -> Option<&V> {
        let _g = self.reentrancy.enter("find");
        let idx = self.find_index(key)?;
        match &self.slots[idx] {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let _g = self.reentrancy.enter("find_mut");
        let idx = self.find_index(key)?;
        drop(_g);
        match &mut self.slots[idx] {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let _g = self.reentrancy.enter("contains_key");
        self.find_index(key).is_some()
    }

    /// First value, in slot order, equal to `value` under the value
    /// callbacks' compare function. Scans every slot.
    pub fn find_by_value(&self, value: &V) -> Option<&V>
    where
        V: PartialEq,
    {
        let _g = self.reentrancy.enter("find_by_value");
        self.values().find(|v| self.value_callbacks.values_equal(v, value))
    }

    /// First value, in slot order, that the value compare callback reports
    /// equal to `value`. Works for value types without `PartialEq`; fails
    /// with [`ContainerError::MissingCallback`] when no compare is set.
    pub fn find_by_compare(&self, value: &V) -> Result<Option<&V>> {
        let _g = self.reentrancy.enter("find_by_compare");
        let cmp = self
            .value_callbacks
            .compare
            .ok_or(ContainerError::MissingCallback {
                role: "value compare",
            })?;
        Ok(self.values().find(|v| cmp(v, value) == Ordering::Equal))
    }

    /// Store copies of `key` and `value`, replacing any entry whose key
    /// compares equal. A replaced entry's key and value go through the free
    /// callbacks. Returns the stored value.
    pub fn insert(&mut self, key: &K, value: &V) -> Result<&V>
    where
        K: Clone,
        V: Clone,
    {
        let hash = {
            let _g = self.reentrancy.enter("insert");
            self.key_callbacks.hash_of(key)
        };
        self.insert_with_hash(key, value, hash)
    }

    /// [`insert`](Self::insert) under a hash code the caller already
    /// computed. Lookups reach the entry only when the key callbacks hash
    /// the key to the same code.
    pub fn insert_with_hash(&mut self, key: &K, value: &V, hash: u64) -> Result<&V>
    where
        K: Clone,
        V: Clone,
    {
        let g = self.reentrancy.enter("insert_with_hash");
        let cap = self.slots.len();
        let target = if cap == 0 {
            self.config.slot_count()?
        } else if self.live >= self.config.load_limit(cap) {
            cap.checked_mul(2)
                .ok_or(ContainerError::alloc(usize::MAX, 1))?
        } else if self.live + self.tombstones >= cap {
            cap
        } else {
            0
        };
        if target != 0 {
            rehash_into(&mut self.slots, target, self.live, self.tombstones)?;
            self.tombstones = 0;
        }

        let entry = Slot::Occupied {
            hash,
            key: self.key_callbacks.duplicate(key),
            value: self.value_callbacks.duplicate(value),
        };
        let idx = match self.probe(hash, key) {
            Probe::Found(idx) => {
                // Store first; a free callback may unwind.
                let old = core::mem::replace(&mut self.slots[idx], entry);
                if let Slot::Occupied { key, value, .. } = old {
                    self.key_callbacks.release(key);
                    self.value_callbacks.release(value);
                }
                idx
            }
            Probe::Vacant(idx) => {
                if matches!(self.slots[idx], Slot::Tombstone) {
                    self.tombstones -= 1;
                }
                self.slots[idx] = entry;
                self.live += 1;
                idx
            }
            // The growth check above leaves at least one empty or
            // tombstoned slot.
            Probe::Full => unreachable!("hash table full after growth check"),
        };
        drop(g);
        match &self.slots[idx] {
            Slot::Occupied { value, .. } => Ok(value),
            _ => unreachable!(),
        }
    }

    /// Remove `key`'s entry, passing key and value to their free callbacks.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        let (k, v) = self.take(key).ok_or(ContainerError::KeyNotFound)?;
        let _g = self.reentrancy.enter("remove");
        self.key_callbacks.release(k);
        self.value_callbacks.release(v);
        Ok(())
    }

    /// Remove `key`'s entry and return it without running free callbacks.
    pub fn take(&mut self, key: &K) -> Option<(K, V)> {
        let _g = self.reentrancy.enter("take");
        let idx = self.find_index(key)?;
        match core::mem::replace(&mut self.slots[idx], Slot::Tombstone) {
            Slot::Occupied { key, value, .. } => {
                self.live -= 1;
                self.tombstones += 1;
                Some((key, value))
            }
            other => {
                self.slots[idx] = other;
                None
            }
        }
    }

    /// Grow to at least `count` slots. A `count` below the live entry count
    /// asks for twice the live count instead.
    pub fn reserve(&mut self, count: usize) -> Result<()> {
        let _g = self.reentrancy.enter("reserve");
        let count = if count < self.live {
            self.live.saturating_mul(2)
        } else {
            count
        };
        if count <= self.slots.len() {
            return Ok(());
        }
        let capacity = count
            .checked_next_power_of_two()
            .ok_or(ContainerError::alloc(count, core::mem::size_of::<Slot<K, V>>()))?;
        rehash_into(&mut self.slots, capacity, self.live, self.tombstones)?;
        self.tombstones = 0;
        Ok(())
    }

    /// Release every entry through the free callbacks; capacity is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        for slot in self.slots.iter_mut() {
            if let Slot::Occupied { key, value, .. } = core::mem::replace(slot, Slot::Empty) {
                self.key_callbacks.release(key);
                self.value_callbacks.release(value);
            }
        }
        self.live = 0;
        self.tombstones = 0;
    }

    /// Entries in slot order (not insertion order).
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Destructor: release all entries and the slot storage.
    pub fn release(&mut self) {
        self.clear();
        self.slots = Vec::new();
    }
}

impl<K, V> Class for HashTable<K, V>
where
    K: AsKeyBytes + 'static,
    V: 'static,
{
    const NAME: &'static str = "HashTable";
    const PROTOTYPE: Self = HashTable {
        slots: Vec::new(),
        live: 0,
        tombstones: 0,
        config: TableConfig::new(TableConfig::DEFAULT_INITIAL_CAPACITY),
        key_callbacks: CallbackTable::NONE,
        value_callbacks: CallbackTable::NONE,
        reentrancy: DebugReentrancy::new(),
    };
    type Args<'a> = TableInit<K, V>;

    fn init(&mut self, args: TableInit<K, V>) -> Result<()> {
        args.config.validate()?;
        let capacity = args.config.slot_count()?;
        self.slots = empty_slots(capacity)?;
        self.config = args.config;
        self.key_callbacks = args.keys;
        self.value_callbacks = args.values;
        Ok(())
    }
}

impl_object!(HashTable<K, V> where K: AsKeyBytes + 'static, V: 'static);

impl<K, V> Drop for HashTable<K, V> {
    fn drop(&mut self) {
        for slot in self.slots.drain(..) {
            if let Slot::Occupied { key, value, .. } = slot {
                self.key_callbacks.release(key);
                self.value_callbacks.release(value);
            }
        }
    }
}

impl<'a, K: AsKeyBytes, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over live entries in slot order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.by_ref().find_map(|slot| match slot {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        })
    }
}

/// Iterator over live entries with mutable values.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.by_ref().find_map(|slot| match slot {
            Slot::Occupied { key, value, .. } => Some((&*key, value)),
            _ => None,
        })
    }
}
