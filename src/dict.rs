//! The Dictionary: the public surface that composes the Entry Vector
//! and Hash Index into an insertion-ordered, open-addressed
//! associative container.

use crate::entry::{Entry, EntryVector};
use crate::error::{DictError, Result};
use crate::hash::DictKey;
use crate::index::{HashIndex, DUMMY, EMPTY};
use crate::views::{ItemsView, KeysView, ValuesView};

const MINSIZE: usize = 8;
/// `usable(MINSIZE)`, named so a fresh dictionary's initial free count
/// doesn't read as a magic number.
const MIN_NUM_ENT: usize = 5;

fn usable(capacity: usize) -> usize {
    (2 * capacity) / 3
}

fn next_capacity(min: usize) -> Result<usize> {
    min.max(MINSIZE)
        .checked_next_power_of_two()
        .ok_or(DictError::CapacityOverflow)
}

/// `ceil((3n+1)/2)`: the presizing estimate used to pick a starting
/// capacity for `n` entries.
fn estimate_size(n: usize) -> usize {
    (3 * n + 2) / 2
}

/// What happened on a successful [`Dict::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new entry was appended.
    Inserted,
    /// An existing key's value was overwritten.
    Replaced,
}

/// Bulk-construction knobs for [`Dict::create_initialized_with_config`].
#[derive(Debug, Clone, Copy)]
pub struct DictConfig {
    /// Presize the entry vector tightly to the input length instead of
    /// leaving the default 1.5x growth headroom `with_capacity` uses.
    pub reserve_exact: bool,
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            reserve_exact: false,
        }
    }
}

enum Lookup {
    Hit(usize),
    Miss,
}

fn find_first_empty_or_dummy(index: &HashIndex, hash: u64) -> usize {
    let mut probe = index.probe(hash);
    loop {
        let slot = probe.slot();
        let v = index.get(slot);
        if v == EMPTY || v == DUMMY {
            return slot;
        }
        probe.advance();
    }
}

/// An insertion-ordered, open-addressed map from `K` to `V`.
///
/// See the crate-level docs for the split entry-vector / hash-index
/// design. `K` must implement [`DictKey`]; most mutating operations
/// additionally require `V: PartialEq` (to detect a no-op re-insert of
/// an identical value) or `Clone` (to materialize snapshot views and
/// deep copies).
pub struct Dict<K, V> {
    entries: EntryVector<K, V>,
    index: HashIndex,
    active_count: usize,
    free_count: usize,
}

impl<K: DictKey, V> Dict<K, V> {
    /// An empty dictionary at `MINSIZE` capacity.
    pub fn new() -> Self {
        debug_assert_eq!(MIN_NUM_ENT, usable(MINSIZE));
        Self {
            entries: EntryVector::new(),
            index: HashIndex::new(MINSIZE),
            active_count: 0,
            free_count: MIN_NUM_ENT,
        }
    }

    /// A dictionary presized to hold `n` entries without resizing.
    pub fn with_capacity(n: usize) -> Result<Self> {
        let capacity = next_capacity(estimate_size(n))?;
        Ok(Self {
            entries: EntryVector::with_capacity(n + n / 2),
            index: HashIndex::new(capacity),
            active_count: 0,
            free_count: usable(capacity),
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.active_count
    }

    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Current Hash Index capacity. Always a power of two `>= MINSIZE`.
    pub fn allocated(&self) -> usize {
        self.index.capacity()
    }

    /// Entries plus tombstones.
    pub fn used(&self) -> usize {
        self.entries.used()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match self.lookup(key.dict_hash(), key) {
            Lookup::Hit(position) => self.entries.get(position).value.as_ref(),
            Lookup::Miss => None,
        }
    }

    /// The `(key, value)` pair on hit; `None` on miss.
    pub fn get_item(&self, key: &K) -> Option<(&K, &V)> {
        match self.lookup(key.dict_hash(), key) {
            Lookup::Hit(position) => {
                let entry = self.entries.get(position);
                entry.value.as_ref().map(|v| (&entry.key, v))
            }
            Lookup::Miss => None,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match self.lookup(key.dict_hash(), key) {
            Lookup::Hit(position) => self.entries.get(position).value.is_some(),
            Lookup::Miss => false,
        }
    }

    /// Locate `key` via `5*i + perturb + 1` probing. DUMMY slots are
    /// skipped.
    fn lookup(&self, hash: u64, key: &K) -> Lookup {
        let mut probe = self.index.probe(hash);
        loop {
            let slot = probe.slot();
            let v = self.index.get(slot);
            if v == EMPTY {
                return Lookup::Miss;
            }
            if v != DUMMY {
                let entry = self.entries.get(v as usize);
                if entry.hash == hash && entry.key == *key {
                    return Lookup::Hit(v as usize);
                }
            }
            probe.advance();
        }
    }

    /// Re-walk the probe sequence to find the Hash Index slot that
    /// stores exactly `position` (probe collisions mean `position` is
    /// not necessarily at `hash & mask`).
    fn lookdict_index(&self, hash: u64, position: usize) -> usize {
        let mut probe = self.index.probe(hash);
        loop {
            let slot = probe.slot();
            if self.index.get(slot) == position as i64 {
                return slot;
            }
            probe.advance();
        }
    }

    /// Remove `key`. The Entry Vector slot is retained as a tombstone;
    /// positions of every other entry stay stable.
    pub fn delete(&mut self, key: &K) -> Result<()> {
        let hash = key.dict_hash();
        let position = match self.lookup(hash, key) {
            Lookup::Miss => return Err(DictError::KeyNotFound),
            Lookup::Hit(position) => position,
        };
        if self.entries.get(position).value.is_none() {
            return Err(DictError::KeyNotFound);
        }
        let slot = self.lookdict_index(hash, position);
        self.index.set(slot, DUMMY);
        self.entries.clear_at(position);
        self.active_count -= 1;
        Ok(())
    }

    /// Drop all entries and reset the Hash Index to `MINSIZE`,
    /// all-EMPTY.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = HashIndex::new(MINSIZE);
        self.active_count = 0;
        self.free_count = MIN_NUM_ENT;
    }

    /// Insert or overwrite `key`. `value` is moved in as-is
    /// (`Some`/`None` distinguish a live entry from a pre-tombstoned
    /// one; only [`Dict::insert`] and bulk construction from `None`
    /// values use the `None` path).
    fn insert_entry(&mut self, key: K, value: Option<V>) -> Result<InsertOutcome>
    where
        V: PartialEq,
    {
        let hash = key.dict_hash();
        match self.lookup(hash, &key) {
            Lookup::Hit(position) => {
                let was_live = self.entries.get(position).value.is_some();
                let entry = self.entries.get_mut(position);
                if entry.value == value {
                    return Err(DictError::DuplicateInsert);
                }
                entry.value = value;
                let now_live = entry.value.is_some();
                if !was_live && now_live {
                    self.active_count += 1;
                } else if was_live && !now_live {
                    self.active_count -= 1;
                }
                Ok(InsertOutcome::Replaced)
            }
            Lookup::Miss => {
                if self.free_count == 0 {
                    self.resize_for_growth("insert exhausted free_count");
                }
                let is_live = value.is_some();
                let position = self.entries.append(Entry { hash, key, value });
                let slot = find_first_empty_or_dummy(&self.index, hash);
                self.index.set(slot, position as i64);
                self.free_count -= 1;
                if is_live {
                    self.active_count += 1;
                }
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    /// Insert `(key, value)`. Returns [`DictError::DuplicateInsert`]
    /// as a no-op report when an identical `(key, value)` pair already
    /// exists, not a failure callers typically need to propagate.
    pub fn insert(&mut self, key: K, value: V) -> Result<InsertOutcome>
    where
        V: PartialEq,
    {
        self.insert_entry(key, Some(value))
    }

    fn resize(&mut self, new_capacity: usize, reason: &'static str) {
        let old_capacity = self.index.capacity();
        tracing::debug!(reason, old_capacity, new_capacity, "hash index resize triggered");
        let mut new_index = HashIndex::new(new_capacity);
        for (position, entry) in self.entries.iter() {
            if entry.value.is_none() {
                continue;
            }
            let slot = find_first_empty_or_dummy(&new_index, entry.hash);
            new_index.set(slot, position as i64);
        }
        self.index = new_index;
        self.free_count = usable(new_capacity) - self.active_count;
        tracing::trace!(
            old_capacity,
            new_capacity,
            active_count = self.active_count,
            "hash index rebuilt"
        );
    }

    fn resize_for_growth(&mut self, reason: &'static str) {
        let grow_target = (self.active_count * 3).max(MINSIZE);
        // Falls back to the largest representable power of two.
        let new_capacity = grow_target
            .checked_next_power_of_two()
            .unwrap_or(1usize << (usize::BITS - 1));
        self.resize(new_capacity, reason);
    }
}

impl<K: DictKey, V> Default for Dict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: DictKey + Clone, V: Clone + PartialEq> Dict<K, V> {
    /// Presized, then populated from parallel key/value slices in
    /// order. `values = None` creates every entry pre-tombstoned.
    pub fn create_initialized(keys: &[K], values: Option<&[V]>) -> Result<Self> {
        Self::create_initialized_with_config(keys, values, DictConfig::default())
    }

    pub fn create_initialized_with_config(
        keys: &[K],
        values: Option<&[V]>,
        config: DictConfig,
    ) -> Result<Self> {
        if let Some(values) = values {
            assert_eq!(keys.len(), values.len(), "keys and values must be the same length");
        }
        let n = keys.len();
        let capacity = next_capacity(estimate_size(n))?;
        let mut dict = Self {
            entries: if config.reserve_exact {
                EntryVector::with_capacity(n)
            } else {
                EntryVector::with_capacity(n + n / 2)
            },
            index: HashIndex::new(capacity),
            active_count: 0,
            free_count: usable(capacity),
        };
        for i in 0..n {
            let value = values.map(|vs| vs[i].clone());
            match dict.insert_entry(keys[i].clone(), value) {
                Ok(_) | Err(DictError::DuplicateInsert) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(dict)
    }

    /// Deep copy: entries duplicated, value handles shared via
    /// `V::clone`.
    pub fn copy(&self) -> Self {
        Self {
            entries: self.entries.deep_copy(),
            index: self.index.clone(),
            active_count: self.active_count,
            free_count: self.free_count,
        }
    }

    /// Insert every live entry of `other` into `self`. Existing keys
    /// are skipped unless `override_existing`.
    pub fn update(&mut self, other: &Self, override_existing: bool) -> Result<()> {
        let snapshot_active = other.active_count;

        if usable(self.index.capacity()) < self.entries.used() + other.active_count {
            let combined = self.active_count + other.active_count;
            let new_capacity = next_capacity(combined.max(MINSIZE) * 3)?;
            self.resize(new_capacity, "update: presizing for merge");
        }

        for (_, entry) in other.entries.iter() {
            let Some(value) = &entry.value else {
                continue;
            };
            if other.active_count != snapshot_active {
                return Err(DictError::ConcurrentMutation);
            }
            if !override_existing && self.contains(&entry.key) {
                continue;
            }
            match self.insert_entry(entry.key.clone(), Some(value.clone())) {
                Ok(_) | Err(DictError::DuplicateInsert) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// `copy(a)` followed by `update(copy, b, override_existing)`.
    pub fn merge(a: &Self, b: &Self, override_existing: bool) -> Result<Self> {
        let mut out = a.copy();
        out.update(b, override_existing)?;
        Ok(out)
    }

    /// Equal active counts and every live entry of `self` finds a
    /// value-equal entry at the same key in `other`.
    pub fn equal(&self, other: &Self) -> bool {
        if self.active_count != other.active_count {
            return false;
        }
        for (_, entry) in self.entries.iter() {
            let Some(value) = &entry.value else { continue };
            match other.get(&entry.key) {
                Some(other_value) if other_value == value => {}
                _ => return false,
            }
        }
        true
    }

    /// Snapshot of live keys in insertion order.
    pub fn keys(&self) -> KeysView<K> {
        KeysView::new(
            self.entries
                .iter()
                .filter(|(_, e)| e.value.is_some())
                .map(|(_, e)| e.key.clone())
                .collect(),
        )
    }

    /// Snapshot of live values in insertion order.
    pub fn values(&self) -> ValuesView<V> {
        ValuesView::new(
            self.entries
                .iter()
                .filter_map(|(_, e)| e.value.clone())
                .collect(),
        )
    }

    /// Snapshot of live `(key, value)` pairs in insertion order.
    pub fn items(&self) -> ItemsView<(K, V)> {
        ItemsView::new(
            self.entries
                .iter()
                .filter_map(|(_, e)| e.value.clone().map(|v| (e.key.clone(), v)))
                .collect(),
        )
    }
}
