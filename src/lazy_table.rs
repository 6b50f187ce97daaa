//! LazyTable: dense slot array + position index + ordered tombstone set.

use crate::error::TableError;
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::policy::CompactionPolicy;
use crate::slot::{Proxy, ProxyMut, Slot};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;
use std::collections::BTreeSet;

/// Slot array, index and tombstone set. User code runs only as `K: Eq`
/// inside the probe closures, before any of the three parts changes.
#[derive(Clone)]
struct Store<K, V> {
    slots: Vec<Slot<K, V>>,
    // positions of occupied slots, hashed by the slot's stored hash
    index: HashTable<usize>,
    tombstones: BTreeSet<usize>,
}

impl<K, V> Store<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashTable::with_capacity(capacity),
            tombstones: BTreeSet::new(),
        }
    }

    fn find<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let slots = &self.slots;
        self.index
            .find(hash, |&pos| {
                slots
                    .get(pos)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    fn insert_with<F>(&mut self, hash: u64, key: K, default: F) -> Result<usize, TableError>
    where
        K: Eq,
        F: FnOnce() -> V,
    {
        let slots = &self.slots;
        match self.index.entry(
            hash,
            |&pos| slots.get(pos).map(|s| s.key == key).unwrap_or(false),
            |&pos| slots.get(pos).map(|s| s.hash).unwrap_or(0),
        ) {
            Entry::Occupied(_) => Err(TableError::DuplicateKey),
            Entry::Vacant(v) => {
                let slot = Slot::occupied(key, default(), hash);
                // Lowest free position first keeps live slots packed toward
                // the front, which is what lets trailing trims fire.
                let pos = match self.tombstones.pop_first() {
                    Some(pos) => {
                        self.slots[pos] = slot;
                        pos
                    }
                    None => {
                        self.slots.push(slot);
                        self.slots.len() - 1
                    }
                };
                let _ = v.insert(pos);
                Ok(pos)
            }
        }
    }

    fn take<Q>(&mut self, hash: u64, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let slots = &self.slots;
        let entry = self
            .index
            .find_entry(hash, |&pos| {
                slots
                    .get(pos)
                    .map(|s| !s.is_tombstone() && s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .ok()?;
        let (pos, _) = entry.remove();
        let value = self.slots[pos].value.take();
        self.tombstones.insert(pos);
        value
    }

    /// Pop tombstones off the end of the slot array. Returns how many went.
    fn trim_trailing(&mut self) -> usize {
        let mut trimmed = 0;
        while let Some(&last) = self.tombstones.last() {
            if last + 1 != self.slots.len() {
                break;
            }
            self.tombstones.pop_last();
            self.slots.pop();
            trimmed += 1;
        }
        trimmed
    }

    /// Copy occupied slots, in order, into a fresh array and re-index them.
    fn rebuild(&mut self) {
        let before = self.slots.len();
        let live = before - self.tombstones.len();
        let old = core::mem::replace(&mut self.slots, Vec::with_capacity(live));
        self.slots
            .extend(old.into_iter().filter(|s| !s.is_tombstone()));
        self.tombstones.clear();

        self.index.clear();
        let slots = &self.slots;
        for (pos, slot) in slots.iter().enumerate() {
            self.index
                .insert_unique(slot.hash, pos, |&p| slots[p].hash);
        }
        tracing::debug!(before, after = live, "rebuilt lazy table slot array");
    }

    fn compact(&mut self, policy: &CompactionPolicy) {
        let trimmed = self.trim_trailing();
        if trimmed > 0 {
            tracing::trace!(
                trimmed,
                allocated = self.slots.len(),
                "trimmed trailing tombstones"
            );
        }
        if policy.should_rebuild(self.tombstones.len(), self.slots.len()) {
            self.rebuild();
        }
    }

    fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
        let slots = &self.slots;
        self.index
            .reserve(additional, |&pos| slots.get(pos).map(|s| s.hash).unwrap_or(0));
    }

    fn clear(&mut self) {
        self.tombstones.clear();
        self.index.clear();
        self.slots.clear();
    }
}

/// A keyed table with O(1) average lookup and dense iteration in storage
/// order. Removal is lazy: a removed entry leaves a tombstone in its slot,
/// which the next insert reuses (lowest position first) or a compaction
/// reclaims.
///
/// Positions of live entries (see [`position_of`](Self::position_of)) are
/// stable until a full rebuild renumbers the slot array. A trailing trim
/// only drops tombstoned positions off the end.
pub struct LazyTable<K, V, S = RandomState> {
    hasher: S,
    store: Store<K, V>,
    policy: CompactionPolicy,
}

impl<K, V> LazyTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(0, Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    pub fn with_policy(policy: CompactionPolicy) -> Self {
        let mut t = Self::new();
        t.policy = policy;
        t
    }
}

impl<K, V, S> Default for LazyTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

// Operations that never touch keys.
impl<K, V, S> LazyTable<K, V, S> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.store.index.len()
    }

    /// Number of slots, tombstones included.
    pub fn allocated_len(&self) -> usize {
        self.store.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.index.is_empty()
    }

    pub fn is_allocated_empty(&self) -> bool {
        self.store.index.is_empty() && self.store.slots.is_empty()
    }

    pub fn tombstone_count(&self) -> usize {
        self.store.tombstones.len()
    }

    pub fn policy(&self) -> CompactionPolicy {
        self.policy
    }

    /// Takes effect at the next `compact` or `remove`.
    pub fn set_policy(&mut self, policy: CompactionPolicy) {
        self.policy = policy;
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Trailing trim, then a full rebuild if the policy's fragmentation
    /// threshold is crossed.
    pub fn compact(&mut self) {
        self.store.compact(&self.policy);
    }

    /// O(n) rebuild: drops every tombstone and renumbers the surviving slots,
    /// keeping their relative order. All previously observed positions are
    /// invalid afterwards.
    pub fn force_compact(&mut self) {
        self.store.rebuild();
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// View of the slot at `position`, which may be a tombstone.
    /// `None` if the position is past the end of the slot array.
    pub fn proxy_at(&self, position: usize) -> Option<Proxy<'_, K, V>> {
        self.store.slots.get(position).map(Proxy::new)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.store.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.store.slots.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V, S> LazyTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            store: Store::with_capacity(capacity),
            policy: CompactionPolicy::default(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Insert a new entry. A duplicate key is a soft failure: `None` is
    /// returned and the existing entry is left as it was.
    pub fn insert(&mut self, key: K, value: V) -> Option<ProxyMut<'_, K, V>> {
        self.try_insert(key, value).ok()
    }

    /// Like [`insert`](Self::insert), reporting a duplicate as
    /// [`TableError::DuplicateKey`].
    pub fn try_insert(&mut self, key: K, value: V) -> Result<ProxyMut<'_, K, V>, TableError> {
        self.insert_with(key, || value)
    }

    /// Insert, building the value only if the key is absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> Result<ProxyMut<'_, K, V>, TableError>
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let pos = self.store.insert_with(hash, key, default)?;
        Ok(ProxyMut::new(&mut self.store.slots[pos]))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.position_of(q).is_some()
    }

    /// Current slot position of a live key.
    pub fn position_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.store.find(hash, q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.position_of(q)?;
        self.store.slots[pos].value.as_ref()
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.position_of(q)?;
        self.store.slots[pos].value.as_mut()
    }

    /// Lookup-only access; never creates an entry.
    pub fn at<Q>(&self, q: &Q) -> Result<Proxy<'_, K, V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.position_of(q).ok_or(TableError::OutOfRange)?;
        Ok(Proxy::new(&self.store.slots[pos]))
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<ProxyMut<'_, K, V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.position_of(q).ok_or(TableError::OutOfRange)?;
        Ok(ProxyMut::new(&mut self.store.slots[pos]))
    }

    /// Tombstone the entry for `q` and hand back its value. Positions of
    /// other entries are untouched; nothing is compacted.
    pub fn take<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.store.take(hash, q)
    }

    /// Tombstone the entry for `q`. Returns false if it was not present.
    pub fn lazy_remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }

    /// `lazy_remove` followed, on success, by [`compact`](Self::compact),
    /// which may renumber every slot.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(value) = self.take(q) else {
            return false;
        };
        self.compact();
        drop(value);
        true
    }

    /// Capacity hint for both the slot array and the index.
    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
    }

    /// Check every structural invariant, panicking on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let slots = &self.store.slots;
        let occupied = slots.iter().filter(|s| !s.is_tombstone()).count();
        assert_eq!(self.store.index.len(), occupied, "index covers occupied slots");
        assert_eq!(
            occupied + self.store.tombstones.len(),
            slots.len(),
            "every slot is occupied or tombstoned"
        );
        for &pos in &self.store.tombstones {
            assert!(pos < slots.len(), "tombstone in range");
            assert!(slots[pos].is_tombstone(), "tombstone slot is empty");
        }
        let mut seen = BTreeSet::new();
        for &pos in self.store.index.iter() {
            assert!(seen.insert(pos), "no two keys share a position");
            let slot = &slots[pos];
            assert!(!slot.is_tombstone(), "indexed slot is occupied");
            assert_eq!(self.make_hash(&slot.key), slot.hash, "stored hash is current");
            assert_eq!(
                self.store.find(slot.hash, &slot.key),
                Some(pos),
                "indexed key resolves to its slot"
            );
        }
    }
}

impl<K, V, S> Clone for LazyTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            store: self.store.clone(),
            policy: self.policy,
        }
    }
}

impl<K, V, S> core::fmt::Debug for LazyTable<K, V, S>
where
    K: core::fmt::Debug,
    V: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> core::ops::Index<&Q> for LazyTable<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent; use [`LazyTable::at`] for a fallible lookup.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in LazyTable")
    }
}

impl<'a, K, V, S> IntoIterator for &'a LazyTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut LazyTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for LazyTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.store.slots.into_iter(),
        }
    }
}

/// Duplicate keys keep the first value, as with `insert`.
impl<K, V, S> Extend<(K, V)> for LazyTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for LazyTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut t = Self::with_hasher(S::default());
        t.extend(iter);
        t
    }
}
