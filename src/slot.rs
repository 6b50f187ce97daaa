//! Storage cells of the dense slot array and the proxy views handed out over them.

use crate::error::TableError;

/// One cell of the slot array: occupied while `value` is present, a
/// tombstone otherwise. The key and its hash stay behind after tombstoning;
/// neither is consulted again until the slot is reused or discarded.
#[derive(Clone, Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) key: K,
    pub(crate) value: Option<V>,
    pub(crate) hash: u64,
}

impl<K, V> Slot<K, V> {
    pub(crate) fn occupied(key: K, value: V, hash: u64) -> Self {
        Self {
            key,
            value: Some(value),
            hash,
        }
    }

    #[inline]
    pub(crate) fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Read-only view of one slot's `(key, value)` pair.
///
/// A proxy borrows its table, so the table cannot be mutated structurally
/// while the proxy is alive. It is deliberately neither `Clone` nor `Copy`.
pub struct Proxy<'a, K, V> {
    slot: &'a Slot<K, V>,
}

impl<'a, K, V> Proxy<'a, K, V> {
    pub(crate) fn new(slot: &'a Slot<K, V>) -> Self {
        Self { slot }
    }

    /// The slot's key. Still readable on a tombstone, where it is stale.
    pub fn key(&self) -> &'a K {
        &self.slot.key
    }

    pub fn value(&self) -> Result<&'a V, TableError> {
        self.slot.value.as_ref().ok_or(TableError::InvalidState)
    }

    pub fn is_removed(&self) -> bool {
        self.slot.is_tombstone()
    }

    /// Both halves at once, for `let (k, v) = proxy.pair()?;`.
    pub fn pair(&self) -> Result<(&'a K, &'a V), TableError> {
        Ok((self.key(), self.value()?))
    }
}

impl<K: core::fmt::Debug, V: core::fmt::Debug> core::fmt::Debug for Proxy<'_, K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Proxy")
            .field("key", &self.slot.key)
            .field("value", &self.slot.value)
            .finish()
    }
}

/// Mutable view of one slot's `(key, value)` pair. Keys are immutable.
pub struct ProxyMut<'a, K, V> {
    slot: &'a mut Slot<K, V>,
}

impl<'a, K, V> ProxyMut<'a, K, V> {
    pub(crate) fn new(slot: &'a mut Slot<K, V>) -> Self {
        Self { slot }
    }

    pub fn key(&self) -> &K {
        &self.slot.key
    }

    pub fn value(&self) -> Result<&V, TableError> {
        self.slot.value.as_ref().ok_or(TableError::InvalidState)
    }

    pub fn value_mut(&mut self) -> Result<&mut V, TableError> {
        self.slot.value.as_mut().ok_or(TableError::InvalidState)
    }

    pub fn is_removed(&self) -> bool {
        self.slot.is_tombstone()
    }

    pub fn pair(&self) -> Result<(&K, &V), TableError> {
        let value = self.slot.value.as_ref().ok_or(TableError::InvalidState)?;
        Ok((&self.slot.key, value))
    }

    pub fn pair_mut(&mut self) -> Result<(&K, &mut V), TableError> {
        let value = self.slot.value.as_mut().ok_or(TableError::InvalidState)?;
        Ok((&self.slot.key, value))
    }

    /// Consume the proxy, keeping the mutable borrow for the table's lifetime.
    pub fn into_value_mut(self) -> Result<&'a mut V, TableError> {
        self.slot.value.as_mut().ok_or(TableError::InvalidState)
    }

    /// Downgrade to a read-only proxy.
    pub fn into_proxy(self) -> Proxy<'a, K, V> {
        Proxy::new(self.slot)
    }
}

impl<K: core::fmt::Debug, V: core::fmt::Debug> core::fmt::Debug for ProxyMut<'_, K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProxyMut")
            .field("key", &self.slot.key)
            .field("value", &self.slot.value)
            .finish()
    }
}
