//! lazy-flat-table: a single-threaded keyed table with dense iteration and
//! lazy (tombstone) deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average keyed lookup plus cache-friendly iteration over a
//!   contiguous slot array, without shifting elements on every removal.
//! - Parts:
//!   - Slot array (`Vec<Slot<K, V>>`): each slot is occupied or a
//!     tombstone. A live slot's position is its handle until a rebuild
//!     renumbers the array.
//!   - Index (`hashbrown::HashTable<usize>`): positions of occupied slots,
//!     keyed by the hash stored in each slot.
//!   - Tombstone set (`BTreeSet<usize>`): free positions, reused lowest
//!     first; its largest element drives the trailing trim.
//!
//! Invariants (hold after every public operation)
//! - Every indexed position holds an occupied slot whose key resolves back
//!   to that position; no two keys share a position.
//! - Every tombstoned position is in range, empty, and not indexed.
//! - `len() == occupied slots == allocated_len() - tombstone_count()`.
//!
//! Removal and compaction
//! - `lazy_remove` tombstones one slot in O(log T) and moves nothing else.
//! - `compact` pops tombstones off the end of the array, then rebuilds the
//!   whole array if the [`CompactionPolicy`] threshold is crossed (by
//!   default: more tombstones than half the live entries).
//! - `remove` is `lazy_remove` + `compact`; `force_compact` always rebuilds.
//!   A rebuild keeps the relative order of survivors but renumbers them.
//!
//! Hashing
//! - Each slot stores its key's `u64` hash; growing or rebuilding the index
//!   uses the stored hash, so `K: Hash` runs once per insert or lookup.
//! - Keys live only in their slot; `K` does not need `Clone`.
//!
//! Proxies and lifetimes
//! - [`Proxy`] and [`ProxyMut`] borrow the table, so the borrow checker
//!   rules out structural mutation while one is alive. Positions from
//!   [`LazyTable::position_of`] carry no such guarantee. A removal leaves
//!   the position on a tombstone, whose value reads as
//!   [`TableError::InvalidState`] through [`LazyTable::proxy_at`]; a trim
//!   drops it off the end; a rebuild renumbers every live slot.
//!
//! Reentrancy
//! - Every structural change takes `&mut self`, so `K: Eq`/`K: Hash` can
//!   only reach the table through a shared reference while it is probing,
//!   and reads from there see a consistent table.
//!
//! Collaborators
//! - [`FixedString`]: inline fixed-capacity text, truncating on overflow.
//! - [`Uuid`]: 128-bit identifiers, canonical hyphenated text form.
//! - [`paths`]: home and data-home directory lookup.

mod error;
mod fixed_string;
mod iter;
mod lazy_table;
#[cfg(test)]
mod lazy_table_proptest;
pub mod paths;
mod policy;
mod slot;
mod uuid;

// Public surface
pub use crate::error::{FixedStringError, TableError, UuidError};
pub use crate::fixed_string::FixedString;
pub use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use crate::lazy_table::LazyTable;
pub use crate::policy::{CompactionPolicy, ThresholdBasis};
pub use crate::slot::{Proxy, ProxyMut};
pub use crate::uuid::{Uuid, UUID_TEXT_LEN};
