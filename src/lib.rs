//! erased-containers: growable arrays and an open-addressing hash table
//! whose element behavior is supplied through callback tables, built on a
//! small prototype object runtime.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: containers that treat their elements as opaque, with hashing,
//!   comparison, duplication and release all delegated to the caller.
//! - Layers:
//!   - object: `Class` prototypes (`Class::PROTOTYPE`) plus two-phase
//!     construction (`allocate`, then `init`). `ObjectHeap` keeps
//!     instances of any class behind generational handles and checks their
//!     lifecycle on every access.
//!   - callbacks/hash: `CallbackTable<T>` with optional hash, compare,
//!     copy and free functions; `KeyBytes` views and the default hashes.
//!   - ByteArray: fixed-width byte records, no callbacks, pure byte copies.
//!   - PtrArray<T>: owned elements released through a free function.
//!   - HashTable<K, V>: open addressing over one slot vector, with
//!     tombstones as a distinct slot state.
//!
//! Constraints
//! - Single-threaded: no locking, no global state. Tables are `Send` but
//!   not `Sync`; wrap one in a lock to share it.
//! - Every failure is a `ContainerError`. The only panicking accessor is
//!   `ByteArray::get_or_fail`, for call sites where a bad index is a bug.
//! - References returned by `get`/`find` borrow the container, so any
//!   mutating call ends them.
//!
//! Hashing and probing
//! - Table capacity is a power of two and probes are triangular, so a
//!   probe sequence reaches every slot.
//! - Each slot stores its key's hash code. Rehashing places entries by the
//!   stored code and never calls user callbacks.
//! - Updating an existing key frees the old key and value and does not
//!   change `len()`. Removing leaves a tombstone that lookups step over.
//!
//! Reentrancy
//! - HashTable runs user callbacks in the middle of its operations. A
//!   debug-only guard panics if a callback re-enters the same table.
//!
//! Notes and non-goals
//! - Tables never shrink.
//! - `ByteArray::copy` duplicates bytes only; elements that own resources
//!   belong in a `PtrArray`.

mod byte_array;
mod callbacks;
mod config;
mod error;
pub mod growth;
mod hash;
mod hash_table;
mod hash_table_proptest;
pub mod object;
mod ptr_array;
mod reentrancy;

// Public surface
pub use byte_array::{ArrayInit, ByteArray};
pub use callbacks::{CallbackTable, CompareFn, CopyFn, FreeFn, HashFn};
pub use config::TableConfig;
pub use error::{ContainerError, Result};
pub use hash::{default_hash, hash_bytes, hash_text, AsKeyBytes, KeyBytes, TEXT_HASH_LIMIT};
pub use hash_table::{HashTable, TableInit};
pub use object::{Class, Object, ObjectHeap, ObjectId};
pub use ptr_array::{PtrArray, PtrArrayInit};

pub mod iter {
    //! Iterator types returned by the containers.
    pub use crate::byte_array::Iter as ByteArrayIter;
    pub use crate::hash_table::{Iter as TableIter, IterMut as TableIterMut};
}
