//! Per-element callback tables.
//!
//! A container holds one [`CallbackTable`] per element role (keys, values)
//! and consults it whenever it hashes, compares, duplicates or releases an
//! element. Each callback is optional and falls back to a default when
//! unset.

use crate::hash::{default_hash, AsKeyBytes, KeyBytes};
use core::cmp::Ordering;

pub type HashFn = fn(KeyBytes<'_>) -> u64;
pub type CompareFn<T> = fn(&T, &T) -> Ordering;
pub type CopyFn<T> = fn(&T) -> T;
pub type FreeFn<T> = fn(T);

/// Caller-supplied element behavior. `None` selects the default.
///
/// - `hash`: [`default_hash`], which switches to text mode for text keys.
/// - `compare`: equality of the elements' key bytes for keys, `PartialEq`
///   for values.
/// - `copy`: `Clone::clone`. Shallow for shared pointers such as `Rc`.
/// - `free`: plain drop.
pub struct CallbackTable<T> {
    pub hash: Option<HashFn>,
    pub compare: Option<CompareFn<T>>,
    pub copy: Option<CopyFn<T>>,
    pub free: Option<FreeFn<T>>,
}

impl<T> CallbackTable<T> {
    /// Table with every callback left at its default.
    pub const NONE: Self = Self {
        hash: None,
        compare: None,
        copy: None,
        free: None,
    };

    pub const fn with_hash(mut self, f: HashFn) -> Self {
        self.hash = Some(f);
        self
    }

    pub const fn with_compare(mut self, f: CompareFn<T>) -> Self {
        self.compare = Some(f);
        self
    }

    pub const fn with_copy(mut self, f: CopyFn<T>) -> Self {
        self.copy = Some(f);
        self
    }

    pub const fn with_free(mut self, f: FreeFn<T>) -> Self {
        self.free = Some(f);
        self
    }

    pub(crate) fn release(&self, item: T) {
        match self.free {
            Some(free) => free(item),
            None => drop(item),
        }
    }

    pub(crate) fn duplicate(&self, item: &T) -> T
    where
        T: Clone,
    {
        match self.copy {
            Some(copy) => copy(item),
            None => item.clone(),
        }
    }
}

impl<T: AsKeyBytes> CallbackTable<T> {
    pub(crate) fn hash_of(&self, key: &T) -> u64 {
        let bytes = key.key_bytes();
        match self.hash {
            Some(hash) => hash(bytes),
            None => default_hash(bytes),
        }
    }

    pub(crate) fn keys_equal(&self, a: &T, b: &T) -> bool {
        match self.compare {
            Some(cmp) => cmp(a, b) == Ordering::Equal,
            None => a.key_bytes() == b.key_bytes(),
        }
    }
}

impl<T> CallbackTable<T> {
    /// Equality under the compare callback; `None` when no callback is set.
    pub(crate) fn compare_equal(&self, a: &T, b: &T) -> Option<bool> {
        self.compare.map(|cmp| cmp(a, b) == Ordering::Equal)
    }
}

impl<T: PartialEq> CallbackTable<T> {
    pub(crate) fn values_equal(&self, a: &T, b: &T) -> bool {
        self.compare_equal(a, b).unwrap_or_else(|| a == b)
    }
}

// Derives would demand `T: Clone`/`T: Debug`; only fn pointers are held.
impl<T> Clone for CallbackTable<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CallbackTable<T> {}

impl<T> Default for CallbackTable<T> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<T> core::fmt::Debug for CallbackTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("hash", &self.hash.is_some())
            .field("compare", &self.compare.is_some())
            .field("copy", &self.copy.is_some())
            .field("free", &self.free.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn defaults_apply_when_unset() {
        let cb: CallbackTable<String> = CallbackTable::NONE;
        let a = "abc".to_string();
        assert_eq!(cb.hash_of(&a), default_hash(KeyBytes::Text("abc")));
        assert!(cb.keys_equal(&a, &"abc".to_string()));
        assert!(!cb.keys_equal(&a, &"abd".to_string()));
        assert_eq!(cb.duplicate(&a), a);
    }

    #[test]
    fn custom_callbacks_take_precedence() {
        fn zero(_: KeyBytes<'_>) -> u64 {
            0
        }
        fn case_insensitive(a: &String, b: &String) -> Ordering {
            a.to_lowercase().cmp(&b.to_lowercase())
        }
        fn shout(s: &String) -> String {
            s.to_uppercase()
        }

        let cb = CallbackTable::NONE
            .with_hash(zero)
            .with_compare(case_insensitive)
            .with_copy(shout);
        assert_eq!(cb.hash_of(&"abc".to_string()), 0);
        assert!(cb.keys_equal(&"ABC".to_string(), &"abc".to_string()));
        assert_eq!(cb.duplicate(&"abc".to_string()), "ABC");
    }

    thread_local! {
        static FREED: Cell<u32> = const { Cell::new(0) };
    }

    #[test]
    fn release_routes_through_free() {
        fn count(_: u32) {
            FREED.with(|f| f.set(f.get() + 1));
        }
        let cb = CallbackTable::NONE.with_free(count);
        cb.release(7);
        cb.release(8);
        assert_eq!(FREED.with(Cell::get), 2);

        // No free callback: the value is simply dropped.
        CallbackTable::<u32>::NONE.release(9);
        assert_eq!(FREED.with(Cell::get), 2);
    }

    #[test]
    fn compare_equal_needs_no_partial_eq() {
        struct Opaque(u8);
        fn by_byte(a: &Opaque, b: &Opaque) -> Ordering {
            a.0.cmp(&b.0)
        }
        let cb = CallbackTable::NONE.with_compare(by_byte);
        assert_eq!(cb.compare_equal(&Opaque(1), &Opaque(1)), Some(true));
        assert_eq!(cb.compare_equal(&Opaque(1), &Opaque(2)), Some(false));
        assert_eq!(CallbackTable::NONE.compare_equal(&Opaque(1), &Opaque(1)), None);
    }

    #[test]
    fn value_compare_defaults_to_partial_eq() {
        let cb: CallbackTable<f64> = CallbackTable::NONE;
        assert!(cb.values_equal(&1.5, &1.5));
        assert!(!cb.values_equal(&1.5, &2.5));
    }
}
