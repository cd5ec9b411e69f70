//! Key byte views and the default hash functions.

/// How a key presents itself to hashing and default comparison.
///
/// `Sized` keys are hashed over exactly their bytes. `Text` keys are hashed
/// as text: up to the first NUL, and at most [`TEXT_HASH_LIMIT`] bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyBytes<'a> {
    Sized(&'a [u8]),
    Text(&'a str),
}

impl<'a> KeyBytes<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            KeyBytes::Sized(b) => b,
            KeyBytes::Text(s) => s.as_bytes(),
        }
    }
}

/// Keys usable in a [`HashTable`](crate::HashTable).
pub trait AsKeyBytes {
    fn key_bytes(&self) -> KeyBytes<'_>;
}

impl AsKeyBytes for str {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Text(self)
    }
}

impl AsKeyBytes for String {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Text(self)
    }
}

impl AsKeyBytes for Box<str> {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Text(self)
    }
}

impl AsKeyBytes for [u8] {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Sized(self)
    }
}

impl AsKeyBytes for Vec<u8> {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Sized(self)
    }
}

impl AsKeyBytes for Box<[u8]> {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Sized(self)
    }
}

impl<const N: usize> AsKeyBytes for [u8; N] {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Sized(self)
    }
}

impl<T: AsKeyBytes + ?Sized> AsKeyBytes for &T {
    fn key_bytes(&self) -> KeyBytes<'_> {
        (**self).key_bytes()
    }
}

macro_rules! int_key_bytes {
    ($($t:ty),*) => {$(
        impl AsKeyBytes for $t {
            fn key_bytes(&self) -> KeyBytes<'_> {
                // SAFETY: primitive integers have no padding and every byte
                // is initialized; the slice borrows `self`.
                let bytes = unsafe {
                    core::slice::from_raw_parts(
                        (self as *const $t).cast::<u8>(),
                        core::mem::size_of::<$t>(),
                    )
                };
                KeyBytes::Sized(bytes)
            }
        }
    )*};
}

int_key_bytes!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Text keys contribute at most this many bytes to their hash.
pub const TEXT_HASH_LIMIT: usize = 1000;

/// Jenkins one-at-a-time hash over `bytes`.
///
/// Bytes are mixed in as signed values, so `0x80..=0xff` contribute a
/// sign-extended word.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0;
    for &b in bytes {
        hash = hash.wrapping_add(b as i8 as u64);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

/// Multiplicative (x31) text hash, reduced modulo `u64::MAX`.
pub fn hash_text(text: &str) -> u64 {
    let mut hash: u64 = 0;
    for &c in text.as_bytes().iter().take(TEXT_HASH_LIMIT) {
        if c == 0 {
            break;
        }
        hash = hash.wrapping_mul(31).wrapping_add(c as i8 as u64) % u64::MAX;
    }
    hash
}

/// Hash used when a callback table supplies none.
pub fn default_hash(key: KeyBytes<'_>) -> u64 {
    match key {
        KeyBytes::Sized(b) => hash_bytes(b),
        KeyBytes::Text(s) => hash_text(s),
    }
}
