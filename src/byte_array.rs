//! Growable array of fixed-width opaque byte records.
//!
//! The array knows nothing about what its elements mean: every read is a
//! borrowed slice of `element_width` bytes and every write is a byte copy.
//! Use [`PtrArray`](crate::PtrArray) for elements that own resources.

use crate::error::{ContainerError, Result};
use crate::growth::{grown_capacity, MIN_CAPACITY};
use crate::object::{impl_object, Class};
use tracing::trace;

/// Arguments for [`ByteArray`] initialization.
#[derive(Clone, Copy, Debug)]
pub struct ArrayInit<'a> {
    /// Bytes to copy in, at least `element_width * count` long. `None`
    /// leaves the elements zeroed.
    pub source: Option<&'a [u8]>,
    pub element_width: usize,
    pub count: usize,
}

#[derive(Debug)]
pub struct ByteArray {
    // `buf.len() == capacity * element_width`; bytes past `length` are spare.
    buf: Vec<u8>,
    element_width: usize,
    length: usize,
    capacity: usize,
}

impl ByteArray {
    /// `count` elements copied from `source`, or zeroed when `source` is
    /// `None`.
    pub fn new(source: Option<&[u8]>, element_width: usize, count: usize) -> Result<Self> {
        crate::object::construct::<Self>(ArrayInit {
            source,
            element_width,
            count,
        })
    }

    /// Empty array of `element_width`-byte records.
    pub fn with_width(element_width: usize) -> Result<Self> {
        Self::new(None, element_width, 0)
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn element_width(&self) -> usize {
        self.element_width
    }

    /// The live elements as one contiguous byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.length * self.element_width]
    }

    fn span(&self, index: usize) -> core::ops::Range<usize> {
        let start = index * self.element_width;
        start..start + self.element_width
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.length {
            Ok(())
        } else {
            Err(ContainerError::IndexOutOfBounds {
                index,
                len: self.length,
            })
        }
    }

    /// Element at `index`; valid for `index < len()`.
    pub fn get(&self, index: usize) -> Result<&[u8]> {
        self.check_index(index)?;
        Ok(&self.buf[self.span(index)])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        self.check_index(index)?;
        let span = self.span(index);
        Ok(&mut self.buf[span])
    }

    /// Element at `index`, for call sites where a bad index is a bug.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn get_or_fail(&self, index: usize) -> &[u8] {
        match self.get(index) {
            Ok(e) => e,
            Err(e) => panic!("ByteArray::get_or_fail: {e}"),
        }
    }

    /// Overwrite the element at `index` with exactly one element's bytes.
    pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
        if value.len() != self.element_width {
            return Err(ContainerError::WidthMismatch {
                width: self.element_width,
                actual: value.len(),
            });
        }
        self.get_mut(index)?.copy_from_slice(value);
        Ok(())
    }

    /// Insert the elements packed in `values` before `index`, shifting the
    /// tail right. `index == len()` appends.
    pub fn insert_many(&mut self, index: usize, values: &[u8]) -> Result<()> {
        let width = self.element_width;
        if width == 0 {
            return Err(ContainerError::ZeroElementWidth);
        }
        if values.len() % width != 0 {
            return Err(ContainerError::WidthMismatch {
                width,
                actual: values.len(),
            });
        }
        if index > self.length {
            return Err(ContainerError::IndexOutOfBounds {
                index,
                len: self.length,
            });
        }
        let n = values.len() / width;
        if n == 0 {
            return Ok(());
        }
        let new_len = self
            .length
            .checked_add(n)
            .ok_or(ContainerError::alloc(usize::MAX, 1))?;
        if new_len >= self.capacity {
            let cap = grown_capacity(self.capacity, new_len)
                .ok_or(ContainerError::alloc(new_len, width))?;
            self.grow_to(cap)?;
        }

        let start = index * width;
        let end = self.length * width;
        self.buf.copy_within(start..end, start + values.len());
        self.buf[start..start + values.len()].copy_from_slice(values);
        self.length = new_len;
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: &[u8]) -> Result<()> {
        if value.len() != self.element_width {
            return Err(ContainerError::WidthMismatch {
                width: self.element_width,
                actual: value.len(),
            });
        }
        self.insert_many(index, value)
    }

    pub fn append(&mut self, value: &[u8]) -> Result<()> {
        self.insert(self.length, value)
    }

    pub fn append_many(&mut self, values: &[u8]) -> Result<()> {
        self.insert_many(self.length, values)
    }

    /// Remove the element at `index`, shifting the tail left. Removing the
    /// last element only shortens the array.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if index + 1 < self.length {
            let width = self.element_width;
            let end = self.length * width;
            self.buf.copy_within((index + 1) * width..end, index * width);
        }
        self.length -= 1;
        Ok(())
    }

    /// Grow capacity to at least `count` elements. A `count` of zero asks
    /// for the minimum capacity. Never shrinks.
    pub fn reserve(&mut self, count: usize) -> Result<()> {
        let count = if count < 1 { MIN_CAPACITY } else { count };
        if count > self.capacity {
            self.grow_to(count)?;
        }
        Ok(())
    }

    /// Drop every element; capacity is kept.
    pub fn clear(&mut self) {
        self.length = 0;
    }

    /// Independent array with the same width and element bytes.
    pub fn copy(&self) -> Result<Self> {
        Self::new(Some(self.as_bytes()), self.element_width, self.length)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            // A released array has width 0 and no bytes.
            chunks: self.as_bytes().chunks_exact(self.element_width.max(1)),
        }
    }

    /// Destructor: frees the buffer and returns to the prototype state.
    pub fn release(&mut self) {
        *self = Self::PROTOTYPE;
    }

    fn grow_to(&mut self, capacity: usize) -> Result<()> {
        let bytes = capacity
            .checked_mul(self.element_width)
            .ok_or(ContainerError::alloc(capacity, self.element_width))?;
        self.buf
            .try_reserve_exact(bytes - self.buf.len())
            .map_err(|_| ContainerError::alloc(capacity, self.element_width))?;
        self.buf.resize(bytes, 0);
        trace!(
            from = self.capacity,
            to = capacity,
            width = self.element_width,
            "byte array reallocated"
        );
        self.capacity = capacity;
        Ok(())
    }
}

impl Class for ByteArray {
    const NAME: &'static str = "ByteArray";
    const PROTOTYPE: Self = ByteArray {
        buf: Vec::new(),
        element_width: 0,
        length: 0,
        capacity: 0,
    };
    type Args<'a> = ArrayInit<'a>;

    fn init(&mut self, args: ArrayInit<'_>) -> Result<()> {
        if args.element_width == 0 {
            return Err(ContainerError::ZeroElementWidth);
        }
        let bytes = args
            .element_width
            .checked_mul(args.count)
            .ok_or(ContainerError::alloc(args.count, args.element_width))?;
        if let Some(src) = args.source {
            if src.len() < bytes {
                return Err(ContainerError::SourceTooShort {
                    expected: bytes,
                    actual: src.len(),
                });
            }
        }
        self.element_width = args.element_width;
        self.grow_to(args.count)?;
        if let Some(src) = args.source {
            self.buf[..bytes].copy_from_slice(&src[..bytes]);
        }
        self.length = args.count;
        Ok(())
    }
}

impl_object!(ByteArray);

impl<'a> IntoIterator for &'a ByteArray {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over elements in storage order.
pub struct Iter<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn int_at(a: &ByteArray, i: usize) -> u32 {
        u32::from_ne_bytes(a.get(i).unwrap().try_into().unwrap())
    }

    fn contents(a: &ByteArray) -> Vec<u32> {
        a.iter()
            .map(|e| u32::from_ne_bytes(e.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn zero_width_is_rejected() {
        assert_eq!(
            ByteArray::new(None, 0, 4).err(),
            Some(ContainerError::ZeroElementWidth)
        );
    }

    #[test]
    fn init_without_source_is_zeroed() {
        let a = ByteArray::new(None, 4, 3).unwrap();
        assert_eq!(a.len(), 3);
        assert!(a.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn short_source_is_rejected() {
        let src = ints(&[1, 2]);
        assert_eq!(
            ByteArray::new(Some(&src), 4, 3).err(),
            Some(ContainerError::SourceTooShort {
                expected: 12,
                actual: 8
            })
        );
    }

    /// Invariant: `get` accepts `index < len` only; one-past-the-end fails.
    #[test]
    fn get_bound_is_strict() {
        let a = ByteArray::new(Some(&ints(&[0, 1, 2, 3])), 4, 4).unwrap();
        assert_eq!(int_at(&a, 0), 0);
        assert_eq!(int_at(&a, 3), 3);
        assert_eq!(
            a.get(4).err(),
            Some(ContainerError::IndexOutOfBounds { index: 4, len: 4 })
        );
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_or_fail_panics_past_end() {
        let a = ByteArray::new(Some(&ints(&[7])), 4, 1).unwrap();
        assert_eq!(a.get_or_fail(0), &7u32.to_ne_bytes());
        let _ = a.get_or_fail(1);
    }

    #[test]
    fn set_overwrites_and_validates() {
        let mut a = ByteArray::new(Some(&ints(&[1, 2])), 4, 2).unwrap();
        a.set(1, &9u32.to_ne_bytes()).unwrap();
        assert_eq!(contents(&a), vec![1, 9]);
        assert!(matches!(
            a.set(2, &9u32.to_ne_bytes()),
            Err(ContainerError::IndexOutOfBounds { .. })
        ));
        assert_eq!(
            a.set(0, &[1, 2]),
            Err(ContainerError::WidthMismatch { width: 4, actual: 2 })
        );
        assert_eq!(contents(&a), vec![1, 9]);
    }

    #[test]
    fn insert_shifts_tail_right() {
        let mut a = ByteArray::new(Some(&ints(&[1, 4])), 4, 2).unwrap();
        a.insert_many(1, &ints(&[2, 3])).unwrap();
        assert_eq!(contents(&a), vec![1, 2, 3, 4]);
        a.insert(0, &0u32.to_ne_bytes()).unwrap();
        a.append(&5u32.to_ne_bytes()).unwrap();
        assert_eq!(contents(&a), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn insert_past_len_is_rejected() {
        let mut a = ByteArray::with_width(4).unwrap();
        assert_eq!(
            a.insert(1, &0u32.to_ne_bytes()),
            Err(ContainerError::IndexOutOfBounds { index: 1, len: 0 })
        );
        assert_eq!(
            a.insert_many(0, &[0, 0, 0]),
            Err(ContainerError::WidthMismatch { width: 4, actual: 3 })
        );
    }

    /// Invariant: capacity doubles with a floor of 8 and always exceeds len.
    #[test]
    fn growth_policy() {
        let mut a = ByteArray::with_width(1).unwrap();
        assert_eq!(a.capacity(), 0);
        a.append(&[0]).unwrap();
        assert_eq!(a.capacity(), 8);
        for i in 1..8u8 {
            a.append(&[i]).unwrap();
        }
        assert_eq!(a.capacity(), 16);

        // A large batch grows past a single doubling.
        a.append_many(&[0; 40]).unwrap();
        assert_eq!(a.len(), 48);
        assert_eq!(a.capacity(), 64);
    }

    #[test]
    fn small_initial_capacity_grows_to_floor() {
        let mut a = ByteArray::new(None, 4, 3).unwrap();
        assert_eq!(a.capacity(), 3);
        a.append(&[0; 4]).unwrap();
        assert_eq!(a.capacity(), 8);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn remove_last_and_middle() {
        let mut a = ByteArray::new(Some(&ints(&[1, 2, 3, 4])), 4, 4).unwrap();
        a.remove(3).unwrap();
        assert_eq!(contents(&a), vec![1, 2, 3]);
        a.remove(0).unwrap();
        assert_eq!(contents(&a), vec![2, 3]);
        assert!(a.remove(2).is_err());
    }

    #[test]
    fn insert_then_remove_restores_contents() {
        let mut a = ByteArray::new(Some(&ints(&[1, 2, 3])), 4, 3).unwrap();
        a.insert(1, &99u32.to_ne_bytes()).unwrap();
        a.remove(1).unwrap();
        assert_eq!(contents(&a), vec![1, 2, 3]);
    }

    /// Invariant: `reserve` never shrinks and preserves element bytes.
    #[test]
    fn reserve_preserves_bytes() {
        let mut a = ByteArray::new(Some(&ints(&[5, 6, 7])), 4, 3).unwrap();
        a.reserve(100).unwrap();
        assert_eq!(a.capacity(), 100);
        a.reserve(10).unwrap();
        assert_eq!(a.capacity(), 100);
        assert_eq!(contents(&a), vec![5, 6, 7]);

        let mut b = ByteArray::with_width(2).unwrap();
        b.reserve(0).unwrap();
        assert_eq!(b.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn copy_is_independent() {
        let a = ByteArray::new(Some(&ints(&[1, 2])), 4, 2).unwrap();
        let mut b = a.copy().unwrap();
        b.set(0, &8u32.to_ne_bytes()).unwrap();
        assert_eq!(contents(&a), vec![1, 2]);
        assert_eq!(contents(&b), vec![8, 2]);
        assert_eq!(b.element_width(), 4);
    }

    #[test]
    fn release_returns_to_prototype() {
        let mut a = ByteArray::new(Some(&ints(&[1, 2])), 4, 2).unwrap();
        a.release();
        assert_eq!(a.len(), 0);
        assert_eq!(a.capacity(), 0);
        assert_eq!(a.element_width(), 0);
        assert_eq!(a.iter().count(), 0);
        assert_eq!(a.append(&[]), Err(ContainerError::ZeroElementWidth));
    }
}
