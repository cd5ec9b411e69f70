//! Growable array of owned elements with a release callback.
//!
//! Slots may be empty. Whenever an occupied slot leaves the array through
//! `remove`, `set`, `clear` or destruction, its element is handed to the
//! array's free function. `take` is the one exit that returns ownership to
//! the caller instead.

use crate::callbacks::FreeFn;
use crate::error::{ContainerError, Result};
use crate::growth::grown_capacity;
use crate::object::{impl_object, Class};
use tracing::trace;

/// Arguments for [`PtrArray`] initialization.
pub struct PtrArrayInit<T> {
    pub items: Vec<Option<T>>,
    pub free: Option<FreeFn<T>>,
}

pub struct PtrArray<T> {
    slots: Vec<Option<T>>,
    free: Option<FreeFn<T>>,
}

impl<T: 'static> PtrArray<T> {
    pub fn new(items: Vec<Option<T>>, free: Option<FreeFn<T>>) -> Result<Self> {
        crate::object::construct::<Self>(PtrArrayInit { items, free })
    }
}

impl<T> PtrArray<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    fn out_of_bounds(&self, index: usize) -> ContainerError {
        ContainerError::IndexOutOfBounds {
            index,
            len: self.slots.len(),
        }
    }

    /// Element in slot `index`; `Ok(None)` for an empty slot.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        self.slots
            .get(index)
            .map(Option::as_ref)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut T>> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .map(Option::as_mut)
            .ok_or(ContainerError::IndexOutOfBounds { index, len })
    }

    /// Double capacity (floor 8).
    pub fn expand(&mut self) -> Result<()> {
        let len = self.slots.len();
        let cap = grown_capacity(self.slots.capacity(), len.max(self.slots.capacity()))
            .ok_or(ContainerError::alloc(usize::MAX, core::mem::size_of::<Option<T>>()))?;
        self.slots
            .try_reserve_exact(cap - len)
            .map_err(|_| ContainerError::alloc(cap, core::mem::size_of::<Option<T>>()))?;
        trace!(to = cap, "pointer array expanded");
        Ok(())
    }

    pub fn push(&mut self, item: Option<T>) -> Result<()> {
        if self.slots.len() == self.slots.capacity() {
            self.expand()?;
        }
        self.slots.push(item);
        Ok(())
    }

    /// Replace slot `index`, releasing the element it held.
    pub fn set(&mut self, index: usize, item: Option<T>) -> Result<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ContainerError::IndexOutOfBounds { index, len })?;
        if let Some(old) = core::mem::replace(slot, item) {
            release_with(self.free, old);
        }
        Ok(())
    }

    /// Remove slot `index`, releasing its element and shifting the tail left.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        if let Some(item) = self.take(index)? {
            release_with(self.free, item);
        }
        Ok(())
    }

    /// Remove slot `index` and hand its element to the caller unreleased.
    pub fn take(&mut self, index: usize) -> Result<Option<T>> {
        if index >= self.slots.len() {
            return Err(self.out_of_bounds(index));
        }
        Ok(self.slots.remove(index))
    }

    /// Release every element; capacity is kept.
    pub fn clear(&mut self) {
        let free = self.free;
        for item in self.slots.drain(..).flatten() {
            release_with(free, item);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// Destructor: release all elements and return to the prototype state.
    pub fn release(&mut self) {
        self.clear();
        self.slots = Vec::new();
        self.free = None;
    }
}

fn release_with<T>(free: Option<FreeFn<T>>, item: T) {
    match free {
        Some(free) => free(item),
        None => drop(item),
    }
}

impl<T: 'static> Class for PtrArray<T> {
    const NAME: &'static str = "PtrArray";
    const PROTOTYPE: Self = PtrArray {
        slots: Vec::new(),
        free: None,
    };
    type Args<'a> = PtrArrayInit<T>;

    fn init(&mut self, args: PtrArrayInit<T>) -> Result<()> {
        self.free = args.free;
        self.slots = args.items;
        Ok(())
    }
}

impl_object!(PtrArray<T> where T: 'static);

impl<T> Drop for PtrArray<T> {
    fn drop(&mut self) {
        self.clear();
    }
}
