//! Capacity policy shared by the array types.
//!
//! Capacities never shrink. Growth doubles the current capacity, starting
//! from a floor of [`MIN_CAPACITY`], until the requested length fits with at
//! least one spare slot.

/// Smallest capacity any growing array allocates.
pub const MIN_CAPACITY: usize = 8;

/// Capacity to grow to so that `needed` elements fit, or `None` when
/// doubling overflows. Returns `current` unchanged when `needed < current`.
pub fn grown_capacity(current: usize, needed: usize) -> Option<usize> {
    if needed < current {
        return Some(current);
    }
    let mut cap = current.max(MIN_CAPACITY);
    while cap <= needed {
        cap = cap.checked_mul(2)?;
    }
    Some(cap)
}
