//! Hash table configuration.

use crate::error::{ContainerError, Result};

/// Sizing parameters for a [`HashTable`](crate::HashTable).
///
/// Validated when the table is initialized; immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Requested number of slots. Rounded up to a power of two.
    ///
    /// Default: 8.
    pub initial_capacity: usize,

    /// Live-entry percentage of capacity at which the next insert grows
    /// the table.
    ///
    /// Default: 100, i.e. grow once every slot holds a live entry. Must be
    /// in `1..=100`.
    pub max_load_percent: u8,
}

impl TableConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 8;
    pub const DEFAULT_MAX_LOAD_PERCENT: u8 = 100;

    pub const fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_load_percent: Self::DEFAULT_MAX_LOAD_PERCENT,
        }
    }

    pub const fn with_max_load_percent(mut self, percent: u8) -> Self {
        self.max_load_percent = percent;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ContainerError::InvalidConfig("initial_capacity must be non-zero"));
        }
        if self.max_load_percent == 0 || self.max_load_percent > 100 {
            return Err(ContainerError::InvalidConfig(
                "max_load_percent must be in 1..=100",
            ));
        }
        Ok(())
    }

    /// Slot count actually allocated for `initial_capacity`.
    pub fn slot_count(&self) -> Result<usize> {
        self.initial_capacity
            .checked_next_power_of_two()
            .ok_or(ContainerError::InvalidConfig("initial_capacity too large"))
    }

    /// Maximum live entries a table of `capacity` slots holds before growing.
    pub(crate) fn load_limit(&self, capacity: usize) -> usize {
        let limit = capacity / 100 * self.max_load_percent as usize
            + capacity % 100 * self.max_load_percent as usize / 100;
        limit.max(1)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_grow_only_when_full() {
        let c = TableConfig::default();
        assert_eq!(c.slot_count().unwrap(), 8);
        assert_eq!(c.load_limit(8), 8);
        assert_eq!(c.load_limit(1024), 1024);
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(TableConfig::new(9).slot_count().unwrap(), 16);
        assert_eq!(TableConfig::new(1).slot_count().unwrap(), 1);
    }

    #[test]
    fn partial_load_limit() {
        let c = TableConfig::new(16).with_max_load_percent(75);
        assert_eq!(c.load_limit(16), 12);
        assert_eq!(c.load_limit(1), 1);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(TableConfig::new(0).validate().is_err());
        assert!(TableConfig::new(8).with_max_load_percent(0).validate().is_err());
        assert!(TableConfig::new(8).with_max_load_percent(101).validate().is_err());
        assert!(TableConfig::default().validate().is_ok());
    }
}
