//! Crate-wide error type.

use thiserror::Error;

/// Failures reported by the containers and the object runtime.
///
/// Allocation, bounds and lookup failures are all recoverable results;
/// nothing in this crate hands back an absent reference for the caller to
/// dereference unchecked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// A byte array was constructed with an element width of zero.
    #[error("element width must be non-zero")]
    ZeroElementWidth,

    /// Index outside `0..len` (or `0..=len` for insertion).
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A value's byte length does not match the array's element width.
    #[error("value of {actual} bytes does not fit element width {width}")]
    WidthMismatch { width: usize, actual: usize },

    /// Source bytes handed to an array initializer were too short.
    #[error("source holds {actual} bytes, expected at least {expected}")]
    SourceTooShort { expected: usize, actual: usize },

    /// The allocator refused a request, or the size overflowed.
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },

    /// A hash table lookup missed.
    #[error("key not found")]
    KeyNotFound,

    /// An operation needs a callback the table was built without.
    #[error("no {role} callback configured")]
    MissingCallback { role: &'static str },

    /// A `TableConfig` failed validation.
    #[error("invalid table configuration: {0}")]
    InvalidConfig(&'static str),

    /// The object handle refers to a destroyed instance.
    #[error("object handle is stale")]
    StaleObject,

    /// A method was invoked before `init` completed.
    #[error("`{class}` instance used before init")]
    NotInitialized { class: &'static str },

    /// `init` was sent to an instance that is already initialized.
    #[error("`{class}` instance is already initialized")]
    AlreadyInitialized { class: &'static str },

    /// The handle's class does not match the stored instance.
    #[error("object is a `{found}`, not a `{expected}`")]
    WrongClass {
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T, E = ContainerError> = std::result::Result<T, E>;

impl ContainerError {
    pub(crate) fn alloc(elements: usize, elem_size: usize) -> Self {
        ContainerError::AllocationFailed {
            bytes: elements.saturating_mul(elem_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let e = ContainerError::IndexOutOfBounds { index: 4, len: 4 };
        assert_eq!(e.to_string(), "index 4 out of bounds for length 4");

        let e = ContainerError::WrongClass {
            expected: "ByteArray",
            found: "PtrArray",
        };
        assert_eq!(e.to_string(), "object is a `PtrArray`, not a `ByteArray`");
    }

    #[test]
    fn alloc_size_saturates() {
        assert_eq!(
            ContainerError::alloc(usize::MAX, 8),
            ContainerError::AllocationFailed { bytes: usize::MAX }
        );
    }
}
