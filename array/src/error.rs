/// An error returned by an [`Array`](crate::Array) operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An index argument was outside the bounds accepted by the operation.
    /// Nothing was modified.
    #[error("index {index} is out of range for an array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The tree failed a structural check. Only returned by
    /// [`Array::check_invariants`](crate::Array::check_invariants), and always
    /// a bug in this crate.
    #[error("array invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fails with [`Error::IndexOutOfRange`] unless `index < end`.
pub(crate) fn check_index(index: usize, end: usize, len: usize) -> Result<()> {
    if index < end {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, len })
    }
}
