//! Persistent sequences for the query engine.
//!
//! [`Array`] is the value behind query-language sequences and array items. It
//! is an immutable, structurally-shared B-tree of chunks: every node records
//! the cumulative sizes of its children, so random access, insertion and
//! removal at any position take `O(log n)` time, and every operation leaves
//! the previous version intact. Cloning an [`Array`] only bumps a reference
//! count; the in-place methods (`push_back`, `insert`, ...) copy just the
//! nodes on the path they modify, and only when those nodes are shared.
//!
//! The leftmost and rightmost paths of the tree are allowed to be sparsely
//! filled ("end digits"), which keeps pushing and popping at both ends cheap
//! and makes splitting a tree in two a simple path copy.

mod concat;
mod error;
mod invariants;
mod node;

pub mod array;
pub mod iter;

pub use array::Array;
pub use error::{Error, Result};
pub use iter::{IntoIter, Iter};

/// [`Array`] takes a capacity parameter `N`: leaves hold at most `N`
/// elements and branches at most `N` children, and all nodes except those on
/// the outer paths hold at least `N / 2`. `N` must be a power of two no
/// smaller than 4, which we use this trait to enforce.
pub trait ValidBranchingConstant {}
pub struct Const<const N: usize> {}

impl ValidBranchingConstant for Const<4> {}
impl ValidBranchingConstant for Const<8> {}
impl ValidBranchingConstant for Const<16> {}
impl ValidBranchingConstant for Const<32> {}
impl ValidBranchingConstant for Const<64> {}
impl ValidBranchingConstant for Const<128> {}

/// An [`Array`] with the capacity we use for query values.
pub type DefaultArray<T> = Array<T, 32>;
