//! Structural checks on the tree behind an [`Array`].

use crate::{array::Array, node::Node, Const, Error, Result, ValidBranchingConstant};

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(Error::InvariantViolation(msg()))
    }
}

/// Checks the subtree at `node`, returning its length.
///
/// `height` is how far above the leaves `node` should be, and the edge flags
/// say whether it's on the leftmost or rightmost path of the tree (where
/// nodes may hold fewer than `N / 2` entries).
fn check_node<T, const N: usize>(
    node: &Node<T, N>,
    height: u8,
    left_edge: bool,
    right_edge: bool,
    is_root: bool,
) -> Result<usize> {
    let width = node.width();
    let min = if left_edge || right_edge {
        1
    } else {
        Node::<T, N>::MIN
    };
    ensure(width <= N, || format!("node with {width} entries, more than {N}"))?;
    ensure(width >= min, || {
        format!("node with {width} entries, fewer than {min} (left edge: {left_edge}, right edge: {right_edge})")
    })?;

    match node {
        Node::Leaf { data } => {
            ensure(height == 0, || format!("leaf found {height} levels above the leaves"))?;
            Ok(data.len())
        }
        Node::Branch { children, sizes } => {
            ensure(height > 0, || "branch found at the leaf level".to_owned())?;
            ensure(!is_root || width >= 2, || "root branch has a single child".to_owned())?;
            ensure(sizes.len() == width, || {
                format!("{} cached sizes for {width} children", sizes.len())
            })?;

            let last = width - 1;
            let mut total = 0;
            for (i, child) in children.iter().enumerate() {
                total += check_node(
                    child.as_ref(),
                    height - 1,
                    left_edge && i == 0,
                    right_edge && i == last,
                    false,
                )?;
                ensure(sizes[i] == total, || {
                    format!("cached size {} of child {i}, but it adds up to {total}", sizes[i])
                })?;
            }
            Ok(total)
        }
    }
}

impl<T, const N: usize> Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    /// Walks the whole tree, checking that
    /// - the cached sizes (including the array's length) are accurate,
    /// - leaves and branches hold between `N / 2` and `N` entries, except on
    ///   the leftmost and rightmost paths where they hold at least one,
    /// - the root, if it's a branch, has at least two children, and
    /// - all leaves are at the same depth.
    ///
    /// This takes time linear in the length, and is meant for tests.
    pub fn check_invariants(&self) -> Result<()> {
        match &self.root {
            None => {
                ensure(self.length == 0, || {
                    format!("no root, but a cached length of {}", self.length)
                })?;
                ensure(self.height == 0, || format!("no root, but a height of {}", self.height))
            }
            Some(root) => {
                let len = check_node(root, self.height, true, true, true)?;
                ensure(len == self.length, || {
                    format!("cached length {} but {len} elements", self.length)
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use imbl_sized_chunks::Chunk;

    use super::*;

    fn leaf(range: std::ops::Range<u32>) -> Arc<Node<u32, 4>> {
        Arc::new(Node::leaf(range.collect()))
    }

    fn array(root: Node<u32, 4>, height: u8) -> Array<u32, 4> {
        Array {
            length: root.len(),
            root: Some(Arc::new(root)),
            height,
        }
    }

    #[test]
    fn sparse_outer_leaves_are_fine() {
        let root = Node::branch([leaf(0..1), leaf(1..3), leaf(3..4)].into_iter().collect());
        array(root, 1).check_invariants().unwrap();
    }

    #[test]
    fn sparse_inner_leaf() {
        let root = Node::branch([leaf(0..1), leaf(1..2), leaf(2..3)].into_iter().collect());
        assert!(matches!(
            array(root, 1).check_invariants(),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn wrong_cached_length() {
        let mut arr = array(Node::leaf((0..3).collect()), 0);
        arr.length = 4;
        assert!(arr.check_invariants().is_err());
    }

    #[test]
    fn wrong_cached_sizes() {
        let children: Chunk<_, 4> = Chunk::pair(leaf(0..2), leaf(2..4));
        let root = Node::Branch {
            children,
            sizes: [2, 5].into_iter().collect(),
        };
        let arr = Array {
            root: Some(Arc::new(root)),
            length: 5,
            height: 1,
        };
        assert!(arr.check_invariants().is_err());
    }

    #[test]
    fn uneven_depth() {
        let deep = Arc::new(Node::branch(Chunk::pair(leaf(0..2), leaf(2..4))));
        let root = Node::branch(Chunk::pair(deep, leaf(4..6)));
        assert!(array(root, 2).check_invariants().is_err());
    }

    #[test]
    fn single_child_root() {
        let root = Node::branch(Chunk::unit(leaf(0..3)));
        assert!(array(root, 1).check_invariants().is_err());
    }
}
