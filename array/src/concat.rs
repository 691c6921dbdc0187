//! Concatenation of two trees of the same height.
//!
//! Gluing two trees together turns the right edge of the first and the left
//! edge of the second into inner paths, and the nodes on the outer paths are
//! allowed to be sparse. So we walk down both edges together (the "seam"),
//! concatenate the two innermost nodes at each level, and repack each level
//! on the way back up so that every node on the seam ends up with at least
//! `N / 2` entries.
//!
//! The only tricky case is when both seam nodes at some level have a single
//! child: then there is no sibling to merge an undersized result with, and we
//! hand back a node that is itself undersized. The level above has siblings
//! to spare (the trees' roots have at least two children), and fixes it up
//! by concatenating it with its neighbour, which repairs the whole chain.

use std::sync::Arc;

use crate::node::{balance, pack, Node};

/// Concatenates two nodes of the same height, returning one node or two
/// evenly filled ones.
///
/// `left_edge` tells whether the leftmost path of `a` is the leftmost path of
/// the whole tree, and `right_edge` the same for the rightmost path of `b`.
/// Apart from the returned nodes themselves, which may be undersized, every
/// node in the result respects the usual bounds unless it's on one of the
/// outer paths.
pub(crate) fn concat_nodes<T: Clone, const N: usize>(
    a: Node<T, N>,
    b: Node<T, N>,
    left_edge: bool,
    right_edge: bool,
) -> (Node<T, N>, Option<Node<T, N>>) {
    match (a, b) {
        (Node::Leaf { data: mut a }, Node::Leaf { data: mut b }) => {
            if balance(&mut a, &mut b) {
                (Node::leaf(a), None)
            } else {
                (Node::leaf(a), Some(Node::leaf(b)))
            }
        }
        (Node::Branch { children: mut a, .. }, Node::Branch { children: mut b, .. }) => {
            let seam_left_edge = left_edge && a.len() == 1;
            let seam_right_edge = right_edge && b.len() == 1;
            let a_last = Arc::unwrap_or_clone(a.pop_back());
            let b_first = Arc::unwrap_or_clone(b.pop_front());

            let (mut mid, mut mid_extra) =
                concat_nodes(a_last, b_first, seam_left_edge, seam_right_edge);

            let undersized = mid_extra.is_none() && mid.width() < Node::<T, N>::MIN;
            if undersized && !seam_left_edge && !seam_right_edge {
                if !a.is_empty() {
                    let neighbour = Arc::unwrap_or_clone(a.pop_back());
                    let neighbour_left_edge = left_edge && a.is_empty();
                    (mid, mid_extra) = concat_nodes(neighbour, mid, neighbour_left_edge, false);
                } else if !b.is_empty() {
                    let neighbour = Arc::unwrap_or_clone(b.pop_front());
                    let neighbour_right_edge = right_edge && b.is_empty();
                    (mid, mid_extra) = concat_nodes(mid, neighbour, false, neighbour_right_edge);
                }
                // Otherwise both seam nodes had a single child, and our caller
                // will repair the chain.
            }

            let mut children = Vec::with_capacity(a.len() + 2 + b.len());
            children.extend(a);
            children.push(Arc::new(mid));
            children.extend(mid_extra.map(Arc::new));
            children.extend(b);

            let (left, right) = pack(children);
            (Node::branch(left), right.map(Node::branch))
        }
        _ => unreachable!("concatenating nodes of different heights"),
    }
}
