use std::sync::Arc;

use imbl_sized_chunks::Chunk;

pub(crate) type Children<T, const N: usize> = Chunk<Arc<Node<T, N>>, N>;

// Leaves and branches share the capacity `N`. Branches are pointer-sized per
// entry, so a separate (larger) branch capacity could make sense when `T` is
// big; so far we haven't needed it.
//
// Both variants hold between `N / 2` and `N` entries, except for nodes on the
// leftmost or rightmost path of the tree, which may hold as few as one. All
// leaves are at the same depth.
#[derive(Debug, Clone)]
pub(crate) enum Node<T, const N: usize> {
    Leaf {
        data: Chunk<T, N>,
    },
    Branch {
        children: Children<T, N>,
        // `sizes[i]` is the total number of elements in `children[..=i]`.
        sizes: Chunk<usize, N>,
    },
}

/// Running totals of the children's lengths.
pub(crate) fn cumulative_sizes<T, const N: usize>(children: &Children<T, N>) -> Chunk<usize, N> {
    children
        .iter()
        .scan(0, |acc, child| {
            *acc += child.len();
            Some(*acc)
        })
        .collect()
}

fn offset_before<const N: usize>(sizes: &Chunk<usize, N>, child: usize) -> usize {
    if child == 0 {
        0
    } else {
        sizes[child - 1]
    }
}

/// Finds the child holding the element at `idx`, and the element's index
/// within that child. If `idx` is past the end, the child index is too.
pub(crate) fn locate<const N: usize>(sizes: &Chunk<usize, N>, idx: usize) -> (usize, usize) {
    let child = sizes.partition_point(|&s| s <= idx);
    (child, idx - offset_before(sizes, child))
}

/// Like [`locate`], but for an insertion point: an index falling between two
/// children is resolved to the end of the left one.
fn locate_insertion<const N: usize>(sizes: &Chunk<usize, N>, idx: usize) -> (usize, usize) {
    let child = sizes.partition_point(|&s| s < idx);
    (child, idx - offset_before(sizes, child))
}

/// Moves entries between two neighbouring chunks so that they fit in one
/// chunk if possible, and are evenly shared (the left one rounding up)
/// otherwise.
///
/// Returns `true` if everything ended up in `left`.
pub(crate) fn balance<A, const N: usize>(left: &mut Chunk<A, N>, right: &mut Chunk<A, N>) -> bool {
    let total = left.len() + right.len();
    if total <= N {
        left.append(right);
        return true;
    }

    let want = total - total / 2;
    if left.len() > want {
        let mut moved = left.split_off(want);
        moved.append(right);
        *right = moved;
    } else if left.len() < want {
        let rest = right.split_off(want - left.len());
        left.append(right);
        *right = rest;
    }
    false
}

/// Packs a run of at most `2 * N` entries into one chunk, or two evenly
/// filled ones if they don't fit.
pub(crate) fn pack<A, const N: usize>(items: Vec<A>) -> (Chunk<A, N>, Option<Chunk<A, N>>) {
    debug_assert!(items.len() <= 2 * N);
    if items.len() <= N {
        (items.into_iter().collect(), None)
    } else {
        let split = items.len() - items.len() / 2;
        let mut items = items.into_iter();
        let left = items.by_ref().take(split).collect();
        (left, Some(items.collect()))
    }
}

impl<T, const N: usize> Node<T, N> {
    /// The minimum number of entries in a node that isn't on the outer paths.
    pub(crate) const MIN: usize = N / 2;

    pub(crate) fn leaf(data: Chunk<T, N>) -> Self {
        Node::Leaf { data }
    }

    pub(crate) fn branch(children: Children<T, N>) -> Self {
        let sizes = cumulative_sizes(&children);
        Node::Branch { children, sizes }
    }

    /// The number of elements in this subtree.
    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf { data } => data.len(),
            Node::Branch { sizes, .. } => sizes.last().copied().unwrap_or(0),
        }
    }

    /// The number of entries (elements or children) held directly by this node.
    pub(crate) fn width(&self) -> usize {
        match self {
            Node::Leaf { data } => data.len(),
            Node::Branch { children, .. } => children.len(),
        }
    }

    pub(crate) fn get(&self, mut idx: usize) -> Option<&T> {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { data } => return data.get(idx),
                Node::Branch { children, sizes } => {
                    let (child, offset) = locate(sizes, idx);
                    node = children.get(child)?.as_ref();
                    idx = offset;
                }
            }
        }
    }

    fn refresh_sizes(&mut self) {
        if let Node::Branch { children, sizes } = self {
            *sizes = cumulative_sizes(children);
        }
    }
}

impl<T: Clone, const N: usize> Node<T, N> {
    /// A mutable reference to the element at `idx`, which must be in bounds.
    /// Shared nodes on the way down are copied.
    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut T {
        match self {
            Node::Leaf { data } => &mut data[idx],
            Node::Branch { children, sizes } => {
                let (child, offset) = locate(sizes, idx);
                Arc::make_mut(&mut children[child]).get_mut(offset)
            }
        }
    }

    /// Puts `node` right after child `after`. If this branch is already full,
    /// it is split in two and the right half is returned.
    fn insert_child(&mut self, after: usize, node: Node<T, N>) -> Option<Node<T, N>> {
        let Node::Branch { children, .. } = self else {
            unreachable!("inserting a child into a leaf");
        };

        let pos = after + 1;
        let ret = if children.is_full() {
            let mut right = children.split_off(Self::MIN);
            if pos <= Self::MIN {
                children.insert(pos, Arc::new(node));
            } else {
                right.insert(pos - Self::MIN, Arc::new(node));
            }
            Some(Node::branch(right))
        } else {
            children.insert(pos, Arc::new(node));
            None
        };
        self.refresh_sizes();
        ret
    }

    /// Inserts `elt` so that it ends up at index `idx` of this subtree.
    ///
    /// If this node overflows, it is split in two halves of at least
    /// [`Node::MIN`] entries each and the right half is returned; the caller
    /// is responsible for putting it in place.
    pub(crate) fn insert(&mut self, idx: usize, elt: T) -> Option<Node<T, N>> {
        match self {
            Node::Leaf { data } => {
                if data.is_full() {
                    let mut right = data.split_off(Self::MIN);
                    if idx <= Self::MIN {
                        data.insert(idx, elt);
                    } else {
                        right.insert(idx - Self::MIN, elt);
                    }
                    Some(Node::leaf(right))
                } else {
                    data.insert(idx, elt);
                    None
                }
            }
            Node::Branch { children, sizes } => {
                let (child, offset) = locate_insertion(sizes, idx);
                match Arc::make_mut(&mut children[child]).insert(offset, elt) {
                    None => {
                        for size in sizes[child..].iter_mut() {
                            *size += 1;
                        }
                        None
                    }
                    Some(extra) => self.insert_child(child, extra),
                }
            }
        }
    }

    /// Appends `elt` to the rightmost leaf of this subtree.
    ///
    /// If the rightmost path is full all the way down, nothing is modified and
    /// instead we return a new node of the same height holding only `elt`
    /// (a chain of single-child branches above a one-element leaf). Leaving
    /// the full nodes alone rather than splitting them keeps the tree packed
    /// when it's built by repeated pushes.
    pub(crate) fn push_back(&mut self, elt: T) -> Option<Node<T, N>> {
        match self {
            Node::Leaf { data } => {
                if data.is_full() {
                    return Some(Node::leaf(Chunk::unit(elt)));
                }
                data.push_back(elt);
                None
            }
            Node::Branch { children, sizes } => {
                let last = children.len() - 1;
                match Arc::make_mut(&mut children[last]).push_back(elt) {
                    None => {
                        sizes[last] += 1;
                        None
                    }
                    Some(node) if children.is_full() => {
                        Some(Node::branch(Chunk::unit(Arc::new(node))))
                    }
                    Some(node) => {
                        let total = sizes[last] + node.len();
                        children.push_back(Arc::new(node));
                        sizes.push_back(total);
                        None
                    }
                }
            }
        }
    }

    /// The mirror image of [`Node::push_back`].
    pub(crate) fn push_front(&mut self, elt: T) -> Option<Node<T, N>> {
        match self {
            Node::Leaf { data } => {
                if data.is_full() {
                    return Some(Node::leaf(Chunk::unit(elt)));
                }
                data.push_front(elt);
                None
            }
            Node::Branch { children, sizes } => {
                match Arc::make_mut(&mut children[0]).push_front(elt) {
                    None => {
                        for size in sizes.iter_mut() {
                            *size += 1;
                        }
                        None
                    }
                    Some(node) if children.is_full() => {
                        Some(Node::branch(Chunk::unit(Arc::new(node))))
                    }
                    Some(node) => {
                        children.push_front(Arc::new(node));
                        self.refresh_sizes();
                        None
                    }
                }
            }
        }
    }

    /// Shares out the entries of two neighbouring nodes of the same height
    /// (see [`balance`]). Returns `true` if `right` was emptied into `left`.
    fn rebalance(left: &mut Node<T, N>, right: &mut Node<T, N>) -> bool {
        let merged = match (&mut *left, &mut *right) {
            (Node::Leaf { data: l }, Node::Leaf { data: r }) => return balance(l, r),
            (Node::Branch { children: l, .. }, Node::Branch { children: r, .. }) => balance(l, r),
            _ => unreachable!("siblings at different heights"),
        };
        left.refresh_sizes();
        right.refresh_sizes();
        merged
    }

    /// Removes and returns the element at `idx`, which must be in bounds.
    ///
    /// `left_edge` and `right_edge` tell whether this node lies on the
    /// leftmost or rightmost path of the whole tree. Children that drop below
    /// [`Node::MIN`] entries are merged with (or refilled from) a sibling
    /// unless they are on one of those paths; children on the outer paths are
    /// only dropped once they become empty. Any underflow of this node itself
    /// is left for the caller to fix.
    pub(crate) fn remove(&mut self, idx: usize, left_edge: bool, right_edge: bool) -> T {
        match self {
            Node::Leaf { data } => data.remove(idx),
            Node::Branch { children, sizes } => {
                let (child, offset) = locate(sizes, idx);
                let last = children.len() - 1;
                let child_left_edge = left_edge && child == 0;
                let child_right_edge = right_edge && child == last;

                let ret = Arc::make_mut(&mut children[child]).remove(
                    offset,
                    child_left_edge,
                    child_right_edge,
                );

                let width = children[child].width();
                if width == 0 {
                    children.remove(child);
                } else if width < Self::MIN && !child_left_edge && !child_right_edge {
                    // An inner child always has a sibling: its parent is
                    // either an inner node (with at least MIN >= 2 children)
                    // or an outer one, in which case the child being inner
                    // means it isn't alone.
                    let lo = child.saturating_sub(1);
                    let (l, r) = children.split_at_mut(lo + 1);
                    let merged =
                        Node::rebalance(Arc::make_mut(&mut l[lo]), Arc::make_mut(&mut r[0]));
                    if merged {
                        children.remove(lo + 1);
                    }
                }
                self.refresh_sizes();
                ret
            }
        }
    }

    /// Splits this subtree at `idx`, keeping `[0, idx)` and returning
    /// `[idx, len)`. Requires `0 < idx < self.len()`, which guarantees that
    /// neither half is empty.
    ///
    /// Only the nodes along the cut are rebuilt. They become the new outer
    /// paths of the two halves, so they don't need rebalancing.
    pub(crate) fn split_off(&mut self, idx: usize) -> Node<T, N> {
        debug_assert!(0 < idx && idx < self.len());
        let ret = match self {
            Node::Leaf { data } => return Node::leaf(data.split_off(idx)),
            Node::Branch { children, sizes } => {
                let (child, offset) = locate(sizes, idx);
                if offset == 0 {
                    children.split_off(child)
                } else {
                    let right_part = Arc::make_mut(&mut children[child]).split_off(offset);
                    let mut right = children.split_off(child + 1);
                    right.push_front(Arc::new(right_part));
                    right
                }
            }
        };
        self.refresh_sizes();
        Node::branch(ret)
    }

    /// Attaches `tree`, whose height is `depth` less than ours, to the right
    /// of this subtree. `left_edge` tells whether we are on the leftmost path
    /// of the tree. Returns the right half of this node if it had to split.
    pub(crate) fn concat_right(
        &mut self,
        tree: Node<T, N>,
        depth: u8,
        left_edge: bool,
    ) -> Option<Node<T, N>> {
        let Node::Branch { children, .. } = self else {
            unreachable!("the taller tree has a branch at every level above the shorter one");
        };
        let last = children.len() - 1;
        let child_left_edge = left_edge && last == 0;

        let extra = if depth == 1 {
            let child = Arc::unwrap_or_clone(children.pop_back());
            let (node, extra) = crate::concat::concat_nodes(child, tree, child_left_edge, true);
            children.push_back(Arc::new(node));
            extra
        } else {
            Arc::make_mut(&mut children[last]).concat_right(tree, depth - 1, child_left_edge)
        };

        self.refresh_sizes();
        extra.and_then(|extra| self.insert_child(last, extra))
    }

    /// The mirror image of [`Node::concat_right`]: attaches the shorter
    /// `tree` to the left of this subtree.
    pub(crate) fn concat_left(
        &mut self,
        tree: Node<T, N>,
        depth: u8,
        right_edge: bool,
    ) -> Option<Node<T, N>> {
        let Node::Branch { children, .. } = self else {
            unreachable!("the taller tree has a branch at every level above the shorter one");
        };
        let child_right_edge = right_edge && children.len() == 1;

        let extra = if depth == 1 {
            let child = Arc::unwrap_or_clone(children.pop_front());
            let (node, extra) = crate::concat::concat_nodes(tree, child, true, child_right_edge);
            children.push_front(Arc::new(node));
            extra
        } else {
            Arc::make_mut(&mut children[0]).concat_left(tree, depth - 1, child_right_edge)
        };

        self.refresh_sizes();
        extra.and_then(|extra| self.insert_child(0, extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(range: std::ops::Range<u32>) -> Chunk<u32, 4> {
        range.collect()
    }

    #[test]
    fn balance_merges_when_it_fits() {
        let mut l = chunk(0..1);
        let mut r = chunk(1..4);
        assert!(balance(&mut l, &mut r));
        assert_eq!(&l[..], &[0, 1, 2, 3]);
        assert!(r.is_empty());
    }

    #[test]
    fn balance_shares_evenly() {
        let mut l = chunk(0..4);
        let mut r = chunk(4..5);
        assert!(!balance(&mut l, &mut r));
        assert_eq!(&l[..], &[0, 1, 2]);
        assert_eq!(&r[..], &[3, 4]);

        let mut l = chunk(0..1);
        let mut r = chunk(1..5);
        assert!(!balance(&mut l, &mut r));
        assert_eq!(&l[..], &[0, 1, 2]);
        assert_eq!(&r[..], &[3, 4]);
    }

    #[test]
    fn pack_splits_overfull_runs() {
        let (l, r) = pack::<u32, 4>((0..4).collect());
        assert_eq!(&l[..], &[0, 1, 2, 3]);
        assert!(r.is_none());

        let (l, r) = pack::<u32, 4>((0..7).collect());
        assert_eq!(&l[..], &[0, 1, 2, 3]);
        assert_eq!(&r.unwrap()[..], &[4, 5, 6]);
    }

    #[test]
    fn locate_by_cumulative_size() {
        let sizes: Chunk<usize, 4> = [3, 5, 9].into_iter().collect();
        assert_eq!(locate(&sizes, 0), (0, 0));
        assert_eq!(locate(&sizes, 3), (1, 0));
        assert_eq!(locate(&sizes, 8), (2, 3));
        assert_eq!(locate(&sizes, 9).0, 3);

        assert_eq!(locate_insertion(&sizes, 0), (0, 0));
        assert_eq!(locate_insertion(&sizes, 3), (0, 3));
        assert_eq!(locate_insertion(&sizes, 9), (2, 4));
    }

    #[test]
    fn full_leaf_splits_on_insert() {
        let mut leaf = Node::<u32, 4>::leaf(chunk(0..4));
        let Some(Node::Leaf { data: right }) = leaf.insert(3, 10) else {
            panic!("expected a split");
        };
        let Node::Leaf { data: left } = &leaf else {
            unreachable!()
        };
        assert_eq!(&left[..], &[0, 1]);
        assert_eq!(&right[..], &[2, 10, 3]);
    }
}
