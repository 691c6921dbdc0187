use std::{
    hash::{Hash, Hasher},
    ops::Index,
    sync::Arc,
};

use imbl_sized_chunks::Chunk;

use crate::{
    concat::concat_nodes,
    error::{check_index, Result},
    iter::{IntoIter, Iter},
    node::Node,
    Const, ValidBranchingConstant,
};

/// A persistent sequence with fast random access, insertion and removal.
///
/// This is implemented internally as a B-tree of chunks, and the parameter
/// `N` controls both the leaf size and the branching factor. Values between
/// `16` and `64` are pretty reasonable.
///
/// Every operation leaves the array it was called on untouched. The methods
/// taking `&self` return a new array, and the ones taking `&mut self` copy any
/// node they modify if another array shares it.
pub struct Array<T, const N: usize>
where
    Const<N>: ValidBranchingConstant,
{
    pub(crate) root: Option<Arc<Node<T, N>>>,
    pub(crate) length: usize,
    // Leaves are at height zero. The empty array also has height zero.
    pub(crate) height: u8,
}

impl<T, const N: usize> Clone for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
            height: self.height,
        }
    }
}

impl<T, const N: usize> Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    /// The empty array.
    pub fn new() -> Self {
        Self {
            root: None,
            length: 0,
            height: 0,
        }
    }

    /// An array holding just `elt`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use xqdb_array::DefaultArray;
    /// let arr = DefaultArray::singleton("x");
    /// assert_eq!(arr.len(), 1);
    /// assert_eq!(arr.get(0), Some(&"x"));
    /// ```
    pub fn singleton(elt: T) -> Self {
        Self {
            root: Some(Arc::new(Node::leaf(Chunk::unit(elt)))),
            length: 1,
            height: 0,
        }
    }

    /// The number of elements in this array.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Gets the element at `idx`, or `None` if `idx` is out-of-bounds.
    ///
    /// Runs in time `O(log n)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use xqdb_array::DefaultArray;
    /// let arr: DefaultArray<_> = (0..100).collect();
    /// assert_eq!(arr.get(42), Some(&42));
    /// assert_eq!(arr.get(100), None);
    /// ```
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.root.as_ref().and_then(|root| root.get(idx))
    }

    /// Like [`Array::get`], but reports an out-of-bounds index as an
    /// [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange).
    pub fn try_get(&self, idx: usize) -> Result<&T> {
        self.get(idx).ok_or(crate::Error::IndexOutOfRange {
            index: idx,
            len: self.length,
        })
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.length.checked_sub(1).and_then(|idx| self.get(idx))
    }

    pub fn iter(&self) -> Iter<'_, T, N> {
        self.into_iter()
    }

    /// An iterator over the elements from index `idx` onwards. `idx` may be
    /// equal to the length, giving an empty iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use xqdb_array::DefaultArray;
    /// let arr: DefaultArray<_> = (0..10).collect();
    /// let tail: Vec<_> = arr.iter_starting_at(7).unwrap().copied().collect();
    /// assert_eq!(tail, vec![7, 8, 9]);
    /// assert!(arr.iter_starting_at(11).is_err());
    /// ```
    pub fn iter_starting_at(&self, idx: usize) -> Result<Iter<'_, T, N>> {
        check_index(idx, self.length + 1, self.length)?;
        Ok(Iter::starting_at(self.root.as_deref(), idx, self.length))
    }

    /// Removes one level from the top of the tree for as long as the root
    /// is a branch with a single child.
    fn collapse_root(&mut self) {
        if self.length == 0 {
            self.root = None;
            self.height = 0;
            return;
        }

        loop {
            let only_child = match self.root.as_deref() {
                Some(Node::Branch { children, .. }) if children.len() == 1 => {
                    Arc::clone(&children[0])
                }
                _ => break,
            };
            self.root = Some(only_child);
            self.height -= 1;
            log::trace!("collapsed array root, height is now {}", self.height);
        }
    }

    /// Puts a new root above the current one and the `right` sibling that
    /// split from it.
    fn grow(&mut self, left: Arc<Node<T, N>>, right: Node<T, N>) {
        self.root = Some(Arc::new(Node::branch(Chunk::pair(left, Arc::new(right)))));
        self.height += 1;
        log::trace!("grew array root, height is now {}", self.height);
    }
}

impl<T: Clone, const N: usize> Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    // The root of a non-empty array. Shared nodes get copied by the caller as
    // they go.
    fn root_mut(&mut self) -> &mut Node<T, N> {
        Arc::make_mut(self.root.as_mut().expect("non-empty array has a root"))
    }

    /// Adds an element to the end of this array.
    ///
    /// This only touches the rightmost path of the tree.
    pub fn push_back(&mut self, elt: T) {
        if self.is_empty() {
            *self = Self::singleton(elt);
            return;
        }

        if let Some(extra) = self.root_mut().push_back(elt) {
            let old_root = self.root.take().expect("non-empty array has a root");
            self.grow(old_root, extra);
        }
        self.length += 1;
    }

    /// Adds an element to the start of this array.
    ///
    /// This only touches the leftmost path of the tree.
    pub fn push_front(&mut self, elt: T) {
        if self.is_empty() {
            *self = Self::singleton(elt);
            return;
        }

        if let Some(extra) = self.root_mut().push_front(elt) {
            let old_root = self.root.take().expect("non-empty array has a root");
            self.root = Some(Arc::new(Node::branch(Chunk::pair(
                Arc::new(extra),
                old_root,
            ))));
            self.height += 1;
            log::trace!("grew array root, height is now {}", self.height);
        }
        self.length += 1;
    }

    /// Removes and returns the last element, or `None` if we're empty.
    pub fn pop_back(&mut self) -> Option<T> {
        let idx = self.length.checked_sub(1)?;
        self.remove_at(idx).ok()
    }

    /// Removes and returns the first element, or `None` if we're empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            self.remove_at(0).ok()
        }
    }

    /// Inserts `elt` at position `idx`, shifting everything after it to the
    /// right. `idx` may be equal to the length, in which case this is
    /// [`Array::push_back`].
    ///
    /// Runs in time `O(log n)`.
    pub fn insert(&mut self, idx: usize, elt: T) -> Result<()> {
        check_index(idx, self.length + 1, self.length)?;
        if idx == self.length {
            self.push_back(elt);
        } else if idx == 0 {
            self.push_front(elt);
        } else {
            if let Some(extra) = self.root_mut().insert(idx, elt) {
                let old_root = self.root.take().expect("non-empty array has a root");
                self.grow(old_root, extra);
            }
            self.length += 1;
        }
        Ok(())
    }

    /// Removes and returns the element at position `idx`, shifting everything
    /// after it to the left.
    ///
    /// Runs in time `O(log n)`.
    pub fn remove_at(&mut self, idx: usize) -> Result<T> {
        check_index(idx, self.length, self.length)?;
        let ret = self.root_mut().remove(idx, true, true);
        self.length -= 1;
        self.collapse_root();
        Ok(ret)
    }

    /// Replaces the element at `idx`, returning the old one.
    pub fn set(&mut self, idx: usize, elt: T) -> Result<T> {
        check_index(idx, self.length, self.length)?;
        Ok(std::mem::replace(self.root_mut().get_mut(idx), elt))
    }

    /// Moves all the elements of `other` to the end of this array.
    ///
    /// Runs in time `O(log n)`: only the nodes along the edges where the two
    /// trees meet are rebuilt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use xqdb_array::DefaultArray;
    /// let mut arr: DefaultArray<_> = (0..3).collect();
    /// arr.append((3..6).collect());
    /// assert_eq!(arr.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    /// ```
    pub fn append(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }

        let length = self.length + other.length;
        let (Some(left), Some(right)) = (self.root.take(), other.root) else {
            unreachable!("non-empty arrays have a root");
        };

        if self.height == other.height {
            let (node, extra) = concat_nodes(
                Arc::unwrap_or_clone(left),
                Arc::unwrap_or_clone(right),
                true,
                true,
            );
            self.root = Some(Arc::new(node));
            if let Some(extra) = extra {
                let old_root = self.root.take().expect("root was just set");
                self.grow(old_root, extra);
            }
        } else if self.height > other.height {
            let depth = self.height - other.height;
            log::trace!("appending a tree {depth} levels shorter");
            let mut left = left;
            let extra =
                Arc::make_mut(&mut left).concat_right(Arc::unwrap_or_clone(right), depth, true);
            match extra {
                Some(extra) => self.grow(left, extra),
                None => self.root = Some(left),
            }
        } else {
            let depth = other.height - self.height;
            log::trace!("prepending a tree {depth} levels shorter");
            let mut right = right;
            let extra =
                Arc::make_mut(&mut right).concat_left(Arc::unwrap_or_clone(left), depth, true);
            self.height = other.height;
            match extra {
                Some(extra) => self.grow(right, extra),
                None => self.root = Some(right),
            }
        }

        self.length = length;
        self.collapse_root();
    }

    /// Splits this array in two at `idx`, keeping `[0, idx)` and returning
    /// `[idx, len)`.
    ///
    /// Runs in time `O(log n)`.
    pub fn split_off(&mut self, idx: usize) -> Result<Self> {
        check_index(idx, self.length + 1, self.length)?;
        if idx == self.length {
            return Ok(Self::new());
        }
        if idx == 0 {
            return Ok(std::mem::take(self));
        }

        let right = self.root_mut().split_off(idx);
        let mut right = Self {
            root: Some(Arc::new(right)),
            length: self.length - idx,
            height: self.height,
        };
        self.length = idx;
        self.collapse_root();
        right.collapse_root();
        Ok(right)
    }

    /// Shortens this array to `len` elements. Does nothing if it's already
    /// that short.
    pub fn truncate(&mut self, len: usize) {
        if len == 0 {
            *self = Self::new();
        } else if len < self.length {
            // The right half is dropped; only the cut path gets copied.
            self.root_mut().split_off(len);
            self.length = len;
            self.collapse_root();
        }
    }

    /// A new array with `elt` inserted at `idx`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use xqdb_array::DefaultArray;
    /// let arr: DefaultArray<_> = (0..5).collect();
    /// let arr2 = arr.insert_before(2, 10).unwrap();
    /// assert_eq!(arr2.iter().copied().collect::<Vec<_>>(), vec![0, 1, 10, 2, 3, 4]);
    /// assert_eq!(arr.len(), 5);
    /// ```
    pub fn insert_before(&self, idx: usize, elt: T) -> Result<Self> {
        check_index(idx, self.length + 1, self.length)?;
        let mut ret = self.clone();
        ret.insert(idx, elt)?;
        Ok(ret)
    }

    /// A new array without the element at `idx`.
    pub fn remove(&self, idx: usize) -> Result<Self> {
        check_index(idx, self.length, self.length)?;
        let mut ret = self.clone();
        ret.remove_at(idx)?;
        Ok(ret)
    }

    /// A new array with `elt` in place of the element at `idx`.
    pub fn update(&self, idx: usize, elt: T) -> Result<Self> {
        check_index(idx, self.length, self.length)?;
        let mut ret = self.clone();
        ret.set(idx, elt)?;
        Ok(ret)
    }

    /// A new array with `elt` added at the end.
    pub fn snoc(&self, elt: T) -> Self {
        let mut ret = self.clone();
        ret.push_back(elt);
        ret
    }

    /// A new array with `elt` added at the start.
    pub fn cons(&self, elt: T) -> Self {
        let mut ret = self.clone();
        ret.push_front(elt);
        ret
    }

    /// The elements of this array followed by those of `other`.
    pub fn concat(&self, other: &Self) -> Self {
        let mut ret = self.clone();
        ret.append(other.clone());
        ret
    }

    /// The subarray from index `from` (inclusive) to index `to` (exclusive).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use xqdb_array::DefaultArray;
    /// let arr: DefaultArray<_> = (0..6).collect();
    /// let sliced = arr.slice(1, 5).unwrap();
    /// assert_eq!(sliced.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    /// assert!(arr.slice(4, 2).is_err());
    /// ```
    pub fn slice(&self, from: usize, to: usize) -> Result<Self> {
        check_index(to, self.length + 1, self.length)?;
        check_index(from, to + 1, to)?;
        let mut ret = self.clone();
        ret.truncate(to);
        ret.split_off(from)
    }

    /// All elements but the first, or `None` if we're empty.
    pub fn tail(&self) -> Option<Self> {
        self.remove(0).ok()
    }

    /// All elements but the last, or `None` if we're empty.
    pub fn init(&self) -> Option<Self> {
        let idx = self.length.checked_sub(1)?;
        self.remove(idx).ok()
    }

    /// The elements of this array in reverse order.
    pub fn reverse(&self) -> Self {
        self.iter().rev().cloned().collect()
    }
}

impl<T, const N: usize> Default for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug, const N: usize> std::fmt::Debug for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// Two arrays with the same elements can have differently shaped trees, so
// comparison and hashing go through the elements.
impl<T: PartialEq, const N: usize> PartialEq for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn eq(&self, other: &Self) -> bool {
        let same_root = match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.length == other.length && (same_root || self.iter().eq(other.iter()))
    }
}

impl<T: Eq, const N: usize> Eq for Array<T, N> where Const<N>: ValidBranchingConstant {}

impl<T: Hash, const N: usize> Hash for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for elt in self {
            elt.hash(state);
        }
    }
}

impl<T, const N: usize> Index<usize> for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("index out of range")
    }
}

impl<T: Clone, const N: usize> Extend<T> for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        // Pushing fills up the rightmost leaf before starting a new one, so
        // this builds a tree of full nodes.
        for elt in iter {
            self.push_back(elt);
        }
    }
}

impl<T: Clone, const N: usize> FromIterator<T> for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ret = Array::new();
        ret.extend(iter);
        ret
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, N>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(self.root.as_deref(), self.length)
    }
}

impl<T: Clone, const N: usize> IntoIterator for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.root, self.length)
    }
}

impl<T: serde::Serialize, const N: usize> serde::Serialize for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for elt in self.iter() {
            seq.serialize_element(elt)?;
        }
        seq.end()
    }
}

impl<'de, T: Clone + serde::Deserialize<'de>, const N: usize> serde::Deserialize<'de>
    for Array<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let vec: Vec<T> = Vec::deserialize(deserializer)?;
        Ok(vec.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, hash::BuildHasher};

    use super::*;
    use crate::Error;

    fn collect_nodes<T, const N: usize>(
        node: &Arc<Node<T, N>>,
        out: &mut HashSet<*const Node<T, N>>,
    ) {
        out.insert(Arc::as_ptr(node));
        if let Node::Branch { children, .. } = node.as_ref() {
            for child in children.iter() {
                collect_nodes(child, out);
            }
        }
    }

    /// The number of nodes in `new` that aren't shared with `old`.
    fn fresh_nodes<T, const N: usize>(old: &Array<T, N>, new: &Array<T, N>) -> usize
    where
        Const<N>: ValidBranchingConstant,
    {
        let mut old_nodes = HashSet::new();
        let mut new_nodes = HashSet::new();
        if let Some(root) = &old.root {
            collect_nodes(root, &mut old_nodes);
        }
        if let Some(root) = &new.root {
            collect_nodes(root, &mut new_nodes);
        }
        new_nodes.difference(&old_nodes).count()
    }

    #[test]
    fn basic() {
        let mut arr = Array::<u32, 4>::new();
        arr.check_invariants().unwrap();
        arr.push_back(1);
        assert_eq!(arr.get(0), Some(&1));
        assert_eq!(arr.get(1), None);
        arr.check_invariants().unwrap();

        arr.push_back(2);
        arr.push_back(3);
        arr.push_front(0);
        arr.check_invariants().unwrap();
        assert_eq!(arr.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        assert_eq!(arr.pop_back(), Some(3));
        assert_eq!(arr.pop_front(), Some(0));
        arr.check_invariants().unwrap();

        arr.extend([1, 2, 3]);
        arr.check_invariants().unwrap();
        assert_eq!(
            arr.iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 1, 2, 3]
        );
        assert_eq!(arr.clone().into_iter().collect::<Vec<_>>(), vec![1, 2, 1, 2, 3]);
        assert_eq!(arr.iter().rev().copied().collect::<Vec<_>>(), vec![3, 2, 1, 2, 1]);
    }

    #[test]
    fn empty() {
        let arr = Array::<u32, 4>::new();
        assert_eq!(arr.len(), 0);
        assert_eq!(arr.get(0), None);
        assert_eq!(
            arr.try_get(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        );
        assert_eq!(arr.iter().next(), None);
        assert_eq!(arr.first(), None);
        assert_eq!(arr.last(), None);
        assert!(arr.tail().is_none());
        assert!(arr.init().is_none());

        let one = arr.insert_before(0, 7).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(0), Some(&7));
        one.check_invariants().unwrap();
        assert!(arr.is_empty());
    }

    #[test]
    fn out_of_range_leaves_array_alone() {
        let mut arr: Array<u32, 4> = (0..10).collect();
        let before = arr.clone();

        assert_eq!(
            arr.insert(11, 0),
            Err(Error::IndexOutOfRange { index: 11, len: 10 })
        );
        assert_eq!(
            arr.remove_at(10),
            Err(Error::IndexOutOfRange { index: 10, len: 10 })
        );
        assert_eq!(
            arr.set(10, 0),
            Err(Error::IndexOutOfRange { index: 10, len: 10 })
        );
        assert!(arr.split_off(11).is_err());
        assert_eq!(
            arr.slice(3, 11),
            Err(Error::IndexOutOfRange { index: 11, len: 10 })
        );
        assert_eq!(
            arr.slice(4, 3),
            Err(Error::IndexOutOfRange { index: 4, len: 3 })
        );

        assert!(Arc::ptr_eq(
            arr.root.as_ref().unwrap(),
            before.root.as_ref().unwrap()
        ));
        assert_eq!(arr, before);
        arr.check_invariants().unwrap();
    }

    #[test]
    fn old_versions_are_unchanged() {
        let base: Array<u32, 4> = (0..100).collect();
        let inserted = base.insert_before(50, 1000).unwrap();
        let removed = base.remove(10).unwrap();
        let updated = base.update(99, 7).unwrap();
        let sliced = base.slice(20, 80).unwrap();
        let joined = base.concat(&sliced);

        assert_eq!(base.iter().copied().collect::<Vec<_>>(), (0..100).collect::<Vec<_>>());
        assert_eq!(inserted[50], 1000);
        assert_eq!(inserted.len(), 101);
        assert_eq!(removed[10], 11);
        assert_eq!(updated[99], 7);
        assert_eq!(sliced.first(), Some(&20));
        assert_eq!(sliced.last(), Some(&79));
        assert_eq!(joined.len(), 160);
        assert_eq!(joined[100], 20);

        for arr in [&base, &inserted, &removed, &updated, &sliced, &joined] {
            arr.check_invariants().unwrap();
        }
    }

    #[test]
    fn insert_shares_untouched_subtrees() {
        let arr: Array<u32, 8> = (0..10_000).collect();
        let height = usize::from(arr.height);

        for idx in [0, 1, 2_500, 5_000, 9_999, 10_000] {
            let inserted = arr.insert_before(idx, 42).unwrap();
            // One fresh node per level along the path, at most one more per
            // level for a split, and possibly a new root.
            let fresh = fresh_nodes(&arr, &inserted);
            assert!(fresh <= 2 * (height + 1) + 1, "{fresh} fresh nodes at {idx}");
        }

        let removed = arr.remove(5_000).unwrap();
        // Rebalancing may also copy one sibling per level.
        assert!(fresh_nodes(&arr, &removed) <= 2 * (height + 1));
    }

    #[test]
    fn snoc_and_cons_touch_one_spine() {
        let arr: Array<u32, 8> = (0..10_000).collect();
        let height = usize::from(arr.height);

        // The rightmost leaf is full, so this starts a new leaf below a copy
        // of the right spine.
        let snoced = arr.snoc(42);
        assert!(fresh_nodes(&arr, &snoced) <= height + 2);
        snoced.check_invariants().unwrap();

        // The left spine is full up to the root: a copy of it, plus a new
        // chain hanging off the root.
        let consed = arr.cons(42);
        assert!(fresh_nodes(&arr, &consed) <= 2 * (height + 1));
        consed.check_invariants().unwrap();

        // Whenever a whole branch on the right spine fills up, a new chain
        // starts next to it.
        let mut arr = arr;
        for i in 0..100 {
            let next = arr.snoc(i);
            assert!(fresh_nodes(&arr, &next) <= 2 * (usize::from(next.height) + 1));
            arr = next;
        }
    }

    #[test]
    fn truncate_keeps_a_prefix() {
        let base: Array<u32, 4> = (0..100).collect();
        for len in [0, 1, 3, 4, 5, 50, 99, 100, 150] {
            let mut arr = base.clone();
            arr.truncate(len);
            arr.check_invariants().unwrap();
            let expected: Vec<u32> = (0..len.min(100) as u32).collect();
            assert_eq!(arr.iter().copied().collect::<Vec<_>>(), expected);
        }
        assert_eq!(base.len(), 100);
    }

    #[test]
    fn concat_and_slice_share_untouched_subtrees() {
        let left: Array<u32, 8> = (0..5_000).collect();
        let right: Array<u32, 8> = (5_000..10_000).collect();
        let joined = left.concat(&right);
        let height = usize::from(joined.height);
        assert_eq!(
            joined.iter().copied().collect::<Vec<_>>(),
            (0..10_000).collect::<Vec<_>>()
        );

        // Only the seam is rebuilt: at most two nodes per level, plus a root.
        let mut old_nodes = HashSet::new();
        collect_nodes(left.root.as_ref().unwrap(), &mut old_nodes);
        collect_nodes(right.root.as_ref().unwrap(), &mut old_nodes);
        let mut new_nodes = HashSet::new();
        collect_nodes(joined.root.as_ref().unwrap(), &mut new_nodes);
        assert!(new_nodes.difference(&old_nodes).count() <= 2 * (height + 1) + 1);

        let sliced = joined.slice(1_234, 8_765).unwrap();
        assert!(fresh_nodes(&joined, &sliced) <= 2 * (height + 1));
    }

    #[test]
    fn equality_ignores_shape() {
        let pushed: Array<u32, 4> = (0..50).collect();
        let mut consed = Array::<u32, 4>::new();
        for i in (0..50).rev() {
            consed.push_front(i);
        }
        assert_eq!(pushed, consed);
        assert_ne!(pushed, consed.remove(3).unwrap());

        let state = std::collections::hash_map::RandomState::new();
        assert_eq!(state.hash_one(&pushed), state.hash_one(&consed));
    }

    #[test]
    fn reverse() {
        let arr: Array<u32, 4> = (0..37).collect();
        let rev = arr.reverse();
        rev.check_invariants().unwrap();
        assert_eq!(rev.iter().copied().collect::<Vec<_>>(), (0..37).rev().collect::<Vec<_>>());
    }

    #[test]
    fn arrays_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Array<String, 32>>();
    }

    #[test]
    fn serde_as_a_sequence() {
        let arr: Array<u32, 4> = (0..10).collect();
        let json = serde_json::to_string(&arr).unwrap();
        assert_eq!(json, "[0,1,2,3,4,5,6,7,8,9]");
        let back: Array<u32, 4> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, arr);
        back.check_invariants().unwrap();
    }
}
