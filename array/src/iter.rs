//! Iteration over [`Array`](crate::Array)s.
//!
//! Both iterators keep a stack of child iterators, one per level of the tree,
//! and only go back up the tree when a leaf runs out. Since the length is
//! known up front, they implement [`ExactSizeIterator`].

use std::{iter::FusedIterator, sync::Arc};

use imbl_sized_chunks::Chunk;

use crate::node::{locate, Node};

type ChunkIter<T, const N: usize> = imbl_sized_chunks::sized_chunk::Iter<T, N>;
type BranchChunkIter<T, const N: usize> = ChunkIter<Arc<Node<T, N>>, N>;

fn step<I: DoubleEndedIterator>(iter: &mut I, back: bool) -> Option<I::Item> {
    if back {
        iter.next_back()
    } else {
        iter.next()
    }
}

/// One end of a borrowing iterator.
#[derive(Debug)]
struct Cursor<'a, T, const N: usize> {
    stack: Vec<std::slice::Iter<'a, Arc<Node<T, N>>>>,
    leaf: std::slice::Iter<'a, T>,
}

// Deriving would require `T: Clone`.
impl<T, const N: usize> Clone for Cursor<'_, T, N> {
    fn clone(&self) -> Self {
        Cursor {
            stack: self.stack.clone(),
            leaf: self.leaf.clone(),
        }
    }
}

impl<'a, T, const N: usize> Cursor<'a, T, N> {
    fn empty() -> Self {
        Cursor {
            stack: Vec::new(),
            leaf: [].iter(),
        }
    }

    /// A cursor at the first (or, if `back` is set, the last) element under
    /// `node`.
    fn edge(mut node: &'a Node<T, N>, back: bool) -> Self {
        let mut stack = Vec::new();
        while let Node::Branch { children, .. } = node {
            let mut iter = children.iter();
            node = step(&mut iter, back).expect("empty branch");
            stack.push(iter);
        }

        let Node::Leaf { data } = node else {
            unreachable!();
        };
        Cursor {
            stack,
            leaf: data.iter(),
        }
    }

    /// A forward cursor at the element `idx`, which must be in bounds.
    fn at(mut node: &'a Node<T, N>, mut idx: usize) -> Self {
        let mut stack = Vec::new();
        while let Node::Branch { children, sizes } = node {
            let (child, offset) = locate(sizes, idx);
            let mut iter = children[child..].iter();
            node = iter.next().expect("index out of bounds");
            stack.push(iter);
            idx = offset;
        }

        let Node::Leaf { data } = node else {
            unreachable!();
        };
        Cursor {
            stack,
            leaf: data[idx..].iter(),
        }
    }

    fn advance(&mut self, back: bool) -> Option<&'a T> {
        if let Some(ret) = step(&mut self.leaf, back) {
            return Some(ret);
        }

        let height = self.stack.len();
        let mut next = loop {
            let iter = self.stack.last_mut()?;
            match step(iter, back) {
                Some(next) => break next,
                None => {
                    self.stack.pop();
                }
            }
        };

        while self.stack.len() < height {
            let Node::Branch { children, .. } = next.as_ref() else {
                unreachable!();
            };
            let mut iter = children.iter();
            next = step(&mut iter, back).expect("empty branch");
            self.stack.push(iter);
        }

        let Node::Leaf { data } = next.as_ref() else {
            unreachable!();
        };
        self.leaf = data.iter();
        step(&mut self.leaf, back)
    }
}

/// A borrowing iterator over an [`Array`](crate::Array), in index order.
///
/// It can also be driven from the back. The two ends share the count of
/// remaining elements, so they never cross.
#[derive(Debug)]
pub struct Iter<'a, T, const N: usize> {
    front: Cursor<'a, T, N>,
    back: Cursor<'a, T, N>,
    remaining: usize,
}

impl<T, const N: usize> Clone for Iter<'_, T, N> {
    fn clone(&self) -> Self {
        Iter {
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T, const N: usize> Iter<'a, T, N> {
    pub(crate) fn new(root: Option<&'a Node<T, N>>, len: usize) -> Self {
        Self::starting_at(root, 0, len)
    }

    /// Requires `idx <= len`.
    pub(crate) fn starting_at(root: Option<&'a Node<T, N>>, idx: usize, len: usize) -> Self {
        match root {
            Some(root) if idx < len => Iter {
                front: Cursor::at(root, idx),
                back: Cursor::edge(root, true),
                remaining: len - idx,
            },
            _ => Iter {
                front: Cursor::empty(),
                back: Cursor::empty(),
                remaining: 0,
            },
        }
    }
}

impl<'a, T, const N: usize> Iterator for Iter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.front.advance(false)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, const N: usize> DoubleEndedIterator for Iter<'_, T, N> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.back.advance(true)
    }
}

impl<T, const N: usize> ExactSizeIterator for Iter<'_, T, N> {}

impl<T, const N: usize> FusedIterator for Iter<'_, T, N> {}

/// An owning iterator over an [`Array`](crate::Array).
///
/// Nodes that aren't shared with another array are taken apart instead of
/// cloned.
pub struct IntoIter<T, const N: usize> {
    stack: Vec<BranchChunkIter<T, N>>,
    leaf: ChunkIter<T, N>,
    remaining: usize,
}

impl<T: Clone, const N: usize> IntoIter<T, N> {
    pub(crate) fn new(root: Option<Arc<Node<T, N>>>, len: usize) -> Self {
        let mut stack = Vec::new();
        let Some(root) = root else {
            return IntoIter {
                stack,
                leaf: Chunk::new().into_iter(),
                remaining: 0,
            };
        };

        let mut node = Arc::unwrap_or_clone(root);
        while let Node::Branch { children, .. } = node {
            let mut iter = children.into_iter();
            node = Arc::unwrap_or_clone(iter.next().expect("empty branch"));
            stack.push(iter);
        }

        let Node::Leaf { data } = node else {
            unreachable!();
        };
        IntoIter {
            stack,
            leaf: data.into_iter(),
            remaining: len,
        }
    }
}

impl<T: Clone, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ret) = self.leaf.next() {
            self.remaining -= 1;
            return Some(ret);
        }

        let height = self.stack.len();
        let mut next = loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(next) => break next,
                None => {
                    self.stack.pop();
                }
            }
        };

        while self.stack.len() < height {
            let Node::Branch { children, .. } = Arc::unwrap_or_clone(next) else {
                unreachable!();
            };
            let mut iter = children.into_iter();
            next = iter.next().expect("empty branch");
            self.stack.push(iter);
        }

        let Node::Leaf { data } = Arc::unwrap_or_clone(next) else {
            unreachable!();
        };
        self.leaf = data.into_iter();
        let ret = self.leaf.next();
        if ret.is_some() {
            self.remaining -= 1;
        }
        ret
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Clone, const N: usize> ExactSizeIterator for IntoIter<T, N> {}
