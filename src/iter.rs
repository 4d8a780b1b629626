//! Iterators that hide the row stride from generic algorithms.
//!
//! A [`MatView`] is strided: rows may be separated by padding elements
//! that are not part of the matrix. These iterators walk the logical
//! elements only. Pointers are re-fetched from the storage on every step,
//! so a sibling view resizing the storage mid-iteration cannot leave a
//! dangling fast-path pointer; the compact fast path is selected
//! internally and never exposed where it could be misapplied to a
//! non-compact matrix.

use crate::mat::MatView;
use crate::vec::VecView;

/// Elements of a [`VecView`], in order.
pub struct VecElements<'a, T> {
    vec: &'a VecView<T>,
    i: usize,
}

impl<'a, T> VecElements<'a, T> {
    pub(crate) fn new(vec: &'a VecView<T>) -> Self {
        Self { vec, i: 0 }
    }
}

impl<T: Copy> Iterator for VecElements<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.i == self.vec.len() {
            return None;
        }
        let v = unsafe { self.vec.get_unchecked(self.i) };
        self.i += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.vec.len() - self.i;
        (left, Some(left))
    }
}

impl<T: Copy> ExactSizeIterator for VecElements<'_, T> {}

/// All `rows * cols` logical elements of a [`MatView`] in row-major
/// order, skipping the `stride - cols` padding at each row boundary.
pub struct Elements<'a, T> {
    mat: &'a MatView<T>,
    compact: bool,
    total: usize,
    visited: usize,
    i: usize,
    j: usize,
}

impl<'a, T> Elements<'a, T> {
    pub(crate) fn new(mat: &'a MatView<T>) -> Self {
        Self {
            mat,
            compact: mat.is_compact(),
            total: mat.size(),
            visited: 0,
            i: 0,
            j: 0,
        }
    }
}

impl<T: Copy> Iterator for Elements<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.visited == self.total {
            return None;
        }
        let v = if self.compact {
            // Rows are contiguous: one flat index instead of (i, j).
            unsafe { *self.mat.flat_ptr(self.visited) }
        } else {
            unsafe { self.mat.get_unchecked(self.i, self.j) }
        };
        self.visited += 1;
        self.j += 1;
        if self.j == self.mat.cols() {
            self.j = 0;
            self.i += 1;
        }
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.visited;
        (left, Some(left))
    }
}

impl<T: Copy> ExactSizeIterator for Elements<'_, T> {}

/// The rows of a [`MatView`], each as an aliasing [`VecView`].
pub struct Rows<'a, T> {
    mat: &'a MatView<T>,
    i: usize,
}

impl<'a, T> Rows<'a, T> {
    pub(crate) fn new(mat: &'a MatView<T>) -> Self {
        Self { mat, i: 0 }
    }
}

impl<T> Iterator for Rows<'_, T> {
    type Item = VecView<T>;

    fn next(&mut self) -> Option<VecView<T>> {
        if self.i == self.mat.rows() {
            return None;
        }
        let row = self.mat.row(self.i);
        self.i += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.mat.rows() - self.i;
        (left, Some(left))
    }
}

impl<T> ExactSizeIterator for Rows<'_, T> {}

/// The elements of one column of a [`MatView`], stepping a full row
/// stride between elements.
pub struct ColElements<'a, T> {
    mat: &'a MatView<T>,
    j: usize,
    i: usize,
}

impl<'a, T> ColElements<'a, T> {
    pub(crate) fn new(mat: &'a MatView<T>, j: usize) -> Self {
        Self { mat, j, i: 0 }
    }
}

impl<T: Copy> Iterator for ColElements<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.i == self.mat.rows() {
            return None;
        }
        let v = unsafe { self.mat.get_unchecked(self.i, self.j) };
        self.i += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.mat.rows() - self.i;
        (left, Some(left))
    }
}

impl<T: Copy> ExactSizeIterator for ColElements<'_, T> {}
