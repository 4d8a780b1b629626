//! Two-dimensional strided views over shared storage.

use std::rc::Rc;

use num_traits::{Float, Zero};

use crate::error::{LayoutError, Result};
use crate::iter::{ColElements, Elements, Rows};
use crate::storage::Storage;
use crate::vec::VecView;

/// A rows × cols descriptor over a shared [`Storage`], with an explicit
/// row stride.
///
/// `stride` is the element distance from the start of one row to the
/// start of the next; `stride >= cols` always, and the matrix is
/// *compact* iff `stride == cols` (rows are contiguous, which enables
/// flat fast paths). The padding lets sub-matrices and resized matrices
/// stay cheap views instead of copies.
///
/// As with [`VecView`], `Clone` copies the descriptor: clones alias the
/// same storage and see each other's writes. Element copies are explicit
/// ([`deep_copy`], [`copy_from`]).
///
/// [`deep_copy`]: MatView::deep_copy
/// [`copy_from`]: MatView::copy_from
pub struct MatView<T> {
    pub(crate) storage: Option<Rc<Storage<T>>>,
    pub(crate) offset: usize,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) stride: usize,
}

impl<T> Clone for MatView<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            offset: self.offset,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }
}

impl<T> Default for MatView<T> {
    fn default() -> Self {
        Self {
            storage: None,
            offset: 0,
            rows: 0,
            cols: 0,
            stride: 0,
        }
    }
}

impl<T> std::fmt::Debug for MatView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatView")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("stride", &self.stride)
            .field("offset", &self.offset)
            .field("usage", &self.usage())
            .finish()
    }
}

/// Storage elements spanned by a `rows` × `cols` region of row stride
/// `stride`: all full strides plus the last (partial) row.
fn extent(rows: usize, cols: usize, stride: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * stride + cols
    }
}

impl<T: Clone + Default> MatView<T> {
    /// Allocate a fresh compact `rows` × `cols` matrix of
    /// default-initialized elements.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_headroom(rows, cols, 0)
    }

    fn with_headroom(rows: usize, cols: usize, extra: usize) -> Self {
        let total = rows * cols;
        let storage = if total + extra > 0 {
            Some(Rc::new(Storage::new(total + extra)))
        } else {
            None
        };
        Self {
            storage,
            offset: 0,
            rows,
            cols,
            stride: cols,
        }
    }

    /// Copy a row-major slice into a fresh `rows` × `cols` matrix.
    pub fn from_rows(rows: usize, cols: usize, values: &[T]) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(LayoutError::ReshapeMismatch {
                len: values.len(),
                rows,
                cols,
            });
        }
        let m = Self::new(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                unsafe { *m.ptr_at(i, j) = values[i * cols + j].clone() };
            }
        }
        Ok(m)
    }
}

impl<T> MatView<T> {
    /// Reinterpret a vector's elements as a `rows` × `cols` matrix.
    ///
    /// The matrix aliases the vector's storage (a vector is always
    /// contiguous, so the reshape is free); it requires
    /// `rows * cols == v.len()`.
    pub fn from_vec(v: &VecView<T>, rows: usize, cols: usize) -> Result<Self> {
        if rows * cols != v.len() {
            return Err(LayoutError::ReshapeMismatch {
                len: v.len(),
                rows,
                cols,
            });
        }
        Ok(Self {
            storage: v.storage.clone(),
            offset: v.offset,
            rows,
            cols,
            stride: cols,
        })
    }

    /// Build a view over an existing storage handle.
    pub fn from_parts(
        storage: Rc<Storage<T>>,
        offset: usize,
        rows: usize,
        cols: usize,
        stride: usize,
    ) -> Result<Self> {
        if stride < cols {
            return Err(LayoutError::StrideTooNarrow {
                stride,
                width: cols,
            });
        }
        let required = offset + extent(rows, cols, stride);
        if required > storage.len() {
            return Err(LayoutError::OutOfStorage {
                required,
                available: storage.len(),
            });
        }
        Ok(Self {
            storage: Some(storage),
            offset,
            rows,
            cols,
            stride,
        })
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row stride in elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total number of logical elements, `rows * cols`.
    #[inline]
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Rows are contiguous: no padding between them.
    #[inline]
    pub fn is_compact(&self) -> bool {
        self.stride == self.cols
    }

    /// Number of live views holding the same storage (0 when unallocated).
    pub fn usage(&self) -> usize {
        match &self.storage {
            Some(s) => Rc::strong_count(s),
            None => 0,
        }
    }

    /// The shared storage handle, if allocated.
    pub fn storage(&self) -> Option<&Rc<Storage<T>>> {
        self.storage.as_ref()
    }

    pub(crate) fn shares_storage(&self, other: &MatView<T>) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn storage_ref(&self) -> &Rc<Storage<T>> {
        match &self.storage {
            Some(s) => s,
            None => panic!("data access on an unallocated matrix"),
        }
    }

    #[inline]
    pub(crate) fn ptr_at(&self, i: usize, j: usize) -> *mut T {
        debug_assert!(i < self.rows && j < self.cols);
        unsafe {
            self.storage_ref()
                .as_mut_ptr()
                .add(self.offset + i * self.stride + j)
        }
    }

    #[inline]
    pub(crate) fn flat_ptr(&self, k: usize) -> *mut T {
        debug_assert!(self.is_compact() && k < self.size());
        unsafe { self.storage_ref().as_mut_ptr().add(self.offset + k) }
    }

    /// Aliasing sub-matrix starting at `(row_start, col_start)`.
    pub fn sub_mat(
        &self,
        row_start: usize,
        col_start: usize,
        rows: usize,
        cols: usize,
    ) -> MatView<T> {
        assert!(
            row_start + rows <= self.rows && col_start + cols <= self.cols,
            "sub-matrix {rows}x{cols} at ({row_start}, {col_start}) exceeds a {}x{} matrix",
            self.rows,
            self.cols
        );
        MatView {
            storage: self.storage.clone(),
            offset: self.offset + row_start * self.stride + col_start,
            rows,
            cols,
            stride: self.stride,
        }
    }

    /// Aliasing view of `rows` consecutive rows starting at `row_start`.
    pub fn sub_rows(&self, row_start: usize, rows: usize) -> MatView<T> {
        self.sub_mat(row_start, 0, rows, self.cols)
    }

    /// Aliasing view of `cols` consecutive columns starting at `col_start`.
    pub fn sub_cols(&self, col_start: usize, cols: usize) -> MatView<T> {
        self.sub_mat(0, col_start, self.rows, cols)
    }

    /// Row `i` as an aliasing vector view (a row is contiguous).
    pub fn row(&self, i: usize) -> VecView<T> {
        assert!(
            i < self.rows,
            "row {i} out of bounds for a {}x{} matrix",
            self.rows,
            self.cols
        );
        if self.cols == 0 {
            return VecView::default();
        }
        VecView::raw(
            Rc::clone(self.storage_ref()),
            self.offset + i * self.stride,
            self.cols,
        )
    }

    /// Row `i` as an aliasing 1 × cols matrix view.
    pub fn row_mat(&self, i: usize) -> MatView<T> {
        self.sub_mat(i, 0, 1, self.cols)
    }

    /// Column `j` as an aliasing rows × 1 matrix view.
    ///
    /// A column is strided, so it cannot alias as a flat vector; the
    /// copying form is [`column_copy`](MatView::column_copy).
    pub fn column(&self, j: usize) -> MatView<T> {
        self.sub_mat(0, j, self.rows, 1)
    }
}

impl<T: Copy> MatView<T> {
    /// Read element `(i, j)`. Out of bounds panics.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for a {}x{} matrix",
            self.rows,
            self.cols
        );
        unsafe { *self.ptr_at(i, j) }
    }

    /// Write element `(i, j)`. Out of bounds panics.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for a {}x{} matrix",
            self.rows,
            self.cols
        );
        unsafe { *self.ptr_at(i, j) = value };
    }

    /// Read element `(i, j)` without the release-mode bounds check.
    ///
    /// # Safety
    /// `i < self.rows()` and `j < self.cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows && j < self.cols);
        *self
            .storage_ref()
            .as_mut_ptr()
            .add(self.offset + i * self.stride + j)
    }

    /// Write element `(i, j)` without the release-mode bounds check.
    ///
    /// # Safety
    /// `i < self.rows()` and `j < self.cols()` must hold.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, i: usize, j: usize, value: T) {
        debug_assert!(i < self.rows && j < self.cols);
        *self
            .storage_ref()
            .as_mut_ptr()
            .add(self.offset + i * self.stride + j) = value;
    }

    /// All logical elements in row-major order, padding skipped.
    pub fn iter(&self) -> Elements<'_, T> {
        Elements::new(self)
    }

    /// Each row as an aliasing vector view.
    pub fn row_views(&self) -> Rows<'_, T> {
        Rows::new(self)
    }

    /// The elements of column `j`, top to bottom.
    pub fn col_elements(&self, j: usize) -> ColElements<'_, T> {
        assert!(
            j < self.cols,
            "column {j} out of bounds for a {}x{} matrix",
            self.rows,
            self.cols
        );
        ColElements::new(self, j)
    }

    /// Column `j` copied into freshly allocated storage.
    pub fn column_copy(&self, j: usize) -> VecView<T> {
        assert!(
            j < self.cols,
            "column {j} out of bounds for a {}x{} matrix",
            self.rows,
            self.cols
        );
        let mut data = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            data.push(unsafe { *self.ptr_at(i, j) });
        }
        VecView::from_vec(data)
    }

    /// Collect the logical elements into a row-major `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Element-wise copy into a fresh compact matrix. The result never
    /// aliases `self`.
    pub fn deep_copy(&self) -> MatView<T> {
        let data = self.to_vec();
        MatView {
            storage: if data.is_empty() {
                None
            } else {
                Some(Rc::new(Storage::from_vec(data)))
            },
            offset: 0,
            rows: self.rows,
            cols: self.cols,
            stride: self.cols,
        }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        for i in 0..self.rows {
            for j in 0..self.cols {
                unsafe { *self.ptr_at(i, j) = value };
            }
        }
    }

    /// Explicit element copy from another matrix of the same total
    /// element count, in row-major order on both sides, regardless of
    /// either stride or offset. Mismatched counts panic.
    pub fn copy_from(&mut self, src: &MatView<T>) {
        assert_eq!(
            self.size(),
            src.size(),
            "element copy between a {}x{} and a {}x{} matrix",
            self.rows,
            self.cols,
            src.rows,
            src.cols
        );
        if self.shares_storage(src) {
            let scratch = src.to_vec();
            self.write_row_major(scratch.into_iter());
        } else {
            self.write_row_major(src.iter());
        }
    }

    /// Element copy from a vector with `rows * cols` elements.
    pub fn copy_from_vec(&mut self, src: &VecView<T>) {
        assert_eq!(
            self.size(),
            src.len(),
            "element copy from a vector of length {} into a {}x{} matrix",
            src.len(),
            self.rows,
            self.cols
        );
        let aliased = match (&self.storage, src.storage()) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        if aliased {
            let scratch = src.to_vec();
            self.write_row_major(scratch.into_iter());
        } else {
            self.write_row_major(src.iter());
        }
    }

    fn write_row_major(&mut self, mut values: impl Iterator<Item = T>) {
        for i in 0..self.rows {
            for j in 0..self.cols {
                match values.next() {
                    Some(v) => unsafe { *self.ptr_at(i, j) = v },
                    None => unreachable!("source element count was checked"),
                }
            }
        }
    }

    /// In-place transpose. Only square matrices can transpose without a
    /// layout change; a non-square matrix panics.
    pub fn transpose(&mut self) {
        assert_eq!(
            self.rows, self.cols,
            "in-place transpose of a non-square {}x{} matrix",
            self.rows, self.cols
        );
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                unsafe {
                    let a = *self.ptr_at(i, j);
                    *self.ptr_at(i, j) = *self.ptr_at(j, i);
                    *self.ptr_at(j, i) = a;
                }
            }
        }
    }

    /// Swap rows `a` and `b` in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        assert!(
            a < self.rows && b < self.rows,
            "row swap ({a}, {b}) out of bounds for {} rows",
            self.rows
        );
        if a == b {
            return;
        }
        for j in 0..self.cols {
            unsafe {
                let v = *self.ptr_at(a, j);
                *self.ptr_at(a, j) = *self.ptr_at(b, j);
                *self.ptr_at(b, j) = v;
            }
        }
    }

    /// Swap columns `a` and `b` in place.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        assert!(
            a < self.cols && b < self.cols,
            "column swap ({a}, {b}) out of bounds for {} columns",
            self.cols
        );
        if a == b {
            return;
        }
        for i in 0..self.rows {
            unsafe {
                let v = *self.ptr_at(i, a);
                *self.ptr_at(i, a) = *self.ptr_at(i, b);
                *self.ptr_at(i, b) = v;
            }
        }
    }

    /// Flat aliasing vector view over a compact matrix.
    ///
    /// Only a compact matrix is flat in memory; calling this on a
    /// non-compact one is a contract violation and panics.
    pub fn as_flat_vec(&self) -> VecView<T> {
        assert!(
            self.is_compact(),
            "flat view of a non-compact matrix (stride {} != cols {})",
            self.stride,
            self.cols
        );
        if self.is_empty() {
            return VecView::default();
        }
        VecView::raw(Rc::clone(self.storage_ref()), self.offset, self.size())
    }
}

impl<T: Copy + Zero> MatView<T> {
    /// Set every element to zero.
    pub fn clear(&mut self) {
        self.fill(T::zero());
    }
}

impl<T: Float> MatView<T> {
    /// Whether the matrix equals its transpose.
    ///
    /// `exact` selects bitwise equality; otherwise `(i, j)` and `(j, i)`
    /// may differ by a small relative tolerance. An empty matrix is
    /// accepted as symmetric only with `accept_empty`; otherwise a
    /// warning is logged and the check fails.
    pub fn is_symmetric(&self, exact: bool, accept_empty: bool) -> bool {
        if self.is_empty() {
            if !accept_empty {
                log::warn!("is_symmetric called on an empty matrix");
                return false;
            }
            return true;
        }
        if self.rows != self.cols {
            return false;
        }
        let tol: T = num_traits::cast(1e-6).unwrap_or_else(T::epsilon);
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                let a = unsafe { *self.ptr_at(i, j) };
                let b = unsafe { *self.ptr_at(j, i) };
                if exact {
                    if a != b {
                        return false;
                    }
                } else {
                    let scale = T::one().max(a.abs()).max(b.abs());
                    if (a - b).abs() > tol * scale {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl<T: Copy + Default> MatView<T> {
    /// Resize to `new_rows` × `new_cols`; see [`resize_with`].
    ///
    /// [`resize_with`]: MatView::resize_with
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) {
        self.resize_with(new_rows, new_cols, 0, false);
    }

    /// Resize to `new_rows` × `new_cols` with `extra` elements of
    /// headroom when reallocating.
    ///
    /// Three cases:
    /// 1. unchanged dimensions: no-op;
    /// 2. the new width fits the current stride and the new rows fit the
    ///    storage already reserved: cheap bounds reinterpretation, no
    ///    reallocation (value at each surviving `(i, j)` unchanged);
    /// 3. otherwise: reallocate into a compact layout with geometric
    ///    headroom; with `preserve`, values within both the old and new
    ///    bounds are relocated to their new positions, row-major.
    ///
    /// The reallocating case is a structural mutation: performing it
    /// while the storage is shared with other views is a contract
    /// violation and panics, whichever entry point reaches it.
    pub fn resize_with(&mut self, new_rows: usize, new_cols: usize, extra: usize, preserve: bool) {
        if new_rows == self.rows && new_cols == self.cols {
            return;
        }
        let storage_len = match self.storage.as_ref().map(|s| s.len()) {
            Some(len) => len,
            None => {
                *self = Self::with_headroom(new_rows, new_cols, extra);
                return;
            }
        };
        let views = self.usage();
        let in_place = new_cols <= self.stride
            && self.offset + extent(new_rows, new_cols, self.stride) <= storage_len;
        if in_place {
            self.rows = new_rows;
            self.cols = new_cols;
            return;
        }
        assert!(
            views == 1,
            "cannot resize a {}x{} matrix (stride {}) to {new_rows}x{new_cols}: storage is shared by {views} views",
            self.rows,
            self.cols,
            self.stride
        );
        let needed = new_rows * new_cols + extra;
        let cap = if needed > storage_len {
            needed.max(storage_len + storage_len / 2)
        } else {
            needed
        };
        let mut data = vec![T::default(); cap];
        if preserve {
            for i in 0..self.rows.min(new_rows) {
                for j in 0..self.cols.min(new_cols) {
                    data[i * new_cols + j] = unsafe { *self.ptr_at(i, j) };
                }
            }
        }
        self.storage = Some(Rc::new(Storage::from_vec(data)));
        self.offset = 0;
        self.rows = new_rows;
        self.cols = new_cols;
        self.stride = new_cols;
    }

    /// Append one row, preserving existing contents and growing the
    /// storage with amortized headroom.
    pub fn append_row(&mut self, row: &[T]) {
        if self.rows == 0 && self.cols == 0 {
            self.cols = row.len();
            self.stride = row.len();
        }
        assert_eq!(
            row.len(),
            self.cols,
            "appended row has {} elements, matrix rows have {}",
            row.len(),
            self.cols
        );
        let r = self.rows;
        self.resize_with(r + 1, self.cols, self.size().max(self.cols), true);
        for (j, &v) in row.iter().enumerate() {
            unsafe { *self.ptr_at(r, j) = v };
        }
    }

    /// Force a compact (`stride == cols`) layout, reallocating if needed.
    ///
    /// Compacting shared storage would silently detach the sibling views
    /// from the data; it is a contract violation and panics.
    pub fn compact(&mut self) {
        if self.is_compact() {
            return;
        }
        let views = self.usage();
        assert!(
            views == 1,
            "cannot compact a matrix whose storage is shared by {views} views"
        );
        let data = self.to_vec();
        self.storage = Some(Rc::new(Storage::from_vec(data)));
        self.offset = 0;
        self.stride = self.cols;
    }
}

impl<T: PartialEq> PartialEq for MatView<T> {
    /// Element-wise equality over matching dimensions.
    fn eq(&self, other: &Self) -> bool {
        if self.rows != other.rows || self.cols != other.cols {
            return false;
        }
        for i in 0..self.rows {
            for j in 0..self.cols {
                if unsafe { *self.ptr_at(i, j) != *other.ptr_at(i, j) } {
                    return false;
                }
            }
        }
        true
    }
}
