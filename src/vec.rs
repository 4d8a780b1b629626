//! Flat one-dimensional views over shared storage.

use std::rc::Rc;

use num_traits::Zero;

use crate::error::{LayoutError, Result};
use crate::iter::VecElements;
use crate::mat::MatView;
use crate::sort::cmp_partial;
use crate::storage::Storage;

/// A length + offset descriptor over a shared [`Storage`].
///
/// `Clone` copies the descriptor only: the clone aliases the same storage
/// and observes in-place writes made through the original (and vice
/// versa). Copying the *elements* is always explicit, via [`deep_copy`]
/// or [`copy_from`].
///
/// A view with no storage is the empty/unallocated state; `resize`
/// allocates lazily on first growth.
///
/// [`deep_copy`]: VecView::deep_copy
/// [`copy_from`]: VecView::copy_from
pub struct VecView<T> {
    pub(crate) storage: Option<Rc<Storage<T>>>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl<T> Clone for VecView<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            offset: self.offset,
            len: self.len,
        }
    }
}

impl<T> Default for VecView<T> {
    fn default() -> Self {
        Self {
            storage: None,
            offset: 0,
            len: 0,
        }
    }
}

impl<T> std::fmt::Debug for VecView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VecView")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .field("usage", &self.usage())
            .finish()
    }
}

impl<T: Clone + Default> VecView<T> {
    /// Allocate a fresh vector of `n` default-initialized elements.
    pub fn new(n: usize) -> Self {
        if n == 0 {
            return Self::default();
        }
        Self {
            storage: Some(Rc::new(Storage::new(n))),
            offset: 0,
            len: n,
        }
    }
}

impl<T> VecView<T> {
    /// Take ownership of a `Vec` without copying.
    pub fn from_vec(v: Vec<T>) -> Self {
        let len = v.len();
        if len == 0 {
            return Self::default();
        }
        Self {
            storage: Some(Rc::new(Storage::from_vec(v))),
            offset: 0,
            len,
        }
    }

    /// Build a view over an existing storage handle.
    pub fn from_parts(storage: Rc<Storage<T>>, offset: usize, len: usize) -> Result<Self> {
        let required = offset + len;
        if required > storage.len() {
            return Err(LayoutError::OutOfStorage {
                required,
                available: storage.len(),
            });
        }
        Ok(Self {
            storage: Some(storage),
            offset,
            len,
        })
    }

    pub(crate) fn raw(storage: Rc<Storage<T>>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= storage.len());
        Self {
            storage: Some(storage),
            offset,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether any element slot has ever been allocated.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.storage.is_some()
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

    pub(crate) fn shares_storage(&self, other: &VecView<T>) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn storage_ref(&self) -> &Rc<Storage<T>> {
        match &self.storage {
            Some(s) => s,
            None => panic!("data access on an unallocated vector"),
        }
    }

    /// Raw pointer to the first visible element.
    ///
    /// Calling this on an unallocated vector is a contract violation and
    /// panics. The pointer is valid until the next operation that can
    /// reallocate the storage.
    pub fn as_ptr(&self) -> *const T {
        unsafe { self.storage_ref().as_ptr().add(self.offset) }
    }

    /// Mutable raw pointer to the first visible element.
    ///
    /// Same contract as [`as_ptr`](VecView::as_ptr).
    pub fn as_mut_ptr(&mut self) -> *mut T {
        unsafe { self.storage_ref().as_mut_ptr().add(self.offset) }
    }

    #[inline]
    pub(crate) fn ptr_at(&self, i: usize) -> *mut T {
        debug_assert!(i < self.len);
        unsafe { self.storage_ref().as_mut_ptr().add(self.offset + i) }
    }

    /// Aliasing sub-view of `[start, start + len)`.
    pub fn sub_vec(&self, start: usize, len: usize) -> VecView<T> {
        assert!(
            start + len <= self.len,
            "sub-view [{start}, {}) exceeds vector length {}",
            start + len,
            self.len
        );
        if len == 0 {
            return VecView::default();
        }
        VecView::raw(Rc::clone(self.storage_ref()), self.offset + start, len)
    }
}

impl<T: Copy> VecView<T> {
    /// Read element `i`. Out of bounds panics.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        assert!(
            i < self.len,
            "index {i} out of bounds for vector of length {}",
            self.len
        );
        unsafe { *self.ptr_at(i) }
    }

    /// Write element `i`. Out of bounds panics.
    #[inline]
    pub fn set(&mut self, i: usize, value: T) {
        assert!(
            i < self.len,
            "index {i} out of bounds for vector of length {}",
            self.len
        );
        unsafe { *self.ptr_at(i) = value };
    }

    /// Read element `i` without the release-mode bounds check.
    ///
    /// # Safety
    /// `i` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize) -> T {
        debug_assert!(i < self.len);
        *self.storage_ref().as_mut_ptr().add(self.offset + i)
    }

    /// Write element `i` without the release-mode bounds check.
    ///
    /// # Safety
    /// `i` must be less than `self.len()`.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, i: usize, value: T) {
        debug_assert!(i < self.len);
        *self.storage_ref().as_mut_ptr().add(self.offset + i) = value;
    }

    /// Iterate over the visible elements.
    pub fn iter(&self) -> VecElements<'_, T> {
        VecElements::new(self)
    }

    /// Collect the visible elements into a plain `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        for i in 0..self.len {
            unsafe { *self.ptr_at(i) = value };
        }
    }

    /// Reverse the elements in place.
    pub fn reverse(&mut self) {
        let mut lo = 0;
        let mut hi = self.len;
        while lo + 1 < hi {
            hi -= 1;
            unsafe {
                let a = *self.ptr_at(lo);
                *self.ptr_at(lo) = *self.ptr_at(hi);
                *self.ptr_at(hi) = a;
            }
            lo += 1;
        }
    }

    /// Index of the first element equal to `x`.
    pub fn find(&self, x: T) -> Option<usize>
    where
        T: PartialEq,
    {
        (0..self.len).find(|&i| unsafe { *self.ptr_at(i) } == x)
    }

    pub fn contains(&self, x: T) -> bool
    where
        T: PartialEq,
    {
        self.find(x).is_some()
    }

    /// Number of elements equal to `x`.
    pub fn count_of(&self, x: T) -> usize
    where
        T: PartialEq,
    {
        (0..self.len)
            .filter(|&i| unsafe { *self.ptr_at(i) } == x)
            .count()
    }

    /// Index permutation that would put the elements in ascending order.
    ///
    /// Stable: equal elements keep their original relative order. The
    /// vector itself is not mutated. Unordered elements (NaN) compare as
    /// equal.
    pub fn sorting_permutation(&self) -> Vec<usize>
    where
        T: PartialOrd,
    {
        let mut order: Vec<usize> = (0..self.len).collect();
        order.sort_by(|&a, &b| cmp_partial(&self.get(a), &self.get(b)));
        order
    }

    /// Explicit element copy from another vector of the same length.
    ///
    /// This is the deep copy: it works across any offset combination,
    /// including two views of the same storage, and never changes which
    /// storage `self` points at. Mismatched lengths panic.
    pub fn copy_from(&mut self, src: &VecView<T>) {
        assert_eq!(
            self.len, src.len,
            "element copy between vectors of different lengths ({} vs {})",
            self.len, src.len
        );
        if self.shares_storage(src) {
            // Overlapping views of one storage copy through a scratch buffer.
            let scratch = src.to_vec();
            for (i, v) in scratch.into_iter().enumerate() {
                unsafe { *self.ptr_at(i) = v };
            }
        } else {
            for i in 0..self.len {
                unsafe { *self.ptr_at(i) = *src.ptr_at(i) };
            }
        }
    }

    /// Element copy from a matrix with the same total element count,
    /// taken in row-major order regardless of the matrix's stride.
    pub fn copy_from_mat(&mut self, src: &MatView<T>) {
        assert_eq!(
            self.len,
            src.size(),
            "element copy from a {}x{} matrix into a vector of length {}",
            src.rows(),
            src.cols(),
            self.len
        );
        let mut i = 0;
        for v in src.iter() {
            unsafe { *self.ptr_at(i) = v };
            i += 1;
        }
    }

    /// Converting element copy from a vector of a different element type.
    pub fn copy_from_cast<U>(&mut self, src: &VecView<U>)
    where
        U: Copy + Into<T>,
    {
        assert_eq!(
            self.len, src.len,
            "element copy between vectors of different lengths ({} vs {})",
            self.len, src.len
        );
        for i in 0..self.len {
            unsafe { *self.ptr_at(i) = (*src.ptr_at(i)).into() };
        }
    }
}

impl<T: Clone> VecView<T> {
    /// Copy a slice into freshly allocated storage.
    pub fn from_slice(values: &[T]) -> Self {
        Self::from_vec(values.to_vec())
    }

    /// Element-wise copy into freshly allocated storage. The result never
    /// aliases `self`.
    pub fn deep_copy(&self) -> VecView<T> {
        let mut data = Vec::with_capacity(self.len);
        for i in 0..self.len {
            data.push(unsafe { (*self.ptr_at(i)).clone() });
        }
        VecView::from_vec(data)
    }
}

impl<T: Copy + Zero> VecView<T> {
    /// Set every element to zero.
    pub fn clear(&mut self) {
        self.fill(T::zero());
    }
}

impl<T: Clone + Default> VecView<T> {
    /// Resize to `new_len` elements; see [`resize_with_extra`].
    ///
    /// [`resize_with_extra`]: VecView::resize_with_extra
    pub fn resize(&mut self, new_len: usize) {
        self.resize_with_extra(new_len, 0);
    }

    /// Resize to `new_len` elements, keeping `extra` elements of headroom
    /// in mind when the storage has to grow.
    ///
    /// Shrinking only moves the length: the storage keeps its capacity
    /// for future growth, and re-grown elements reappear with their old
    /// contents. Growth past the end of the storage reallocates with
    /// geometric headroom so repeated appends stay amortized O(1).
    ///
    /// Growing past the end of a storage shared with other views is a
    /// contract violation and panics: it would either corrupt the
    /// siblings or silently detach them.
    pub fn resize_with_extra(&mut self, new_len: usize, extra: usize) {
        if new_len == self.len {
            return;
        }
        if new_len < self.len {
            self.len = new_len;
            return;
        }
        let current = match self.storage.as_ref().map(|s| s.len()) {
            Some(len) => len,
            None => {
                self.storage = Some(Rc::new(Storage::new(new_len + extra)));
                self.offset = 0;
                self.len = new_len;
                return;
            }
        };
        let required = self.offset + new_len;
        if required > current {
            let views = self.usage();
            assert!(
                views == 1,
                "cannot grow vector from {} to {new_len} elements: storage is shared by {views} views",
                self.len
            );
            let grown = required.max(current + current / 2) + extra;
            if let Some(s) = &self.storage {
                s.resize(grown);
            }
        }
        self.len = new_len;
    }

    /// Append one element, growing the storage geometrically when needed.
    pub fn push(&mut self, value: T)
    where
        T: Copy,
    {
        let i = self.len;
        self.resize_with_extra(i + 1, i);
        self.set(i, value);
    }
}

impl<T: PartialEq> PartialEq for VecView<T> {
    /// Element-wise equality; aliasing is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        (0..self.len).all(|i| unsafe { *self.ptr_at(i) == *other.ptr_at(i) })
    }
}
