//! Reference-counted element storage shared by vector and matrix views.
//!
//! A [`Storage`] is a single contiguous buffer of `T`. Views hold
//! `Rc<Storage<T>>` handles and address into it with an offset (and, for
//! matrices, a row stride), so any number of views can alias one buffer
//! and observe each other's in-place writes. The buffer is either *owned*
//! (backed by a `Vec<T>`) or *external* (caller-supplied memory that the
//! storage must never free).
//!
//! All mutation goes through interior mutability so that every view can
//! reach the buffer through its shared handle. The types are deliberately
//! `!Send`/`!Sync` (`Rc` + `UnsafeCell`): callers of a multithreaded host
//! must serialize all access to a storage reachable from more than one
//! thread, including reads racing a resize.

use std::cell::UnsafeCell;

enum Buf<T> {
    Owned(Vec<T>),
    /// Caller-supplied memory. Never freed here; the caller keeps it alive
    /// for as long as any view can reach this storage.
    External { ptr: *mut T, len: usize },
}

/// A contiguous, resizable buffer of `T` shared by reference among views.
pub struct Storage<T> {
    buf: UnsafeCell<Buf<T>>,
}

impl<T: Clone + Default> Storage<T> {
    /// Allocate storage for `n` default-initialized elements.
    pub fn new(n: usize) -> Self {
        Self {
            buf: UnsafeCell::new(Buf::Owned(vec![T::default(); n])),
        }
    }

    /// Grow the owned buffer to `new_len` elements, preserving existing
    /// contents. New elements are default-initialized.
    ///
    /// Growing may move the buffer: raw pointers obtained before the call
    /// are invalidated and must be re-fetched. Views never cache pointers
    /// across calls for exactly this reason.
    ///
    /// Shrinking panics: a live view may span the dropped tail, and a
    /// view that reaches past the storage end is a broken invariant.
    /// Views shrink by moving their own bounds, never the storage's.
    /// Also panics on an external buffer; its length is fixed by the
    /// caller.
    pub fn resize(&self, new_len: usize) {
        let old_len = self.len();
        assert!(
            new_len >= old_len,
            "cannot shrink storage from {old_len} to {new_len} elements: a live view may span the tail"
        );
        // Single-threaded by construction; no other reference into the
        // buffer is live while this method runs.
        match unsafe { &mut *self.buf.get() } {
            Buf::Owned(v) => v.resize(new_len, T::default()),
            Buf::External { .. } => {
                panic!("cannot resize external storage of fixed length {old_len}")
            }
        }
    }
}

impl<T> Storage<T> {
    /// Take ownership of an existing vector without copying.
    pub fn from_vec(v: Vec<T>) -> Self {
        Self {
            buf: UnsafeCell::new(Buf::Owned(v)),
        }
    }

    /// Wrap `n` elements of externally-owned memory.
    ///
    /// The storage hands out pointers into `ptr` but never frees it.
    ///
    /// # Safety
    /// `ptr` must point to `n` valid, initialized elements that outlive
    /// every view holding a handle to this storage, and nothing else may
    /// free or move that memory in the meantime.
    pub unsafe fn from_external(n: usize, ptr: *mut T) -> Self {
        Self {
            buf: UnsafeCell::new(Buf::External { ptr, len: n }),
        }
    }

    /// Redirect this storage at `n` elements of externally-owned memory.
    ///
    /// A previously owned buffer is dropped. The swap is a single pointer
    /// update: every aliasing view sees the new values on its next access.
    /// The provided buffer must already contain the intended values.
    ///
    /// # Safety
    /// Same contract as [`Storage::from_external`].
    pub unsafe fn point_to(&self, n: usize, ptr: *mut T) {
        *self.buf.get() = Buf::External { ptr, len: n };
    }

    /// Number of elements the buffer holds.
    pub fn len(&self) -> usize {
        match unsafe { &*self.buf.get() } {
            Buf::Owned(v) => v.len(),
            Buf::External { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer is caller-owned memory this storage must not free.
    pub fn is_external(&self) -> bool {
        matches!(unsafe { &*self.buf.get() }, Buf::External { .. })
    }

    /// Raw pointer to the first element. Valid until the next `resize` or
    /// `point_to`.
    pub fn as_ptr(&self) -> *const T {
        match unsafe { &*self.buf.get() } {
            Buf::Owned(v) => v.as_ptr(),
            Buf::External { ptr, .. } => *ptr,
        }
    }

    /// Mutable raw pointer to the first element. Valid until the next
    /// `resize` or `point_to`.
    pub fn as_mut_ptr(&self) -> *mut T {
        match unsafe { &mut *self.buf.get() } {
            Buf::Owned(v) => v.as_mut_ptr(),
            Buf::External { ptr, .. } => *ptr,
        }
    }
}

impl<T> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len())
            .field("external", &self.is_external())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_default_initialized() {
        let s = Storage::<f64>::new(4);
        assert_eq!(s.len(), 4);
        assert!(!s.is_external());
        for i in 0..4 {
            assert_eq!(unsafe { *s.as_ptr().add(i) }, 0.0);
        }
    }

    #[test]
    fn resize_preserves_contents() {
        let s = Storage::<i32>::from_vec(vec![1, 2, 3]);
        s.resize(5);
        assert_eq!(s.len(), 5);
        let p = s.as_ptr();
        assert_eq!(unsafe { [*p, *p.add(1), *p.add(2), *p.add(3)] }, [1, 2, 3, 0]);
    }

    #[test]
    fn external_storage_reads_caller_memory() {
        let mut buf = [10i32, 20, 30];
        let s = unsafe { Storage::from_external(3, buf.as_mut_ptr()) };
        assert!(s.is_external());
        assert_eq!(s.len(), 3);
        assert_eq!(unsafe { *s.as_ptr().add(1) }, 20);
        buf[1] = 99;
        assert_eq!(unsafe { *s.as_ptr().add(1) }, 99);
    }

    #[test]
    #[should_panic(expected = "cannot shrink storage")]
    fn shrinking_storage_panics() {
        let s = Storage::<i32>::from_vec(vec![1, 2, 3]);
        s.resize(1);
    }

    #[test]
    #[should_panic(expected = "cannot resize external storage")]
    fn external_storage_refuses_resize() {
        let mut buf = [1i32, 2];
        let s = unsafe { Storage::from_external(2, buf.as_mut_ptr()) };
        s.resize(4);
    }

    #[test]
    fn point_to_swaps_memory() {
        let s = Storage::<i32>::from_vec(vec![1, 2, 3]);
        let mut buf = [7i32, 8, 9, 10];
        unsafe { s.point_to(4, buf.as_mut_ptr()) };
        assert!(s.is_external());
        assert_eq!(s.len(), 4);
        assert_eq!(unsafe { *s.as_ptr() }, 7);
    }
}
