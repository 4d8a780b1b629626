//! Reference-counted shared-storage vector and matrix views with
//! explicit row strides.
//!
//! The core model is a single [`Storage`] buffer shared by reference
//! among any number of lightweight view descriptors:
//!
//! - [`VecView`]: a length + offset over a storage
//! - [`MatView`]: rows + cols + row stride + offset over a storage
//!
//! Views alias by design: cloning a view copies only the descriptor, and
//! mutating an element through one view is visible through every other
//! view of the same storage. This is what makes row views, sub-matrices,
//! and vector-to-matrix reshapes free. Copying *element data* is always
//! explicit, via `deep_copy` (fresh storage) or `copy_from` (in place,
//! stride-agnostic, possibly type-converting).
//!
//! # Example
//!
//! ```rust
//! use matview::MatView;
//!
//! let mut m: MatView<f64> = MatView::new(3, 3);
//! for i in 0..3 {
//!     for j in 0..3 {
//!         m.set(i, j, (i * 3 + j) as f64);
//!     }
//! }
//!
//! // A row view aliases the matrix.
//! let mut r = m.row(1);
//! r.set(0, -1.0);
//! assert_eq!(m.get(1, 0), -1.0);
//!
//! // A sub-matrix is a strided view, not a copy.
//! let s = m.sub_mat(0, 1, 2, 2);
//! assert!(!s.is_compact());
//! assert_eq!(s.to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
//! ```
//!
//! # Sharing discipline
//!
//! The storage tracks how many views reference it (`usage()`, the strong
//! count of the shared handle). Structural mutations that would corrupt
//! or detach sibling views (growing past the reserved extent, widening a
//! matrix past its stride, compacting) are forbidden while the storage
//! is shared and panic if attempted. This is a correctness
//! contract against caller bugs, not a synchronization mechanism: the
//! types are single-threaded (`!Send`/`!Sync`) and a multithreaded host
//! must serialize all access to a shared storage externally.
//!
//! # Errors
//!
//! Constructing a view over caller-supplied parts can fail recoverably
//! ([`LayoutError`]), as can serialization ([`CodecError`]). Everything
//! else that can go wrong, such as out-of-bounds indexing or structural
//! mutation of shared storage, is a bug in the caller and panics
//! immediately rather than guessing intent.

mod codec;
mod error;
mod iter;
mod mat;
mod sort;
mod storage;
mod vec;

// ============================================================================
// Core types
// ============================================================================
pub use error::{LayoutError, Result};
pub use mat::MatView;
pub use storage::Storage;
pub use vec::VecView;

// ============================================================================
// Iterators
// ============================================================================
pub use iter::{ColElements, Elements, Rows, VecElements};

// ============================================================================
// Sort / search utilities
// ============================================================================
pub use sort::{
    binary_search, binary_search_column, partial_sort_rows, sort_rows, sort_rows_by_columns,
};

// ============================================================================
// Serialization
// ============================================================================
pub use codec::{
    read_mat, read_mat_explicit, read_vec, read_vec_explicit, write_mat, write_mat_explicit,
    write_vec, write_vec_explicit, CodecError,
};
