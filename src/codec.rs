//! Two-mode binary serialization for vectors and matrices.
//!
//! The *plain* mode writes element counts and then the logical elements
//! in row-major order; the stride and offset of the source view are
//! erased, so a strided view reads back as a compact one. The
//! *explicit-storage* mode additionally records the offset, the row
//! stride for matrices, and the full storage extent, so the layout a
//! view had over its storage survives a round trip.
//!
//! Framing is a 4-byte magic tag, a mode byte, little-endian `u64`
//! header fields, and a raw element payload for any [`Pod`] element
//! type. I/O and format violations are recoverable errors, unlike the
//! in-memory contract violations which panic.

use std::io::{Read, Write};
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::error::LayoutError;
use crate::mat::MatView;
use crate::storage::Storage;
use crate::vec::VecView;

const MAGIC: [u8; 4] = *b"MVW1";
const MODE_VEC: u8 = 0;
const MODE_MAT: u8 = 1;
const MODE_MAT_EXPLICIT: u8 = 2;
const MODE_VEC_EXPLICIT: u8 = 3;

/// Errors from reading or writing the binary encoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("bad magic bytes {0:?}")]
    BadMagic([u8; 4]),

    #[error("unknown encoding mode {0}")]
    UnknownMode(u8),

    #[error("expected encoding mode {expected}, found {found}")]
    WrongMode { expected: u8, found: u8 },

    #[error("header field {0} does not fit in memory")]
    Oversize(u64),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

fn write_header<W: Write>(w: &mut W, mode: u8, fields: &[u64]) -> Result<(), CodecError> {
    w.write_all(&MAGIC)?;
    w.write_all(&[mode])?;
    for &f in fields {
        w.write_all(&f.to_le_bytes())?;
    }
    Ok(())
}

fn read_mode<R: Read>(r: &mut R, expected: u8) -> Result<(), CodecError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }
    let mut mode = [0u8; 1];
    r.read_exact(&mut mode)?;
    let found = mode[0];
    if found > MODE_VEC_EXPLICIT {
        return Err(CodecError::UnknownMode(found));
    }
    if found != expected {
        return Err(CodecError::WrongMode { expected, found });
    }
    Ok(())
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_len<R: Read>(r: &mut R) -> Result<usize, CodecError> {
    let raw = read_u64(r)?;
    usize::try_from(raw).map_err(|_| CodecError::Oversize(raw))
}

fn write_elements<T: Pod, W: Write>(w: &mut W, elements: &[T]) -> Result<(), CodecError> {
    w.write_all(bytemuck::cast_slice(elements))?;
    Ok(())
}

fn read_elements<T: Pod, R: Read>(r: &mut R, n: usize) -> Result<Vec<T>, CodecError> {
    let mut buf = vec![T::zeroed(); n];
    r.read_exact(bytemuck::cast_slice_mut(&mut buf))?;
    Ok(buf)
}

/// Write a vector in plain mode: element count, then elements.
pub fn write_vec<T: Pod, W: Write>(w: &mut W, v: &VecView<T>) -> Result<(), CodecError> {
    write_header(w, MODE_VEC, &[v.len() as u64])?;
    write_elements(w, &v.to_vec())
}

/// Read a plain-mode vector into freshly allocated storage.
pub fn read_vec<T: Pod, R: Read>(r: &mut R) -> Result<VecView<T>, CodecError> {
    read_mode(r, MODE_VEC)?;
    let n = read_len(r)?;
    Ok(VecView::from_vec(read_elements(r, n)?))
}

/// Write a vector in explicit-storage mode: length, offset, and the
/// entire storage buffer, so the view's placement over its storage is
/// reconstructible.
pub fn write_vec_explicit<T: Pod, W: Write>(w: &mut W, v: &VecView<T>) -> Result<(), CodecError> {
    let storage_len = v.storage().map_or(0, |s| s.len());
    write_header(
        w,
        MODE_VEC_EXPLICIT,
        &[v.len() as u64, v.offset() as u64, storage_len as u64],
    )?;
    match v.storage() {
        Some(s) => {
            let raw = unsafe { std::slice::from_raw_parts(s.as_ptr(), s.len()) };
            write_elements(w, raw)
        }
        None => Ok(()),
    }
}

/// Read an explicit-storage vector, restoring its offset over a fresh
/// storage of the recorded extent.
pub fn read_vec_explicit<T: Pod, R: Read>(r: &mut R) -> Result<VecView<T>, CodecError> {
    read_mode(r, MODE_VEC_EXPLICIT)?;
    let len = read_len(r)?;
    let offset = read_len(r)?;
    let storage_len = read_len(r)?;
    let data = read_elements(r, storage_len)?;
    let storage = Rc::new(Storage::from_vec(data));
    Ok(VecView::from_parts(storage, offset, len)?)
}

/// Write a matrix in plain mode: row and column counts, then the logical
/// elements row-major. Stride and offset are erased.
pub fn write_mat<T: Pod, W: Write>(w: &mut W, m: &MatView<T>) -> Result<(), CodecError> {
    write_header(w, MODE_MAT, &[m.rows() as u64, m.cols() as u64])?;
    write_elements(w, &m.to_vec())
}

/// Read a plain-mode matrix; the result is always compact.
pub fn read_mat<T: Pod, R: Read>(r: &mut R) -> Result<MatView<T>, CodecError> {
    read_mode(r, MODE_MAT)?;
    let rows = read_len(r)?;
    let cols = read_len(r)?;
    let total = rows
        .checked_mul(cols)
        .ok_or(CodecError::Oversize(rows as u64))?;
    let data = read_elements(r, total)?;
    let storage = Rc::new(Storage::from_vec(data));
    Ok(MatView::from_parts(storage, 0, rows, cols, cols)?)
}

/// Write a matrix in explicit-storage mode: dimensions, stride, offset,
/// and the entire storage buffer, so the view's layout over its storage
/// is reconstructible.
pub fn write_mat_explicit<T: Pod, W: Write>(w: &mut W, m: &MatView<T>) -> Result<(), CodecError> {
    let storage_len = m.storage().map_or(0, |s| s.len());
    write_header(
        w,
        MODE_MAT_EXPLICIT,
        &[
            m.rows() as u64,
            m.cols() as u64,
            m.stride() as u64,
            m.offset() as u64,
            storage_len as u64,
        ],
    )?;
    match m.storage() {
        Some(s) => {
            let raw = unsafe { std::slice::from_raw_parts(s.as_ptr(), s.len()) };
            write_elements(w, raw)
        }
        None => Ok(()),
    }
}

/// Read an explicit-storage matrix, restoring its offset and stride over
/// a fresh storage of the recorded extent.
pub fn read_mat_explicit<T: Pod, R: Read>(r: &mut R) -> Result<MatView<T>, CodecError> {
    read_mode(r, MODE_MAT_EXPLICIT)?;
    let rows = read_len(r)?;
    let cols = read_len(r)?;
    let stride = read_len(r)?;
    let offset = read_len(r)?;
    let storage_len = read_len(r)?;
    let data = read_elements(r, storage_len)?;
    let storage = Rc::new(Storage::from_vec(data));
    Ok(MatView::from_parts(storage, offset, rows, cols, stride)?)
}
