/// Errors raised when a view cannot be laid out over a storage.
///
/// These cover recoverable construction failures (`from_parts`,
/// `from_vec`, codec reads). Contract violations such as out-of-bounds
/// indexing or structural mutation of shared storage panic instead;
/// they are bugs in the caller, not conditions to handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("row stride {stride} is narrower than the row width {width}")]
    StrideTooNarrow { stride: usize, width: usize },

    #[error("view needs {required} storage elements but only {available} are allocated")]
    OutOfStorage { required: usize, available: usize },

    #[error("cannot reshape a vector of length {len} into a {rows}x{cols} matrix")]
    ReshapeMismatch { len: usize, rows: usize, cols: usize },
}

/// Convenience alias for `Result<T, LayoutError>`.
pub type Result<T> = std::result::Result<T, LayoutError>;
