use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = QueueError> = core::result::Result<T, E>;

/// Coarse classification of a [`QueueError`].
///
/// Framing adapters usually only care about the kind: an underflow means
/// "wait for more bytes", anything else is a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was structurally invalid (no delimiter, ring overflow).
    Value,
    /// Not enough bytes are buffered yet.
    Underflow,
    /// A struct format string could not be parsed.
    Format,
}

/// Errors returned by [`BufferQueue`](crate::BufferQueue) and
/// [`RingBuffer`](crate::RingBuffer).
///
/// A failed call never consumes anything: the buffer is left exactly as it
/// was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// A determinate request asked for more bytes than are buffered.
    #[error("buffer underflow: currently at {available} bytes, tried to pop {requested} bytes")]
    Underflow {
        /// Bytes buffered at the time of the call.
        available: usize,
        /// Bytes the call needed.
        requested: usize,
    },
    /// The delimiter does not occur in the buffered bytes yet.
    #[error("no complete record: delimiter not found in {available} buffered bytes")]
    NoRecord {
        /// Bytes buffered at the time of the call.
        available: usize,
    },
    /// A delimiter-based read was attempted with no (or an empty) delimiter.
    #[error("no delimiter")]
    NoDelimiter,
    /// A [`RingBuffer`](crate::RingBuffer) push would exceed its capacity.
    #[error(
        "buffer overflow: holds {capacity} bytes, currently at {length} bytes, tried to add {requested} bytes"
    )]
    Overflow {
        /// Fixed capacity of the ring.
        capacity: usize,
        /// Bytes buffered at the time of the call.
        length: usize,
        /// Bytes the push tried to add.
        requested: usize,
    },
    /// The struct format passed to `pop_struct` is malformed.
    #[error("bad struct format: {0}")]
    Format(#[from] FormatError),
}

impl QueueError {
    /// The [`ErrorKind`] this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Underflow { .. } | QueueError::NoRecord { .. } => ErrorKind::Underflow,
            QueueError::NoDelimiter | QueueError::Overflow { .. } => ErrorKind::Value,
            QueueError::Format(_) => ErrorKind::Format,
        }
    }

    /// Shortcut for `kind() == ErrorKind::Underflow`.
    ///
    /// An underflow is always recoverable: buffer more bytes and retry.
    #[must_use]
    pub fn is_underflow(&self) -> bool {
        self.kind() == ErrorKind::Underflow
    }
}

/// Errors produced while parsing a [`StructFormat`](crate::StructFormat).
///
/// Positions are byte offsets into the format string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A character that is not a format code.
    #[error("bad char '{ch}' in struct format at {pos}")]
    UnknownCode {
        /// The offending character.
        ch: char,
        /// Its byte offset.
        pos: usize,
    },
    /// The format ends with a repeat count.
    #[error("repeat count given without format specifier")]
    MissingCode,
    /// `n`, `N` and `P` outside of native (`@`) mode.
    #[error("'{ch}' is only available in native mode")]
    NativeOnly {
        /// The offending code.
        ch: char,
    },
    /// A repeat count or the total size does not fit in `usize`.
    #[error("total struct size too long")]
    CountOverflow,
    /// `unpack` was handed a buffer of the wrong size.
    #[error("unpack requires a buffer of {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The format's size.
        expected: usize,
        /// Length of the buffer passed in.
        actual: usize,
    },
}
