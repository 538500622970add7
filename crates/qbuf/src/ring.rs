use alloc::{boxed::Box, vec, vec::Vec};
use core::fmt;

use bytes::Bytes;

use crate::{
    error::{QueueError, Result},
    scanner,
};

/// A fixed-capacity byte ring.
///
/// Unlike [`BufferQueue`](crate::BufferQueue), pushed bytes are copied into
/// one preallocated region and a push that would exceed the capacity is
/// rejected. Reads copy out, wrapping around the end of the region.
///
/// ```rust
/// use qbuf::RingBuffer;
///
/// let mut ring = RingBuffer::with_delimiter(8, "\n");
/// ring.push(b"ab\ncd").unwrap();
/// assert_eq!(ring.popline().unwrap(), "ab\n");
/// assert!(ring.push(b"efghijk").is_err());
/// ```
#[derive(Clone)]
pub struct RingBuffer {
    storage: Box<[u8]>,
    start: usize,
    len: usize,
    delimiter: Option<Bytes>,
}

impl RingBuffer {
    /// Create an empty ring holding at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity].into_boxed_slice(),
            start: 0,
            len: 0,
            delimiter: None,
        }
    }

    /// Create an empty ring that splits records on `delimiter`.
    #[must_use]
    pub fn with_delimiter(capacity: usize, delimiter: impl Into<Bytes>) -> Self {
        let mut ring = Self::new(capacity);
        ring.set_delimiter(delimiter);
        ring
    }

    /// Maximum number of bytes the ring holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The configured delimiter, if any.
    #[must_use]
    pub fn delimiter(&self) -> Option<&[u8]> {
        self.delimiter.as_deref()
    }

    /// Replace the delimiter. An empty delimiter unsets it.
    pub fn set_delimiter(&mut self, delimiter: impl Into<Bytes>) {
        let delimiter = delimiter.into();
        self.delimiter = (!delimiter.is_empty()).then_some(delimiter);
    }

    /// Unset the delimiter.
    pub fn clear_delimiter(&mut self) {
        self.delimiter = None;
    }

    /// Copy `data` into the ring.
    ///
    /// # Errors
    ///
    /// [`QueueError::Overflow`] when `data` does not fit in the free space.
    /// Nothing is stored in that case.
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        let capacity = self.capacity();
        if data.len() > capacity - self.len {
            return Err(QueueError::Overflow {
                capacity,
                length: self.len,
                requested: data.len(),
            });
        }
        if data.is_empty() {
            return Ok(());
        }

        let end = (self.start + self.len) % capacity;
        let first = data.len().min(capacity - end);
        self.storage[end..end + first].copy_from_slice(&data[..first]);
        self.storage[..data.len() - first].copy_from_slice(&data[first..]);
        self.len += data.len();
        Ok(())
    }

    /// Pop exactly `length` bytes.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when fewer than `length` bytes are buffered.
    pub fn pop(&mut self, length: usize) -> Result<Bytes> {
        if length > self.len {
            return Err(QueueError::Underflow {
                available: self.len,
                requested: length,
            });
        }
        let (front, back) = self.as_slices();
        let first = length.min(front.len());
        let mut out = Vec::with_capacity(length);
        out.extend_from_slice(&front[..first]);
        out.extend_from_slice(&back[..length - first]);

        self.len -= length;
        self.start = if self.len == 0 {
            0
        } else {
            (self.start + length) % self.capacity()
        };
        Ok(out.into())
    }

    /// Pop everything that is buffered.
    pub fn pop_all(&mut self) -> Bytes {
        self.pop(self.len).unwrap_or_default()
    }

    /// Pop the next record, delimiter included.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoDelimiter`] without a delimiter,
    /// [`QueueError::NoRecord`] when the delimiter is not buffered.
    pub fn popline(&mut self) -> Result<Bytes> {
        let delimiter = self.delimiter.as_deref().ok_or(QueueError::NoDelimiter)?;
        let found = if self.len < delimiter.len() {
            None
        } else {
            let (front, back) = self.as_slices();
            scanner::find_delimiter([front, back], delimiter)
        };
        let found = found.ok_or(QueueError::NoRecord {
            available: self.len,
        })?;
        self.pop(found.end())
    }

    /// Pop every complete record, delimiters included.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoDelimiter`] without a delimiter.
    pub fn poplines(&mut self) -> Result<Vec<Bytes>> {
        let mut lines = Vec::new();
        loop {
            match self.popline() {
                Ok(line) => lines.push(line),
                Err(err) if err.is_underflow() => return Ok(lines),
                Err(err) => return Err(err),
            }
        }
    }

    /// Drop every buffered byte.
    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }

    /// The buffered bytes as the part up to the end of storage and the
    /// wrapped part.
    fn as_slices(&self) -> (&[u8], &[u8]) {
        let capacity = self.capacity();
        if self.start + self.len <= capacity {
            (&self.storage[self.start..self.start + self.len], &[])
        } else {
            let wrapped = self.start + self.len - capacity;
            (&self.storage[self.start..], &self.storage[..wrapped])
        }
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("start", &self.start)
            .field("len", &self.len)
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<RingBuffer of {}/{} bytes>", self.len, self.capacity())
    }
}
