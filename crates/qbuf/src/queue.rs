use alloc::{collections::VecDeque, vec::Vec};
use core::fmt;

use bytes::Bytes;

use crate::{
    error::{QueueError, Result},
    format::{StructFormat, StructValue},
    options::{PopOptions, QueueOptions, UnderflowPolicy},
    scanner::{self, Match},
};

/// Outcome of [`BufferQueue::next_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextRecord {
    /// A complete record, delimiter included.
    Record(Bytes),
    /// No complete record is buffered yet.
    Exhausted,
}

/// A queue of byte chunks with consuming reads.
///
/// Chunks are pushed as they arrive and never copied on push. Reads take
/// bytes from the front: fixed-size spans with [`pop`](Self::pop),
/// delimiter-terminated records with [`popline`](Self::popline) and binary
/// structures with [`pop_struct`](Self::pop_struct). A span that lies inside
/// a single chunk can be returned as a zero-copy view; spans that cross a
/// chunk boundary are copied into a new buffer.
///
/// The queue is a plain single-owner structure: every read and write takes
/// `&mut self`.
///
/// ```rust
/// use qbuf::BufferQueue;
///
/// let mut queue = BufferQueue::with_delimiter("\n");
/// queue.push("foo\nba");
/// queue.push("r\nbaz");
/// assert_eq!(queue.poplines().unwrap(), ["foo", "bar"]);
/// assert_eq!(queue.pop_all(), "baz");
/// ```
#[derive(Debug, Clone)]
pub struct BufferQueue {
    chunks: VecDeque<Bytes>,
    /// Bytes already consumed from `chunks[0]`.
    offset: usize,
    /// Unconsumed bytes across all chunks.
    len: usize,
    delimiter: Option<Bytes>,
}

impl Default for BufferQueue {
    fn default() -> Self {
        Self::with_options(QueueOptions::default())
    }
}

impl BufferQueue {
    /// Create an empty queue with no delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue that splits records on `delimiter`.
    #[must_use]
    pub fn with_delimiter(delimiter: impl Into<Bytes>) -> Self {
        Self::with_options(QueueOptions {
            delimiter: Some(delimiter.into()),
            ..QueueOptions::default()
        })
    }

    /// Create an empty queue from explicit options.
    #[must_use]
    pub fn with_options(options: QueueOptions) -> Self {
        Self {
            chunks: VecDeque::with_capacity(options.chunk_capacity),
            offset: 0,
            len: 0,
            delimiter: options.delimiter.filter(|d| !d.is_empty()),
        }
    }

    /// The configured delimiter, if any.
    #[must_use]
    pub fn delimiter(&self) -> Option<&[u8]> {
        self.delimiter.as_deref()
    }

    /// Replace the configured delimiter. An empty delimiter unsets it.
    ///
    /// The change applies to the next record read.
    pub fn set_delimiter(&mut self, delimiter: impl Into<Bytes>) {
        let delimiter = delimiter.into();
        self.delimiter = (!delimiter.is_empty()).then_some(delimiter);
    }

    /// Unset the configured delimiter.
    pub fn clear_delimiter(&mut self) {
        self.delimiter = None;
    }

    /// Number of unconsumed bytes.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are buffered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks still holding unconsumed bytes.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Append one chunk without copying it.
    ///
    /// Empty chunks are accepted and dropped.
    pub fn push(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push_back(chunk);
        self.check_invariants();
    }

    /// Append a copy of `data` as one chunk.
    pub fn push_slice(&mut self, data: &[u8]) {
        self.push(Bytes::copy_from_slice(data));
    }

    /// Append each chunk of `chunks` in order.
    pub fn push_many<I>(&mut self, chunks: I)
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        for chunk in chunks {
            self.push(chunk);
        }
    }

    /// General consuming read.
    ///
    /// `length` defaults to everything buffered. Requests larger than
    /// [`len`](Self::len) fail or are clamped according to
    /// `options.underflow`; a zero-length request always succeeds with an
    /// empty result.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when `length` exceeds the buffered bytes and
    /// the policy is [`UnderflowPolicy::Error`]. Nothing is consumed.
    pub fn pop_with(&mut self, length: Option<usize>, options: PopOptions) -> Result<Bytes> {
        let mut length = length.unwrap_or(self.len);
        if length > self.len {
            match options.underflow {
                UnderflowPolicy::Error => {
                    return Err(QueueError::Underflow {
                        available: self.len,
                        requested: length,
                    });
                }
                UnderflowPolicy::Clamp => length = self.len,
            }
        }
        Ok(self.take(length, options.as_view))
    }

    /// Pop exactly `length` bytes.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when fewer than `length` bytes are buffered.
    pub fn pop(&mut self, length: usize) -> Result<Bytes> {
        self.pop_with(Some(length), PopOptions::default())
    }

    /// Pop everything that is buffered.
    pub fn pop_all(&mut self) -> Bytes {
        self.take(self.len, false)
    }

    /// Pop up to `length` bytes.
    pub fn pop_atmost(&mut self, length: usize) -> Bytes {
        self.pop_with(Some(length), PopOptions::CLAMP).unwrap_or_default()
    }

    /// Pop exactly `length` bytes, as a view of the head chunk when the span
    /// lies inside it.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when fewer than `length` bytes are buffered.
    pub fn pop_view(&mut self, length: usize) -> Result<Bytes> {
        self.pop_with(Some(length), PopOptions::VIEW)
    }

    /// Pop everything, as a view when it all lies in one chunk.
    pub fn pop_view_all(&mut self) -> Bytes {
        self.take(self.len, true)
    }

    /// Return the next `length` bytes without consuming them.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when fewer than `length` bytes are buffered.
    pub fn peek(&self, length: usize) -> Result<Bytes> {
        self.ensure(length)?;
        if length == 0 {
            return Ok(Bytes::new());
        }
        if let Some(head) = self.chunks.front() {
            if self.offset + length <= head.len() {
                return Ok(head.slice(self.offset..self.offset + length));
            }
        }

        let mut out = Vec::with_capacity(length);
        for segment in self.segments() {
            let want = length - out.len();
            if want == 0 {
                break;
            }
            out.extend_from_slice(&segment[..want.min(segment.len())]);
        }
        Ok(out.into())
    }

    /// Discard exactly `length` bytes.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when fewer than `length` bytes are buffered.
    pub fn skip(&mut self, length: usize) -> Result<()> {
        self.ensure(length)?;
        self.len -= length;
        let mut remaining = length;
        while remaining > 0 {
            let Some(head) = self.chunks.front() else {
                break;
            };
            let available = head.len() - self.offset;
            if remaining >= available {
                remaining -= available;
                self.evict_head();
            } else {
                self.offset += remaining;
                remaining = 0;
            }
        }
        self.check_invariants();
        Ok(())
    }

    /// Pop and decode one binary structure described by `format`.
    ///
    /// See [`StructFormat`] for the format language.
    ///
    /// # Errors
    ///
    /// [`QueueError::Format`] for a malformed format and
    /// [`QueueError::Underflow`] when fewer than the format's size are
    /// buffered. Nothing is consumed in either case.
    pub fn pop_struct(&mut self, format: &str) -> Result<Vec<StructValue>> {
        let format = StructFormat::parse(format)?;
        self.pop_struct_with(&format)
    }

    /// [`pop_struct`](Self::pop_struct) with a format parsed ahead of time.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] when fewer than `format.size()` bytes are
    /// buffered.
    pub fn pop_struct_with(&mut self, format: &StructFormat) -> Result<Vec<StructValue>> {
        let data = self.pop(format.size())?;
        Ok(format.unpack(&data)?)
    }

    /// Pop the next record terminated by `delimiter`, or by the configured
    /// delimiter when `delimiter` is `None`.
    ///
    /// With `keepends` the returned record includes the delimiter; otherwise
    /// the delimiter is consumed and dropped.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoDelimiter`] when no non-empty delimiter is available,
    /// [`QueueError::NoRecord`] when no complete record is buffered.
    pub fn popline_with(&mut self, delimiter: Option<&[u8]>, keepends: bool) -> Result<Bytes> {
        let found = self
            .locate(delimiter)?
            .ok_or(QueueError::NoRecord {
                available: self.len,
            })?;
        if keepends {
            Ok(self.take(found.end(), false))
        } else {
            let record = self.take(found.start, false);
            self.skip(found.len)?;
            Ok(record)
        }
    }

    /// Pop the next record on the configured delimiter, without the
    /// delimiter.
    ///
    /// # Errors
    ///
    /// As for [`popline_with`](Self::popline_with).
    pub fn popline(&mut self) -> Result<Bytes> {
        self.popline_with(None, false)
    }

    /// Pop every complete record on `delimiter` (or the configured one),
    /// without delimiters.
    ///
    /// Running out of complete records ends the loop; it is not an error.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoDelimiter`] when no non-empty delimiter is available.
    pub fn poplines_with(&mut self, delimiter: Option<&[u8]>) -> Result<Vec<Bytes>> {
        let mut lines = Vec::new();
        loop {
            match self.popline_with(delimiter, false) {
                Ok(line) => lines.push(line),
                Err(err) if err.is_underflow() => break,
                Err(err) => return Err(err),
            }
        }
        Ok(lines)
    }

    /// [`poplines_with`](Self::poplines_with) on the configured delimiter.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoDelimiter`] when no delimiter is configured.
    pub fn poplines(&mut self) -> Result<Vec<Bytes>> {
        self.poplines_with(None)
    }

    /// Pop the next record on the configured delimiter, delimiter included,
    /// or report that none is complete yet.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoDelimiter`] when no delimiter is configured.
    pub fn next_record(&mut self) -> Result<NextRecord> {
        Ok(match self.locate(None)? {
            Some(found) => NextRecord::Record(self.take(found.end(), false)),
            None => NextRecord::Exhausted,
        })
    }

    /// Iterate over the complete records currently buffered, each including
    /// its delimiter.
    ///
    /// The iterator ends once no complete record remains; pushing more data
    /// and calling `records` again picks up where it stopped.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            queue: self,
            done: false,
        }
    }

    /// Drop every buffered byte. The delimiter is kept.
    pub fn clear(&mut self) {
        log::debug!("clearing {} bytes in {} chunks", self.len, self.chunks.len());
        self.chunks.clear();
        self.offset = 0;
        self.len = 0;
    }

    /// Unconsumed bytes of each chunk, front to back.
    pub(crate) fn segments(&self) -> impl Iterator<Item = &[u8]> {
        let offset = self.offset;
        self.chunks
            .iter()
            .enumerate()
            .map(move |(index, chunk)| if index == 0 { &chunk[offset..] } else { &chunk[..] })
    }

    fn ensure(&self, length: usize) -> Result<()> {
        if length > self.len {
            Err(QueueError::Underflow {
                available: self.len,
                requested: length,
            })
        } else {
            Ok(())
        }
    }

    fn locate(&self, delimiter: Option<&[u8]>) -> Result<Option<Match>> {
        let delimiter = match delimiter {
            Some(delimiter) => delimiter,
            None => self.delimiter.as_deref().unwrap_or_default(),
        };
        if delimiter.is_empty() {
            return Err(QueueError::NoDelimiter);
        }
        if self.len < delimiter.len() {
            return Ok(None);
        }
        Ok(scanner::find_delimiter(self.segments(), delimiter))
    }

    fn evict_head(&mut self) {
        self.offset = 0;
        if let Some(chunk) = self.chunks.pop_front() {
            log::trace!("evicted chunk of {} bytes", chunk.len());
        }
    }

    /// Consume `length` bytes; the caller has checked `length <= self.len`.
    fn take(&mut self, length: usize, as_view: bool) -> Bytes {
        debug_assert!(length <= self.len);
        if length == 0 {
            return Bytes::new();
        }
        let Some(head) = self.chunks.front() else {
            return Bytes::new();
        };
        let offset = self.offset;
        let end = offset + length;

        if end <= head.len() {
            let out = if offset == 0 && end == head.len() {
                head.clone()
            } else if as_view {
                head.slice(offset..end)
            } else {
                Bytes::copy_from_slice(&head[offset..end])
            };
            if end == head.len() {
                self.evict_head();
            } else {
                self.offset = end;
            }
            self.len -= length;
            self.check_invariants();
            return out;
        }

        log::trace!("copying {length} bytes across chunk boundaries");
        let mut out = Vec::with_capacity(length);
        while out.len() < length {
            let Some(head) = self.chunks.front() else {
                break;
            };
            let want = length - out.len();
            let available = head.len() - self.offset;
            if want >= available {
                out.extend_from_slice(&head[self.offset..]);
                self.evict_head();
            } else {
                out.extend_from_slice(&head[self.offset..self.offset + want]);
                self.offset += want;
            }
        }
        self.len -= length;
        self.check_invariants();
        out.into()
    }

    #[inline]
    fn check_invariants(&self) {
        debug_assert_eq!(self.len == 0, self.chunks.is_empty(), "empty queue holds chunks");
        debug_assert!(
            self.chunks.front().is_none_or(|head| self.offset < head.len()),
            "head offset past the head chunk"
        );
        #[cfg(any(test, feature = "fuzzing"))]
        assert_eq!(
            self.segments().map(<[u8]>::len).sum::<usize>(),
            self.len,
            "cached length out of sync"
        );
    }
}

impl fmt::Display for BufferQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<BufferQueue of {} bytes>", self.len)
    }
}

impl<B: Into<Bytes>> Extend<B> for BufferQueue {
    fn extend<T: IntoIterator<Item = B>>(&mut self, iter: T) {
        self.push_many(iter);
    }
}

impl<'a> IntoIterator for &'a mut BufferQueue {
    type Item = Result<Bytes>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.records()
    }
}

/// Iterator returned by [`BufferQueue::records`].
///
/// Yields `Err` at most once, when the queue has no delimiter, and then
/// stops.
#[derive(Debug)]
pub struct Records<'a> {
    queue: &'a mut BufferQueue,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.queue.next_record() {
            Ok(NextRecord::Record(record)) => Some(Ok(record)),
            Ok(NextRecord::Exhausted) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl core::iter::FusedIterator for Records<'_> {}
