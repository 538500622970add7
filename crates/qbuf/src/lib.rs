//! Chunked byte queues for framing streamed protocol data.
//!
//! Network reads hand over bytes in arbitrary pieces. [`BufferQueue`] keeps
//! those pieces as they arrive and lets a protocol parser take them back out
//! in the units it cares about: exact byte counts, delimiter-terminated
//! records, or fixed binary layouts described by a [`StructFormat`].
//!
//! A read that cannot be satisfied yet fails with an underflow
//! ([`QueueError::is_underflow`]) and leaves the queue untouched, so the
//! caller can buffer more data and retry.
//!
//! ```rust
//! use qbuf::{BufferQueue, StructValue};
//!
//! let mut queue = BufferQueue::new();
//! queue.push(&b"\x00\x05he"[..]);
//! assert!(queue.pop_struct("!H").is_ok_and(|v| v == [StructValue::UInt(5)]));
//! assert!(queue.pop(5).unwrap_err().is_underflow());
//! queue.push(&b"llo"[..]);
//! assert_eq!(queue.pop(5).unwrap(), "hello");
//! ```
//!
//! [`RingBuffer`] offers the same record reads over a single fixed-size
//! allocation for callers that want a hard memory bound.

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod error;
mod format;
mod options;
mod queue;
mod ring;
mod scanner;

#[cfg(test)]
mod tests;

pub use bytes::Bytes;
pub use error::{ErrorKind, FormatError, QueueError, Result};
pub use format::{StructFormat, StructValue};
pub use options::{DEFAULT_CHUNK_CAPACITY, PopOptions, QueueOptions, UnderflowPolicy};
pub use queue::{BufferQueue, NextRecord, Records};
pub use ring::RingBuffer;
