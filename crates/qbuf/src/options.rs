use bytes::Bytes;

/// Default number of chunk slots reserved by a new [`BufferQueue`].
///
/// [`BufferQueue`]: crate::BufferQueue
pub const DEFAULT_CHUNK_CAPACITY: usize = 8;

/// Construction options for a [`BufferQueue`](crate::BufferQueue).
///
/// # Examples
///
/// ```rust
/// use qbuf::{BufferQueue, QueueOptions};
///
/// let queue = BufferQueue::with_options(QueueOptions {
///     delimiter: Some("\r\n".into()),
///     ..Default::default()
/// });
/// assert_eq!(queue.delimiter(), Some(&b"\r\n"[..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueOptions {
    /// Delimiter used by `popline`, `poplines` and record iteration when no
    /// explicit delimiter is passed.
    ///
    /// An empty delimiter is the same as `None`.
    ///
    /// # Default
    ///
    /// `None`
    pub delimiter: Option<Bytes>,

    /// Number of chunk slots to reserve up front.
    ///
    /// The chunk list grows on demand; this only avoids the first few
    /// reallocations for connections that keep a handful of chunks buffered.
    ///
    /// # Default
    ///
    /// [`DEFAULT_CHUNK_CAPACITY`]
    pub chunk_capacity: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}

/// What a consuming read does when more bytes are requested than buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnderflowPolicy {
    /// Fail with [`QueueError::Underflow`](crate::QueueError::Underflow).
    #[default]
    Error,
    /// Return everything that is buffered instead.
    Clamp,
}

/// Per-call options for [`BufferQueue::pop_with`](crate::BufferQueue::pop_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PopOptions {
    /// Underflow handling.
    ///
    /// # Default
    ///
    /// [`UnderflowPolicy::Error`]
    pub underflow: UnderflowPolicy,

    /// Whether a span lying inside a single chunk is returned as a zero-copy
    /// view of that chunk.
    ///
    /// Views share the chunk's allocation, so a short view keeps the whole
    /// chunk alive. Spans that cross a chunk boundary are always copied.
    ///
    /// # Default
    ///
    /// `false`
    pub as_view: bool,
}

impl PopOptions {
    /// Options used by `pop_atmost`.
    pub const CLAMP: Self = Self {
        underflow: UnderflowPolicy::Clamp,
        as_view: false,
    };

    /// Options used by `pop_view`.
    pub const VIEW: Self = Self {
        underflow: UnderflowPolicy::Error,
        as_view: true,
    };
}
