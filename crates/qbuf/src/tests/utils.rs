use alloc::vec::Vec;

use crate::BufferQueue;

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Split `data` into non-empty pieces whose sizes are derived from `splits`.
///
/// Whatever is left once `splits` runs out becomes the last piece.
pub fn partition<'a>(data: &'a [u8], splits: &[usize]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    let mut rest = data;
    for &split in splits {
        if rest.is_empty() {
            break;
        }
        let (piece, tail) = rest.split_at(1 + split % rest.len());
        pieces.push(piece);
        rest = tail;
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// A queue primed with `data` cut into pieces of the given `sizes`.
pub fn queue_with_sizes(delimiter: &'static [u8], data: &[u8], sizes: &[usize]) -> BufferQueue {
    assert_eq!(sizes.iter().sum::<usize>(), data.len(), "sizes must cover data");
    let mut queue = BufferQueue::with_delimiter(delimiter);
    let mut at = 0;
    for &size in sizes {
        queue.push_slice(&data[at..at + size]);
        at += size;
    }
    queue
}

/// Number of quickcheck cases, raised on CI.
pub fn quickcheck_tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}
