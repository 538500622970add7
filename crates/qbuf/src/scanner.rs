//! Delimiter search across a sequence of independently allocated chunks.
//!
//! The scan walks the chunks once. Inside a chunk the delimiter is located
//! with a plain substring search. A delimiter can also straddle one or more
//! chunk boundaries; for that the scanner carries a *split trial* from one
//! chunk to the next: the length of the longest suffix of the bytes scanned
//! so far that is also a proper prefix of the delimiter. The trial is a
//! failure-function automaton over the delimiter, so shorter candidates are
//! reached through the border table instead of being re-compared.
//!
//! At a boundary only the first `delimiter.len() - 1` bytes of the new chunk
//! are fed to the trial, and only the last `delimiter.len() - 1` bytes of a
//! chunk that held no match are folded into it. Each fed byte costs amortized
//! constant time, so a scan is linear in the scanned bytes plus the
//! delimiter length.
//!
//! Invariants
//! - The matched prefix is always shorter than the delimiter.
//! - Every shorter border of the matched prefix stays a candidate through the
//!   border table.
//! - Reported positions are the first match in stream order.

use alloc::{vec, vec::Vec};

use bstr::ByteSlice;

/// A delimiter located by [`find_delimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    /// Offset of the first delimiter byte, relative to the first byte of the
    /// first segment passed to the scan.
    pub(crate) start: usize,
    /// Length of the delimiter.
    pub(crate) len: usize,
}

impl Match {
    /// Offset one past the last delimiter byte.
    pub(crate) fn end(self) -> usize {
        self.start + self.len
    }
}

/// Partial delimiter match carried across a chunk boundary.
#[derive(Debug)]
struct SplitTrial<'d> {
    delimiter: &'d [u8],
    /// `borders[i]` is the longest proper border of `delimiter[..=i]`.
    borders: Vec<usize>,
    matched: usize,
}

impl<'d> SplitTrial<'d> {
    fn new(delimiter: &'d [u8]) -> Self {
        let mut borders = vec![0; delimiter.len()];
        let mut k = 0;
        for i in 1..delimiter.len() {
            while k > 0 && delimiter[i] != delimiter[k] {
                k = borders[k - 1];
            }
            if delimiter[i] == delimiter[k] {
                k += 1;
            }
            borders[i] = k;
        }
        Self {
            delimiter,
            borders,
            matched: 0,
        }
    }

    /// Delimiter bytes the next chunk has to supply to complete the longest
    /// pending candidate, or `None` when nothing is pending.
    fn pending(&self) -> Option<usize> {
        (self.matched > 0).then(|| self.delimiter.len() - self.matched)
    }

    fn step(&self, mut state: usize, byte: u8) -> usize {
        while state > 0 && self.delimiter[state] != byte {
            state = self.borders[state - 1];
        }
        if self.delimiter[state] == byte {
            state + 1
        } else {
            state
        }
    }

    /// Try to complete a candidate with the leading bytes of `chunk`.
    ///
    /// Returns the offset in `chunk` one past the end of the match.
    fn resolve(&self, chunk: &[u8]) -> Option<usize> {
        let mut state = self.matched;
        for (i, &byte) in chunk.iter().enumerate() {
            state = self.step(state, byte);
            if state == self.delimiter.len() {
                return Some(i + 1);
            }
            // The candidate now starts inside `chunk`.
            if state <= i + 1 {
                return None;
            }
        }
        None
    }

    /// Fold `chunk` into the trial after it failed to produce a match.
    fn advance(&mut self, chunk: &[u8]) {
        let keep = self.delimiter.len() - 1;
        let (mut state, tail) = if chunk.len() > keep {
            (0, &chunk[chunk.len() - keep..])
        } else {
            (self.matched, chunk)
        };
        for &byte in tail {
            state = self.step(state, byte);
        }
        debug_assert!(state < self.delimiter.len(), "unreported match");
        self.matched = state;
    }
}

/// Find the first occurrence of `delimiter` in the concatenation of
/// `segments`.
///
/// `delimiter` must not be empty. Empty segments are tolerated.
pub(crate) fn find_delimiter<'a, I>(segments: I, delimiter: &[u8]) -> Option<Match>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    debug_assert!(!delimiter.is_empty(), "empty delimiter");

    let mut trial = SplitTrial::new(delimiter);
    let mut pos = 0;
    for (index, segment) in segments.into_iter().enumerate() {
        if trial.pending().is_some() {
            if let Some(end) = trial.resolve(segment) {
                let start = pos + end - delimiter.len();
                log::trace!("delimiter straddles boundary before segment {index} at {start}");
                return Some(Match {
                    start,
                    len: delimiter.len(),
                });
            }
        }

        if let Some(found) = segment.find(delimiter) {
            log::trace!("delimiter found in segment {index} at {}", pos + found);
            return Some(Match {
                start: pos + found,
                len: delimiter.len(),
            });
        }

        if delimiter.len() > 1 {
            trial.advance(segment);
        }
        pos += segment.len();
    }

    log::trace!("no delimiter in {pos} scanned bytes");
    None
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn find(segments: &[&str], delimiter: &str) -> Option<usize> {
        find_delimiter(segments.iter().map(|s| s.as_bytes()), delimiter.as_bytes())
            .map(|m| m.start)
    }

    #[rstest]
    #[case::inside_one_chunk(&["foo\nbar"], "\n", Some(3))]
    #[case::second_chunk(&["foo", "ba\nr"], "\n", Some(5))]
    #[case::split_two_ways(&["foo *", "** bar"], "***", Some(4))]
    #[case::split_one_byte_middle(&["a*", "*", "*b"], "***", Some(1))]
    #[case::shorter_candidate_survives(&["xaa", "ab"], "aab", Some(2))]
    #[case::overlapping_prefix(&["aaa", "ab"], "aab", Some(2))]
    #[case::mismatch_then_inside(&["x*", "y***"], "***", Some(3))]
    #[case::empty_segments(&["", "a*", "", "*z"], "**", Some(1))]
    #[case::missing(&["ab", "cd"], "bd", None)]
    #[case::partial_at_end(&["ab", "c*"], "**", None)]
    fn scans(
        #[case] segments: &[&str],
        #[case] delimiter: &str,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(find(segments, delimiter), expected);
    }

    #[test]
    fn trial_tracks_longest_prefix() {
        let mut trial = SplitTrial::new(b"world");
        trial.advance(b"hello wor");
        assert_eq!(trial.matched, 3);
        assert_eq!(trial.pending(), Some(2));
        trial.advance(b"x");
        assert_eq!(trial.matched, 0);
        assert_eq!(trial.pending(), None);
    }

    #[test]
    fn trial_spans_short_chunks() {
        let mut trial = SplitTrial::new(b"-----");
        for chunk in [&b"--"[..], b"-", b"-"] {
            trial.advance(chunk);
        }
        assert_eq!(trial.matched, 4);
        assert_eq!(trial.resolve(b"-x"), Some(1));
    }

    #[test]
    fn trial_falls_back_to_shorter_border() {
        let mut trial = SplitTrial::new(b"aab");
        trial.advance(b"xaa");
        assert_eq!(trial.matched, 2);
        assert_eq!(trial.resolve(b"ab"), Some(2));
        assert_eq!(trial.resolve(b"b"), Some(1));
        assert_eq!(trial.resolve(b"xb"), None);
        trial.advance(b"xa");
        assert_eq!(trial.matched, 1);
    }

    #[test]
    fn long_periodic_delimiter_over_byte_chunks() {
        let mut delimiter = vec![b'a'; 999];
        delimiter.push(b'b');
        let mut data = vec![b'a'; 3000];
        data.push(b'b');
        let found = find_delimiter(data.chunks(1), &delimiter).unwrap();
        assert_eq!(found.start, 2001);
        assert_eq!(found.end(), data.len());
    }
}
