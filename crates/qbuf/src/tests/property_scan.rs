use alloc::vec::Vec;

use bstr::ByteSlice;
use quickcheck::{QuickCheck, TestResult};

use crate::{
    BufferQueue,
    scanner::find_delimiter,
    tests::utils::{partition, quickcheck_tests},
};

/// Map arbitrary bytes onto a three-letter alphabet so that delimiters
/// actually occur and overlap.
fn narrow(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|b| b'a' + b % 3).collect()
}

/// Property: the chunked scan reports the same first match as a search over
/// the flattened bytes.
#[test]
fn scan_matches_flat_search_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(data: Vec<u8>, splits: Vec<usize>, delimiter: Vec<u8>) -> TestResult {
        let delimiter = narrow(&delimiter[..delimiter.len().min(4)]);
        if delimiter.is_empty() {
            return TestResult::discard();
        }
        let data = narrow(&data);
        let pieces = partition(&data, &splits);

        let scanned = find_delimiter(pieces.iter().copied(), &delimiter).map(|m| m.start);
        TestResult::from_bool(scanned == data.find(&delimiter))
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, Vec<usize>, Vec<u8>) -> TestResult);
}

/// Property: draining every record reproduces `split` on the flat bytes,
/// leaving the unterminated tail behind.
#[test]
fn poplines_match_flat_split_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(data: Vec<u8>, splits: Vec<usize>, delimiter: Vec<u8>) -> TestResult {
        let delimiter = narrow(&delimiter[..delimiter.len().min(3)]);
        if delimiter.is_empty() {
            return TestResult::discard();
        }
        let data = narrow(&data);

        let mut queue = BufferQueue::with_delimiter(delimiter.clone());
        for piece in partition(&data, &splits) {
            queue.push_slice(piece);
        }
        let Ok(lines) = queue.poplines() else {
            return TestResult::failed();
        };
        let tail = queue.pop_all();

        let mut expected = data.split_str(&delimiter).collect::<Vec<_>>();
        let expected_tail = expected.pop().unwrap_or_default();
        TestResult::from_bool(
            lines.len() == expected.len()
                && lines.iter().zip(&expected).all(|(got, want)| got == want)
                && tail == expected_tail,
        )
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, Vec<usize>, Vec<u8>) -> TestResult);
}

#[test]
fn delimiter_spanning_three_chunks() {
    let mut queue = BufferQueue::with_delimiter("<=>");
    queue.push_many(["x<", "=", ">y"]);
    assert_eq!(queue.popline().unwrap(), "x");
    assert_eq!(queue.pop_all(), "y");
}
