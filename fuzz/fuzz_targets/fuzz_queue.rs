#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use qbuf::{BufferQueue, NextRecord, PopOptions, QueueError, StructFormat, UnderflowPolicy};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Arbitrary)]
enum Op {
    Push { data: Vec<u8>, split_seed: u64 },
    Pop { length: u16, clamp: bool, as_view: bool },
    Peek(u16),
    Skip(u16),
    Popline { keepends: bool },
    NextRecord,
    SetDelimiter(Vec<u8>),
    PopStruct(String),
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Script {
    delimiter: Vec<u8>,
    ops: Vec<Op>,
}

/// Flat reference model: everything buffered, in order, in one vector.
#[derive(Default)]
struct Model {
    bytes: Vec<u8>,
    delimiter: Option<Vec<u8>>,
}

impl Model {
    fn find(&self) -> Option<usize> {
        let delimiter = self.delimiter.as_deref()?;
        self.bytes
            .windows(delimiter.len())
            .position(|window| window == delimiter)
    }
}

/// Split `data` into non-empty chunks whose sizes come from `split_seed`.
fn split(data: &[u8], split_seed: u64) -> Vec<Vec<u8>> {
    let mut rng = SmallRng::seed_from_u64(split_seed);
    let mut chunks = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(rng.random_range(1..=rest.len()));
        chunks.push(chunk.to_vec());
        rest = tail;
    }
    chunks
}

fn run(script: Script) {
    let mut queue = BufferQueue::with_delimiter(script.delimiter.clone());
    let mut model = Model {
        delimiter: (!script.delimiter.is_empty()).then_some(script.delimiter),
        ..Model::default()
    };

    for op in script.ops {
        match op {
            Op::Push { data, split_seed } => {
                queue.push_many(split(&data, split_seed));
                model.bytes.extend_from_slice(&data);
            }
            Op::Pop {
                length,
                clamp,
                as_view,
            } => {
                let length = usize::from(length);
                let options = PopOptions {
                    underflow: if clamp {
                        UnderflowPolicy::Clamp
                    } else {
                        UnderflowPolicy::Error
                    },
                    as_view,
                };
                match queue.pop_with(Some(length), options) {
                    Ok(popped) => {
                        let take = length.min(model.bytes.len());
                        assert!(clamp || take == length);
                        assert_eq!(popped, model.bytes.drain(..take).collect::<Vec<_>>());
                    }
                    Err(err) => {
                        assert!(!clamp && length > model.bytes.len(), "{err}");
                        assert!(err.is_underflow());
                    }
                }
            }
            Op::Peek(length) => {
                let length = usize::from(length);
                match queue.peek(length) {
                    Ok(peeked) => assert_eq!(peeked, model.bytes[..length]),
                    Err(err) => assert!(err.is_underflow() && length > model.bytes.len()),
                }
            }
            Op::Skip(length) => {
                let length = usize::from(length);
                if queue.skip(length).is_ok() {
                    model.bytes.drain(..length);
                } else {
                    assert!(length > model.bytes.len());
                }
            }
            Op::Popline { keepends } => match (queue.popline_with(None, keepends), model.find()) {
                (Err(QueueError::NoDelimiter), _) => assert!(model.delimiter.is_none()),
                (Ok(line), Some(at)) => {
                    let end = at + model.delimiter.as_ref().map_or(0, Vec::len);
                    let record = model.bytes.drain(..end).collect::<Vec<_>>();
                    let expected = if keepends { &record[..] } else { &record[..at] };
                    assert_eq!(line, expected);
                }
                (Err(err), None) => assert!(err.is_underflow()),
                (got, want) => panic!("popline returned {got:?}, model found {want:?}"),
            },
            Op::NextRecord => match (queue.next_record(), model.find()) {
                (Err(QueueError::NoDelimiter), _) => assert!(model.delimiter.is_none()),
                (Ok(NextRecord::Record(record)), Some(at)) => {
                    let end = at + model.delimiter.as_ref().map_or(0, Vec::len);
                    assert_eq!(record, model.bytes.drain(..end).collect::<Vec<_>>());
                }
                (Ok(NextRecord::Exhausted), None) => {}
                (got, want) => panic!("next_record returned {got:?}, model found {want:?}"),
            },
            Op::SetDelimiter(delimiter) => {
                queue.set_delimiter(delimiter.clone());
                model.delimiter = (!delimiter.is_empty()).then_some(delimiter);
            }
            Op::PopStruct(format) => {
                let result = queue.pop_struct(&format);
                match StructFormat::parse(&format) {
                    Err(_) => assert!(matches!(result, Err(QueueError::Format(_)))),
                    Ok(parsed) if parsed.size() > model.bytes.len() => {
                        assert!(result.is_err_and(|err| err.is_underflow()));
                    }
                    Ok(parsed) => {
                        assert_eq!(result.map(|values| values.len()), Ok(parsed.field_count()));
                        model.bytes.drain(..parsed.size());
                    }
                }
            }
            Op::Clear => {
                queue.clear();
                model.bytes.clear();
            }
        }
        assert_eq!(queue.len(), model.bytes.len());
    }

    assert_eq!(queue.pop_all(), model.bytes);
}

fuzz_target!(|script: Script| run(script));
