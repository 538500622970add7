//! Binary structure layouts for [`BufferQueue::pop_struct`].
//!
//! A format string is an optional byte-order character followed by items.
//! Each item is an optional decimal repeat count and a type code.
//!
//! | prefix | byte order | sizes | alignment |
//! |---|---|---|---|
//! | `@` (default) | native | native | native |
//! | `=` | native | standard | none |
//! | `<` | little-endian | standard | none |
//! | `>`, `!` | big-endian | standard | none |
//!
//! | code | value | standard size |
//! |---|---|---|
//! | `x` | pad byte, no value | 1 |
//! | `c` | [`StructValue::Bytes`] of length 1 | 1 |
//! | `b` / `B` | `i8` / `u8` | 1 |
//! | `?` | `bool` | 1 |
//! | `h` / `H` | `i16` / `u16` | 2 |
//! | `i` / `I`, `l` / `L` | `i32` / `u32` | 4 |
//! | `q` / `Q` | `i64` / `u64` | 8 |
//! | `n` / `N` | `isize` / `usize` | native only |
//! | `P` | pointer-sized unsigned | native only |
//! | `e` / `f` / `d` | half / single / double float | 2 / 4 / 8 |
//! | `s` | byte string, the count is its length | count |
//! | `p` | Pascal string, the count is its size | count |
//!
//! Whitespace between items is ignored.
//!
//! [`BufferQueue::pop_struct`]: crate::BufferQueue::pop_struct

use alloc::vec::Vec;
use core::{
    ffi::{c_int, c_long, c_longlong, c_short},
    mem::size_of,
    str::FromStr,
};

use bytes::Bytes;

use crate::error::FormatError;

/// One decoded field of a binary structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StructValue {
    /// Signed integer codes (`b h i l q n`).
    Int(i64),
    /// Unsigned integer codes (`B H I L Q N P`).
    UInt(u64),
    /// Float codes (`e f d`).
    Float(f64),
    /// `?`.
    Bool(bool),
    /// `c`, `s` and `p`.
    Bytes(Bytes),
}

impl StructValue {
    /// The value as a signed integer, if it is an integer that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            StructValue::Int(v) => Some(v),
            StructValue::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The value as an unsigned integer, if it is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            StructValue::Int(v) => u64::try_from(v).ok(),
            StructValue::UInt(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            StructValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            StructValue::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Native,
    Standard { little: bool },
}

impl Mode {
    fn little_endian(self) -> bool {
        match self {
            Mode::Native => cfg!(target_endian = "little"),
            Mode::Standard { little } => little,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Code {
    Pad,
    Char,
    Signed,
    Unsigned,
    Bool,
    Float,
    Str,
    Pascal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Item {
    code: Code,
    /// Width of one element in bytes.
    width: usize,
    /// Elements for numeric codes, total length for `s`/`p`/`x`.
    count: usize,
    offset: usize,
}

impl Item {
    fn span(&self) -> Option<usize> {
        match self.code {
            Code::Pad | Code::Str | Code::Pascal => Some(self.count),
            _ => self.width.checked_mul(self.count),
        }
    }
}

/// A parsed structure layout.
///
/// ```rust
/// use qbuf::{Bytes, StructFormat, StructValue};
///
/// let format: StructFormat = "!BH".parse().unwrap();
/// assert_eq!(format.size(), 3);
/// let values = format.unpack(&Bytes::from_static(&[1, 2, 3])).unwrap();
/// assert_eq!(values, [StructValue::UInt(1), StructValue::UInt(0x0203)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructFormat {
    mode: Mode,
    items: Vec<Item>,
    size: usize,
}

impl StructFormat {
    /// Parse a format string.
    ///
    /// # Errors
    ///
    /// A [`FormatError`] describing the first problem found.
    pub fn parse(format: &str) -> Result<Self, FormatError> {
        let mut chars = format.char_indices().peekable();
        let mode = match chars.peek().map(|&(_, ch)| ch) {
            Some('@') => Mode::Native,
            Some('=') => Mode::Standard {
                little: cfg!(target_endian = "little"),
            },
            Some('<') => Mode::Standard { little: true },
            Some('>' | '!') => Mode::Standard { little: false },
            _ => {
                return Self::parse_items(Mode::Native, chars);
            }
        };
        chars.next();
        Self::parse_items(mode, chars)
    }

    fn parse_items(
        mode: Mode,
        mut chars: core::iter::Peekable<core::str::CharIndices<'_>>,
    ) -> Result<Self, FormatError> {
        let mut items = Vec::new();
        let mut size: usize = 0;
        while let Some((pos, ch)) = chars.next() {
            if ch.is_ascii_whitespace() {
                continue;
            }

            let (count, code_at) = if let Some(digit) = ch.to_digit(10) {
                let mut count = digit as usize;
                loop {
                    let Some((at, next)) = chars.next() else {
                        return Err(FormatError::MissingCode);
                    };
                    let Some(digit) = next.to_digit(10) else {
                        break (count, (at, next));
                    };
                    count = count
                        .checked_mul(10)
                        .and_then(|c| c.checked_add(digit as usize))
                        .ok_or(FormatError::CountOverflow)?;
                }
            } else {
                (1, (pos, ch))
            };

            let (code, width) = Self::code(mode, code_at)?;
            if mode == Mode::Native && width > 1 {
                size = size.next_multiple_of(width);
            }
            let item = Item {
                code,
                width,
                count,
                offset: size,
            };
            size = item
                .span()
                .and_then(|span| size.checked_add(span))
                .ok_or(FormatError::CountOverflow)?;
            items.push(item);
        }
        Ok(Self { mode, items, size })
    }

    fn code(mode: Mode, (pos, ch): (usize, char)) -> Result<(Code, usize), FormatError> {
        let native = mode == Mode::Native;
        let pick = |native_width: usize, standard_width: usize| {
            if native { native_width } else { standard_width }
        };
        Ok(match ch {
            'x' => (Code::Pad, 1),
            'c' => (Code::Char, 1),
            'b' => (Code::Signed, 1),
            'B' => (Code::Unsigned, 1),
            '?' => (Code::Bool, 1),
            'h' => (Code::Signed, pick(size_of::<c_short>(), 2)),
            'H' => (Code::Unsigned, pick(size_of::<c_short>(), 2)),
            'i' => (Code::Signed, pick(size_of::<c_int>(), 4)),
            'I' => (Code::Unsigned, pick(size_of::<c_int>(), 4)),
            'l' => (Code::Signed, pick(size_of::<c_long>(), 4)),
            'L' => (Code::Unsigned, pick(size_of::<c_long>(), 4)),
            'q' => (Code::Signed, pick(size_of::<c_longlong>(), 8)),
            'Q' => (Code::Unsigned, pick(size_of::<c_longlong>(), 8)),
            'n' | 'N' | 'P' if !native => return Err(FormatError::NativeOnly { ch }),
            'n' => (Code::Signed, size_of::<isize>()),
            'N' | 'P' => (Code::Unsigned, size_of::<usize>()),
            'e' => (Code::Float, 2),
            'f' => (Code::Float, 4),
            'd' => (Code::Float, 8),
            's' => (Code::Str, 1),
            'p' => (Code::Pascal, 1),
            _ => return Err(FormatError::UnknownCode { ch, pos }),
        })
    }

    /// Total size in bytes of a structure with this layout.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of values [`unpack`](Self::unpack) produces.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item.code {
                Code::Pad => 0,
                Code::Str | Code::Pascal => 1,
                _ => item.count,
            })
            .sum()
    }

    /// Decode `data`, which must be exactly [`size`](Self::size) bytes.
    ///
    /// String fields are zero-copy slices of `data`.
    ///
    /// # Errors
    ///
    /// [`FormatError::SizeMismatch`] when `data` has the wrong length.
    pub fn unpack(&self, data: &Bytes) -> Result<Vec<StructValue>, FormatError> {
        if data.len() != self.size {
            return Err(FormatError::SizeMismatch {
                expected: self.size,
                actual: data.len(),
            });
        }

        let little = self.mode.little_endian();
        let mut values = Vec::with_capacity(self.field_count());
        for item in &self.items {
            match item.code {
                Code::Pad => {}
                Code::Str => {
                    values.push(StructValue::Bytes(
                        data.slice(item.offset..item.offset + item.count),
                    ));
                }
                Code::Pascal => {
                    let value = if item.count == 0 {
                        Bytes::new()
                    } else {
                        let len = usize::from(data[item.offset]).min(item.count - 1);
                        data.slice(item.offset + 1..item.offset + 1 + len)
                    };
                    values.push(StructValue::Bytes(value));
                }
                Code::Char => {
                    let end = item.offset + item.count;
                    values.extend((item.offset..end).map(|at| StructValue::Bytes(data.slice(at..=at))));
                }
                code => {
                    for index in 0..item.count {
                        let start = item.offset + index * item.width;
                        values.push(decode_scalar(code, &data[start..start + item.width], little));
                    }
                }
            }
        }
        Ok(values)
    }
}

impl FromStr for StructFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn decode_scalar(code: Code, raw: &[u8], little: bool) -> StructValue {
    let bits = read_uint(raw, little);
    match code {
        Code::Bool => StructValue::Bool(bits != 0),
        Code::Signed => StructValue::Int(sign_extend(bits, raw.len())),
        Code::Float => StructValue::Float(match raw.len() {
            2 => f16_to_f64(bits as u16),
            4 => f64::from(f32::from_bits(bits as u32)),
            _ => f64::from_bits(bits),
        }),
        _ => StructValue::UInt(bits),
    }
}

fn read_uint(raw: &[u8], little: bool) -> u64 {
    let fold = |acc: u64, &byte: &u8| (acc << 8) | u64::from(byte);
    if little {
        raw.iter().rev().fold(0, fold)
    } else {
        raw.iter().fold(0, fold)
    }
}

fn sign_extend(bits: u64, width: usize) -> i64 {
    let shift = 64 - 8 * width as u32;
    ((bits << shift) as i64) >> shift
}

/// Widen an IEEE 754 binary16 value.
fn f16_to_f64(half: u16) -> f64 {
    let sign = u64::from(half >> 15) << 63;
    let exponent = u64::from((half >> 10) & 0x1f);
    let mantissa = u64::from(half & 0x3ff);
    let bits = match (exponent, mantissa) {
        (0, 0) => sign,
        (0, _) => {
            // subnormal: mantissa * 2^-24, renormalised around its top bit
            let top = 63 - u64::from(mantissa.leading_zeros());
            sign | ((top + 1023 - 24) << 52) | ((mantissa ^ (1 << top)) << (52 - top))
        }
        (0x1f, 0) => sign | 0x7ff0_0000_0000_0000,
        (0x1f, _) => sign | 0x7ff8_0000_0000_0000 | (mantissa << 42),
        _ => sign | ((exponent + 1023 - 15) << 52) | (mantissa << 42),
    };
    f64::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use rstest::rstest;

    use super::*;

    fn unpack(format: &str, data: &[u8]) -> Vec<StructValue> {
        StructFormat::parse(format)
            .unwrap()
            .unpack(&Bytes::copy_from_slice(data))
            .unwrap()
    }

    #[rstest]
    #[case("!BH", 3)]
    #[case("<q", 8)]
    #[case("=hh", 4)]
    #[case("!3s", 3)]
    #[case("! 2h x ?", 6)]
    #[case("!0i", 0)]
    #[case("<5p", 5)]
    #[case("@ci", 8)]
    #[case("@bh", 4)]
    #[case("", 0)]
    fn sizes(#[case] format: &str, #[case] size: usize) {
        assert_eq!(StructFormat::parse(format).unwrap().size(), size);
    }

    #[test]
    fn big_and_little_endian() {
        assert_eq!(
            unpack("!hI", &[0xff, 0xfe, 0, 0, 1, 0]),
            [StructValue::Int(-2), StructValue::UInt(256)]
        );
        assert_eq!(
            unpack("<hI", &[0xfe, 0xff, 0, 1, 0, 0]),
            [StructValue::Int(-2), StructValue::UInt(256)]
        );
    }

    #[test]
    fn repeat_counts_and_strings() {
        assert_eq!(
            unpack("!2B3s2c?x", b"\x01\x02abcdz\x01\x00"),
            [
                StructValue::UInt(1),
                StructValue::UInt(2),
                StructValue::Bytes(Bytes::from_static(b"abc")),
                StructValue::Bytes(Bytes::from_static(b"d")),
                StructValue::Bytes(Bytes::from_static(b"z")),
                StructValue::Bool(true),
            ]
        );
    }

    #[test]
    fn pascal_strings_clamp_their_length() {
        assert_eq!(
            unpack("4p", b"\x02abc"),
            [StructValue::Bytes(Bytes::from_static(b"ab"))]
        );
        assert_eq!(
            unpack("4p", b"\xffabc"),
            [StructValue::Bytes(Bytes::from_static(b"abc"))]
        );
    }

    #[test]
    fn floats() {
        assert_eq!(
            unpack("<edf", &[0x00, 0x3c, 0, 0, 0, 0, 0, 0, 0xf8, 0x3f, 0, 0, 0x20, 0x40]),
            [
                StructValue::Float(1.0),
                StructValue::Float(1.5),
                StructValue::Float(2.5),
            ]
        );
        assert_eq!(f16_to_f64(0x0001), 5.960_464_477_539_063e-8);
        assert_eq!(f16_to_f64(0xc000), -2.0);
        assert!(f16_to_f64(0x7c00).is_infinite());
        assert!(f16_to_f64(0x7e00).is_nan());
    }

    #[test]
    fn native_alignment_pads_before_wide_items() {
        let format = StructFormat::parse("@bi").unwrap();
        assert_eq!(format.size(), 2 * size_of::<c_int>());
        let format = StructFormat::parse("=bi").unwrap();
        assert_eq!(format.size(), 5);
    }

    #[rstest]
    #[case("_bad_struct_format", FormatError::UnknownCode { ch: '_', pos: 0 })]
    #[case("!Hz", FormatError::UnknownCode { ch: 'z', pos: 2 })]
    #[case("!12", FormatError::MissingCode)]
    #[case("<n", FormatError::NativeOnly { ch: 'n' })]
    #[case("!P", FormatError::NativeOnly { ch: 'P' })]
    #[case("99999999999999999999999B", FormatError::CountOverflow)]
    fn malformed(#[case] format: &str, #[case] expected: FormatError) {
        assert_eq!(StructFormat::parse(format), Err(expected));
    }

    #[test]
    fn unpack_checks_length() {
        let format = StructFormat::parse("!I").unwrap();
        assert_eq!(
            format.unpack(&Bytes::from(vec![0u8; 3])),
            Err(FormatError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
