// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Wire primitives: little-endian integers and length-prefixed byte strings.
//!
//! Lengths are checked against a cap before anything is allocated, so a
//! corrupt length field can't make the reader reserve gigabytes.

use std::io::{Read, Write};

use upkg_store_core::BoundedText;

use super::CodecError;

/// Cap for any metadata string, independent of its own bound.
pub const MAX_FIELD_SIZE: u64 = 64 * 1024;
/// Cap for a single script body.
pub const MAX_SCRIPT_SIZE: u64 = 64 * 1024 * 1024;
/// Cap for the number of entries in a file list.
pub const MAX_FILE_LIST_LEN: u64 = 1024 * 1024;
/// Cap for a single file-list path.
pub const MAX_PATH_SIZE: u64 = 4096;

pub trait Encode {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), CodecError>;
}

pub trait Decode: Sized {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, CodecError>;
}

pub(crate) trait IoErrorContext<T> {
    fn io_context(self, context: &'static str) -> Result<T, CodecError>;
}

impl<T> IoErrorContext<T> for std::io::Result<T> {
    fn io_context(self, context: &'static str) -> Result<T, CodecError> {
        self.map_err(|source| CodecError::Io { context, source })
    }
}

impl Encode for u64 {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        writer
            .write_all(&self.to_le_bytes())
            .io_context("Failed to write u64")
    }
}

impl Decode for u64 {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let mut buf = [0; 8];
        reader
            .read_exact(&mut buf)
            .io_context("Failed to read u64")?;
        Ok(u64::from_le_bytes(buf))
    }
}

impl Encode for i64 {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        writer
            .write_all(&self.to_le_bytes())
            .io_context("Failed to write i64")
    }
}

impl Decode for i64 {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let mut buf = [0; 8];
        reader
            .read_exact(&mut buf)
            .io_context("Failed to read i64")?;
        Ok(i64::from_le_bytes(buf))
    }
}

impl Encode for bool {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        u64::from(*self).encode(writer)
    }
}

impl Decode for bool {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        match u64::decode(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::BadTag(other)),
        }
    }
}

/// Presence tag then, when present, the value.
impl<T: Encode> Encode for Option<T> {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        match self {
            None => false.encode(writer),
            Some(value) => {
                true.encode(writer)?;
                value.encode(writer)
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        if bool::decode(reader)? {
            Ok(Some(T::decode(reader)?))
        } else {
            Ok(None)
        }
    }
}

impl<const MAX: usize> Encode for BoundedText<MAX> {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_bytes(writer, self.as_bytes(), bound(MAX), "metadata field")
    }
}

impl<const MAX: usize> Decode for BoundedText<MAX> {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let text = read_string(reader, bound(MAX), "metadata field")?;
        // The length was checked against MAX already.
        BoundedText::new(text).map_err(|e| CodecError::TooLong {
            what: "metadata field",
            length: e.length as u64,
            max: e.max as u64,
        })
    }
}

fn bound(max: usize) -> u64 {
    (max as u64).min(MAX_FIELD_SIZE)
}

/// Write `bytes` as a `u64` length followed by the raw bytes.
pub fn write_bytes<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    max: u64,
    what: &'static str,
) -> Result<(), CodecError> {
    let length = bytes.len() as u64;
    if length > max {
        return Err(CodecError::TooLong { what, length, max });
    }
    length.encode(writer)?;
    writer
        .write_all(bytes)
        .io_context("Failed to write bytes data")
}

/// Read a length-prefixed byte string of at most `max` bytes.
pub fn read_bytes<R: Read>(
    reader: &mut R,
    max: u64,
    what: &'static str,
) -> Result<Vec<u8>, CodecError> {
    let length = u64::decode(reader)?;
    if length > max {
        return Err(CodecError::TooLong { what, length, max });
    }

    let mut buf = Vec::new();
    buf.try_reserve_exact(length as usize)?;
    let read = reader
        .by_ref()
        .take(length)
        .read_to_end(&mut buf)
        .io_context("Failed to read bytes data")?;
    if read as u64 != length {
        return Err(CodecError::Io {
            context: "Failed to read bytes data",
            source: std::io::ErrorKind::UnexpectedEof.into(),
        });
    }
    Ok(buf)
}

pub fn read_string<R: Read>(
    reader: &mut R,
    max: u64,
    what: &'static str,
) -> Result<String, CodecError> {
    let bytes = read_bytes(reader, max, what)?;
    String::from_utf8(bytes).map_err(|source| CodecError::InvalidUtf8 { what, source })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;
    use upkg_store_core::Version;

    use super::*;

    #[test]
    fn test_u64_is_little_endian() {
        let mut buf = Vec::new();
        0x0102_0304_u64.encode(&mut buf).unwrap();
        assert_eq!(buf, [4, 3, 2, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_bytes_have_no_padding() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, b"echo1", 16, "script").unwrap();
        assert_eq!(buf.len(), 8 + 5);
        assert_eq!(&buf[8..], b"echo1");
    }

    #[rstest]
    #[case::zero(0, Some(false))]
    #[case::one(1, Some(true))]
    #[case::two(2, None)]
    fn test_bool_tags(#[case] tag: u64, #[case] expected: Option<bool>) {
        let mut buf = Vec::new();
        tag.encode(&mut buf).unwrap();
        let decoded = bool::decode(&mut Cursor::new(buf));
        match expected {
            Some(value) => assert_eq!(decoded.unwrap(), value),
            None => assert!(matches!(decoded, Err(CodecError::BadTag(2)))),
        }
    }

    #[test]
    fn test_length_cap_checked_before_read() {
        let mut buf = Vec::new();
        u64::MAX.encode(&mut buf).unwrap();
        let err = read_bytes(&mut Cursor::new(buf), MAX_PATH_SIZE, "path").unwrap_err();
        assert!(matches!(err, CodecError::TooLong { length: u64::MAX, .. }));
    }

    #[test]
    fn test_short_payload_is_truncation() {
        let mut buf = Vec::new();
        10u64.encode(&mut buf).unwrap();
        buf.extend_from_slice(b"abc");
        let err = read_bytes(&mut Cursor::new(buf), 64, "field").unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_bounded_text_rejects_oversized_field() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, &[b'x'; 40], 64, "field").unwrap();
        let err = Version::decode(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, CodecError::TooLong { length: 40, max: 31, .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, &[0xff, 0xfe], 64, "field").unwrap();
        let err = read_string(&mut Cursor::new(buf), 64, "field").unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_option_present_empty_differs_from_absent() {
        let mut absent = Vec::new();
        None::<Version>.encode(&mut absent).unwrap();
        let mut empty = Vec::new();
        Some(Version::new("").unwrap()).encode(&mut empty).unwrap();
        assert_ne!(absent, empty);

        let decoded = Option::<Version>::decode(&mut Cursor::new(empty)).unwrap();
        assert_eq!(decoded.as_deref(), Some(""));
    }
}
