// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

use std::io::{Read, Write};

use upkg_store_core::{
    MAX_NAME_LEN, PackageName, PackageRecord, ScriptKind, system_time_from_unix, unix_time_parts,
};

use super::CodecError;
use super::wire::{
    Decode, Encode, IoErrorContext, MAX_FILE_LIST_LEN, MAX_PATH_SIZE, MAX_SCRIPT_SIZE, read_bytes,
    read_string, write_bytes,
};

/// First eight bytes of every record file.
pub const MAGIC: &[u8; 8] = b"UPKGREC\0";
/// Version written by [`encode_record`]. Version 1 files lack the
/// nanoseconds of the install time and are still read.
pub const FORMAT_VERSION: u64 = 2;

/// Write `record` in the version 2 layout:
///
/// ```text
/// magic, version
/// name, 10 x (tag [, text]), installed, install seconds, install nanoseconds
/// file count, paths...
/// 5 x (length, bytes)          length 0 = no script
/// ```
pub fn encode_record<W: Write>(record: &PackageRecord, writer: &mut W) -> Result<(), CodecError> {
    record.validate_name()?;

    writer.write_all(MAGIC).io_context("Failed to write magic")?;
    FORMAT_VERSION.encode(writer)?;

    write_bytes(
        writer,
        record.name().as_bytes(),
        MAX_NAME_LEN as u64,
        "package name",
    )?;
    record.version.encode(writer)?;
    record.architecture.encode(writer)?;
    record.maintainer.encode(writer)?;
    record.homepage.encode(writer)?;
    record.source.encode(writer)?;
    record.section.encode(writer)?;
    record.priority.encode(writer)?;
    record.depends.encode(writer)?;
    record.comment.encode(writer)?;
    record.description.encode(writer)?;
    record.installed.encode(writer)?;
    let (secs, nanos) = unix_time_parts(record.install_time);
    secs.encode(writer)?;
    u64::from(nanos).encode(writer)?;

    let count = record.file_list.len() as u64;
    if count > MAX_FILE_LIST_LEN {
        return Err(CodecError::TooLong {
            what: "file list",
            length: count,
            max: MAX_FILE_LIST_LEN,
        });
    }
    count.encode(writer)?;
    for path in &record.file_list {
        write_bytes(writer, path.as_bytes(), MAX_PATH_SIZE, "file path")?;
    }

    for kind in ScriptKind::ALL {
        let body = record.script(kind).map_or(&[][..], |s| s.as_bytes());
        write_bytes(writer, body, MAX_SCRIPT_SIZE, "script")?;
    }
    Ok(())
}

pub fn encode_record_to_vec(record: &PackageRecord) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    encode_record(record, &mut buf)?;
    Ok(buf)
}

/// Read one record and require the input to end right after it.
///
/// Everything decoded so far is dropped when an error is returned.
pub fn decode_record<R: Read>(reader: &mut R) -> Result<PackageRecord, CodecError> {
    let mut magic = [0; 8];
    reader
        .read_exact(&mut magic)
        .io_context("Failed to read magic")?;
    if &magic != MAGIC {
        return Err(CodecError::BadMagic);
    }
    let version = u64::decode(reader)?;
    if !(1..=FORMAT_VERSION).contains(&version) {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let name = read_string(reader, MAX_NAME_LEN as u64, "package name")?;
    let mut record = PackageRecord::new(PackageName::new(name)?);
    record.version = Decode::decode(reader)?;
    record.architecture = Decode::decode(reader)?;
    record.maintainer = Decode::decode(reader)?;
    record.homepage = Decode::decode(reader)?;
    record.source = Decode::decode(reader)?;
    record.section = Decode::decode(reader)?;
    record.priority = Decode::decode(reader)?;
    record.depends = Decode::decode(reader)?;
    record.comment = Decode::decode(reader)?;
    record.description = Decode::decode(reader)?;
    record.installed = bool::decode(reader)?;
    let secs = i64::decode(reader)?;
    let nanos = if version >= 2 { u64::decode(reader)? } else { 0 };
    record.install_time = u32::try_from(nanos)
        .ok()
        .and_then(|n| system_time_from_unix(secs, n))
        .ok_or(CodecError::InvalidTime { secs, nanos })?;

    let count = u64::decode(reader)?;
    if count > MAX_FILE_LIST_LEN {
        return Err(CodecError::TooLong {
            what: "file list",
            length: count,
            max: MAX_FILE_LIST_LEN,
        });
    }
    let mut file_list = Vec::new();
    file_list.try_reserve_exact(count as usize)?;
    for _ in 0..count {
        file_list.push(read_string(reader, MAX_PATH_SIZE, "file path")?);
    }
    record.file_list = file_list;

    for kind in ScriptKind::ALL {
        let body = read_bytes(reader, MAX_SCRIPT_SIZE, "script")?;
        record.set_script(kind, body);
    }

    let mut probe = [0; 1];
    if reader
        .read(&mut probe)
        .io_context("Failed to check for trailing data")?
        != 0
    {
        return Err(CodecError::TrailingData);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use upkg_store_core::test::arb_package_record;
    use rstest::rstest;
    use upkg_store_core::{Architecture, Comment, Version};
    use upkg_utils_test::pretty_prop_assert_eq;

    use super::*;

    fn nano() -> PackageRecord {
        let mut record = PackageRecord::new("nano".parse().unwrap());
        record.version = Some(Version::new("7.2-1").unwrap());
        record.architecture = Some(Architecture::new("amd64").unwrap());
        record.comment = Some(Comment::new("").unwrap());
        record.set_script(ScriptKind::PostInst, &b"echo1"[..]);
        record.file_list = vec!["usr/bin/nano".into(), "etc/nanorc".into()];
        record.mark_installed(system_time_from_unix(1_700_000_000, 123_456_789).unwrap());
        record
    }

    /// A record with no files and no scripts, so the install time sits at a
    /// fixed distance from the end: nanoseconds, then the file count and five
    /// empty script lengths.
    fn bare_record_bytes() -> Vec<u8> {
        let mut record = PackageRecord::new("bare".parse().unwrap());
        record.mark_installed(system_time_from_unix(1_700_000_000, 0).unwrap());
        encode_record_to_vec(&record).unwrap()
    }

    const SECS_FROM_END: usize = 64;
    const NANOS_FROM_END: usize = 56;

    #[test]
    fn test_script_presence_survives_roundtrip() {
        let record = nano();
        let bytes = encode_record_to_vec(&record).unwrap();
        let decoded = decode_record(&mut Cursor::new(bytes)).unwrap();

        assert!(decoded.script(ScriptKind::PreInst).is_none());
        assert_eq!(
            decoded.script(ScriptKind::PostInst).unwrap().as_bytes(),
            b"echo1"
        );
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_record_to_vec(&nano()).unwrap();
        assert_eq!(&bytes[..8], MAGIC);
        assert_eq!(&bytes[8..16], &2u64.to_le_bytes());
        assert_eq!(&bytes[16..24], &4u64.to_le_bytes());
        assert_eq!(&bytes[24..28], b"nano");
    }

    #[test]
    fn test_rejects_nameless_record() {
        let err = encode_record_to_vec(&PackageRecord::default()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidName(_)));
    }

    #[test]
    fn test_every_truncation_is_an_error() {
        let bytes = encode_record_to_vec(&nano()).unwrap();
        for len in 0..bytes.len() {
            let result = decode_record(&mut Cursor::new(&bytes[..len]));
            assert!(result.is_err(), "prefix of {len} bytes decoded");
        }
    }

    #[test]
    fn test_trailing_data() {
        let mut bytes = encode_record_to_vec(&nano()).unwrap();
        bytes.push(0);
        let err = decode_record(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, CodecError::TrailingData));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode_record_to_vec(&nano()).unwrap();
        bytes[8] = 3;
        assert!(matches!(
            decode_record(&mut Cursor::new(&bytes)),
            Err(CodecError::UnsupportedVersion(3))
        ));
        bytes[8] = 0;
        assert!(matches!(
            decode_record(&mut Cursor::new(&bytes)),
            Err(CodecError::UnsupportedVersion(0))
        ));
        bytes[0] = b'X';
        assert!(matches!(
            decode_record(&mut Cursor::new(&bytes)),
            Err(CodecError::BadMagic)
        ));
    }

    #[test]
    fn test_name_with_slash_is_rejected_on_decode() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        FORMAT_VERSION.encode(&mut bytes).unwrap();
        write_bytes(&mut bytes, b"../etc", 64, "package name").unwrap();
        let err = decode_record(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidName(_)));
    }

    #[test]
    fn test_sub_second_install_time_survives_roundtrip() {
        let record = nano();
        let bytes = encode_record_to_vec(&record).unwrap();
        let decoded = decode_record(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded.install_time, record.install_time);
    }

    #[test]
    fn test_reads_version_1_without_nanoseconds() {
        let v2 = bare_record_bytes();
        let split = v2.len() - NANOS_FROM_END;
        let mut v1 = v2[..split].to_vec();
        v1.extend_from_slice(&v2[split + 8..]);
        v1[8..16].copy_from_slice(&1u64.to_le_bytes());

        let decoded = decode_record(&mut Cursor::new(v1)).unwrap();
        assert_eq!(decoded, decode_record(&mut Cursor::new(v2)).unwrap());
    }

    #[test]
    fn test_rejects_out_of_range_nanoseconds() {
        let mut bytes = bare_record_bytes();
        let at = bytes.len() - NANOS_FROM_END;
        bytes[at..at + 8].copy_from_slice(&1_000_000_000u64.to_le_bytes());
        let err = decode_record(&mut Cursor::new(bytes)).unwrap_err();
        assert!(
            matches!(err, CodecError::InvalidTime { secs: 1_700_000_000, nanos: 1_000_000_000 }),
            "{err}"
        );
    }

    #[rstest]
    #[case::min(i64::MIN)]
    #[case::max(i64::MAX)]
    #[case::before_epoch(-1)]
    fn test_extreme_install_seconds_never_panic(#[case] secs: i64) {
        let mut bytes = bare_record_bytes();
        let at = bytes.len() - SECS_FROM_END;
        bytes[at..at + 8].copy_from_slice(&secs.to_le_bytes());
        match decode_record(&mut Cursor::new(bytes)) {
            Ok(record) => {
                let again = encode_record_to_vec(&record).unwrap();
                let decoded = decode_record(&mut Cursor::new(again)).unwrap();
                assert_eq!(decoded, record);
            }
            Err(err) => assert!(matches!(err, CodecError::InvalidTime { .. }), "{err}"),
        }
    }

    proptest! {
        #[test]
        fn proptest_record_roundtrip(record in arb_package_record()) {
            let bytes = encode_record_to_vec(&record).unwrap();
            let decoded = decode_record(&mut Cursor::new(bytes)).unwrap();
            pretty_prop_assert_eq!(decoded, record);
        }
    }
}
