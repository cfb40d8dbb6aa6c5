//! Fixed-size record buffers and the field reader/encoder over them.
//!
//! A [`RecordBuffer`] holds one game structure as raw bytes. New data is
//! staged into a second buffer of the same size and swapped in with
//! [`RecordBuffer::commit`] once complete, so a failed read never leaves a
//! half-filled record behind.
//!
//! [`FieldReader`] decodes little-endian values at layout offsets.
//! [`RecordEncoder`] writes them, which is how synthetic payloads are built.

use std::io::{self, Read, Write};

use super::{FieldKind, Vector3, layout_span};
use crate::{Result, TelemetryError};

/// Double-buffered raw storage for one record.
#[derive(Debug, Clone)]
pub struct RecordBuffer {
    record: &'static str,
    data: Box<[u8]>,
    scratch: Box<[u8]>,
}

impl RecordBuffer {
    /// Create a zeroed buffer of `capacity` bytes for the given layout.
    ///
    /// Fails with [`TelemetryError::Layout`] when the declared fields span
    /// more than `capacity` bytes.
    pub fn new(
        record: &'static str,
        fields: &[(&str, FieldKind)],
        capacity: usize,
    ) -> Result<Self> {
        let span = layout_span(fields);
        if span > capacity {
            return Err(TelemetryError::Layout { record, span, capacity });
        }

        Ok(Self {
            record,
            data: vec![0u8; capacity].into_boxed_slice(),
            scratch: vec![0u8; capacity].into_boxed_slice(),
        })
    }

    /// Name of the record, used in errors and logs.
    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reader over the committed contents.
    pub fn reader(&self) -> FieldReader<'_> {
        FieldReader::new(&self.data)
    }

    /// Reader over the staged (not yet committed) contents.
    pub fn staged_reader(&self) -> FieldReader<'_> {
        FieldReader::new(&self.scratch)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Stage exactly `len()` bytes from a stream.
    ///
    /// A stream that ends early yields [`TelemetryError::IncompleteRead`];
    /// the committed contents are untouched either way.
    pub fn stage_from_reader(&mut self, input: &mut dyn Read) -> Result<()> {
        let expected = self.scratch.len();
        let mut read = 0;

        while read < expected {
            match input.read(&mut self.scratch[read..]) {
                Ok(0) => {
                    return Err(TelemetryError::incomplete_read(self.record, expected, read));
                }
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Stage a verbatim copy of producer memory.
    pub fn stage_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.scratch.len();
        let src = bytes
            .get(..expected)
            .ok_or(TelemetryError::incomplete_read(self.record, expected, bytes.len()))?;
        self.scratch.copy_from_slice(src);
        Ok(())
    }

    /// Swap the staged contents in.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.data, &mut self.scratch);
    }

    /// Write the committed contents verbatim.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(&self.data)
    }
}

/// Little-endian field reader over a record's bytes.
///
/// Offsets come from validated layouts, so reads do not return errors. An
/// offset past the end is a layout bug and trips a debug assertion; release
/// builds read zeroes instead.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    data: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// A reader over a sub-range, e.g. one wheel inside the telemetry record.
    pub fn at(&self, offset: usize, len: usize) -> FieldReader<'a> {
        debug_assert!(offset + len <= self.data.len(), "sub-record overruns its parent");
        FieldReader::new(self.data.get(offset..offset + len).unwrap_or(&[]))
    }

    #[inline]
    fn array<const N: usize>(&self, offset: usize) -> [u8; N] {
        debug_assert!(
            offset + N <= self.data.len(),
            "field at {offset} overruns {} byte record",
            self.data.len()
        );
        let mut out = [0u8; N];
        if let Some(src) = self.data.get(offset..offset + N) {
            out.copy_from_slice(src);
        }
        out
    }

    pub fn read_u8(&self, offset: usize) -> u8 {
        self.array::<1>(offset)[0]
    }

    pub fn read_i8(&self, offset: usize) -> i8 {
        i8::from_le_bytes(self.array(offset))
    }

    /// One-byte boolean, nonzero is true.
    pub fn read_bool(&self, offset: usize) -> bool {
        self.read_u8(offset) != 0
    }

    pub fn read_i16(&self, offset: usize) -> i16 {
        i16::from_le_bytes(self.array(offset))
    }

    pub fn read_i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.array(offset))
    }

    pub fn read_i64(&self, offset: usize) -> i64 {
        i64::from_le_bytes(self.array(offset))
    }

    pub fn read_f32(&self, offset: usize) -> f32 {
        f32::from_le_bytes(self.array(offset))
    }

    pub fn read_f64(&self, offset: usize) -> f64 {
        f64::from_le_bytes(self.array(offset))
    }

    pub fn read_vec3(&self, offset: usize) -> Vector3 {
        Vector3::new(self.read_f32(offset), self.read_f32(offset + 4), self.read_f32(offset + 8))
    }

    /// Fixed-capacity string, cut at the first NUL or after `max_len` bytes.
    /// Bytes are Latin-1, so every byte maps to exactly one char.
    pub fn read_string(&self, offset: usize, max_len: usize) -> String {
        self.read_bytes(offset, max_len)
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> &'a [u8] {
        debug_assert!(offset + len <= self.data.len(), "byte field overruns record");
        self.data.get(offset..offset + len).unwrap_or(&[])
    }
}

/// Writes fields at layout offsets into a zeroed buffer.
#[derive(Debug, Clone)]
pub struct RecordEncoder {
    data: Vec<u8>,
}

impl RecordEncoder {
    pub fn new(size: usize) -> Self {
        Self { data: vec![0u8; size] }
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        debug_assert!(offset + bytes.len() <= self.data.len(), "encoded field overruns record");
        if let Some(dst) = self.data.get_mut(offset..offset + bytes.len()) {
            dst.copy_from_slice(bytes);
        }
        self
    }

    pub fn put_u8(&mut self, offset: usize, value: u8) -> &mut Self {
        self.put(offset, &[value])
    }

    pub fn put_i8(&mut self, offset: usize, value: i8) -> &mut Self {
        self.put(offset, &value.to_le_bytes())
    }

    pub fn put_bool(&mut self, offset: usize, value: bool) -> &mut Self {
        self.put_u8(offset, u8::from(value))
    }

    pub fn put_i16(&mut self, offset: usize, value: i16) -> &mut Self {
        self.put(offset, &value.to_le_bytes())
    }

    pub fn put_i32(&mut self, offset: usize, value: i32) -> &mut Self {
        self.put(offset, &value.to_le_bytes())
    }

    pub fn put_i64(&mut self, offset: usize, value: i64) -> &mut Self {
        self.put(offset, &value.to_le_bytes())
    }

    pub fn put_f32(&mut self, offset: usize, value: f32) -> &mut Self {
        self.put(offset, &value.to_le_bytes())
    }

    pub fn put_f64(&mut self, offset: usize, value: f64) -> &mut Self {
        self.put(offset, &value.to_le_bytes())
    }

    pub fn put_vec3(&mut self, offset: usize, value: Vector3) -> &mut Self {
        self.put_f32(offset, value.x).put_f32(offset + 4, value.y).put_f32(offset + 8, value.z)
    }

    /// Latin-1 encode `value` into a field of `max_len` bytes, always leaving
    /// room for the terminating NUL. Chars outside Latin-1 become `?`.
    pub fn put_string(&mut self, offset: usize, max_len: usize, value: &str) -> &mut Self {
        let bytes: Vec<u8> = value
            .chars()
            .take(max_len.saturating_sub(1))
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect();
        self.put(offset, &vec![0u8; max_len]).put(offset, &bytes)
    }

    pub fn put_bytes(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        self.put(offset, bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    crate::record_layout! {
        mod probe {
            COUNT: Int32,
            STAMP: Int64,
            SPEED: Float32,
            FLAG: Bool,
            NAME: Str(24),
            POS: Vec3,
            PAD: Bytes(3),
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoded_fields_decode_to_the_same_values(
                count in any::<i32>(),
                stamp in any::<i64>(),
                speed in -1.0e6f32..1.0e6f32,
                flag in any::<bool>(),
                name in "[ -~]{0,23}",
                x in -1.0e4f32..1.0e4f32,
                y in -1.0e4f32..1.0e4f32,
                z in -1.0e4f32..1.0e4f32,
            ) {
                let mut enc = RecordEncoder::new(probe::SIZE);
                enc.put_i32(probe::COUNT, count)
                    .put_i64(probe::STAMP, stamp)
                    .put_f32(probe::SPEED, speed)
                    .put_bool(probe::FLAG, flag)
                    .put_string(probe::NAME, 24, &name)
                    .put_vec3(probe::POS, Vector3::new(x, y, z));

                let bytes = enc.into_bytes();
                let reader = FieldReader::new(&bytes);
                prop_assert_eq!(reader.read_i32(probe::COUNT), count);
                prop_assert_eq!(reader.read_i64(probe::STAMP), stamp);
                prop_assert_eq!(reader.read_f32(probe::SPEED), speed);
                prop_assert_eq!(reader.read_bool(probe::FLAG), flag);
                prop_assert_eq!(reader.read_string(probe::NAME, 24), name);
                prop_assert_eq!(reader.read_vec3(probe::POS), Vector3::new(x, y, z));
            }

            #[test]
            fn any_nonzero_byte_reads_as_true(byte in 1u8..=255u8) {
                let data = [byte];
                prop_assert!(FieldReader::new(&data).read_bool(0));
            }

            #[test]
            fn short_streams_never_commit(len in 0usize..probe::SIZE) {
                let mut buffer = RecordBuffer::new("probe", probe::FIELDS, probe::SIZE).unwrap();
                let mut stream = Cursor::new(vec![0xAAu8; len]);
                let err = buffer.stage_from_reader(&mut stream).unwrap_err();
                let is_short = matches!(err, TelemetryError::IncompleteRead { read, .. } if read == len);
                prop_assert!(is_short);
                prop_assert!(buffer.as_bytes().iter().all(|&b| b == 0));
            }
        }
    }

    #[test]
    fn layout_offsets_are_prefix_sums() {
        assert_eq!(probe::COUNT, 0);
        assert_eq!(probe::STAMP, 4);
        assert_eq!(probe::SPEED, 12);
        assert_eq!(probe::FLAG, 16);
        assert_eq!(probe::NAME, 17);
        assert_eq!(probe::POS, 41);
        assert_eq!(probe::PAD, 53);
        assert_eq!(probe::SIZE, 56);
        assert_eq!(probe::FIELDS.len(), 7);
    }

    #[test]
    fn oversized_layout_is_rejected_at_construction() {
        let err = RecordBuffer::new("probe", probe::FIELDS, probe::SIZE - 1).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::Layout { record: "probe", span: 56, capacity: 55 }
        ));
    }

    #[test]
    fn staged_data_is_visible_only_after_commit() {
        let mut buffer = RecordBuffer::new("probe", probe::FIELDS, probe::SIZE).unwrap();
        let mut enc = RecordEncoder::new(probe::SIZE);
        enc.put_i32(probe::COUNT, 42);

        buffer.stage_from_reader(&mut Cursor::new(enc.into_bytes())).unwrap();
        assert_eq!(buffer.reader().read_i32(probe::COUNT), 0);
        assert_eq!(buffer.staged_reader().read_i32(probe::COUNT), 42);

        buffer.commit();
        assert_eq!(buffer.reader().read_i32(probe::COUNT), 42);
    }

    #[test]
    fn strings_stop_at_nul_and_capacity() {
        let mut data = *b"Nordschleife\0junk";
        assert_eq!(FieldReader::new(&data).read_string(0, 17), "Nordschleife");
        assert_eq!(FieldReader::new(&data).read_string(0, 5), "Nords");

        data[3] = 0xE9;
        assert_eq!(FieldReader::new(&data).read_string(0, 5), "Nor\u{e9}s");
    }

    #[test]
    fn encoder_truncates_long_strings_and_keeps_nul() {
        let mut enc = RecordEncoder::new(8);
        enc.put_string(0, 8, "Hockenheimring");
        let bytes = enc.into_bytes();
        assert_eq!(&bytes[..7], b"Hockenh");
        assert_eq!(bytes[7], 0);
    }

    #[test]
    fn live_copy_requires_a_full_record() {
        let mut buffer = RecordBuffer::new("probe", probe::FIELDS, probe::SIZE).unwrap();
        let err = buffer.stage_from_slice(&[1u8; 10]).unwrap_err();
        assert!(matches!(err, TelemetryError::IncompleteRead { expected: 56, read: 10, .. }));

        buffer.stage_from_slice(&[1u8; 64]).unwrap();
        buffer.commit();
        assert!(buffer.as_bytes().iter().all(|&b| b == 1));
    }
}
