//! Capture file writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, trace};

use super::format::{CaptureHeader, FrameHeader};
use crate::game::GameVersion;
use crate::record::VersionedRecord;
use crate::types::RecordKind;
use crate::{Result, TelemetryError};

/// Appends frames to a capture. The file header is written on creation.
pub struct CaptureWriter<W: Write> {
    out: W,
    frames: usize,
    scratch: Vec<u8>,
}

impl CaptureWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P, tick_rate: i32, game: GameVersion) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), tick_rate, "capture created");
        Self::new(BufWriter::new(file), tick_rate, game)
    }
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(mut out: W, tick_rate: i32, game: GameVersion) -> Result<Self> {
        out.write_all(&CaptureHeader::new(tick_rate, game).to_bytes())?;
        Ok(Self { out, frames: 0, scratch: Vec::new() })
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    pub fn write_frame(&mut self, kind: RecordKind, timestamp: i64, payload: &[u8]) -> Result<()> {
        let length = u32::try_from(payload.len()).map_err(|_| {
            TelemetryError::parse("capture frame", format!("{kind} payload of {} bytes is too large", payload.len()))
        })?;

        self.out.write_all(&FrameHeader { kind, timestamp, length }.to_bytes())?;
        self.out.write_all(payload)?;
        self.frames += 1;
        trace!(record = %kind, timestamp, length, "frame captured");
        Ok(())
    }

    /// Capture the committed buffers of a record, stamped with its last
    /// update time.
    pub fn write_record<R: VersionedRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        let mut payload = std::mem::take(&mut self.scratch);
        payload.clear();
        record.write_to(&mut payload)?;

        let result = self.write_frame(record.kind(), record.update_state().timestamp(), &payload);
        self.scratch = payload;
        result
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        debug!(frames = self.frames, "capture finished");
        Ok(self.out)
    }
}

impl<W: Write> std::fmt::Debug for CaptureWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureWriter").field("frames", &self.frames).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::format::{FILE_HEADER_SIZE, FRAME_HEADER_SIZE};

    #[test]
    fn frames_follow_the_file_header() {
        let mut writer = CaptureWriter::new(Vec::new(), 90, GameVersion::RFactor1).unwrap();
        writer.write_frame(RecordKind::Graphics, -1, &[7; 5]).unwrap();
        assert_eq!(writer.frames_written(), 1);

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len(), FILE_HEADER_SIZE + FRAME_HEADER_SIZE + 5);
        assert_eq!(bytes[FILE_HEADER_SIZE], RecordKind::Graphics.tag());
        assert_eq!(&bytes[FILE_HEADER_SIZE + 1..FILE_HEADER_SIZE + 9], &(-1i64).to_le_bytes());
    }

    #[test]
    fn created_files_land_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pbcap");
        CaptureWriter::create(&path, 60, GameVersion::RFactor1).unwrap().finish().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), FILE_HEADER_SIZE as u64);
    }
}
