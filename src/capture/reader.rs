//! Sequential capture file reader.
//!
//! ```rust,no_run
//! use pitboard::capture::CaptureReader;
//!
//! fn count_frames() -> pitboard::Result<usize> {
//!     let mut reader = CaptureReader::open("session.pbcap")?;
//!     let mut frames = 0;
//!     while let Some(packet) = reader.read_next_frame()? {
//!         println!("{} at {}", packet.kind, packet.timestamp);
//!         frames += 1;
//!     }
//!     Ok(frames)
//! }
//! ```
//!
//! The whole file is loaded at open time, so reads never touch the disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::format::{CaptureHeader, FILE_HEADER_SIZE, FRAME_HEADER_SIZE, FrameHeader};
use crate::types::FramePacket;
use crate::{Result, TelemetryError};

pub struct CaptureReader {
    data: Vec<u8>,
    path: PathBuf,
    header: CaptureHeader,
    position: usize,
    frames_read: usize,
}

impl CaptureReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        let reader = Self::from_bytes_with_path(data, path.to_path_buf())?;
        info!(path = %path.display(), bytes = reader.data.len(), tick_rate = reader.header.tick_rate, "opened capture");
        Ok(reader)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_path(data, PathBuf::from("<memory>"))
    }

    fn from_bytes_with_path(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        let header = CaptureHeader::parse(&data)?;
        Ok(Self { data, path, header, position: FILE_HEADER_SIZE, frames_read: 0 })
    }

    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    pub fn tick_rate(&self) -> f64 {
        self.header.effective_tick_rate()
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Back to the first frame.
    pub fn rewind(&mut self) {
        self.position = FILE_HEADER_SIZE;
        self.frames_read = 0;
    }

    /// Next frame, `None` at the end of the file. A frame cut short by the
    /// end of the file is a parse error.
    pub fn read_next_frame(&mut self) -> Result<Option<FramePacket>> {
        if self.is_at_end() {
            return Ok(None);
        }

        let frame = FrameHeader::parse(&self.data, self.position)?;
        let start = self.position + FRAME_HEADER_SIZE;
        let end = start + frame.length as usize;
        let Some(payload) = self.data.get(start..end) else {
            return Err(TelemetryError::parse(
                "capture frame",
                format!(
                    "frame {} ({}) extends beyond the end of the file ({end} > {})",
                    self.frames_read,
                    frame.kind,
                    self.data.len()
                ),
            ));
        };

        let packet = FramePacket::new(frame.kind, frame.timestamp, payload.to_vec());
        self.position = end;
        self.frames_read += 1;
        if self.is_at_end() {
            debug!(frames = self.frames_read, "reached end of capture");
        }
        Ok(Some(packet))
    }

    /// Read every remaining frame.
    pub fn read_all(&mut self) -> Result<Vec<FramePacket>> {
        let mut packets = Vec::new();
        while let Some(packet) = self.read_next_frame()? {
            packets.push(packet);
        }
        Ok(packets)
    }
}

impl std::fmt::Debug for CaptureReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureReader")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
