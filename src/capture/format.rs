//! Capture file layout.
//!
//! A capture holds the raw record buffers of a session, tick by tick, so the
//! session can be fed through the records again later.
//!
//! 1. **File header** (20 bytes): magic, format version, tick rate, game
//! 2. **Frames**: `kind: u8`, `timestamp: i64`, `length: u32`, then `length`
//!    payload bytes
//!
//! All integers are little-endian.

use tracing::trace;

use crate::game::GameVersion;
use crate::types::RecordKind;
use crate::{Result, TelemetryError};

pub const MAGIC: [u8; 8] = *b"PBCAP\0\0\0";

pub const FORMAT_VERSION: i32 = 1;

pub const FILE_HEADER_SIZE: usize = 20;

pub const FRAME_HEADER_SIZE: usize = 13;

/// Tick rate assumed when the header stores a non-positive one.
pub const DEFAULT_TICK_RATE: i32 = 90;

/// Leading metadata of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHeader {
    /// Recording frequency in Hz
    pub tick_rate: i32,
    pub game: GameVersion,
}

impl CaptureHeader {
    pub fn new(tick_rate: i32, game: GameVersion) -> Self {
        Self { tick_rate, game }
    }

    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut out = [0u8; FILE_HEADER_SIZE];
        out[0..8].copy_from_slice(&MAGIC);
        out[8..12].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        out[12..16].copy_from_slice(&self.tick_rate.to_le_bytes());
        out[16..20].copy_from_slice(&game_tag(self.game).to_le_bytes());
        out
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(TelemetryError::parse(
                "capture header",
                format!("need {FILE_HEADER_SIZE} bytes, file has {}", data.len()),
            ));
        }
        if data[0..8] != MAGIC {
            return Err(TelemetryError::parse("capture header", "not a capture file (bad magic)"));
        }

        let version = parse_i32_le(data, 8)?;
        if version != FORMAT_VERSION {
            return Err(TelemetryError::Version {
                supported: FORMAT_VERSION.to_string(),
                found: version.to_string(),
            });
        }

        let tick_rate = parse_i32_le(data, 12)?;
        let game = game_from_tag(parse_i32_le(data, 16)?)?;
        trace!(tick_rate, %game, "parsed capture header");

        Ok(Self { tick_rate, game })
    }

    /// Tick rate in Hz, with a fallback for unset values.
    pub fn effective_tick_rate(&self) -> f64 {
        if self.tick_rate > 0 { f64::from(self.tick_rate) } else { f64::from(DEFAULT_TICK_RATE) }
    }
}

/// Frame header preceding each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: RecordKind,
    pub timestamp: i64,
    pub length: u32,
}

impl FrameHeader {
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut out = [0u8; FRAME_HEADER_SIZE];
        out[0] = self.kind.tag();
        out[1..9].copy_from_slice(&self.timestamp.to_le_bytes());
        out[9..13].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// Parse the header of the frame starting at `offset`.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let Some(bytes) = data.get(offset..offset + FRAME_HEADER_SIZE) else {
            return Err(TelemetryError::parse(
                "capture frame",
                format!("truncated frame header at offset {offset}"),
            ));
        };

        let kind = RecordKind::from_tag(bytes[0]).ok_or_else(|| {
            TelemetryError::parse("capture frame", format!("unknown record tag {} at offset {offset}", bytes[0]))
        })?;
        let timestamp = i64::from_le_bytes(fixed(bytes, 1)?);
        let length = u32::from_le_bytes(fixed(bytes, 9)?);

        Ok(Self { kind, timestamp, length })
    }
}

pub const fn game_tag(game: GameVersion) -> i32 {
    match game {
        GameVersion::RFactor1 => 1,
        GameVersion::RFactor2 => 2,
    }
}

pub fn game_from_tag(tag: i32) -> Result<GameVersion> {
    match tag {
        1 => Ok(GameVersion::RFactor1),
        2 => Ok(GameVersion::RFactor2),
        other => Err(TelemetryError::parse("capture header", format!("unknown game tag {other}"))),
    }
}

fn parse_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(fixed(data, offset)?))
}

fn fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| TelemetryError::parse("capture", format!("cannot read {N} bytes at offset {offset}")))
}
