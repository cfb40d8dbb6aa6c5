//! Frame packets carried between the replay side and the record side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Which record a raw payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Telemetry,
    Scoring,
    Graphics,
    Commentary,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] =
        [RecordKind::Telemetry, RecordKind::Scoring, RecordKind::Graphics, RecordKind::Commentary];

    /// Tag byte used in capture files.
    pub const fn tag(self) -> u8 {
        match self {
            RecordKind::Telemetry => 1,
            RecordKind::Scoring => 2,
            RecordKind::Graphics => 3,
            RecordKind::Commentary => 4,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(RecordKind::Telemetry),
            2 => Some(RecordKind::Scoring),
            3 => Some(RecordKind::Graphics),
            4 => Some(RecordKind::Commentary),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RecordKind::Telemetry => "telemetry",
            RecordKind::Scoring => "scoring",
            RecordKind::Graphics => "graphics",
            RecordKind::Commentary => "commentary",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One raw record payload with its source timestamp.
///
/// The payload is exactly what the record's `write_to` produced, so it can
/// be fed back through a stream source.
#[derive(Debug, Clone)]
pub struct FramePacket {
    /// Record the payload belongs to
    pub kind: RecordKind,

    /// Source clock in nanoseconds
    pub timestamp: i64,

    /// Raw record bytes (zero-copy via Arc)
    pub data: Arc<[u8]>,
}

impl FramePacket {
    pub fn new(kind: RecordKind, timestamp: i64, data: Vec<u8>) -> Self {
        Self { kind, timestamp, data: data.into() }
    }
}
