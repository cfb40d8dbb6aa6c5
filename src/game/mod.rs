//! Per-game record formats.
//!
//! Each record category has one trait describing how its raw bytes map to a
//! decoded snapshot. A [`GameFormats`] bundle picks the implementations for
//! the configured [`GameVersion`] once at startup; records keep `'static`
//! references to the (stateless) formats.

use serde::{Deserialize, Serialize};

use crate::commentary::CommentarySnapshot;
use crate::graphics::GraphicsSnapshot;
use crate::scoring::{ScoringSnapshot, VehicleSnapshot};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{FieldKind, FieldReader};
use crate::{Result, TelemetryError};

pub mod rfactor1;

/// Field list of a layout, as produced by [`record_layout!`](crate::record_layout).
pub type Fields = &'static [(&'static str, FieldKind)];

/// Game the plugin runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum GameVersion {
    #[default]
    #[serde(alias = "rf1")]
    RFactor1,
    #[serde(alias = "rf2")]
    RFactor2,
}

impl std::fmt::Display for GameVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameVersion::RFactor1 => f.write_str("rfactor1"),
            GameVersion::RFactor2 => f.write_str("rfactor2"),
        }
    }
}

/// Telemetry structure of the player's vehicle.
pub trait TelemetryFormat: Send + Sync {
    fn fields(&self) -> Fields;

    fn size(&self) -> usize;

    fn decode(&self, reader: FieldReader<'_>) -> TelemetrySnapshot;

    fn encode(&self, snapshot: &TelemetrySnapshot) -> Vec<u8>;

    /// Bundled payload decoded in editor mode.
    fn default_payload(&self) -> &'static [u8];
}

/// Scoring header followed by one structure per vehicle.
pub trait ScoringFormat: Send + Sync {
    fn header_fields(&self) -> Fields;

    fn header_size(&self) -> usize;

    fn vehicle_fields(&self) -> Fields;

    fn vehicle_size(&self) -> usize;

    /// Number of vehicle structures following this header.
    fn vehicle_count(&self, header: FieldReader<'_>) -> usize;

    fn decode_header(&self, header: FieldReader<'_>) -> ScoringSnapshot;

    fn decode_vehicle(&self, vehicle: FieldReader<'_>) -> VehicleSnapshot;

    /// Header plus vehicles, in stream order.
    fn encode(&self, header: &ScoringSnapshot, vehicles: &[VehicleSnapshot]) -> Vec<u8>;

    fn default_payload(&self) -> &'static [u8];
}

pub trait GraphicsFormat: Send + Sync {
    fn fields(&self) -> Fields;

    fn size(&self) -> usize;

    fn decode(&self, reader: FieldReader<'_>) -> GraphicsSnapshot;

    fn encode(&self, snapshot: &GraphicsSnapshot) -> Vec<u8>;

    fn default_payload(&self) -> &'static [u8];
}

pub trait CommentaryFormat: Send + Sync {
    fn fields(&self) -> Fields;

    fn size(&self) -> usize;

    fn decode(&self, reader: FieldReader<'_>) -> CommentarySnapshot;

    fn encode(&self, snapshot: &CommentarySnapshot) -> Vec<u8>;

    fn default_payload(&self) -> &'static [u8];
}

/// The formats of one game version.
#[derive(Clone, Copy)]
pub struct GameFormats {
    pub game: GameVersion,
    pub telemetry: &'static dyn TelemetryFormat,
    pub scoring: &'static dyn ScoringFormat,
    pub graphics: &'static dyn GraphicsFormat,
    pub commentary: &'static dyn CommentaryFormat,
}

impl GameFormats {
    pub fn for_game(game: GameVersion) -> Result<Self> {
        match game {
            GameVersion::RFactor1 => Ok(rfactor1::formats()),
            other => Err(TelemetryError::UnsupportedGame { game: other.to_string() }),
        }
    }
}

impl std::fmt::Debug for GameFormats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameFormats").field("game", &self.game).finish_non_exhaustive()
    }
}
