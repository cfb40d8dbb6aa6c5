//! rFactor 1 (`InternalsPluginV3`) record structures.
//!
//! Layouts follow the game's headers, which are packed to 4 bytes. Timing
//! fields are single precision and `long` is 32 bits wide.

mod commentary;
mod graphics;
mod scoring;
mod telemetry;

pub use commentary::Rf1Commentary;
pub use graphics::Rf1Graphics;
pub use scoring::Rf1Scoring;
pub use telemetry::Rf1Telemetry;

use super::{GameFormats, GameVersion};

pub static TELEMETRY: Rf1Telemetry = Rf1Telemetry;
pub static SCORING: Rf1Scoring = Rf1Scoring;
pub static GRAPHICS: Rf1Graphics = Rf1Graphics;
pub static COMMENTARY: Rf1Commentary = Rf1Commentary;

pub fn formats() -> GameFormats {
    GameFormats {
        game: GameVersion::RFactor1,
        telemetry: &TELEMETRY,
        scoring: &SCORING,
        graphics: &GRAPHICS,
        commentary: &COMMENTARY,
    }
}
