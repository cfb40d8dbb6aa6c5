//! Telemetry decoding and per-tick data lifecycle for rFactor HUD plugins.
//!
//! The game hands the plugin raw C structures: player telemetry, session
//! scoring with one block per vehicle, graphics and commentary. Pitboard
//! decodes them into versioned records, derives what a HUD needs on top
//! (laptimes, stints, class standings, fuel usage) and notifies listeners
//! once per tick.
//!
//! # Features
//!
//! - **Versioned records**: every update bumps an update id; failed reads
//!   leave the previous tick intact
//! - **Derived vehicle state**: laptime history, fastest laps, pit and stint
//!   tracking, class standings computed lazily once per tick
//! - **Data cache**: fastest laps and fuel usage per track, stored as XML
//! - **Editor mode**: bundled payloads plus preset overrides, no game needed
//! - **Capture and replay**: record raw ticks and feed them back through a
//!   tokio-driven replay
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pitboard::{Driver, GameData, PluginConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PluginConfig::load("pitboard.yaml")?;
//!     pitboard::logging::init(&config.log_filter);
//!
//!     let mut game = GameData::new(&config)?;
//!     game.on_session_started(false);
//!     game.on_realtime_entered();
//!     game.on_cockpit_entered();
//!
//!     let stats = Driver::replay_file("session.pbcap", &mut game, 4.0).await?;
//!     println!("applied {} packets", stats.applied);
//!
//!     if let Some(player) = game.scoring().player() {
//!         println!("{} completed {} laps", player.driver_name(), player.laps_completed());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod types;

// Update protocol and records
pub mod commentary;
pub mod graphics;
pub mod presets;
pub mod record;
pub mod registry;
pub mod scoring;
pub mod source;
pub mod telemetry;

// Per-game layouts
pub mod game;

// Session state
pub mod cache;
pub mod config;
pub mod events;
pub mod fuel;
pub mod game_data;
pub mod logging;

// Capture and async replay
pub mod capture;
pub mod driver;
pub mod provider;
pub mod providers;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use cache::{CacheLocation, DataCache};
pub use commentary::{CommentaryInfo, CommentaryListener};
pub use config::PluginConfig;
pub use driver::{DrainStats, Driver, DriverChannels};
pub use events::GameEventsListener;
pub use fuel::{FuelUsage, FuelUsageRecorder};
pub use game::{GameFormats, GameVersion};
pub use game_data::GameData;
pub use graphics::{GraphicsInfo, GraphicsListener, Viewport};
pub use presets::EditorPresets;
pub use record::{ListenerList, UpdateContext, UpdateState, VersionedRecord, update_data};
pub use registry::{ClassId, DriverId, IdRegistry};
pub use scoring::{Laptime, ScoringInfo, ScoringListener, VehicleView};
pub use source::{DataSource, LiveHandle};
pub use telemetry::{TelemetryData, TelemetryListener};
