//! Values the editor forces on top of the bundled default payloads.

use serde::{Deserialize, Serialize};

use crate::types::Wheel;

/// Editor preset values.
///
/// Applied by the override pass of each record when the update source is
/// [`DataSource::Preset`](crate::source::DataSource::Preset). Sector times
/// are pure sector durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPresets {
    /// Name shown for the player's vehicle
    pub driver_name: String,
    pub last_sector1_time: f32,
    pub last_sector2_time: f32,
    pub last_sector3_time: f32,
    pub current_sector1_time: f32,
    pub current_sector2_time: f32,
    /// Forced engine water temperature in °C, if any
    pub engine_water_temperature: Option<f32>,
    /// Total safe engine lifetime in seconds
    pub engine_lifetime: f32,
    /// Brake disc thickness in meters, in [`Wheel`] order
    pub brake_disc_thickness: [f32; 4],
    /// Top speed in km/h by place (index 0 is the leader)
    pub top_speeds: Vec<f32>,
    pub fuel_usage_last_lap: f32,
    pub fuel_usage_average: f32,
    pub fuel_usage_laps: i32,
}

impl Default for EditorPresets {
    fn default() -> Self {
        Self {
            driver_name: "Dummy Driver".to_string(),
            last_sector1_time: 28.829,
            last_sector2_time: 29.247,
            last_sector3_time: 25.712,
            current_sector1_time: 29.012,
            current_sector2_time: 29.538,
            engine_water_temperature: None,
            engine_lifetime: 7200.0,
            brake_disc_thickness: [0.032, 0.032, 0.028, 0.028],
            top_speeds: (0..22).map(|place| 318.4 - place as f32 * 0.9).collect(),
            fuel_usage_last_lap: 3.456,
            fuel_usage_average: 3.397,
            fuel_usage_laps: 4,
        }
    }
}

impl EditorPresets {
    /// Last sector 2 time, optionally including sector 1.
    pub fn last_sector2(&self, cumulative: bool) -> f32 {
        if cumulative {
            self.last_sector1_time + self.last_sector2_time
        } else {
            self.last_sector2_time
        }
    }

    pub fn last_lap_time(&self) -> f32 {
        self.last_sector1_time + self.last_sector2_time + self.last_sector3_time
    }

    /// Current sector 2 time, optionally including sector 1.
    pub fn current_sector2(&self, cumulative: bool) -> f32 {
        if cumulative {
            self.current_sector1_time + self.current_sector2_time
        } else {
            self.current_sector2_time
        }
    }

    pub fn brake_disc_thickness(&self, wheel: Wheel) -> f32 {
        self.brake_disc_thickness[wheel.index()]
    }

    /// Top speed for a zero-based place index, repeating the slowest entry
    /// past the end of the table.
    pub fn top_speed(&self, place_index: usize) -> f32 {
        self.top_speeds
            .get(place_index)
            .or_else(|| self.top_speeds.last())
            .copied()
            .unwrap_or(0.0)
    }
}
