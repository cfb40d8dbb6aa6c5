//! Telemetry of the player's vehicle.

use std::io::{self, Write};

use crate::game::TelemetryFormat;
use crate::presets::EditorPresets;
use crate::record::{ListenerList, UpdateContext, UpdateState, VersionedRecord, fill_buffer};
use crate::scoring::PlayerTelemetry;
use crate::source::DataSource;
use crate::types::{RecordBuffer, RecordKind, Vector3, Wheel};
use crate::Result;

const KELVIN_OFFSET: f32 = 273.15;

/// Per-wheel telemetry values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WheelSnapshot {
    /// Radians per second
    pub rotation: f32,
    /// Meters
    pub suspension_deflection: f32,
    /// Meters
    pub ride_height: f32,
    /// Newtons
    pub tire_load: f32,
    /// Newtons
    pub lateral_force: f32,
    /// Fraction of the contact patch that is sliding
    pub grip_fraction: f32,
    /// Celsius
    pub brake_temperature: f32,
    /// kPa
    pub pressure: f32,
    /// Kelvin, left/center/right
    pub temperatures: [f32; 3],
    /// Fraction, 1.0 is new
    pub wear: f32,
    pub terrain_name: String,
    pub surface_type: u8,
    pub flat: bool,
    pub detached: bool,
}

/// Decoded telemetry structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub delta_time: f32,
    pub lap_number: i32,
    pub lap_start_time: f32,
    pub vehicle_name: String,
    pub track_name: String,
    /// World position in meters
    pub position: Vector3,
    pub local_velocity: Vector3,
    pub local_acceleration: Vector3,
    /// Rows of the orientation matrix
    pub orientation: [Vector3; 3],
    pub local_rotation: Vector3,
    pub local_rotation_acceleration: Vector3,
    /// -1 reverse, 0 neutral
    pub gear: i32,
    pub engine_rpm: f32,
    pub engine_water_temperature: f32,
    pub engine_oil_temperature: f32,
    pub clutch_rpm: f32,
    pub unfiltered_throttle: f32,
    pub unfiltered_brake: f32,
    pub unfiltered_steering: f32,
    pub unfiltered_clutch: f32,
    pub steering_arm_force: f32,
    /// Liters
    pub fuel: f32,
    pub engine_max_rpm: f32,
    pub scheduled_stops: u8,
    pub overheating: bool,
    pub detached: bool,
    pub dent_severity: [u8; 8],
    pub last_impact_time: f32,
    pub last_impact_magnitude: f32,
    pub last_impact_position: Vector3,
    pub wheels: [WheelSnapshot; 4],
}

/// Receives telemetry updates.
pub trait TelemetryListener {
    fn on_telemetry_data_updated(&self, data: &TelemetryData, editor: bool) -> anyhow::Result<()>;
}

/// Versioned telemetry record.
pub struct TelemetryData {
    format: &'static dyn TelemetryFormat,
    buffer: RecordBuffer,
    state: UpdateState,
    snapshot: TelemetrySnapshot,
    engine_lifetime: f32,
    brake_disc_thickness: [f32; 4],
    fuel_usage_last_lap: f32,
    fuel_usage_average: f32,
    listeners: ListenerList<dyn TelemetryListener>,
}

impl TelemetryData {
    pub fn new(format: &'static dyn TelemetryFormat) -> Result<Self> {
        Ok(Self {
            format,
            buffer: RecordBuffer::new("telemetry", format.fields(), format.size())?,
            state: UpdateState::default(),
            snapshot: TelemetrySnapshot::default(),
            engine_lifetime: -1.0,
            brake_disc_thickness: [-1.0; 4],
            fuel_usage_last_lap: -1.0,
            fuel_usage_average: -1.0,
            listeners: ListenerList::new(),
        })
    }

    pub fn listeners(&self) -> &ListenerList<dyn TelemetryListener> {
        &self.listeners
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn raw_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Player engine values, when the last update was taken in the cockpit.
    pub fn player_telemetry(&self) -> Option<PlayerTelemetry> {
        (self.state.is_valid() && self.state.is_updated_in_scope()).then(|| PlayerTelemetry {
            engine_rpm: self.snapshot.engine_rpm,
            engine_max_rpm: self.snapshot.engine_max_rpm,
            gear: self.snapshot.gear,
        })
    }

    /// Speed in m/s.
    pub fn scalar_velocity(&self) -> f32 {
        self.snapshot.local_velocity.length()
    }

    pub fn scalar_velocity_kmh(&self) -> f32 {
        self.scalar_velocity() * 3.6
    }

    /// Positive when accelerating forwards.
    pub fn longitudinal_acceleration(&self) -> f32 {
        -self.snapshot.local_acceleration.z
    }

    pub fn lateral_acceleration(&self) -> f32 {
        self.snapshot.local_acceleration.x
    }

    pub fn fuel(&self) -> f32 {
        self.snapshot.fuel
    }

    pub fn wheel(&self, wheel: Wheel) -> &WheelSnapshot {
        &self.snapshot.wheels[wheel.index()]
    }

    /// Average of the three tire zones in °C.
    pub fn tire_temperature(&self, wheel: Wheel) -> f32 {
        let temps = self.wheel(wheel).temperatures;
        temps.iter().sum::<f32>() / 3.0 - KELVIN_OFFSET
    }

    /// Safe engine lifetime in seconds, -1 if unknown.
    pub fn engine_lifetime(&self) -> f32 {
        self.engine_lifetime
    }

    pub fn set_engine_lifetime(&mut self, seconds: f32) {
        self.engine_lifetime = seconds;
    }

    /// Brake disc thickness in meters, -1 if unknown.
    pub fn brake_disc_thickness(&self, wheel: Wheel) -> f32 {
        self.brake_disc_thickness[wheel.index()]
    }

    pub fn set_brake_disc_thickness(&mut self, wheel: Wheel, meters: f32) {
        self.brake_disc_thickness[wheel.index()] = meters;
    }

    /// Fuel used on the last counted lap, -1 if none.
    pub fn fuel_usage_last_lap(&self) -> f32 {
        self.fuel_usage_last_lap
    }

    /// Average fuel per lap, -1 if none.
    pub fn fuel_usage_average(&self) -> f32 {
        self.fuel_usage_average
    }

    pub(crate) fn set_fuel_usage(&mut self, last_lap: f32, average: f32) {
        self.fuel_usage_last_lap = last_lap;
        self.fuel_usage_average = average;
    }
}

impl VersionedRecord for TelemetryData {
    fn kind(&self) -> RecordKind {
        RecordKind::Telemetry
    }

    fn update_state(&self) -> &UpdateState {
        &self.state
    }

    fn update_state_mut(&mut self) -> &mut UpdateState {
        &mut self.state
    }

    fn fill(&mut self, source: &mut DataSource<'_>) -> Result<()> {
        fill_buffer(&mut self.buffer, source, self.format.default_payload())
    }

    fn decode(&mut self, _ctx: &mut UpdateContext<'_>) {
        self.snapshot = self.format.decode(self.buffer.reader());
    }

    fn apply_presets(&mut self, presets: &EditorPresets, _ctx: &mut UpdateContext<'_>) {
        self.engine_lifetime = presets.engine_lifetime;
        self.brake_disc_thickness = presets.brake_disc_thickness;
        if let Some(temperature) = presets.engine_water_temperature {
            self.snapshot.engine_water_temperature = temperature;
        }
    }

    fn notify_listeners(&self, editor: bool) {
        self.listeners.dispatch(self.kind(), |l| l.on_telemetry_data_updated(self, editor));
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        self.buffer.write_to(out)
    }
}
