//! Payload builders and recording listeners shared by the unit tests.

use std::cell::RefCell;

use crate::events::GameEventsListener;
use crate::game::rfactor1;
use crate::game::{ScoringFormat, TelemetryFormat};
use crate::game_data::GameData;
use crate::scoring::{ScoringSnapshot, VehicleSnapshot, VehicleView};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{SessionType, Vector3};

pub const TRACK: &str = "Test Ring";

pub fn session_header(session_type: SessionType, num_vehicles: usize) -> ScoringSnapshot {
    ScoringSnapshot {
        track_name: TRACK.to_string(),
        session_type,
        session_time: 300.0,
        end_time: 3600.0,
        max_laps: 30,
        track_length: 4000.0,
        num_vehicles: num_vehicles as i32,
        in_realtime: true,
        ..ScoringSnapshot::default()
    }
}

/// A car at speed in mid-lap.
pub fn car(name: &str, place: u8, laps_completed: i32) -> VehicleSnapshot {
    VehicleSnapshot {
        driver_name: name.to_string(),
        vehicle_name: format!("{name} Racing"),
        vehicle_class: "GT".to_string(),
        laps_completed,
        sector: 1,
        place,
        lap_distance: 1500.0,
        time_behind_leader: f32::from(place.saturating_sub(1)) * 1.5,
        local_velocity: Vector3::new(0.0, 0.0, -60.0),
        ..VehicleSnapshot::default()
    }
}

/// The player's car after completing `laps` laps, with a 90 s last lap.
pub fn player_car(name: &str, laps: i32) -> VehicleSnapshot {
    let mut car = car(name, 1, laps);
    car.is_player = true;
    if laps > 0 {
        car.last_sector1 = 30.0;
        car.last_sector2 = 60.0;
        car.last_lap_time = 90.0 - laps as f32 * 0.1;
    }
    car
}

pub fn scoring_bytes(header: &ScoringSnapshot, vehicles: &[VehicleSnapshot]) -> Vec<u8> {
    rfactor1::SCORING.encode(header, vehicles)
}

pub fn telemetry_bytes(fuel: f32) -> Vec<u8> {
    rfactor1::TELEMETRY.encode(&TelemetrySnapshot {
        fuel,
        engine_rpm: 14_000.0,
        engine_max_rpm: 19_000.0,
        gear: 5,
        ..TelemetrySnapshot::default()
    })
}

/// Records every game event as a short line.
#[derive(Default)]
pub struct EventLog {
    pub events: RefCell<Vec<String>>,
}

impl EventLog {
    pub fn take(&self) -> Vec<String> {
        self.events.borrow_mut().drain(..).collect()
    }

    fn push(&self, event: String) -> anyhow::Result<()> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

impl GameEventsListener for EventLog {
    fn on_session_started(&self, _game: &GameData, editor: bool) -> anyhow::Result<()> {
        self.push(format!("session started editor={editor}"))
    }

    fn on_session_ended(&self, _game: &GameData, _editor: bool) -> anyhow::Result<()> {
        self.push("session ended".into())
    }

    fn on_cockpit_exited(&self, _game: &GameData, _editor: bool) -> anyhow::Result<()> {
        self.push("cockpit exited".into())
    }

    fn on_track_changed(&self, track_name: &str, _game: &GameData, _editor: bool) -> anyhow::Result<()> {
        self.push(format!("track {track_name}"))
    }

    fn on_pits_entered(&self, _game: &GameData, _editor: bool) -> anyhow::Result<()> {
        self.push("pits entered".into())
    }

    fn on_pits_exited(&self, _game: &GameData, _editor: bool) -> anyhow::Result<()> {
        self.push("pits exited".into())
    }

    fn on_vehicle_control_changed(
        &self,
        vehicle: VehicleView<'_>,
        _game: &GameData,
        _editor: bool,
    ) -> anyhow::Result<()> {
        self.push(format!("control {:?}", vehicle.control()))
    }

    fn on_lap_started(&self, vehicle: VehicleView<'_>, _game: &GameData, _editor: bool) -> anyhow::Result<()> {
        self.push(format!("lap {} {}", vehicle.driver_name(), vehicle.current_lap()))
    }
}
