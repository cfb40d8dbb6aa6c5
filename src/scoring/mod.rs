//! Session scoring: the header plus one structure per vehicle.
//!
//! [`ScoringInfo`] is the versioned record. Besides the decoded structures it
//! keeps a [`VehicleState`] per driver across ticks (stint, pit state,
//! laptime history, fastest laps) and answers the derived questions through
//! [`VehicleView`]: places and gaps overall or within a class, lap distance
//! extrapolated to the present, session limits and lap estimates.
//!
//! Per-tick caches (places, lap distances, class standings) are reset in
//! [`VersionedRecord::prepare_data_update`]. Class standings are computed
//! lazily by the first per-class query of a tick and shared by every later
//! one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};

use tracing::debug;

use crate::game::ScoringFormat;
use crate::presets::EditorPresets;
use crate::record::{ListenerList, UpdateContext, UpdateState, VersionedRecord};
use crate::registry::DriverId;
use crate::source::DataSource;
use crate::types::{
    GamePhase, RecordBuffer, RecordKind, SessionLimit, SessionType, Vector3, YellowFlagState,
};
use crate::{Result, TelemetryError};

mod class_scoring;
mod lap_state;
mod laptime;
mod vehicle;

pub use class_scoring::ClassStanding;
pub use lap_state::LapState;
pub use laptime::{
    FastestLaps, Laptime, average_laptime, is_cacheable_session, is_hotlap_session,
    lap_type_for_session,
};
pub use vehicle::{PlayerTelemetry, VehicleSnapshot, VehicleState, VehicleView};

use class_scoring::ClassEntry;
use vehicle::TickContext;

/// More vehicles than this in a header means the stream is corrupt.
pub const MAX_VEHICLES: usize = 256;

/// Class names the editor alternates between.
const EDITOR_CLASSES: [&str; 2] = ["F1 2006", "F1 2006B"];

/// Decoded scoring header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringSnapshot {
    pub track_name: String,
    pub session_type: SessionType,
    /// Session clock in seconds
    pub session_time: f32,
    pub end_time: f32,
    pub max_laps: i32,
    /// Meters
    pub track_length: f32,
    pub num_vehicles: i32,
    pub game_phase: GamePhase,
    pub yellow_flag_state: YellowFlagState,
    pub sector_flags: [i8; 3],
    pub start_light: u8,
    pub num_red_lights: u8,
    pub in_realtime: bool,
    pub player_name: String,
    pub player_file_name: String,
    pub cloud_darkness: f32,
    pub raining: f32,
    /// °C
    pub ambient_temperature: f32,
    /// °C
    pub track_temperature: f32,
    pub wind: Vector3,
    pub on_path_wetness: f32,
    pub off_path_wetness: f32,
}

pub trait ScoringListener {
    fn on_scoring_info_updated(&self, data: &ScoringInfo, editor: bool) -> anyhow::Result<()>;
}

/// Versioned scoring record. In scope means updated in the cockpit.
pub struct ScoringInfo {
    format: &'static dyn ScoringFormat,
    header: RecordBuffer,
    vehicle_buffers: Vec<RecordBuffer>,
    num_vehicles: usize,
    state: UpdateState,
    snapshot: ScoringSnapshot,
    vehicles: Vec<VehicleState>,
    /// Vehicle indices ordered by place
    by_place: Vec<usize>,
    class_scoring: RefCell<Option<Vec<ClassStanding>>>,
    class_scoring_passes: Cell<u64>,
    extrapolation_time: f32,
    cached_normal_laptime: Option<Laptime>,
    cached_hot_laptime: Option<Laptime>,
    listeners: ListenerList<dyn ScoringListener>,
}

impl ScoringInfo {
    pub fn new(format: &'static dyn ScoringFormat) -> Result<Self> {
        Ok(Self {
            format,
            header: RecordBuffer::new("scoring", format.header_fields(), format.header_size())?,
            vehicle_buffers: Vec::new(),
            num_vehicles: 0,
            state: UpdateState::default(),
            snapshot: ScoringSnapshot::default(),
            vehicles: Vec::new(),
            by_place: Vec::new(),
            class_scoring: RefCell::new(None),
            class_scoring_passes: Cell::new(0),
            extrapolation_time: 0.0,
            cached_normal_laptime: None,
            cached_hot_laptime: None,
            listeners: ListenerList::new(),
        })
    }

    pub fn listeners(&self) -> &ListenerList<dyn ScoringListener> {
        &self.listeners
    }

    pub fn snapshot(&self) -> &ScoringSnapshot {
        &self.snapshot
    }

    pub fn session_type(&self) -> SessionType {
        self.snapshot.session_type
    }

    pub fn track_name(&self) -> &str {
        &self.snapshot.track_name
    }

    pub fn track_length(&self) -> f32 {
        self.snapshot.track_length
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Test day with only the player on track.
    pub fn is_hotlap_session(&self) -> bool {
        is_hotlap_session(self.snapshot.session_type, self.snapshot.num_vehicles)
    }

    /// Vehicle by index in the record's vehicle list.
    pub fn vehicle(&self, index: usize) -> Option<VehicleView<'_>> {
        (index < self.vehicles.len()).then(|| VehicleView::new(self, index))
    }

    /// Vehicle by 1-based place.
    pub fn vehicle_by_place(&self, place: usize) -> Option<VehicleView<'_>> {
        let index = *self.by_place.get(place.checked_sub(1)?)?;
        Some(VehicleView::new(self, index))
    }

    /// All vehicles in place order.
    pub fn vehicles(&self) -> impl Iterator<Item = VehicleView<'_>> + '_ {
        self.by_place.iter().map(move |&index| VehicleView::new(self, index))
    }

    pub fn vehicle_by_driver(&self, driver_id: DriverId) -> Option<VehicleView<'_>> {
        self.vehicles().find(|v| v.driver_id() == driver_id)
    }

    pub fn leader(&self) -> Option<VehicleView<'_>> {
        self.vehicle_by_place(1)
    }

    pub fn player(&self) -> Option<VehicleView<'_>> {
        self.vehicles().find(VehicleView::is_player)
    }

    /// Vehicle holding the fastest lap of the session.
    pub fn fastest_lap_vehicle(&self) -> Option<VehicleView<'_>> {
        self.vehicles()
            .filter_map(|v| v.fastest_laptime().map(|lap| (v, lap.lap_time)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| v)
    }

    /// Vehicle nearest to the camera. Graphics reports the camera position
    /// negated.
    pub fn closest_to_camera(&self, camera_position: Vector3) -> Option<VehicleView<'_>> {
        let camera = -camera_position;
        self.vehicles()
            .map(|v| (v, v.world_position().distance_squared(&camera)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| v)
    }

    /// Which bound ends the session, judged from the leader's pace.
    pub fn session_limit(&self, preference: Option<SessionLimit>) -> Option<SessionLimit> {
        self.leader().and_then(|leader| leader.session_limit(preference))
    }

    /// Seconds that vehicle positions are extrapolated by.
    pub fn extrapolation_time(&self) -> f32 {
        self.extrapolation_time
    }

    pub fn set_extrapolation_time(&mut self, seconds: f32) {
        self.extrapolation_time = seconds;
        for vehicle in &self.vehicles {
            vehicle.reset_tick_caches();
        }
    }

    /// Attach the player's laps loaded from the data cache.
    pub fn set_cached_player_laptimes(&mut self, normal: Option<Laptime>, hot: Option<Laptime>) {
        self.cached_normal_laptime = normal;
        self.cached_hot_laptime = hot;
    }

    pub fn clear_cached_player_laptime(&mut self, hotlap: bool) {
        if hotlap {
            self.cached_hot_laptime = None;
        } else {
            self.cached_normal_laptime = None;
        }
    }

    pub fn cached_player_laptime(&self, hotlap: bool) -> Option<&Laptime> {
        if hotlap { self.cached_hot_laptime.as_ref() } else { self.cached_normal_laptime.as_ref() }
    }

    /// Drop every vehicle's session history.
    pub fn reset_session(&mut self) {
        for vehicle in &mut self.vehicles {
            vehicle.reset_session();
        }
        self.cached_normal_laptime = None;
        self.cached_hot_laptime = None;
    }

    /// Number of class standing computations so far.
    pub fn class_scoring_passes(&self) -> u64 {
        self.class_scoring_passes.get()
    }

    pub(crate) fn state(&self, index: usize) -> &VehicleState {
        &self.vehicles[index]
    }

    pub(crate) fn class_standing(&self, index: usize) -> ClassStanding {
        if let Some(standings) = self.class_scoring.borrow().as_ref() {
            return standings.get(index).copied().unwrap_or_default();
        }

        let entries: Vec<ClassEntry> = self
            .by_place
            .iter()
            .map(|&i| {
                let v = &self.vehicles[i];
                ClassEntry {
                    index: i,
                    class_id: VehicleView::new(self, i).class_id(),
                    time_behind_leader: v.snapshot().time_behind_leader,
                    laps_behind_leader: v.snapshot().laps_behind_leader,
                }
            })
            .collect();
        let standings = class_scoring::compute(&entries, self.vehicles.len());
        self.class_scoring_passes.set(self.class_scoring_passes.get() + 1);

        let standing = standings.get(index).copied().unwrap_or_default();
        *self.class_scoring.borrow_mut() = Some(standings);
        standing
    }

    fn ensure_vehicle_buffers(&mut self, count: usize) -> Result<()> {
        while self.vehicle_buffers.len() < count {
            self.vehicle_buffers.push(RecordBuffer::new(
                "scoring vehicle",
                self.format.vehicle_fields(),
                self.format.vehicle_size(),
            )?);
        }
        Ok(())
    }

    fn stage(&mut self, input: &mut dyn Read) -> Result<usize> {
        self.header.stage_from_reader(input)?;

        let count = self.format.vehicle_count(self.header.staged_reader());
        if count > MAX_VEHICLES {
            return Err(TelemetryError::parse(
                "scoring header",
                format!("{count} vehicles exceeds the maximum of {MAX_VEHICLES}"),
            ));
        }

        self.ensure_vehicle_buffers(count)?;
        for buffer in &mut self.vehicle_buffers[..count] {
            buffer.stage_from_reader(input)?;
        }
        Ok(count)
    }

    fn rebuild_place_order(&mut self) {
        let mut order: Vec<usize> = (0..self.vehicles.len()).collect();
        // Place 0 means unknown and sorts last.
        order.sort_by_key(|&i| match self.vehicles[i].snapshot().place {
            0 => u16::MAX,
            place => u16::from(place),
        });
        self.by_place = order;
    }
}

fn next_occurrence(seen: &mut HashMap<DriverId, usize>, key: DriverId) -> usize {
    let count = seen.entry(key).or_insert(0);
    *count += 1;
    *count - 1
}

impl VersionedRecord for ScoringInfo {
    fn kind(&self) -> RecordKind {
        RecordKind::Scoring
    }

    fn update_state(&self) -> &UpdateState {
        &self.state
    }

    fn update_state_mut(&mut self) -> &mut UpdateState {
        &mut self.state
    }

    fn prepare_data_update(&mut self, _ctx: &UpdateContext<'_>) {
        for vehicle in &self.vehicles {
            vehicle.reset_tick_caches();
        }
        *self.class_scoring.get_mut() = None;
    }

    fn fill(&mut self, source: &mut DataSource<'_>) -> Result<()> {
        let count = match source {
            DataSource::Live(handle) => self.stage(&mut Cursor::new(handle.bytes()))?,
            DataSource::Stream(input) => self.stage(&mut **input)?,
            DataSource::Preset(_) => {
                let payload = self.format.default_payload();
                self.stage(&mut Cursor::new(payload))?
            }
        };

        self.header.commit();
        for buffer in &mut self.vehicle_buffers[..count] {
            buffer.commit();
        }
        self.num_vehicles = count;
        Ok(())
    }

    fn decode(&mut self, ctx: &mut UpdateContext<'_>) {
        // Fresh positions need no extrapolation until the next telemetry tick.
        self.extrapolation_time = 0.0;
        self.snapshot = self.format.decode_header(self.header.reader());

        let tick = TickContext {
            session_type: self.snapshot.session_type,
            num_vehicles: self.snapshot.num_vehicles,
            track_length: self.snapshot.track_length,
            extrapolation_time: self.extrapolation_time,
            in_cockpit: ctx.in_cockpit,
            player_telemetry: ctx.player_telemetry,
        };

        // Names repeat in some fields, so the n-th vehicle of a name keeps
        // the state of the previous tick's n-th vehicle of that name.
        let mut seen = HashMap::new();
        let mut previous: HashMap<(DriverId, usize), VehicleState> = self
            .vehicles
            .drain(..)
            .map(|v| ((v.key(), next_occurrence(&mut seen, v.key())), v))
            .collect();

        seen.clear();
        for buffer in &self.vehicle_buffers[..self.num_vehicles] {
            let snapshot = self.format.decode_vehicle(buffer.reader());
            let key = ctx.registry.driver_id(&snapshot.driver_name);
            let class_id = ctx.registry.class_id(&snapshot.vehicle_class);

            let occurrence = next_occurrence(&mut seen, key);
            let mut state = previous.remove(&(key, occurrence)).unwrap_or_else(|| VehicleState::new(key));
            state.update(snapshot, class_id, &tick);
            self.vehicles.push(state);
        }

        if !previous.is_empty() {
            debug!(record = "scoring", left = previous.len(), "vehicles left the session");
        }

        self.rebuild_place_order();
        *self.class_scoring.get_mut() = None;
    }

    fn apply_presets(&mut self, presets: &EditorPresets, ctx: &mut UpdateContext<'_>) {
        let lap_type = lap_type_for_session(self.snapshot.session_type, self.snapshot.num_vehicles);
        let player_id = ctx.registry.driver_id(&presets.driver_name);

        for (index, vehicle) in self.vehicles.iter_mut().enumerate() {
            let class = EDITOR_CLASSES[index % EDITOR_CLASSES.len()];
            let class_id = ctx.registry.class_id(class);
            vehicle.set_class(class, class_id);

            if vehicle.snapshot().is_player {
                vehicle.set_player_name(&presets.driver_name, player_id);
            }
            vehicle.apply_editor_presets(presets, index, lap_type);

            let place = usize::from(vehicle.snapshot().place.max(1));
            vehicle.set_top_speed(presets.top_speed(place - 1));
        }

        *self.class_scoring.get_mut() = None;
    }

    fn notify_listeners(&self, editor: bool) {
        self.listeners.dispatch(self.kind(), |l| l.on_scoring_info_updated(self, editor));
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        self.header.write_to(out)?;
        for buffer in &self.vehicle_buffers[..self.num_vehicles] {
            buffer.write_to(out)?;
        }
        Ok(())
    }
}
