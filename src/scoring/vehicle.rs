//! Per-vehicle scoring values and the state derived from them over time.

use std::cell::Cell;

use super::ScoringInfo;
use super::class_scoring::ClassStanding;
use super::laptime::{
    FastestLaps, Laptime, average_laptime, is_cacheable_session, is_hotlap_session,
    lap_type_for_session,
};
use crate::presets::EditorPresets;
use crate::registry::{ClassId, DriverId};
use crate::types::{
    FinishStatus, LapType, PitState, SessionLimit, SessionType, Vector3, VehicleControl,
};

/// Speed below which a vehicle counts as standing, in m/s.
const STANDING_SPEED: f32 = 0.1;

/// Bounds outside of which max laps and end time count as "not configured".
const MAX_SANE_LAPS: i32 = 10_000;
const MAX_SANE_END_TIME: f32 = 999_999.0;

/// Editor laptimes vary by up to this many seconds per sector.
const EDITOR_SECTOR_VARIATION: f32 = 0.2178;

/// Decoded vehicle structure of the scoring record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleSnapshot {
    pub driver_name: String,
    pub vehicle_name: String,
    pub laps_completed: i32,
    /// 1, 2 or 3
    pub sector: i8,
    pub finish_status: FinishStatus,
    /// Meters since the start/finish line
    pub lap_distance: f32,
    pub path_lateral: f32,
    pub track_edge: f32,
    /// Best split at the end of sector 1
    pub best_sector1: f32,
    /// Best split at the end of sector 2, including sector 1
    pub best_sector2: f32,
    pub best_lap_time: f32,
    pub last_sector1: f32,
    /// Split including sector 1
    pub last_sector2: f32,
    pub last_lap_time: f32,
    pub current_sector1: f32,
    /// Split including sector 1
    pub current_sector2: f32,
    pub num_pitstops: i16,
    pub num_penalties: i16,
    pub is_player: bool,
    pub control: VehicleControl,
    pub in_pits: bool,
    /// 1-based
    pub place: u8,
    pub vehicle_class: String,
    pub time_behind_next: f32,
    pub laps_behind_next: i32,
    pub time_behind_leader: f32,
    pub laps_behind_leader: i32,
    pub lap_start_time: f32,
    pub world_position: Vector3,
    pub local_velocity: Vector3,
    pub local_acceleration: Vector3,
    pub orientation: [Vector3; 3],
    pub local_rotation: Vector3,
    pub local_rotation_acceleration: Vector3,
}

/// Player engine values mirrored from telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTelemetry {
    pub engine_rpm: f32,
    pub engine_max_rpm: f32,
    pub gear: i32,
}

/// Session values a vehicle needs to update itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickContext {
    pub session_type: SessionType,
    pub num_vehicles: i32,
    pub track_length: f32,
    pub extrapolation_time: f32,
    pub in_cockpit: bool,
    pub player_telemetry: Option<PlayerTelemetry>,
}

/// State of one vehicle, kept across ticks while the driver stays in the
/// session.
#[derive(Debug, Clone)]
pub struct VehicleState {
    /// Id of the name the game reports; used to match vehicles across ticks
    key: DriverId,
    driver_id: DriverId,
    driver_name: String,
    class_id: ClassId,
    snapshot: VehicleSnapshot,
    place: Cell<i16>,
    lap_distance: Cell<f32>,
    lap: i32,
    old_lap: i32,
    stint_start_lap: i32,
    stint_length: f32,
    pit_state: Option<PitState>,
    laptimes: Vec<Laptime>,
    fastest: FastestLaps,
    average_laptime: Option<Laptime>,
    old_average_laptime: Option<Laptime>,
    /// km/h
    top_speed: f32,
    engine_rpm: f32,
    engine_max_rpm: f32,
    gear: i32,
    editor_last: Option<Laptime>,
    editor_current: Option<Laptime>,
    editor_fastest: Option<Laptime>,
}

impl VehicleState {
    pub(crate) fn new(key: DriverId) -> Self {
        Self {
            key,
            driver_id: key,
            driver_name: String::new(),
            class_id: ClassId(0),
            snapshot: VehicleSnapshot::default(),
            place: Cell::new(-1),
            lap_distance: Cell::new(-1.0),
            lap: -1,
            old_lap: -1,
            stint_start_lap: -1,
            stint_length: 0.0,
            pit_state: None,
            laptimes: Vec::new(),
            fastest: FastestLaps::default(),
            average_laptime: None,
            old_average_laptime: None,
            top_speed: 0.0,
            engine_rpm: -1.0,
            engine_max_rpm: -1.0,
            gear: -1000,
            editor_last: None,
            editor_current: None,
            editor_fastest: None,
        }
    }

    pub(crate) fn key(&self) -> DriverId {
        self.key
    }

    pub fn snapshot(&self) -> &VehicleSnapshot {
        &self.snapshot
    }

    pub(crate) fn reset_tick_caches(&self) {
        self.place.set(-1);
        self.lap_distance.set(-1.0);
    }

    pub(crate) fn reset_session(&mut self) {
        self.stint_start_lap = -1;
        self.old_lap = -1;
        self.laptimes.clear();
        self.fastest.clear();
        self.average_laptime = None;
        self.old_average_laptime = None;
        self.top_speed = 0.0;
        self.editor_last = None;
        self.editor_current = None;
        self.editor_fastest = None;
    }

    /// Take this tick's values and advance the derived state.
    pub(crate) fn update(&mut self, snapshot: VehicleSnapshot, class_id: ClassId, tick: &TickContext) {
        self.driver_id = self.key;
        self.driver_name.clone_from(&snapshot.driver_name);
        self.class_id = class_id;
        self.snapshot = snapshot;
        self.reset_tick_caches();

        self.old_lap = self.lap;
        self.lap = self.snapshot.laps_completed + 1;

        if self.old_lap > 0 && self.lap > self.old_lap {
            self.record_completed_lap(tick);
        }

        let lap_distance = extrapolate_lap_distance(
            self.snapshot.lap_distance,
            self.scalar_velocity(),
            tick.extrapolation_time,
            tick.track_length,
        );
        self.lap_distance.set(lap_distance);
        let normalized = normalize(lap_distance, tick.track_length);
        self.update_stint(normalized, tick.in_cockpit);

        self.top_speed = self.top_speed.max(self.scalar_velocity() * 3.6);

        match tick.player_telemetry.filter(|_| self.snapshot.is_player) {
            Some(telemetry) => {
                self.engine_rpm = telemetry.engine_rpm;
                self.engine_max_rpm = telemetry.engine_max_rpm;
                self.gear = telemetry.gear;
            }
            None => {
                self.engine_rpm = -1.0;
                self.engine_max_rpm = -1.0;
                self.gear = -1000;
            }
        }
    }

    fn scalar_velocity(&self) -> f32 {
        self.snapshot.local_velocity.length()
    }

    fn record_completed_lap(&mut self, tick: &TickContext) {
        let completed = self.snapshot.laps_completed;

        while (self.laptimes.len() as i32) < completed - 1 {
            let lap = self.laptimes.len() as i32 + 1;
            self.laptimes.push(Laptime::new(self.driver_id, lap));
        }
        if self.laptimes.len() as i32 != completed - 1 {
            return;
        }

        let s = &self.snapshot;
        let sector2 = if s.last_sector1 > 0.0 && s.last_sector2 > 0.0 {
            s.last_sector2 - s.last_sector1
        } else {
            -1.0
        };
        let sector3 = if s.last_sector2 > 0.0 && s.last_lap_time > 0.0 {
            s.last_lap_time - s.last_sector2
        } else {
            -1.0
        };

        let mut laptime =
            Laptime::new(self.driver_id, completed).with_sectors(s.last_sector1, sector2, sector3);
        laptime.lap_time = s.last_lap_time;
        laptime.finished = s.last_lap_time > 0.0;
        laptime.is_outlap = self.stint_start_lap == completed;
        laptime.is_inlap = Some(s.in_pits);
        laptime.lap_type = lap_type_for_session(tick.session_type, tick.num_vehicles);

        self.fastest.offer(&laptime);
        self.laptimes.push(laptime);
        self.refresh_average();
    }

    fn refresh_average(&mut self) {
        let average = average_laptime(&self.laptimes, self.fastest.fastest());
        self.old_average_laptime = std::mem::replace(&mut self.average_laptime, average);
    }

    fn update_stint(&mut self, normalized_lap_distance: f32, in_cockpit: bool) {
        let current_lap = self.snapshot.laps_completed + 1;
        let in_pits = self.snapshot.in_pits;
        let standing = self.scalar_velocity().abs() < STANDING_SPEED;

        if self.stint_start_lap < 0
            || (in_pits && standing && self.stint_start_lap != current_lap)
            || self.stint_start_lap > current_lap
        {
            self.stint_start_lap = current_lap;
        }

        self.pit_state = Some(match self.pit_state {
            None if in_pits && standing => PitState::Stopped,
            None if in_pits => PitState::InPitLane,
            None => PitState::OnTrack,
            Some(old) => {
                if old == PitState::Stopped && !in_pits {
                    self.stint_start_lap = current_lap;
                }

                if in_pits {
                    if standing && old != PitState::Stopped {
                        PitState::Stopped
                    } else if old == PitState::OnTrack {
                        PitState::InPitLane
                    } else {
                        old
                    }
                } else {
                    PitState::OnTrack
                }
            }
        });

        // Player values outside the cockpit are unreliable.
        self.stint_length = if !self.snapshot.is_player || in_cockpit {
            (current_lap - self.stint_start_lap) as f32 + normalized_lap_distance
        } else {
            0.0
        };
    }

    /// Synthetic laptime history for the editor, stable across calls.
    pub(crate) fn apply_editor_presets(
        &mut self,
        presets: &EditorPresets,
        seed: usize,
        lap_type: LapType,
    ) {
        let s = &self.snapshot;
        let is_player = s.is_player;
        let completed = s.laps_completed;

        let (last1, last2, last3) = if is_player {
            (presets.last_sector1_time, presets.last_sector2_time, presets.last_sector3_time)
        } else {
            (s.last_sector1, s.last_sector2 - s.last_sector1, s.last_lap_time - s.last_sector2)
        };
        let (current1, current2) = if is_player {
            (presets.current_sector1_time, presets.current_sector2_time)
        } else if s.current_sector2 > 0.0 {
            (s.current_sector1, s.current_sector2 - s.current_sector1)
        } else {
            (s.current_sector1, -1.0)
        };

        self.laptimes.clear();
        self.fastest.clear();

        for lap in 1..=completed {
            let vary = |sector: usize| {
                if lap == completed { 0.0 } else { editor_variation(seed, lap, sector) }
            };
            let mut laptime = Laptime::new(self.driver_id, lap).with_sectors(
                last1 + vary(1),
                last2 + vary(2),
                last3 + vary(3),
            );
            laptime.is_outlap = lap == 1;
            laptime.is_inlap = Some(false);
            laptime.finished = true;
            laptime.lap_type = lap_type;

            let faster = self.fastest.fastest().is_none_or(|f| laptime.lap_time < f.lap_time);
            if lap == 1 || faster {
                self.fastest.replace(Some(laptime.clone()));
            }
            self.laptimes.push(laptime);
        }

        let mut current = Laptime::new(self.driver_id, completed + 1);
        current.sector1 = current1;
        current.sector2 = current2;
        current.lap_type = lap_type;
        self.laptimes.push(current.clone());

        self.refresh_average();

        if is_player {
            self.editor_last = completed
                .checked_sub(1)
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| self.laptimes.get(i))
                .cloned();
            self.editor_current = Some(current);
            self.editor_fastest = self.fastest.fastest().cloned();
        }
    }

    pub(crate) fn set_player_name(&mut self, name: &str, id: DriverId) {
        self.driver_name = name.to_owned();
        self.driver_id = id;
        for laptime in &mut self.laptimes {
            laptime.driver_id = id;
        }
    }

    pub(crate) fn set_class(&mut self, class: &str, id: ClassId) {
        self.snapshot.vehicle_class = class.to_owned();
        self.class_id = id;
    }

    pub(crate) fn set_top_speed(&mut self, kmh: f32) {
        self.top_speed = kmh;
    }
}

/// Deterministic offset in `(-EDITOR_SECTOR_VARIATION, 0]`.
fn editor_variation(seed: usize, lap: i32, sector: usize) -> f32 {
    let step = (seed * 31 + lap.unsigned_abs() as usize * 17 + sector * 7) % 10;
    -EDITOR_SECTOR_VARIATION * step as f32 / 10.0
}

pub(crate) fn extrapolate_lap_distance(
    last_known: f32,
    speed: f32,
    seconds: f32,
    track_length: f32,
) -> f32 {
    let distance = last_known + speed * seconds;
    if track_length > 0.0 {
        distance.rem_euclid(track_length)
    } else {
        distance.max(0.0)
    }
}

fn normalize(lap_distance: f32, track_length: f32) -> f32 {
    if track_length > 0.0 { lap_distance / track_length } else { 0.0 }
}

/// One vehicle of a [`ScoringInfo`], with the session around it.
#[derive(Clone, Copy)]
pub struct VehicleView<'a> {
    info: &'a ScoringInfo,
    index: usize,
}

impl std::fmt::Debug for VehicleView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleView")
            .field("index", &self.index)
            .field("driver", &self.driver_name())
            .finish()
    }
}

impl PartialEq for VehicleView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.info, other.info) && self.index == other.index
    }
}

impl<'a> VehicleView<'a> {
    pub(crate) fn new(info: &'a ScoringInfo, index: usize) -> Self {
        Self { info, index }
    }

    fn state(&self) -> &'a VehicleState {
        self.info.state(self.index)
    }

    fn class_standing(&self) -> ClassStanding {
        self.info.class_standing(self.index)
    }

    /// Index in the scoring record's vehicle list.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn snapshot(&self) -> &'a VehicleSnapshot {
        &self.state().snapshot
    }

    pub fn driver_name(&self) -> &'a str {
        &self.state().driver_name
    }

    pub fn driver_id(&self) -> DriverId {
        self.state().driver_id
    }

    pub fn vehicle_name(&self) -> &'a str {
        &self.snapshot().vehicle_name
    }

    pub fn vehicle_class(&self) -> &'a str {
        &self.snapshot().vehicle_class
    }

    pub fn class_id(&self) -> ClassId {
        self.state().class_id
    }

    pub fn is_player(&self) -> bool {
        self.snapshot().is_player
    }

    pub fn control(&self) -> VehicleControl {
        self.snapshot().control
    }

    pub fn in_pits(&self) -> bool {
        self.snapshot().in_pits
    }

    pub fn pit_state(&self) -> Option<PitState> {
        self.state().pit_state
    }

    pub fn finish_status(&self) -> FinishStatus {
        self.snapshot().finish_status
    }

    pub fn laps_completed(&self) -> i32 {
        self.snapshot().laps_completed
    }

    pub fn sector(&self) -> i8 {
        self.snapshot().sector
    }

    /// Lap being driven. A vehicle sitting in the pits right after the start
    /// of its stint still counts as on its last completed lap.
    pub fn current_lap(&self) -> i32 {
        if self.in_pits() && self.stint_length() < 0.5 {
            self.laps_completed()
        } else {
            self.laps_completed() + 1
        }
    }

    pub fn is_lap_just_started(&self) -> bool {
        let state = self.state();
        state.lap != state.old_lap
    }

    /// Whether a lap was completed this tick (not just first observed).
    pub(crate) fn has_completed_lap(&self) -> bool {
        let state = self.state();
        state.old_lap > 0 && state.lap != state.old_lap
    }

    /// Distance since the line in meters, extrapolated by the scoring
    /// record's extrapolation time.
    pub fn lap_distance(&self) -> f32 {
        let state = self.state();
        let cached = state.lap_distance.get();
        if cached >= 0.0 {
            return cached;
        }

        let distance = extrapolate_lap_distance(
            state.snapshot.lap_distance,
            state.scalar_velocity(),
            self.info.extrapolation_time(),
            self.info.snapshot().track_length,
        );
        state.lap_distance.set(distance);
        distance
    }

    /// Lap distance as a fraction of the track length.
    pub fn normalized_lap_distance(&self) -> f32 {
        normalize(self.lap_distance(), self.info.snapshot().track_length)
    }

    pub fn stint_start_lap(&self) -> i32 {
        self.state().stint_start_lap
    }

    /// Laps since the last pit stop, including the fraction of the current
    /// one.
    pub fn stint_length(&self) -> f32 {
        self.state().stint_length
    }

    /// Overall place, or place within the vehicle class.
    pub fn place(&self, by_class: bool) -> i16 {
        if by_class {
            return self.class_standing().place;
        }

        let state = self.state();
        if state.place.get() < 0 {
            state.place.set(i16::from(state.snapshot.place));
        }
        state.place.get()
    }

    pub fn vehicles_in_class(&self) -> i32 {
        self.class_standing().vehicles_in_class
    }

    pub fn class_leader(&self) -> VehicleView<'a> {
        VehicleView::new(self.info, self.class_standing().leader)
    }

    pub fn next_in_front(&self, by_class: bool) -> Option<VehicleView<'a>> {
        if by_class {
            return self.class_standing().next_in_front.map(|i| VehicleView::new(self.info, i));
        }

        let place = self.place(false);
        if place <= 1 {
            return None;
        }
        self.info.vehicle_by_place(place as usize - 1)
    }

    pub fn next_behind(&self, by_class: bool) -> Option<VehicleView<'a>> {
        if by_class {
            return self.class_standing().next_behind.map(|i| VehicleView::new(self.info, i));
        }

        let place = self.place(false);
        if place < 1 || place as usize >= self.info.num_vehicles() {
            return None;
        }
        self.info.vehicle_by_place(place as usize + 1)
    }

    pub fn time_behind_next_in_front(&self, by_class: bool) -> f32 {
        if by_class {
            self.class_standing().time_behind_next
        } else {
            self.snapshot().time_behind_next
        }
    }

    pub fn laps_behind_next_in_front(&self, by_class: bool) -> i32 {
        if by_class {
            self.class_standing().laps_behind_next
        } else {
            self.snapshot().laps_behind_next
        }
    }

    pub fn time_behind_leader(&self, by_class: bool) -> f32 {
        if by_class {
            self.class_standing().time_behind_leader
        } else {
            self.snapshot().time_behind_leader
        }
    }

    pub fn laps_behind_leader(&self, by_class: bool) -> i32 {
        if by_class {
            self.class_standing().laps_behind_leader
        } else {
            self.snapshot().laps_behind_leader
        }
    }

    /// Recorded laps ordered by lap number.
    pub fn laptimes(&self) -> &'a [Laptime] {
        &self.state().laptimes
    }

    /// Lap by 1-based number.
    pub fn laptime(&self, lap: i32) -> Option<&'a Laptime> {
        let index = usize::try_from(lap.checked_sub(1)?).ok()?;
        self.laptimes().get(index)
    }

    pub fn last_laptime(&self) -> Option<&'a Laptime> {
        let state = self.state();
        state.editor_last.as_ref().or_else(|| self.laptime(self.laps_completed()))
    }

    /// Fastest lap of this session. For the player in a session whose laps
    /// are cached, a faster cached lap wins.
    pub fn fastest_laptime(&self) -> Option<&'a Laptime> {
        let live = self.state().fastest.fastest();

        let header = self.info.snapshot();
        if self.is_player() && is_cacheable_session(header.session_type, header.num_vehicles) {
            let hotlap = is_hotlap_session(header.session_type, header.num_vehicles);
            if let Some(cached) = self.info.cached_player_laptime(hotlap) {
                if live.is_none_or(|l| cached.lap_time < l.lap_time) {
                    return Some(cached);
                }
            }
        }

        live
    }

    pub fn second_fastest_laptime(&self) -> Option<&'a Laptime> {
        self.state().fastest.second()
    }

    pub fn average_laptime(&self) -> Option<&'a Laptime> {
        self.state().average_laptime.as_ref()
    }

    /// Average before the last completed lap.
    pub fn old_average_laptime(&self) -> Option<&'a Laptime> {
        self.state().old_average_laptime.as_ref()
    }

    pub fn best_sector1(&self) -> f32 {
        match &self.state().editor_fastest {
            Some(lap) => lap.sector1(),
            None => self.snapshot().best_sector1,
        }
    }

    pub fn best_sector2(&self, cumulative: bool) -> f32 {
        if let Some(lap) = &self.state().editor_fastest {
            return lap.sector2(cumulative);
        }
        let split = self.snapshot().best_sector2;
        if !cumulative && split > 0.0 { split - self.best_sector1() } else { split }
    }

    pub fn best_sector3(&self) -> f32 {
        if let Some(lap) = &self.state().editor_fastest {
            return lap.sector3();
        }
        let lap = self.best_lap_time();
        if lap > 0.0 { lap - self.best_sector2(true) } else { lap }
    }

    pub fn best_lap_time(&self) -> f32 {
        match &self.state().editor_fastest {
            Some(lap) => lap.lap_time(),
            None => self.snapshot().best_lap_time,
        }
    }

    pub fn last_sector1(&self) -> f32 {
        match &self.state().editor_last {
            Some(lap) => lap.sector1(),
            None => self.snapshot().last_sector1,
        }
    }

    pub fn last_sector2(&self, cumulative: bool) -> f32 {
        if let Some(lap) = &self.state().editor_last {
            return lap.sector2(cumulative);
        }
        let split = self.snapshot().last_sector2;
        if !cumulative && split > 0.0 { split - self.last_sector1() } else { split }
    }

    pub fn last_sector3(&self) -> f32 {
        if let Some(lap) = &self.state().editor_last {
            return lap.sector3();
        }
        self.last_lap_time() - self.last_sector2(true)
    }

    pub fn last_lap_time(&self) -> f32 {
        match &self.state().editor_last {
            Some(lap) => lap.lap_time(),
            None => self.snapshot().last_lap_time,
        }
    }

    pub fn current_sector1(&self) -> f32 {
        match &self.state().editor_current {
            Some(lap) => lap.sector1(),
            None => self.snapshot().current_sector1,
        }
    }

    pub fn current_sector2(&self, cumulative: bool) -> f32 {
        if let Some(lap) = &self.state().editor_current {
            return lap.sector2(cumulative);
        }
        let split = self.snapshot().current_sector2;
        if !cumulative && split > 0.0 { split - self.current_sector1() } else { split }
    }

    /// Time since this lap started.
    pub fn current_laptime(&self) -> f32 {
        self.info.snapshot().session_time - self.snapshot().lap_start_time
    }

    /// Which bound will end the session, judged from this vehicle's pace.
    pub fn session_limit(&self, preference: Option<SessionLimit>) -> Option<SessionLimit> {
        let header = self.info.snapshot();
        let max_laps = sane_max_laps(header.max_laps);
        let end_time = header.end_time;
        let end_time_set = end_time > 0.0 && end_time < MAX_SANE_END_TIME;

        if max_laps > 0 && max_laps < MAX_SANE_LAPS {
            if end_time_set {
                return match self.average_laptime() {
                    None => Some(preference.unwrap_or(SessionLimit::Laps)),
                    Some(average) if ((end_time / average.lap_time) as i32) < max_laps => {
                        Some(SessionLimit::Time)
                    }
                    Some(_) => Some(SessionLimit::Laps),
                };
            }
            return Some(SessionLimit::Laps);
        }

        end_time_set.then_some(SessionLimit::Time)
    }

    /// Laps this vehicle will probably drive in total, -1 if unknown.
    pub fn estimated_max_laps(&self) -> i32 {
        let header = self.info.snapshot();
        if header.session_type.is_race() {
            if let Some(leader) = self.info.leader() {
                if leader.finish_status().is_finished() {
                    return leader.laps_completed();
                }
            }
        }

        let laps_completed = self.laps_completed();
        let max_laps = sane_max_laps(header.max_laps);
        let end_time = header.end_time;
        let fallback = if max_laps > 0 { max_laps } else { -1 };

        if laps_completed == 0 || end_time < 0.0 || end_time > MAX_SANE_END_TIME {
            return fallback;
        }
        let Some(average) = self.average_laptime() else {
            return fallback;
        };

        let rest = end_time - self.snapshot().lap_start_time;
        let time_laps = laps_completed + (rest / average.lap_time) as i32 + 1;
        if max_laps <= 0 || time_laps < max_laps { time_laps } else { max_laps }
    }

    /// Laps left until `max_laps`, including the fraction of the current one.
    pub fn laps_remaining(&self, max_laps: i32) -> f32 {
        if max_laps < 0 {
            return -1.0;
        }
        let remaining = (max_laps - self.laps_completed()) as f32;
        if self.finish_status().is_finished() {
            remaining
        } else {
            remaining - self.normalized_lap_distance()
        }
    }

    pub fn world_position(&self) -> Vector3 {
        self.snapshot().world_position
    }

    /// Speed in m/s.
    pub fn scalar_velocity(&self) -> f32 {
        self.state().scalar_velocity()
    }

    pub fn scalar_velocity_kmh(&self) -> f32 {
        self.scalar_velocity() * 3.6
    }

    /// Highest speed seen this session in km/h.
    pub fn top_speed(&self) -> f32 {
        self.state().top_speed
    }

    /// Player engine RPM from telemetry, -1 for other vehicles.
    pub fn engine_rpm(&self) -> f32 {
        self.state().engine_rpm
    }

    pub fn engine_max_rpm(&self) -> f32 {
        self.state().engine_max_rpm
    }

    /// Player gear from telemetry, -1000 for other vehicles.
    pub fn gear(&self) -> i32 {
        self.state().gear
    }
}

fn sane_max_laps(max_laps: i32) -> i32 {
    if max_laps > i32::MAX / 2 { 0 } else { max_laps }
}
