//! `ScoringInfoV2` / `VehicleScoringInfoV2`.
//!
//! In a live region and in streams the header is followed directly by
//! `mNumVehicles` vehicle structures.

use std::sync::OnceLock;

use crate::game::{Fields, ScoringFormat};
use crate::scoring::{ScoringSnapshot, VehicleSnapshot};
use crate::types::{
    FieldReader, FinishStatus, GamePhase, RecordEncoder, SessionType, Vector3, VehicleControl,
    YellowFlagState,
};

const MAX_TRACK_NAME_LENGTH: usize = 64;
const MAX_PLAYER_NAME_LENGTH: usize = 32;
const MAX_PLAYER_FILE_NAME_LENGTH: usize = 64;
const MAX_DRIVER_NAME_LENGTH: usize = 32;
const MAX_VEHICLE_NAME_LENGTH: usize = 64;
const MAX_VEHICLE_CLASS_LENGTH: usize = 32;

crate::record_layout! {
    pub mod scoring_info_v2 {
        TRACK_NAME: Str(64),
        SESSION: Int32,
        CURRENT_ET: Float32,
        END_ET: Float32,
        MAX_LAPS: Int32,
        LAP_DIST: Float32,
        RESULTS_STREAM: Bytes(4),
        NUM_VEHICLES: Int32,
        GAME_PHASE: Char,
        YELLOW_FLAG_STATE: Char,
        SECTOR_FLAGS: Bytes(3),
        START_LIGHT: Char,
        NUM_RED_LIGHTS: Char,
        IN_REALTIME: Bool,
        PLAYER_NAME: Str(32),
        PLAYER_FILE_NAME: Str(64),
        DARK_CLOUD: Float32,
        RAINING: Float32,
        AMBIENT_TEMP: Float32,
        TRACK_TEMP: Float32,
        WIND: Vec3,
        ON_PATH_WETNESS: Float32,
        OFF_PATH_WETNESS: Float32,
        EXPANSION: Bytes(256),
        VEHICLE: Bytes(4),
    }
}

crate::record_layout! {
    pub mod vehicle_scoring_info_v2 {
        DRIVER_NAME: Str(32),
        VEHICLE_NAME: Str(64),
        TOTAL_LAPS: Int16,
        SECTOR: Char,
        FINISH_STATUS: Char,
        LAP_DIST: Float32,
        PATH_LATERAL: Float32,
        TRACK_EDGE: Float32,
        BEST_SECTOR1: Float32,
        BEST_SECTOR2: Float32,
        BEST_LAP_TIME: Float32,
        LAST_SECTOR1: Float32,
        LAST_SECTOR2: Float32,
        LAST_LAP_TIME: Float32,
        CUR_SECTOR1: Float32,
        CUR_SECTOR2: Float32,
        NUM_PITSTOPS: Int16,
        NUM_PENALTIES: Int16,
        IS_PLAYER: Bool,
        CONTROL: Char,
        IN_PITS: Bool,
        PLACE: Char,
        VEHICLE_CLASS: Str(32),
        TIME_BEHIND_NEXT: Float32,
        LAPS_BEHIND_NEXT: Int32,
        TIME_BEHIND_LEADER: Float32,
        LAPS_BEHIND_LEADER: Int32,
        LAP_START_ET: Float32,
        POSITION: Vec3,
        LOCAL_VELOCITY: Vec3,
        LOCAL_ACCELERATION: Vec3,
        ORIENTATION_X: Vec3,
        ORIENTATION_Y: Vec3,
        ORIENTATION_Z: Vec3,
        LOCAL_ROTATION: Vec3,
        LOCAL_ROTATION_ACCELERATION: Vec3,
        EXPANSION: Bytes(128),
    }
}

/// rFactor 1 scoring format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rf1Scoring;

impl ScoringFormat for Rf1Scoring {
    fn header_fields(&self) -> Fields {
        scoring_info_v2::FIELDS
    }

    fn header_size(&self) -> usize {
        scoring_info_v2::SIZE
    }

    fn vehicle_fields(&self) -> Fields {
        vehicle_scoring_info_v2::FIELDS
    }

    fn vehicle_size(&self) -> usize {
        vehicle_scoring_info_v2::SIZE
    }

    fn vehicle_count(&self, header: FieldReader<'_>) -> usize {
        usize::try_from(header.read_i32(scoring_info_v2::NUM_VEHICLES)).unwrap_or(0)
    }

    fn decode_header(&self, r: FieldReader<'_>) -> ScoringSnapshot {
        use scoring_info_v2 as h;

        ScoringSnapshot {
            track_name: r.read_string(h::TRACK_NAME, MAX_TRACK_NAME_LENGTH),
            session_type: SessionType::from_raw(r.read_i32(h::SESSION)),
            session_time: r.read_f32(h::CURRENT_ET),
            end_time: r.read_f32(h::END_ET),
            max_laps: r.read_i32(h::MAX_LAPS),
            track_length: r.read_f32(h::LAP_DIST),
            num_vehicles: r.read_i32(h::NUM_VEHICLES),
            game_phase: GamePhase::from_raw(r.read_u8(h::GAME_PHASE)),
            yellow_flag_state: YellowFlagState::from_raw(r.read_i8(h::YELLOW_FLAG_STATE)),
            sector_flags: [
                r.read_i8(h::SECTOR_FLAGS),
                r.read_i8(h::SECTOR_FLAGS + 1),
                r.read_i8(h::SECTOR_FLAGS + 2),
            ],
            start_light: r.read_u8(h::START_LIGHT),
            num_red_lights: r.read_u8(h::NUM_RED_LIGHTS),
            in_realtime: r.read_bool(h::IN_REALTIME),
            player_name: r.read_string(h::PLAYER_NAME, MAX_PLAYER_NAME_LENGTH),
            player_file_name: r.read_string(h::PLAYER_FILE_NAME, MAX_PLAYER_FILE_NAME_LENGTH),
            cloud_darkness: r.read_f32(h::DARK_CLOUD),
            raining: r.read_f32(h::RAINING),
            ambient_temperature: r.read_f32(h::AMBIENT_TEMP),
            track_temperature: r.read_f32(h::TRACK_TEMP),
            wind: r.read_vec3(h::WIND),
            on_path_wetness: r.read_f32(h::ON_PATH_WETNESS),
            off_path_wetness: r.read_f32(h::OFF_PATH_WETNESS),
        }
    }

    fn decode_vehicle(&self, r: FieldReader<'_>) -> VehicleSnapshot {
        use vehicle_scoring_info_v2 as v;

        VehicleSnapshot {
            driver_name: r.read_string(v::DRIVER_NAME, MAX_DRIVER_NAME_LENGTH),
            vehicle_name: r.read_string(v::VEHICLE_NAME, MAX_VEHICLE_NAME_LENGTH),
            laps_completed: i32::from(r.read_i16(v::TOTAL_LAPS)),
            // The game reports sector 3 as 0.
            sector: match r.read_i8(v::SECTOR) {
                0 => 3,
                sector => sector,
            },
            finish_status: FinishStatus::from_raw(r.read_i8(v::FINISH_STATUS)),
            lap_distance: r.read_f32(v::LAP_DIST),
            path_lateral: r.read_f32(v::PATH_LATERAL),
            track_edge: r.read_f32(v::TRACK_EDGE),
            best_sector1: r.read_f32(v::BEST_SECTOR1),
            best_sector2: r.read_f32(v::BEST_SECTOR2),
            best_lap_time: r.read_f32(v::BEST_LAP_TIME),
            last_sector1: r.read_f32(v::LAST_SECTOR1),
            last_sector2: r.read_f32(v::LAST_SECTOR2),
            last_lap_time: r.read_f32(v::LAST_LAP_TIME),
            current_sector1: r.read_f32(v::CUR_SECTOR1),
            current_sector2: r.read_f32(v::CUR_SECTOR2),
            num_pitstops: r.read_i16(v::NUM_PITSTOPS),
            num_penalties: r.read_i16(v::NUM_PENALTIES),
            is_player: r.read_bool(v::IS_PLAYER),
            control: VehicleControl::from_raw(r.read_i8(v::CONTROL)),
            in_pits: r.read_bool(v::IN_PITS),
            place: r.read_u8(v::PLACE),
            vehicle_class: r.read_string(v::VEHICLE_CLASS, MAX_VEHICLE_CLASS_LENGTH),
            time_behind_next: r.read_f32(v::TIME_BEHIND_NEXT),
            laps_behind_next: r.read_i32(v::LAPS_BEHIND_NEXT),
            time_behind_leader: r.read_f32(v::TIME_BEHIND_LEADER),
            laps_behind_leader: r.read_i32(v::LAPS_BEHIND_LEADER),
            lap_start_time: r.read_f32(v::LAP_START_ET),
            world_position: r.read_vec3(v::POSITION),
            local_velocity: r.read_vec3(v::LOCAL_VELOCITY),
            local_acceleration: r.read_vec3(v::LOCAL_ACCELERATION),
            orientation: [
                r.read_vec3(v::ORIENTATION_X),
                r.read_vec3(v::ORIENTATION_Y),
                r.read_vec3(v::ORIENTATION_Z),
            ],
            local_rotation: r.read_vec3(v::LOCAL_ROTATION),
            local_rotation_acceleration: r.read_vec3(v::LOCAL_ROTATION_ACCELERATION),
        }
    }

    fn encode(&self, header: &ScoringSnapshot, vehicles: &[VehicleSnapshot]) -> Vec<u8> {
        use scoring_info_v2 as h;
        use vehicle_scoring_info_v2 as v;

        let mut enc = RecordEncoder::new(h::SIZE);
        enc.put_string(h::TRACK_NAME, MAX_TRACK_NAME_LENGTH, &header.track_name)
            .put_i32(h::SESSION, header.session_type.to_raw())
            .put_f32(h::CURRENT_ET, header.session_time)
            .put_f32(h::END_ET, header.end_time)
            .put_i32(h::MAX_LAPS, header.max_laps)
            .put_f32(h::LAP_DIST, header.track_length)
            .put_i32(h::NUM_VEHICLES, vehicles.len() as i32)
            .put_u8(h::GAME_PHASE, game_phase_raw(header.game_phase))
            .put_i8(h::YELLOW_FLAG_STATE, yellow_flag_raw(header.yellow_flag_state))
            .put_i8(h::SECTOR_FLAGS, header.sector_flags[0])
            .put_i8(h::SECTOR_FLAGS + 1, header.sector_flags[1])
            .put_i8(h::SECTOR_FLAGS + 2, header.sector_flags[2])
            .put_u8(h::START_LIGHT, header.start_light)
            .put_u8(h::NUM_RED_LIGHTS, header.num_red_lights)
            .put_bool(h::IN_REALTIME, header.in_realtime)
            .put_string(h::PLAYER_NAME, MAX_PLAYER_NAME_LENGTH, &header.player_name)
            .put_string(h::PLAYER_FILE_NAME, MAX_PLAYER_FILE_NAME_LENGTH, &header.player_file_name)
            .put_f32(h::DARK_CLOUD, header.cloud_darkness)
            .put_f32(h::RAINING, header.raining)
            .put_f32(h::AMBIENT_TEMP, header.ambient_temperature)
            .put_f32(h::TRACK_TEMP, header.track_temperature)
            .put_vec3(h::WIND, header.wind)
            .put_f32(h::ON_PATH_WETNESS, header.on_path_wetness)
            .put_f32(h::OFF_PATH_WETNESS, header.off_path_wetness);

        let mut out = enc.into_bytes();
        out.reserve(vehicles.len() * v::SIZE);

        for vehicle in vehicles {
            let mut enc = RecordEncoder::new(v::SIZE);
            enc.put_string(v::DRIVER_NAME, MAX_DRIVER_NAME_LENGTH, &vehicle.driver_name)
                .put_string(v::VEHICLE_NAME, MAX_VEHICLE_NAME_LENGTH, &vehicle.vehicle_name)
                .put_i16(v::TOTAL_LAPS, vehicle.laps_completed as i16)
                .put_i8(v::SECTOR, if vehicle.sector == 3 { 0 } else { vehicle.sector })
                .put_i8(v::FINISH_STATUS, finish_status_raw(vehicle.finish_status))
                .put_f32(v::LAP_DIST, vehicle.lap_distance)
                .put_f32(v::PATH_LATERAL, vehicle.path_lateral)
                .put_f32(v::TRACK_EDGE, vehicle.track_edge)
                .put_f32(v::BEST_SECTOR1, vehicle.best_sector1)
                .put_f32(v::BEST_SECTOR2, vehicle.best_sector2)
                .put_f32(v::BEST_LAP_TIME, vehicle.best_lap_time)
                .put_f32(v::LAST_SECTOR1, vehicle.last_sector1)
                .put_f32(v::LAST_SECTOR2, vehicle.last_sector2)
                .put_f32(v::LAST_LAP_TIME, vehicle.last_lap_time)
                .put_f32(v::CUR_SECTOR1, vehicle.current_sector1)
                .put_f32(v::CUR_SECTOR2, vehicle.current_sector2)
                .put_i16(v::NUM_PITSTOPS, vehicle.num_pitstops)
                .put_i16(v::NUM_PENALTIES, vehicle.num_penalties)
                .put_bool(v::IS_PLAYER, vehicle.is_player)
                .put_i8(v::CONTROL, vehicle.control.to_raw())
                .put_bool(v::IN_PITS, vehicle.in_pits)
                .put_u8(v::PLACE, vehicle.place)
                .put_string(v::VEHICLE_CLASS, MAX_VEHICLE_CLASS_LENGTH, &vehicle.vehicle_class)
                .put_f32(v::TIME_BEHIND_NEXT, vehicle.time_behind_next)
                .put_i32(v::LAPS_BEHIND_NEXT, vehicle.laps_behind_next)
                .put_f32(v::TIME_BEHIND_LEADER, vehicle.time_behind_leader)
                .put_i32(v::LAPS_BEHIND_LEADER, vehicle.laps_behind_leader)
                .put_f32(v::LAP_START_ET, vehicle.lap_start_time)
                .put_vec3(v::POSITION, vehicle.world_position)
                .put_vec3(v::LOCAL_VELOCITY, vehicle.local_velocity)
                .put_vec3(v::LOCAL_ACCELERATION, vehicle.local_acceleration)
                .put_vec3(v::ORIENTATION_X, vehicle.orientation[0])
                .put_vec3(v::ORIENTATION_Y, vehicle.orientation[1])
                .put_vec3(v::ORIENTATION_Z, vehicle.orientation[2])
                .put_vec3(v::LOCAL_ROTATION, vehicle.local_rotation)
                .put_vec3(v::LOCAL_ROTATION_ACCELERATION, vehicle.local_rotation_acceleration);
            out.extend_from_slice(enc.as_bytes());
        }

        out
    }

    fn default_payload(&self) -> &'static [u8] {
        static PAYLOAD: OnceLock<Vec<u8>> = OnceLock::new();
        PAYLOAD.get_or_init(|| {
            let (header, vehicles) = default_field();
            self.encode(&header, &vehicles)
        })
    }
}

fn game_phase_raw(phase: GamePhase) -> u8 {
    match phase {
        GamePhase::BeforeSessionHasBegun => 0,
        GamePhase::ReconnaissanceLaps => 1,
        GamePhase::GridWalkThrough => 2,
        GamePhase::FormationLap => 3,
        GamePhase::StartingLightCountdownHasBegun => 4,
        GamePhase::GreenFlag => 5,
        GamePhase::FullCourseYellow => 6,
        GamePhase::SessionStopped => 7,
        GamePhase::SessionOver => 8,
        GamePhase::Unknown => u8::MAX,
    }
}

fn yellow_flag_raw(state: YellowFlagState) -> i8 {
    match state {
        YellowFlagState::Invalid => -1,
        YellowFlagState::NoFlag => 0,
        YellowFlagState::Pending => 1,
        YellowFlagState::PitClosed => 2,
        YellowFlagState::PitLeadLap => 3,
        YellowFlagState::PitOpen => 4,
        YellowFlagState::LastLap => 5,
        YellowFlagState::Resume => 6,
        YellowFlagState::RaceHalt => 7,
    }
}

fn finish_status_raw(status: FinishStatus) -> i8 {
    match status {
        FinishStatus::None => 0,
        FinishStatus::Finished => 1,
        FinishStatus::Dnf => 2,
        FinishStatus::Dq => 3,
    }
}

const DEFAULT_DRIVERS: [&str; 22] = [
    "Marco Venturi",
    "Lukas Brenner",
    "Tomas Lindqvist",
    "Player",
    "Henri Dubois",
    "Kenji Arakawa",
    "Diego Salcedo",
    "Oliver Hart",
    "Pavel Nowak",
    "Ruben Costa",
    "Jonas Meier",
    "Felipe Arruda",
    "Sami Koskinen",
    "Bastian Roth",
    "Aidan Doyle",
    "Matteo Conti",
    "Yuki Tanabe",
    "Emil Strand",
    "Victor Lemaire",
    "Nico Albers",
    "Ivan Petrov",
    "Carlos Mena",
];

const TRACK_LENGTH: f32 = 5793.0;
const LAST_SECTORS: (f32, f32, f32) = (28.412, 57.903, 84.267);

/// The editor's default field: a race on lap 8.
fn default_field() -> (ScoringSnapshot, Vec<VehicleSnapshot>) {
    let header = ScoringSnapshot {
        track_name: "Autodromo Nazionale".to_string(),
        session_type: SessionType::Race,
        session_time: 692.4,
        end_time: 7200.0,
        max_laps: 53,
        track_length: TRACK_LENGTH,
        num_vehicles: DEFAULT_DRIVERS.len() as i32,
        game_phase: GamePhase::GreenFlag,
        yellow_flag_state: YellowFlagState::NoFlag,
        sector_flags: [0, 0, 0],
        start_light: 0,
        num_red_lights: 5,
        in_realtime: true,
        player_name: "Player".to_string(),
        player_file_name: "Player".to_string(),
        cloud_darkness: 0.1,
        raining: 0.0,
        ambient_temperature: 24.0,
        track_temperature: 31.0,
        wind: Vector3::new(1.2, 0.0, -0.4),
        on_path_wetness: 0.0,
        off_path_wetness: 0.0,
    };

    let vehicles = DEFAULT_DRIVERS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let gap = i as f32 * 1.874;
            let laps_down = i32::from(i >= 18);
            let lap_distance = (4120.0 - i as f32 * 96.0).rem_euclid(TRACK_LENGTH);
            let in_pits = i == 16;
            let (s1, s2, lap) = LAST_SECTORS;
            let drift = i as f32 * 0.071;

            VehicleSnapshot {
                driver_name: (*name).to_string(),
                vehicle_name: format!("Team {} #{}", (b'A' + (i / 2) as u8) as char, i + 1),
                laps_completed: 7 - laps_down,
                sector: if lap_distance > 3900.0 { 3 } else { 2 },
                finish_status: FinishStatus::None,
                lap_distance,
                path_lateral: 0.0,
                track_edge: 5.5,
                best_sector1: s1 - 0.120 + drift,
                best_sector2: s2 - 0.310 + drift * 2.0,
                best_lap_time: lap - 0.480 + drift * 3.0,
                last_sector1: s1 + drift,
                last_sector2: s2 + drift * 2.0,
                last_lap_time: lap + drift * 3.0,
                current_sector1: s1 + 0.090 + drift,
                current_sector2: if lap_distance > 3900.0 { s2 + 0.2 + drift * 2.0 } else { 0.0 },
                num_pitstops: i16::from(in_pits),
                num_penalties: 0,
                is_player: i == 3,
                control: if i == 3 { VehicleControl::LocalPlayer } else { VehicleControl::LocalAi },
                in_pits,
                place: (i + 1) as u8,
                vehicle_class: "F1 2006".to_string(),
                time_behind_next: if i == 0 { 0.0 } else { 1.874 },
                laps_behind_next: i32::from(i == 18),
                time_behind_leader: gap,
                laps_behind_leader: laps_down,
                lap_start_time: 692.4 - 48.0 - gap,
                world_position: Vector3::new(-300.0 + i as f32 * 14.0, 2.0, 780.0 - i as f32 * 31.0),
                local_velocity: if in_pits {
                    Vector3::ZERO
                } else {
                    Vector3::new(0.0, 0.0, -(61.7 - i as f32 * 0.3))
                },
                local_acceleration: Vector3::ZERO,
                orientation: [
                    Vector3::new(1.0, 0.0, 0.0),
                    Vector3::new(0.0, 1.0, 0.0),
                    Vector3::new(0.0, 0.0, 1.0),
                ],
                local_rotation: Vector3::ZERO,
                local_rotation_acceleration: Vector3::ZERO,
            }
        })
        .collect();

    (header, vehicles)
}
