//! `TelemInfoV2` / `TelemWheelV2`.

use std::sync::OnceLock;

use crate::game::{Fields, TelemetryFormat};
use crate::telemetry::{TelemetrySnapshot, WheelSnapshot};
use crate::types::{FieldReader, RecordEncoder, Vector3};

const MAX_NAME_LENGTH: usize = 64;
const MAX_TERRAIN_NAME_LENGTH: usize = 16;

crate::record_layout! {
    /// One wheel. The trailing byte is the compiler's 4-byte padding.
    pub mod wheel_v2 {
        ROTATION: Float32,
        SUSPENSION_DEFLECTION: Float32,
        RIDE_HEIGHT: Float32,
        TIRE_LOAD: Float32,
        LATERAL_FORCE: Float32,
        GRIP_FRACTION: Float32,
        BRAKE_TEMP: Float32,
        PRESSURE: Float32,
        TEMPERATURES: Bytes(12),
        WEAR: Float32,
        TERRAIN_NAME: Str(16),
        SURFACE_TYPE: Char,
        FLAT: Bool,
        DETACHED: Bool,
        EXPANSION: Bytes(32),
        PADDING: Bytes(1),
    }
}

crate::record_layout! {
    /// Player telemetry, packed to 4 bytes like the game's header.
    pub mod telem_info_v2 {
        DELTA_TIME: Float32,
        LAP_NUMBER: Int32,
        LAP_START_ET: Float32,
        VEHICLE_NAME: Str(64),
        TRACK_NAME: Str(64),
        POSITION: Vec3,
        LOCAL_VELOCITY: Vec3,
        LOCAL_ACCELERATION: Vec3,
        ORIENTATION_X: Vec3,
        ORIENTATION_Y: Vec3,
        ORIENTATION_Z: Vec3,
        LOCAL_ROTATION: Vec3,
        LOCAL_ROTATION_ACCELERATION: Vec3,
        GEAR: Int32,
        ENGINE_RPM: Float32,
        ENGINE_WATER_TEMP: Float32,
        ENGINE_OIL_TEMP: Float32,
        CLUTCH_RPM: Float32,
        UNFILTERED_THROTTLE: Float32,
        UNFILTERED_BRAKE: Float32,
        UNFILTERED_STEERING: Float32,
        UNFILTERED_CLUTCH: Float32,
        STEERING_ARM_FORCE: Float32,
        FUEL: Float32,
        ENGINE_MAX_RPM: Float32,
        SCHEDULED_STOPS: Char,
        OVERHEATING: Bool,
        DETACHED: Bool,
        DENT_SEVERITY: Bytes(8),
        PADDING: Bytes(1),
        LAST_IMPACT_ET: Float32,
        LAST_IMPACT_MAGNITUDE: Float32,
        LAST_IMPACT_POSITION: Vec3,
        EXPANSION: Bytes(64),
        WHEELS: Bytes(4 * wheel_v2::SIZE),
    }
}

/// rFactor 1 telemetry format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rf1Telemetry;

fn decode_wheel(r: FieldReader<'_>) -> WheelSnapshot {
    use wheel_v2 as w;

    WheelSnapshot {
        rotation: r.read_f32(w::ROTATION),
        suspension_deflection: r.read_f32(w::SUSPENSION_DEFLECTION),
        ride_height: r.read_f32(w::RIDE_HEIGHT),
        tire_load: r.read_f32(w::TIRE_LOAD),
        lateral_force: r.read_f32(w::LATERAL_FORCE),
        grip_fraction: r.read_f32(w::GRIP_FRACTION),
        brake_temperature: r.read_f32(w::BRAKE_TEMP),
        pressure: r.read_f32(w::PRESSURE),
        temperatures: [
            r.read_f32(w::TEMPERATURES),
            r.read_f32(w::TEMPERATURES + 4),
            r.read_f32(w::TEMPERATURES + 8),
        ],
        wear: r.read_f32(w::WEAR),
        terrain_name: r.read_string(w::TERRAIN_NAME, MAX_TERRAIN_NAME_LENGTH),
        surface_type: r.read_u8(w::SURFACE_TYPE),
        flat: r.read_bool(w::FLAT),
        detached: r.read_bool(w::DETACHED),
    }
}

fn encode_wheel(enc: &mut RecordEncoder, base: usize, wheel: &WheelSnapshot) {
    use wheel_v2 as w;

    enc.put_f32(base + w::ROTATION, wheel.rotation)
        .put_f32(base + w::SUSPENSION_DEFLECTION, wheel.suspension_deflection)
        .put_f32(base + w::RIDE_HEIGHT, wheel.ride_height)
        .put_f32(base + w::TIRE_LOAD, wheel.tire_load)
        .put_f32(base + w::LATERAL_FORCE, wheel.lateral_force)
        .put_f32(base + w::GRIP_FRACTION, wheel.grip_fraction)
        .put_f32(base + w::BRAKE_TEMP, wheel.brake_temperature)
        .put_f32(base + w::PRESSURE, wheel.pressure)
        .put_f32(base + w::TEMPERATURES, wheel.temperatures[0])
        .put_f32(base + w::TEMPERATURES + 4, wheel.temperatures[1])
        .put_f32(base + w::TEMPERATURES + 8, wheel.temperatures[2])
        .put_f32(base + w::WEAR, wheel.wear)
        .put_string(base + w::TERRAIN_NAME, MAX_TERRAIN_NAME_LENGTH, &wheel.terrain_name)
        .put_u8(base + w::SURFACE_TYPE, wheel.surface_type)
        .put_bool(base + w::FLAT, wheel.flat)
        .put_bool(base + w::DETACHED, wheel.detached);
}

impl TelemetryFormat for Rf1Telemetry {
    fn fields(&self) -> Fields {
        telem_info_v2::FIELDS
    }

    fn size(&self) -> usize {
        telem_info_v2::SIZE
    }

    fn decode(&self, r: FieldReader<'_>) -> TelemetrySnapshot {
        use telem_info_v2 as t;

        let mut dent_severity = [0u8; 8];
        dent_severity.copy_from_slice(r.read_bytes(t::DENT_SEVERITY, 8));

        TelemetrySnapshot {
            delta_time: r.read_f32(t::DELTA_TIME),
            lap_number: r.read_i32(t::LAP_NUMBER),
            lap_start_time: r.read_f32(t::LAP_START_ET),
            vehicle_name: r.read_string(t::VEHICLE_NAME, MAX_NAME_LENGTH),
            track_name: r.read_string(t::TRACK_NAME, MAX_NAME_LENGTH),
            position: r.read_vec3(t::POSITION),
            local_velocity: r.read_vec3(t::LOCAL_VELOCITY),
            local_acceleration: r.read_vec3(t::LOCAL_ACCELERATION),
            orientation: [
                r.read_vec3(t::ORIENTATION_X),
                r.read_vec3(t::ORIENTATION_Y),
                r.read_vec3(t::ORIENTATION_Z),
            ],
            local_rotation: r.read_vec3(t::LOCAL_ROTATION),
            local_rotation_acceleration: r.read_vec3(t::LOCAL_ROTATION_ACCELERATION),
            gear: r.read_i32(t::GEAR),
            engine_rpm: r.read_f32(t::ENGINE_RPM),
            engine_water_temperature: r.read_f32(t::ENGINE_WATER_TEMP),
            engine_oil_temperature: r.read_f32(t::ENGINE_OIL_TEMP),
            clutch_rpm: r.read_f32(t::CLUTCH_RPM),
            unfiltered_throttle: r.read_f32(t::UNFILTERED_THROTTLE),
            unfiltered_brake: r.read_f32(t::UNFILTERED_BRAKE),
            unfiltered_steering: r.read_f32(t::UNFILTERED_STEERING),
            unfiltered_clutch: r.read_f32(t::UNFILTERED_CLUTCH),
            steering_arm_force: r.read_f32(t::STEERING_ARM_FORCE),
            fuel: r.read_f32(t::FUEL),
            engine_max_rpm: r.read_f32(t::ENGINE_MAX_RPM),
            scheduled_stops: r.read_u8(t::SCHEDULED_STOPS),
            overheating: r.read_bool(t::OVERHEATING),
            detached: r.read_bool(t::DETACHED),
            dent_severity,
            last_impact_time: r.read_f32(t::LAST_IMPACT_ET),
            last_impact_magnitude: r.read_f32(t::LAST_IMPACT_MAGNITUDE),
            last_impact_position: r.read_vec3(t::LAST_IMPACT_POSITION),
            wheels: std::array::from_fn(|i| {
                decode_wheel(r.at(t::WHEELS + i * wheel_v2::SIZE, wheel_v2::SIZE))
            }),
        }
    }

    fn encode(&self, s: &TelemetrySnapshot) -> Vec<u8> {
        use telem_info_v2 as t;

        let mut enc = RecordEncoder::new(t::SIZE);
        enc.put_f32(t::DELTA_TIME, s.delta_time)
            .put_i32(t::LAP_NUMBER, s.lap_number)
            .put_f32(t::LAP_START_ET, s.lap_start_time)
            .put_string(t::VEHICLE_NAME, MAX_NAME_LENGTH, &s.vehicle_name)
            .put_string(t::TRACK_NAME, MAX_NAME_LENGTH, &s.track_name)
            .put_vec3(t::POSITION, s.position)
            .put_vec3(t::LOCAL_VELOCITY, s.local_velocity)
            .put_vec3(t::LOCAL_ACCELERATION, s.local_acceleration)
            .put_vec3(t::ORIENTATION_X, s.orientation[0])
            .put_vec3(t::ORIENTATION_Y, s.orientation[1])
            .put_vec3(t::ORIENTATION_Z, s.orientation[2])
            .put_vec3(t::LOCAL_ROTATION, s.local_rotation)
            .put_vec3(t::LOCAL_ROTATION_ACCELERATION, s.local_rotation_acceleration)
            .put_i32(t::GEAR, s.gear)
            .put_f32(t::ENGINE_RPM, s.engine_rpm)
            .put_f32(t::ENGINE_WATER_TEMP, s.engine_water_temperature)
            .put_f32(t::ENGINE_OIL_TEMP, s.engine_oil_temperature)
            .put_f32(t::CLUTCH_RPM, s.clutch_rpm)
            .put_f32(t::UNFILTERED_THROTTLE, s.unfiltered_throttle)
            .put_f32(t::UNFILTERED_BRAKE, s.unfiltered_brake)
            .put_f32(t::UNFILTERED_STEERING, s.unfiltered_steering)
            .put_f32(t::UNFILTERED_CLUTCH, s.unfiltered_clutch)
            .put_f32(t::STEERING_ARM_FORCE, s.steering_arm_force)
            .put_f32(t::FUEL, s.fuel)
            .put_f32(t::ENGINE_MAX_RPM, s.engine_max_rpm)
            .put_u8(t::SCHEDULED_STOPS, s.scheduled_stops)
            .put_bool(t::OVERHEATING, s.overheating)
            .put_bool(t::DETACHED, s.detached)
            .put_bytes(t::DENT_SEVERITY, &s.dent_severity)
            .put_f32(t::LAST_IMPACT_ET, s.last_impact_time)
            .put_f32(t::LAST_IMPACT_MAGNITUDE, s.last_impact_magnitude)
            .put_vec3(t::LAST_IMPACT_POSITION, s.last_impact_position);

        for (i, wheel) in s.wheels.iter().enumerate() {
            encode_wheel(&mut enc, t::WHEELS + i * wheel_v2::SIZE, wheel);
        }

        enc.into_bytes()
    }

    fn default_payload(&self) -> &'static [u8] {
        static PAYLOAD: OnceLock<Vec<u8>> = OnceLock::new();
        PAYLOAD.get_or_init(|| self.encode(&default_snapshot()))
    }
}

fn default_wheel(front: bool) -> WheelSnapshot {
    WheelSnapshot {
        rotation: -171.3,
        suspension_deflection: if front { 0.021 } else { 0.027 },
        ride_height: if front { 0.034 } else { 0.052 },
        tire_load: if front { 3120.0 } else { 3890.0 },
        lateral_force: 0.0,
        grip_fraction: 0.92,
        brake_temperature: if front { 512.0 } else { 448.0 },
        pressure: 131.0,
        temperatures: if front { [366.2, 369.8, 367.1] } else { [371.5, 374.0, 372.4] },
        wear: if front { 0.94 } else { 0.91 },
        terrain_name: "ROAD".to_string(),
        surface_type: 0,
        flat: false,
        detached: false,
    }
}

fn default_snapshot() -> TelemetrySnapshot {
    TelemetrySnapshot {
        delta_time: 0.01,
        lap_number: 5,
        lap_start_time: 366.21,
        vehicle_name: "Team B #4".to_string(),
        track_name: "Autodromo Nazionale".to_string(),
        position: Vector3::new(-212.4, 2.1, 845.9),
        local_velocity: Vector3::new(0.4, 0.0, -61.7),
        local_acceleration: Vector3::new(3.2, 0.0, -1.1),
        orientation: [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ],
        local_rotation: Vector3::ZERO,
        local_rotation_acceleration: Vector3::ZERO,
        gear: 5,
        engine_rpm: 16_840.0,
        engine_water_temperature: 92.5,
        engine_oil_temperature: 104.3,
        clutch_rpm: 16_840.0,
        unfiltered_throttle: 1.0,
        unfiltered_brake: 0.0,
        unfiltered_steering: -0.04,
        unfiltered_clutch: 0.0,
        steering_arm_force: 412.0,
        fuel: 61.3,
        engine_max_rpm: 19_000.0,
        scheduled_stops: 2,
        overheating: false,
        detached: false,
        dent_severity: [0, 0, 1, 0, 0, 0, 0, 0],
        last_impact_time: 211.7,
        last_impact_magnitude: 312.5,
        last_impact_position: Vector3::new(0.8, 0.2, -1.9),
        wheels: [default_wheel(true), default_wheel(true), default_wheel(false), default_wheel(false)],
    }
}
