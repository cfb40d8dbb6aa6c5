//! Recording a session to a capture and replaying it into a fresh
//! `GameData` reproduces the same records.

use std::io::Cursor;
use std::path::Path;

use pitboard::capture::{CaptureReader, CaptureWriter};
use pitboard::game::rfactor1;
use pitboard::game::{ScoringFormat, TelemetryFormat};
use pitboard::scoring::{ScoringSnapshot, VehicleSnapshot};
use pitboard::telemetry::TelemetrySnapshot;
use pitboard::{DataSource, Driver, GameData, GameVersion, PluginConfig, SessionType, Vector3, VersionedRecord};

const SECOND: i64 = 1_000_000_000;

fn header() -> ScoringSnapshot {
    ScoringSnapshot {
        track_name: "Mugello".to_string(),
        session_type: SessionType::Practice1,
        end_time: 3600.0,
        track_length: 5245.0,
        in_realtime: true,
        ..ScoringSnapshot::default()
    }
}

fn vehicle(name: &str, place: u8, laps: i32, is_player: bool) -> VehicleSnapshot {
    VehicleSnapshot {
        driver_name: name.to_string(),
        vehicle_name: format!("{name} #{place}"),
        vehicle_class: "F3".to_string(),
        laps_completed: laps,
        place,
        is_player,
        lap_distance: 2000.0 + f32::from(place) * 10.0,
        last_sector1: if laps > 0 { 31.2 } else { -1.0 },
        last_sector2: if laps > 0 { 70.4 } else { -1.0 },
        last_lap_time: if laps > 0 { 104.0 - laps as f32 * 0.3 } else { -1.0 },
        local_velocity: Vector3::new(0.0, 0.0, -55.0),
        ..VehicleSnapshot::default()
    }
}

fn start(game: &mut GameData) {
    game.on_session_started(false);
    game.on_realtime_entered();
    game.on_cockpit_entered();
}

/// Drive six ticks, capturing each record right after its update.
fn record_session(path: &Path) -> GameData {
    let mut game = GameData::new(&PluginConfig::default()).unwrap();
    start(&mut game);
    let mut writer = CaptureWriter::create(path, 100, GameVersion::RFactor1).unwrap();

    for tick in 0..6i64 {
        let timestamp = tick * SECOND;
        let laps = tick as i32 / 2;

        let telemetry = rfactor1::TELEMETRY.encode(&TelemetrySnapshot {
            fuel: 80.0 - tick as f32 * 1.7,
            gear: 4,
            engine_rpm: 9000.0,
            ..TelemetrySnapshot::default()
        });
        game.update_telemetry(&mut DataSource::Stream(&mut Cursor::new(telemetry)), timestamp).unwrap();
        writer.write_record(game.telemetry()).unwrap();

        let scoring = rfactor1::SCORING.encode(
            &header(),
            &[vehicle("Rossi", 1, laps + 1, false), vehicle("Biaggi", 2, laps, true)],
        );
        game.update_scoring(&mut DataSource::Stream(&mut Cursor::new(scoring)), timestamp).unwrap();
        writer.write_record(game.scoring()).unwrap();
    }

    writer.finish().unwrap();
    game
}

fn assert_same_records(recorded: &GameData, replayed: &GameData) {
    assert_eq!(replayed.telemetry().snapshot(), recorded.telemetry().snapshot());
    assert_eq!(replayed.scoring().snapshot(), recorded.scoring().snapshot());
    assert_eq!(
        replayed.scoring().update_state().update_id(),
        recorded.scoring().update_state().update_id()
    );

    let (a, b) = (recorded.scoring().player().unwrap(), replayed.scoring().player().unwrap());
    assert_eq!(b.driver_name(), "Biaggi");
    assert_eq!(b.laps_completed(), a.laps_completed());
    assert_eq!(b.laptimes(), a.laptimes());
    assert_eq!(b.stint_length(), a.stint_length());
    assert_eq!(b.place(true), a.place(true));

    assert_eq!(replayed.telemetry().fuel_usage_average(), recorded.telemetry().fuel_usage_average());
}

#[test]
fn capture_applied_packet_by_packet_matches_the_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mugello.pbcap");
    let recorded = record_session(&path);

    let mut reader = CaptureReader::open(&path).unwrap();
    assert_eq!(reader.header().game, GameVersion::RFactor1);
    let packets = reader.read_all().unwrap();
    assert_eq!(packets.len(), 12);

    let mut replayed = GameData::new(&PluginConfig::default()).unwrap();
    start(&mut replayed);
    for packet in &packets {
        replayed.apply_packet(packet).unwrap();
    }

    assert_same_records(&recorded, &replayed);
    assert!(recorded.telemetry().fuel_usage_average() > 0.0);
}

#[tokio::test]
async fn replay_through_the_driver_matches_the_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mugello.pbcap");
    let recorded = record_session(&path);

    let mut replayed = GameData::new(&PluginConfig::default()).unwrap();
    start(&mut replayed);
    let stats = Driver::replay_file(&path, &mut replayed, 10.0).await.unwrap();

    assert_eq!(stats.applied, 12);
    assert_eq!(stats.failed, 0);
    assert_same_records(&recorded, &replayed);
}

#[tokio::test(start_paused = true)]
async fn a_truncated_capture_keeps_the_packets_before_the_cut() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mugello.pbcap");
    record_session(&path);

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 100);
    std::fs::write(&path, bytes).unwrap();

    let mut replayed = GameData::new(&PluginConfig::default()).unwrap();
    start(&mut replayed);
    let stats = Driver::replay_file(&path, &mut replayed, 10.0).await.unwrap();

    assert_eq!(stats.applied, 11);
    assert_eq!(replayed.scoring().update_state().update_id(), 5);
}
