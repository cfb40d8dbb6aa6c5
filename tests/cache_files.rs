//! Cache files written by hand or by older versions, read through a full
//! session start.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use pitboard::cache::CACHE_VERSION;
use pitboard::game::ScoringFormat;
use pitboard::game::rfactor1;
use pitboard::scoring::{ScoringSnapshot, VehicleSnapshot};
use pitboard::{CacheLocation, DataCache, DataSource, GameData, PluginConfig, SessionType};

const TRACK: &str = "Sebring";
const TEAM: &str = "Falcon Motorsport #44";

fn config(folder: &Path) -> PluginConfig {
    PluginConfig { cache_folder: Some(folder.to_path_buf()), mod_name: "GTR".to_string(), ..PluginConfig::default() }
}

fn cache_file(folder: &Path) -> std::path::PathBuf {
    CacheLocation::new(folder, "GTR").file_for(TRACK)
}

fn write_cache(folder: &Path, xml: &str) {
    let path = cache_file(folder);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, xml).unwrap();
}

/// Scoring for a lone player, then a session start so the cache is read
/// with the player's team known.
fn start_alone(config: &PluginConfig) -> GameData {
    let header = ScoringSnapshot {
        track_name: TRACK.to_string(),
        session_type: SessionType::Practice1,
        track_length: 6019.0,
        ..ScoringSnapshot::default()
    };
    let player = VehicleSnapshot {
        driver_name: "Kim".to_string(),
        vehicle_name: TEAM.to_string(),
        vehicle_class: "GT2".to_string(),
        is_player: true,
        place: 1,
        ..VehicleSnapshot::default()
    };

    let mut game = GameData::new(config).unwrap();
    let bytes = rfactor1::SCORING.encode(&header, &[player]);
    game.update_scoring(&mut DataSource::Stream(&mut Cursor::new(bytes)), 0).unwrap();
    game.on_session_started(false);
    game
}

#[test]
fn hand_written_file_seeds_fuel_and_fastest_lap() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(
        dir.path(),
        r#"<CachedData version="1.2.0">
  <VehicleData vehicle="Falcon Motorsport #44">
    <FuelUsage average="4.12"/>
    <FastestLap type="NORMAL" sector1="36.1" sector2="41.7" sector3="39.9" lap="117.7"/>
  </VehicleData>
  <VehicleData vehicle="Someone Else">
    <FuelUsage average="2.5"/>
  </VehicleData>
</CachedData>"#,
    );

    let game = start_alone(&config(dir.path()));

    assert!((game.telemetry().fuel_usage_average() - 4.12).abs() < 1e-5);
    let lap = game.scoring().cached_player_laptime(false).unwrap();
    assert_eq!(lap.lap_time, 117.7);
    assert_eq!(lap.sector2, 41.7);
    assert!(game.scoring().cached_player_laptime(true).is_none());
    assert_eq!(game.cache().fuel_usage("Someone Else"), Some(2.5));
}

#[test]
fn malformed_values_only_drop_themselves() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(
        dir.path(),
        r#"<CachedData version="1.1">
  <VehicleData vehicle="Falcon Motorsport #44">
    <FuelUsage average="lots"/>
    <FastestLap type="NORMAL" sector1="36.1" sector2="?" sector3="39.9" lap="117.7"/>
    <FastestLap type="HOTLAP" sector1="35.0" sector2="41.0" sector3="39.0" lap="115.0"/>
  </VehicleData>
</CachedData>"#,
    );

    let game = start_alone(&config(dir.path()));

    assert_eq!(game.telemetry().fuel_usage_average(), -1.0);
    assert!(game.cache().fastest_laptime(TEAM, false).is_none());
    assert_eq!(game.cache().fastest_laptime(TEAM, true).map(|l| l.lap_time), Some(115.0));
}

#[test]
fn newer_file_is_ignored_whole() {
    let dir = tempfile::tempdir().unwrap();
    let [major, ..] = CACHE_VERSION;
    write_cache(
        dir.path(),
        &format!(
            r#"<CachedData version="{}.0.0">
  <VehicleData vehicle="Falcon Motorsport #44"><FuelUsage average="4.12"/></VehicleData>
</CachedData>"#,
            major + 1
        ),
    );

    let game = start_alone(&config(dir.path()));

    assert!(game.cache().is_empty());
    assert_eq!(game.telemetry().fuel_usage_average(), -1.0);

    let mut cache = DataCache::new();
    assert!(cache.load_file(&cache_file(dir.path())).is_err());
}

#[test]
fn broken_xml_is_reported_and_leaves_the_session_usable() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), r#"<CachedData version="1.2.0"><VehicleData vehicle="x"></FuelUsage></CachedData>"#);

    let game = start_alone(&config(dir.path()));
    assert!(game.cache().is_empty());
    assert_eq!(game.player_team(), Some(TEAM));

    let mut cache = DataCache::new();
    assert!(cache.load_file(&cache_file(dir.path())).is_err());
}

#[test]
fn stored_file_is_sorted_and_versioned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("Sebring.xml");

    let mut cache = DataCache::new();
    cache.set_fuel_usage("Zulu", 3.0);
    cache.set_fuel_usage("Alpha", 2.0);
    cache.store_file(&path).unwrap();

    let xml = fs::read_to_string(&path).unwrap();
    assert!(xml.contains(r#"version="1.2.0""#));
    let alpha = xml.find("Alpha").unwrap();
    let zulu = xml.find("Zulu").unwrap();
    assert!(alpha < zulu);

    let mut reloaded = DataCache::new();
    assert_eq!(reloaded.load_file(&path).unwrap(), 2);
    assert_eq!(reloaded.fuel_usage("Zulu"), Some(3.0));
}
