//! On-disk cache of fastest laps and fuel usage per vehicle.
//!
//! One XML file per mod and track lives at
//! `<cache folder>/data/<mod>/<track>.xml`. Entries are keyed by vehicle
//! (team) name. Loading failures of any kind are logged and leave the cache
//! empty; a failed store is logged and otherwise ignored.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::registry::DriverId;
use crate::scoring::{Laptime, is_cacheable_session, lap_type_for_session};
use crate::types::{LapType, SessionType};
use crate::{Result, TelemetryError};

mod format;

pub use format::{CACHE_VERSION, check_version};

use format::{CachedData, FastestLap, FuelUsage, VehicleData};

/// Location of the cache files of one mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub folder: PathBuf,
    pub mod_name: String,
}

impl CacheLocation {
    pub fn new(folder: impl Into<PathBuf>, mod_name: impl Into<String>) -> Self {
        Self { folder: folder.into(), mod_name: mod_name.into() }
    }

    /// Path of the file for a track.
    pub fn file_for(&self, track_name: &str) -> PathBuf {
        self.folder.join("data").join(&self.mod_name).join(format!("{track_name}.xml"))
    }
}

#[derive(Debug, Default)]
pub struct DataCache {
    fuel_usages: HashMap<String, f32>,
    fastest_normal: HashMap<String, Laptime>,
    fastest_hot: HashMap<String, Laptime>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fuel_usages.clear();
        self.fastest_normal.clear();
        self.fastest_hot.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fuel_usages.is_empty() && self.fastest_normal.is_empty() && self.fastest_hot.is_empty()
    }

    pub fn fuel_usage(&self, team: &str) -> Option<f32> {
        self.fuel_usages.get(team).copied()
    }

    pub fn set_fuel_usage(&mut self, team: &str, average: f32) {
        self.fuel_usages.insert(team.to_owned(), average);
    }

    /// Cached fastest lap of a team, normal or hot.
    pub fn fastest_laptime(&self, team: &str, hotlap: bool) -> Option<&Laptime> {
        if hotlap { self.fastest_hot.get(team) } else { self.fastest_normal.get(team) }
    }

    /// Clear and reload from the file of `track_name`. A missing file leaves
    /// the cache empty; any other failure is logged and does the same.
    pub fn load(&mut self, location: &CacheLocation, track_name: &str) {
        self.clear();

        let path = location.file_for(track_name);
        if !path.is_file() {
            debug!(path = %path.display(), "no cache file");
            return;
        }

        match self.load_file(&path) {
            Ok(vehicles) => info!(path = %path.display(), vehicles, "cache loaded"),
            Err(err) => {
                self.clear();
                error!(path = %path.display(), error = %err, "cache file rejected");
            }
        }
    }

    /// Merge the contents of a cache file. Returns the number of vehicle
    /// entries read.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let xml = fs::read_to_string(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        let document = format::parse_document(&path.display().to_string(), &xml)?;

        for vehicle in &document.vehicles {
            if let Some(average) = vehicle.fuel_usage.as_ref().and_then(|f| parse_fuel(&vehicle.vehicle, f)) {
                self.fuel_usages.insert(vehicle.vehicle.clone(), average);
            }

            for lap in &vehicle.fastest_laps {
                let Some(laptime) = parse_laptime(&vehicle.vehicle, lap) else {
                    continue;
                };
                match laptime.lap_type {
                    LapType::Normal => {
                        self.fastest_normal.insert(vehicle.vehicle.clone(), laptime);
                    }
                    LapType::Hotlap => {
                        self.fastest_hot.insert(vehicle.vehicle.clone(), laptime);
                    }
                    _ => {}
                }
            }
        }

        Ok(document.vehicles.len())
    }

    /// Write the cache for `track_name`. Failures are logged.
    pub fn store(&self, location: &CacheLocation, track_name: &str) {
        let path = location.file_for(track_name);
        match self.store_file(&path) {
            Ok(()) => info!(path = %path.display(), "cache stored"),
            Err(err) => error!(path = %path.display(), error = %err, "failed to store cache"),
        }
    }

    /// Write every entry, sorted by vehicle name, creating parent folders.
    pub fn store_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TelemetryError::file_error(parent.to_path_buf(), e))?;
        }

        let xml = format::write_document(&self.to_document())?;
        fs::write(path, xml).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))
    }

    fn to_document(&self) -> CachedData {
        let names: BTreeSet<&String> = self
            .fuel_usages
            .keys()
            .chain(self.fastest_normal.keys())
            .chain(self.fastest_hot.keys())
            .collect();

        let vehicles = names
            .into_iter()
            .map(|name| VehicleData {
                vehicle: name.clone(),
                fuel_usage: self
                    .fuel_usages
                    .get(name)
                    .map(|average| FuelUsage { average: Some(average.to_string()) }),
                fastest_laps: [self.fastest_normal.get(name), self.fastest_hot.get(name)]
                    .into_iter()
                    .flatten()
                    .map(laptime_element)
                    .collect(),
            })
            .collect();

        CachedData { version: format::version_string(), vehicles }
    }

    /// Remember a lap of `team` when the session qualifies and it beats the
    /// stored one. Only normal and hot laps are kept.
    pub fn add_laptime(
        &mut self,
        session_type: SessionType,
        num_vehicles: i32,
        team: &str,
        laptime: &Laptime,
    ) -> bool {
        if !is_cacheable_session(session_type, num_vehicles) || laptime.lap_time <= 0.0 {
            return false;
        }

        let map = match laptime.lap_type {
            LapType::Normal => &mut self.fastest_normal,
            LapType::Hotlap => &mut self.fastest_hot,
            _ => return false,
        };
        if map.get(team).is_some_and(|cached| laptime.lap_time >= cached.lap_time) {
            return false;
        }

        debug!(team, lap_time = laptime.lap_time, lap_type = laptime.lap_type.as_str(), "cached new fastest lap");
        map.insert(team.to_owned(), laptime.clone());
        true
    }

    /// Forget the laps of the current mode: hot laps in a hot-lap session,
    /// normal laps otherwise. Returns which kind was cleared.
    pub fn live_reset(&mut self, session_type: SessionType, num_vehicles: i32) -> LapType {
        let lap_type = lap_type_for_session(session_type, num_vehicles);
        if lap_type == LapType::Hotlap {
            self.fastest_hot.clear();
        } else {
            self.fastest_normal.clear();
        }
        info!(hotlap = lap_type == LapType::Hotlap, "cached laptimes reset");
        lap_type
    }

    /// Read one team's average fuel usage without touching a cache
    /// instance.
    pub fn load_fuel_usage(location: &CacheLocation, track_name: &str, team: &str) -> Option<f32> {
        let path = location.file_for(track_name);
        if !path.is_file() {
            return None;
        }

        let mut cache = DataCache::new();
        match cache.load_file(&path) {
            Ok(_) => cache.fuel_usage(team),
            Err(err) => {
                error!(path = %path.display(), error = %err, "cache file rejected");
                None
            }
        }
    }
}

fn parse_float(team: &str, what: &str, value: Option<&str>) -> Option<f32> {
    let raw = value.unwrap_or("");
    match raw.trim().parse::<f32>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(team, value = raw, "unable to parse {what} from the cache file");
            None
        }
    }
}

fn parse_fuel(team: &str, fuel: &FuelUsage) -> Option<f32> {
    parse_float(team, "fuel usage", fuel.average.as_deref())
}

fn parse_laptime(team: &str, lap: &FastestLap) -> Option<Laptime> {
    let sector1 = parse_float(team, "sector 1", lap.sector1.as_deref())?;
    let sector2 = parse_float(team, "sector 2", lap.sector2.as_deref())?;
    let sector3 = parse_float(team, "sector 3", lap.sector3.as_deref())?;
    let lap_time = parse_float(team, "lap time", lap.lap.as_deref())?;

    let mut laptime = Laptime::new(DriverId::UNASSIGNED, 0);
    laptime.sector1 = sector1;
    laptime.sector2 = sector2;
    laptime.sector3 = sector3;
    laptime.lap_time = lap_time;
    laptime.is_inlap = Some(false);
    laptime.finished = true;
    laptime.lap_type = LapType::parse(lap.lap_type.as_deref().unwrap_or(""));
    Some(laptime)
}

fn laptime_element(laptime: &Laptime) -> FastestLap {
    FastestLap {
        lap_type: Some(laptime.lap_type.as_str().to_owned()),
        sector1: Some(laptime.sector1.to_string()),
        sector2: Some(laptime.sector2.to_string()),
        sector3: Some(laptime.sector3.to_string()),
        lap: Some(laptime.lap_time.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(time: f32, lap_type: LapType) -> Laptime {
        let mut laptime = Laptime::new(DriverId(1), 3).with_sectors(time * 0.3, time * 0.4, time * 0.3);
        laptime.lap_time = time;
        laptime.finished = true;
        laptime.lap_type = lap_type;
        laptime
    }

    #[test]
    fn laptimes_are_kept_only_for_cacheable_sessions() {
        let mut cache = DataCache::new();
        assert!(!cache.add_laptime(SessionType::Race, 1, "Team", &lap(90.0, LapType::Normal)));
        assert!(!cache.add_laptime(SessionType::Practice1, 4, "Team", &lap(90.0, LapType::Normal)));
        assert!(cache.add_laptime(SessionType::Practice1, 1, "Team", &lap(90.0, LapType::Normal)));
        assert!(cache.add_laptime(SessionType::TestDay, 6, "Team", &lap(91.0, LapType::Hotlap)));
        assert!(!cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(80.0, LapType::Race)));
        assert!(!cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(-1.0, LapType::Normal)));
    }

    #[test]
    fn only_strictly_better_laps_replace_cached_ones() {
        let mut cache = DataCache::new();
        cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(90.0, LapType::Normal));
        assert!(!cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(90.0, LapType::Normal)));
        assert!(!cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(95.0, LapType::Normal)));
        assert!(cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(89.5, LapType::Normal)));
        assert_eq!(cache.fastest_laptime("Team", false).map(|l| l.lap_time), Some(89.5));
        assert!(cache.fastest_laptime("Team", true).is_none());
    }

    #[test]
    fn live_reset_clears_the_current_mode_only() {
        let mut cache = DataCache::new();
        cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(90.0, LapType::Normal));
        cache.add_laptime(SessionType::TestDay, 1, "Team", &lap(88.0, LapType::Hotlap));

        assert_eq!(cache.live_reset(SessionType::TestDay, 1), LapType::Hotlap);
        assert!(cache.fastest_laptime("Team", true).is_none());
        assert!(cache.fastest_laptime("Team", false).is_some());

        assert_eq!(cache.live_reset(SessionType::Practice1, 1), LapType::Normal);
        assert!(cache.fastest_laptime("Team", false).is_none());
    }

    #[test]
    fn store_then_load_keeps_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let location = CacheLocation::new(dir.path(), "F1CTDP06");

        let mut cache = DataCache::new();
        cache.set_fuel_usage("Zeta", 3.397);
        cache.add_laptime(SessionType::TestDay, 1, "Alpha", &lap(90.25, LapType::Normal));
        cache.add_laptime(SessionType::TestDay, 1, "Alpha", &lap(88.5, LapType::Hotlap));
        cache.store(&location, "Monza");

        let path = location.file_for("Monza");
        assert!(path.ends_with("data/F1CTDP06/Monza.xml"));
        let xml = fs::read_to_string(&path).unwrap();
        assert!(xml.find("Alpha").unwrap() < xml.find("Zeta").unwrap());

        let mut loaded = DataCache::new();
        loaded.load(&location, "Monza");
        assert_eq!(loaded.fuel_usage("Zeta"), Some(3.397));
        assert_eq!(loaded.fastest_laptime("Alpha", false).map(|l| l.lap_time), Some(90.25));
        assert_eq!(loaded.fastest_laptime("Alpha", true).map(|l| l.lap_time), Some(88.5));
        assert_eq!(DataCache::load_fuel_usage(&location, "Monza", "Zeta"), Some(3.397));
        assert_eq!(DataCache::load_fuel_usage(&location, "Monza", "Alpha"), None);
    }

    #[test]
    fn malformed_values_are_skipped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let location = CacheLocation::new(dir.path(), "mod");
        let path = location.file_for("Track");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"<?xml version="1.0"?>
<CachedData version="1.0.0">
  <VehicleData vehicle="A">
    <FuelUsage average="lots"/>
    <FastestLap type="NORMAL" sector1="30" sector2="30" sector3="30" lap="90"/>
  </VehicleData>
  <VehicleData vehicle="B">
    <FuelUsage average="2.5"/>
    <FastestLap type="NORMAL" sector1="x" sector2="30" sector3="30" lap="90"/>
    <FastestLap type="SPRINT" sector1="30" sector2="30" sector3="30" lap="90"/>
  </VehicleData>
</CachedData>
"#,
        )
        .unwrap();

        let mut cache = DataCache::new();
        cache.load(&location, "Track");
        assert_eq!(cache.fuel_usage("A"), None);
        assert_eq!(cache.fastest_laptime("A", false).map(|l| l.lap_time), Some(90.0));
        assert_eq!(cache.fuel_usage("B"), Some(2.5));
        assert!(cache.fastest_laptime("B", false).is_none());
        assert!(cache.fastest_laptime("B", true).is_none());
    }

    #[test]
    fn newer_files_are_rejected_whole() {
        let dir = tempfile::tempdir().unwrap();
        let location = CacheLocation::new(dir.path(), "mod");
        let path = location.file_for("Track");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"<CachedData version="2.0.0"><VehicleData vehicle="A"><FuelUsage average="2.5"/></VehicleData></CachedData>"#,
        )
        .unwrap();

        let mut cache = DataCache::new();
        cache.set_fuel_usage("stale", 1.0);
        cache.load(&location, "Track");
        assert!(cache.is_empty());

        let err = DataCache::new().load_file(&path).unwrap_err();
        assert!(matches!(err, TelemetryError::Version { .. }));
    }
}
