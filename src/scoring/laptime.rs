//! Recorded laps and the fastest-lap tracker.

use crate::registry::DriverId;
use crate::types::{LapType, SessionType};

/// Laps slower than this factor times the fastest lap are left out of the
/// average.
const AVERAGE_LAPTIME_CUTOFF: f32 = 1.06;

/// One lap of one driver.
///
/// Sector times are pure durations; `-1` marks an unknown value.
#[derive(Debug, Clone, PartialEq)]
pub struct Laptime {
    pub driver_id: DriverId,
    /// 1-based lap number
    pub lap: i32,
    pub sector1: f32,
    pub sector2: f32,
    pub sector3: f32,
    pub lap_time: f32,
    pub is_outlap: bool,
    /// `None` while the lap is still running
    pub is_inlap: Option<bool>,
    pub finished: bool,
    pub lap_type: LapType,
}

impl Laptime {
    /// Unknown, unfinished lap.
    pub fn new(driver_id: DriverId, lap: i32) -> Self {
        Self {
            driver_id,
            lap,
            sector1: -1.0,
            sector2: -1.0,
            sector3: -1.0,
            lap_time: -1.0,
            is_outlap: false,
            is_inlap: None,
            finished: false,
            lap_type: LapType::Normal,
        }
    }

    /// Set the three sector durations and derive the lap time from them.
    pub fn with_sectors(mut self, sector1: f32, sector2: f32, sector3: f32) -> Self {
        self.sector1 = sector1;
        self.sector2 = sector2;
        self.sector3 = sector3;
        self.update_laptime_from_sectors();
        self
    }

    pub fn sector1(&self) -> f32 {
        self.sector1
    }

    /// Sector 2 duration, or the split at the end of sector 2 when
    /// `cumulative`.
    pub fn sector2(&self, cumulative: bool) -> f32 {
        if cumulative && self.sector1 > 0.0 && self.sector2 > 0.0 {
            self.sector1 + self.sector2
        } else {
            self.sector2
        }
    }

    pub fn sector3(&self) -> f32 {
        self.sector3
    }

    pub fn lap_time(&self) -> f32 {
        self.lap_time
    }

    pub fn is_inlap(&self) -> bool {
        self.is_inlap == Some(true)
    }

    /// Recompute the lap time when all three sectors are known.
    pub fn update_laptime_from_sectors(&mut self) {
        if self.sector1 > 0.0 && self.sector2 > 0.0 && self.sector3 > 0.0 {
            self.lap_time = self.sector1 + self.sector2 + self.sector3;
        }
    }

    /// Finished with a positive time.
    pub fn is_valid_finished(&self) -> bool {
        self.finished && self.lap_time > 0.0
    }
}

/// Lap type recorded for laps driven in the given session.
pub fn lap_type_for_session(session: SessionType, num_vehicles: i32) -> LapType {
    match session {
        SessionType::Race => LapType::Race,
        SessionType::Qualifying => LapType::Qualify,
        _ if is_hotlap_session(session, num_vehicles) => LapType::Hotlap,
        _ => LapType::Normal,
    }
}

/// A test day with nobody else on track.
pub fn is_hotlap_session(session: SessionType, num_vehicles: i32) -> bool {
    session == SessionType::TestDay && num_vehicles == 1
}

/// Sessions whose laps are worth keeping across sessions: test days, and a
/// first practice driven alone.
pub fn is_cacheable_session(session: SessionType, num_vehicles: i32) -> bool {
    match session {
        SessionType::TestDay => true,
        SessionType::Practice1 => num_vehicles == 1,
        _ => false,
    }
}

/// Fastest and second fastest lap of one vehicle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastestLaps {
    fastest: Option<Laptime>,
    second: Option<Laptime>,
}

impl FastestLaps {
    pub fn fastest(&self) -> Option<&Laptime> {
        self.fastest.as_ref()
    }

    pub fn second(&self) -> Option<&Laptime> {
        self.second.as_ref()
    }

    /// Offer a lap. Only a finished lap with a positive, strictly better time
    /// replaces the fastest one. Returns whether it did.
    pub fn offer(&mut self, candidate: &Laptime) -> bool {
        if !candidate.is_valid_finished() {
            return false;
        }
        if let Some(fastest) = &self.fastest {
            if candidate.lap_time >= fastest.lap_time {
                return false;
            }
        }

        self.replace(Some(candidate.clone()));
        true
    }

    /// Force the fastest lap. The previous one is kept as second fastest only
    /// if it was a finished lap with a positive time.
    pub fn replace(&mut self, laptime: Option<Laptime>) {
        let previous = std::mem::replace(&mut self.fastest, laptime);
        self.second = previous.filter(Laptime::is_valid_finished);
    }

    pub fn clear(&mut self) {
        self.fastest = None;
        self.second = None;
    }
}

/// Mean of the representative laps: finished, neither in- nor outlaps, and
/// within the cutoff of the fastest one.
pub fn average_laptime(laptimes: &[Laptime], fastest: Option<&Laptime>) -> Option<Laptime> {
    let limit = fastest.map(|f| f.lap_time * AVERAGE_LAPTIME_CUTOFF).unwrap_or(f32::MAX);

    let mut count = 0u32;
    let mut sums = [0.0f32; 4];
    for lap in laptimes {
        if !lap.is_valid_finished() || lap.is_inlap() || lap.is_outlap || lap.lap_time > limit {
            continue;
        }
        sums[0] += lap.sector1;
        sums[1] += lap.sector2;
        sums[2] += lap.sector3;
        sums[3] += lap.lap_time;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let n = count as f32;
    let first = &laptimes[0];
    Some(Laptime {
        driver_id: first.driver_id,
        lap: 0,
        sector1: sums[0] / n,
        sector2: sums[1] / n,
        sector3: sums[2] / n,
        lap_time: sums[3] / n,
        is_outlap: false,
        is_inlap: Some(false),
        finished: true,
        lap_type: first.lap_type,
    })
}
