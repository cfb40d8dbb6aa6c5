//! Where in the lap a vehicle is, relative to a reference lap.

use super::laptime::Laptime;
use super::vehicle::VehicleView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LapState {
    Outlap,
    Somewhere,
    AfterSector1Start,
    BeforeSector1End,
    AfterSector2Start,
    BeforeSector2End,
    AfterSector3Start,
    BeforeSector3End,
}

impl LapState {
    pub const fn short_name(self) -> &'static str {
        match self {
            LapState::Outlap => "OL",
            LapState::Somewhere => "SW",
            LapState::AfterSector1Start => "AS1S",
            LapState::BeforeSector1End => "BS1E",
            LapState::AfterSector2Start => "AS2S",
            LapState::BeforeSector2End => "BS2E",
            LapState::AfterSector3Start => "AS3S",
            LapState::BeforeSector3End => "BS3E",
        }
    }

    pub const fn is_after_sector_start(self) -> bool {
        matches!(
            self,
            LapState::AfterSector1Start | LapState::AfterSector2Start | LapState::AfterSector3Start
        )
    }

    pub const fn is_before_sector_end(self) -> bool {
        matches!(
            self,
            LapState::BeforeSector1End | LapState::BeforeSector2End | LapState::BeforeSector3End
        )
    }

    /// Classify the vehicle's position in its lap.
    ///
    /// `after_sector_time` is how long after a sector start counts as "just
    /// started", `before_sector_time` how long before the reference's sector
    /// end counts as "about to end". With `first_sec1_start_is_somewhere` the
    /// start of the first flying lap of a stint is not highlighted.
    pub fn classify(
        vehicle: &VehicleView<'_>,
        reference: Option<&Laptime>,
        before_sector_time: f32,
        after_sector_time: f32,
        first_sec1_start_is_somewhere: bool,
    ) -> LapState {
        let stint = vehicle.stint_length();
        if stint < 1.0 {
            return LapState::Outlap;
        }

        let laptime = vehicle.current_laptime();
        let sector1_start = || {
            if first_sec1_start_is_somewhere && stint < 2.0 {
                LapState::Somewhere
            } else {
                LapState::AfterSector1Start
            }
        };

        let Some(reference) = reference.filter(|r| r.finished) else {
            if laptime < after_sector_time {
                return sector1_start();
            }
            if stint % 1.0 > 0.9 {
                return LapState::BeforeSector3End;
            }
            return LapState::Somewhere;
        };

        match vehicle.sector() {
            1 => {
                if laptime < after_sector_time {
                    sector1_start()
                } else if laptime < reference.sector1() - before_sector_time {
                    LapState::Somewhere
                } else {
                    LapState::BeforeSector1End
                }
            }
            2 => {
                let sector1 = vehicle.current_sector1();
                if laptime < sector1 + after_sector_time {
                    return LapState::AfterSector2Start;
                }
                let gap = sector1 - reference.sector1();
                if laptime < reference.sector2(true) + gap - before_sector_time {
                    LapState::Somewhere
                } else {
                    LapState::BeforeSector2End
                }
            }
            3 => {
                let sector2 = vehicle.current_sector2(true);
                if laptime < sector2 + after_sector_time {
                    return LapState::AfterSector3Start;
                }
                let gap = sector2 - reference.sector2(true);
                if laptime < reference.lap_time() + gap - before_sector_time {
                    LapState::Somewhere
                } else {
                    LapState::BeforeSector3End
                }
            }
            _ => LapState::Somewhere,
        }
    }
}
