//! Enumerations decoded from raw record values.

use serde::{Deserialize, Serialize};

/// Session type as reported by the scoring header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionType {
    TestDay,
    Practice1,
    Practice2,
    Practice3,
    Practice4,
    Qualifying,
    Warmup,
    Race,
    #[default]
    Unknown,
}

impl SessionType {
    pub const fn from_raw(value: i32) -> Self {
        match value {
            0 => SessionType::TestDay,
            1 => SessionType::Practice1,
            2 => SessionType::Practice2,
            3 => SessionType::Practice3,
            4 => SessionType::Practice4,
            5 => SessionType::Qualifying,
            6 => SessionType::Warmup,
            7 => SessionType::Race,
            _ => SessionType::Unknown,
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            SessionType::TestDay => 0,
            SessionType::Practice1 => 1,
            SessionType::Practice2 => 2,
            SessionType::Practice3 => 3,
            SessionType::Practice4 => 4,
            SessionType::Qualifying => 5,
            SessionType::Warmup => 6,
            SessionType::Race => 7,
            SessionType::Unknown => -1,
        }
    }

    pub const fn is_race(self) -> bool {
        matches!(self, SessionType::Race)
    }

    pub const fn is_qualifying(self) -> bool {
        matches!(self, SessionType::Qualifying)
    }

    pub const fn is_practice(self) -> bool {
        matches!(
            self,
            SessionType::Practice1
                | SessionType::Practice2
                | SessionType::Practice3
                | SessionType::Practice4
        )
    }
}

/// Game phase of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    BeforeSessionHasBegun,
    ReconnaissanceLaps,
    GridWalkThrough,
    FormationLap,
    StartingLightCountdownHasBegun,
    GreenFlag,
    FullCourseYellow,
    SessionStopped,
    SessionOver,
    #[default]
    Unknown,
}

impl GamePhase {
    pub const fn from_raw(value: u8) -> Self {
        match value {
            0 => GamePhase::BeforeSessionHasBegun,
            1 => GamePhase::ReconnaissanceLaps,
            2 => GamePhase::GridWalkThrough,
            3 => GamePhase::FormationLap,
            4 => GamePhase::StartingLightCountdownHasBegun,
            5 => GamePhase::GreenFlag,
            6 => GamePhase::FullCourseYellow,
            7 => GamePhase::SessionStopped,
            8 => GamePhase::SessionOver,
            _ => GamePhase::Unknown,
        }
    }
}

/// Full-course yellow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum YellowFlagState {
    #[default]
    Invalid,
    NoFlag,
    Pending,
    PitClosed,
    PitLeadLap,
    PitOpen,
    LastLap,
    Resume,
    RaceHalt,
}

impl YellowFlagState {
    pub const fn from_raw(value: i8) -> Self {
        match value {
            0 => YellowFlagState::NoFlag,
            1 => YellowFlagState::Pending,
            2 => YellowFlagState::PitClosed,
            3 => YellowFlagState::PitLeadLap,
            4 => YellowFlagState::PitOpen,
            5 => YellowFlagState::LastLap,
            6 => YellowFlagState::Resume,
            7 => YellowFlagState::RaceHalt,
            _ => YellowFlagState::Invalid,
        }
    }
}

/// Finish state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FinishStatus {
    #[default]
    None,
    Finished,
    Dnf,
    Dq,
}

impl FinishStatus {
    pub const fn from_raw(value: i8) -> Self {
        match value {
            1 => FinishStatus::Finished,
            2 => FinishStatus::Dnf,
            3 => FinishStatus::Dq,
            _ => FinishStatus::None,
        }
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, FinishStatus::Finished)
    }
}

/// Who is in control of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VehicleControl {
    #[default]
    Nobody,
    LocalPlayer,
    LocalAi,
    Remote,
    Replay,
}

impl VehicleControl {
    pub const fn from_raw(value: i8) -> Self {
        match value {
            0 => VehicleControl::LocalPlayer,
            1 => VehicleControl::LocalAi,
            2 => VehicleControl::Remote,
            3 => VehicleControl::Replay,
            _ => VehicleControl::Nobody,
        }
    }

    pub const fn to_raw(self) -> i8 {
        match self {
            VehicleControl::Nobody => -1,
            VehicleControl::LocalPlayer => 0,
            VehicleControl::LocalAi => 1,
            VehicleControl::Remote => 2,
            VehicleControl::Replay => 3,
        }
    }
}

/// Which bound ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionLimit {
    Laps,
    Time,
}

/// Wheel index in telemetry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [Wheel::FrontLeft, Wheel::FrontRight, Wheel::RearLeft, Wheel::RearRight];

    pub const fn index(self) -> usize {
        match self {
            Wheel::FrontLeft => 0,
            Wheel::FrontRight => 1,
            Wheel::RearLeft => 2,
            Wheel::RearRight => 3,
        }
    }
}

/// Pit lane state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitState {
    OnTrack,
    InPitLane,
    Stopped,
}

/// Kind of a recorded lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LapType {
    #[default]
    Normal,
    Hotlap,
    Qualify,
    Race,
    Unknown,
}

impl LapType {
    /// Name used in cache files.
    pub const fn as_str(self) -> &'static str {
        match self {
            LapType::Normal => "NORMAL",
            LapType::Hotlap => "HOTLAP",
            LapType::Qualify => "QUALIFY",
            LapType::Race => "RACE",
            LapType::Unknown => "UNKNOWN",
        }
    }

    /// Parses a cache-file name; anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "NORMAL" => LapType::Normal,
            "HOTLAP" => LapType::Hotlap,
            "QUALIFY" => LapType::Qualify,
            "RACE" => LapType::Race,
            _ => LapType::Unknown,
        }
    }
}
