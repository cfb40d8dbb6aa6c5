//! Fuel usage per lap of the player's vehicle.

use tracing::{debug, info};

/// Window in which the reset input must be pressed three times.
pub const RESET_WINDOW_NANOS: i64 = 1_000_000_000;

/// Presses needed inside the window.
const RESET_PRESSES: u32 = 3;

/// Values mirrored into the telemetry record after every change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelUsage {
    pub last_lap: f32,
    pub average: f32,
    pub relevant_laps: i32,
}

/// Tracks fuel burnt per lap and its running average.
///
/// A lap counts once the stint is at least two laps long, so the out-lap
/// after a stop never enters the average.
#[derive(Debug, Clone)]
pub struct FuelUsageRecorder {
    set_by_editor: bool,
    last_lap: f32,
    average: f32,
    old_laps_completed: Option<i32>,
    lap_start_fuel: f32,
    relevant_laps: i32,
    relevant_fuel: f32,
}

impl Default for FuelUsageRecorder {
    fn default() -> Self {
        Self {
            set_by_editor: false,
            last_lap: -1.0,
            average: -1.0,
            old_laps_completed: None,
            lap_start_fuel: -1.0,
            relevant_laps: 0,
            relevant_fuel: -1.0,
        }
    }
}

impl FuelUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fuel burnt on the last counted lap, `-1` if none yet.
    pub fn last_lap(&self) -> f32 {
        self.last_lap
    }

    /// Average over the counted laps, `-1` if none yet.
    pub fn average(&self) -> f32 {
        self.average
    }

    pub fn relevant_laps(&self) -> i32 {
        self.relevant_laps
    }

    pub fn values(&self) -> FuelUsage {
        FuelUsage { last_lap: self.last_lap, average: self.average, relevant_laps: self.relevant_laps }
    }

    /// Forget everything. Ignored once editor presets are applied.
    pub fn reset(&mut self) {
        if self.set_by_editor {
            return;
        }
        *self = Self::default();
    }

    /// Manual reset from the input binding. Keeps the last lap's value.
    pub fn live_reset(&mut self) {
        if self.set_by_editor {
            return;
        }
        self.old_laps_completed = None;
        self.average = -1.0;
        self.relevant_laps = 0;
        self.relevant_fuel = -1.0;
        info!(last_lap = self.last_lap, "fuel usage reset");
    }

    /// Back in realtime: the fuel level at the lap start is no longer
    /// known.
    pub fn on_realtime_entered(&mut self) {
        self.old_laps_completed = None;
        self.lap_start_fuel = -1.0;
    }

    /// Seed the average from a cached value at session start.
    pub fn seed_average(&mut self, average: f32) {
        self.relevant_laps = 1;
        self.relevant_fuel = -1.0;
        self.average = average;
        debug!(average, "fuel usage seeded from the cache");
    }

    /// Fixed editor values. Blocks every later reset.
    pub fn apply_editor_presets(&mut self, last_lap: f32, average: f32, laps: i32) {
        self.last_lap = last_lap;
        self.average = average;
        self.old_laps_completed = None;
        self.lap_start_fuel = -1.0;
        self.relevant_laps = laps;
        self.relevant_fuel = laps as f32 * average;
        self.set_by_editor = true;
    }

    pub fn is_set_by_editor(&self) -> bool {
        self.set_by_editor
    }

    /// Feed one scoring update taken in realtime mode. Returns the new
    /// values when a counted lap was completed.
    pub fn on_scoring_updated(&mut self, laps_completed: i32, stint_length: f32, fuel: f32) -> Option<FuelUsage> {
        let old = *self.old_laps_completed.get_or_insert(laps_completed);
        if laps_completed == old {
            return None;
        }
        self.old_laps_completed = Some(laps_completed);

        let counted = stint_length as i32 >= 2;
        if counted {
            self.last_lap = self.lap_start_fuel - fuel;
            if self.relevant_fuel < 0.0 {
                self.relevant_laps = 1;
                self.relevant_fuel = self.last_lap;
            } else {
                self.relevant_laps += 1;
                self.relevant_fuel += self.last_lap;
            }
        }
        self.lap_start_fuel = fuel;

        if !counted {
            return None;
        }
        self.average = self.relevant_fuel / self.relevant_laps as f32;
        debug!(last_lap = self.last_lap, average = self.average, laps = self.relevant_laps, "fuel usage updated");
        Some(self.values())
    }
}

/// Fires on the third press that lands within one second of the first.
///
/// A press more than a second after the first one of the current series
/// starts a new series and counts as its first press.
#[derive(Debug, Clone, Default)]
pub struct ResetDebouncer {
    first_press: Option<i64>,
    presses: u32,
}

impl ResetDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press at `when` (nanoseconds). Returns whether it
    /// completes a triple press.
    pub fn press(&mut self, when: i64) -> bool {
        match self.first_press {
            Some(first) if when - first <= RESET_WINDOW_NANOS => {
                self.presses += 1;
                if self.presses >= RESET_PRESSES {
                    self.presses = 0;
                    return true;
                }
                false
            }
            _ => {
                self.first_press = Some(when);
                self.presses = 1;
                false
            }
        }
    }

    pub fn presses(&self) -> u32 {
        self.presses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1_000_000;

    #[test]
    fn laps_count_from_the_second_lap_of_a_stint() {
        let mut recorder = FuelUsageRecorder::new();
        assert_eq!(recorder.on_scoring_updated(0, 0.2, 100.0), None);
        // Out lap completed: stint too short, reference taken.
        assert_eq!(recorder.on_scoring_updated(1, 1.01, 97.0), None);
        assert_eq!(recorder.average(), -1.0);

        let values = recorder.on_scoring_updated(2, 2.01, 93.6).unwrap();
        assert!((values.last_lap - 3.4).abs() < 1e-4);
        assert_eq!(values.relevant_laps, 1);

        let values = recorder.on_scoring_updated(3, 3.01, 90.0).unwrap();
        assert!((values.last_lap - 3.6).abs() < 1e-4);
        assert!((values.average - 3.5).abs() < 1e-4);
        assert_eq!(values.relevant_laps, 2);

        // Same lap again changes nothing.
        assert_eq!(recorder.on_scoring_updated(3, 3.5, 88.0), None);
    }

    #[test]
    fn live_reset_keeps_the_last_lap() {
        let mut recorder = FuelUsageRecorder::new();
        recorder.on_scoring_updated(0, 0.5, 104.0);
        recorder.on_scoring_updated(1, 1.0, 100.0);
        recorder.on_scoring_updated(2, 2.0, 96.0);
        recorder.live_reset();

        assert_eq!(recorder.last_lap(), 4.0);
        assert_eq!(recorder.average(), -1.0);
        assert_eq!(recorder.relevant_laps(), 0);

        recorder.reset();
        assert_eq!(recorder.last_lap(), -1.0);
    }

    #[test]
    fn editor_presets_block_resets() {
        let mut recorder = FuelUsageRecorder::new();
        recorder.apply_editor_presets(3.456, 3.397, 4);
        recorder.reset();
        recorder.live_reset();

        assert_eq!(recorder.values(), FuelUsage { last_lap: 3.456, average: 3.397, relevant_laps: 4 });
        assert!(recorder.is_set_by_editor());
    }

    #[test]
    fn seeded_average_is_replaced_by_the_first_counted_lap() {
        let mut recorder = FuelUsageRecorder::new();
        recorder.seed_average(3.2);
        assert_eq!(recorder.average(), 3.2);
        assert_eq!(recorder.relevant_laps(), 1);

        recorder.on_scoring_updated(0, 0.0, 60.0);
        recorder.on_scoring_updated(1, 1.0, 50.0);
        let values = recorder.on_scoring_updated(2, 2.0, 47.0).unwrap();
        assert_eq!(values.relevant_laps, 1);
        assert_eq!(values.average, 3.0);
    }

    #[test]
    fn triple_press_within_a_second_fires() {
        let mut debouncer = ResetDebouncer::new();
        assert!(!debouncer.press(0));
        assert!(!debouncer.press(300 * MS));
        assert!(debouncer.press(900 * MS));

        // A fourth press two seconds after the first starts over at one.
        assert!(!debouncer.press(2_000 * MS));
        assert_eq!(debouncer.presses(), 1);
    }

    #[test]
    fn slow_presses_restart_counting() {
        let mut debouncer = ResetDebouncer::new();
        assert!(!debouncer.press(0));
        assert!(!debouncer.press(500 * MS));
        assert!(!debouncer.press(1_200 * MS));
        assert_eq!(debouncer.presses(), 1);

        assert!(!debouncer.press(1_500 * MS));
        assert!(debouncer.press(2_100 * MS));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_fires_with_presses_further_apart_than_the_window(
                gaps in prop::collection::vec(1_001i64..5_000, 1..20)
            ) {
                let mut debouncer = ResetDebouncer::new();
                let mut when = 0;
                prop_assert!(!debouncer.press(when));
                for gap in gaps {
                    when += gap * MS;
                    prop_assert!(!debouncer.press(when));
                    prop_assert_eq!(debouncer.presses(), 1);
                }
            }

            #[test]
            fn average_is_the_mean_of_counted_laps(burns in prop::collection::vec(1.0f32..6.0, 1..15)) {
                let mut recorder = FuelUsageRecorder::new();
                let mut fuel = 150.0f32;
                recorder.on_scoring_updated(1, 0.5, fuel);
                recorder.on_scoring_updated(2, 1.0, fuel);
                for (i, burn) in burns.iter().enumerate() {
                    fuel -= burn;
                    recorder.on_scoring_updated(3 + i as i32, 3.0 + i as f32, fuel);
                }
                let mean = burns.iter().sum::<f32>() / burns.len() as f32;
                prop_assert!((recorder.average() - mean).abs() < 1e-2);
                prop_assert_eq!(recorder.relevant_laps(), burns.len() as i32);
            }
        }
    }
}
