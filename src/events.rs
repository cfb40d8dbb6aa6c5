//! Session lifecycle and game event notifications.

use crate::game_data::GameData;
use crate::scoring::VehicleView;

/// Receives lifecycle changes and events derived from consecutive scoring
/// updates. Every method defaults to doing nothing.
///
/// Registered with [`GameData::event_listeners`]. Failures are isolated like
/// record listener failures.
#[allow(unused_variables)]
pub trait GameEventsListener {
    fn on_session_started(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_session_ended(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_realtime_entered(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_realtime_exited(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_cockpit_entered(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_cockpit_exited(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    /// The scoring header reports a different track than before.
    fn on_track_changed(&self, track_name: &str, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    /// The player's vehicle entered the pit lane.
    fn on_pits_entered(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    /// The player's vehicle left the pit lane.
    fn on_pits_exited(&self, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }

    /// Control of the player's vehicle changed hands (player, AI, remote).
    fn on_vehicle_control_changed(
        &self,
        vehicle: VehicleView<'_>,
        game: &GameData,
        editor: bool,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A vehicle crossed the line. Fires for every vehicle.
    fn on_lap_started(&self, vehicle: VehicleView<'_>, game: &GameData, editor: bool) -> anyhow::Result<()> {
        Ok(())
    }
}
