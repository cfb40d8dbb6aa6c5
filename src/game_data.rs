//! The four records of one game session and the state shared between them.
//!
//! [`GameData`] owns the records, the id registry, the data cache and the
//! fuel recorder. The host calls the lifecycle methods when the game reports
//! session and view changes, and one `update_*` method per record and tick.
//! Scoring updates are post-processed here: fuel usage is recorded, the
//! player's laps are offered to the cache and game events are derived.

use std::io::Cursor;

use tracing::{debug, info, warn};

use crate::cache::{CacheLocation, DataCache};
use crate::commentary::CommentaryInfo;
use crate::config::PluginConfig;
use crate::events::GameEventsListener;
use crate::fuel::{FuelUsageRecorder, ResetDebouncer};
use crate::game::{GameFormats, GameVersion};
use crate::graphics::{GraphicsInfo, Viewport};
use crate::presets::EditorPresets;
use crate::record::{ListenerList, UpdateContext, VersionedRecord, update_data};
use crate::registry::IdRegistry;
use crate::scoring::{ScoringInfo, is_cacheable_session};
use crate::source::DataSource;
use crate::telemetry::TelemetryData;
use crate::types::{FramePacket, LapType, RecordKind, VehicleControl};
use crate::Result;

const EVENTS: &str = "game events";

/// Where the player currently is.
#[derive(Debug, Clone, Copy, Default)]
struct SessionFlags {
    session_running: bool,
    in_realtime: bool,
    in_cockpit: bool,
    editor_mode: bool,
}

impl SessionFlags {
    fn context<'a>(&self, timestamp: i64, in_scope: bool, registry: &'a mut IdRegistry) -> UpdateContext<'a> {
        let mut ctx = UpdateContext::new(timestamp, registry);
        ctx.in_scope = in_scope;
        ctx.in_cockpit = self.in_cockpit;
        ctx.in_realtime = self.in_realtime;
        ctx
    }
}

/// Player values of the previous scoring update, for event detection.
#[derive(Debug, Default)]
struct EventTracker {
    track_name: Option<String>,
    player_in_pits: Option<bool>,
    player_control: Option<VehicleControl>,
}

pub struct GameData {
    game: GameVersion,
    cache_location: Option<CacheLocation>,
    editor_presets: EditorPresets,
    telemetry: TelemetryData,
    scoring: ScoringInfo,
    graphics: GraphicsInfo,
    commentary: CommentaryInfo,
    registry: IdRegistry,
    cache: DataCache,
    fuel: FuelUsageRecorder,
    fuel_reset: ResetDebouncer,
    flags: SessionFlags,
    tracker: EventTracker,
    event_listeners: ListenerList<dyn GameEventsListener>,
}

impl GameData {
    pub fn new(config: &PluginConfig) -> Result<Self> {
        let formats = GameFormats::for_game(config.game)?;
        info!(game = %config.game, cache = config.cache_folder.is_some(), "game data created");

        Ok(Self {
            game: config.game,
            cache_location: config.cache_location(),
            editor_presets: config.editor.clone(),
            telemetry: TelemetryData::new(formats.telemetry)?,
            scoring: ScoringInfo::new(formats.scoring)?,
            graphics: GraphicsInfo::new(formats.graphics)?,
            commentary: CommentaryInfo::new(formats.commentary)?,
            registry: IdRegistry::new(),
            cache: DataCache::new(),
            fuel: FuelUsageRecorder::new(),
            fuel_reset: ResetDebouncer::new(),
            flags: SessionFlags::default(),
            tracker: EventTracker::default(),
            event_listeners: ListenerList::new(),
        })
    }

    pub fn game(&self) -> GameVersion {
        self.game
    }

    pub fn telemetry(&self) -> &TelemetryData {
        &self.telemetry
    }

    pub fn scoring(&self) -> &ScoringInfo {
        &self.scoring
    }

    pub fn graphics(&self) -> &GraphicsInfo {
        &self.graphics
    }

    pub fn commentary(&self) -> &CommentaryInfo {
        &self.commentary
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn fuel_usage(&self) -> &FuelUsageRecorder {
        &self.fuel
    }

    pub fn editor_presets(&self) -> &EditorPresets {
        &self.editor_presets
    }

    pub fn event_listeners(&self) -> &ListenerList<dyn GameEventsListener> {
        &self.event_listeners
    }

    pub fn is_session_running(&self) -> bool {
        self.flags.session_running
    }

    pub fn is_in_realtime(&self) -> bool {
        self.flags.in_realtime
    }

    pub fn is_in_cockpit(&self) -> bool {
        self.flags.in_cockpit
    }

    pub fn is_editor_mode(&self) -> bool {
        self.flags.editor_mode
    }

    /// Team name used for cache entries: the player's vehicle name.
    pub fn player_team(&self) -> Option<&str> {
        self.scoring.player().map(|player| player.vehicle_name())
    }

    pub fn on_session_started(&mut self, editor: bool) {
        self.flags.editor_mode = editor;
        self.flags.session_running = true;
        self.scoring.reset_session();
        self.fuel.reset();
        self.tracker = EventTracker::default();

        if editor {
            let presets = &self.editor_presets;
            self.fuel.apply_editor_presets(
                presets.fuel_usage_last_lap,
                presets.fuel_usage_average,
                presets.fuel_usage_laps,
            );
        } else {
            self.load_cache();
        }
        self.mirror_fuel_usage();

        info!(
            editor,
            track = self.scoring.track_name(),
            session = ?self.scoring.session_type(),
            "session started"
        );
        self.dispatch_events(|l, game| l.on_session_started(game, editor));
    }

    pub fn on_session_ended(&mut self) {
        self.store_cache();
        self.flags.session_running = false;
        self.scoring.reset_session();
        info!("session ended");
        let editor = self.flags.editor_mode;
        self.dispatch_events(|l, game| l.on_session_ended(game, editor));
    }

    pub fn on_realtime_entered(&mut self) {
        self.flags.in_realtime = true;
        self.fuel.on_realtime_entered();
        debug!("realtime entered");
        let editor = self.flags.editor_mode;
        self.dispatch_events(|l, game| l.on_realtime_entered(game, editor));
    }

    pub fn on_realtime_exited(&mut self) {
        self.flags.in_realtime = false;
        debug!("realtime exited");
        let editor = self.flags.editor_mode;
        self.dispatch_events(|l, game| l.on_realtime_exited(game, editor));
    }

    pub fn on_cockpit_entered(&mut self) {
        self.flags.in_cockpit = true;
        debug!("cockpit entered");
        let editor = self.flags.editor_mode;
        self.dispatch_events(|l, game| l.on_cockpit_entered(game, editor));
    }

    pub fn on_cockpit_exited(&mut self) {
        self.flags.in_cockpit = false;
        self.store_cache();
        debug!("cockpit exited");
        let editor = self.flags.editor_mode;
        self.dispatch_events(|l, game| l.on_cockpit_exited(game, editor));
    }

    /// Telemetry is in scope while in the cockpit. A successful update also
    /// moves the extrapolation time of the scoring record to the gap
    /// between both timestamps.
    pub fn update_telemetry(&mut self, source: &mut DataSource<'_>, timestamp: i64) -> Result<()> {
        let mut ctx = self.flags.context(timestamp, self.flags.in_cockpit, &mut self.registry);
        update_data(&mut self.telemetry, source, &mut ctx)?;

        if self.scoring.is_valid() {
            let gap = timestamp - self.scoring.update_state().timestamp();
            self.scoring.set_extrapolation_time((gap.max(0) as f64 / 1e9) as f32);
        }
        Ok(())
    }

    /// Scoring is in scope while in the cockpit. A successful update resets
    /// the extrapolation time; a failed one leaves it as it was.
    pub fn update_scoring(&mut self, source: &mut DataSource<'_>, timestamp: i64) -> Result<()> {
        let editor = source.is_editor_mode();
        let player_telemetry = self.telemetry.player_telemetry();

        let mut ctx = self.flags.context(timestamp, self.flags.in_cockpit, &mut self.registry);
        ctx.player_telemetry = player_telemetry;
        update_data(&mut self.scoring, source, &mut ctx)?;

        self.after_scoring_updated(editor);
        Ok(())
    }

    /// Graphics is in scope in realtime mode.
    pub fn update_graphics(&mut self, source: &mut DataSource<'_>, timestamp: i64) -> Result<()> {
        let mut ctx = self.flags.context(timestamp, self.flags.in_realtime, &mut self.registry);
        update_data(&mut self.graphics, source, &mut ctx)
    }

    /// Commentary is in scope while in the cockpit.
    pub fn update_commentary(&mut self, source: &mut DataSource<'_>, timestamp: i64) -> Result<()> {
        let mut ctx = self.flags.context(timestamp, self.flags.in_cockpit, &mut self.registry);
        update_data(&mut self.commentary, source, &mut ctx)
    }

    /// Feed a captured packet through the normal update of its record.
    pub fn apply_packet(&mut self, packet: &FramePacket) -> Result<()> {
        let mut cursor = Cursor::new(&packet.data[..]);
        let mut source = DataSource::Stream(&mut cursor);
        match packet.kind {
            RecordKind::Telemetry => self.update_telemetry(&mut source, packet.timestamp),
            RecordKind::Scoring => self.update_scoring(&mut source, packet.timestamp),
            RecordKind::Graphics => self.update_graphics(&mut source, packet.timestamp),
            RecordKind::Commentary => self.update_commentary(&mut source, packet.timestamp),
        }
    }

    /// Editor mode: start a session and run every record with the bundled
    /// payloads and `presets`, which replace the configured ones.
    pub fn load_editor_defaults(&mut self, presets: EditorPresets) -> Result<()> {
        self.editor_presets = presets;
        self.on_session_started(true);
        self.on_realtime_entered();
        self.on_cockpit_entered();

        let presets = self.editor_presets.clone();
        self.update_telemetry(&mut DataSource::Preset(&presets), 0)?;
        self.update_scoring(&mut DataSource::Preset(&presets), 0)?;
        self.update_graphics(&mut DataSource::Preset(&presets), 0)?;
        self.update_commentary(&mut DataSource::Preset(&presets), 0)?;
        Ok(())
    }

    pub fn set_extrapolation_time(&mut self, seconds: f32) {
        self.scoring.set_extrapolation_time(seconds);
    }

    /// Returns whether the viewport changed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        self.graphics.set_viewport(viewport)
    }

    /// One press of the fuel usage reset input at `when` (nanoseconds).
    /// Returns whether it completed a triple press and reset the values.
    pub fn on_reset_fuel_input(&mut self, when: i64) -> bool {
        if !self.fuel_reset.press(when) {
            return false;
        }
        self.fuel.live_reset();
        self.mirror_fuel_usage();
        true
    }

    /// Forget cached laptimes of the current mode, including the player's
    /// cached one.
    pub fn on_reset_laptimes_cache(&mut self) {
        let session = self.scoring.snapshot();
        let lap_type = self.cache.live_reset(session.session_type, session.num_vehicles);
        self.scoring.clear_cached_player_laptime(lap_type == LapType::Hotlap);
    }

    fn mirror_fuel_usage(&mut self) {
        self.telemetry.set_fuel_usage(self.fuel.last_lap(), self.fuel.average());
    }

    fn load_cache(&mut self) {
        self.cache.clear();
        let Some(location) = &self.cache_location else {
            return;
        };
        self.cache.load(location, self.scoring.track_name());

        let Some(team) = self.player_team().map(str::to_owned) else {
            return;
        };
        if let Some(average) = self.cache.fuel_usage(&team) {
            self.fuel.seed_average(average);
        }

        let session = self.scoring.snapshot();
        if is_cacheable_session(session.session_type, session.num_vehicles) {
            let normal = self.cache.fastest_laptime(&team, false).cloned();
            let hot = self.cache.fastest_laptime(&team, true).cloned();
            self.scoring.set_cached_player_laptimes(normal, hot);
        }
    }

    fn store_cache(&mut self) {
        if self.flags.editor_mode {
            return;
        }
        let Some(location) = &self.cache_location else {
            return;
        };
        let Some(team) = self.scoring.player().map(|p| p.vehicle_name().to_owned()) else {
            warn!("no player vehicle, cache not stored");
            return;
        };

        if self.fuel.average() > 0.0 {
            self.cache.set_fuel_usage(&team, self.fuel.average());
        }
        self.cache.store(location, self.scoring.track_name());
    }

    fn after_scoring_updated(&mut self, editor: bool) {
        if !editor {
            self.record_player_lap();
        }

        let (track_changed, pits_changed, control_changed) = self.track_events();

        if let Some(track) = track_changed {
            self.dispatch_events(|l, game| l.on_track_changed(&track, game, editor));
        }
        match pits_changed {
            Some(true) => self.dispatch_events(|l, game| l.on_pits_entered(game, editor)),
            Some(false) => self.dispatch_events(|l, game| l.on_pits_exited(game, editor)),
            None => {}
        }
        if control_changed {
            if let Some(player) = self.scoring.player() {
                self.event_listeners
                    .dispatch(EVENTS, |l| l.on_vehicle_control_changed(player, self, editor));
            }
        }

        for vehicle in self.scoring.vehicles().filter(|v| v.has_completed_lap()) {
            self.event_listeners.dispatch(EVENTS, |l| l.on_lap_started(vehicle, self, editor));
        }
    }

    fn record_player_lap(&mut self) {
        let Some(player) = self.scoring.player() else {
            return;
        };
        let laps_completed = player.laps_completed();
        let stint_length = player.stint_length();
        let completed = player.has_completed_lap().then(|| player.last_laptime().cloned()).flatten();
        let team = player.vehicle_name().to_owned();

        if self.flags.in_realtime {
            if let Some(values) = self.fuel.on_scoring_updated(laps_completed, stint_length, self.telemetry.fuel()) {
                self.telemetry.set_fuel_usage(values.last_lap, values.average);
            }
        }

        if let Some(laptime) = completed {
            let session = self.scoring.snapshot();
            self.cache.add_laptime(session.session_type, session.num_vehicles, &team, &laptime);
        }
    }

    /// Compare with the previous update. Returns the new track name, the new
    /// pit flag and whether control changed, each only on a change.
    fn track_events(&mut self) -> (Option<String>, Option<bool>, bool) {
        let track = self.scoring.track_name();
        let track_changed = (self.tracker.track_name.as_deref() != Some(track)).then(|| track.to_owned());
        if let Some(track) = &track_changed {
            self.tracker.track_name = Some(track.clone());
        }

        let Some(player) = self.scoring.player() else {
            return (track_changed, None, false);
        };

        let in_pits = player.in_pits();
        let pits_changed = match self.tracker.player_in_pits.replace(in_pits) {
            Some(old) if old != in_pits => Some(in_pits),
            _ => None,
        };

        let control = player.control();
        let control_changed = matches!(self.tracker.player_control.replace(control), Some(old) if old != control);

        (track_changed, pits_changed, control_changed)
    }

    fn dispatch_events<F>(&self, mut notify: F)
    where
        F: FnMut(&dyn GameEventsListener, &GameData) -> anyhow::Result<()>,
    {
        self.event_listeners.dispatch(EVENTS, |l| notify(l, self));
    }
}

impl std::fmt::Debug for GameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameData")
            .field("game", &self.game)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
