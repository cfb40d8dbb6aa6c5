//! Replay provider for capture files

use std::path::Path;

use tokio::time::{Duration, Interval, interval};
use tracing::{debug, info, trace};

use crate::Result;
use crate::capture::{CaptureHeader, CaptureReader};
use crate::provider::Provider;
use crate::types::FramePacket;

const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 10.0;

/// Replays a capture at its recorded tick rate.
///
/// Packets sharing a timestamp belong to one tick and are released
/// together; each new timestamp waits for the next interval tick.
pub struct ReplayProvider {
    reader: CaptureReader,

    /// Playback speed multiplier (1.0 = normal, 2.0 = double speed)
    speed: f64,

    interval: Interval,

    tick_rate: f64,

    last_timestamp: Option<i64>,
}

impl ReplayProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_reader(CaptureReader::open(path)?))
    }

    /// Must be called within a tokio runtime.
    pub fn from_reader(reader: CaptureReader) -> Self {
        let tick_rate = reader.tick_rate();
        info!(tick_rate, game = %reader.header().game, "replay provider ready");

        Self {
            reader,
            speed: 1.0,
            interval: interval(Duration::from_secs_f64(1.0 / tick_rate)),
            tick_rate,
            last_timestamp: None,
        }
    }

    pub fn header(&self) -> &CaptureHeader {
        self.reader.header()
    }

    /// Set playback speed, clamped to 0.1x..10x.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        let period = Duration::from_secs_f64(1.0 / (self.tick_rate * self.speed));
        self.interval = interval(period);
        debug!(speed = self.speed, "playback speed changed");
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn frames_read(&self) -> usize {
        self.reader.frames_read()
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_frame(&mut self) -> Result<Option<FramePacket>> {
        let Some(packet) = self.reader.read_next_frame()? else {
            debug!(frames = self.reader.frames_read(), "reached end of replay");
            return Ok(None);
        };

        if self.last_timestamp != Some(packet.timestamp) {
            self.interval.tick().await;
            self.last_timestamp = Some(packet.timestamp);
        }

        trace!(record = %packet.kind, timestamp = packet.timestamp, "replayed packet");
        Ok(Some(packet))
    }

    fn tick_rate(&self) -> f64 {
        self.tick_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureWriter;
    use crate::game::GameVersion;
    use crate::types::RecordKind;

    fn capture(ticks: i64) -> CaptureReader {
        let mut writer = CaptureWriter::new(Vec::new(), 100, GameVersion::RFactor1).unwrap();
        for tick in 0..ticks {
            writer.write_frame(RecordKind::Telemetry, tick, &[0; 4]).unwrap();
            writer.write_frame(RecordKind::Scoring, tick, &[1; 8]).unwrap();
        }
        CaptureReader::from_bytes(writer.finish().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn yields_every_packet_then_ends() {
        let mut provider = ReplayProvider::from_reader(capture(3));
        assert_eq!(provider.tick_rate(), 100.0);

        let mut kinds = Vec::new();
        while let Some(packet) = provider.next_frame().await.unwrap() {
            kinds.push((packet.timestamp, packet.kind));
        }

        assert_eq!(kinds.len(), 6);
        assert_eq!(kinds[0], (0, RecordKind::Telemetry));
        assert_eq!(kinds[5], (2, RecordKind::Scoring));
        assert!(provider.next_frame().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_paced_by_the_interval() {
        let mut provider = ReplayProvider::from_reader(capture(11));
        let start = tokio::time::Instant::now();
        while provider.next_frame().await.unwrap().is_some() {}

        // The first tick fires immediately, ten more at 10 ms each.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn speed_is_clamped() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let _guard = runtime.enter();

        let mut provider = ReplayProvider::from_reader(capture(1));
        provider.set_speed(50.0);
        assert_eq!(provider.speed(), 10.0);
        provider.set_speed(0.0);
        assert_eq!(provider.speed(), 0.1);
    }
}
