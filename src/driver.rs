//! Driver runs a provider on a tokio task and hands its packets over

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::game_data::GameData;
use crate::provider::Provider;
use crate::providers::ReplayProvider;
use crate::types::FramePacket;
use crate::Result;

/// Packets buffered between the provider task and the consumer.
pub const PACKET_BUFFER: usize = 256;

/// Consecutive provider errors after which the task gives up.
pub const MAX_ERRORS: u32 = 10;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Packets in provider order. Closed when the provider ends or fails.
    pub packets: mpsc::Receiver<FramePacket>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

impl DriverChannels {
    /// The packets as a `Stream`.
    pub fn into_stream(self) -> ReceiverStream<FramePacket> {
        ReceiverStream::new(self.packets)
    }
}

/// Counts of one [`Driver::drain_into`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub applied: usize,
    pub failed: usize,
}

/// Spawns the provider task and applies its packets.
///
/// Records are single-threaded, so only packets cross the task boundary.
/// Every packet must reach the records in order: a scoring tick depends on
/// the one before it. The channel is therefore a bounded queue rather than
/// a latest-value watch, and a slow consumer backs up the provider.
pub struct Driver;

impl Driver {
    pub fn spawn<P>(provider: P) -> DriverChannels
    where
        P: Provider,
    {
        let (packet_tx, packet_rx) = mpsc::channel(PACKET_BUFFER);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::frame_reader_task(provider, packet_tx, cancel_task).await;
        });

        DriverChannels { packets: packet_rx, cancel }
    }

    async fn frame_reader_task<P>(mut provider: P, packet_tx: mpsc::Sender<FramePacket>, cancel: CancellationToken)
    where
        P: Provider,
    {
        info!(tick_rate = provider.tick_rate(), "packet reader task started");
        let mut packet_count = 0u64;
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("packet reader cancelled");
                    break;
                }
                result = provider.next_frame() => result,
            };

            match result {
                Ok(Some(packet)) => {
                    packet_count += 1;
                    error_count = 0;
                    trace!(packet = packet_count, record = %packet.kind, timestamp = packet.timestamp, "packet read");

                    let sent = tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("packet reader cancelled while sending");
                            break;
                        }
                        sent = packet_tx.send(packet) => sent,
                    };
                    if sent.is_err() {
                        debug!("packet receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!(packets = packet_count, "provider stream ended");
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!(attempt = error_count, max = MAX_ERRORS, error = %e, "provider error");

                    if !e.is_retryable() {
                        error!("provider error is not retryable, shutting down");
                        break;
                    }
                    if error_count >= MAX_ERRORS {
                        error!("too many provider errors, shutting down");
                        break;
                    }

                    // 100ms, 200ms, 400ms ... capped at 3.2s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(6)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!(packets = packet_count, "packet reader task ended");
    }

    /// Apply packets until the channel closes. A packet that fails is
    /// logged and skipped; later packets are still applied.
    pub async fn drain_into(packets: &mut mpsc::Receiver<FramePacket>, game: &mut GameData) -> DrainStats {
        let mut stats = DrainStats::default();
        while let Some(packet) = packets.recv().await {
            match game.apply_packet(&packet) {
                Ok(()) => stats.applied += 1,
                Err(err) => {
                    stats.failed += 1;
                    warn!(record = %packet.kind, timestamp = packet.timestamp, error = %err, "packet skipped");
                }
            }
        }
        debug!(applied = stats.applied, failed = stats.failed, "packets drained");
        stats
    }

    /// Replay a capture file into `game` at `speed` times its tick rate.
    pub async fn replay_file<P: AsRef<Path>>(path: P, game: &mut GameData, speed: f64) -> Result<DrainStats> {
        let mut provider = ReplayProvider::new(path)?;
        provider.set_speed(speed);

        let mut channels = Self::spawn(provider);
        Ok(Self::drain_into(&mut channels.packets, game).await)
    }
}
