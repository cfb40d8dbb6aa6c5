//! Provider trait for packet sources

use crate::Result;
use crate::types::FramePacket;

/// Source of raw record packets for the async side.
///
/// Providers handle their own pacing. The packets they yield are applied
/// in order by the consumer, see [`Driver`](crate::driver::Driver).
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - next packet
    /// - `Ok(None)` - the source is exhausted
    /// - `Err(e)` - reading failed; the caller may retry
    async fn next_frame(&mut self) -> Result<Option<FramePacket>>;

    /// Native tick rate in Hz
    fn tick_rate(&self) -> f64;
}
