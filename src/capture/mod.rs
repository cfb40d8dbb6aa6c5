//! Recording and reading raw record streams.
//!
//! A capture is written from the committed buffers of each record after an
//! update and read back as [`FramePacket`](crate::types::FramePacket)s, which
//! [`GameData::apply_packet`](crate::GameData::apply_packet) feeds through
//! the normal update protocol.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::CaptureHeader;
pub use reader::CaptureReader;
pub use writer::CaptureWriter;
