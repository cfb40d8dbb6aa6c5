//! Core types for raw record representation.
//!
//! This module provides the building blocks every record is made of:
//! - [`FieldKind`] and the [`record_layout!`](crate::record_layout) macro describe a
//!   game structure as compile-time offsets
//! - [`RecordBuffer`] holds one structure's bytes with staged, all-or-nothing refills
//! - [`FieldReader`] / [`RecordEncoder`] decode and encode fields at those offsets
//! - [`FramePacket`] carries a raw payload between the replay side and the records
//!
//! ## Usage Example
//!
//! ```rust
//! use pitboard::types::{FieldReader, RecordBuffer, RecordEncoder};
//! use std::io::Cursor;
//!
//! pitboard::record_layout! {
//!     pub mod engine {
//!         RPM: Float32,
//!         GEAR: Int32,
//!     }
//! }
//!
//! let mut enc = RecordEncoder::new(engine::SIZE);
//! enc.put_f32(engine::RPM, 4500.0).put_i32(engine::GEAR, 3);
//!
//! let mut buffer = RecordBuffer::new("engine", engine::FIELDS, engine::SIZE)?;
//! buffer.stage_from_reader(&mut Cursor::new(enc.into_bytes()))?;
//! buffer.commit();
//!
//! let reader: FieldReader<'_> = buffer.reader();
//! assert_eq!(reader.read_f32(engine::RPM), 4500.0);
//! assert_eq!(reader.read_i32(engine::GEAR), 3);
//! # Ok::<(), pitboard::TelemetryError>(())
//! ```

mod buffer;
mod enums;
mod field;
mod frame;
mod vector;

pub use buffer::{FieldReader, RecordBuffer, RecordEncoder};
pub use enums::{
    FinishStatus, GamePhase, LapType, PitState, SessionLimit, SessionType, VehicleControl, Wheel,
    YellowFlagState,
};
pub use field::{FieldKind, layout_span};
pub use frame::{FramePacket, RecordKind};
pub use vector::Vector3;

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_field_kind_sizes_are_positive_and_bounded(kind in prop::sample::select(vec![
            FieldKind::Char, FieldKind::Bool, FieldKind::Int16, FieldKind::Int32,
            FieldKind::Int64, FieldKind::Float32, FieldKind::Float64, FieldKind::Vec3,
        ])) {
            let size = kind.size();
            prop_assert!(size > 0);
            prop_assert!(size <= 12);
        }

        #[test]
        fn prop_layout_span_is_sum_of_widths(widths in prop::collection::vec(0usize..300, 0..20)) {
            let fields: Vec<(&str, FieldKind)> =
                widths.iter().map(|&w| ("field", FieldKind::Bytes(w))).collect();
            prop_assert_eq!(layout_span(&fields), widths.iter().sum::<usize>());
        }

        #[test]
        fn prop_session_type_raw_values_round_trip(raw in 0i32..8) {
            prop_assert_eq!(SessionType::from_raw(raw).to_raw(), raw);
        }

        #[test]
        fn prop_unknown_record_tags_are_rejected(tag in 5u8..=255u8) {
            prop_assert!(RecordKind::from_tag(tag).is_none());
        }
    }

    #[test]
    fn field_kind_size_returns_correct_values() {
        assert_eq!(FieldKind::Char.size(), 1);
        assert_eq!(FieldKind::Bool.size(), 1);
        assert_eq!(FieldKind::Int16.size(), 2);
        assert_eq!(FieldKind::Int32.size(), 4);
        assert_eq!(FieldKind::Float32.size(), 4);
        assert_eq!(FieldKind::Int64.size(), 8);
        assert_eq!(FieldKind::Float64.size(), 8);
        assert_eq!(FieldKind::Vec3.size(), 12);
        assert_eq!(FieldKind::Str(64).size(), 64);
        assert_eq!(FieldKind::Bytes(3).size(), 3);
    }

    #[test]
    fn record_kind_tags_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn raw_enum_decoding() {
        assert_eq!(SessionType::from_raw(7), SessionType::Race);
        assert_eq!(SessionType::from_raw(42), SessionType::Unknown);
        assert!(SessionType::Practice3.is_practice());
        assert_eq!(FinishStatus::from_raw(1), FinishStatus::Finished);
        assert_eq!(VehicleControl::from_raw(-1), VehicleControl::Nobody);
        assert_eq!(VehicleControl::from_raw(0).to_raw(), 0);
        assert_eq!(GamePhase::from_raw(5), GamePhase::GreenFlag);
        assert_eq!(YellowFlagState::from_raw(-1), YellowFlagState::Invalid);
        assert_eq!(LapType::parse("HOTLAP"), LapType::Hotlap);
        assert_eq!(LapType::parse("bogus"), LapType::Unknown);
    }
}
