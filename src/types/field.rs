//! Field kinds and compile-time record layouts.

use serde::{Deserialize, Serialize};

/// Binary kind of a record field, sized like the game's C structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// 8-bit character or small integer
    Char,
    /// One-byte boolean, nonzero is true
    Bool,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer (the game's `long`)
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Three consecutive 32-bit floats
    Vec3,
    /// NUL-terminated Latin-1 string with a fixed capacity
    Str(usize),
    /// Opaque bytes (padding, pointers, small arrays)
    Bytes(usize),
}

impl FieldKind {
    /// Returns the size in bytes of this field kind.
    pub const fn size(&self) -> usize {
        match self {
            FieldKind::Char | FieldKind::Bool => 1,
            FieldKind::Int16 => 2,
            FieldKind::Int32 | FieldKind::Float32 => 4,
            FieldKind::Int64 | FieldKind::Float64 => 8,
            FieldKind::Vec3 => 12,
            FieldKind::Str(len) | FieldKind::Bytes(len) => *len,
        }
    }
}

/// Total byte span of an ordered field list.
pub const fn layout_span(fields: &[(&str, FieldKind)]) -> usize {
    let mut span = 0;
    let mut i = 0;
    while i < fields.len() {
        span += fields[i].1.size();
        i += 1;
    }
    span
}

/// Declares a record layout as a module of offset constants.
///
/// Every field becomes a `pub const NAME: usize` holding its byte offset, the
/// running sum of the widths declared before it. The module also gets
/// `FIELDS` (names and kinds in declaration order) and `SIZE`.
///
/// ```rust
/// pitboard::record_layout! {
///     pub mod sample {
///         DELTA_TIME: Float32,
///         LAP_NUMBER: Int32,
///         NAME: Str(16),
///         POSITION: Vec3,
///     }
/// }
///
/// assert_eq!(sample::LAP_NUMBER, 4);
/// assert_eq!(sample::POSITION, 24);
/// assert_eq!(sample::SIZE, 36);
/// ```
#[macro_export]
macro_rules! record_layout {
    (
        $(#[$meta:meta])*
        $vis:vis mod $name:ident {
            $( $field:ident : $kind:ident $( ( $arg:expr ) )? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[allow(dead_code)]
        $vis mod $name {
            #[allow(unused_imports)]
            use super::*;
            use $crate::types::FieldKind;

            $crate::record_layout!(@offsets 0usize; $( $field : FieldKind::$kind $( ( $arg ) )? ),*);

            /// Field names and kinds in declaration order.
            pub const FIELDS: &[(&str, FieldKind)] =
                &[ $( (stringify!($field), FieldKind::$kind $( ( $arg ) )?) ),* ];

            /// Total size of the record in bytes.
            pub const SIZE: usize = $crate::types::layout_span(FIELDS);
        }
    };

    (@offsets $acc:expr; ) => {};

    (@offsets $acc:expr; $field:ident : $kind:expr $( , $rest:ident : $rest_kind:expr )* ) => {
        pub const $field: usize = $acc;
        $crate::record_layout!(@offsets $acc + ($kind).size(); $( $rest : $rest_kind ),*);
    };
}
