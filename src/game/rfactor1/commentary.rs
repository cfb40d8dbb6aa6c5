//! `CommentaryRequestInfo`.

use std::sync::OnceLock;

use crate::commentary::CommentarySnapshot;
use crate::game::{CommentaryFormat, Fields};
use crate::types::{FieldReader, RecordEncoder};

const MAX_NAME_LENGTH: usize = 32;

crate::record_layout! {
    pub mod commentary_request_info {
        NAME: Str(32),
        INPUT1: Float64,
        INPUT2: Float64,
        INPUT3: Float64,
        SKIP_CHECKS: Bool,
        PAD: Bytes(3),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rf1Commentary;

impl CommentaryFormat for Rf1Commentary {
    fn fields(&self) -> Fields {
        commentary_request_info::FIELDS
    }

    fn size(&self) -> usize {
        commentary_request_info::SIZE
    }

    fn decode(&self, r: FieldReader<'_>) -> CommentarySnapshot {
        use commentary_request_info as c;

        CommentarySnapshot {
            name: r.read_string(c::NAME, MAX_NAME_LENGTH),
            input1: r.read_f64(c::INPUT1),
            input2: r.read_f64(c::INPUT2),
            input3: r.read_f64(c::INPUT3),
            skip_checks: r.read_bool(c::SKIP_CHECKS),
        }
    }

    fn encode(&self, s: &CommentarySnapshot) -> Vec<u8> {
        use commentary_request_info as c;

        let mut enc = RecordEncoder::new(c::SIZE);
        enc.put_string(c::NAME, MAX_NAME_LENGTH, &s.name)
            .put_f64(c::INPUT1, s.input1)
            .put_f64(c::INPUT2, s.input2)
            .put_f64(c::INPUT3, s.input3)
            .put_bool(c::SKIP_CHECKS, s.skip_checks);
        enc.into_bytes()
    }

    fn default_payload(&self) -> &'static [u8] {
        static PAYLOAD: OnceLock<Vec<u8>> = OnceLock::new();
        PAYLOAD.get_or_init(|| {
            self.encode(&CommentarySnapshot {
                name: "Pass".to_string(),
                input1: 4.0,
                input2: 3.0,
                input3: 0.0,
                skip_checks: false,
            })
        })
    }
}
