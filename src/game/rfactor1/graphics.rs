//! `GraphicsInfoV2`.

use std::sync::OnceLock;

use crate::game::{Fields, GraphicsFormat};
use crate::graphics::{AmbientColor, GraphicsSnapshot};
use crate::types::{FieldReader, RecordEncoder, Vector3};

crate::record_layout! {
    pub mod graphics_info_v2 {
        CAM_POS: Vec3,
        CAM_ORI_X: Vec3,
        CAM_ORI_Y: Vec3,
        CAM_ORI_Z: Vec3,
        HWND: Bytes(4),
        AMBIENT_RED: Float32,
        AMBIENT_GREEN: Float32,
        AMBIENT_BLUE: Float32,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rf1Graphics;

impl GraphicsFormat for Rf1Graphics {
    fn fields(&self) -> Fields {
        graphics_info_v2::FIELDS
    }

    fn size(&self) -> usize {
        graphics_info_v2::SIZE
    }

    fn decode(&self, r: FieldReader<'_>) -> GraphicsSnapshot {
        use graphics_info_v2 as g;

        GraphicsSnapshot {
            camera_position: r.read_vec3(g::CAM_POS),
            camera_orientation: [
                r.read_vec3(g::CAM_ORI_X),
                r.read_vec3(g::CAM_ORI_Y),
                r.read_vec3(g::CAM_ORI_Z),
            ],
            ambient_color: AmbientColor {
                red: r.read_f32(g::AMBIENT_RED),
                green: r.read_f32(g::AMBIENT_GREEN),
                blue: r.read_f32(g::AMBIENT_BLUE),
            },
        }
    }

    fn encode(&self, s: &GraphicsSnapshot) -> Vec<u8> {
        use graphics_info_v2 as g;

        let mut enc = RecordEncoder::new(g::SIZE);
        enc.put_vec3(g::CAM_POS, s.camera_position)
            .put_vec3(g::CAM_ORI_X, s.camera_orientation[0])
            .put_vec3(g::CAM_ORI_Y, s.camera_orientation[1])
            .put_vec3(g::CAM_ORI_Z, s.camera_orientation[2])
            .put_f32(g::AMBIENT_RED, s.ambient_color.red)
            .put_f32(g::AMBIENT_GREEN, s.ambient_color.green)
            .put_f32(g::AMBIENT_BLUE, s.ambient_color.blue);
        enc.into_bytes()
    }

    fn default_payload(&self) -> &'static [u8] {
        static PAYLOAD: OnceLock<Vec<u8>> = OnceLock::new();
        PAYLOAD.get_or_init(|| {
            self.encode(&GraphicsSnapshot {
                // The game stores the negated camera position.
                camera_position: Vector3::new(254.6, -4.2, -873.1),
                camera_orientation: [
                    Vector3::new(1.0, 0.0, 0.0),
                    Vector3::new(0.0, 1.0, 0.0),
                    Vector3::new(0.0, 0.0, 1.0),
                ],
                ambient_color: AmbientColor { red: 212.0, green: 208.0, blue: 199.0 },
            })
        })
    }
}
