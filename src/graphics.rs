//! Camera and ambient lighting, plus the viewport the HUD is drawn into.

use std::io::{self, Write};

use crate::game::GraphicsFormat;
use crate::record::{ListenerList, UpdateContext, UpdateState, VersionedRecord, fill_buffer};
use crate::source::DataSource;
use crate::types::{RecordBuffer, RecordKind, Vector3};
use crate::Result;

/// Ambient light colour, 0..=255 per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Decoded graphics structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsSnapshot {
    pub camera_position: Vector3,
    /// Rows of the camera orientation matrix
    pub camera_orientation: [Vector3; 3],
    pub ambient_color: AmbientColor,
}

/// Screen area of the game's 3D view, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

pub trait GraphicsListener {
    fn on_graphics_info_updated(&self, data: &GraphicsInfo, editor: bool) -> anyhow::Result<()>;

    fn on_viewport_changed(&self, _viewport: Viewport) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Versioned graphics record. In scope means updated in realtime mode.
pub struct GraphicsInfo {
    format: &'static dyn GraphicsFormat,
    buffer: RecordBuffer,
    state: UpdateState,
    snapshot: GraphicsSnapshot,
    viewport: Viewport,
    listeners: ListenerList<dyn GraphicsListener>,
}

impl GraphicsInfo {
    pub fn new(format: &'static dyn GraphicsFormat) -> Result<Self> {
        Ok(Self {
            format,
            buffer: RecordBuffer::new("graphics", format.fields(), format.size())?,
            state: UpdateState::default(),
            snapshot: GraphicsSnapshot::default(),
            viewport: Viewport::default(),
            listeners: ListenerList::new(),
        })
    }

    pub fn listeners(&self) -> &ListenerList<dyn GraphicsListener> {
        &self.listeners
    }

    pub fn snapshot(&self) -> &GraphicsSnapshot {
        &self.snapshot
    }

    pub fn camera_position(&self) -> Vector3 {
        self.snapshot.camera_position
    }

    pub fn camera_orientation(&self) -> [Vector3; 3] {
        self.snapshot.camera_orientation
    }

    pub fn ambient_color(&self) -> AmbientColor {
        self.snapshot.ambient_color
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Store a new viewport and tell listeners if it differs from the last one.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.listeners.dispatch(RecordKind::Graphics, |l| l.on_viewport_changed(viewport));
        true
    }
}

impl VersionedRecord for GraphicsInfo {
    fn kind(&self) -> RecordKind {
        RecordKind::Graphics
    }

    fn update_state(&self) -> &UpdateState {
        &self.state
    }

    fn update_state_mut(&mut self) -> &mut UpdateState {
        &mut self.state
    }

    fn fill(&mut self, source: &mut DataSource<'_>) -> Result<()> {
        fill_buffer(&mut self.buffer, source, self.format.default_payload())
    }

    fn decode(&mut self, _ctx: &mut UpdateContext<'_>) {
        self.snapshot = self.format.decode(self.buffer.reader());
    }

    fn notify_listeners(&self, editor: bool) {
        self.listeners.dispatch(self.kind(), |l| l.on_graphics_info_updated(self, editor));
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        self.buffer.write_to(out)
    }
}
