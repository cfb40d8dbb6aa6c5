//! Commentary requests issued by the game.

use std::io::{self, Write};

use crate::game::CommentaryFormat;
use crate::record::{ListenerList, UpdateContext, UpdateState, VersionedRecord, fill_buffer};
use crate::source::DataSource;
use crate::types::{RecordBuffer, RecordKind};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentarySnapshot {
    /// Name of the commentary event
    pub name: String,
    pub input1: f64,
    pub input2: f64,
    pub input3: f64,
    /// Ignore the game's checks for whether to play the event
    pub skip_checks: bool,
}

pub trait CommentaryListener {
    fn on_commentary_info_updated(&self, data: &CommentaryInfo, editor: bool)
    -> anyhow::Result<()>;
}

/// Versioned commentary record. In scope means updated in the cockpit.
pub struct CommentaryInfo {
    format: &'static dyn CommentaryFormat,
    buffer: RecordBuffer,
    state: UpdateState,
    snapshot: CommentarySnapshot,
    listeners: ListenerList<dyn CommentaryListener>,
}

impl CommentaryInfo {
    pub fn new(format: &'static dyn CommentaryFormat) -> Result<Self> {
        Ok(Self {
            format,
            buffer: RecordBuffer::new("commentary", format.fields(), format.size())?,
            state: UpdateState::default(),
            snapshot: CommentarySnapshot::default(),
            listeners: ListenerList::new(),
        })
    }

    pub fn listeners(&self) -> &ListenerList<dyn CommentaryListener> {
        &self.listeners
    }

    pub fn snapshot(&self) -> &CommentarySnapshot {
        &self.snapshot
    }

    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    pub fn inputs(&self) -> [f64; 3] {
        [self.snapshot.input1, self.snapshot.input2, self.snapshot.input3]
    }

    pub fn skip_checks(&self) -> bool {
        self.snapshot.skip_checks
    }
}

impl VersionedRecord for CommentaryInfo {
    fn kind(&self) -> RecordKind {
        RecordKind::Commentary
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
        self.listeners.dispatch(self.kind(), |l| l.on_commentary_info_updated(self, editor));
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        self.buffer.write_to(out)
    }
}
