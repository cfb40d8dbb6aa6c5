//! The update protocol shared by every record.
//!
//! Each tick a record runs three phases:
//!
//! 1. [`VersionedRecord::prepare_data_update`] resets per-tick caches.
//! 2. [`VersionedRecord::fill`] stages the new bytes and commits them only once
//!    complete. A failure here aborts the tick: the error is returned and
//!    nothing below runs.
//! 3. [`on_data_updated`] stamps the [`UpdateState`], decodes the snapshot,
//!    applies editor presets when the source is a preset, notifies listeners
//!    in registration order and finally runs the record's own hook.
//!
//! Listener failures (an `Err` return or a panic) are logged and skipped so
//! the remaining listeners still run.

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{error, trace, warn};

use crate::presets::EditorPresets;
use crate::registry::IdRegistry;
use crate::scoring::PlayerTelemetry;
use crate::source::DataSource;
use crate::types::{RecordBuffer, RecordKind};
use crate::Result;

/// Version stamp of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateState {
    update_id: u64,
    timestamp: i64,
    in_scope: bool,
}

impl UpdateState {
    /// Counter of successful updates, 0 before the first one.
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    /// Source clock of the last successful update.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Whether the last update was taken in a relevant context (cockpit or
    /// realtime, depending on the record). Frozen at update time.
    pub fn is_updated_in_scope(&self) -> bool {
        self.in_scope
    }

    pub fn is_valid(&self) -> bool {
        self.update_id > 0
    }

    pub(crate) fn mark_updated(&mut self, in_scope: bool, timestamp: i64) {
        self.in_scope = in_scope;
        self.timestamp = timestamp;
        self.update_id += 1;
    }
}

/// Session context handed to a record for one update.
#[derive(Debug)]
pub struct UpdateContext<'a> {
    /// Source clock in nanoseconds
    pub timestamp: i64,
    /// Value for the record's in-scope flag
    pub in_scope: bool,
    pub in_cockpit: bool,
    pub in_realtime: bool,
    /// Driver and class id assignment
    pub registry: &'a mut IdRegistry,
    /// Player engine values, present when telemetry was updated in scope
    pub player_telemetry: Option<PlayerTelemetry>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(timestamp: i64, registry: &'a mut IdRegistry) -> Self {
        Self {
            timestamp,
            in_scope: false,
            in_cockpit: false,
            in_realtime: false,
            registry,
            player_telemetry: None,
        }
    }
}

/// A record that is refilled every tick and versioned by [`UpdateState`].
pub trait VersionedRecord {
    fn kind(&self) -> RecordKind;

    fn update_state(&self) -> &UpdateState;

    fn update_state_mut(&mut self) -> &mut UpdateState;

    /// Phase 1. Reset transient per-tick caches.
    fn prepare_data_update(&mut self, _ctx: &UpdateContext<'_>) {}

    /// Phase 2. Stage and commit the record's buffers. On error the
    /// committed contents must be unchanged.
    fn fill(&mut self, source: &mut DataSource<'_>) -> Result<()>;

    /// Decode the committed buffers into the record's snapshot.
    fn decode(&mut self, ctx: &mut UpdateContext<'_>);

    /// Editor override pass over the freshly decoded snapshot.
    fn apply_presets(&mut self, _presets: &EditorPresets, _ctx: &mut UpdateContext<'_>) {}

    fn notify_listeners(&self, editor: bool);

    /// Internal hook, runs after every listener.
    fn after_data_updated(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Write the committed raw buffers, in stream order.
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()>;

    fn is_valid(&self) -> bool {
        self.update_state().is_valid()
    }
}

/// Run all three phases for one tick.
pub fn update_data<R: VersionedRecord + ?Sized>(
    record: &mut R,
    source: &mut DataSource<'_>,
    ctx: &mut UpdateContext<'_>,
) -> Result<()> {
    record.prepare_data_update(ctx);

    if let Err(err) = record.fill(source) {
        warn!(
            record = %record.kind(),
            source = source.label(),
            error = %err,
            "record update aborted for this tick"
        );
        return Err(err);
    }

    on_data_updated(record, source.presets(), ctx);
    Ok(())
}

/// Phase 3 of the protocol.
pub fn on_data_updated<R: VersionedRecord + ?Sized>(
    record: &mut R,
    presets: Option<&EditorPresets>,
    ctx: &mut UpdateContext<'_>,
) {
    record.update_state_mut().mark_updated(ctx.in_scope, ctx.timestamp);
    record.decode(ctx);

    if let Some(presets) = presets {
        record.apply_presets(presets, ctx);
    }

    trace!(
        record = %record.kind(),
        update_id = record.update_state().update_id(),
        editor = presets.is_some(),
        "record updated"
    );

    record.notify_listeners(presets.is_some());
    record.after_data_updated(ctx);
}

/// Stage and commit a single-buffer record from any source.
pub(crate) fn fill_buffer(
    buffer: &mut RecordBuffer,
    source: &mut DataSource<'_>,
    default_payload: &[u8],
) -> Result<()> {
    match source {
        DataSource::Live(handle) => buffer.stage_from_slice(handle.bytes())?,
        DataSource::Stream(input) => buffer.stage_from_reader(&mut **input)?,
        DataSource::Preset(_) => buffer.stage_from_reader(&mut Cursor::new(default_payload))?,
    }
    buffer.commit();
    Ok(())
}

/// Ordered listener registrations with copy-on-write storage.
///
/// Dispatch iterates a snapshot, so a listener may register or unregister
/// listeners (itself included) while being notified; the change applies
/// from the next dispatch on.
pub struct ListenerList<L: ?Sized> {
    items: RefCell<Rc<[Rc<L>]>>,
}

impl<L: ?Sized> Default for ListenerList<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> ListenerList<L> {
    pub fn new() -> Self {
        Self { items: RefCell::new(Rc::from(Vec::new())) }
    }

    /// Add a listener. Returns `false` if it is already registered.
    pub fn register(&self, listener: Rc<L>) -> bool {
        let current = self.snapshot();
        if current.iter().any(|l| same(l, &listener)) {
            return false;
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(listener);
        *self.items.borrow_mut() = Rc::from(next);
        true
    }

    /// Remove a listener. Removing one that is not registered is a no-op.
    pub fn unregister(&self, listener: &Rc<L>) -> bool {
        let current = self.snapshot();
        if !current.iter().any(|l| same(l, listener)) {
            return false;
        }

        let next: Vec<Rc<L>> = current.iter().filter(|l| !same(l, listener)).cloned().collect();
        *self.items.borrow_mut() = Rc::from(next);
        true
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current registrations. Later changes do not affect the returned slice.
    pub fn snapshot(&self) -> Rc<[Rc<L>]> {
        Rc::clone(&self.items.borrow())
    }

    /// Invoke `notify` for every listener in registration order, isolating
    /// failures. `origin` names the notifying record in logs.
    pub fn dispatch<F>(&self, origin: impl std::fmt::Display, mut notify: F)
    where
        F: FnMut(&L) -> anyhow::Result<()>,
    {
        let listeners = self.snapshot();
        for (index, listener) in listeners.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(origin = %origin, listener = index, error = ?err, "listener failed");
                }
                Err(payload) => {
                    error!(
                        origin = %origin,
                        listener = index,
                        panic = panic_message(payload.as_ref()),
                        "listener panicked"
                    );
                }
            }
        }
    }
}

fn same<L: ?Sized>(a: &Rc<L>, b: &Rc<L>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryError;
    use crate::source::LiveHandle;
    use std::cell::{Cell, RefCell};
    use std::io::{Cursor, Read};

    trait CountListener {
        fn on_counter_updated(&self, record: &Counter, editor: bool) -> anyhow::Result<()>;
    }

    /// Minimal record: one little-endian i32.
    struct Counter {
        state: UpdateState,
        committed: [u8; 4],
        value: i32,
        listeners: ListenerList<dyn CountListener>,
        hook_runs: Cell<u32>,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                state: UpdateState::default(),
                committed: [0; 4],
                value: 0,
                listeners: ListenerList::new(),
                hook_runs: Cell::new(0),
            }
        }
    }

    impl VersionedRecord for Counter {
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
            let mut staged = [0u8; 4];
            match source {
                DataSource::Stream(input) => {
                    let mut read = 0;
                    while read < 4 {
                        let n = input.read(&mut staged[read..])?;
                        if n == 0 {
                            return Err(TelemetryError::incomplete_read("counter", 4, read));
                        }
                        read += n;
                    }
                }
                DataSource::Live(handle) => staged.copy_from_slice(&handle.bytes()[..4]),
                DataSource::Preset(_) => staged = 7i32.to_le_bytes(),
            }
            self.committed = staged;
            Ok(())
        }

        fn decode(&mut self, _ctx: &mut UpdateContext<'_>) {
            self.value = i32::from_le_bytes(self.committed);
        }

        fn apply_presets(&mut self, _presets: &EditorPresets, _ctx: &mut UpdateContext<'_>) {
            self.value *= 100;
        }

        fn notify_listeners(&self, editor: bool) {
            self.listeners.dispatch(self.kind(), |l| l.on_counter_updated(self, editor));
        }

        fn after_data_updated(&mut self, _ctx: &mut UpdateContext<'_>) {
            self.hook_runs.set(self.hook_runs.get() + 1);
        }

        fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
            out.write_all(&self.committed)
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(u64, i64, bool)>>,
    }

    impl CountListener for Recorder {
        fn on_counter_updated(&self, record: &Counter, editor: bool) -> anyhow::Result<()> {
            let state = record.update_state();
            self.seen.borrow_mut().push((state.update_id(), state.timestamp(), editor));
            Ok(())
        }
    }

    struct Failing;

    impl CountListener for Failing {
        fn on_counter_updated(&self, _record: &Counter, _editor: bool) -> anyhow::Result<()> {
            anyhow::bail!("widget exploded")
        }
    }

    struct Panicking;

    impl CountListener for Panicking {
        fn on_counter_updated(&self, _record: &Counter, _editor: bool) -> anyhow::Result<()> {
            panic!("widget panicked")
        }
    }

    fn stream_update(record: &mut Counter, bytes: &[u8], timestamp: i64) -> Result<()> {
        let mut registry = IdRegistry::default();
        let mut ctx = UpdateContext::new(timestamp, &mut registry);
        let mut cursor = Cursor::new(bytes.to_vec());
        update_data(record, &mut DataSource::Stream(&mut cursor), &mut ctx)
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn update_ids_strictly_increase(values in prop::collection::vec(any::<i32>(), 1..30)) {
                let mut record = Counter::new();
                prop_assert_eq!(record.update_state().update_id(), 0);
                prop_assert!(!record.is_valid());

                let mut last = 0;
                for (tick, value) in values.iter().enumerate() {
                    stream_update(&mut record, &value.to_le_bytes(), tick as i64).unwrap();
                    let id = record.update_state().update_id();
                    prop_assert!(id > last);
                    prop_assert!(record.is_valid());
                    prop_assert_eq!(record.value, *value);
                    last = id;
                }
            }
        }
    }

    #[test]
    fn failing_listeners_do_not_stop_later_ones() {
        let mut record = Counter::new();
        let first = Rc::new(Recorder::default());
        let last = Rc::new(Recorder::default());
        record.listeners.register(first.clone());
        record.listeners.register(Rc::new(Failing));
        record.listeners.register(Rc::new(Panicking));
        record.listeners.register(last.clone());

        stream_update(&mut record, &5i32.to_le_bytes(), 1_000).unwrap();

        assert_eq!(*first.seen.borrow(), vec![(1, 1_000, false)]);
        assert_eq!(*last.seen.borrow(), vec![(1, 1_000, false)]);
        assert_eq!(record.update_state().update_id(), 1);
        assert_eq!(record.update_state().timestamp(), 1_000);
        assert_eq!(record.hook_runs.get(), 1);
    }

    #[test]
    fn short_stream_aborts_the_tick() {
        let mut record = Counter::new();
        stream_update(&mut record, &9i32.to_le_bytes(), 10).unwrap();

        let err = stream_update(&mut record, &[1, 2], 20).unwrap_err();
        assert!(matches!(err, TelemetryError::IncompleteRead { expected: 4, read: 2, .. }));
        assert_eq!(record.update_state().update_id(), 1);
        assert_eq!(record.update_state().timestamp(), 10);
        assert_eq!(record.value, 9);
        assert_eq!(record.hook_runs.get(), 1);
    }

    #[test]
    fn presets_apply_only_for_the_preset_source() {
        let mut record = Counter::new();
        let mut registry = IdRegistry::default();
        let presets = EditorPresets::default();
        let recorder = Rc::new(Recorder::default());
        record.listeners.register(recorder.clone());

        let mut ctx = UpdateContext::new(1, &mut registry);
        update_data(&mut record, &mut DataSource::Preset(&presets), &mut ctx).unwrap();
        assert_eq!(record.value, 700);

        let bytes = 7i32.to_le_bytes();
        let mut ctx = UpdateContext::new(2, &mut registry);
        update_data(&mut record, &mut DataSource::Live(LiveHandle::from_slice(&bytes)), &mut ctx)
            .unwrap();
        assert_eq!(record.value, 7);

        assert_eq!(*recorder.seen.borrow(), vec![(1, 1, true), (2, 2, false)]);
    }

    #[test]
    fn in_scope_flag_is_frozen_at_update_time() {
        let mut record = Counter::new();
        let mut registry = IdRegistry::default();

        let mut ctx = UpdateContext::new(1, &mut registry);
        ctx.in_scope = true;
        let mut cursor = Cursor::new(1i32.to_le_bytes().to_vec());
        update_data(&mut record, &mut DataSource::Stream(&mut cursor), &mut ctx).unwrap();
        assert!(record.update_state().is_updated_in_scope());

        let mut ctx = UpdateContext::new(2, &mut registry);
        let mut cursor = Cursor::new(1i32.to_le_bytes().to_vec());
        update_data(&mut record, &mut DataSource::Stream(&mut cursor), &mut ctx).unwrap();
        assert!(!record.update_state().is_updated_in_scope());
    }

    #[test]
    fn registration_is_by_identity_without_duplicates() {
        let list: ListenerList<dyn CountListener> = ListenerList::new();
        let a: Rc<dyn CountListener> = Rc::new(Recorder::default());
        let b: Rc<dyn CountListener> = Rc::new(Recorder::default());

        assert!(list.register(a.clone()));
        assert!(!list.register(a.clone()));
        assert!(list.register(b.clone()));
        assert_eq!(list.len(), 2);

        assert!(list.unregister(&a));
        assert!(!list.unregister(&a));
        assert_eq!(list.len(), 1);
        assert!(same(&list.snapshot()[0], &b));
    }

    #[test]
    fn snapshots_are_not_affected_by_later_changes() {
        let list: ListenerList<dyn CountListener> = ListenerList::new();
        let a: Rc<dyn CountListener> = Rc::new(Recorder::default());
        list.register(a.clone());

        let before = list.snapshot();
        list.unregister(&a);
        assert_eq!(before.len(), 1);
        assert!(list.is_empty());
    }

    struct SelfRemoving {
        me: RefCell<Option<Rc<dyn CountListener>>>,
        calls: Cell<u32>,
    }

    impl CountListener for SelfRemoving {
        fn on_counter_updated(&self, record: &Counter, _editor: bool) -> anyhow::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if let Some(me) = self.me.borrow_mut().take() {
                record.listeners.unregister(&me);
            }
            Ok(())
        }
    }

    #[test]
    fn listeners_may_unregister_during_dispatch() {
        let mut record = Counter::new();
        let listener = Rc::new(SelfRemoving { me: RefCell::new(None), calls: Cell::new(0) });
        let as_dyn: Rc<dyn CountListener> = listener.clone();
        *listener.me.borrow_mut() = Some(as_dyn.clone());
        let tail = Rc::new(Recorder::default());

        record.listeners.register(as_dyn);
        record.listeners.register(tail.clone());

        stream_update(&mut record, &1i32.to_le_bytes(), 1).unwrap();
        stream_update(&mut record, &2i32.to_le_bytes(), 2).unwrap();

        assert_eq!(listener.calls.get(), 1);
        assert_eq!(tail.seen.borrow().len(), 2);
    }
}
