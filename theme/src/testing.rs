//! In-memory stand-ins for every host trait.
//!
//! Used by the crate's unit tests, its `tests/` scenarios, and available to
//! downstream crates that want to drive the chrome without a browser. Each
//! fake is a cheap `Clone` handle so a test can keep one copy for inspection
//! and hand another to the component under test.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::ambient::{AmbientHost, AmbientScene, SceneHandle};
use crate::applier::ThemeMarker;
use crate::consts::MARKER_DARK;
use crate::controls::{ButtonKind, ButtonState, ControlsHost, FloatingButton, MountError};
use crate::dispose::Disposer;
use crate::preference::ResolvedTheme;
use crate::schedule::{Scheduler, Timestamp};
use crate::store::{PreferenceStorage, StorageError};

// =============================================================
// Scheduler
// =============================================================

enum TaskKind {
    Once(Option<Box<dyn FnOnce()>>),
    Repeat { period_ms: i64, task: Option<Box<dyn FnMut()>> },
}

struct Task {
    id: u64,
    due_ms: i64,
    kind: TaskKind,
}

struct SchedulerInner {
    now_ms: Cell<i64>,
    utc_offset_minutes: Cell<i32>,
    next_id: Cell<u64>,
    tasks: RefCell<Vec<Task>>,
    frames: RefCell<Vec<(u64, Box<dyn FnOnce(f64)>)>>,
}

impl SchedulerInner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

/// Virtual-time scheduler. Nothing runs until the test advances time or
/// flushes frames.
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Rc<SchedulerInner>,
}

impl ManualScheduler {
    #[must_use]
    pub fn starting_at(now: Timestamp) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                now_ms: Cell::new(now.epoch_ms),
                utc_offset_minutes: Cell::new(now.utc_offset_minutes),
                next_id: Cell::new(0),
                tasks: RefCell::new(Vec::new()),
                frames: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Move the clock forward by `ms`, running every timer that falls due,
    /// in due order.
    pub fn advance(&self, ms: u32) {
        let target = self.inner.now_ms.get() + i64::from(ms);
        while let Some(id) = self.next_due(target) {
            self.run_task(id);
        }
        self.inner.now_ms.set(target);
    }

    /// Jump the wall clock without running timers (a sleeping laptop).
    pub fn set_now(&self, now: Timestamp) {
        self.inner.now_ms.set(now.epoch_ms);
        self.inner.utc_offset_minutes.set(now.utc_offset_minutes);
    }

    /// Run every frame callback requested so far; callbacks requested while
    /// running wait for the next call.
    pub fn run_frame(&self) -> usize {
        let frames = std::mem::take(&mut *self.inner.frames.borrow_mut());
        let count = frames.len();
        #[allow(clippy::cast_precision_loss)]
        let ts = self.inner.now_ms.get() as f64;
        for (_, task) in frames {
            task(ts);
        }
        count
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    fn next_due(&self, target: i64) -> Option<u64> {
        self.inner
            .tasks
            .borrow()
            .iter()
            .filter(|t| t.due_ms <= target && task_is_ready(t))
            .min_by_key(|t| (t.due_ms, t.id))
            .map(|t| t.id)
    }

    fn run_task(&self, id: u64) {
        let (due_ms, kind) = {
            let mut tasks = self.inner.tasks.borrow_mut();
            let Some(pos) = tasks.iter().position(|t| t.id == id) else {
                return;
            };
            let due_ms = tasks[pos].due_ms;
            if matches!(tasks[pos].kind, TaskKind::Once(_)) {
                (due_ms, tasks.remove(pos).kind)
            } else if let TaskKind::Repeat { period_ms, task } = &mut tasks[pos].kind {
                (due_ms, TaskKind::Repeat { period_ms: *period_ms, task: task.take() })
            } else {
                return;
            }
        };
        self.inner.now_ms.set(due_ms);

        match kind {
            TaskKind::Once(Some(task)) => task(),
            TaskKind::Repeat { period_ms, task: Some(mut task) } => {
                task();
                // Put the callback back unless the interval was cancelled while running.
                let mut tasks = self.inner.tasks.borrow_mut();
                if let Some(entry) = tasks.iter_mut().find(|t| t.id == id) {
                    entry.due_ms = due_ms + period_ms.max(1);
                    entry.kind = TaskKind::Repeat { period_ms, task: Some(task) };
                }
            }
            TaskKind::Once(None) | TaskKind::Repeat { task: None, .. } => {}
        }
    }

    fn cancel_task(weak: &Weak<SchedulerInner>, id: u64) -> Disposer {
        let weak = weak.clone();
        Disposer::new(move || {
            if let Some(inner) = weak.upgrade() {
                let removed: Vec<Task> = {
                    let mut tasks = inner.tasks.borrow_mut();
                    let (gone, kept) = tasks.drain(..).partition(|t| t.id == id);
                    *tasks = kept;
                    gone
                };
                drop(removed);
            }
        })
    }
}

fn task_is_ready(task: &Task) -> bool {
    match &task.kind {
        TaskKind::Once(f) => f.is_some(),
        TaskKind::Repeat { task, .. } => task.is_some(),
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.inner.now_ms.get(), self.inner.utc_offset_minutes.get())
    }

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Disposer {
        let id = self.inner.next_id();
        self.inner.tasks.borrow_mut().push(Task {
            id,
            due_ms: self.inner.now_ms.get() + i64::from(delay_ms),
            kind: TaskKind::Once(Some(task)),
        });
        Self::cancel_task(&Rc::downgrade(&self.inner), id)
    }

    fn set_interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> Disposer {
        let id = self.inner.next_id();
        let period_ms = i64::from(period_ms);
        self.inner.tasks.borrow_mut().push(Task {
            id,
            due_ms: self.inner.now_ms.get() + period_ms,
            kind: TaskKind::Repeat { period_ms, task: Some(task) },
        });
        Self::cancel_task(&Rc::downgrade(&self.inner), id)
    }

    fn request_frame(&self, task: Box<dyn FnOnce(f64)>) -> Disposer {
        let id = self.inner.next_id();
        self.inner.frames.borrow_mut().push((id, task));
        let weak = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = weak.upgrade() {
                let removed: Vec<(u64, Box<dyn FnOnce(f64)>)> = {
                    let mut frames = inner.frames.borrow_mut();
                    let (gone, kept) = frames.drain(..).partition(|(fid, _)| *fid == id);
                    *frames = kept;
                    gone
                };
                drop(removed);
            }
        })
    }
}

// =============================================================
// Storage
// =============================================================

/// Shared-map storage with switchable failures.
#[derive(Clone, Default)]
pub struct SharedStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_reads: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
    write_attempts: Rc<Cell<usize>>,
}

impl SharedStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.get()
    }
}

impl PreferenceStorage for SharedStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.get() {
            return Err(StorageError::Unavailable);
        }
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write_attempts.set(self.write_attempts.get() + 1);
        if self.fail_writes.get() {
            return Err(StorageError::WriteRejected("quota exceeded".to_owned()));
        }
        self.put_raw(key, value);
        Ok(())
    }
}

// =============================================================
// Marker
// =============================================================

/// Records every marker write and the resulting attribute value.
#[derive(Clone, Default)]
pub struct RecordingMarker {
    attribute: Rc<RefCell<Option<String>>>,
    writes: Rc<RefCell<Vec<ResolvedTheme>>>,
}

impl RecordingMarker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The marker attribute as the document would show it.
    #[must_use]
    pub fn attribute(&self) -> Option<String> {
        self.attribute.borrow().clone()
    }

    #[must_use]
    pub fn writes(&self) -> Vec<ResolvedTheme> {
        self.writes.borrow().clone()
    }
}

impl ThemeMarker for RecordingMarker {
    fn write(&self, theme: ResolvedTheme) {
        *self.attribute.borrow_mut() = theme.is_dark().then(|| MARKER_DARK.to_owned());
        self.writes.borrow_mut().push(theme);
    }
}

// =============================================================
// Floating controls
// =============================================================

struct FakeButtonNode {
    node_id: u64,
    kind: ButtonKind,
    state: Option<ButtonState>,
    icon: Option<ResolvedTheme>,
    on_click: Option<Rc<dyn Fn()>>,
    /// Created by [`FakeControlsHost::insert_stray`] rather than mounted.
    stray: bool,
}

#[derive(Default)]
struct FakeDocument {
    container_present: bool,
    next_node_id: u64,
    buttons: Vec<FakeButtonNode>,
    toasts: Vec<(u64, String)>,
    toast_history: Vec<String>,
    scroll_to_top_calls: usize,
    container_watchers: Vec<(u64, Box<dyn FnOnce()>)>,
    mount_calls: usize,
}

impl FakeDocument {
    fn next_node_id(&mut self) -> u64 {
        self.next_node_id += 1;
        self.next_node_id
    }
}

/// A fake document holding the floating buttons.
#[derive(Clone)]
pub struct FakeControlsHost {
    doc: Rc<RefCell<FakeDocument>>,
}

impl Default for FakeControlsHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeControlsHost {
    /// A document whose container is already present.
    #[must_use]
    pub fn new() -> Self {
        Self { doc: Rc::new(RefCell::new(FakeDocument { container_present: true, ..FakeDocument::default() })) }
    }

    /// A document whose container has not been rendered yet.
    #[must_use]
    pub fn without_container() -> Self {
        Self { doc: Rc::new(RefCell::new(FakeDocument::default())) }
    }

    /// Insert the container and fire any pending "appeared" watchers.
    pub fn insert_container(&self) {
        let watchers = {
            let mut doc = self.doc.borrow_mut();
            doc.container_present = true;
            std::mem::take(&mut doc.container_watchers)
        };
        for (_, on_ready) in watchers {
            on_ready();
        }
    }

    /// Insert the container without notifying watchers.
    pub fn insert_container_silently(&self) {
        self.doc.borrow_mut().container_present = true;
    }

    /// Simulate another script's leftover button with the same class.
    pub fn insert_stray(&self, kind: ButtonKind) {
        let mut doc = self.doc.borrow_mut();
        let node_id = doc.next_node_id();
        doc.buttons.push(FakeButtonNode { node_id, kind, state: None, icon: None, on_click: None, stray: true });
    }

    #[must_use]
    pub fn count(&self, kind: ButtonKind) -> usize {
        self.doc.borrow().buttons.iter().filter(|b| b.kind == kind).count()
    }

    #[must_use]
    pub fn state(&self, kind: ButtonKind) -> Option<ButtonState> {
        self.doc
            .borrow()
            .buttons
            .iter()
            .find(|b| b.kind == kind && !b.stray)
            .and_then(|b| b.state)
    }

    /// Whether `kind` is shown to the reader.
    #[must_use]
    pub fn is_visible(&self, kind: ButtonKind) -> bool {
        self.state(kind) == Some(ButtonState::Visible)
    }

    #[must_use]
    pub fn toggle_icon(&self) -> Option<ResolvedTheme> {
        self.doc
            .borrow()
            .buttons
            .iter()
            .find(|b| b.kind == ButtonKind::ThemeToggle && !b.stray)
            .and_then(|b| b.icon)
    }

    /// Click every mounted button of `kind`; returns how many handlers ran.
    pub fn click(&self, kind: ButtonKind) -> usize {
        let handlers: Vec<Rc<dyn Fn()>> = self
            .doc
            .borrow()
            .buttons
            .iter()
            .filter(|b| b.kind == kind)
            .filter_map(|b| b.on_click.clone())
            .collect();
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    #[must_use]
    pub fn toasts(&self) -> Vec<String> {
        self.doc.borrow().toasts.iter().map(|(_, text)| text.clone()).collect()
    }

    #[must_use]
    pub fn toast_history(&self) -> Vec<String> {
        self.doc.borrow().toast_history.clone()
    }

    #[must_use]
    pub fn scroll_to_top_calls(&self) -> usize {
        self.doc.borrow().scroll_to_top_calls
    }

    #[must_use]
    pub fn pending_watchers(&self) -> usize {
        self.doc.borrow().container_watchers.len()
    }

    #[must_use]
    pub fn mount_calls(&self) -> usize {
        self.doc.borrow().mount_calls
    }
}

struct FakeButton {
    doc: Weak<RefCell<FakeDocument>>,
    node_id: u64,
}

impl FakeButton {
    fn with_node(&self, f: impl FnOnce(&mut FakeButtonNode)) {
        if let Some(doc) = self.doc.upgrade() {
            if let Some(node) = doc.borrow_mut().buttons.iter_mut().find(|b| b.node_id == self.node_id) {
                f(node);
            }
        }
    }
}

impl FloatingButton for FakeButton {
    fn set_state(&self, state: ButtonState) {
        self.with_node(|node| node.state = Some(state));
    }

    fn set_icon(&self, theme: ResolvedTheme) {
        self.with_node(|node| node.icon = Some(theme));
    }
}

impl Drop for FakeButton {
    fn drop(&mut self) {
        if let Some(doc) = self.doc.upgrade() {
            let removed: Vec<FakeButtonNode> = {
                let mut doc = doc.borrow_mut();
                let (gone, kept) = doc.buttons.drain(..).partition(|b| b.node_id == self.node_id);
                doc.buttons = kept;
                gone
            };
            drop(removed);
        }
    }
}

impl ControlsHost for FakeControlsHost {
    fn clear_strays(&self, kind: ButtonKind) {
        let removed: Vec<FakeButtonNode> = {
            let mut doc = self.doc.borrow_mut();
            let (gone, kept) = doc.buttons.drain(..).partition(|b| b.kind == kind && b.stray);
            doc.buttons = kept;
            gone
        };
        drop(removed);
    }

    fn mount_button(&self, kind: ButtonKind, on_click: Rc<dyn Fn()>) -> Result<Box<dyn FloatingButton>, MountError> {
        let mut doc = self.doc.borrow_mut();
        doc.mount_calls += 1;
        if !doc.container_present {
            return Err(MountError::ContainerMissing("body".to_owned()));
        }
        let node_id = doc.next_node_id();
        doc.buttons.push(FakeButtonNode {
            node_id,
            kind,
            state: None,
            icon: None,
            on_click: Some(on_click),
            stray: false,
        });
        Ok(Box::new(FakeButton { doc: Rc::downgrade(&self.doc), node_id }))
    }

    fn scroll_to_top(&self) {
        self.doc.borrow_mut().scroll_to_top_calls += 1;
    }

    fn show_toast(&self, message: &str) -> Disposer {
        let node_id = {
            let mut doc = self.doc.borrow_mut();
            let node_id = doc.next_node_id();
            doc.toasts.push((node_id, message.to_owned()));
            doc.toast_history.push(message.to_owned());
            node_id
        };
        let weak = Rc::downgrade(&self.doc);
        Disposer::new(move || {
            if let Some(doc) = weak.upgrade() {
                doc.borrow_mut().toasts.retain(|(id, _)| *id != node_id);
            }
        })
    }

    fn watch_for_container(&self, on_ready: Box<dyn FnOnce()>) -> Disposer {
        let node_id = {
            let mut doc = self.doc.borrow_mut();
            let node_id = doc.next_node_id();
            doc.container_watchers.push((node_id, on_ready));
            node_id
        };
        let weak = Rc::downgrade(&self.doc);
        Disposer::new(move || {
            if let Some(doc) = weak.upgrade() {
                let removed: Vec<(u64, Box<dyn FnOnce()>)> = {
                    let mut doc = doc.borrow_mut();
                    let (gone, kept) = doc.container_watchers.drain(..).partition(|(id, _)| *id == node_id);
                    doc.container_watchers = kept;
                    gone
                };
                drop(removed);
            }
        })
    }
}

// =============================================================
// Ambient
// =============================================================

#[derive(Default)]
struct FakeBackdrop {
    reduced_motion: bool,
    next_scene_id: u64,
    scenes: Vec<(u64, AmbientScene, bool)>,
    offset_updates: usize,
    navbar: Vec<String>,
}

/// Records rendered scenes and navbar paints.
#[derive(Clone, Default)]
pub struct FakeAmbientHost {
    state: Rc<RefCell<FakeBackdrop>>,
}

impl FakeAmbientHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reduced_motion() -> Self {
        let host = Self::default();
        host.state.borrow_mut().reduced_motion = true;
        host
    }

    /// Scenes currently in the document.
    #[must_use]
    pub fn live_scenes(&self) -> Vec<AmbientScene> {
        self.state.borrow().scenes.iter().map(|(_, scene, _)| scene.clone()).collect()
    }

    /// Whether the live scene was rendered with animation.
    #[must_use]
    pub fn live_animated(&self) -> Vec<bool> {
        self.state.borrow().scenes.iter().map(|(_, _, animate)| *animate).collect()
    }

    #[must_use]
    pub fn offset_updates(&self) -> usize {
        self.state.borrow().offset_updates
    }

    #[must_use]
    pub fn navbar_paints(&self) -> Vec<String> {
        self.state.borrow().navbar.clone()
    }
}

struct FakeScene {
    state: Weak<RefCell<FakeBackdrop>>,
    scene_id: u64,
}

impl SceneHandle for FakeScene {
    fn set_offsets(&self, _offsets: &[(f64, f64)]) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().offset_updates += 1;
        }
    }
}

impl Drop for FakeScene {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().scenes.retain(|(id, _, _)| *id != self.scene_id);
        }
    }
}

impl AmbientHost for FakeAmbientHost {
    fn prefers_reduced_motion(&self) -> bool {
        self.state.borrow().reduced_motion
    }

    fn render(&self, scene: &AmbientScene, animate: bool) -> Box<dyn SceneHandle> {
        let mut state = self.state.borrow_mut();
        state.next_scene_id += 1;
        let scene_id = state.next_scene_id;
        state.scenes.push((scene_id, scene.clone(), animate));
        Box::new(FakeScene { state: Rc::downgrade(&self.state), scene_id })
    }

    fn paint_navbar(&self, background: &str) {
        self.state.borrow_mut().navbar.push(background.to_owned());
    }
}
