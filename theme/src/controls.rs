//! Floating theme toggle and back-to-top buttons.
//!
//! STATE MACHINE
//! =============
//! Each button's state derives from the scroll phase and its own reveal rule:
//!
//! | phase | rule says shown | rule says hidden |
//! |-------|-----------------|------------------|
//! | idle | `Visible` | `Hidden` |
//! | scrolling | `Suppressed` | `Hidden` |
//!
//! A scroll sample enters the scrolling phase; the idle event returns to
//! idle. The two rules (toggle past 100px, back-to-top past 300px) are
//! evaluated independently.
//!
//! LIFECYCLE
//! =========
//! [`FloatingControlsCoordinator::init`] is idempotent: it tears down any
//! previous mount (nodes, listeners, timers) before creating new ones, and
//! asks the host to clear stray nodes carrying the same class names. If the
//! container is not in the document yet, mounting retries on a bounded
//! exponential backoff, or earlier if the host reports the container
//! appeared, and gives up quietly when the budget is spent.

#[cfg(test)]
#[path = "controls_test.rs"]
mod controls_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::applier::ThemeApplier;
use crate::config::ControlsConfig;
use crate::dispose::{DisposeBag, Disposer};
use crate::preference::{ResolvedTheme, ThemePreference};
use crate::schedule::Scheduler;
use crate::scroll::{ScrollState, ScrollTracker};
use crate::store::ThemeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    ThemeToggle,
    BackToTop,
}

impl ButtonKind {
    pub const ALL: [Self; 2] = [Self::ThemeToggle, Self::BackToTop];

    /// The fixed class name site styling targets.
    #[must_use]
    pub fn class_name(self, config: &ControlsConfig) -> &str {
        match self {
            Self::ThemeToggle => &config.toggle_class,
            Self::BackToTop => &config.back_to_top_class,
        }
    }

    #[must_use]
    pub fn reveal_px(self, config: &ControlsConfig) -> f64 {
        match self {
            Self::ThemeToggle => config.toggle_reveal_px,
            Self::BackToTop => config.back_to_top_reveal_px,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Visible,
    /// Temporarily faded out while the page scrolls.
    Suppressed,
    /// Removed from layout because the reveal rule says so.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlsPhase {
    #[default]
    Idle,
    Scrolling,
}

/// Pure state rule from the table in the module docs.
#[must_use]
pub fn button_state(phase: ControlsPhase, position_y: f64, reveal_px: f64) -> ButtonState {
    if position_y <= reveal_px {
        return ButtonState::Hidden;
    }
    match phase {
        ControlsPhase::Idle => ButtonState::Visible,
        ControlsPhase::Scrolling => ButtonState::Suppressed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Unmounted,
    /// Waiting to run attempt number `attempt` (1-based).
    Pending { attempt: u32 },
    Mounted,
    /// Retry budget spent; the controls are absent for this page view.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    #[error("floating controls container {0:?} is not in the document")]
    ContainerMissing(String),
    #[error("failed to build floating button: {0}")]
    Dom(String),
}

/// A mounted button node. Dropping it removes the node and its listener.
pub trait FloatingButton {
    fn set_state(&self, state: ButtonState);
    fn set_icon(&self, theme: ResolvedTheme);
}

/// DOM operations the coordinator needs.
pub trait ControlsHost {
    /// Remove every node carrying `kind`'s class, whoever created it.
    fn clear_strays(&self, kind: ButtonKind);

    fn mount_button(&self, kind: ButtonKind, on_click: Rc<dyn Fn()>) -> Result<Box<dyn FloatingButton>, MountError>;

    fn scroll_to_top(&self);

    /// Show `message`; dropping the disposer removes it.
    fn show_toast(&self, message: &str) -> Disposer;

    /// One-shot signal that the container may have appeared.
    fn watch_for_container(&self, on_ready: Box<dyn FnOnce()>) -> Disposer {
        drop(on_ready);
        Disposer::noop()
    }
}

struct MountedButton {
    node: Box<dyn FloatingButton>,
    state: Cell<Option<ButtonState>>,
}

impl MountedButton {
    fn show(&self, state: ButtonState) {
        if self.state.get() != Some(state) {
            self.node.set_state(state);
            self.state.set(Some(state));
        }
    }
}

struct Mounted {
    // Declared first so listeners detach before the nodes go away.
    _subscriptions: DisposeBag,
    toggle: MountedButton,
    back_to_top: MountedButton,
    phase: Cell<ControlsPhase>,
}

impl Mounted {
    fn button(&self, kind: ButtonKind) -> &MountedButton {
        match kind {
            ButtonKind::ThemeToggle => &self.toggle,
            ButtonKind::BackToTop => &self.back_to_top,
        }
    }
}

struct CoordinatorInner {
    host: Box<dyn ControlsHost>,
    store: Rc<ThemeStore>,
    applier: ThemeApplier,
    tracker: ScrollTracker,
    scheduler: Rc<dyn Scheduler>,
    config: ControlsConfig,
    mounted: RefCell<Option<Mounted>>,
    status: Cell<MountStatus>,
    retry: RefCell<Option<DisposeBag>>,
    toast: RefCell<Option<DisposeBag>>,
}

pub struct FloatingControlsCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl FloatingControlsCoordinator {
    pub fn new(
        host: Box<dyn ControlsHost>,
        applier: ThemeApplier,
        tracker: ScrollTracker,
        scheduler: Rc<dyn Scheduler>,
        config: ControlsConfig,
    ) -> Self {
        let store = Rc::clone(applier.store());
        Self {
            inner: Rc::new(CoordinatorInner {
                host,
                store,
                applier,
                tracker,
                scheduler,
                config,
                mounted: RefCell::new(None),
                status: Cell::new(MountStatus::Unmounted),
                retry: RefCell::new(None),
                toast: RefCell::new(None),
            }),
        }
    }

    /// Tear down any previous mount and mount afresh.
    pub fn init(&self) {
        teardown(&self.inner);
        attempt_mount(&self.inner, 1);
    }

    /// Remove buttons, listeners, pending retries, and any toast.
    pub fn teardown(&self) {
        teardown(&self.inner);
    }

    #[must_use]
    pub fn status(&self) -> MountStatus {
        self.inner.status.get()
    }

    #[must_use]
    pub fn phase(&self) -> Option<ControlsPhase> {
        self.inner.mounted.borrow().as_ref().map(|m| m.phase.get())
    }

    #[must_use]
    pub fn button_state(&self, kind: ButtonKind) -> Option<ButtonState> {
        self.inner
            .mounted
            .borrow()
            .as_ref()
            .and_then(|m| m.button(kind).state.get())
    }

    /// The toggle button's click path: cycle, resolve, apply, toast.
    pub fn cycle_theme(&self) -> ThemePreference {
        cycle_theme(&self.inner)
    }

    /// The back-to-top button's click path.
    pub fn scroll_to_top(&self) {
        self.inner.host.scroll_to_top();
    }
}

impl Drop for FloatingControlsCoordinator {
    fn drop(&mut self) {
        teardown(&self.inner);
    }
}

fn teardown(inner: &CoordinatorInner) {
    let retry = inner.retry.borrow_mut().take();
    drop(retry);
    let toast = inner.toast.borrow_mut().take();
    drop(toast);
    let mounted = inner.mounted.borrow_mut().take();
    if mounted.is_some() {
        log::debug!("theme: floating controls torn down");
    }
    drop(mounted);
    inner.status.set(MountStatus::Unmounted);
}

fn attempt_mount(inner: &Rc<CoordinatorInner>, attempt: u32) {
    let pending = inner.retry.borrow_mut().take();
    drop(pending);

    for kind in ButtonKind::ALL {
        inner.host.clear_strays(kind);
    }

    match mount_pair(inner) {
        Ok(mounted) => {
            *inner.mounted.borrow_mut() = Some(mounted);
            inner.status.set(MountStatus::Mounted);
            refresh_buttons(inner, inner.tracker.current().position_y);
            if let Some(theme) = inner.applier.current() {
                set_icon(inner, theme);
            }
            log::debug!("theme: floating controls mounted on attempt {attempt}");
        }
        Err(err) => schedule_retry(inner, attempt + 1, &err),
    }
}

fn schedule_retry(inner: &Rc<CoordinatorInner>, attempt: u32, err: &MountError) {
    let Some(delay_ms) = inner.config.retry.delay_before(attempt) else {
        log::warn!(
            "theme: giving up on floating controls after {} attempts: {err}",
            inner.config.retry.max_attempts
        );
        inner.status.set(MountStatus::Absent);
        return;
    };

    log::debug!("theme: {err}; retrying in {delay_ms}ms (attempt {attempt})");
    inner.status.set(MountStatus::Pending { attempt });

    let mut bag = DisposeBag::new();
    let weak = Rc::downgrade(inner);
    bag.push(inner.scheduler.set_timeout(
        delay_ms,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                attempt_mount(&inner, attempt);
            }
        }),
    ));
    let weak = Rc::downgrade(inner);
    bag.push(inner.host.watch_for_container(Box::new(move || {
        if let Some(inner) = weak.upgrade() {
            attempt_mount(&inner, attempt);
        }
    })));
    *inner.retry.borrow_mut() = Some(bag);
}

fn mount_pair(inner: &Rc<CoordinatorInner>) -> Result<Mounted, MountError> {
    let weak = Rc::downgrade(inner);
    let on_toggle: Rc<dyn Fn()> = Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            cycle_theme(&inner);
        }
    });
    let weak = Rc::downgrade(inner);
    let on_back_to_top: Rc<dyn Fn()> = Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            inner.host.scroll_to_top();
        }
    });

    let toggle = inner.host.mount_button(ButtonKind::ThemeToggle, on_toggle)?;
    // A failure here drops `toggle`, which removes the half-built pair.
    let back_to_top = inner.host.mount_button(ButtonKind::BackToTop, on_back_to_top)?;

    // A mount that lands mid-burst stays suppressed until the burst settles.
    let phase = if inner.tracker.is_scrolling() { ControlsPhase::Scrolling } else { ControlsPhase::Idle };
    let mut subscriptions = DisposeBag::new();
    subscriptions.push(inner.applier.subscribe(listener(inner, set_icon)));
    subscriptions.push(inner.tracker.on_sample(listener(inner, |inner, sample: ScrollState| {
        set_phase(inner, ControlsPhase::Scrolling);
        refresh_buttons(inner, sample.position_y);
    })));
    subscriptions.push(inner.tracker.on_idle(
        inner.tracker.idle_ms(),
        listener(inner, |inner, state: ScrollState| {
            set_phase(inner, ControlsPhase::Idle);
            refresh_buttons(inner, state.position_y);
        }),
    ));

    Ok(Mounted {
        _subscriptions: subscriptions,
        toggle: MountedButton { node: toggle, state: Cell::new(None) },
        back_to_top: MountedButton { node: back_to_top, state: Cell::new(None) },
        phase: Cell::new(phase),
    })
}

/// Adapt `f` into a listener holding only a weak reference to the coordinator.
fn listener<T: 'static>(inner: &Rc<CoordinatorInner>, f: fn(&CoordinatorInner, T)) -> impl Fn(T) + 'static {
    let weak: Weak<CoordinatorInner> = Rc::downgrade(inner);
    move |value| {
        if let Some(inner) = weak.upgrade() {
            f(&inner, value);
        }
    }
}

fn set_phase(inner: &CoordinatorInner, phase: ControlsPhase) {
    if let Some(mounted) = inner.mounted.borrow().as_ref() {
        mounted.phase.set(phase);
    }
}

fn refresh_buttons(inner: &CoordinatorInner, position_y: f64) {
    let mounted = inner.mounted.borrow();
    let Some(mounted) = mounted.as_ref() else {
        return;
    };
    let phase = mounted.phase.get();
    for kind in ButtonKind::ALL {
        let state = button_state(phase, position_y, kind.reveal_px(&inner.config));
        mounted.button(kind).show(state);
    }
}

fn set_icon(inner: &CoordinatorInner, theme: ResolvedTheme) {
    if let Some(mounted) = inner.mounted.borrow().as_ref() {
        mounted.toggle.node.set_icon(theme);
    }
}

fn cycle_theme(inner: &Rc<CoordinatorInner>) -> ThemePreference {
    let next = inner.store.cycle();
    inner.applier.apply_preference(next);
    show_toast(inner, inner.config.labels.for_preference(next));
    next
}

fn show_toast(inner: &Rc<CoordinatorInner>, message: &str) {
    let previous = inner.toast.borrow_mut().take();
    drop(previous);

    let mut bag = DisposeBag::new();
    bag.push(inner.host.show_toast(message));
    let weak = Rc::downgrade(inner);
    bag.push(inner.scheduler.set_timeout(
        inner.config.toast_ms,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                let expired = inner.toast.borrow_mut().take();
                drop(expired);
            }
        }),
    ));
    *inner.toast.borrow_mut() = Some(bag);
}
