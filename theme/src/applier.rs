//! Applies the resolved theme to the document and fans out change events.
//!
//! [`ThemeApplier`] is the only writer of the document theme marker. It
//! guarantees:
//!
//! - the marker is written only when the resolved value changes;
//! - listeners run synchronously, in registration order, after the marker
//!   write, so they can read the marker and see the new theme;
//! - a change requested from inside a listener is queued and applied after
//!   the current round finishes, so notifications never interleave;
//! - while the preference is `auto` a periodic recheck re-resolves against
//!   the clock, and the timer does not exist while the preference is explicit.

#[cfg(test)]
#[path = "applier_test.rs"]
mod applier_test;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::dispose::Disposer;
use crate::preference::{DayBounds, ResolvedTheme, ThemePreference};
use crate::schedule::Scheduler;
use crate::store::ThemeStore;

/// Writes the theme marker on the document root.
///
/// Dark sets the marker to `dark`; light removes it.
pub trait ThemeMarker {
    fn write(&self, theme: ResolvedTheme);
}

type Listener = Rc<dyn Fn(ResolvedTheme)>;

struct ApplierInner {
    store: Rc<ThemeStore>,
    marker: Box<dyn ThemeMarker>,
    scheduler: Rc<dyn Scheduler>,
    bounds: DayBounds,
    recheck_interval_ms: u32,
    applied: Cell<Option<ResolvedTheme>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener_id: Cell<u64>,
    notifying: Cell<bool>,
    queued: RefCell<VecDeque<ResolvedTheme>>,
    recheck: RefCell<Option<Disposer>>,
}

/// Cheap-to-clone handle; all clones share one applier.
#[derive(Clone)]
pub struct ThemeApplier {
    inner: Rc<ApplierInner>,
}

impl ThemeApplier {
    pub fn new(
        store: Rc<ThemeStore>,
        marker: Box<dyn ThemeMarker>,
        scheduler: Rc<dyn Scheduler>,
        bounds: DayBounds,
        recheck_interval_ms: u32,
    ) -> Self {
        Self {
            inner: Rc::new(ApplierInner {
                store,
                marker,
                scheduler,
                bounds,
                recheck_interval_ms,
                applied: Cell::new(None),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
                notifying: Cell::new(false),
                queued: RefCell::new(VecDeque::new()),
                recheck: RefCell::new(None),
            }),
        }
    }

    /// Resolve `pref` against the scheduler's current time.
    #[must_use]
    pub fn resolve(&self, pref: ThemePreference) -> ResolvedTheme {
        self.inner.bounds.resolve(pref, self.inner.scheduler.now())
    }

    /// The last theme written to the marker, if any.
    #[must_use]
    pub fn current(&self) -> Option<ResolvedTheme> {
        self.inner.applied.get()
    }

    #[must_use]
    pub fn store(&self) -> &Rc<ThemeStore> {
        &self.inner.store
    }

    /// True while the `auto` recheck timer is armed.
    #[must_use]
    pub fn is_rechecking(&self) -> bool {
        self.inner.recheck.borrow().is_some()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Write `resolved` to the marker and notify listeners, if it changed.
    pub fn apply(&self, resolved: ResolvedTheme) {
        apply_inner(&self.inner, resolved);
    }

    /// Resolve and apply `pref`, then arm or cancel the `auto` recheck.
    pub fn apply_preference(&self, pref: ThemePreference) {
        self.apply(self.resolve(pref));
        sync_recheck(&self.inner, pref);
    }

    /// Re-read the stored preference and apply it.
    ///
    /// Used on page load and when an external signal (such as an OS
    /// color-scheme change) asks for a recheck.
    pub fn refresh(&self) {
        let pref = self.inner.store.get();
        self.apply_preference(pref);
    }

    /// Register `listener` for theme changes. Dropping the returned
    /// [`Disposer`] detaches it, including mid-notification.
    pub fn subscribe(&self, listener: impl Fn(ResolvedTheme) + 'static) -> Disposer {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));

        let weak = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

fn apply_inner(inner: &Rc<ApplierInner>, resolved: ResolvedTheme) {
    if inner.notifying.get() {
        inner.queued.borrow_mut().push_back(resolved);
        return;
    }

    let mut next = Some(resolved);
    while let Some(theme) = next {
        if inner.applied.get() != Some(theme) {
            inner.marker.write(theme);
            inner.applied.set(Some(theme));
            log::debug!("theme: applied {theme}");
            notify(inner, theme);
        }
        next = inner.queued.borrow_mut().pop_front();
    }
}

fn notify(inner: &ApplierInner, theme: ResolvedTheme) {
    inner.notifying.set(true);
    let snapshot: Vec<(u64, Listener)> = inner
        .listeners
        .borrow()
        .iter()
        .map(|(id, listener)| (*id, Rc::clone(listener)))
        .collect();
    for (id, listener) in snapshot {
        let still_attached = inner.listeners.borrow().iter().any(|(lid, _)| *lid == id);
        if still_attached {
            listener(theme);
        }
    }
    inner.notifying.set(false);
}

fn sync_recheck(inner: &Rc<ApplierInner>, pref: ThemePreference) {
    if pref != ThemePreference::Auto {
        // Dropping outside the borrow so the scheduler's teardown never sees it held.
        let cancelled = inner.recheck.borrow_mut().take();
        drop(cancelled);
        return;
    }
    if inner.recheck.borrow().is_some() {
        return;
    }

    let weak: Weak<ApplierInner> = Rc::downgrade(inner);
    let timer = inner.scheduler.set_interval(
        inner.recheck_interval_ms,
        Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.store.get() == ThemePreference::Auto {
                let resolved = inner.bounds.resolve(ThemePreference::Auto, inner.scheduler.now());
                apply_inner(&inner, resolved);
            } else {
                let cancelled = inner.recheck.borrow_mut().take();
                drop(cancelled);
            }
        }),
    );
    *inner.recheck.borrow_mut() = Some(timer);
}
