//! Shared scroll observer.
//!
//! The host forwards every raw scroll event to [`ScrollTracker::record`].
//! The tracker coalesces them into at most one sample per animation frame,
//! drops sub-jitter movement, and runs one debounce timer per idle listener.

#[cfg(test)]
#[path = "scroll_test.rs"]
mod scroll_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::ScrollConfig;
use crate::dispose::Disposer;
use crate::schedule::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

/// One coalesced observation of the viewport offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub position_y: f64,
    pub direction: ScrollDirection,
    /// `position_y` is past the tracker's reveal threshold.
    pub crossed_threshold: bool,
}

type Listener = Rc<dyn Fn(ScrollState)>;

struct IdleWatcher {
    id: u64,
    idle_ms: u32,
    listener: Listener,
    timer: Option<Disposer>,
}

struct Position {
    current: f64,
    /// Offset of the last emitted sample; direction is measured from here.
    anchor: f64,
    direction: ScrollDirection,
    dirty: bool,
}

struct TrackerInner {
    scheduler: Rc<dyn Scheduler>,
    config: ScrollConfig,
    position: RefCell<Position>,
    frame: RefCell<Option<Disposer>>,
    sample_listeners: RefCell<Vec<(u64, Listener)>>,
    idle_watchers: RefCell<Vec<IdleWatcher>>,
    /// Clock reading of the latest raw event, in epoch milliseconds.
    last_event_ms: Cell<Option<i64>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct ScrollTracker {
    inner: Rc<TrackerInner>,
}

impl ScrollTracker {
    pub fn new(scheduler: Rc<dyn Scheduler>, config: ScrollConfig, initial_y: f64) -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                scheduler,
                config,
                position: RefCell::new(Position {
                    current: initial_y,
                    anchor: initial_y,
                    direction: ScrollDirection::default(),
                    dirty: false,
                }),
                frame: RefCell::new(None),
                sample_listeners: RefCell::new(Vec::new()),
                idle_watchers: RefCell::new(Vec::new()),
                last_event_ms: Cell::new(None),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Latest known state, including movement not yet emitted as a sample.
    #[must_use]
    pub fn current(&self) -> ScrollState {
        snapshot(&self.inner)
    }

    #[must_use]
    pub fn idle_ms(&self) -> u32 {
        self.inner.config.idle_ms
    }

    /// A burst is in progress: the last raw event is younger than `idle_ms`.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        burst_remaining(&self.inner, self.inner.config.idle_ms).is_some()
    }

    /// Feed one raw scroll event.
    pub fn record(&self, position_y: f64) {
        self.inner.last_event_ms.set(Some(self.inner.scheduler.now().epoch_ms));
        {
            let mut pos = self.inner.position.borrow_mut();
            pos.current = position_y;
            pos.dirty = true;
        }
        request_flush(&self.inner);
        rearm_idle(&self.inner);
    }

    /// Called with each coalesced sample that moved past the jitter band.
    pub fn on_sample(&self, listener: impl Fn(ScrollState) + 'static) -> Disposer {
        let id = next_id(&self.inner);
        self.inner.sample_listeners.borrow_mut().push((id, Rc::new(listener)));
        let weak = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.sample_listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Called once each time scrolling stops for `idle_ms`.
    ///
    /// Registering mid-burst arms the watcher for the rest of the quiet
    /// period, so it still fires when the current burst ends.
    pub fn on_idle(&self, idle_ms: u32, listener: impl Fn(ScrollState) + 'static) -> Disposer {
        let id = next_id(&self.inner);
        self.inner.idle_watchers.borrow_mut().push(IdleWatcher {
            id,
            idle_ms,
            listener: Rc::new(listener),
            timer: None,
        });
        if let Some(remaining) = burst_remaining(&self.inner, idle_ms) {
            arm_watcher(&self.inner, id, remaining);
        }
        let weak = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = weak.upgrade() {
                let removed: Vec<IdleWatcher> = {
                    let mut watchers = inner.idle_watchers.borrow_mut();
                    let (gone, kept) = watchers.drain(..).partition(|w| w.id == id);
                    *watchers = kept;
                    gone
                };
                drop(removed);
            }
        })
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.sample_listeners.borrow().len() + self.inner.idle_watchers.borrow().len()
    }
}

fn next_id(inner: &TrackerInner) -> u64 {
    let id = inner.next_id.get();
    inner.next_id.set(id + 1);
    id
}

fn snapshot(inner: &TrackerInner) -> ScrollState {
    let pos = inner.position.borrow();
    ScrollState {
        position_y: pos.current,
        direction: pos.direction,
        crossed_threshold: pos.current > inner.config.reveal_threshold_px,
    }
}

fn request_flush(inner: &Rc<TrackerInner>) {
    if inner.frame.borrow().is_some() {
        return;
    }
    let weak: Weak<TrackerInner> = Rc::downgrade(inner);
    let frame = inner.scheduler.request_frame(Box::new(move |_ts| {
        if let Some(inner) = weak.upgrade() {
            flush(&inner);
        }
    }));
    *inner.frame.borrow_mut() = Some(frame);
}

fn flush(inner: &TrackerInner) {
    let spent = inner.frame.borrow_mut().take();
    drop(spent);

    let sample = {
        let mut pos = inner.position.borrow_mut();
        if !pos.dirty {
            return;
        }
        pos.dirty = false;
        let delta = pos.current - pos.anchor;
        if delta.abs() <= inner.config.jitter_px {
            return;
        }
        pos.direction = if delta > 0.0 { ScrollDirection::Down } else { ScrollDirection::Up };
        pos.anchor = pos.current;
        ScrollState {
            position_y: pos.current,
            direction: pos.direction,
            crossed_threshold: pos.current > inner.config.reveal_threshold_px,
        }
    };

    let listeners: Vec<Listener> = inner
        .sample_listeners
        .borrow()
        .iter()
        .map(|(_, l)| Rc::clone(l))
        .collect();
    for listener in listeners {
        listener(sample);
    }
}

fn rearm_idle(inner: &Rc<TrackerInner>) {
    let plan: Vec<(u64, u32)> = inner
        .idle_watchers
        .borrow()
        .iter()
        .map(|w| (w.id, w.idle_ms))
        .collect();
    for (id, idle_ms) in plan {
        arm_watcher(inner, id, idle_ms);
    }
}

/// Milliseconds left before a burst counts as idle for a watcher of `idle_ms`.
fn burst_remaining(inner: &TrackerInner, idle_ms: u32) -> Option<u32> {
    let last = inner.last_event_ms.get()?;
    let elapsed = inner.scheduler.now().epoch_ms - last;
    let remaining = i64::from(idle_ms) - elapsed.max(0);
    match u32::try_from(remaining) {
        Ok(ms) if ms > 0 => Some(ms),
        _ => None,
    }
}

fn arm_watcher(inner: &Rc<TrackerInner>, id: u64, delay_ms: u32) {
    let weak = Rc::downgrade(inner);
    let timer = inner.scheduler.set_timeout(
        delay_ms,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                fire_idle(&inner, id);
            }
        }),
    );
    let previous = {
        let mut watchers = inner.idle_watchers.borrow_mut();
        watchers
            .iter_mut()
            .find(|w| w.id == id)
            .and_then(|w| w.timer.replace(timer))
    };
    drop(previous);
}

fn fire_idle(inner: &TrackerInner, id: u64) {
    let (listener, spent) = {
        let mut watchers = inner.idle_watchers.borrow_mut();
        let Some(watcher) = watchers.iter_mut().find(|w| w.id == id) else {
            return;
        };
        (Rc::clone(&watcher.listener), watcher.timer.take())
    };
    drop(spent);
    listener(snapshot(inner));
}
