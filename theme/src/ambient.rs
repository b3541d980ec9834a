//! Decorative background tied to the resolved theme.
//!
//! Dark pages get a static star field; light pages get a few blurred gradient
//! blobs that drift within a small box. The navbar background follows the
//! theme too. Every switch removes the previous scene and cancels its frame
//! loop before the next scene is installed. With reduced motion requested, no
//! frame loop runs at all.

#[cfg(test)]
#[path = "ambient_test.rs"]
mod ambient_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::applier::ThemeApplier;
use crate::config::AmbientConfig;
use crate::consts::{BLOB_DRIFT_LIMIT_PX, BLOB_GRADIENTS};
use crate::dispose::Disposer;
use crate::preference::ResolvedTheme;
use crate::schedule::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub top_pct: f64,
    pub left_pct: f64,
    pub opacity: f64,
    pub twinkle_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub size_px: f64,
    pub top_pct: f64,
    pub left_pct: f64,
    pub gradient: &'static str,
    /// Drift per frame in pixels.
    pub velocity: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AmbientScene {
    Stars(Vec<Star>),
    Blobs(Vec<Blob>),
}

impl AmbientScene {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Stars(stars) => stars.len(),
            Self::Blobs(blobs) => blobs.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lay out the scene for `theme`.
pub fn plan_scene(theme: ResolvedTheme, config: &AmbientConfig, rng: &mut impl Rng) -> AmbientScene {
    match theme {
        ResolvedTheme::Dark => AmbientScene::Stars(
            (0..config.star_count)
                .map(|_| Star {
                    top_pct: rng.random_range(0.0..100.0),
                    left_pct: rng.random_range(0.0..100.0),
                    opacity: rng.random_range(0.0..0.8),
                    twinkle_secs: rng.random_range(2.0..5.0),
                })
                .collect(),
        ),
        ResolvedTheme::Light => AmbientScene::Blobs(
            (0..config.blob_count)
                .map(|i| Blob {
                    size_px: rng.random_range(200.0..500.0),
                    top_pct: rng.random_range(0.0..100.0),
                    left_pct: rng.random_range(0.0..100.0),
                    gradient: BLOB_GRADIENTS[i % BLOB_GRADIENTS.len()],
                    velocity: (rng.random_range(-0.25..0.25), rng.random_range(-0.25..0.25)),
                })
                .collect(),
        ),
    }
}

/// Per-blob offsets from origin, bouncing at the drift limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Drift {
    offsets: Vec<(f64, f64)>,
    velocities: Vec<(f64, f64)>,
}

impl Drift {
    #[must_use]
    pub fn new(blobs: &[Blob]) -> Self {
        Self {
            offsets: vec![(0.0, 0.0); blobs.len()],
            velocities: blobs.iter().map(|b| b.velocity).collect(),
        }
    }

    /// Advance one frame and return the new offsets.
    pub fn step(&mut self) -> &[(f64, f64)] {
        for (offset, velocity) in self.offsets.iter_mut().zip(self.velocities.iter_mut()) {
            offset.0 += velocity.0;
            offset.1 += velocity.1;
            if offset.0.abs() > BLOB_DRIFT_LIMIT_PX {
                velocity.0 = -velocity.0;
            }
            if offset.1.abs() > BLOB_DRIFT_LIMIT_PX {
                velocity.1 = -velocity.1;
            }
        }
        &self.offsets
    }

    #[must_use]
    pub fn offsets(&self) -> &[(f64, f64)] {
        &self.offsets
    }
}

/// Rendered scene nodes. Dropping the handle removes them.
pub trait SceneHandle {
    fn set_offsets(&self, offsets: &[(f64, f64)]);
}

pub trait AmbientHost {
    fn prefers_reduced_motion(&self) -> bool;

    /// Insert the scene's nodes. `animate` is false under reduced motion.
    fn render(&self, scene: &AmbientScene, animate: bool) -> Box<dyn SceneHandle>;

    fn paint_navbar(&self, background: &str);
}

struct ActiveScene {
    // Cancel the frame loop before removing the nodes it moves.
    frame: Rc<RefCell<Option<Disposer>>>,
    _handle: Rc<dyn SceneHandle>,
    theme: ResolvedTheme,
}

impl Drop for ActiveScene {
    fn drop(&mut self) {
        let frame = self.frame.borrow_mut().take();
        drop(frame);
    }
}

struct AmbientInner {
    host: Box<dyn AmbientHost>,
    scheduler: Rc<dyn Scheduler>,
    config: AmbientConfig,
    rng: RefCell<SmallRng>,
    active: RefCell<Option<ActiveScene>>,
    subscription: RefCell<Option<Disposer>>,
    installs: Cell<u64>,
}

pub struct AmbientEffectsController {
    inner: Rc<AmbientInner>,
}

impl AmbientEffectsController {
    pub fn new(host: Box<dyn AmbientHost>, scheduler: Rc<dyn Scheduler>, config: AmbientConfig, seed: u64) -> Self {
        Self {
            inner: Rc::new(AmbientInner {
                host,
                scheduler,
                config,
                rng: RefCell::new(SmallRng::seed_from_u64(seed)),
                active: RefCell::new(None),
                subscription: RefCell::new(None),
                installs: Cell::new(0),
            }),
        }
    }

    /// Follow `applier`: install for its current theme, then on every change.
    pub fn attach(&self, applier: &ThemeApplier) {
        self.detach();
        if !self.inner.config.enabled {
            return;
        }
        let weak: Weak<AmbientInner> = Rc::downgrade(&self.inner);
        let subscription = applier.subscribe(move |theme| {
            if let Some(inner) = weak.upgrade() {
                install(&inner, theme);
            }
        });
        *self.inner.subscription.borrow_mut() = Some(subscription);
        if let Some(theme) = applier.current() {
            install(&self.inner, theme);
        }
    }

    /// Stop following and remove the current scene.
    pub fn detach(&self) {
        let subscription = self.inner.subscription.borrow_mut().take();
        drop(subscription);
        let active = self.inner.active.borrow_mut().take();
        drop(active);
    }

    #[must_use]
    pub fn active_theme(&self) -> Option<ResolvedTheme> {
        self.inner.active.borrow().as_ref().map(|a| a.theme)
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.inner
            .active
            .borrow()
            .as_ref()
            .is_some_and(|a| a.frame.borrow().is_some())
    }

    /// Number of scenes installed so far.
    #[must_use]
    pub fn installs(&self) -> u64 {
        self.inner.installs.get()
    }
}

impl Drop for AmbientEffectsController {
    fn drop(&mut self) {
        self.detach();
    }
}

fn install(inner: &Rc<AmbientInner>, theme: ResolvedTheme) {
    let previous = inner.active.borrow_mut().take();
    drop(previous);

    let navbar = match theme {
        ResolvedTheme::Dark => &inner.config.navbar_dark,
        ResolvedTheme::Light => &inner.config.navbar_light,
    };
    inner.host.paint_navbar(navbar);

    let scene = plan_scene(theme, &inner.config, &mut *inner.rng.borrow_mut());
    let animate = !(inner.config.respect_reduced_motion && inner.host.prefers_reduced_motion());
    let handle: Rc<dyn SceneHandle> = Rc::from(inner.host.render(&scene, animate));
    let frame = Rc::new(RefCell::new(None));

    if animate {
        if let AmbientScene::Blobs(blobs) = &scene {
            let drift = Rc::new(RefCell::new(Drift::new(blobs)));
            schedule_drift(&inner.scheduler, &frame, &handle, &drift);
        }
    }

    inner.installs.set(inner.installs.get() + 1);
    log::debug!("theme: ambient scene installed for {theme} ({} nodes, animate={animate})", scene.len());
    *inner.active.borrow_mut() = Some(ActiveScene { frame, _handle: handle, theme });
}

fn schedule_drift(
    scheduler: &Rc<dyn Scheduler>,
    frame: &Rc<RefCell<Option<Disposer>>>,
    handle: &Rc<dyn SceneHandle>,
    drift: &Rc<RefCell<Drift>>,
) {
    let scheduler_for_cb = Rc::clone(scheduler);
    let frame_weak = Rc::downgrade(frame);
    let handle_weak = Rc::downgrade(handle);
    let drift_for_cb = Rc::clone(drift);
    let request = scheduler.request_frame(Box::new(move |_ts| {
        let (Some(frame), Some(handle)) = (frame_weak.upgrade(), handle_weak.upgrade()) else {
            return;
        };
        handle.set_offsets(drift_for_cb.borrow_mut().step());
        schedule_drift(&scheduler_for_cb, &frame, &handle, &drift_for_cb);
    }));
    *frame.borrow_mut() = Some(request);
}
