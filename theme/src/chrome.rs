//! Composition root.
//!
//! [`ThemeChrome::start`] builds every component from one [`ThemeConfig`] and
//! the host implementations, in dependency order: store, applier, scroll
//! tracker, then the two theme consumers. The initial theme is applied before
//! anything subscribes, so consumers install from `applier.current()` rather
//! than from a change event.

#[cfg(test)]
#[path = "chrome_test.rs"]
mod chrome_test;

use std::rc::Rc;

use crate::ambient::{AmbientEffectsController, AmbientHost};
use crate::applier::{ThemeApplier, ThemeMarker};
use crate::config::ThemeConfig;
use crate::controls::{ControlsHost, FloatingControlsCoordinator};
use crate::dispose::Disposer;
use crate::preference::{ResolvedTheme, ThemePreference};
use crate::schedule::Scheduler;
use crate::scroll::ScrollTracker;
use crate::store::{PreferenceStorage, ThemeStore};

/// Host implementations handed to [`ThemeChrome::start`].
pub struct ChromeHosts {
    pub storage: Box<dyn PreferenceStorage>,
    pub marker: Box<dyn ThemeMarker>,
    pub scheduler: Rc<dyn Scheduler>,
    pub controls: Box<dyn ControlsHost>,
    pub ambient: Box<dyn AmbientHost>,
}

pub struct ThemeChrome {
    // Consumers first so they detach before the applier goes away.
    controls: FloatingControlsCoordinator,
    ambient: AmbientEffectsController,
    tracker: ScrollTracker,
    applier: ThemeApplier,
    config: ThemeConfig,
}

impl ThemeChrome {
    /// Wire everything up, apply the stored preference, and mount the controls.
    ///
    /// `seed` feeds the ambient scene layout.
    pub fn start(config: ThemeConfig, hosts: ChromeHosts, initial_scroll_y: f64, seed: u64) -> Self {
        let ChromeHosts { storage, marker, scheduler, controls, ambient } = hosts;

        let store = Rc::new(ThemeStore::new(storage, config.storage_key.clone()));
        let applier = ThemeApplier::new(
            store,
            marker,
            Rc::clone(&scheduler),
            config.day_bounds(),
            config.recheck_interval_ms,
        );
        let tracker = ScrollTracker::new(Rc::clone(&scheduler), config.scroll.clone(), initial_scroll_y);

        applier.refresh();

        let ambient =
            AmbientEffectsController::new(ambient, Rc::clone(&scheduler), config.ambient.clone(), seed);
        ambient.attach(&applier);

        let controls = FloatingControlsCoordinator::new(
            controls,
            applier.clone(),
            tracker.clone(),
            scheduler,
            config.controls.clone(),
        );
        controls.init();

        log::info!(
            "theme: chrome started (preference={}, resolved={})",
            applier.store().get(),
            applier.current().map_or("unset", |t| t.as_str())
        );

        Self { controls, ambient, tracker, applier, config }
    }

    /// Forward one raw scroll event.
    pub fn record_scroll(&self, position_y: f64) {
        self.tracker.record(position_y);
    }

    /// Re-resolve the stored preference, e.g. after a system color-scheme change.
    pub fn refresh(&self) {
        self.applier.refresh();
    }

    /// Same path as a click on the toggle button.
    pub fn cycle_theme(&self) -> ThemePreference {
        self.controls.cycle_theme()
    }

    /// Theme-changed notifications for collaborators outside the crate.
    ///
    /// Survives [`ThemeChrome::reinit`]; drop the disposer to detach.
    pub fn subscribe(&self, listener: impl Fn(ResolvedTheme) + 'static) -> Disposer {
        self.applier.subscribe(listener)
    }

    /// Tear down and rebuild the page-level pieces.
    pub fn reinit(&self) {
        self.controls.init();
        self.ambient.attach(&self.applier);
    }

    #[must_use]
    pub fn applier(&self) -> &ThemeApplier {
        &self.applier
    }

    #[must_use]
    pub fn controls(&self) -> &FloatingControlsCoordinator {
        &self.controls
    }

    #[must_use]
    pub fn ambient(&self) -> &AmbientEffectsController {
        &self.ambient
    }

    #[must_use]
    pub fn tracker(&self) -> &ScrollTracker {
        &self.tracker
    }

    #[must_use]
    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }
}
