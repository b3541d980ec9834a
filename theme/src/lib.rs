//! Theme state and floating UI coordination for the blog chrome.
//!
//! This crate holds the only stateful part of the site's client layer: the
//! persisted auto/light/dark preference, its resolution against the wall
//! clock, the document theme marker, the shared scroll observer, the two
//! floating buttons, and the ambient background. Every browser touchpoint sits
//! behind a small host trait so the whole state machine runs (and is tested)
//! without a DOM. The `client` crate supplies the browser implementations.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`preference`] | `ThemePreference`, `ResolvedTheme`, day/night resolution |
//! | [`store`] | [`store::ThemeStore`] over a [`store::PreferenceStorage`] backend |
//! | [`applier`] | [`applier::ThemeApplier`]: marker writes, change fan-out, auto recheck |
//! | [`scroll`] | [`scroll::ScrollTracker`]: frame-coalesced samples and idle events |
//! | [`controls`] | [`controls::FloatingControlsCoordinator`]: toggle + back-to-top |
//! | [`ambient`] | [`ambient::AmbientEffectsController`]: stars, blobs, navbar color |
//! | [`chrome`] | [`chrome::ThemeChrome`]: composition root wiring all of the above |
//! | [`schedule`] | `Scheduler` trait and the `Timestamp` clock input |
//! | [`dispose`] | `Disposer` / `DisposeBag` cancellation handles |
//! | [`config`] | `ThemeConfig` (serde) and validation |
//! | [`consts`] | Default thresholds, class names, and keys |
//! | `testing` | Virtual-time scheduler and recording fakes (tests and the `testing` feature) |

pub mod ambient;
pub mod applier;
pub mod chrome;
pub mod config;
pub mod consts;
pub mod controls;
pub mod dispose;
pub mod preference;
pub mod schedule;
pub mod scroll;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
