//! # client
//!
//! WebAssembly entry point for the blog's theme chrome.
//!
//! The state machine lives in the `theme` crate. This crate supplies the
//! browser side of every host trait (`localStorage`, the `data-theme` marker,
//! timers and animation frames, the floating buttons, the ambient backdrop)
//! and exports `init()` / `cycleTheme()` to page script. Browser code is
//! behind the `hydrate` feature; without it only the configuration loader
//! builds, so the crate's tests run natively.

pub mod config_source;

#[cfg(feature = "hydrate")]
mod browser;

#[cfg(feature = "hydrate")]
mod entry;
