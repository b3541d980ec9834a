//! Page-supplied configuration.
//!
//! The page may embed `<script type="application/json" id="theme-config">`.
//! Its text is parsed into a [`ThemeConfig`]; a missing element means
//! defaults, and a broken one is logged and replaced by defaults so a typo in
//! the page never disables the chrome.

#[cfg(test)]
#[path = "config_source_test.rs"]
mod config_source_test;

use log::LevelFilter;
use theme::config::ThemeConfig;

/// Id of the `<script type="application/json">` element holding the config.
pub const CONFIG_ELEMENT_ID: &str = "theme-config";

/// Build the effective config from the element's text, if any.
pub fn load(raw: Option<&str>) -> ThemeConfig {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return ThemeConfig::default();
    };
    match ThemeConfig::from_json(raw) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("theme: {err}; using defaults");
            ThemeConfig::default()
        }
    }
}

/// Console log level from `logLevel`; unknown names fall back to `info`.
pub fn level_filter(config: &ThemeConfig) -> LevelFilter {
    config.log_level.parse().unwrap_or(LevelFilter::Info)
}

/// Seed for the ambient scene layout from a millisecond clock reading.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn seed_from_clock(epoch_ms: f64) -> u64 {
    if epoch_ms.is_finite() { epoch_ms.max(0.0) as u64 } else { 0 }
}
