//! Tunables for the theme chrome, parsed from page-supplied JSON.
//!
//! Every field has a default, so `{}` (or no config at all) yields the stock
//! behavior. Keys are camelCase to match the page-side JSON.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::preference::{DayBounds, ThemePreference};

/// Error returned by [`ThemeConfig::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("theme config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("theme config rejected: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeConfig {
    pub storage_key: String,
    pub day_start_hour: u8,
    pub night_start_hour: u8,
    pub recheck_interval_ms: u32,
    pub scroll: ScrollConfig,
    pub controls: ControlsConfig,
    pub ambient: AmbientConfig,
    /// `log` level name for the browser console logger.
    pub log_level: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_owned(),
            day_start_hour: DAY_START_HOUR,
            night_start_hour: NIGHT_START_HOUR,
            recheck_interval_ms: RECHECK_INTERVAL_MS,
            scroll: ScrollConfig::default(),
            controls: ControlsConfig::default(),
            ambient: AmbientConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollConfig {
    pub reveal_threshold_px: f64,
    pub jitter_px: f64,
    pub idle_ms: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            reveal_threshold_px: SCROLL_REVEAL_THRESHOLD_PX,
            jitter_px: SCROLL_JITTER_PX,
            idle_ms: SCROLL_IDLE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlsConfig {
    pub toggle_reveal_px: f64,
    pub back_to_top_reveal_px: f64,
    pub toggle_class: String,
    pub back_to_top_class: String,
    pub wrapper_class: String,
    /// CSS selector for the element the buttons mount into; `None` is `<body>`.
    pub container_selector: Option<String>,
    pub toast_ms: u32,
    pub labels: ToastLabels,
    pub retry: RetryPolicy,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            toggle_reveal_px: TOGGLE_REVEAL_PX,
            back_to_top_reveal_px: BACK_TO_TOP_REVEAL_PX,
            toggle_class: TOGGLE_CLASS.to_owned(),
            back_to_top_class: BACK_TO_TOP_CLASS.to_owned(),
            wrapper_class: WRAPPER_CLASS.to_owned(),
            container_selector: None,
            toast_ms: TOAST_MS,
            labels: ToastLabels::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Toast text shown after a toggle click, per new preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastLabels {
    pub auto: String,
    pub light: String,
    pub dark: String,
}

impl Default for ToastLabels {
    fn default() -> Self {
        Self {
            auto: "🔄 Auto theme".to_owned(),
            light: "☀️ Light theme".to_owned(),
            dark: "🌙 Dark theme".to_owned(),
        }
    }
}

impl ToastLabels {
    #[must_use]
    pub fn for_preference(&self, pref: ThemePreference) -> &str {
        match pref {
            ThemePreference::Auto => &self.auto,
            ThemePreference::Light => &self.light,
            ThemePreference::Dark => &self.dark,
        }
    }
}

/// Bounded exponential backoff for mounting into a late container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u32,
    pub factor: u32,
    pub max_delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MOUNT_MAX_ATTEMPTS,
            base_delay_ms: MOUNT_BASE_DELAY_MS,
            factor: MOUNT_BACKOFF_FACTOR,
            max_delay_ms: MOUNT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt number `attempt` (1-based), or `None` once the
    /// budget is spent. Attempt 1 runs immediately.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Option<u32> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        if attempt == 1 {
            return Some(0);
        }
        let exponent = attempt - 2;
        let scaled = self
            .factor
            .checked_pow(exponent)
            .and_then(|mult| self.base_delay_ms.checked_mul(mult))
            .unwrap_or(self.max_delay_ms);
        Some(scaled.min(self.max_delay_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmbientConfig {
    pub enabled: bool,
    pub star_count: usize,
    pub blob_count: usize,
    pub navbar_selector: String,
    pub navbar_dark: String,
    pub navbar_light: String,
    pub respect_reduced_motion: bool,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            star_count: STAR_COUNT,
            blob_count: BLOB_COUNT,
            navbar_selector: NAVBAR_SELECTOR.to_owned(),
            navbar_dark: NAVBAR_DARK.to_owned(),
            navbar_light: NAVBAR_LIGHT.to_owned(),
            respect_reduced_motion: true,
        }
    }
}

impl ThemeConfig {
    /// Parse and validate page-supplied JSON.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn day_bounds(&self) -> DayBounds {
        DayBounds { day_start: self.day_start_hour, night_start: self.night_start_hour }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(invalid("storageKey must not be empty"));
        }
        if self.day_start_hour > 23 || self.night_start_hour > 23 {
            return Err(invalid("dayStartHour and nightStartHour must be within 0..=23"));
        }
        if self.day_start_hour >= self.night_start_hour {
            return Err(invalid(format!(
                "dayStartHour ({}) must be earlier than nightStartHour ({})",
                self.day_start_hour, self.night_start_hour
            )));
        }
        if self.recheck_interval_ms == 0 {
            return Err(invalid("recheckIntervalMs must be positive"));
        }
        if self.scroll.idle_ms == 0 {
            return Err(invalid("scroll.idleMs must be positive"));
        }
        if self.scroll.jitter_px < 0.0 || !self.scroll.jitter_px.is_finite() {
            return Err(invalid("scroll.jitterPx must be a non-negative number"));
        }
        if self.controls.back_to_top_reveal_px < self.controls.toggle_reveal_px {
            return Err(invalid("controls.backToTopRevealPx must not be below controls.toggleRevealPx"));
        }
        if self.controls.toggle_class.trim().is_empty() || self.controls.back_to_top_class.trim().is_empty() {
            return Err(invalid("button class names must not be empty"));
        }
        if self.controls.toggle_class == self.controls.back_to_top_class {
            return Err(invalid("toggleClass and backToTopClass must differ"));
        }
        if self.controls.retry.max_attempts == 0 {
            return Err(invalid("controls.retry.maxAttempts must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}
