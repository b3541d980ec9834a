//! Preference and resolved-theme values, and the day/night rule.
//!
//! `ThemePreference` is what the reader asked for; `ResolvedTheme` is what the
//! page shows right now. `auto` is resolved from the local wall-clock hour
//! only. The OS color-scheme signal is deliberately not consulted: a page
//! rendered at 14:00 is light under `auto` even when the OS is in dark mode.

#[cfg(test)]
#[path = "preference_test.rs"]
mod preference_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DAY_START_HOUR, NIGHT_START_HOUR};
use crate::schedule::Timestamp;

/// Stored user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Follow the day/night rule.
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemePreference {
    pub const ALL: [Self; 3] = [Self::Auto, Self::Light, Self::Dark];

    /// The toggle rotation: `auto → light → dark → auto`.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Auto => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::Auto,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse a stored value. Only the three exact lowercase names are accepted.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "auto" => Some(Self::Auto),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The theme actually in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day/night boundaries for `auto`.
///
/// Dark when `hour >= night_start || hour < day_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    pub day_start: u8,
    pub night_start: u8,
}

impl Default for DayBounds {
    fn default() -> Self {
        Self { day_start: DAY_START_HOUR, night_start: NIGHT_START_HOUR }
    }
}

impl DayBounds {
    #[must_use]
    pub fn is_night(self, hour: u8) -> bool {
        hour >= self.night_start || hour < self.day_start
    }

    #[must_use]
    pub fn resolve(self, pref: ThemePreference, now: Timestamp) -> ResolvedTheme {
        match pref {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::Auto => {
                if self.is_night(now.local_hour()) {
                    ResolvedTheme::Dark
                } else {
                    ResolvedTheme::Light
                }
            }
        }
    }
}

/// Resolve with the default 06:00/18:00 boundaries.
#[must_use]
pub fn resolve(pref: ThemePreference, now: Timestamp) -> ResolvedTheme {
    DayBounds::default().resolve(pref, now)
}
