//! Default thresholds, timings, and DOM names shared across the crate.

// ── Preference ──────────────────────────────────────────────────

/// `localStorage` key holding the preference string.
pub const STORAGE_KEY: &str = "theme-preference";

/// Attribute on the document root that styling keys off of.
pub const MARKER_ATTRIBUTE: &str = "data-theme";

/// Marker value written for the dark theme. Light removes the attribute.
pub const MARKER_DARK: &str = "dark";

/// First hour (inclusive) that `auto` resolves to light.
pub const DAY_START_HOUR: u8 = 6;

/// First hour (inclusive) that `auto` resolves to dark.
pub const NIGHT_START_HOUR: u8 = 18;

/// Period of the day/night recheck while the preference is `auto`.
pub const RECHECK_INTERVAL_MS: u32 = 60_000;

// ── Scroll ──────────────────────────────────────────────────────

/// Scroll offset past which the tracker reports `crossed_threshold`.
pub const SCROLL_REVEAL_THRESHOLD_PX: f64 = 100.0;

/// Movement at or below this distance is treated as jitter.
pub const SCROLL_JITTER_PX: f64 = 2.0;

/// Quiet period after the last scroll event before idle fires.
pub const SCROLL_IDLE_MS: u32 = 600;

// ── Floating controls ───────────────────────────────────────────

/// Theme toggle shows once the page is scrolled past this offset.
pub const TOGGLE_REVEAL_PX: f64 = 100.0;

/// Back-to-top shows once the page is scrolled past this offset.
pub const BACK_TO_TOP_REVEAL_PX: f64 = 300.0;

pub const TOGGLE_CLASS: &str = "dark-mode-toggle";
pub const BACK_TO_TOP_CLASS: &str = "back-to-top";
pub const WRAPPER_CLASS: &str = "floating-buttons-wrapper";

/// How long a theme toast stays on screen.
pub const TOAST_MS: u32 = 2_000;

pub const MOUNT_MAX_ATTEMPTS: u32 = 5;
pub const MOUNT_BASE_DELAY_MS: u32 = 50;
pub const MOUNT_BACKOFF_FACTOR: u32 = 2;
pub const MOUNT_MAX_DELAY_MS: u32 = 2_000;

// ── Ambient ─────────────────────────────────────────────────────

pub const STAR_COUNT: usize = 50;
pub const BLOB_COUNT: usize = 3;

/// Maximum blob drift from its origin, in pixels, before it bounces.
pub const BLOB_DRIFT_LIMIT_PX: f64 = 50.0;

/// Gradients cycled across the light-theme blobs.
pub const BLOB_GRADIENTS: [&str; 3] = [
    "radial-gradient(circle, rgba(251, 113, 133, 0.4), transparent)",
    "radial-gradient(circle, rgba(129, 230, 217, 0.4), transparent)",
    "radial-gradient(circle, rgba(251, 207, 232, 0.4), transparent)",
];

pub const NAVBAR_SELECTOR: &str = ".navbar";
pub const NAVBAR_DARK: &str = "#161b22";
pub const NAVBAR_LIGHT: &str = "white";
