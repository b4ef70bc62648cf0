//! Configuration settings for the page runtime.
//!
//! This module defines runtime configuration for frame pacing, the viewport,
//! smooth scrolling and platform capabilities. Configuration can be loaded
//! from environment variables or constructed programmatically.

use core::time::Duration;
use std::env;

/// Runtime configuration for a [`crate::Page`].
#[derive(Clone, Debug, PartialEq)]
pub struct PageConfig {
    /// Virtual milliseconds between animation frames
    pub frame_budget_ms: u64,
    /// Viewport width in pixels
    pub viewport_width: f64,
    /// Viewport height in pixels
    pub viewport_height: f64,
    /// Duration of a smooth scroll animation in milliseconds
    pub smooth_scroll_ms: u64,
    /// Whether the platform offers intersection observation
    pub intersection_observer: bool,
    /// Maximum number of tasks and frames run without the clock moving
    pub step_limit: usize,
}

impl Default for PageConfig {
    #[inline]
    fn default() -> Self {
        Self {
            frame_budget_ms: 16,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            smooth_scroll_ms: 400,
            intersection_observer: true,
            step_limit: 10_000,
        }
    }
}

impl PageConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `FOLIO_FRAME_BUDGET_MS`: Frame budget in milliseconds (default: 16, minimum 1)
    /// - `FOLIO_VIEWPORT_WIDTH`: Viewport width in pixels (default: 1280)
    /// - `FOLIO_VIEWPORT_HEIGHT`: Viewport height in pixels (default: 720)
    /// - `FOLIO_SMOOTH_SCROLL_MS`: Smooth scroll duration (default: 400)
    /// - `FOLIO_INTERSECTION`: Set to "0" to disable intersection observation
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let frame_budget_ms = env::var("FOLIO_FRAME_BUDGET_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.frame_budget_ms)
            .max(1);
        let viewport_width = env::var("FOLIO_VIEWPORT_WIDTH")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .filter(|width| *width > 0.0)
            .unwrap_or(defaults.viewport_width);
        let viewport_height = env::var("FOLIO_VIEWPORT_HEIGHT")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .filter(|height| *height > 0.0)
            .unwrap_or(defaults.viewport_height);
        let smooth_scroll_ms = env::var("FOLIO_SMOOTH_SCROLL_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.smooth_scroll_ms);
        let intersection_observer = env::var("FOLIO_INTERSECTION").ok().as_deref() != Some("0");
        Self {
            frame_budget_ms,
            viewport_width,
            viewport_height,
            smooth_scroll_ms,
            intersection_observer,
            ..defaults
        }
    }

    /// Get the frame budget as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Get the smooth scroll duration as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn smooth_scroll(&self) -> Duration {
        Duration::from_millis(self.smooth_scroll_ms)
    }
}
