use scrollcast_common::ScrollPolicy;
use scrollcast_config::ScrollcastConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Tuning for the scroll-drive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOptions {
    /// Total scroll budget.
    pub max_duration: Duration,
    /// Pixels advanced per tick.
    pub scroll_step: u32,
    /// Delay between ticks.
    pub scroll_interval: Duration,
    pub policy: ScrollPolicy,
    /// Consecutive unchanged-height ticks that end a content-exhaustion run.
    pub stable_ticks: u32,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_millis(10_000),
            scroll_step: 600,
            scroll_interval: Duration::from_millis(1_000),
            policy: ScrollPolicy::TimeBounded,
            stable_ticks: 3,
        }
    }
}

impl ScrollOptions {
    /// Force every knob to at least one unit so the loop always makes progress.
    pub fn clamped(self) -> Self {
        Self {
            max_duration: self.max_duration.max(Duration::from_millis(1)),
            scroll_step: self.scroll_step.max(1),
            scroll_interval: self.scroll_interval.max(Duration::from_millis(1)),
            policy: self.policy,
            stable_ticks: self.stable_ticks.max(1),
        }
    }
}

/// Page readiness heuristics applied before recording starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessOptions {
    pub navigation_timeout: Duration,
    /// Quiet window that counts as network-idle.
    pub network_idle: Duration,
    /// Fixed delay after the load state for late layout, animations and font swaps.
    pub settle: Duration,
    /// Element whose visibility is checked (advisory only).
    pub ready_selector: String,
    pub visibility_timeout: Duration,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            network_idle: Duration::from_millis(500),
            settle: Duration::from_secs(2),
            ready_selector: "body".to_string(),
            visibility_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything one recording run needs besides the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub scroll: ScrollOptions,
    pub readiness: ReadinessOptions,
    pub output_dir: PathBuf,
    /// Container extension of the artifact, without the dot.
    pub extension: String,
    /// Pause after a successful scroll loop so the final state is on film.
    pub post_scroll_settle: Duration,
    /// Pause before the recording stops, on every path.
    pub final_hold: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scroll: ScrollOptions::default(),
            readiness: ReadinessOptions::default(),
            output_dir: PathBuf::from("."),
            extension: "mp4".to_string(),
            post_scroll_settle: Duration::from_secs(2),
            final_hold: Duration::from_secs(1),
        }
    }
}

impl CaptureOptions {
    pub fn from_config(cfg: &ScrollcastConfig) -> Self {
        let capture = &cfg.capture;
        let browser = &cfg.browser;
        Self {
            scroll: ScrollOptions {
                max_duration: Duration::from_millis(capture.max_duration_ms),
                scroll_step: capture.scroll_step_px,
                scroll_interval: Duration::from_millis(capture.scroll_interval_ms),
                policy: capture.policy,
                stable_ticks: capture.stable_ticks,
            },
            readiness: ReadinessOptions {
                navigation_timeout: Duration::from_millis(browser.navigation_timeout_ms),
                network_idle: Duration::from_millis(browser.network_idle_ms),
                settle: Duration::from_millis(browser.settle_ms),
                ready_selector: browser.ready_selector.clone(),
                visibility_timeout: Duration::from_millis(browser.visibility_timeout_ms),
            },
            output_dir: capture.output_dir.clone(),
            extension: cfg.recorder.extension.trim_start_matches('.').to_string(),
            post_scroll_settle: Duration::from_millis(capture.post_scroll_settle_ms),
            final_hold: Duration::from_millis(capture.final_hold_ms),
        }
        .clamped()
    }

    pub fn clamped(mut self) -> Self {
        self.scroll = self.scroll.clamped();
        self.readiness.navigation_timeout = self
            .readiness
            .navigation_timeout
            .max(Duration::from_millis(1));
        if self.extension.is_empty() {
            self.extension = "mp4".to_string();
        }
        self
    }
}
