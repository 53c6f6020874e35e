//! Scroll-drive loop.
//!
//! The loop is a small state machine: every `scroll_interval` it reads the
//! page geometry, [`plan`](ScrollState::plan)s one action, applies it, reads
//! the geometry again and folds the result in with [`tick`](ScrollState::tick).
//! The state machine itself never touches a browser, so it can be fed any
//! height sequence.

use crate::options::ScrollOptions;
use crate::session::ScrollSurface;
use anyhow::{Context, Result};
use scrollcast_common::ScrollPolicy;
use scrollcast_drivers::browser::page::PageMetrics;
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// What one tick does to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Eased scroll down by this many pixels.
    Advance(u32),
    /// Instant jump back to offset 0.
    ReturnToTop,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The document stopped growing after everything had been scrolled past.
    ContentExhausted,
    /// `max_duration` ran out.
    TimeBudgetSpent,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ContentExhausted => f.write_str("content exhausted"),
            StopReason::TimeBudgetSpent => f.write_str("time budget spent"),
        }
    }
}

/// Progress of a running scroll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    /// Time since the loop started, as of the last tick.
    pub elapsed: Duration,
    /// Document height observed at the end of the previous tick.
    pub last_height: u64,
    /// Consecutive ticks at the end of the content without any growth.
    pub no_change_count: u32,
    pub ticks: u32,
    /// Pixels of the document walked through by advance steps, capped at its height.
    pub covered: u64,
}

impl ScrollState {
    pub fn new(initial_height: u64) -> Self {
        Self {
            elapsed: Duration::ZERO,
            last_height: initial_height,
            no_change_count: 0,
            ticks: 0,
            covered: 0,
        }
    }

    /// Pick the action for the next tick from the geometry seen right before it.
    pub fn plan(&self, options: &ScrollOptions, before: &PageMetrics) -> ScrollAction {
        match options.policy {
            ScrollPolicy::TimeBounded if before.at_bottom() => ScrollAction::ReturnToTop,
            _ => ScrollAction::Advance(options.scroll_step),
        }
    }

    /// Fold one applied action into the state.
    ///
    /// Returns the next state and, when the loop must end, why. Exhaustion is
    /// checked before the time budget.
    pub fn tick(
        self,
        options: &ScrollOptions,
        action: ScrollAction,
        after: &PageMetrics,
        elapsed: Duration,
    ) -> (ScrollState, Option<StopReason>) {
        let height = after.document_height;
        let at_end = self.covered >= self.last_height;
        let covered = match action {
            ScrollAction::Advance(px) => (self.covered + u64::from(px)).min(height),
            ScrollAction::ReturnToTop => 0,
        };
        let no_change_count = if at_end && height == self.last_height {
            self.no_change_count + 1
        } else {
            0
        };

        let next = ScrollState {
            elapsed,
            last_height: height,
            no_change_count,
            ticks: self.ticks + 1,
            covered,
        };

        let stop = match options.policy {
            ScrollPolicy::ContentExhaustion if no_change_count >= options.stable_ticks => {
                Some(StopReason::ContentExhausted)
            }
            _ if elapsed >= options.max_duration => Some(StopReason::TimeBudgetSpent),
            _ => None,
        };
        (next, stop)
    }
}

/// Summary of a finished scroll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    pub elapsed: Duration,
    pub final_height: u64,
    pub ticks: u32,
    pub reason: StopReason,
}

/// Drive `surface` until `options` say stop.
///
/// Ticks are spaced by `scroll_interval` after the previous tick completes;
/// a slow page pushes later ticks back rather than dropping any.
pub async fn drive_scroll<S>(surface: &S, options: &ScrollOptions) -> Result<ScrollReport>
where
    S: ScrollSurface + ?Sized,
{
    let started = Instant::now();
    let initial = surface
        .metrics()
        .await
        .context("failed to read page geometry before scrolling")?;
    let mut state = ScrollState::new(initial.document_height);

    info!(
        target: "capture.scroll",
        policy = %options.policy,
        max_duration_ms = options.max_duration.as_millis() as u64,
        step = options.scroll_step,
        interval_ms = options.scroll_interval.as_millis() as u64,
        initial_height = initial.document_height,
        "scroll loop started"
    );

    loop {
        sleep(options.scroll_interval).await;

        let before = surface.metrics().await.context("failed to read page geometry")?;
        let action = state.plan(options, &before);
        let applied = match action {
            ScrollAction::Advance(px) => surface.scroll_by(px).await,
            ScrollAction::ReturnToTop => surface.scroll_to_top().await,
        };
        applied.with_context(|| format!("scroll tick {} failed", state.ticks + 1))?;
        let after = surface.metrics().await.context("failed to read page geometry")?;

        let (next, stop) = state.tick(options, action, &after, started.elapsed());
        state = next;

        debug!(
            target: "capture.scroll",
            tick = state.ticks,
            ?action,
            scroll_y = after.scroll_y,
            height = state.last_height,
            no_change = state.no_change_count,
            elapsed_ms = state.elapsed.as_millis() as u64,
            "tick"
        );

        if let Some(reason) = stop {
            let report = ScrollReport {
                elapsed: state.elapsed,
                final_height: state.last_height,
                ticks: state.ticks,
                reason,
            };
            info!(
                target: "capture.scroll",
                elapsed_ms = report.elapsed.as_millis() as u64,
                final_height = report.final_height,
                ticks = report.ticks,
                reason = %report.reason,
                "scroll loop finished"
            );
            return Ok(report);
        }
    }
}
