use crate::browser::scripts::PageScripts;
use anyhow::{anyhow, bail, Context, Result};
use fantoccini::{Client, Locator};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

const POLL_EVERY: Duration = Duration::from_millis(100);

/// Scroll geometry of the page at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub scroll_y: u64,
    pub viewport_height: u64,
    pub document_height: u64,
}

impl PageMetrics {
    /// Whether the viewport already shows the last pixel of the document,
    /// give or take one pixel of subpixel scrolling.
    pub fn at_bottom(&self) -> bool {
        self.scroll_y + self.viewport_height + 1 >= self.document_height
    }
}

/// One network-idle sample taken in the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProgress {
    pub ready_state: String,
    /// Resources finished since the page started loading.
    pub resources: u64,
}

impl LoadProgress {
    fn complete(&self) -> bool {
        self.ready_state == "complete"
    }
}

/// Quiet-window bookkeeping behind [`ScrollcastPage::wait_for_network_idle`].
///
/// The page counts as idle once samples have shown a complete document with
/// an unchanged resource count for at least `quiet_window`.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    quiet_window: Duration,
    last_count: Option<u64>,
    quiet_since: Option<Instant>,
}

impl IdleTracker {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            last_count: None,
            quiet_since: None,
        }
    }

    /// Fold in a sample taken at `now`; returns whether the page is idle.
    pub fn observe(&mut self, progress: &LoadProgress, now: Instant) -> bool {
        let changed = self.last_count != Some(progress.resources);
        self.last_count = Some(progress.resources);

        if changed || !progress.complete() {
            self.quiet_since = progress.complete().then_some(now);
            return false;
        }
        let since = *self.quiet_since.get_or_insert(now);
        now.duration_since(since) >= self.quiet_window
    }
}

/// Page wrapper exposing the automation surface a recording needs.
///
/// Cloning is cheap: every clone talks to the same browser tab.
#[derive(Clone)]
pub struct ScrollcastPage {
    client: Client,
}

impl ScrollcastPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Navigate to `url`. Returns once the browser reports the document loaded.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .with_context(|| format!("failed to navigate to {url}"))?;
        info!(target: "browser.page", %url, "navigation committed");
        Ok(())
    }

    /// Wait until the page looks network-idle: the document is complete and
    /// no resource has finished loading for `quiet_window`.
    ///
    /// WebDriver does not expose in-flight requests, so finished resource
    /// timing entries stand in for network activity.
    pub async fn wait_for_network_idle(
        &self,
        quiet_window: Duration,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut tracker = IdleTracker::new(quiet_window);

        loop {
            let progress: LoadProgress = self
                .evaluate_as(PageScripts::load_progress(), vec![])
                .await?;
            let now = Instant::now();

            if tracker.observe(&progress, now) {
                debug!(
                    target: "browser.page",
                    resources = progress.resources,
                    "network idle"
                );
                return Ok(());
            }

            if now >= deadline {
                bail!(
                    "network did not go idle within {} ms ({} resources, readyState={})",
                    timeout.as_millis(),
                    progress.resources,
                    progress.ready_state
                );
            }
            sleep(POLL_EVERY).await;
        }
    }

    /// Wait for the `load` lifecycle state (`document.readyState == "complete"`).
    pub async fn wait_for_load_state(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.evaluate(PageScripts::ready_state(), vec![]).await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("page did not reach the load state within {} ms", timeout.as_millis());
            }
            sleep(POLL_EVERY).await;
        }
    }

    /// Wait until an element matching `selector` exists and is displayed.
    pub async fn wait_for_selector_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .every(POLL_EVERY)
            .for_element(Locator::Css(selector))
            .await
            .with_context(|| format!("no element matched '{selector}'"))?;

        loop {
            if element.is_displayed().await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("'{selector}' stayed hidden for {} ms", timeout.as_millis());
            }
            sleep(POLL_EVERY).await;
        }
    }

    /// Run `script` in the page and return its JSON result.
    pub async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .execute(script, args)
            .await
            .map_err(|e| anyhow!("script evaluation failed: {e}"))
    }

    async fn evaluate_as<T>(&self, script: &str, args: Vec<Value>) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let raw = self.evaluate(script, args).await?;
        serde_json::from_value(raw).context("unexpected script result shape")
    }

    pub async fn metrics(&self) -> Result<PageMetrics> {
        self.evaluate_as(PageScripts::metrics(), vec![]).await
    }

    /// Eased scroll; returns as soon as the animation has been started.
    pub async fn scroll_by_smooth(&self, pixels: u32) -> Result<()> {
        self.evaluate(PageScripts::scroll_by_smooth(), vec![json!(pixels)])
            .await
            .map(|_| ())
    }

    pub async fn scroll_to_top(&self) -> Result<()> {
        self.evaluate(PageScripts::scroll_to_top(), vec![]).await.map(|_| ())
    }

    /// PNG screenshot of the current viewport.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await.map_err(anyhow::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_decode_from_script_result() {
        let raw = json!({ "scrollY": 1920, "viewportHeight": 1080, "documentHeight": 3000 });
        let metrics: PageMetrics = serde_json::from_value(raw).unwrap();
        assert_eq!(metrics.scroll_y, 1920);
        assert!(metrics.at_bottom());
    }

    #[test]
    fn short_pages_are_always_at_bottom() {
        let metrics = PageMetrics {
            scroll_y: 0,
            viewport_height: 1080,
            document_height: 700,
        };
        assert!(metrics.at_bottom());
    }

    #[test]
    fn fractional_offset_at_the_end_counts_as_bottom() {
        let metrics = PageMetrics {
            scroll_y: 1919,
            viewport_height: 1080,
            document_height: 3000,
        };
        assert!(metrics.at_bottom());
    }

    fn sample(ready_state: &str, resources: u64) -> LoadProgress {
        LoadProgress {
            ready_state: ready_state.to_string(),
            resources,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn idle_after_a_full_quiet_window() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(ms(500));

        assert!(!tracker.observe(&sample("complete", 12), t0));
        assert!(!tracker.observe(&sample("complete", 12), t0 + ms(100)));
        assert!(!tracker.observe(&sample("complete", 12), t0 + ms(400)));
        assert!(tracker.observe(&sample("complete", 12), t0 + ms(500)));
    }

    #[test]
    fn new_resources_restart_the_window() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(ms(500));

        tracker.observe(&sample("complete", 250), t0);
        assert!(!tracker.observe(&sample("complete", 251), t0 + ms(400)));
        assert!(!tracker.observe(&sample("complete", 251), t0 + ms(800)));
        assert!(tracker.observe(&sample("complete", 251), t0 + ms(900)));
    }

    #[test]
    fn loading_document_is_never_idle() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(ms(500));

        for step in 0..20 {
            assert!(!tracker.observe(&sample("interactive", 40), t0 + ms(step * 100)));
        }
        // The window opens only once the document completes.
        assert!(!tracker.observe(&sample("complete", 40), t0 + ms(2_000)));
        assert!(tracker.observe(&sample("complete", 40), t0 + ms(2_500)));
    }

    #[test]
    fn resource_counter_is_uncapped() {
        let script = PageScripts::load_progress();
        assert!(script.contains("setResourceTimingBufferSize"));
        assert!(script.contains("PerformanceObserver"));
    }

    #[test]
    fn mid_page_is_not_at_bottom() {
        let metrics = PageMetrics {
            scroll_y: 600,
            viewport_height: 1080,
            document_height: 3000,
        };
        assert!(!metrics.at_bottom());
    }
}
