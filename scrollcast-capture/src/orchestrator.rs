//! End-to-end recording run.
//!
//! One run owns one browser session from launch to close:
//!
//! 1. navigate and wait for network-idle (bounded by the navigation timeout)
//! 2. wait for the load state, settle, advisory visibility check
//! 3. start recording
//! 4. drive the scroll loop
//! 5. post-scroll settle and final hold
//! 6. stop the recording and wait for the file
//! 7. close the browser, whatever happened above
//!
//! Every step is awaited before the next begins; the recorder's own frame
//! sampling is the only thing running alongside the scroll loop.

use crate::options::CaptureOptions;
use crate::scroll::{drive_scroll, ScrollReport};
use crate::session::{BrowserLauncher, PageSession, VideoRecorder};
use anyhow::Context;
use scrollcast_common::{CaptureError, Result};
use std::path::{Path, PathBuf};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use url::Url;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub path: PathBuf,
    pub scroll: ScrollReport,
}

/// Input error reason for a blank URL.
pub const NO_URL: &str = "no URL provided";

/// Turn raw user input into a navigable URL.
///
/// Blank input is an [`CaptureError::Input`]; a missing scheme defaults to `https`.
pub fn normalize_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::Input(NO_URL.to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| CaptureError::Input(format!("'{trimmed}' is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" | "file" => Ok(url),
        other => Err(CaptureError::Input(format!(
            "unsupported URL scheme '{other}' in '{trimmed}'"
        ))),
    }
}

/// `<dir>/website_recording_<unix-ms>.<extension>`
pub fn artifact_path(dir: &Path, extension: &str, unix_ms: i64) -> PathBuf {
    dir.join(format!("website_recording_{unix_ms}.{extension}"))
}

/// Runs recordings with a browser launcher and a video recorder.
pub struct CaptureOrchestrator<L, R> {
    launcher: L,
    recorder: R,
}

impl<L, R> CaptureOrchestrator<L, R>
where
    L: BrowserLauncher,
    R: VideoRecorder,
{
    pub fn new(launcher: L, recorder: R) -> Self {
        Self { launcher, recorder }
    }

    /// Record `url` and return the path of the finished video.
    pub async fn run(&self, url: &str, options: &CaptureOptions) -> Result<PathBuf> {
        self.capture(url, options).await.map(|report| report.path)
    }

    /// Like [`run`](Self::run) but also returns the scroll summary.
    pub async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<CaptureReport> {
        let url = normalize_url(url)?;
        let options = options.clone().clamped();

        info!(target: "capture.session", %url, "capture session starting");
        let page = self
            .launcher
            .launch()
            .await
            .context("failed to launch browser")?;

        let outcome = self.record(page.as_ref(), &url, &options).await;
        let closed = page.close().await;

        match (outcome, closed) {
            (Ok(report), Ok(())) => {
                info!(
                    target: "capture.session",
                    path = %report.path.display(),
                    elapsed_ms = report.scroll.elapsed.as_millis() as u64,
                    final_height = report.scroll.final_height,
                    "capture session finished"
                );
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(CaptureError::Capture(e.context("failed to close browser"))),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(
                    target: "capture.session",
                    error = %close_err,
                    "browser close failed after an earlier error"
                );
                Err(e)
            }
        }
    }

    async fn record(
        &self,
        page: &dyn PageSession,
        url: &Url,
        options: &CaptureOptions,
    ) -> Result<CaptureReport> {
        self.navigate(page, url, options).await?;
        self.stabilize(page, options).await?;

        tokio::fs::create_dir_all(&options.output_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create output directory {}",
                    options.output_dir.display()
                )
            })?;
        let output = artifact_path(
            &options.output_dir,
            &options.extension,
            chrono::Utc::now().timestamp_millis(),
        );

        let recording = self
            .recorder
            .start(page.frame_source(), &output)
            .await
            .context("failed to start recording")?;

        let scrolled = drive_scroll(page, &options.scroll).await;
        if scrolled.is_ok() {
            sleep(options.post_scroll_settle).await;
        }
        sleep(options.final_hold).await;

        let stopped = recording.stop().await;
        match (scrolled, stopped) {
            (Ok(scroll), Ok(path)) => Ok(CaptureReport { path, scroll }),
            (Ok(_), Err(e)) => Err(CaptureError::Capture(
                e.context("failed to finalize recording"),
            )),
            (Err(e), stopped) => {
                if let Err(stop_err) = stopped {
                    warn!(
                        target: "capture.recorder",
                        error = %stop_err,
                        "recording did not finalize after scroll failure"
                    );
                }
                Err(CaptureError::Capture(e.context("scroll loop failed")))
            }
        }
    }

    async fn navigate(
        &self,
        page: &dyn PageSession,
        url: &Url,
        options: &CaptureOptions,
    ) -> Result<()> {
        let limit = options.readiness.navigation_timeout;
        let failure = |reason: String| CaptureError::Navigation {
            url: url.to_string(),
            reason,
        };

        match timeout(limit, page.navigate(url, &options.readiness)).await {
            Ok(Ok(())) => {
                info!(target: "capture.readiness", %url, "network idle");
                Ok(())
            }
            Ok(Err(e)) => Err(failure(format!("{e:#}"))),
            Err(_) => Err(failure(format!("timed out after {} ms", limit.as_millis()))),
        }
    }

    async fn stabilize(&self, page: &dyn PageSession, options: &CaptureOptions) -> Result<()> {
        let readiness = &options.readiness;
        page.wait_for_load(readiness.navigation_timeout)
            .await
            .context("page never reached the load state")?;

        sleep(readiness.settle).await;

        let visible = timeout(
            readiness.visibility_timeout,
            page.wait_for_visible(&readiness.ready_selector, readiness.visibility_timeout),
        )
        .await;
        match visible {
            Ok(Ok(())) => {
                info!(
                    target: "capture.readiness",
                    selector = %readiness.ready_selector,
                    "page ready"
                );
            }
            Ok(Err(e)) => {
                warn!(
                    target: "capture.readiness",
                    selector = %readiness.ready_selector,
                    error = %e,
                    "could not confirm visibility, proceeding anyway"
                );
            }
            Err(_) => {
                warn!(
                    target: "capture.readiness",
                    selector = %readiness.ready_selector,
                    timeout_ms = readiness.visibility_timeout.as_millis() as u64,
                    "visibility wait timed out, proceeding anyway"
                );
            }
        }
        Ok(())
    }
}
