use crate::options::ReadinessOptions;
use crate::session::{ActiveRecording, BrowserLauncher, PageSession, ScrollSurface, VideoRecorder};
use anyhow::Result;
use async_trait::async_trait;
use scrollcast_config::{BrowserSection, RecorderSection};
use scrollcast_drivers::browser::driver::{BrowserSettings, ScrollcastDriver};
use scrollcast_drivers::browser::page::{PageMetrics, ScrollcastPage};
use scrollcast_drivers::recorder::{FfmpegRecorder, FrameSource, RecorderSettings, RecordingHandle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Launches Chrome sessions through a WebDriver endpoint.
pub struct WebDriverLauncher {
    settings: BrowserSettings,
}

impl WebDriverLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(browser: &BrowserSection) -> Self {
        Self::new(BrowserSettings {
            webdriver_url: browser.webdriver_url.clone(),
            headless: browser.headless,
            viewport: browser.viewport,
            operation_timeout: Duration::from_millis(browser.navigation_timeout_ms.max(1)),
        })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        let driver = ScrollcastDriver::launch(&self.settings).await?;
        let page = driver.page();
        Ok(Box::new(WebDriverSession { driver, page }))
    }
}

/// One WebDriver browser session and its tab.
pub struct WebDriverSession {
    driver: ScrollcastDriver,
    page: ScrollcastPage,
}

#[async_trait]
impl ScrollSurface for WebDriverSession {
    async fn metrics(&self) -> Result<PageMetrics> {
        self.page.metrics().await
    }

    async fn scroll_by(&self, pixels: u32) -> Result<()> {
        self.page.scroll_by_smooth(pixels).await
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.page.scroll_to_top().await
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn navigate(&self, url: &Url, readiness: &ReadinessOptions) -> Result<()> {
        self.page.goto(url.as_str()).await?;
        self.page
            .wait_for_network_idle(readiness.network_idle, readiness.navigation_timeout)
            .await
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        self.page.wait_for_load_state(timeout).await
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.page.wait_for_selector_visible(selector, timeout).await
    }

    fn frame_source(&self) -> Arc<dyn FrameSource> {
        Arc::new(self.page.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.driver.close().await
    }
}

/// Records through an ffmpeg child process.
pub struct FfmpegVideoRecorder {
    inner: FfmpegRecorder,
}

impl FfmpegVideoRecorder {
    pub fn new(settings: RecorderSettings) -> Self {
        Self {
            inner: FfmpegRecorder::new(settings),
        }
    }

    pub fn from_config(recorder: &RecorderSection) -> Self {
        Self::new(RecorderSettings {
            ffmpeg_path: recorder.ffmpeg_path.clone(),
            frame_rate: recorder.frame_rate.max(1),
            codec: recorder.codec.clone(),
        })
    }
}

#[async_trait]
impl VideoRecorder for FfmpegVideoRecorder {
    async fn start(
        &self,
        frames: Arc<dyn FrameSource>,
        output: &Path,
    ) -> Result<Box<dyn ActiveRecording>> {
        let handle = self.inner.start(frames, output).await?;
        Ok(Box::new(handle))
    }
}

#[async_trait]
impl ActiveRecording for RecordingHandle {
    async fn stop(self: Box<Self>) -> Result<PathBuf> {
        RecordingHandle::stop(*self).await
    }
}
