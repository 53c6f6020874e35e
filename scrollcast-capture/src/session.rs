use crate::options::ReadinessOptions;
use anyhow::Result;
use async_trait::async_trait;
use scrollcast_drivers::browser::page::PageMetrics;
use scrollcast_drivers::recorder::FrameSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The part of a page the scroll loop drives.
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    async fn metrics(&self) -> Result<PageMetrics>;

    /// Start an eased scroll of `pixels` downwards.
    async fn scroll_by(&self, pixels: u32) -> Result<()>;

    /// Jump straight back to the top of the document.
    async fn scroll_to_top(&self) -> Result<()>;
}

/// A live browser tab owned by one recording run.
#[async_trait]
pub trait PageSession: ScrollSurface {
    /// Load `url` and return once the network has gone idle.
    async fn navigate(&self, url: &Url, readiness: &ReadinessOptions) -> Result<()>;

    /// Wait for the `load` lifecycle state.
    async fn wait_for_load(&self, timeout: Duration) -> Result<()>;

    /// Wait for `selector` to be visible.
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Frames of this tab for the recorder.
    fn frame_source(&self) -> Arc<dyn FrameSource>;

    /// Release the tab and its browser.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// Starts recordings of a frame source.
#[async_trait]
pub trait VideoRecorder: Send + Sync {
    async fn start(
        &self,
        frames: Arc<dyn FrameSource>,
        output: &Path,
    ) -> Result<Box<dyn ActiveRecording>>;
}

/// A recording in progress.
#[async_trait]
pub trait ActiveRecording: Send {
    /// Stop capturing and wait until the file is finalized.
    async fn stop(self: Box<Self>) -> Result<PathBuf>;
}
