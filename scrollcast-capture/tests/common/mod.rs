#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scrollcast_capture::{
    ActiveRecording, BrowserLauncher, FrameSource, PageMetrics, PageSession, ReadinessOptions,
    ScrollSurface, VideoRecorder,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Something a fake collaborator was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Launch,
    Navigate(String),
    WaitForLoad,
    WaitForVisible(String),
    RecordStart(PathBuf),
    ScrollBy { y_after: u64 },
    ScrollToTop,
    RecordStop,
    Close,
}

/// Shared, timestamped log of collaborator calls.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<(Instant, Event)>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push((Instant::now(), event));
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn timed(&self) -> Vec<(Instant, Event)> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(pred)
    }

    pub fn last_position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().rposition(pred)
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// How the fake page behaves.
#[derive(Debug, Clone)]
pub struct PageScript {
    pub viewport_height: u64,
    pub initial_height: u64,
    /// Document height after each successive scroll; the last value sticks.
    pub growth: Vec<u64>,
    pub navigation: Behavior,
    pub visibility: Behavior,
    /// Metrics reads fail from this scroll tick onwards.
    pub fail_metrics_after_scrolls: Option<usize>,
}

impl PageScript {
    pub fn static_page(height: u64) -> Self {
        Self {
            viewport_height: 1080,
            initial_height: height,
            growth: Vec::new(),
            navigation: Behavior::Succeed,
            visibility: Behavior::Succeed,
            fail_metrics_after_scrolls: None,
        }
    }
}

struct PageState {
    scroll_y: u64,
    height: u64,
    growth: VecDeque<u64>,
    scrolls: usize,
}

pub struct FakePage {
    script: PageScript,
    state: Mutex<PageState>,
    journal: Journal,
}

impl FakePage {
    pub fn new(script: PageScript, journal: Journal) -> Self {
        let state = PageState {
            scroll_y: 0,
            height: script.initial_height,
            growth: script.growth.iter().copied().collect(),
            scrolls: 0,
        };
        Self {
            script,
            state: Mutex::new(state),
            journal,
        }
    }

    fn max_scroll(&self, height: u64) -> u64 {
        height.saturating_sub(self.script.viewport_height)
    }
}

async fn behave(behavior: Behavior, what: &str) -> Result<()> {
    match behavior {
        Behavior::Succeed => Ok(()),
        Behavior::Fail => Err(anyhow!("{what} failed")),
        Behavior::Hang => {
            std::future::pending::<()>().await;
            Ok(())
        }
    }
}

#[async_trait]
impl ScrollSurface for FakePage {
    async fn metrics(&self) -> Result<PageMetrics> {
        let state = self.state.lock().unwrap();
        if let Some(limit) = self.script.fail_metrics_after_scrolls {
            if state.scrolls >= limit {
                return Err(anyhow!("javascript error: page crashed"));
            }
        }
        Ok(PageMetrics {
            scroll_y: state.scroll_y,
            viewport_height: self.script.viewport_height,
            document_height: state.height,
        })
    }

    async fn scroll_by(&self, pixels: u32) -> Result<()> {
        let y_after = {
            let mut state = self.state.lock().unwrap();
            state.scrolls += 1;
            let max = self.max_scroll(state.height);
            state.scroll_y = (state.scroll_y + u64::from(pixels)).min(max);
            if let Some(next) = state.growth.pop_front() {
                state.height = next;
            }
            state.scroll_y
        };
        self.journal.push(Event::ScrollBy { y_after });
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.scrolls += 1;
            state.scroll_y = 0;
        }
        self.journal.push(Event::ScrollToTop);
        Ok(())
    }
}

pub struct NoFrames;

#[async_trait]
impl FrameSource for NoFrames {
    async fn capture_frame(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&self, url: &Url, _readiness: &ReadinessOptions) -> Result<()> {
        self.journal.push(Event::Navigate(url.to_string()));
        behave(self.script.navigation, "navigation").await
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<()> {
        self.journal.push(Event::WaitForLoad);
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.journal.push(Event::WaitForVisible(selector.to_string()));
        behave(self.script.visibility, "visibility wait").await
    }

    fn frame_source(&self) -> Arc<dyn FrameSource> {
        Arc::new(NoFrames)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.journal.push(Event::Close);
        Ok(())
    }
}

pub struct FakeLauncher {
    pub script: PageScript,
    pub journal: Journal,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        self.journal.push(Event::Launch);
        Ok(Box::new(FakePage::new(self.script.clone(), self.journal.clone())))
    }
}

pub struct FakeRecorder {
    pub journal: Journal,
    pub fail_stop: bool,
}

pub struct FakeRecording {
    output: PathBuf,
    journal: Journal,
    fail_stop: bool,
}

#[async_trait]
impl VideoRecorder for FakeRecorder {
    async fn start(
        &self,
        _frames: Arc<dyn FrameSource>,
        output: &Path,
    ) -> Result<Box<dyn ActiveRecording>> {
        self.journal.push(Event::RecordStart(output.to_path_buf()));
        Ok(Box::new(FakeRecording {
            output: output.to_path_buf(),
            journal: self.journal.clone(),
            fail_stop: self.fail_stop,
        }))
    }
}

#[async_trait]
impl ActiveRecording for FakeRecording {
    async fn stop(self: Box<Self>) -> Result<PathBuf> {
        self.journal.push(Event::RecordStop);
        if self.fail_stop {
            return Err(anyhow!("encoder exited with status 1"));
        }
        Ok(self.output)
    }
}
