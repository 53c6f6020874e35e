//! Scroll-and-capture orchestration.
//!
//! Loads a page, waits for it to settle, then records it while an eased
//! scroll loop walks through the content.
//!
//! - [`orchestrator::CaptureOrchestrator`]: the end-to-end recording run
//! - [`scroll`]: the tick-based scroll state machine and the loop driving it
//! - [`session`]: the browser and recorder seams the orchestrator talks to
//! - [`webdriver`]: implementations of those seams over WebDriver and ffmpeg
//! - [`options`]: runtime options with their defaults
pub mod options;
pub mod orchestrator;
pub mod scroll;
pub mod session;
pub mod webdriver;

pub use options::{CaptureOptions, ReadinessOptions, ScrollOptions};
pub use orchestrator::{
    artifact_path, normalize_url, CaptureOrchestrator, CaptureReport, NO_URL,
};
pub use scroll::{drive_scroll, ScrollAction, ScrollReport, ScrollState, StopReason};
pub use scrollcast_drivers::browser::page::PageMetrics;
pub use scrollcast_drivers::recorder::FrameSource;
pub use session::{ActiveRecording, BrowserLauncher, PageSession, ScrollSurface, VideoRecorder};
