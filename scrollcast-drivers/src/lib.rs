//! Driver layer for browser automation and video capture.
//!
//! - [`browser::driver::ScrollcastDriver`]: WebDriver client wrapper that owns the browser session
//! - [`browser::page::ScrollcastPage`]: navigation, readiness waits, scrolling and screenshots
//! - [`recorder::FfmpegRecorder`]: samples frames from a [`recorder::FrameSource`] into ffmpeg
pub mod browser;
pub mod recorder;
