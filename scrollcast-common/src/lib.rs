//! Common types and utilities shared across Scrollcast crates.
//!
//! This crate defines the error taxonomy, the scroll termination policy,
//! viewport geometry, and the observability helpers used throughout the
//! Scrollcast workspace. It stays small so that every crate can depend on it
//! without pulling in browser or process machinery.
//!
//! # Overview
//!
//! - [`CaptureError`] and [`Result`]: Shared error handling
//! - [`ScrollPolicy`]: How the scroll-drive loop decides to stop
//! - [`Viewport`]: Browser window geometry
//! - [`observability`]: Centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use scrollcast_common::{ScrollPolicy, Viewport};
//!
//! let policy: ScrollPolicy = "content_exhaustion".parse().unwrap();
//! assert_eq!(policy, ScrollPolicy::ContentExhaustion);
//! assert_eq!(Viewport::default().height, 1080);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// Termination strategy for the scroll-drive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPolicy {
    /// Scroll until the time budget is spent, jumping back to the top
    /// whenever the bottom of the document is reached.
    #[default]
    TimeBounded,
    /// Scroll until the document stops growing (or the time budget is spent).
    ContentExhaustion,
}

impl ScrollPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollPolicy::TimeBounded => "time_bounded",
            ScrollPolicy::ContentExhaustion => "content_exhaustion",
        }
    }
}

impl fmt::Display for ScrollPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrollPolicy {
    type Err = CaptureError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "time_bounded" | "time" => Ok(ScrollPolicy::TimeBounded),
            "content_exhaustion" | "exhaustion" => Ok(ScrollPolicy::ContentExhaustion),
            other => Err(CaptureError::Config(format!(
                "unknown scroll policy '{other}' (expected time_bounded or content_exhaustion)"
            ))),
        }
    }
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Error types used across the Scrollcast system.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// No usable URL was supplied.
    #[error("Input error: {0}")]
    Input(String),

    /// The target could not be reached within the navigation timeout.
    #[error("Navigation failure for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Anything that went wrong while recording, scrolling or tearing down.
    #[error("Capture failure: {0}")]
    Capture(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
