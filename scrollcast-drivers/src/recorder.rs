//! Video-capture sidecar.
//!
//! A recording is an `ffmpeg` child process fed PNG frames over stdin by a
//! pump task. The pump samples a [`FrameSource`] on its own cadence and knows
//! nothing about what the page is doing; the caller only decides when the
//! recording window opens and closes.

use crate::browser::page::ScrollcastPage;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Anything that can hand out encoded still frames of what is on screen.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// One PNG-encoded frame.
    async fn capture_frame(&self) -> Result<Vec<u8>>;
}

#[async_trait]
impl FrameSource for ScrollcastPage {
    async fn capture_frame(&self) -> Result<Vec<u8>> {
        self.screenshot().await
    }
}

#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub ffmpeg_path: String,
    pub frame_rate: u32,
    pub codec: String,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            frame_rate: 10,
            codec: "libx264".to_string(),
        }
    }
}

impl RecorderSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

/// Counters reported by the frame pump when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Screenshots actually taken.
    pub captured: u64,
    /// Frames handed to the encoder, including repeats that keep playback real-time.
    pub written: u64,
    pub failed: u64,
}

/// Number of frame slots that should have been written after `elapsed`.
fn frames_due(elapsed: Duration, frame_interval: Duration) -> u64 {
    let step = frame_interval.as_micros().max(1);
    (elapsed.as_micros() / step) as u64 + 1
}

/// Sample `frames` every `frame_interval` and write them to `sink` until
/// `cancel` fires.
///
/// When a capture takes longer than one interval, the latest frame is
/// repeated for the slots it missed, so the encoded stream stays aligned
/// with wall-clock time.
pub async fn pump_frames<W>(
    frames: Arc<dyn FrameSource>,
    mut sink: W,
    frame_interval: Duration,
    cancel: CancellationToken,
) -> Result<PumpStats>
where
    W: AsyncWrite + Unpin,
{
    let started = Instant::now();
    let mut stats = PumpStats::default();
    let mut latest: Option<Vec<u8>> = None;
    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match frames.capture_frame().await {
            Ok(frame) => {
                stats.captured += 1;
                latest = Some(frame);
            }
            Err(e) => {
                stats.failed += 1;
                warn!(target: "capture.recorder", error = %e, "frame capture failed");
            }
        }

        if let Some(frame) = &latest {
            let due = frames_due(started.elapsed(), frame_interval);
            while stats.written < due {
                sink.write_all(frame)
                    .await
                    .context("encoder stopped accepting frames")?;
                stats.written += 1;
            }
        }
    }

    // Cover the tail up to the moment the window closed.
    if let Some(frame) = &latest {
        let due = frames_due(started.elapsed(), frame_interval);
        while stats.written < due {
            sink.write_all(frame)
                .await
                .context("encoder stopped accepting frames")?;
            stats.written += 1;
        }
    }
    sink.flush().await.context("failed to flush frames")?;
    sink.shutdown().await.context("failed to close encoder input")?;
    Ok(stats)
}

/// Starts ffmpeg-backed recordings.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRecorder {
    settings: RecorderSettings,
}

impl FfmpegRecorder {
    pub fn new(settings: RecorderSettings) -> Self {
        Self { settings }
    }

    /// Encoder arguments for writing `output`.
    pub fn encoder_args(&self, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "image2pipe",
            "-c:v",
            "png",
            "-framerate",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(self.settings.frame_rate.max(1).to_string());
        args.extend(
            [
                "-i",
                "-",
                "-an",
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-pix_fmt",
                "yuv420p",
                "-c:v",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(self.settings.codec.clone());

        let faststart = output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "mp4" | "mov" | "m4v"));
        if faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }
        args.push(output.display().to_string());
        args
    }

    /// Spawn the encoder and begin sampling `frames` into `output`.
    ///
    /// The returned handle must be [`stop`](RecordingHandle::stop)ped; dropping
    /// it kills the encoder and leaves a partial file.
    pub async fn start(
        &self,
        frames: Arc<dyn FrameSource>,
        output: &Path,
    ) -> Result<RecordingHandle> {
        let mut child = Command::new(&self.settings.ffmpeg_path)
            .args(self.encoder_args(output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn encoder '{}'", self.settings.ffmpeg_path))?;

        let stdin = child
            .stdin
            .take()
            .context("encoder stdin was not captured")?;

        let cancel = CancellationToken::new();
        let pump = tokio::spawn(pump_frames(
            frames,
            stdin,
            self.settings.frame_interval(),
            cancel.clone(),
        ));

        info!(
            target: "capture.recorder",
            output = %output.display(),
            fps = self.settings.frame_rate,
            codec = %self.settings.codec,
            "recording started"
        );

        Ok(RecordingHandle {
            output: output.to_path_buf(),
            child,
            pump,
            cancel,
            started_at: Instant::now(),
        })
    }
}

/// A running recording. Stopping it finalizes the file; dropping it kills the
/// encoder.
pub struct RecordingHandle {
    output: PathBuf,
    child: Child,
    pump: JoinHandle<Result<PumpStats>>,
    cancel: CancellationToken,
    started_at: Instant,
}

impl RecordingHandle {
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Close the recording window, wait for the encoder to flush and exit,
    /// and return the finalized path.
    pub async fn stop(self) -> Result<PathBuf> {
        self.cancel.cancel();
        let pumped = self
            .pump
            .await
            .context("frame pump task aborted")?;

        let output = self
            .child
            .wait_with_output()
            .await
            .context("failed to wait for encoder")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "encoder exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }
        let stats = pumped?;

        if !self.output.exists() {
            bail!("encoder produced no file at {}", self.output.display());
        }

        info!(
            target: "capture.recorder",
            output = %self.output.display(),
            duration_ms = self.started_at.elapsed().as_millis() as u64,
            captured = stats.captured,
            written = stats.written,
            failed = stats.failed,
            "recording finalized"
        );
        Ok(self.output)
    }
}
