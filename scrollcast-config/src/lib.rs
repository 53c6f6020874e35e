//! Loader for `scrollcast.yaml` with environment overlays.
//!
//! Sources are merged in increasing precedence: built-in defaults, YAML files
//! (required or optional), inline YAML, then `SCROLLCAST__SECTION__KEY`
//! environment variables. String values may reference `${VAR}` placeholders,
//! which are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use scrollcast_common::observability::LogFormat;
use scrollcast_common::{ScrollPolicy, Viewport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SCROLLCAST";

/// Default file name looked up by the binary.
pub const DEFAULT_CONFIG_FILE: &str = "scrollcast.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollcastConfig {
    pub version: Option<String>,
    pub capture: CaptureSection,
    pub browser: BrowserSection,
    pub recorder: RecorderSection,
    pub logging: LoggingSection,
}

/// Scroll loop tuning and artifact placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    pub max_duration_ms: u64,
    pub scroll_step_px: u32,
    pub scroll_interval_ms: u64,
    pub policy: ScrollPolicy,
    /// Consecutive unchanged-height ticks that end an exhaustion run.
    pub stable_ticks: u32,
    pub output_dir: PathBuf,
    pub post_scroll_settle_ms: u64,
    pub final_hold_ms: u64,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            max_duration_ms: 10_000,
            scroll_step_px: 600,
            scroll_interval_ms: 1_000,
            policy: ScrollPolicy::TimeBounded,
            stable_ticks: 3,
            output_dir: PathBuf::from("."),
            post_scroll_settle_ms: 2_000,
            final_hold_ms: 1_000,
        }
    }
}

/// WebDriver connection and page readiness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport: Viewport,
    pub navigation_timeout_ms: u64,
    pub settle_ms: u64,
    pub ready_selector: String,
    pub visibility_timeout_ms: u64,
    pub network_idle_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            viewport: Viewport::default(),
            navigation_timeout_ms: 60_000,
            settle_ms: 2_000,
            ready_selector: "body".to_string(),
            visibility_timeout_ms: 10_000,
            network_idle_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSection {
    pub ffmpeg_path: String,
    pub frame_rate: u32,
    pub codec: String,
    pub extension: String,
}

impl Default for RecorderSection {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            frame_rate: 10,
            codec: "libx264".to_string(),
            extension: "mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            emit_stderr: false,
            filter: "info".to_string(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate (YAML sources + env overrides).
pub struct ScrollcastConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ScrollcastConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollcastConfigLoader {
    /// Start from built-in defaults; environment overrides are applied in [`load`](Self::load).
    ///
    /// ```
    /// use scrollcast_config::ScrollcastConfigLoader;
    ///
    /// let config = ScrollcastConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.capture.scroll_step_px, 600);
    /// assert_eq!(config.browser.viewport.width, 1920);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when absent, so a bare environment is enough.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use scrollcast_common::ScrollPolicy;
    /// use scrollcast_config::ScrollcastConfigLoader;
    ///
    /// let cfg = ScrollcastConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// capture:
    ///   policy: content_exhaustion
    ///   scroll_interval_ms: 500
    /// recorder:
    ///   extension: webm
    ///   codec: libvpx-vp9
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.capture.policy, ScrollPolicy::ContentExhaustion);
    /// assert_eq!(cfg.capture.scroll_interval_ms, 500);
    /// assert_eq!(cfg.capture.max_duration_ms, 10_000);
    /// assert_eq!(cfg.recorder.extension, "webm");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, apply `SCROLLCAST__` overrides, expand `${VAR}`
    /// placeholders and deserialize into [`ScrollcastConfig`].
    ///
    /// ```
    /// use scrollcast_config::ScrollcastConfigLoader;
    ///
    /// unsafe { std::env::set_var("RECORDINGS_ROOT", "/srv/recordings"); }
    ///
    /// let config = ScrollcastConfigLoader::new()
    ///     .with_yaml_str("capture:\n  output_dir: \"${RECORDINGS_ROOT}/scrolls\"\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.capture.output_dir.to_str(), Some("/srv/recordings/scrolls"));
    ///
    /// unsafe { std::env::remove_var("RECORDINGS_ROOT"); }
    /// ```
    pub fn load(self) -> Result<ScrollcastConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("VIDEO_DIR", Some("/tmp/videos"), || {
            let mut v = json!("${VIDEO_DIR}/out");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("/tmp/videos/out"));
        });
    }

    #[test]
    fn expands_nested_sections() {
        temp_env::with_vars(
            [("WD_HOST", Some("grid")), ("WD_PORT", Some("4444"))],
            || {
                let mut v = json!({
                    "browser": { "webdriver_url": "http://${WD_HOST}:${WD_PORT}" },
                    "capture": { "scroll_step_px": 600 },
                    "tags": ["$WD_HOST", null]
                });
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!({
                        "browser": { "webdriver_url": "http://grid:4444" },
                        "capture": { "scroll_step_px": 600 },
                        "tags": ["grid", null]
                    })
                );
            },
        );
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars([("LOOP_A", Some("${LOOP_B}")), ("LOOP_B", Some("${LOOP_A}"))], || {
            let mut v = json!("dir=${LOOP_A}");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("dir="));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("out-${SCROLLCAST_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("out-${SCROLLCAST_DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_match_the_documented_profile() {
        let cfg = ScrollcastConfig::default();
        assert_eq!(cfg.capture.max_duration_ms, 10_000);
        assert_eq!(cfg.capture.scroll_interval_ms, 1_000);
        assert_eq!(cfg.capture.policy, ScrollPolicy::TimeBounded);
        assert_eq!(cfg.browser.navigation_timeout_ms, 60_000);
        assert_eq!(cfg.browser.ready_selector, "body");
        assert_eq!(cfg.recorder.extension, "mp4");
    }
}
