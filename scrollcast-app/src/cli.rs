use clap::Parser;
use scrollcast_common::ScrollPolicy;
use scrollcast_config::{DEFAULT_CONFIG_FILE, ScrollcastConfig, ScrollcastConfigLoader};
use std::path::{Path, PathBuf};

/// Record a web page while it scrolls itself.
#[derive(Debug, Parser)]
#[command(name = "scrollcast", version)]
pub struct Cli {
    /// Page to record. Prompted for when omitted.
    #[arg(long)]
    pub url: Option<String>,

    /// YAML configuration file. The default one is skipped when missing;
    /// any other path must exist.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "SCROLLCAST_CONFIG")]
    pub config: PathBuf,

    /// `time_bounded` or `content_exhaustion`.
    #[arg(long)]
    pub policy: Option<ScrollPolicy>,

    #[arg(long)]
    pub max_duration_ms: Option<u64>,

    /// Pixels per scroll tick.
    #[arg(long)]
    pub scroll_step: Option<u32>,

    #[arg(long)]
    pub scroll_interval_ms: Option<u64>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    pub headful: bool,
}

impl Cli {
    /// Loader for the configuration file named on the command line.
    pub fn config_loader(&self) -> ScrollcastConfigLoader {
        let loader = ScrollcastConfigLoader::new();
        if self.config.as_path() == Path::new(DEFAULT_CONFIG_FILE) {
            loader.with_optional_file(&self.config)
        } else {
            loader.with_file(&self.config)
        }
    }

    /// Flags win over file and environment values.
    pub fn apply(&self, cfg: &mut ScrollcastConfig) {
        if let Some(policy) = self.policy {
            cfg.capture.policy = policy;
        }
        if let Some(ms) = self.max_duration_ms {
            cfg.capture.max_duration_ms = ms;
        }
        if let Some(px) = self.scroll_step {
            cfg.capture.scroll_step_px = px;
        }
        if let Some(ms) = self.scroll_interval_ms {
            cfg.capture.scroll_interval_ms = ms;
        }
        if let Some(dir) = &self.output_dir {
            cfg.capture.output_dir = dir.clone();
        }
        if let Some(url) = &self.webdriver_url {
            cfg.browser.webdriver_url = url.clone();
        }
        if self.headful {
            cfg.browser.headless = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configuration() {
        let cli = Cli::try_parse_from([
            "scrollcast",
            "--url",
            "example.com",
            "--policy",
            "content_exhaustion",
            "--scroll-step",
            "500",
            "--max-duration-ms",
            "100000",
            "--headful",
        ])
        .unwrap();

        let mut cfg = ScrollcastConfig::default();
        cli.apply(&mut cfg);

        assert_eq!(cli.url.as_deref(), Some("example.com"));
        assert_eq!(cfg.capture.policy, ScrollPolicy::ContentExhaustion);
        assert_eq!(cfg.capture.scroll_step_px, 500);
        assert_eq!(cfg.capture.max_duration_ms, 100_000);
        assert_eq!(cfg.capture.scroll_interval_ms, 1_000);
        assert!(!cfg.browser.headless);
    }

    #[test]
    fn no_flags_leave_configuration_alone() {
        let cli = Cli::try_parse_from(["scrollcast"]).unwrap();
        let mut cfg = ScrollcastConfig::default();
        cfg.capture.scroll_step_px = 750;
        cli.apply(&mut cfg);

        assert!(cli.url.is_none());
        assert_eq!(cfg.capture.scroll_step_px, 750);
        assert!(cfg.browser.headless);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.yaml");
        let cli = Cli::try_parse_from(["scrollcast", "--config", missing.to_str().unwrap()])
            .unwrap();

        assert!(cli.config_loader().load().is_err());
    }

    #[test]
    fn explicit_config_file_is_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.yaml");
        std::fs::write(&path, "capture:\n  scroll_step_px: 420\n").unwrap();
        let cli = Cli::try_parse_from(["scrollcast", "--config", path.to_str().unwrap()]).unwrap();

        let cfg = cli.config_loader().load().unwrap();

        assert_eq!(cfg.capture.scroll_step_px, 420);
    }

    #[test]
    fn missing_default_config_file_is_skipped() {
        let cli = Cli::try_parse_from(["scrollcast"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));

        assert!(cli.config_loader().load().is_ok());
    }

    #[test]
    fn unknown_policy_is_a_usage_error() {
        assert!(Cli::try_parse_from(["scrollcast", "--policy", "sideways"]).is_err());
    }
}
