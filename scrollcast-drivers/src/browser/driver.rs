use crate::browser::page::ScrollcastPage;
use anyhow::{Context, Result};
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use scrollcast_common::Viewport;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use webdriver::capabilities::Capabilities;

/// How to reach and shape the browser session.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// WebDriver endpoint, e.g. Chromedriver on `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport: Viewport,
    /// Default page-load and script timeout applied to every command.
    pub operation_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            viewport: Viewport::default(),
            operation_timeout: Duration::from_secs(60),
        }
    }
}

/// Construct Chrome command-line arguments for a recording session.
pub fn build_chrome_arguments(settings: &BrowserSettings) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-infobars".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        format!(
            "--window-size={},{}",
            settings.viewport.width, settings.viewport.height
        ),
    ];
    if settings.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// Thin wrapper around a `fantoccini` WebDriver client that owns one
/// browser session for the duration of a recording.
pub struct ScrollcastDriver {
    client: Client,
    settings: BrowserSettings,
}

impl ScrollcastDriver {
    /// Connect to a running WebDriver service and open a browser window
    /// sized to the configured viewport.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(build_chrome_arguments(settings)));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| {
                format!("failed to connect to WebDriver at {}", settings.webdriver_url)
            })?;

        info!(
            target: "browser.driver",
            webdriver = %settings.webdriver_url,
            headless = settings.headless,
            width = settings.viewport.width,
            height = settings.viewport.height,
            "browser session opened"
        );

        let driver = Self {
            client,
            settings: settings.clone(),
        };
        driver.configure().await?;
        Ok(driver)
    }

    async fn configure(&self) -> Result<()> {
        self.client
            .set_window_size(self.settings.viewport.width, self.settings.viewport.height)
            .await
            .context("failed to size browser window")?;

        let timeout = self.settings.operation_timeout;
        self.client
            .update_timeouts(TimeoutConfiguration::new(Some(timeout), Some(timeout), None))
            .await
            .context("failed to set default operation timeouts")?;
        debug!(
            target: "browser.driver",
            timeout_ms = timeout.as_millis() as u64,
            "default timeouts set"
        );
        Ok(())
    }

    /// The single tab this session drives.
    pub fn page(&self) -> ScrollcastPage {
        ScrollcastPage::new(self.client.clone())
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .context("failed to close browser session")?;
        info!(target: "browser.driver", "browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_sessions_get_headless_flags() {
        let args = build_chrome_arguments(&BrowserSettings::default());
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1920,1080".to_string()));
        assert!(args.contains(&"--hide-scrollbars".to_string()));
    }

    #[test]
    fn headful_sessions_keep_the_window() {
        let settings = BrowserSettings {
            headless: false,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            ..BrowserSettings::default()
        };
        let args = build_chrome_arguments(&settings);
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--window-size=1280,720".to_string()));
    }
}
