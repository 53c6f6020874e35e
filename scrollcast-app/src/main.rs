use anyhow::Context;
use clap::Parser;
use cli::Cli;
use prompt::prompt_for_url;
use scrollcast_capture::webdriver::{FfmpegVideoRecorder, WebDriverLauncher};
use scrollcast_capture::{CaptureOptions, CaptureOrchestrator, NO_URL};
use scrollcast_common::CaptureError;
use scrollcast_common::observability::{LogConfig, init_logging};
use scrollcast_config::ScrollcastConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::error;

mod cli;
mod prompt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(path) => {
            println!("Video recorded at: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(target: "capture.session", error = %err, "recording failed");
            eprintln!("{}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn failure_message(err: &CaptureError) -> String {
    match err {
        CaptureError::Input(reason) if reason == NO_URL => "No URL provided".to_string(),
        CaptureError::Input(reason) => format!("Invalid URL: {reason}"),
        other => format!("Recording failed: {other}"),
    }
}

async fn run(cli: Cli) -> scrollcast_common::Result<PathBuf> {
    // 1) Config: file < env < flags
    let mut cfg: ScrollcastConfig = cli
        .config_loader()
        .load()
        .map_err(|e| CaptureError::Config(e.to_string()))?;
    cli.apply(&mut cfg);

    init_logging(LogConfig {
        app_name: "scrollcast",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;

    // 2) URL: flag or interactive prompt
    let url = match cli.url {
        Some(url) => url,
        None => {
            let mut stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            prompt_for_url(&mut stdin, &mut stdout)
                .await
                .context("could not prompt for a URL")?
        }
    };

    // 3) Record
    let orchestrator = CaptureOrchestrator::new(
        WebDriverLauncher::from_config(&cfg.browser),
        FfmpegVideoRecorder::from_config(&cfg.recorder),
    );
    orchestrator
        .run(&url, &CaptureOptions::from_config(&cfg))
        .await
}
