//! Volume Raiser
//!
//! Sets the volume of every windowed application's audio session to the
//! master volume of the default output device.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use volume_raiser::app;
use volume_raiser::cli::{self, Args, Command};
use volume_raiser::config::AppConfig;
use volume_raiser::logging::{init_logging, DEFAULT_LEVEL};
use volume_raiser::paths::AppPaths;

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut paths = AppPaths::detect();
    if let Some(config) = &args.config {
        paths = paths.with_config(config);
    }
    let config = AppConfig::load_or_default(&paths.config)?;

    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let log_dir = if config.log_to_file {
        paths.ensure_logs_dir()?;
        Some(paths.logs_dir.clone())
    } else {
        None
    };
    let _log_guard = init_logging(&level, log_dir.as_deref())?;

    info!("Starting Volume Raiser v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Configuration file: {} (portable: {})",
        paths.config.display(),
        paths.is_portable
    );

    let command = args
        .command
        .clone()
        .unwrap_or_else(|| app::default_command(&config));
    run_command(&command, &config)?;

    if command.is_interactive() && config.pause_on_exit && !args.no_pause {
        cli::pause("\nPress Enter to exit...")?;
    }

    Ok(())
}

#[cfg(windows)]
fn run_command(command: &Command, config: &AppConfig) -> Result<()> {
    use anyhow::Context;
    use volume_raiser::audio::wasapi::WasapiBackend;
    use volume_raiser::process::DesktopWindows;

    let backend = WasapiBackend::new().context("Failed to open the default audio device")?;
    let processes = DesktopWindows::new(config.process_filter());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::run(command, config, &backend, &processes, &mut out)
}

#[cfg(not(windows))]
fn run_command(_command: &Command, _config: &AppConfig) -> Result<()> {
    Err(volume_raiser::audio::AudioError::Unsupported.into())
}
