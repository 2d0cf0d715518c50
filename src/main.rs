// Main entrypoint for the modapp binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use modapp::config::{Config, ConfigTrait, LogFormat};
use modapp::{logger, App};

const CONFIG_PATH: &str = "cfg/modapp.cfg.yaml";

/// modapp - application lifecycle orchestrator with health and metrics endpoints
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Log level or tracing filter directive (overrides config)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log format: json or text (overrides config)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

/// Loads the configuration struct from YAML file.
/// Falls back to built-in defaults when no config file is present.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, Some(custom_path)));
    }

    if Path::new(CONFIG_PATH).exists() {
        let cfg = Config::load(CONFIG_PATH)
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH))?;
        return Ok((cfg, Some(PathBuf::from(CONFIG_PATH))));
    }

    Ok((Config::default(), None))
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let (mut cfg, path) = load_cfg(args.cfg)?;
    if let Some(level) = args.log_level {
        cfg.app.logs.level = level;
    }
    if let Some(format) = args.log_format {
        cfg.app.logs.format = format;
    }

    // Configure logger (must be done after config is loaded)
    logger::configure(cfg.logs());

    info!(
        component = "config",
        event = "load_success",
        path = ?path,
        env = %cfg.app.env,
        "config loaded"
    );

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<()> {
    let app = App::new(cfg).context("failed to build application")?;

    let result = app.run().await;

    if let Err(e) = app.close() {
        error!(
            component = "main",
            scope = "app",
            event = "close_failed",
            error = %e,
            "failed to close application"
        );
    }

    if let Err(e) = &result {
        error!(
            component = "main",
            scope = "app",
            event = "run_failed",
            error = %e,
            "application exited with error"
        );
    }

    result.context("application run failed")
}
