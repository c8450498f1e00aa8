// # dyndnsd - Dynamic DNS Daemon
//
// This daemon is a THIN integration layer only. All reconciliation logic
// lives in dyndns-core; this binary is responsible for:
// 1. Reading settings from environment variables
// 2. Loading and validating the JSON configuration file
// 3. Initializing logging and the runtime
// 4. Wiring the HTTP resolver and the Name.com provider into the runner
// 5. Translating SIGINT/SIGTERM into cooperative cancellation
//
// ## Configuration
//
// - `DYNDNS_CONFIG`: Path to the JSON configuration file (default `config.json`)
// - `DYNDNS_DAEMON`: `true` to run forever, `false` for a single pass (default `false`)
// - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `DYNDNS_IPV4_MIRRORS`: Comma-separated IPv4 mirrors, overrides the file
// - `DYNDNS_IPV6_MIRRORS`: Comma-separated IPv6 mirrors, overrides the file
// - `DYNDNS_MODE`: `dry-run` to log record changes without sending them
//
// ## Example
//
// ```bash
// export DYNDNS_CONFIG=/etc/dyndns/config.json
// export DYNDNS_DAEMON=true
//
// dyndnsd
// ```

use anyhow::{Context, Result};
use dyndns_core::{DyndnsConfig, RunMode, Runner, TaskExit, TaskSummary};
use dyndns_ip_http::HttpIpResolver;
use dyndns_provider_namecom::NameComFactory;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DyndnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// A one-shot pass failed or a task died
    RuntimeError = 2,
}

impl From<DyndnsExitCode> for ExitCode {
    fn from(code: DyndnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    config_path: PathBuf,
    daemon: bool,
    log_level: Level,
    ipv4_mirrors: Option<Vec<String>>,
    ipv6_mirrors: Option<Vec<String>>,
    dry_run: bool,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let daemon = match lookup("DYNDNS_DAEMON") {
            Some(value) => parse_bool("DYNDNS_DAEMON", &value)?,
            None => false,
        };

        let log_level = match lookup("DYNDNS_LOG_LEVEL") {
            Some(value) => parse_log_level(&value)?,
            None => Level::INFO,
        };

        let dry_run = match lookup("DYNDNS_MODE") {
            Some(mode) => match mode.trim().to_lowercase().as_str() {
                "dry-run" => true,
                "" | "live" => false,
                other => anyhow::bail!(
                    "DYNDNS_MODE '{}' is not valid. Valid modes: dry-run, live",
                    other
                ),
            },
            None => false,
        };

        Ok(Self {
            config_path: lookup("DYNDNS_CONFIG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            daemon,
            log_level,
            ipv4_mirrors: lookup("DYNDNS_IPV4_MIRRORS").map(|v| parse_list(&v)),
            ipv6_mirrors: lookup("DYNDNS_IPV6_MIRRORS").map(|v| parse_list(&v)),
            dry_run,
        })
    }

    /// Read the configuration file and apply environment overrides
    fn load_config(&self) -> Result<DyndnsConfig> {
        let mut config = DyndnsConfig::from_json_file(&self.config_path)
            .with_context(|| format!("Failed to load {}", self.config_path.display()))?;

        if let Some(ref mirrors) = self.ipv4_mirrors {
            config.mirrors.ipv4 = mirrors.clone();
        }
        if let Some(ref mirrors) = self.ipv6_mirrors {
            config.mirrors.ipv6 = mirrors.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn run_mode(&self) -> RunMode {
        RunMode::from_daemon_flag(self.daemon)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => anyhow::bail!("{} must be true or false. Got: {}", key, other),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DYNDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}

/// Map the joined task summaries to a process exit code
fn exit_code_for(expected: usize, summaries: &[TaskSummary]) -> DyndnsExitCode {
    if summaries.len() < expected {
        return DyndnsExitCode::RuntimeError;
    }

    if summaries.iter().any(|s| s.exit == TaskExit::Aborted) {
        return DyndnsExitCode::RuntimeError;
    }

    DyndnsExitCode::CleanShutdown
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    let config = match settings.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    info!("Starting dyndnsd");
    info!(
        "Configuration loaded: {} domain(s), mode {:?}",
        config.configs.len(),
        settings.run_mode()
    );

    if settings.dry_run {
        warn!("DRY-RUN mode enabled: record changes will be logged, not sent");
    }

    let resolver = Arc::new(HttpIpResolver::new(&config.mirrors));
    let factory = NameComFactory::new(settings.dry_run);

    let runner = match Runner::from_config(&config, resolver, &factory, settings.run_mode()) {
        Ok(runner) => runner,
        Err(e) => {
            error!("Failed to build reconcilers: {}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DyndnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(runner)).into()
}

/// Run every reconciler until done or until a shutdown signal arrives
async fn run_daemon(runner: Runner) -> DyndnsExitCode {
    let expected = runner.len();
    let shutdown = runner.shutdown_token();

    let signals = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                info!("Shutting down reconcilers");
                shutdown.cancel();
            }
            Err(e) => error!("Signal handling error: {}", e),
        }
    });

    let summaries = runner.run().await;
    signals.abort();

    for summary in &summaries {
        info!(
            domain = %summary.domain,
            passes = summary.passes,
            failed_passes = summary.failed_passes,
            "Reconciler exited: {:?}",
            summary.exit
        );
    }

    let code = exit_code_for(expected, &summaries);
    if code != DyndnsExitCode::CleanShutdown {
        error!("One or more reconcilers did not complete");
    }
    code
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
