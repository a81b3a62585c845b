//! Logging for the bank gateway.
//!
//! Coloured stdout plus a plain `bank-gateway.log`, installed once per
//! process. `BANK_GATEWAY_LOG` (`error`..`trace`) overrides the build's
//! default level.

use crate::error::GatewayError;

use std::env;
use std::fmt::Arguments;
use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

/// Set on the first call, successful or not.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "bank-gateway.log";

pub const LOG_LEVEL_ENV: &str = "BANK_GATEWAY_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// HTTP plumbing crates, capped at `Warn` whatever the gateway level.
const QUIET_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

/// Install the global logger writing to stdout and `<log_dir>/bank-gateway.log`.
///
/// Later calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns [`GatewayError::Gateway`] if the log file cannot be opened or
/// another logger is already installed.
pub fn initialize(log_dir: &Path) -> Result<(), GatewayError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let level = level_from_env(env::var(LOG_LEVEL_ENV).ok().as_deref());
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = install(log_dir, level);
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// Parse a level name, falling back to the build default.
pub fn level_from_env(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

#[track_caller]
fn install(log_dir: &Path, level: LevelFilter) -> Result<(), GatewayError> {
    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let log_file = fern::log_file(log_dir.join(LOG_FILE_NAME))
        .map_err(|e| GatewayError::gateway(format!("Failed to create log file: {e}")))?;

    let base = QUIET_TARGETS
        .iter()
        .fold(Dispatch::new().level(level), |dispatch, target| {
            dispatch.level_for(*target, LevelFilter::Warn)
        });

    base.chain(
        Dispatch::new()
            .format(move |out, message, record| {
                write_line(out, message, record, colors.color(record.level()))
            })
            .chain(stdout()),
    )
    .chain(
        Dispatch::new()
            .format(|out, message, record| write_line(out, message, record, record.level()))
            .chain(log_file),
    )
    .apply()
    .map_err(|e| GatewayError::gateway(format!("Failed to initialize logger: {e}")))
}

fn write_line(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    level: impl std::fmt::Display,
) {
    out.finish(format_args!(
        "[{date} - {level}] {target}: {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        target = record.target(),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
