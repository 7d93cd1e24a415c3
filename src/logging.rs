use std::fs::OpenOptions;
use std::path::PathBuf;

use log::LevelFilter;
use nix::errno::Errno;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::LoggingConfig;

/// Install the session logger, appending to the configured file.
///
/// Best-effort: any failure leaves logging disabled (the log must never
/// keep the shell from starting). Returns the path in use, if any.
pub fn init(config: &LoggingConfig) -> Option<PathBuf> {
    if !config.enabled {
        return None;
    }
    let level = config.level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    if level == LevelFilter::Off {
        return None;
    }

    let path = log_path(&config.file)?;
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, log_config, file).ok()?;
    Some(path)
}

/// Expand a leading `~` in the configured log path.
fn log_path(raw: &str) -> Option<PathBuf> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(raw).into_owned()))
}

/// Report a failed system call the way `perror(3)` does and log it.
pub fn report(op: &str, err: Errno) {
    eprintln!("{op}: {}", err.desc());
    log::warn!("{op} failed: {err}");
}
