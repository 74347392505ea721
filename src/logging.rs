use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

pub const LOG_ENV: &str = "FEEDSCROLL_LOG";

/// Installs the global subscriber. The terminal belongs to the UI, so events
/// go to the configured log file. `log.file: null` in the config file, or an
/// empty `FEEDSCROLL_LOG__FILE`, leaves logging off.
pub fn init(cfg: &LogConfig) -> Result<Option<PathBuf>> {
    let Some(path) = cfg.file.clone() else {
        return Ok(None);
    };
    let file = open_log_file(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(filter_directive(&cfg.level)))
        .context("logging: build filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("logging: install subscriber")?;

    Ok(Some(path))
}

fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        "feedscroll=info".to_string()
    } else if level.contains('=') {
        level.to_string()
    } else {
        format!("feedscroll={level}")
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("logging: create directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("logging: open {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_targets_the_crate() {
        assert_eq!(filter_directive("debug"), "feedscroll=debug");
        assert_eq!(filter_directive(""), "feedscroll=info");
        assert_eq!(filter_directive("warn,feedscroll=trace"), "warn,feedscroll=trace");
    }

    #[test]
    fn no_file_means_no_subscriber() {
        let cfg = LogConfig {
            level: "debug".into(),
            file: None,
        };
        assert_eq!(init(&cfg).unwrap(), None);
    }

    #[test]
    fn opens_log_file_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("feedscroll.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
