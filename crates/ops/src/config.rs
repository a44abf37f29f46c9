use std::path::PathBuf;

use anyhow::Context;

use denim_observability::LogFormat;

pub const LOG_FORMAT_VAR: &str = "DENIM_LOG_FORMAT";
pub const EVENTS_PATH_VAR: &str = "DENIM_EVENTS_PATH";

/// Process configuration, read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub log_format: LogFormat,
    /// JSON-lines feed to replay; `None` reads stdin.
    pub events_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse()
                .with_context(|| format!("{LOG_FORMAT_VAR} is not a valid log format"))?,
            _ => LogFormat::default(),
        };

        let events_path = lookup(EVENTS_PATH_VAR)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            log_format,
            events_path,
        })
    }
}
