use crate::ranking::{Policy, DEFAULT_CAPACITY};
use crate::store::Backend;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {:?}, expected text or json", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub store_path: PathBuf,
    pub policy: Policy,
    pub capacity: usize,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the process environment, after loading `ENV_FILE` (default
    /// `.env`) if it exists. Variables already set win over the file.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = std::env::var("ENV_FILE").unwrap_or_else(|_| ".env".into());
        match dotenvy::from_filename(&env_file) {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: env_file,
                    source,
                })
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend: Backend = parse_var(&lookup, "LEADERBOARD_BACKEND", Backend::default())?;
        let capacity: usize = parse_var(&lookup, "LEADERBOARD_CAPACITY", DEFAULT_CAPACITY)?;
        if capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "LEADERBOARD_CAPACITY",
                value: capacity.to_string(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_var(&lookup, "PORT", 3000)?,
            backend,
            store_path: lookup("LEADERBOARD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(backend.default_path())),
            policy: parse_var(&lookup, "LEADERBOARD_POLICY", Policy::default())?,
            capacity,
            log_format: parse_var(&lookup, "LOG_FORMAT", LogFormat::default())?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
