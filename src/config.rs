use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SNAPSHOT_EVERY: usize = 50;

/// Server configuration.
///
/// Read from `RACE_TRACKER_*` environment variables (and an optional `.env`
/// file); command-line flags are applied afterwards through the builder setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` keeps the store purely in memory.
    pub data_dir: Option<PathBuf>,
    /// Successful writes between two snapshots.
    pub snapshot_every_ops: usize,
    /// Mounts the getAll/deleteAll routes.
    pub admin_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: None,
            snapshot_every_ops: DEFAULT_SNAPSHOT_EVERY,
            admin_enabled: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("RACE_TRACKER_HOST").unwrap_or(defaults.host);

        let port = match lookup("RACE_TRACKER_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("RACE_TRACKER_PORT must be a valid u16")?,
            None => defaults.port,
        };

        let data_dir = lookup("RACE_TRACKER_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let snapshot_every_ops = match lookup("RACE_TRACKER_SNAPSHOT_EVERY") {
            Some(raw) => raw
                .parse::<usize>()
                .context("RACE_TRACKER_SNAPSHOT_EVERY must be a positive integer")?,
            None => defaults.snapshot_every_ops,
        };
        if snapshot_every_ops == 0 {
            bail!("RACE_TRACKER_SNAPSHOT_EVERY must be a positive integer");
        }

        let admin_enabled = match lookup("RACE_TRACKER_ADMIN") {
            Some(raw) => parse_flag(&raw).context("RACE_TRACKER_ADMIN must be true or false")?,
            None => defaults.admin_enabled,
        };

        Ok(Self {
            host,
            port,
            data_dir,
            snapshot_every_ops,
            admin_enabled,
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_snapshot_every(mut self, ops: usize) -> Self {
        self.snapshot_every_ops = ops.max(1);
        self
    }

    pub fn with_admin(mut self, enabled: bool) -> Self {
        self.admin_enabled = enabled;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognized flag value '{other}'"),
    }
}
