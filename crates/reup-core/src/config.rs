use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::BatchSettings;
use crate::dispatch::DEFAULT_CHUNK_SIZE;
use crate::limiter::{Decrement, LimiterPolicy, Recovery};
use crate::retry::Backoff;

/// Rate budget shared by all chunks of one batch (`[queue]` in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Refill interval in seconds.
    pub window_secs: u64,
    /// Permits per window.
    pub capacity: u32,
    /// Lowest capacity network-failure throttling may reach.
    #[serde(default = "default_min_capacity")]
    pub min_capacity: u32,
    #[serde(default)]
    pub decrement: Decrement,
    #[serde(default)]
    pub recovery: Recovery,
}

fn default_min_capacity() -> u32 {
    1
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            capacity: 100,
            min_capacity: default_min_capacity(),
            decrement: Decrement::default(),
            recovery: Recovery::default(),
        }
    }
}

/// Retry parameters (optional `[retry]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per chunk, including the first.
    pub tries: u32,
    /// Base delay in seconds for exponential backoff (0 = no backoff, limiter pacing only).
    #[serde(default)]
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    #[serde(default)]
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tries: 3,
            base_delay_secs: 0.0,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/reup/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReupConfig {
    /// Ids per remote call.
    pub chunk_size: usize,
    /// Cookie file override; defaults to the XDG state dir.
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    #[serde(default)]
    pub queue: QueueConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ReupConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cookie_file: None,
            queue: QueueConfig::default(),
            retry: None,
        }
    }
}

impl ReupConfig {
    pub fn limiter_policy(&self) -> LimiterPolicy {
        LimiterPolicy {
            window: Duration::from_secs(self.queue.window_secs),
            capacity: self.queue.capacity,
            min_capacity: self.queue.min_capacity,
            decrement: self.queue.decrement,
            recovery: self.queue.recovery,
        }
    }

    /// Reject values that parse but cannot be turned into durations.
    pub fn validate(&self) -> Result<()> {
        if let Some(retry) = &self.retry {
            let base = retry.base_delay_secs;
            if !base.is_finite() || base < 0.0 {
                bail!("retry.base_delay_secs must be a finite, non-negative number (got {base})");
            }
            if Duration::try_from_secs_f64(base).is_err() {
                bail!("retry.base_delay_secs is too large (got {base})");
            }
        }
        Ok(())
    }

    /// Out-of-range backoff values are clamped to `max_delay_secs`.
    pub fn batch_settings(&self) -> BatchSettings {
        let retry = self.retry.clone().unwrap_or_default();
        let max = Duration::from_secs(retry.max_delay_secs);
        let backoff = (retry.base_delay_secs > 0.0).then(|| Backoff {
            base: Duration::try_from_secs_f64(retry.base_delay_secs)
                .unwrap_or(max)
                .min(max),
            max,
        });
        BatchSettings {
            chunk_size: self.chunk_size,
            limiter: self.limiter_policy(),
            tries: retry.tries,
            backoff,
        }
    }

    /// Configured cookie file, or the default under the XDG state dir.
    pub fn cookie_path(&self) -> Result<PathBuf> {
        match &self.cookie_file {
            Some(p) => Ok(p.clone()),
            None => crate::credential::CookieFile::default_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("reup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ReupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ReupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<ReupConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: ReupConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
