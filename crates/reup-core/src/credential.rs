//! Credential seams used by the refresh flow, plus the cookie file store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::remote::RemoteError;

/// Interactive source of a replacement credential.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Ask for a new credential. `reason` explains why the previous one failed.
    /// `None` means the user gave up.
    async fn prompt(&self, reason: &str) -> Option<String>;
}

/// Checks a candidate credential against the remote (authenticates and
/// confirms it has the permissions the batch needs).
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, credential: &str) -> Result<(), RemoteError>;
}

/// Where an accepted credential is persisted.
pub trait CredentialStore: Send + Sync {
    fn save(&self, credential: &str) -> Result<()>;
}

/// Plain-text cookie file.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `~/.local/state/reup/cookie`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("reup")?;
        Ok(xdg_dirs.get_state_home().join("cookie"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored credential, trimmed. Missing or blank file yields `None`.
    pub fn load(&self) -> Result<Option<String>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read cookie: {}", self.path.display()))
            }
        };
        let trimmed = data.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove cookie: {}", self.path.display())),
        }
    }
}

impl CredentialStore for CookieFile {
    fn save(&self, credential: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut options = fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("open cookie: {}", self.path.display()))?;
        file.write_all(credential.trim().as_bytes())
            .with_context(|| format!("write cookie: {}", self.path.display()))?;
        Ok(())
    }
}
