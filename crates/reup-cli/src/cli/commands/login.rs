//! `reup login` – store a credential for later batches.

use anyhow::{Context, Result};
use reup_core::config::ReupConfig;
use reup_core::credential::{CookieFile, CredentialPrompt, CredentialStore};

use crate::cli::prompt::ConsolePrompt;

pub async fn run_login(cfg: &ReupConfig) -> Result<()> {
    let cookie = CookieFile::new(cfg.cookie_path()?);
    let prompt = ConsolePrompt::new("Cookie");
    let credential = loop {
        let input = prompt
            .prompt("")
            .await
            .context("no credential entered")?;
        let trimmed = input.trim();
        if !trimmed.is_empty() {
            break trimmed.to_string();
        }
        eprintln!("credential must not be empty");
    };
    cookie.save(&credential)?;
    println!("Saved credential to {}", cookie.path().display());
    Ok(())
}
