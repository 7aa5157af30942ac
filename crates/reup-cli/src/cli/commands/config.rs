//! `reup config` – show where the config lives and what is in effect.

use anyhow::Result;
use reup_core::config::{self, ReupConfig};

pub fn run_config(cfg: &ReupConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    println!("# cookie file: {}", cfg.cookie_path()?.display());
    Ok(())
}
