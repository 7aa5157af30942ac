//! `reup simulate` – run a full batch against the simulated remote, refreshing
//! the credential on the terminal when it expires.

use anyhow::{Context, Result};
use reup_core::batch::{self, BatchReport, ChunkFailure};
use reup_core::config::ReupConfig;
use reup_core::credential::{CookieFile, CredentialPrompt};
use reup_core::session::Session;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::prompt::ConsolePrompt;
use crate::cli::sim::{AssetInfo, SimulatedRemote};

#[derive(Debug)]
pub struct SimulateArgs {
    pub ids: u64,
    pub chunk_size: Option<usize>,
    pub expire_after: Option<usize>,
    pub network_failures: usize,
    pub export: Option<PathBuf>,
}

type Report = BatchReport<u64, Vec<AssetInfo>, ChunkFailure>;

pub async fn run_simulate(cfg: &ReupConfig, args: SimulateArgs) -> Result<()> {
    let prompt = Arc::new(ConsolePrompt::new("Cookie"));
    let cookie = CookieFile::new(cfg.cookie_path()?);
    let initial = match cookie.load()? {
        Some(c) => c,
        None => prompt
            .prompt("No stored credential.")
            .await
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .context("no credential entered")?,
    };

    let remote = Arc::new(SimulatedRemote::new(
        &initial,
        args.expire_after,
        args.network_failures,
    ));
    let session = Arc::new(
        Session::new(initial, prompt, remote.clone()).with_store(Arc::new(cookie)),
    );

    session
        .ensure_valid()
        .await
        .context("credential check before batch")?;

    let mut settings = cfg.batch_settings();
    if let Some(size) = args.chunk_size {
        settings.chunk_size = size;
    }

    let start = Instant::now();
    let ids: Vec<u64> = (1..=args.ids).collect();
    let tasks = batch::run_chunked(Arc::clone(&session), Arc::clone(&remote), ids, &settings)?;
    println!(
        "Dispatched {} chunk(s) of up to {} ids",
        tasks.len(),
        settings.chunk_size
    );
    let report: Report = batch::collect(tasks).await?;
    let elapsed = start.elapsed();

    print_report(&report);
    println!(
        "{} remote call(s), {} credential refresh(es), took {}m {}s",
        remote.calls(),
        session.refresh_count(),
        elapsed.as_secs() / 60,
        elapsed.as_secs() % 60
    );
    tracing::info!(
        chunks = report.outcomes.len(),
        failed = report.failures().count(),
        "simulated batch finished"
    );

    if let Some(path) = args.export {
        write_export(&report, &path)?;
        println!("Exported report to {}", path.display());
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("{:<6} {:<12} {}", "CHUNK", "IDS", "RESULT");
    for o in &report.outcomes {
        let span = match (o.chunk.first(), o.chunk.last()) {
            (Some(a), Some(b)) => format!("{a}-{b}"),
            _ => "-".to_string(),
        };
        let result = match o.result.as_ref() {
            Ok(assets) => format!("ok ({} assets)", assets.len()),
            Err(e) => format!("failed: {e}"),
        };
        println!("{:<6} {:<12} {}", o.chunk.index(), span, result);
    }
    println!(
        "{} of {} id(s) resolved",
        report.item_count() - report.failed_item_count(),
        report.item_count()
    );
}

#[derive(Serialize)]
struct ChunkExport<'a> {
    chunk: usize,
    ids: &'a [u64],
    #[serde(skip_serializing_if = "Option::is_none")]
    assets: Option<&'a [AssetInfo]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn write_export(report: &Report, path: &Path) -> Result<()> {
    let rows: Vec<ChunkExport<'_>> = report
        .outcomes
        .iter()
        .map(|o| ChunkExport {
            chunk: o.chunk.index(),
            ids: o.chunk.ids(),
            assets: o.result.as_ref().as_ref().ok().map(Vec::as_slice),
            error: o.result.as_ref().as_ref().err().map(ToString::to_string),
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write report: {}", path.display()))?;
    Ok(())
}
