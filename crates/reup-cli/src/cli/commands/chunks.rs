//! `reup chunks` – print the chunk plan for N ids.

use anyhow::{bail, Result};
use reup_core::dispatch::{chunk_count, chunk_ranges};

pub fn run_chunks(ids: usize, chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        bail!("chunk size must be greater than zero");
    }
    println!(
        "{} id(s) -> {} chunk(s) of up to {}",
        ids,
        chunk_count(ids, chunk_size),
        chunk_size
    );
    println!("{:<6} {:<8} {:<8} {}", "CHUNK", "START", "END", "SIZE");
    for (i, r) in chunk_ranges(ids, chunk_size).enumerate() {
        println!("{:<6} {:<8} {:<8} {}", i, r.start, r.end, r.len());
    }
    Ok(())
}
