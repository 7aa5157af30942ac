//! Terminal prompt for a replacement credential.

use async_trait::async_trait;
use reup_core::credential::CredentialPrompt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Reads one line per prompt from stdin. EOF abandons the refresh.
pub struct ConsolePrompt {
    label: String,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsolePrompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl CredentialPrompt for ConsolePrompt {
    async fn prompt(&self, reason: &str) -> Option<String> {
        let mut lines = self.lines.lock().await;
        if !reason.is_empty() {
            eprintln!("{reason}");
        }
        let mut stderr = tokio::io::stderr();
        let _ = stderr.write_all(format!("{}: ", self.label).as_bytes()).await;
        let _ = stderr.flush().await;
        match lines.next_line().await {
            Ok(Some(line)) => Some(line),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("reading credential from stdin: {}", e);
                None
            }
        }
    }
}
