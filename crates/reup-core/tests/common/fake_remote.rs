//! In-process remote: per-call latency, credential expiry, injected failures,
//! plus a scripted terminal prompt.

use async_trait::async_trait;
use reup_core::credential::{CredentialPrompt, CredentialValidator};
use reup_core::remote::{ChunkCall, RemoteError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct FakeRemote {
    latency: Duration,
    valid: Mutex<String>,
    /// Calling the chunk starting at this id expires the current credential once.
    expire_at_chunk: Mutex<Option<u64>>,
    /// Errors returned (in order) by calls for the chunk starting at the key.
    injected: Mutex<HashMap<u64, VecDeque<RemoteError>>>,
    calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new(credential: &str) -> Self {
        Self {
            latency: Duration::from_millis(20),
            valid: Mutex::new(credential.to_string()),
            expire_at_chunk: Mutex::new(None),
            injected: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn expire_credential_at(self, first_id: u64) -> Self {
        *self.expire_at_chunk.lock().unwrap() = Some(first_id);
        self
    }

    pub fn inject(self, first_id: u64, errors: Vec<RemoteError>) -> Self {
        self.injected
            .lock()
            .unwrap()
            .entry(first_id)
            .or_default()
            .extend(errors);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChunkCall<u64, Vec<String>> for FakeRemote {
    async fn call(&self, credential: &str, ids: &[u64]) -> Result<Vec<String>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let first = ids.first().copied().unwrap_or_default();

        {
            let mut expire = self.expire_at_chunk.lock().unwrap();
            if *expire == Some(first) {
                *expire = None;
                self.valid.lock().unwrap().clear();
            }
        }
        if *self.valid.lock().unwrap() != credential {
            return Err(RemoteError::Unauthorized("cookie expired".into()));
        }
        if let Some(err) = self
            .injected
            .lock()
            .unwrap()
            .get_mut(&first)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(ids.iter().map(|id| format!("asset-{id}")).collect())
    }
}

#[async_trait]
impl CredentialValidator for FakeRemote {
    /// Any non-empty credential other than "bad" becomes the valid one.
    async fn validate(&self, credential: &str) -> Result<(), RemoteError> {
        if credential == "bad" {
            return Err(RemoteError::Unauthorized("invalid cookie".into()));
        }
        *self.valid.lock().unwrap() = credential.to_string();
        Ok(())
    }
}

/// Answers prompts from a script; `None` entries abandon.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    prompts: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialPrompt for ScriptedPrompt {
    async fn prompt(&self, _reason: &str) -> Option<String> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        // Typing takes a while; other chunks stay in flight meanwhile.
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.answers.lock().unwrap().pop_front().flatten()
    }
}
