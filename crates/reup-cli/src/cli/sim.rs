//! Simulated remote asset API for `reup simulate`.
//!
//! Fails the first `network_failures` calls with a connection error and
//! expires the session credential after `expire_after` successful calls.
//! Any new, non-empty credential that was never expired is accepted.

use async_trait::async_trait;
use reup_core::credential::CredentialValidator;
use reup_core::remote::{ChunkCall, RemoteError};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// What the simulated API returns per id.
#[derive(Debug, Clone, Serialize)]
pub struct AssetInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug)]
struct SimState {
    valid: String,
    expired: HashSet<String>,
    successes_left: Option<usize>,
    failures_left: usize,
    calls: usize,
}

#[derive(Debug)]
pub struct SimulatedRemote {
    latency: Duration,
    expire_after: Option<usize>,
    state: Mutex<SimState>,
}

impl SimulatedRemote {
    pub fn new(credential: &str, expire_after: Option<usize>, network_failures: usize) -> Self {
        Self {
            latency: Duration::from_millis(150),
            expire_after,
            state: Mutex::new(SimState {
                valid: credential.to_string(),
                expired: HashSet::new(),
                successes_left: expire_after,
                failures_left: network_failures,
                calls: 0,
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn respond(&self, credential: &str, ids: &[u64]) -> Result<Vec<AssetInfo>, RemoteError> {
        let mut state = self.lock();
        state.calls += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(RemoteError::Connection("simulated connection reset".into()));
        }
        if credential != state.valid {
            return Err(RemoteError::Unauthorized("cookie expired".into()));
        }
        if let Some(left) = state.successes_left.as_mut() {
            if *left == 0 {
                let old = std::mem::take(&mut state.valid);
                state.expired.insert(old);
                return Err(RemoteError::Unauthorized("cookie expired".into()));
            }
            *left -= 1;
        }
        Ok(ids
            .iter()
            .map(|&id| AssetInfo {
                id,
                name: format!("Asset {id}"),
            })
            .collect())
    }
}

#[async_trait]
impl ChunkCall<u64, Vec<AssetInfo>> for SimulatedRemote {
    async fn call(&self, credential: &str, ids: &[u64]) -> Result<Vec<AssetInfo>, RemoteError> {
        tokio::time::sleep(self.latency).await;
        self.respond(credential, ids)
    }
}

#[async_trait]
impl CredentialValidator for SimulatedRemote {
    async fn validate(&self, credential: &str) -> Result<(), RemoteError> {
        tokio::time::sleep(self.latency).await;
        let mut state = self.lock();
        if state.expired.contains(credential) {
            return Err(RemoteError::Unauthorized("that cookie has already expired".into()));
        }
        state.valid = credential.to_string();
        state.successes_left = self.expire_after;
        Ok(())
    }
}
