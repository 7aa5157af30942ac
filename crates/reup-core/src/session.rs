//! One processing session: the shared credential and the pause gate that
//! serializes interactive refresh of it.
//!
//! Every credential carries a generation number. A task that saw a rejected
//! credential passes it back to [`Session::refresh`]; if someone already
//! replaced it, the task just retries instead of prompting again.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::credential::{CredentialPrompt, CredentialStore, CredentialValidator};
use crate::pause::PauseController;

/// Snapshot of the session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: Arc<str>,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This task drove the prompt and installed a new credential.
    Refreshed,
    /// The credential was already newer than the one that failed.
    AlreadyRefreshed,
    /// Another task was refreshing; we waited for it.
    Waited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("credential refresh abandoned by user")]
    Abandoned,
}

pub struct Session {
    credential: RwLock<Credential>,
    pause: PauseController,
    prompt: Arc<dyn CredentialPrompt>,
    validator: Arc<dyn CredentialValidator>,
    store: Option<Arc<dyn CredentialStore>>,
    abandoned: AtomicBool,
    refreshes: AtomicU32,
}

impl Session {
    pub fn new(
        credential: impl Into<Arc<str>>,
        prompt: Arc<dyn CredentialPrompt>,
        validator: Arc<dyn CredentialValidator>,
    ) -> Self {
        Self {
            credential: RwLock::new(Credential {
                value: credential.into(),
                generation: 0,
            }),
            pause: PauseController::new(),
            prompt,
            validator,
            store: None,
            abandoned: AtomicBool::new(false),
            refreshes: AtomicU32::new(0),
        }
    }

    /// Persist accepted credentials through `store`.
    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    pub fn pause_controller(&self) -> &PauseController {
        &self.pause
    }

    /// Completed interactive refreshes in this session.
    pub fn refresh_count(&self) -> u32 {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::Acquire)
    }

    /// Check the current credential with the validator before any work starts.
    /// A rejected credential goes through [`Session::refresh`] with the
    /// validator's message as the prompt reason.
    pub async fn ensure_valid(&self) -> Result<(), RefreshError> {
        let current = self.credential().await;
        match self.validator.validate(&current.value).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::info!(error = %e, "stored credential rejected before start");
                self.refresh(&current, &e.to_string()).await.map(|_| ())
            }
        }
    }

    /// Replace `stale` after the remote rejected it. At most one caller at a
    /// time prompts; everyone else waits for that prompt to finish.
    pub async fn refresh(&self, stale: &Credential, reason: &str) -> Result<RefreshOutcome, RefreshError> {
        if self.is_abandoned() {
            return Err(RefreshError::Abandoned);
        }
        if self.credential.read().await.generation > stale.generation {
            return Ok(RefreshOutcome::AlreadyRefreshed);
        }

        let Some(guard) = self.pause.try_pause() else {
            self.pause.wait_if_paused().await;
            return if self.is_abandoned() {
                Err(RefreshError::Abandoned)
            } else {
                Ok(RefreshOutcome::Waited)
            };
        };

        // Another refresher may have finished between our check and winning the gate.
        if self.credential.read().await.generation > stale.generation {
            guard.resume();
            return Ok(RefreshOutcome::AlreadyRefreshed);
        }

        tracing::info!(reason, "credential rejected, prompting for a new one");
        let mut reason = reason.to_string();
        let accepted = loop {
            let Some(candidate) = self.prompt.prompt(&reason).await else {
                self.abandoned.store(true, Ordering::Release);
                tracing::warn!("credential refresh abandoned");
                guard.resume();
                return Err(RefreshError::Abandoned);
            };
            let candidate = candidate.trim();
            if candidate.is_empty() {
                reason = "credential must not be empty".to_string();
                continue;
            }
            match self.validator.validate(candidate).await {
                Ok(()) => break candidate.to_string(),
                Err(e) => {
                    tracing::debug!(error = %e, "candidate credential rejected");
                    reason = e.to_string();
                }
            }
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&accepted) {
                tracing::warn!("failed to save credential: {:#}", e);
            }
        }
        {
            let mut current = self.credential.write().await;
            current.value = accepted.into();
            current.generation += 1;
        }
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        tracing::info!("credential refreshed, resuming");
        guard.resume();
        Ok(RefreshOutcome::Refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays scripted answers and counts prompts.
    struct Scripted {
        answers: Mutex<VecDeque<Option<String>>>,
        reasons: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl Scripted {
        fn new(answers: &[Option<&str>]) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
                reasons: Mutex::new(Vec::new()),
                delay: Duration::from_millis(20),
            })
        }

        fn prompts(&self) -> usize {
            self.reasons.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CredentialPrompt for Scripted {
        async fn prompt(&self, reason: &str) -> Option<String> {
            self.reasons.lock().unwrap().push(reason.to_string());
            tokio::time::sleep(self.delay).await;
            self.answers.lock().unwrap().pop_front().flatten()
        }
    }

    /// Accepts anything except "bad".
    struct RejectBad;

    #[async_trait]
    impl CredentialValidator for RejectBad {
        async fn validate(&self, credential: &str) -> Result<(), RemoteError> {
            if credential == "bad" {
                Err(RemoteError::Unauthorized("invalid cookie".into()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<Vec<String>>);

    impl CredentialStore for MemoryStore {
        fn save(&self, credential: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(credential.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresher_loops_until_valid_and_persists() {
        let prompt = Scripted::new(&[Some("   "), Some("bad"), Some(" good ")]);
        let store = Arc::new(MemoryStore::default());
        let session = Session::new("old", prompt.clone(), Arc::new(RejectBad))
            .with_store(store.clone());

        let stale = session.credential().await;
        let outcome = session.refresh(&stale, "cookie expired").await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Refreshed);

        let now = session.credential().await;
        assert_eq!(&*now.value, "good");
        assert_eq!(now.generation, 1);
        assert_eq!(session.refresh_count(), 1);
        assert_eq!(*store.0.lock().unwrap(), vec!["good".to_string()]);

        let reasons = prompt.reasons.lock().unwrap().clone();
        assert_eq!(reasons[0], "cookie expired");
        assert_eq!(reasons[1], "credential must not be empty");
        assert!(reasons[2].contains("invalid cookie"));
        assert!(!session.pause_controller().is_paused());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_prompt_once() {
        let prompt = Scripted::new(&[Some("fresh")]);
        let session = Arc::new(Session::new("old", prompt.clone(), Arc::new(RejectBad)));
        let stale = session.credential().await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let session = Arc::clone(&session);
            let stale = stale.clone();
            handles.push(tokio::spawn(async move {
                session.refresh(&stale, "expired").await
            }));
        }
        let mut refreshed = 0;
        for h in handles {
            if h.await.unwrap().unwrap() == RefreshOutcome::Refreshed {
                refreshed += 1;
            }
        }
        assert_eq!(refreshed, 1);
        assert_eq!(prompt.prompts(), 1);
        assert_eq!(&*session.credential().await.value, "fresh");
    }

    #[tokio::test]
    async fn ensure_valid_keeps_good_credential_without_prompting() {
        let prompt = Scripted::new(&[]);
        let session = Session::new("fine", prompt.clone(), Arc::new(RejectBad));
        session.ensure_valid().await.unwrap();
        assert_eq!(prompt.prompts(), 0);
        assert_eq!(session.credential().await.generation, 0);
    }

    #[tokio::test]
    async fn ensure_valid_refreshes_rejected_credential() {
        let prompt = Scripted::new(&[Some("good")]);
        let session = Session::new("bad", prompt.clone(), Arc::new(RejectBad));
        session.ensure_valid().await.unwrap();

        assert_eq!(prompt.prompts(), 1);
        assert!(prompt.reasons.lock().unwrap()[0].contains("invalid cookie"));
        assert_eq!(&*session.credential().await.value, "good");
        assert_eq!(session.refresh_count(), 1);
    }

    #[tokio::test]
    async fn ensure_valid_reports_abandonment() {
        let prompt = Scripted::new(&[None]);
        let session = Session::new("bad", prompt.clone(), Arc::new(RejectBad));
        assert_eq!(session.ensure_valid().await, Err(RefreshError::Abandoned));
        assert!(session.is_abandoned());
    }

    #[tokio::test]
    async fn stale_generation_skips_prompt() {
        let prompt = Scripted::new(&[Some("one"), Some("two")]);
        let session = Session::new("old", prompt.clone(), Arc::new(RejectBad));
        let stale = session.credential().await;

        session.refresh(&stale, "expired").await.unwrap();
        let again = session.refresh(&stale, "expired").await.unwrap();
        assert_eq!(again, RefreshOutcome::AlreadyRefreshed);
        assert_eq!(prompt.prompts(), 1);
    }

    #[tokio::test]
    async fn abandonment_releases_waiters_and_sticks() {
        let prompt = Scripted::new(&[None]);
        let session = Arc::new(Session::new("old", prompt.clone(), Arc::new(RejectBad)));
        let stale = session.credential().await;

        let refresher = {
            let session = Arc::clone(&session);
            let stale = stale.clone();
            tokio::spawn(async move { session.refresh(&stale, "expired").await })
        };
        // Let the refresher take the gate before the waiter arrives.
        while !session.pause_controller().is_paused() {
            tokio::task::yield_now().await;
        }
        let waiter = session.refresh(&stale, "expired").await;

        assert_eq!(refresher.await.unwrap(), Err(RefreshError::Abandoned));
        assert_eq!(waiter, Err(RefreshError::Abandoned));
        assert!(session.is_abandoned());
        assert!(!session.pause_controller().is_paused());
        assert_eq!(session.refresh(&stale, "x").await, Err(RefreshError::Abandoned));
        assert_eq!(prompt.prompts(), 1);
    }
}
