//! Attempt outcome and final retry error.

/// Classified failure of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<E> {
    /// Keep going while tries remain.
    Retryable(E),
    /// Stop now, even if tries remain.
    Terminal(E),
}

impl<E> Attempt<E> {
    pub fn into_inner(self) -> E {
        match self {
            Attempt::Retryable(e) | Attempt::Terminal(e) => e,
        }
    }
}

/// Why [`run`](super::run) gave up.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("attempt {attempt} failed: {error}")]
    Terminal { attempt: u32, error: E },
    #[error("gave up after {attempts} attempts: {error}")]
    Exhausted { attempts: u32, error: E },
}

impl<E> RetryError<E> {
    /// Number of attempts that ran.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Terminal { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The last attempt's error.
    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Terminal { error, .. } | RetryError::Exhausted { error, .. } => error,
        }
    }

    pub fn into_last_error(self) -> E {
        match self {
            RetryError::Terminal { error, .. } | RetryError::Exhausted { error, .. } => error,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}
