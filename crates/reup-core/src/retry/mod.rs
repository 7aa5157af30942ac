//! Retry engine.
//!
//! [`run`] owns the attempt loop: it waits on the pause gate before every
//! attempt and on the limiter before every re-attempt. Classification stays
//! with the caller, who returns [`Attempt::Retryable`] or [`Attempt::Terminal`]
//! so each call site can keep its own error taxonomy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_http_status, ErrorKind};
pub use error::{Attempt, RetryError};
pub use policy::{Backoff, RetryOptions};
pub use run::run;
