//! reup core: run chunked batches of remote calls under one shared rate budget
//! and one shared, interactively refreshed credential.
//!
//! Leaves first: [`limiter`] → [`taskqueue`] → [`retry`] → [`pause`] →
//! [`dispatch`]. [`session`] and [`batch`] wire them to a remote
//! ([`remote::ChunkCall`]) and a credential prompt ([`credential`]).

pub mod config;
pub mod logging;

pub mod batch;
pub mod credential;
pub mod dispatch;
pub mod limiter;
pub mod pause;
pub mod remote;
pub mod retry;
pub mod session;
pub mod taskqueue;
