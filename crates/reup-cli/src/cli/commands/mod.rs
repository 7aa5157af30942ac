//! CLI command handlers, one per file.

mod chunks;
mod config;
mod login;
mod simulate;

pub use chunks::run_chunks;
pub use config::run_config;
pub use login::run_login;
pub use simulate::{run_simulate, SimulateArgs};
