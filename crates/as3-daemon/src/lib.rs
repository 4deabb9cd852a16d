//! AS3 sync daemon library
//!
//! Wires the reconciler from `as3-reconciler` to a real appliance:
//! - configuration loading
//! - desired-state and override files
//! - server lifecycle and signal handling

pub mod config;
pub mod error;
pub mod server;
pub mod source;

pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult};
pub use server::Server;
pub use source::DesiredStateFile;
