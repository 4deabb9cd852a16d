//! # AS3 Reconciler - declaration sync for an AS3 appliance
//!
//! Turns desired-state fragments into one AS3 declaration, works out which
//! tenants must be deleted, and keeps posting until the appliance accepts.
//!
//! ## Key Components
//!
//! - [`VersionGate`]: picks the AS3 dialect from the appliance's version
//! - [`Assembler`]: merges tenants, adds deletion stubs, overlays the override
//! - [`diff`]: structural no-op detection against the [`ActiveSnapshot`]
//! - [`Reconciler`]: the deploy loop with coalescing, backoff and preemption
//! - [`notifier`]: single-slot, latest-wins outcome channel
//! - [`HttpSubmitter`]: reqwest transport implementing [`Submitter`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use as3_reconciler::{
//!     request_channel, ApplianceConfig, HttpSubmitter, Reconciler, ReconcilerConfig,
//!     VersionConfig, VersionGate,
//! };
//! use as3_types::{DeployRequest, DesiredConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let submitter = Arc::new(HttpSubmitter::new(&ApplianceConfig::default())?);
//!
//! let mut gate = VersionGate::new(VersionConfig::default(), submitter.clone());
//! let version = gate.establish().await?;
//!
//! let (reconciler, mut outcomes) =
//!     Reconciler::new(ReconcilerConfig::default(), version, submitter);
//! let (requests, rx) = request_channel();
//! tokio::spawn(reconciler.run(rx));
//!
//! requests.send(DeployRequest::new(DesiredConfig::new()))?;
//! let _outcome = outcomes.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod declaration;
pub mod diff;
pub mod error;
pub mod http;
pub mod notifier;
pub mod overlay;
pub mod partition;
pub mod reconciler;
pub mod submitter;
pub mod validation;
pub mod version;

// Re-export main types
pub use config::{ApplianceConfig, ReconcilerConfig, RetryConfig, VersionConfig};
pub use declaration::{tenant_names, tenant_stub, ActiveSnapshot, Assembler, Declaration};
pub use error::{
    AssemblyError, GateError, GateResult, OverrideError, SubmitError, SubmitResult,
    ValidationError,
};
pub use http::HttpSubmitter;
pub use notifier::{OutcomeReceiver, OutcomeSender};
pub use partition::PartitionDeleter;
pub use reconciler::{request_channel, Reconciler, RequestReceiver, RequestSender};
pub use submitter::{PostEvent, PostResponse, Submitter, VersionSource};
pub use validation::SchemaValidator;
pub use version::{VersionGate, VersionState};
