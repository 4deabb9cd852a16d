//! Daemon wiring and lifecycle

use as3_reconciler::{
    request_channel, Assembler, HttpSubmitter, OutcomeReceiver, PartitionDeleter, Reconciler,
    RequestSender, VersionGate, VersionState,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::source::{load_override, DesiredStateFile};

/// AS3 sync daemon
pub struct Server {
    config: DaemonConfig,
    submitter: Arc<HttpSubmitter>,
}

impl Server {
    /// Create a server and its appliance client
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let submitter = Arc::new(HttpSubmitter::new(&config.appliance)?);
        Ok(Self { config, submitter })
    }

    /// Query the appliance and refuse to continue on an unsupported version.
    async fn establish_version(&self) -> DaemonResult<VersionState> {
        let mut gate = VersionGate::new(self.config.version.clone(), self.submitter.clone());
        let version = gate.establish().await?;
        info!(release = %version.release(), "AS3 version established");
        Ok(version)
    }

    /// Remove the given partitions and return.
    pub async fn delete_partitions(self, partitions: &[String]) -> DaemonResult<()> {
        let version = self.establish_version().await?;
        let assembler = Assembler::new(version, self.config.reconciler.user_agent.clone());
        let deleter = PartitionDeleter::new(assembler, self.submitter.clone());

        let response = deleter.delete_partitions(partitions).await;
        if response.accepted {
            Ok(())
        } else {
            Err(DaemonError::Rejected(response.event))
        }
    }

    /// Run the reconciliation loop until Ctrl+C.
    pub async fn run(self) -> DaemonResult<()> {
        let version = self.establish_version().await?;

        let (mut reconciler, outcomes) =
            Reconciler::new(self.config.reconciler.clone(), version, self.submitter.clone());
        if let Some(path) = &self.config.reconciler.override_file {
            reconciler = reconciler.with_override(load_override(path)?);
            info!(path = %path.display(), "Override file loaded");
        }

        let (requests, rx) = request_channel();
        let reconcile = tokio::spawn(reconciler.run(rx));
        let reporter = tokio::spawn(report_outcomes(outcomes));

        let source = self
            .config
            .source
            .desired_state
            .clone()
            .map(DesiredStateFile::new);
        if source.is_none() {
            warn!("No desired_state source configured; waiting for shutdown");
        }
        publish(source.as_ref(), &requests);

        wait_for_shutdown(source.as_ref(), &requests).await?;
        info!("as3d shutting down");

        drop(requests);
        reconcile.await?;
        reporter.await?;
        Ok(())
    }
}

/// Read the desired state and queue it for the loop.
fn publish(source: Option<&DesiredStateFile>, requests: &RequestSender) {
    let Some(source) = source else {
        return;
    };

    match source.load() {
        Ok(desired) => {
            if requests.send(desired.into()).is_err() {
                warn!("Reconciler stopped; desired state dropped");
            }
        }
        Err(e) => error!(
            path = %source.path().display(),
            error = %e,
            "Failed to load desired state"
        ),
    }
}

/// Log every outcome until the loop closes the channel.
async fn report_outcomes(mut outcomes: OutcomeReceiver) {
    while let Some(outcome) = outcomes.recv().await {
        info!(
            tenants = ?outcome.tenants,
            members = outcome.members.len(),
            "Declaration applied"
        );
    }
}

/// Wait for Ctrl+C, re-publishing the desired state on SIGHUP.
#[cfg(unix)]
async fn wait_for_shutdown(
    source: Option<&DesiredStateFile>,
    requests: &RequestSender,
) -> DaemonResult<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, initiating graceful shutdown");
                return Ok(());
            }
            _ = terminate.recv() => {
                info!("Received terminate signal, initiating graceful shutdown");
                return Ok(());
            }
            _ = hangup.recv() => {
                info!("Received SIGHUP, reloading desired state");
                publish(source, requests);
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(
    _source: Option<&DesiredStateFile>,
    _requests: &RequestSender,
) -> DaemonResult<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, initiating graceful shutdown");
    Ok(())
}
