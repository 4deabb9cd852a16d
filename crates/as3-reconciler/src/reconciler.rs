//! Reconciliation loop.
//!
//! A single task owns the active snapshot and is the only reader of the
//! request channel. Each request is assembled, diffed and posted; a failed
//! post parks the loop in a backoff wait that a newer request preempts and
//! a timeout turns into a reassertion of the active declaration.

use std::sync::Arc;
use std::time::Duration;

use as3_types::{DeployOutcome, DeployRequest, DesiredConfig, OverrideFragment};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::ReconcilerConfig;
use crate::declaration::{ActiveSnapshot, Assembler};
use crate::diff;
use crate::notifier::{self, OutcomeReceiver, OutcomeSender};
use crate::partition::PartitionDeleter;
use crate::submitter::{PostResponse, Submitter};
use crate::validation::SchemaValidator;
use crate::version::VersionState;

/// Producer side of the request channel
pub type RequestSender = mpsc::UnboundedSender<DeployRequest>;

/// Consumer side of the request channel, owned by the loop
pub type RequestReceiver = mpsc::UnboundedReceiver<DeployRequest>;

/// Create the inbound request channel.
pub fn request_channel() -> (RequestSender, RequestReceiver) {
    mpsc::unbounded_channel()
}

/// What ended a backoff wait
#[derive(Debug)]
enum BackoffEvent {
    RequestArrived(DeployRequest),
    TimeoutElapsed,
    Closed,
}

/// Owner of the active snapshot and driver of posts to the appliance
pub struct Reconciler {
    config: ReconcilerConfig,
    assembler: Assembler,
    validator: Option<SchemaValidator>,
    submitter: Arc<dyn Submitter>,
    notifier: OutcomeSender,
    default_override: Option<OverrideFragment>,

    /// Last committed declaration
    active: ActiveSnapshot,

    /// Desired state of the most recent request
    current: DesiredConfig,

    /// Set by a failed post, cleared only by an accepted one
    sticky_failure: bool,
}

impl Reconciler {
    /// Create a reconciler speaking the AS3 dialect `version`.
    pub fn new(
        config: ReconcilerConfig,
        version: VersionState,
        submitter: Arc<dyn Submitter>,
    ) -> (Self, OutcomeReceiver) {
        let (notifier, outcomes) = notifier::channel();
        let assembler = Assembler::new(version, config.user_agent.clone());
        let validator = config
            .validation
            .then(|| SchemaValidator::new(config.schema_path.clone()));

        let reconciler = Self {
            config,
            assembler,
            validator,
            submitter,
            notifier,
            default_override: None,
            active: ActiveSnapshot::empty(),
            current: DesiredConfig::default(),
            sticky_failure: false,
        };

        (reconciler, outcomes)
    }

    /// Override applied when a request carries none.
    pub fn with_override(mut self, fragment: OverrideFragment) -> Self {
        self.default_override = Some(fragment).filter(|f| !f.is_empty());
        self
    }

    /// Handle for deleting partitions outside the loop.
    pub fn partition_deleter(&self) -> PartitionDeleter {
        PartitionDeleter::new(self.assembler.clone(), self.submitter.clone())
    }

    /// Serve requests until the channel closes.
    pub async fn run(mut self, mut requests: RequestReceiver) {
        info!(
            version = %self.assembler.version(),
            post_delay_secs = self.config.post_delay_secs,
            "Reconciler started"
        );

        // The first post after startup goes out without delay
        let mut first_post = true;

        while let Some(request) = requests.recv().await {
            let delay = self.config.post_delay();
            if !first_post && !delay.is_zero() {
                debug!(delay_secs = delay.as_secs(), "Delaying post to appliance");
                sleep(delay).await;
            }

            let request = latest(&mut requests, request);
            let mut response = self.apply(request).await;

            while !response.accepted {
                self.sticky_failure = true;
                let timeout = self.config.retry.timeout_for(response.event);
                debug!(
                    event = %response.event,
                    timeout_ms = timeout.as_millis() as u64,
                    "Waiting before retrying declaration"
                );

                response = match next_backoff_event(&mut requests, timeout).await {
                    BackoffEvent::RequestArrived(request) => {
                        let request = latest(&mut requests, request);
                        self.apply(request).await
                    }
                    BackoffEvent::TimeoutElapsed => self.reassert().await,
                    BackoffEvent::Closed => {
                        info!("Request channel closed during backoff, reconciler stopped");
                        return;
                    }
                };
            }
            first_post = false;

            if response.is_posted_ok() {
                self.sticky_failure = false;
                self.notify_success();
            }
        }

        info!("Request channel closed, reconciler stopped");
    }

    /// Assemble, diff, validate, commit and post one request.
    async fn apply(&mut self, request: DeployRequest) -> PostResponse {
        self.current = request.desired;

        let override_fragment = self
            .current
            .active_override()
            .or(self.default_override.as_ref());

        let candidate = match self
            .assembler
            .assemble(&self.current, override_fragment, &self.active)
        {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(error = %e, "Failed to assemble declaration, skipping cycle");
                return PostResponse::no_op(true);
            }
        };

        if diff::should_skip(&candidate, &self.active) {
            debug!(failing = self.sticky_failure, "Declaration unchanged, skipping post");
            return PostResponse::no_op(!self.sticky_failure);
        }

        if let Some(validator) = self.validator.as_mut() {
            if let Err(e) = validator.validate(self.assembler.version(), candidate.serialized()) {
                warn!(error = %e, "Declaration failed validation, skipping post");
                return PostResponse::no_op(true);
            }
        }

        let tenants = self
            .config
            .filter_tenants
            .then(|| candidate.tenants(true));
        self.active = ActiveSnapshot::from(candidate);

        self.post(self.active.serialized(), tenants).await
    }

    /// Post the active declaration again, unchanged.
    async fn reassert(&self) -> PostResponse {
        if self.active.is_empty() {
            debug!("Nothing to reassert");
            return PostResponse::no_op(true);
        }

        debug!("Reasserting active declaration");
        let tenants = self
            .config
            .filter_tenants
            .then(|| self.active.tenants(true));
        self.post(self.active.serialized(), tenants).await
    }

    async fn post(&self, declaration: &str, tenants: Option<Vec<String>>) -> PostResponse {
        debug!(tenants = ?tenants, "Posting AS3 declaration");
        let response = self
            .submitter
            .post_config(declaration, tenants.as_deref())
            .await;

        if response.accepted {
            info!(event = %response.event, "Appliance accepted declaration");
        } else {
            error!(event = %response.event, "Appliance rejected declaration");
        }
        response
    }

    fn notify_success(&self) {
        let outcome = DeployOutcome::success(self.current.all_members(), self.active.tenants(false));
        debug!(members = outcome.members.len(), "Sending deploy outcome");
        self.notifier.notify(outcome);
    }
}

/// Replace `request` with the newest one already queued.
fn latest(requests: &mut RequestReceiver, mut request: DeployRequest) -> DeployRequest {
    let mut dropped = 0usize;
    while let Ok(newer) = requests.try_recv() {
        request = newer;
        dropped += 1;
    }
    if dropped > 0 {
        debug!(superseded = dropped, "Coalesced queued requests");
    }
    request
}

/// Race a new request against the retry timeout. Requests win ties.
async fn next_backoff_event(requests: &mut RequestReceiver, timeout: Duration) -> BackoffEvent {
    tokio::select! {
        biased;
        request = requests.recv() => match request {
            Some(request) => BackoffEvent::RequestArrived(request),
            None => BackoffEvent::Closed,
        },
        _ = sleep(timeout) => BackoffEvent::TimeoutElapsed,
    }
}
